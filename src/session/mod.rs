//! Sessions: login, buffered writes, optimistic commit

pub mod changeset;
pub mod manager;
#[allow(clippy::module_inception)]
pub mod session;

pub use changeset::{Expectation, PendingChanges};
pub use manager::{SessionInfo, SessionManager};
pub use session::Session;
