//! Interactive console
//!
//! Parses console lines into commands and runs them against a repository,
//! rendering results as text.

pub mod command;
pub mod dispatcher;

pub use command::{Command, UpOp, Verb, VerbSpec, VERBS};
pub use dispatcher::{Dispatcher, Outcome};

use crate::error::StoreError;
use thiserror::Error;

/// Shell prompt
pub const PROMPT: &str = "$ ";

/// Banner printed when the shell starts
pub const BANNER: &str = "\
----------------------------------------------------------------------
              treestore console. Type `help` for help!
----------------------------------------------------------------------
";

/// Console errors
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Command not found: '{0}'. Try `help`")]
    UnknownCommand(String),

    #[error("Error parsing the command line for '{verb}': {message}")]
    Usage { verb: &'static str, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
