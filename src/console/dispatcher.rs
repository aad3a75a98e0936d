//! Command dispatcher
//!
//! Runs parsed commands against a repository. Every command that touches
//! the store logs in, does its work, commits when it mutates, and logs out
//! again whatever the result.

use super::command::{Command, UpOp, VERBS};
use super::{ConsoleError, ConsoleResult};
use crate::repository::Repository;
use crate::session::Session;
use crate::tree::{NodePath, WalkEntry};
use std::io::Write;
use tracing::{debug, error};

/// Result of one console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// 0 on success, 1 on parse or store errors
    pub code: i32,
    /// Set by `exit`
    pub exit: bool,
}

impl Outcome {
    pub fn success() -> Self {
        Outcome { code: 0, exit: false }
    }

    pub fn failure() -> Self {
        Outcome { code: 1, exit: false }
    }

    pub fn exit() -> Self {
        Outcome { code: 0, exit: true }
    }
}

/// Maps console commands onto store operations
pub struct Dispatcher {
    repo: Repository,
}

impl Dispatcher {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Parse and run one line, writing results and errors to `out`
    ///
    /// Only failures to write to `out` are returned as errors.
    pub fn execute_line(&self, line: &str, out: &mut dyn Write) -> std::io::Result<Outcome> {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Outcome::success()),
            Err(e) => {
                report(&e, out)?;
                return Ok(Outcome::failure());
            }
        };

        match self.execute(&command, out) {
            Ok(()) if command == Command::Exit => Ok(Outcome::exit()),
            Ok(()) => Ok(Outcome::success()),
            Err(ConsoleError::Io(e)) => Err(e),
            Err(e) => {
                report(&e, out)?;
                Ok(Outcome::failure())
            }
        }
    }

    /// Run a parsed command
    pub fn execute(&self, command: &Command, out: &mut dyn Write) -> ConsoleResult<()> {
        debug!("Dispatching {} command", command.verb().name());

        match command {
            Command::Help => {
                for spec in VERBS {
                    writeln!(out, "{} - {}", spec.name, spec.description)?;
                }
                Ok(())
            }
            Command::Exit => Ok(()),
            Command::Ls { path } => self.with_session(|session| {
                let children = session.list_children(path)?;
                if children.is_empty() {
                    writeln!(out, "no children")?;
                }
                for name in children {
                    writeln!(out, "{}", name)?;
                }
                Ok(())
            }),
            Command::Cat { path } => self.with_session(|session| {
                let properties = session.get_properties(path)?;
                if properties.is_empty() {
                    writeln!(out, "no properties")?;
                }
                for (name, value) in &properties {
                    writeln!(out, "{}: {}", name, value)?;
                }
                Ok(())
            }),
            Command::Add { path, primary_type } => self.with_session(|session| {
                session.add_node(path, primary_type)?;
                session.commit()?;
                Ok(())
            }),
            Command::Rm { path } => self.with_session(|session| {
                session.remove_node(path)?;
                session.commit()?;
                Ok(())
            }),
            Command::Up { path, op } => self.with_session(|session| {
                match op {
                    UpOp::Edit { name, value } => session.set_property(path, name, value.clone())?,
                    UpOp::Delete { name } => session.remove_property(path, name)?,
                }
                session.commit()?;
                Ok(())
            }),
            Command::Colour { value } => self.with_session(|session| {
                let property = &self.repo.config().indexed_property;
                let paths = session.find_by_property(property, value)?;
                write_paths(out, &paths)
            }),
            Command::Query { statement } => self.with_session(|session| {
                let paths = session.query(statement)?;
                write_paths(out, &paths)
            }),
            Command::Walk { path } => self.with_session(|session| {
                let path = NodePath::parse(path)?;
                let snapshot = session.snapshot()?;
                for entry in snapshot.walk(&path, self.repo.config().walk_policy)? {
                    for line in render_walk_entry(&entry?) {
                        writeln!(out, "{}", line)?;
                    }
                }
                Ok(())
            }),
        }
    }

    /// Log in as admin, run `f` and always log out
    fn with_session<T>(&self, f: impl FnOnce(&mut Session) -> ConsoleResult<T>) -> ConsoleResult<T> {
        let mut session = self.repo.login_admin()?;
        let result = f(&mut session);
        let logout = session.logout();
        let value = result?;
        logout?;
        Ok(value)
    }
}

fn write_paths(out: &mut dyn Write, paths: &[NodePath]) -> ConsoleResult<()> {
    if paths.is_empty() {
        writeln!(out, "no nodes found")?;
    }
    for path in paths {
        writeln!(out, "{}", path)?;
    }
    Ok(())
}

fn report(e: &ConsoleError, out: &mut dyn Write) -> std::io::Result<()> {
    match e {
        ConsoleError::Store(store) if store.is_fatal() => error!("Command aborted: {}", store),
        other => debug!("Command failed: {}", other),
    }
    writeln!(out, "Error: {}", e)
}

/// Text lines for one walked node
///
/// The root prints as `/ `, deeper nodes as `|` per level then `-> name`,
/// followed by one `- name: value` line per property.
pub fn render_walk_entry(entry: &WalkEntry<'_>) -> Vec<String> {
    let bars = "|".repeat(entry.depth);
    let mut lines = Vec::with_capacity(entry.node.property_count() + 1);

    match entry.path.name() {
        None => lines.push(format!("{} ", entry.path)),
        Some(name) => lines.push(format!("{}-> {}", bars, name)),
    }
    for (name, value) in &entry.node.properties {
        lines.push(format!("{}- {}: {}", bars, name, value));
    }
    lines
}
