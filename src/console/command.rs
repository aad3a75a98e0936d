//! Console command parsing
//!
//! A line is split into whitespace tokens. The first token selects a verb
//! from the verb table (case-insensitive); the remaining tokens are parsed
//! by a small clap definition per verb.

use super::ConsoleError;
use crate::tree::PropertyValue;
use clap::{ArgGroup, Parser};

/// Console verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Add,
    Cat,
    Colour,
    Exit,
    Help,
    Ls,
    Query,
    Rm,
    Up,
    Walk,
}

/// Entry of the verb table
#[derive(Debug, Clone, Copy)]
pub struct VerbSpec {
    pub verb: Verb,
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
}

/// Verb table, sorted by name
pub const VERBS: &[VerbSpec] = &[
    VerbSpec {
        verb: Verb::Add,
        name: "add",
        description: "Add a new node",
        usage: "add /path/to/node primaryType",
    },
    VerbSpec {
        verb: Verb::Cat,
        name: "cat",
        description: "Print the content of a node",
        usage: "cat /path/to/node",
    },
    VerbSpec {
        verb: Verb::Colour,
        name: "colour",
        description: "Search for all the nodes with a specific `colour`",
        usage: "colour <desired-colour>",
    },
    VerbSpec {
        verb: Verb::Exit,
        name: "exit",
        description: "Leave the console",
        usage: "exit",
    },
    VerbSpec {
        verb: Verb::Help,
        name: "help",
        description: "Print the help screen",
        usage: "help",
    },
    VerbSpec {
        verb: Verb::Ls,
        name: "ls",
        description: "list the nodes for the provided path",
        usage: "ls /path/to/node",
    },
    VerbSpec {
        verb: Verb::Query,
        name: "query",
        description: "Run SELECT * FROM [type] WHERE property = 'value'",
        usage: "query SELECT * FROM [nt:base] WHERE colour = 'red'",
    },
    VerbSpec {
        verb: Verb::Rm,
        name: "rm",
        description: "remove a node and all the subnodes",
        usage: "rm /path/to/node",
    },
    VerbSpec {
        verb: Verb::Up,
        name: "up",
        description: "Update a node",
        usage: "up /path/to/node --edit propertyName value[,value...] | --delete propertyName",
    },
    VerbSpec {
        verb: Verb::Walk,
        name: "walk",
        description: "Dump the tree below a node",
        usage: "walk [/path/to/node]",
    },
];

impl Verb {
    /// Look a verb up by name, ignoring case
    pub fn lookup(name: &str) -> Option<&'static VerbSpec> {
        VERBS.iter().find(|spec| spec.name.eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Verb::Add => "add",
            Verb::Cat => "cat",
            Verb::Colour => "colour",
            Verb::Exit => "exit",
            Verb::Help => "help",
            Verb::Ls => "ls",
            Verb::Query => "query",
            Verb::Rm => "rm",
            Verb::Up => "up",
            Verb::Walk => "walk",
        }
    }
}

/// Property update carried by `up`
#[derive(Debug, Clone, PartialEq)]
pub enum UpOp {
    Edit { name: String, value: PropertyValue },
    Delete { name: String },
}

/// A parsed console command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ls { path: String },
    Cat { path: String },
    Add { path: String, primary_type: String },
    Rm { path: String },
    Up { path: String, op: UpOp },
    Colour { value: String },
    Query { statement: String },
    Walk { path: String },
    Help,
    Exit,
}

impl Command {
    pub fn verb(&self) -> Verb {
        match self {
            Command::Ls { .. } => Verb::Ls,
            Command::Cat { .. } => Verb::Cat,
            Command::Add { .. } => Verb::Add,
            Command::Rm { .. } => Verb::Rm,
            Command::Up { .. } => Verb::Up,
            Command::Colour { .. } => Verb::Colour,
            Command::Query { .. } => Verb::Query,
            Command::Walk { .. } => Verb::Walk,
            Command::Help => Verb::Help,
            Command::Exit => Verb::Exit,
        }
    }

    /// True for verbs that change the tree
    pub fn is_mutation(&self) -> bool {
        matches!(self, Command::Add { .. } | Command::Rm { .. } | Command::Up { .. })
    }

    /// Parse one console line; blank lines give `None`
    pub fn parse(line: &str) -> Result<Option<Command>, ConsoleError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            return Ok(None);
        };

        let spec = Verb::lookup(first).ok_or_else(|| ConsoleError::UnknownCommand(first.to_string()))?;
        let args: Vec<&str> = std::iter::once(spec.name).chain(tokens[1..].iter().copied()).collect();

        let command = match spec.verb {
            Verb::Ls => Command::Ls { path: PathArgs::parse_for(spec, &args)?.path },
            Verb::Cat => Command::Cat { path: PathArgs::parse_for(spec, &args)?.path },
            Verb::Rm => Command::Rm { path: PathArgs::parse_for(spec, &args)?.path },
            Verb::Add => {
                let parsed = AddArgs::try_parse_from(&args).map_err(|e| usage(spec, e))?;
                Command::Add {
                    path: parsed.path,
                    primary_type: parsed.primary_type,
                }
            }
            Verb::Up => {
                let parsed = UpArgs::try_parse_from(&args).map_err(|e| usage(spec, e))?;
                parsed.into_command(spec)?
            }
            Verb::Colour => {
                let parsed = ColourArgs::try_parse_from(&args).map_err(|e| usage(spec, e))?;
                Command::Colour { value: parsed.value }
            }
            Verb::Walk => {
                let parsed = WalkArgs::try_parse_from(&args).map_err(|e| usage(spec, e))?;
                Command::Walk { path: parsed.path }
            }
            Verb::Query => {
                // the statement is taken verbatim, quotes and spacing included
                let statement = line.trim_start()[first.len()..].trim();
                if statement.is_empty() {
                    return Err(ConsoleError::Usage {
                        verb: spec.name,
                        message: format!("missing statement\nUsage: {}", spec.usage),
                    });
                }
                Command::Query {
                    statement: statement.to_string(),
                }
            }
            Verb::Help => Command::Help,
            Verb::Exit => Command::Exit,
        };

        Ok(Some(command))
    }
}

fn usage(spec: &VerbSpec, e: clap::Error) -> ConsoleError {
    ConsoleError::Usage {
        verb: spec.name,
        message: format!("{}\nUsage: {}", e.kind(), spec.usage),
    }
}

#[derive(Parser, Debug)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct PathArgs {
    #[arg(allow_hyphen_values = true)]
    path: String,
}

impl PathArgs {
    fn parse_for(spec: &VerbSpec, args: &[&str]) -> Result<Self, ConsoleError> {
        PathArgs::try_parse_from(args).map_err(|e| usage(spec, e))
    }
}

#[derive(Parser, Debug)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct AddArgs {
    #[arg(allow_hyphen_values = true)]
    path: String,
    primary_type: String,
}

#[derive(Parser, Debug)]
#[command(disable_help_flag = true, disable_version_flag = true)]
#[command(group(ArgGroup::new("operation").required(true).args(["edit", "delete"])))]
struct UpArgs {
    #[arg(allow_hyphen_values = true)]
    path: String,

    /// Property name followed by a value or a comma-separated list
    #[arg(long, num_args = 2.., value_names = ["NAME", "VALUE"])]
    edit: Option<Vec<String>>,

    /// Property name to remove
    #[arg(long, value_name = "NAME")]
    delete: Option<String>,
}

impl UpArgs {
    fn into_command(self, spec: &VerbSpec) -> Result<Command, ConsoleError> {
        let op = match (self.edit, self.delete) {
            (Some(mut edit), None) => {
                let name = edit.remove(0);
                // "a, b" arrives as two tokens; rejoin before splitting on commas
                let raw = edit.join(" ");
                UpOp::Edit {
                    name,
                    value: PropertyValue::from_list(&raw),
                }
            }
            (None, Some(name)) => UpOp::Delete { name },
            _ => {
                return Err(ConsoleError::Usage {
                    verb: spec.name,
                    message: format!("either --edit or --delete is required\nUsage: {}", spec.usage),
                })
            }
        };
        Ok(Command::Up { path: self.path, op })
    }
}

#[derive(Parser, Debug)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct ColourArgs {
    #[arg(allow_hyphen_values = true)]
    value: String,
}

#[derive(Parser, Debug)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct WalkArgs {
    #[arg(default_value = "/", allow_hyphen_values = true)]
    path: String,
}
