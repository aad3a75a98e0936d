//! treestore CLI: interactive shell and one-shot commands for a content store
//!
//! Opens the repository in-process (in memory, or on RocksDB with
//! `--data-dir`), seeds it when configured, and runs console commands.

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use treestore::console::{BANNER, PROMPT};
use treestore::{Dispatcher, NodePath, PropertyValue, Repository, StoreConfig, WalkPolicy};

#[derive(Parser)]
#[command(name = "treestore", version, about = "Hierarchical content store shell")]
struct Cli {
    /// Data directory (in-memory when omitted)
    #[arg(long, global = true, env = "TREESTORE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Property served by the reverse index
    #[arg(long, global = true)]
    indexed_property: Option<String>,

    /// Skip creating the seed content
    #[arg(long, global = true)]
    no_seed: bool,

    /// What a walk does with unreadable nodes
    #[arg(long, global = true)]
    walk_policy: Option<WalkPolicyArg>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum WalkPolicyArg {
    Abort,
    Skip,
}

impl From<WalkPolicyArg> for WalkPolicy {
    fn from(arg: WalkPolicyArg) -> Self {
        match arg {
            WalkPolicyArg::Abort => WalkPolicy::Abort,
            WalkPolicyArg::Skip => WalkPolicy::Skip,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive console (default)
    Shell,
    /// Run one console command and exit with its status
    Exec {
        /// The command line, e.g. `ls /unitedcolours`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Dump the tree below a path
    Walk {
        #[arg(default_value = "/")]
        path: String,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = build_config(&cli)?;
    init_logging(cli.verbose, &config.log_level);

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => run_shell(config),
        Commands::Exec { command } => {
            let repo = open_repository(config)?;
            let dispatcher = Dispatcher::new(repo.clone());
            let mut stdout = std::io::stdout().lock();
            let outcome = dispatcher.execute_line(&command.join(" "), &mut stdout)?;
            repo.close()?;
            Ok(outcome.code as u8)
        }
        Commands::Walk { path, format } => {
            let repo = open_repository(config)?;
            let code = run_walk(&repo, &path, format)?;
            repo.close()?;
            Ok(code)
        }
    }
}

/// Defaults, then the config file, then flags
fn build_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => StoreConfig::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config.data_path = Some(dir.clone());
    }
    if let Some(property) = &cli.indexed_property {
        config.indexed_property = property.clone();
    }
    if let Some(policy) = cli.walk_policy {
        config.walk_policy = policy.into();
    }
    if cli.no_seed {
        config.seed.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(verbose: u8, configured: &str) {
    let level = match verbose {
        0 => configured.parse().unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn open_repository(config: StoreConfig) -> anyhow::Result<Repository> {
    let repo = Repository::open(config).context("failed to open the repository")?;
    treestore::seed::seed(&repo).context("failed to seed the repository")?;
    Ok(repo)
}

fn run_shell(config: StoreConfig) -> anyhow::Result<u8> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", BANNER)?;
    writeln!(stdout, "Initialising repository")?;

    let repo = match open_repository(config) {
        Ok(repo) => repo,
        Err(e) => {
            writeln!(stdout, "Error while initialising the repository. Quitting.")?;
            return Err(e);
        }
    };
    writeln!(stdout, "done")?;
    writeln!(stdout)?;

    let dispatcher = Dispatcher::new(repo.clone());
    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        write!(stdout, "{}", PROMPT)?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let outcome = dispatcher.execute_line(&line, &mut stdout)?;
        if outcome.exit {
            break;
        }
    }

    writeln!(stdout, "Shutting down the repository")?;
    let closed = repo.close();
    writeln!(stdout, "Bye!")?;
    closed?;
    Ok(0)
}

fn run_walk(repo: &Repository, raw_path: &str, format: OutputFormat) -> anyhow::Result<u8> {
    let path = NodePath::parse(raw_path)?;
    let snapshot = repo.snapshot();
    let walk = snapshot.walk(&path, repo.config().walk_policy)?;
    let mut stdout = std::io::stdout().lock();

    match format {
        OutputFormat::Text => {
            for entry in walk {
                for line in treestore::console::dispatcher::render_walk_entry(&entry?) {
                    writeln!(stdout, "{}", line)?;
                }
            }
        }
        OutputFormat::Json => {
            let mut nodes = Vec::new();
            for entry in walk {
                let entry = entry?;
                let properties: serde_json::Map<String, serde_json::Value> = entry
                    .node
                    .properties
                    .iter()
                    .map(|(name, value)| (name.clone(), json_value(value)))
                    .collect();
                nodes.push(serde_json::json!({
                    "path": entry.path.to_string(),
                    "depth": entry.depth,
                    "primary_type": entry.node.primary_type,
                    "properties": properties,
                }));
            }
            writeln!(stdout, "{}", serde_json::to_string_pretty(&nodes)?)?;
        }
    }

    Ok(0)
}

fn json_value(value: &PropertyValue) -> serde_json::Value {
    match value {
        PropertyValue::Single(s) => serde_json::Value::String(s.clone()),
        PropertyValue::Multi(values) => serde_json::Value::Array(
            values.iter().cloned().map(serde_json::Value::String).collect(),
        ),
    }
}
