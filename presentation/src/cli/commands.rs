//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use waverun_domain::Level;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for waverun
#[derive(Parser, Debug)]
#[command(name = "waverun")]
#[command(author, version, about = "Tool-run records for security assessment waves")]
#[command(long_about = r#"
waverun tracks tool runs: command templates bound to a wave, a scope,
a host or a port of an assessment.

Configuration files are loaded from (in priority order):
1. WAVERUN_* environment variables
2. --config <path>     Explicit config file
3. ./waverun.toml      Project-level config
4. ~/.config/waverun/config.toml   Global config

Example:
  waverun add nmap --level host --wave W1 --host 10.0.0.1
  waverun start <ID> --runner worker-1
  waverun command <ID>
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Snapshot file of the document store (overrides config)
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Output namespace, usually the assessment name (overrides config)
    #[arg(long, global = true, value_name = "NAME")]
    pub namespace: Option<String>,

    /// Output format (overrides config)
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Target of a new tool run
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    /// Hierarchy level: wave, domain, network, host (or ip), port
    #[arg(long)]
    pub level: Level,

    /// Owning wave
    #[arg(long)]
    pub wave: String,

    /// Domain or network (domain / network levels)
    #[arg(long, default_value = "")]
    pub scope: String,

    /// Host address (host / port levels)
    #[arg(long, default_value = "")]
    pub host: String,

    /// Port number (port level)
    #[arg(long, default_value = "")]
    pub port: String,

    /// Port protocol (port level)
    #[arg(long, default_value = "tcp")]
    pub protocol: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a tool run (returns the existing one if already registered)
    Add {
        /// Tool name, matching a command template
        name: String,

        #[command(flatten)]
        target: TargetArgs,

        /// Explicit command text instead of the catalog template
        #[arg(long)]
        text: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show a tool run
    Show { id: String },

    /// List tool runs
    List {
        /// Only tool runs of this wave
        #[arg(long)]
        wave: Option<String>,
    },

    /// Mark a tool run as running
    Start {
        id: String,
        /// Worker running the tool
        #[arg(long)]
        runner: String,
    },

    /// Mark a tool run as done
    Done {
        id: String,
        /// File produced by the run
        #[arg(long, default_value = "")]
        result_file: String,
    },

    /// Mark a tool run as not done (back to idle)
    Reset { id: String },

    /// Mark a tool run as failed
    Error { id: String },

    /// Flag a tool run as out of time
    #[command(name = "oot")]
    OutOfTime { id: String },

    /// Clear the out-of-time flag
    InTime { id: String },

    /// Flag a tool run as out of scope
    #[command(name = "oos")]
    OutOfScope { id: String },

    /// Clear the out-of-scope flag
    InScope { id: String },

    /// Replace the status flags (running, done, error, OOT, OOS)
    Status {
        id: String,
        flags: Vec<String>,
    },

    /// Replace the notes
    Note { id: String, text: String },

    /// Append a tag
    Tag { id: String, tag: String },

    /// Set an extra info value (parsed as JSON, else stored as a string)
    Info {
        id: String,
        key: String,
        value: String,
    },

    /// Print the output directory and resolved command of a tool run
    Command { id: String },

    /// Delete a tool run
    Delete { id: String },

    /// Show configuration file locations and the merged configuration
    ShowConfig,
}

impl Command {
    /// Whether the command changes the store.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Command::Show { .. }
                | Command::List { .. }
                | Command::Command { .. }
                | Command::ShowConfig
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let cli = Cli::parse_from([
            "waverun", "add", "nikto", "--level", "port", "--wave", "W1", "--host", "10.0.0.1",
            "--port", "80", "--tag", "web", "--tag", "web",
        ]);
        match cli.command {
            Command::Add { name, target, tags, .. } => {
                assert_eq!(name, "nikto");
                assert_eq!(target.level, Level::Port);
                assert_eq!(target.protocol, "tcp");
                assert_eq!(tags, vec!["web", "web"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_level() {
        let result = Cli::try_parse_from([
            "waverun", "add", "x", "--level", "cluster", "--wave", "W1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overlay_subcommand_names() {
        let cli = Cli::try_parse_from(["waverun", "oot", "abc"]).unwrap();
        assert!(matches!(cli.command, Command::OutOfTime { .. }));
        let cli = Cli::try_parse_from(["waverun", "in-scope", "abc", "-v"]).unwrap();
        assert!(matches!(cli.command, Command::InScope { .. }));
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_is_mutating() {
        assert!(!Command::ShowConfig.is_mutating());
        assert!(Command::Reset { id: "a".to_string() }.is_mutating());
    }
}
