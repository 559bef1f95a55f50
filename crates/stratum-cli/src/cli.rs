//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stratum_sources::DEFAULT_PREFIX;

/// Stratum - resolve layered configuration from files, environment and command line
#[derive(Parser, Debug)]
#[command(name = "stratum")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file to load (.toml, .json, .yaml, .yml, .cfg); repeatable
    #[arg(short, long = "config", value_name = "FILE", global = true)]
    pub configs: Vec<PathBuf>,

    /// Prefix of environment variables that configure keys
    #[arg(long, value_name = "PREFIX", default_value = DEFAULT_PREFIX, global = true)]
    pub env_prefix: String,

    /// Ignore the environment
    #[arg(long, global = true)]
    pub no_env: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
///
/// Every command takes overrides after `--` in the form `--key=value`, e.g.
/// `stratum get user.name -- --user.name=ann`.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the value of one or more keys
    Get {
        /// Dotted keys to resolve
        #[arg(required = true)]
        keys: Vec<String>,

        #[arg(last = true, value_name = "OVERRIDES")]
        overrides: Vec<String>,
    },

    /// Print every configured key with its value
    Dump {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        #[arg(last = true, value_name = "OVERRIDES")]
        overrides: Vec<String>,
    },

    /// Show where the value of a key came from
    Explain {
        /// Dotted key to explain
        key: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        #[arg(last = true, value_name = "OVERRIDES")]
        overrides: Vec<String>,
    },

    /// Expand `{dotted.key}` markers in a piece of text
    Interpolate {
        text: String,

        #[arg(last = true, value_name = "OVERRIDES")]
        overrides: Vec<String>,
    },
}

impl Commands {
    /// Command-line configuration given after `--`
    pub fn overrides(&self) -> &[String] {
        match self {
            Commands::Get { overrides, .. }
            | Commands::Dump { overrides, .. }
            | Commands::Explain { overrides, .. }
            | Commands::Interpolate { overrides, .. } => overrides,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_follow_double_dash() {
        let cli = Cli::parse_from([
            "stratum",
            "-c",
            "a.toml",
            "get",
            "x",
            "y",
            "--",
            "--x=1",
            "--(y,z)=2",
        ]);
        assert_eq!(cli.configs, vec![PathBuf::from("a.toml")]);
        assert_eq!(cli.env_prefix, "STRATUM_");
        assert_eq!(
            cli.command,
            Commands::Get {
                keys: vec!["x".into(), "y".into()],
                overrides: vec!["--x=1".into(), "--(y,z)=2".into()],
            }
        );
        assert_eq!(cli.command.overrides().len(), 2);
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::parse_from(["stratum", "dump", "--json", "--no-env", "--config", "b.cfg"]);
        assert!(cli.no_env);
        assert_eq!(cli.configs, vec![PathBuf::from("b.cfg")]);
        assert!(matches!(cli.command, Commands::Dump { json: true, .. }));
    }
}
