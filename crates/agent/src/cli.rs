use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "flowsentry-agent", about = "Flow classification agent")]
pub struct Cli {
    /// Path to the agent configuration file.
    #[arg(short, long, default_value = "/etc/flowsentry/config.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the agent version and exit.
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["flowsentry-agent"]);
        assert_eq!(cli.config, PathBuf::from("/etc/flowsentry/config.yaml"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn version_subcommand_parses() {
        let cli = Cli::parse_from(["flowsentry-agent", "version"]);
        assert!(matches!(cli.command, Some(Command::Version)));
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["flowsentry-agent", "--config", "/tmp/agent.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/tmp/agent.yaml"));
    }
}
