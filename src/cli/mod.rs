//! Command Line Interface module
//!
//! Implements the CLI commands and argument parsing for ssmgate.

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser, Debug, Clone)]
#[command(name = "ssmgate")]
#[command(about = "Broker SSM sessions against interactively resolved EC2 targets")]
#[command(
    long_about = "Resolves an EC2 instance from ssh/scp-style connection information \
(or an interactive prompt) and brokers a time-bounded SSM session against it, \
delegating data transport to session-manager-plugin."
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    #[arg(long, default_value = "ssmgate.toml")]
    pub config_file: String,

    /// AWS credentials profile
    #[arg(short, long)]
    pub profile: Option<String>,

    /// AWS region (skips the region prompt)
    #[arg(short, long)]
    pub region: Option<String>,

    /// Instance id (skips target resolution entirely)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Path to the delegated transport executable
    #[arg(long)]
    pub plugin: Option<String>,

    /// Log level (trace, debug, info, warn, error); defaults to the
    /// configured value
    #[arg(long)]
    pub log_level: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open an interactive shell session on a resolved instance
    Start,

    /// Route an ssh invocation through a brokered session
    Ssh {
        /// The ssh command line, e.g. "-i key.pem ubuntu@host"
        #[arg(short, long)]
        exec: String,
    },

    /// Route an scp invocation through a brokered session
    Scp {
        /// The scp command line, e.g. "./file.txt ubuntu@host:/tmp"
        #[arg(short, long)]
        exec: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Start
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Reset configuration to defaults
    Reset,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the actual command, using default if none provided
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }

    /// Resolve the log level: verbose wins, then the flag, then the
    /// configured value
    pub fn effective_log_level(&self, config: &Config) -> String {
        if self.verbose {
            "debug".to_string()
        } else {
            self.log_level
                .clone()
                .unwrap_or_else(|| config.log_level.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_start() {
        let cli = Cli::parse_from(["ssmgate"]);
        assert!(matches!(cli.command(), Commands::Start));
    }

    #[test]
    fn test_scp_exec_flag() {
        let cli = Cli::parse_from(["ssmgate", "scp", "-e", "./a.txt user@host:/tmp"]);
        match cli.command() {
            Commands::Scp { exec } => assert_eq!(exec, "./a.txt user@host:/tmp"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbose_overrides_log_level() {
        let cli = Cli::parse_from(["ssmgate", "--verbose", "start"]);
        let config = Config {
            log_level: "warn".to_string(),
            ..Config::default()
        };
        assert_eq!(cli.effective_log_level(&config), "debug");
    }

    #[test]
    fn test_configured_log_level_applies_without_flag() {
        let cli = Cli::parse_from(["ssmgate", "start"]);
        let config = Config {
            log_level: "trace".to_string(),
            ..Config::default()
        };
        assert_eq!(cli.effective_log_level(&config), "trace");
    }

    #[test]
    fn test_log_level_flag_overrides_config() {
        let cli = Cli::parse_from(["ssmgate", "--log-level", "error", "start"]);
        let config = Config {
            log_level: "trace".to_string(),
            ..Config::default()
        };
        assert_eq!(cli.effective_log_level(&config), "error");
    }
}
