//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::reconcile::{AccountId, FeatureId};

/// monitorkit - install and reconcile monitoring agents.
#[derive(Debug, Parser)]
#[command(name = "monitorkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (default /etc/monitorkit/config.yml)
    #[arg(short, long, global = true, env = "MONITORKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install or reinstall agents and record the result
    Install(InstallArgs),

    /// Remove the APM agent from some or all PHP versions
    Uninstall(UninstallArgs),

    /// Show what is recorded as installed
    Status(StatusArgs),
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InstallArgs {
    /// 40-character license key
    #[arg(long, env = "MONITORKIT_LICENSE_KEY", hide_env_values = true)]
    pub license_key: String,

    /// Name this server reports under
    #[arg(long)]
    pub server_name: String,

    /// Account id to link installs to (digits only)
    #[arg(long, value_parser = parse_account_id, default_value = "")]
    pub account_id: AccountId,

    /// Install the infrastructure agent
    #[arg(long)]
    pub infrastructure: bool,

    /// Install the APM agent
    #[arg(long)]
    pub apm: bool,

    /// PHP versions to instrument (comma-separated, e.g. 8.1,8.2)
    #[arg(long, value_delimiter = ',')]
    pub php: Vec<String>,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Fail instead of waiting when another run holds the lock
    #[arg(long)]
    pub no_wait: bool,
}

/// Arguments for the `uninstall` command.
#[derive(Debug, Clone, clap::Args)]
pub struct UninstallArgs {
    /// Feature to remove
    #[arg(value_enum)]
    pub feature: FeatureId,

    /// Only these PHP versions (comma-separated); default is all
    #[arg(long, value_delimiter = ',')]
    pub php: Vec<String>,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Fail instead of waiting when another run holds the lock
    #[arg(long)]
    pub no_wait: bool,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_account_id(raw: &str) -> Result<AccountId, String> {
    AccountId::parse(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_install() {
        let cli = Cli::parse_from([
            "monitorkit",
            "install",
            "--license-key",
            "k",
            "--server-name",
            "web01",
            "--apm",
            "--php",
            "8.1,8.2",
            "--account-id",
            "42",
        ]);

        let Commands::Install(args) = cli.command else {
            panic!("Expected Install command");
        };
        assert!(args.apm);
        assert!(!args.infrastructure);
        assert_eq!(args.php, ["8.1", "8.2"]);
        assert_eq!(args.account_id.get(), Some(42));
        assert!(!args.no_wait);
    }

    #[test]
    fn parses_no_wait() {
        let cli = Cli::parse_from(["monitorkit", "uninstall", "apm", "--no-wait"]);
        let Commands::Uninstall(args) = cli.command else {
            panic!("Expected Uninstall command");
        };
        assert!(args.no_wait);
    }

    #[test]
    fn account_id_defaults_to_unlinked() {
        let cli = Cli::parse_from([
            "monitorkit",
            "install",
            "--license-key",
            "k",
            "--server-name",
            "web01",
        ]);
        let Commands::Install(args) = cli.command else {
            panic!("Expected Install command");
        };
        assert_eq!(args.account_id.get(), None);
    }

    #[test]
    fn rejects_non_numeric_account_id() {
        let result = Cli::try_parse_from([
            "monitorkit",
            "install",
            "--license-key",
            "k",
            "--server-name",
            "web01",
            "--account-id",
            "abc",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_uninstall_feature() {
        let cli = Cli::parse_from(["monitorkit", "uninstall", "apm", "--php", "7.4"]);
        let Commands::Uninstall(args) = cli.command else {
            panic!("Expected Uninstall command");
        };
        assert_eq!(args.feature, FeatureId::Apm);
        assert_eq!(args.php, ["7.4"]);
        assert!(!args.no_wait);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["monitorkit", "status", "--json", "--quiet"]);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Status(StatusArgs { json: true })));
    }
}
