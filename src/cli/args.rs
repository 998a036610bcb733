//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of the default location
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tptctl - manage control planes and the local config that points at them
#[derive(Parser, Debug)]
#[command(name = "tptctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = "THREEPORT_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the local control plane config
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(name = "completion")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Switch the current control plane
    #[command(
        name = "current-control-plane",
        long_about = "Switch the control plane commands talk to.\n\n\
            A control plane already in the local config is made current directly. \
            Otherwise the children of the current control plane are searched and a \
            match is added to the config. Only immediate children are searched.",
        after_help = "\
EXAMPLES:
    # Switch to a control plane already in the config
    tptctl config current-control-plane -n prod

    # Switch to a child of the current control plane
    tptctl config current-control-plane -n staging

IF THE NAME CANNOT BE FOUND:
    Switch to the genesis control plane first, then to each child in turn
    until you reach the one you want.

    When neither a current nor a genesis control plane is in the config,
    the genesis control plane is fetched, added to the config and made
    current. The command still exits 1 unless the genesis control plane is
    the one that was requested."
    )]
    CurrentControlPlane {
        /// Name of the control plane to switch to
        #[arg(short = 'n', long = "control-plane-name", value_name = "NAME")]
        control_plane_name: String,
    },

    /// List the control planes in the local config
    #[command(name = "get-control-planes")]
    GetControlPlanes,

    /// Remove a control plane from the local config
    #[command(name = "delete-control-plane")]
    DeleteControlPlane {
        /// Name of the control plane to remove
        name: String,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_current_control_plane() {
        let cli = Cli::try_parse_from([
            "tptctl",
            "--config",
            "/tmp/c.toml",
            "config",
            "current-control-plane",
            "-n",
            "staging",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        match cli.command {
            Command::Config {
                action: ConfigAction::CurrentControlPlane { control_plane_name },
            } => assert_eq!(control_plane_name, "staging"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn control_plane_name_is_required() {
        let result = Cli::try_parse_from(["tptctl", "config", "current-control-plane"]);
        assert!(result.is_err());
    }
}
