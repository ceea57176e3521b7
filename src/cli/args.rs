//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// dbtdefs - Environment-scoped dbt asset definitions.
#[derive(Debug, Parser)]
#[command(name = "dbtdefs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Environment to resolve resources for (LOCAL, DEV, PROD).
    /// Overrides the ENVIRONMENT variable.
    #[arg(short, long, global = true, value_name = "ENV")]
    pub env: Option<String>,

    /// Path to settings file (overrides ./dbtdefs.yml)
    #[arg(short, long, global = true, env = "DBTDEFS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory to look for settings in (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output, including every dbt log line as emitted
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run `dbt build` for the assets
    Materialize(MaterializeArgs),

    /// List assets and checks (default if no command specified)
    List(ListArgs),

    /// Show the resolved definitions
    Defs(DefsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `materialize` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct MaterializeArgs {
    /// Materialize only these asset keys (comma-separated, e.g. marts/orders)
    #[arg(short, long, value_delimiter = ',', value_name = "KEY")]
    pub select: Vec<String>,

    /// Print the dbt command without running it
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `defs` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DefsArgs {
    /// Output as JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
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
    fn no_subcommand_parses() {
        let cli = Cli::try_parse_from(["dbtdefs"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.env.is_none());
    }

    #[test]
    fn global_env_after_subcommand() {
        let cli = Cli::try_parse_from(["dbtdefs", "defs", "--env", "PROD"]).unwrap();
        assert_eq!(cli.env.as_deref(), Some("PROD"));
        assert!(matches!(cli.command, Some(Commands::Defs(_))));
    }

    #[test]
    fn materialize_select_is_comma_separated() {
        let cli = Cli::try_parse_from([
            "dbtdefs",
            "materialize",
            "--select",
            "marts/orders,stg_orders",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Materialize(args)) => {
                assert_eq!(args.select, vec!["marts/orders", "stg_orders"]);
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["dbtdefs", "-v", "-q"]).is_err());
    }

    #[test]
    fn completions_requires_shell() {
        assert!(Cli::try_parse_from(["dbtdefs", "completions"]).is_err());
        let cli = Cli::try_parse_from(["dbtdefs", "completions", "bash"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Completions(_))));
    }
}
