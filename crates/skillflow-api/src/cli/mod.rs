//! CLI command definitions for the `skillflow` binary.
//!
//! Uses clap derive macros for argument parsing. Resource commands follow a
//! noun-verb pattern (`skillflow skill list`, `skillflow execution show`).

pub mod execution;
pub mod run;
pub mod skill;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Run multi-step customer-success skills.
#[derive(Parser)]
#[command(name = "skillflow", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter implied by `--quiet` / `-v` (overridden by `RUST_LOG`).
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info,skillflow=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage skill definitions (import, list, show, delete, enable, disable).
    Skill {
        #[command(subcommand)]
        action: skill::SkillCommand,
    },

    /// Run a skill against a set of inputs.
    Run(run::RunArgs),

    /// Inspect past executions.
    #[command(alias = "exec")]
    Execution {
        #[command(subcommand)]
        action: execution::ExecutionCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_maps_to_filter() {
        let cli = Cli::parse_from(["skillflow", "-vv", "skill", "list"]);
        assert_eq!(cli.log_filter(), "trace");

        let cli = Cli::parse_from(["skillflow", "--quiet", "execution", "list"]);
        assert_eq!(cli.log_filter(), "error");
    }

    #[test]
    fn test_run_collects_repeated_inputs() {
        let cli = Cli::parse_from([
            "skillflow",
            "run",
            "renewal-outreach",
            "--input",
            "customer_id=cus_1",
            "-i",
            "days=30",
            "--approve",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.skill.as_deref(), Some("renewal-outreach"));
                assert_eq!(args.inputs, vec!["customer_id=cus_1", "days=30"]);
                assert!(args.approve);
            }
            _ => panic!("expected run command"),
        }
    }
}
