//! # o2ims CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use o2ims_cli::evaluate::{run_evaluate, EvaluateArgs};
use o2ims_cli::graph::{run_graph, GraphArgs};
use o2ims_cli::replay::{run_replay, ReplayArgs};
use o2ims_cli::status::{run_status, StatusArgs};

/// O2 IMS configuration-applied state machine tooling.
///
/// Evaluates and inspects the ConfigurationApplied state of managed
/// clusters, renders the transition diagram, and replays convergence
/// scenarios.
#[derive(Parser, Debug)]
#[command(name = "o2ims", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding per-cluster state files.
    #[arg(long, global = true, default_value = ".o2ims/configfsm")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a cluster once and persist the result.
    Evaluate(EvaluateArgs),

    /// Show the persisted state of a cluster.
    Status(StatusArgs),

    /// Render the state diagram.
    Graph(GraphArgs),

    /// Replay a scenario file against a manual clock.
    Replay(ReplayArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!(state_dir = %cli.state_dir.display(), "o2ims CLI starting");

    let result = match cli.command {
        Commands::Evaluate(args) => run_evaluate(&args, &cli.state_dir),
        Commands::Status(args) => run_status(&args, &cli.state_dir),
        Commands::Graph(args) => run_graph(&args),
        Commands::Replay(args) => run_replay(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
