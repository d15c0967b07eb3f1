mod cmd;
mod output;
mod root;
mod view;

use clap::{Parser, Subcommand};
use cmd::scenario::ScenarioSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "o2d",
    about = "Order-to-delivery training simulator: walk an order through its stages and fix the delays",
    version,
    propagate_version = true
)]
struct Cli {
    /// Simulator root (default: auto-detect from .o2d/)
    #[arg(long, global = true, env = "O2D_ROOT")]
    root: Option<PathBuf>,

    /// Scenario file (default: .o2d/scenario.yaml, else the built-in scenario)
    #[arg(long, global = true, env = "O2D_SCENARIO")]
    scenario: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the built-in scenario to .o2d/scenario.yaml for editing
    Init {
        /// Overwrite an existing scenario file
        #[arg(long)]
        force: bool,
    },

    /// Inspect the active scenario
    Scenario {
        #[command(subcommand)]
        subcommand: ScenarioSubcommand,
    },

    /// Play the simulation interactively, one command per line on stdin
    Play {
        /// Allow advancing past delays that were never fixed
        #[arg(long)]
        permissive: bool,
    },

    /// Walk the whole scenario automatically and print the fix log
    Run {
        /// Allow advancing past delays that were never fixed
        #[arg(long)]
        permissive: bool,

        /// Leave every delay unfixed (requires the permissive policy)
        #[arg(long)]
        skip_fixes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let scenario = cli.scenario.as_deref();

    let result = match cli.command {
        Commands::Init { force } => cmd::init::run(&root, force, cli.json),
        Commands::Scenario { subcommand } => {
            cmd::scenario::run(&root, scenario, subcommand, cli.json)
        }
        Commands::Play { permissive } => cmd::play::run(&root, scenario, permissive, cli.json),
        Commands::Run {
            permissive,
            skip_fixes,
        } => cmd::run::run(&root, scenario, permissive, skip_fixes, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
