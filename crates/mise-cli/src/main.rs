mod cmd;
mod console;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, generate::DiagramArg, key::KeySubcommand, view::ViewTarget,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mise",
    about = "Turn ideas into PRDs, context cards and architecture diagrams",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .mise/ or .git/)
    #[arg(long, global = true, env = "MISE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the generation panel in the browser
    Ui {
        /// Port to listen on
        #[arg(long, default_value = "3142")]
        port: u16,
        /// Don't open the browser automatically
        #[arg(long)]
        no_open: bool,
    },

    /// Manage the stored OpenAI API key
    Key {
        #[command(subcommand)]
        subcommand: KeySubcommand,
    },

    /// Generate a PRD from a product idea
    Prd {
        /// The idea, in plain words
        #[arg(required = true, num_args = 1..)]
        idea: Vec<String>,
    },

    /// Generate context cards for the workspace's source files
    Cards,

    /// Generate a diagram from the latest PRD
    Diagram {
        #[arg(value_enum)]
        kind: DiagramArg,
    },

    /// Locate a generated artifact
    View {
        #[arg(value_enum)]
        target: ViewTarget,
        /// Explicit file under the output directory, absolute or relative to the workspace root
        #[arg(long)]
        file: Option<PathBuf>,
        /// Open with the system viewer
        #[arg(long)]
        open: bool,
    },

    /// List recorded artifacts
    Manifest,

    /// Inspect the workspace configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Ui { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let json = cli.json;

    let result = match cli.command {
        Commands::Ui { port, no_open } => cmd::ui::run(&root, port, no_open),
        Commands::Key { subcommand } => cmd::key::run(&root, subcommand, json),
        Commands::Prd { idea } => cmd::generate::run_prd(&root, idea, json),
        Commands::Cards => cmd::generate::run_cards(&root, json),
        Commands::Diagram { kind } => cmd::generate::run_diagram(&root, kind, json),
        Commands::View { target, file, open } => cmd::view::run(&root, target, file, open, json),
        Commands::Manifest => cmd::manifest::run(&root, json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, json),
    };
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
