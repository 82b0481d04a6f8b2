//! computed-settings CLI - main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::WorkspaceArgs;

#[derive(Parser)]
#[command(name = "computed-settings")]
#[command(version)]
#[command(about = "Merge imported configuration files into generated settings regions", long_about = None)]
struct Cli {
    #[command(flatten)]
    workspace: WorkspaceArgs,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every import and write the generated regions
    Apply {
        /// Compute everything but write nothing
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the computed value of every target without writing
    Show {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Fail if any generated region is out of date or disagrees with its file
    Check,

    /// Apply, then apply again whenever a settings or imported file changes
    Watch {
        /// Debounce duration for file-system events in milliseconds
        #[arg(long, default_value = "300")]
        debounce_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let fallback = if cli.verbose {
        "computed_settings=debug,computed_settings_core=debug"
    } else {
        "computed_settings=info,computed_settings_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Apply { dry_run, json } => commands::apply::execute(&cli.workspace, dry_run, json).await,
        Commands::Show { json } => commands::show::execute(&cli.workspace, json).await,
        Commands::Check => commands::check::execute(&cli.workspace).await,
        Commands::Watch { debounce_ms } => commands::watch::execute(&cli.workspace, debounce_ms).await,
    }
}
