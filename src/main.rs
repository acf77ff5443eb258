use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::{api, registry::Registry};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Personal task/epic/subtask tracker with schedule conflict detection")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the taskboard server
    Serve {
        /// Port for the HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Snapshot file path (defaults to the platform data directory)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Keep all state in memory, never touching disk
        #[arg(long)]
        memory: bool,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "taskboard=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let (port, data, memory) = match cli.command {
        Some(Commands::Serve { port, data, memory }) => (port, data, memory),
        // Default: serve on port 3000 with the default snapshot file
        None => (3000, None, false),
    };

    let registry = if memory {
        Registry::open_memory()
    } else if let Some(path) = data {
        Registry::open(path)?
    } else {
        Registry::open_default()?
    };

    let app = api::create_router(registry);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    tracing::info!("taskboard listening on http://127.0.0.1:{port}");

    axum::serve(listener, app).await?;

    Ok(())
}
