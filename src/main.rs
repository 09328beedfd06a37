use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursegen::completion::OpenAiClient;
use coursegen::generation::GenerationConfig;
use coursegen::models::CourseRequest;
use coursegen::state::AppState;
use coursegen::{api, db, mcp};

#[derive(Parser)]
#[command(name = "coursegen")]
#[command(about = "Generate structured courses with a language model")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Database file (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Start MCP server via stdio
    Mcp {
        /// Database file (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Generate one course and print it as JSON without saving it
    Generate {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "Beginner")]
        difficulty: String,

        #[arg(long, default_value = "3")]
        months: u32,
    },
}

/// Initialize tracing with output to stderr (for MCP mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "coursegen=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // MCP mode: stdout is the protocol channel
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open_database(path: Option<PathBuf>) -> anyhow::Result<db::Database> {
    let db = match path {
        Some(path) => db::Database::open(path)?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

fn build_state(db: db::Database) -> anyhow::Result<AppState> {
    let client = OpenAiClient::from_env()?;
    tracing::info!("Using completion model {}", client.model());
    Ok(AppState::new(db, Arc::new(client), GenerationConfig::from_env()))
}

async fn serve(port: u16, db_path: Option<PathBuf>) -> anyhow::Result<()> {
    tracing::info!("Starting coursegen server on port {}", port);

    let state = build_state(open_database(db_path)?)?;
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("coursegen server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Generate prints JSON on stdout, MCP speaks protocol there
    let use_stderr = matches!(
        cli.command,
        Some(Commands::Mcp { .. }) | Some(Commands::Generate { .. })
    );
    init_tracing(use_stderr);

    match cli.command {
        Some(Commands::Serve { port, db }) => serve(port, db).await?,
        Some(Commands::Mcp { db }) => {
            let state = build_state(open_database(db)?)?;
            mcp::run_stdio_server(state).await?;
        }
        Some(Commands::Generate {
            title,
            difficulty,
            months,
        }) => {
            let state = build_state(db::Database::open_memory()?)?;
            let request = CourseRequest::new(title, difficulty, months);
            let entry = state.generator.generate_course(&request).await?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        None => serve(3000, None).await?,
    }

    Ok(())
}
