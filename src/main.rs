use anyhow::{Context, Result};
use callcoach::enrichment::{CompanyResearch, ResearchRequest, ResponsesClient};
use callcoach::http::{create_router, AppState};
use callcoach::session::{SessionConfig, TrainingDeps};
use callcoach::store::{MemoryStore, TrainingStore};
use callcoach::voice::{ConvaiBackend, InputDevices, StaticInputDevices, SystemInputDevices};
use callcoach::{Config, ConvaiClient};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "callcoach")]
#[command(about = "Voice roleplay training for sales teams")]
struct Args {
    /// Config file, extension optional
    #[arg(short, long, default_value = "config/callcoach")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,

    /// Research one company and print the profile as JSON
    Research {
        company: String,

        #[arg(long)]
        website: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config))?;

    info!("Loaded config: {}", cfg.service.name);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg).await,
        Command::Research { company, website } => research(cfg, company, website).await,
    }
}

async fn research(cfg: Config, company: String, website: Option<String>) -> Result<()> {
    let client = ResponsesClient::new(cfg.enrichment)?;
    let profile = client
        .research(&ResearchRequest {
            company_name: company,
            company_website: website,
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

async fn serve(cfg: Config) -> Result<()> {
    let store: Arc<dyn TrainingStore> = match cfg.store.seed_path.as_deref() {
        Some(path) => Arc::new(MemoryStore::from_seed_file(path)?),
        None => Arc::new(MemoryStore::new()),
    };

    let devices: Arc<dyn InputDevices> = match cfg.voice.input_devices.as_deref() {
        Some(labels) => Arc::new(StaticInputDevices::new(labels)),
        None => Arc::new(SystemInputDevices),
    };

    let voice = Arc::new(ConvaiBackend::new(
        &cfg.voice.ws_url,
        cfg.voice.agent_id.clone(),
        cfg.voice.api_key.clone(),
    ));

    let analysis = Arc::new(ConvaiClient::new(
        &cfg.voice.api_base,
        cfg.voice.api_key.as_deref(),
        Duration::from_secs(cfg.analysis.timeout_secs),
    )?);

    let research = Arc::new(ResponsesClient::new(cfg.enrichment.clone())?);

    let session_config = SessionConfig {
        transport: cfg.voice.transport,
        poll: cfg.analysis.poll_policy(),
        id_poll_attempts: cfg.voice.id_poll_attempts,
        id_poll_interval: cfg.voice.id_poll_interval(),
        api_base: cfg.voice.api_base.clone(),
    };

    let deps = TrainingDeps {
        voice,
        devices,
        analysis,
        store,
    };

    let state = AppState::new(deps, research, session_config, cfg.dashboard.recent_limit);
    let app = create_router(state.clone());

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Waits for Ctrl+C, then stops in-flight analysis polling so pending
/// calls save what they have.
async fn shutdown_signal(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }

    info!("Shutdown requested");
    for controller in state.controllers().await {
        controller.abandon().await;
    }
}
