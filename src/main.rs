use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use vacancy_intake::{
    create_router, session, AppState, Config, Dispatcher, FsSubmissionStore, NatsGateway,
    SessionManager,
};

/// Vacancy intake bot: track selection, questions, voice capture
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Config file path, extension optional
    #[arg(short, long, default_value = "config/vacancy-intake")]
    config: String,

    /// Do not start the admin HTTP API
    #[arg(long)]
    no_http: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!("Failed to read .env file: {}", e);
        }
    }

    let args = Args::parse();
    let cfg = Config::load(&args.config).context("Failed to load configuration")?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    info!("Vacancy Intake v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Tracks: {}", cfg.tracks.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", "));

    if cfg.gateway.token.is_none() {
        warn!("BOT_TOKEN is not set, connecting to NATS without a token");
    }

    let gateway = Arc::new(
        NatsGateway::connect(
            &cfg.gateway.nats_url,
            cfg.gateway.token.as_deref(),
            cfg.gateway.subject_prefix.clone(),
            cfg.fetch_timeout(),
        )
        .await?,
    );

    let applications_dir = cfg.applications_dir();
    info!("Applications directory: {}", applications_dir.display());
    let store = Arc::new(FsSubmissionStore::new(applications_dir));

    let manager = Arc::new(
        SessionManager::new(cfg.catalog()?, gateway.clone(), store, cfg.session_config()),
    );

    let sweeper = session::spawn_sweeper(Arc::clone(&manager), cfg.sweep_interval());

    let http_task = if cfg.service.http.enabled && !args.no_http {
        let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;
        info!("Admin API listening on {}", addr);

        let router = create_router(AppState::new(Arc::clone(&manager)));
        Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!("Admin API stopped: {}", e);
            }
        }))
    } else {
        None
    };

    let events = gateway.subscribe_events().await?;
    let dispatcher = Dispatcher::new(
        Arc::clone(&manager),
        cfg.sessions.queue_capacity,
        cfg.worker_idle(),
    );

    tokio::select! {
        _ = dispatcher.run(events) => {
            warn!("Inbound subscription ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
    }

    sweeper.abort();
    if let Some(task) = http_task {
        task.abort();
    }

    info!("{} active session(s) dropped at shutdown", manager.len().await);

    Ok(())
}
