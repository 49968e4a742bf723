//! `hexaboardd` — the HexaBoard onboarding server binary.
//!
//! Usage:
//!   hexaboardd -c /etc/hexaboard/server.toml [--listen <addr>]

mod bootstrap;
mod config;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use tracing::info;

use hexaboard_core::Module;
use onboard::service::completer::{DisabledCompleter, HttpCompleter, TextCompleter};
use onboard::service::outbox::{LogMailer, Mailer};
use onboard::service::{OnboardConfig, OnboardService};

use config::ServerConfig;

/// HexaBoard onboarding server.
#[derive(Parser, Debug)]
#[command(name = "hexaboardd", about = "HexaBoard onboarding server")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides the config file).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = std::path::PathBuf::from(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    let listen = cli
        .listen
        .unwrap_or_else(|| server_config.listen.clone());

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = hexaboard_core::ServiceConfig {
        data_dir: Some(data_dir.clone()),
        listen: listen.clone(),
        ..Default::default()
    };

    let store: Arc<dyn hexaboard_doc::DocumentStore> = Arc::new(
        hexaboard_doc::SqliteDocStore::open(&core_config.resolve_doc_path())
            .map_err(|e| anyhow::anyhow!("failed to open document store: {}", e))?,
    );
    let identity: Arc<dyn hexaboard_identity::IdentityProvider> = Arc::new(
        hexaboard_identity::LocalIdentityProvider::open(
            &core_config.resolve_identity_path(),
            &server_config.auth.jwt_secret,
            server_config.auth.token_ttl_secs,
        )
        .map_err(|e| anyhow::anyhow!("failed to open identity store: {}", e))?,
    );
    let media: Arc<dyn hexaboard_media::MediaStore> = Arc::new(
        hexaboard_media::FileStore::open(
            &core_config.resolve_media_dir(),
            &server_config.storage.public_media_base,
        )
        .map_err(|e| anyhow::anyhow!("failed to open media store: {}", e))?,
    );

    let completer: Arc<dyn TextCompleter> = if server_config.chat.completion_endpoint.is_empty() {
        info!("no text backend configured; chat fallback is the canned reply");
        Arc::new(DisabledCompleter)
    } else {
        Arc::new(HttpCompleter::new(
            &server_config.chat.completion_endpoint,
            &server_config.chat.api_key,
        ))
    };

    // Bootstrap: ensure the admin identity exists.
    bootstrap::ensure_admin(&identity, &server_config)?;

    // Build the onboard module.
    let service = OnboardService::new(
        store,
        identity,
        media,
        completer,
        OnboardConfig::default(),
    );
    let onboard_module = onboard::OnboardModule::new(Arc::clone(&service));
    info!("Onboard module initialized");

    // Background outbox worker.
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
    let worker_cancel = onboard::worker::start(
        Arc::clone(&service),
        mailer,
        onboard::worker::WorkerConfig {
            poll_interval: server_config.mail.poll_interval_secs,
            max_attempts: server_config.mail.max_attempts,
        },
    );

    // Build router: system endpoints + module routes.
    let mut app: Router = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));
    app = app.merge(onboard_module.routes());

    // Start server.
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!("HexaBoard server listening on {}", listen);
    axum::serve(listener, app).await?;

    worker_cancel.cancel();
    Ok(())
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({"status": "ok"}))
}

async fn version() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "hexaboardd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
