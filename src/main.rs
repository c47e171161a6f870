use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use desksync::db::{OutboxDeliveryChannel, SqliteAccountStore, SqliteAuditSink};
use desksync::delivery::MessageRenderer;
use desksync::web::{AppState, WebServer};
use desksync::{AuthorizationEngine, Config, Database, EffectExecutor, EngineSettings};

/// Environment variable naming an alternative config file.
const CONFIG_PATH_ENV: &str = "DESKSYNC_CONFIG";

#[tokio::main]
async fn main() -> ExitCode {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());

    // Load configuration
    let config = match Config::load_with_env(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = desksync::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        desksync::logging::init_console_only(&config.logging.level);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("DeskSync stopped: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> desksync::Result<()> {
    config.validate()?;

    info!("DeskSync account service");

    let db = Database::open(&config.database.path).await?;
    info!(path = %config.database.path, "Database ready");

    let engine = AuthorizationEngine::new(
        Arc::new(SqliteAccountStore::new(db.pool().clone())),
        EngineSettings::from_config(&config),
    )?;
    let effects = EffectExecutor::new(
        Arc::new(SqliteAuditSink::new(db.pool().clone())),
        Arc::new(OutboxDeliveryChannel::new(
            db.pool().clone(),
            MessageRenderer::new(&config.mail.app_name),
        )),
    );

    let server = WebServer::new(&config.server, AppState::new(Arc::new(engine), effects))?;
    info!("Server configured on {}", server.addr());
    server.run().await
}
