//! HTTP server for DeskSync.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::{DeskSyncError, Result};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::create_router;

/// HTTP server for the API.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &ServerConfig, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| {
                DeskSyncError::Config(format!(
                    "invalid listen address {}:{}: {e}",
                    config.host, config.port
                ))
            })?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            rate_limit: Arc::new(
                RateLimitState::new(config.login_rate_limit, config.login_rate_window_secs)
                    .trust_forwarded_headers(config.trust_forwarded_headers),
            ),
            cors_origins: config.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> Result<()> {
        let router = create_router(self.app_state, self.rate_limit.clone(), &self.cors_origins);

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        self.rate_limit.start_cleanup_task();
        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}
