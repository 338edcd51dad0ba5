//! HTTP surface of the Copydesk copywriting assistant
//!
//! Serves three things from one axum router: the single-page chat UI, the
//! password gate (`POST /api/auth`) and the chat relay (`POST /api/chat`),
//! which forwards conversations and uploaded images to the completion API
//! through `copydesk_core::Relay`.

pub mod error;
pub mod handlers;

pub use error::{Result, ServerError};
pub use handlers::{ChatRequest, HealthResponse};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use copydesk_core::{PromptTemplate, Relay, RelayConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Configuration for the Copydesk server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// CORS allowed origins (if None, allows any origin)
    pub cors_origins: Option<Vec<String>>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Enable request logging
    pub enable_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            enable_cors: false,
            cors_origins: None,
            max_body_size: 10 * 1024 * 1024, // 10MB, room for a screenshot
            enable_logging: true,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Parse and set the bind address from a string.
    pub fn with_bind_addr_str(mut self, addr: &str) -> Result<Self> {
        self.bind_addr = addr
            .parse()
            .map_err(|e| ServerError::config_error(format!("Invalid bind address: {}", e)))?;
        Ok(self)
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// Set allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set maximum request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Enable or disable request logging.
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }
}

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub chat_password: Option<Arc<str>>,
}

/// The Copydesk HTTP server.
pub struct CopydeskServer {
    relay: Arc<Relay>,
    chat_password: Option<Arc<str>>,
    config: ServerConfig,
}

impl CopydeskServer {
    /// Create a new server with default configuration.
    pub fn new(relay: Relay, chat_password: Option<String>) -> Self {
        Self::with_config(relay, chat_password, ServerConfig::default())
    }

    /// Create a new server with custom configuration.
    pub fn with_config(relay: Relay, chat_password: Option<String>, config: ServerConfig) -> Self {
        Self {
            relay: Arc::new(relay),
            chat_password: chat_password.map(Arc::from),
            config,
        }
    }

    /// Build the relay and password gate from a relay configuration.
    pub fn from_relay_config(relay_config: &RelayConfig, prompt: PromptTemplate, config: ServerConfig) -> Self {
        let relay = Relay::from_config(relay_config, prompt);
        Self::with_config(relay, relay_config.chat_password.clone(), config)
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            relay: self.relay.clone(),
            chat_password: self.chat_password.clone(),
        };

        let mut router = Router::new()
            // Single-page UI
            .route("/", get(handlers::index_handler))
            .route("/app.js", get(handlers::app_js_handler))
            .route("/app.css", get(handlers::app_css_handler))
            .route("/health", get(handlers::health_handler))
            // API
            .route("/api/auth", post(handlers::auth_handler))
            .route("/api/chat", post(handlers::chat_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(self.config.max_body_size));

        if self.config.enable_logging {
            router = router.layer(middleware::from_fn(
                |request: axum::http::Request<axum::body::Body>, next: axum::middleware::Next| async {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let method = request.method().clone();
                    let uri = request.uri().clone();

                    if uri.path() == "/health" {
                        log::debug!("Request {} {} {}", request_id, method, uri);
                    } else {
                        log::info!("Request {} {} {}", request_id, method, uri);
                    }

                    let start = std::time::Instant::now();
                    let response = next.run(request).await;
                    log::info!(
                        "Response {} {} completed in {:?}",
                        request_id,
                        response.status(),
                        start.elapsed()
                    );

                    response
                },
            ));
        }

        router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors_layer = if let Some(ref origins) = self.config.cors_origins {
                let origins: std::result::Result<Vec<_>, _> =
                    origins.iter().map(|s| s.parse()).collect();
                match origins {
                    Ok(origins) => CorsLayer::new()
                        .allow_origin(origins)
                        .allow_methods(Any)
                        .allow_headers(Any),
                    Err(_) => {
                        log::warn!("Invalid CORS origin list, falling back to permissive CORS");
                        CorsLayer::permissive()
                    }
                }
            } else {
                CorsLayer::permissive()
            };
            router = router.layer(cors_layer);
        }

        router
    }

    async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(self.config.bind_addr).await.map_err(|e| {
            ServerError::config_error(format!("Failed to bind to {}: {}", self.config.bind_addr, e))
        })
    }

    fn log_startup(&self) {
        log::info!("Copydesk server starting on {}", self.config.bind_addr);
        log::info!("Chat UI: http://{}/", self.config.bind_addr);
        log::info!("Health check: http://{}/health", self.config.bind_addr);
        if !self.relay.is_configured() {
            log::warn!("No upstream API key configured; /api/chat will answer 500");
        }
        if self.chat_password.is_none() {
            log::warn!("No chat password configured; the UI cannot be unlocked");
        }
    }

    /// Start the server and listen for connections.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        let listener = self.bind().await?;
        self.log_startup();

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server will shut down when the provided shutdown signal is received.
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.log_startup();

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))?;

        log::info!("Copydesk server shut down gracefully");
        Ok(())
    }
}

/// Utility function to create a shutdown signal from Ctrl+C.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down...");
        },
    }
}
