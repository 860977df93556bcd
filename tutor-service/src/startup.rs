//! Application startup and lifecycle management.

use crate::config::{LlmProviderKind, TutorConfig};
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::mock::MockTextProvider;
use crate::services::providers::TextProvider;
use crate::services::Database;
use crate::{build_router, AppState};
use axum::Router;
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

/// Provider selected by `LLM_PROVIDER`.
pub fn text_provider(config: &TutorConfig) -> Result<Arc<dyn TextProvider>, AppError> {
    match config.llm.provider {
        LlmProviderKind::Gemini => {
            let provider = GeminiTextProvider::new(GeminiConfig {
                api_key: config.llm.api_key.clone(),
                model: config.llm.text_model.clone(),
                timeout: Duration::from_secs(config.llm.timeout_seconds),
            })?;
            tracing::info!(model = %config.llm.text_model, "Initialized Gemini text provider");
            Ok(Arc::new(provider))
        }
        LlmProviderKind::Mock => {
            tracing::warn!("Using mock text provider; responses are canned");
            Ok(Arc::new(MockTextProvider::new()))
        }
    }
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: TutorConfig) -> Result<Self, AppError> {
        let provider = text_provider(&config)?;
        Self::build_with_provider(config, provider).await
    }

    /// Build with an explicit provider. Tests inject a scripted one here.
    pub async fn build_with_provider(
        config: TutorConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let db = Database::connect(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            e
        })?;

        let addr = config.common.socket_addr();
        let state = AppState::new(config, db, provider);
        let router = build_router(state);

        // Port 0 = random port for testing
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Tutor service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT/SIGTERM.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
