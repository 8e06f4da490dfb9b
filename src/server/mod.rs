//! HTTP server: routing, shared state and graceful shutdown.

pub mod health;
pub mod webhooks;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::intake::Normalizer;
use crate::pipeline::Dispatcher;
use crate::pubsub::RetryTracker;

pub use webhooks::{process_delivery, AbandonReason, Outcome};

/// Application state shared across handlers
pub struct AppState {
    pub config: ServiceConfig,
    pub normalizer: Normalizer,
    pub tracker: RetryTracker,
    pub dispatcher: Arc<dyn Dispatcher>,
}

impl AppState {
    pub fn new(config: ServiceConfig, normalizer: Normalizer, dispatcher: Arc<dyn Dispatcher>) -> Self {
        let tracker = RetryTracker::new(config.tracker);
        Self {
            config,
            normalizer,
            tracker,
            dispatcher,
        }
    }

    pub fn max_endpoint_retries(&self) -> u32 {
        self.config.max_endpoint_retries
    }
}

/// Build the router with all routes and middleware.
///
/// A panic inside a handler becomes a 500 response; that is the only path to
/// a non-2xx answer from the push webhook.
pub fn create_router(state: Arc<AppState>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/readiness", get(health::readiness_check))
        .route("/health/liveness", get(health::liveness_check))
        .route("/health/startup", get(health::startup_check))
        .route("/health/info", get(health::service_info));

    let webhook_routes = Router::new().route(
        "/webhooks/pubsub",
        post(webhooks::handle_pubsub_push).get(webhooks::pubsub_webhook_info),
    );

    Router::new()
        .route("/", get(health::root))
        .merge(health_routes)
        .merge(webhook_routes)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl-C or SIGTERM, then finish in-flight requests.
pub async fn start_server(state: Arc<AppState>, addr: SocketAddr) -> Result<(), std::io::Error> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Intake API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Intake API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
