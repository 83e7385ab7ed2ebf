use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{middleware, Router};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Notify;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers::{
    create_product, delete_product, get_product, list_products, update_product, AppState,
    SharedState,
};
use crate::health::healthcheck;
use crate::middleware::{logging_middleware, rate_limit_middleware, request_id_middleware};
use crate::rate_limiter::{FixedWindowRateLimiter, RateLimiter};
use crate::store::Storage;

pub const MAX_BODY_BYTES: usize = 1 << 20;

/// Build the full router with its middleware stack
pub fn create_app(config: &Config, storage: Storage, rate_limiter: Arc<dyn RateLimiter>) -> Router {
    let state: SharedState = Arc::new(AppState::new(
        storage,
        Arc::clone(&rate_limiter),
        config.env.clone(),
    ));

    let products = Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        );

    let api = Router::new()
        .route("/healthcheck", get(healthcheck))
        .nest("/products", products);

    let app = Router::new().nest("/api/v1", api).with_state(state);
    with_middleware(app, config, rate_limiter)
}

/// Wrap `router` in the service's middleware stack, outermost first:
/// request id, tracing, panic recovery, timeout, CORS, logging, rate limit.
pub fn with_middleware(
    router: Router,
    config: &Config,
    rate_limiter: Arc<dyn RateLimiter>,
) -> Router {
    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::new())
                .layer(TimeoutLayer::new(config.request_timeout))
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

pub struct Server {
    app: Router,
    config: Config,
}

impl Server {
    pub fn new(config: Config, storage: Storage) -> anyhow::Result<Self> {
        let rate_limit = config.rate_limit();
        rate_limit
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid rate limit configuration: {}", e))?;

        let rate_limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowRateLimiter::new(rate_limit));
        let app = create_app(&config, storage, rate_limiter);

        Ok(Self { app, config })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        let addr = listener.local_addr()?;

        tracing::info!(
            addr = %addr,
            env = %self.config.env,
            "server has started"
        );

        let stopping = Arc::new(Notify::new());
        let notify = Arc::clone(&stopping);

        let server = axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            notify.notify_one();
        })
        .into_future();
        tokio::pin!(server);

        let grace = self.config.shutdown_timeout;
        tokio::select! {
            result = &mut server => result?,
            _ = async {
                stopping.notified().await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(
                    timeout = %humantime::format_duration(grace),
                    "shutdown timeout elapsed, abandoning in-flight requests"
                );
            }
        }

        tracing::info!(addr = %addr, env = %self.config.env, "server has stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!(signal = "SIGINT", "signal caught, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!(signal = "SIGTERM", "signal caught, initiating graceful shutdown");
        },
    }
}
