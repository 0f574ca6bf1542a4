#![forbid(unsafe_code)]

mod error;
mod handlers;

pub use error::ApiError;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Instant;
use todo_core::config::ServerSettings;
use todo_core::{AppError, TaskStore};
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
    pub settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(store: TaskStore, settings: ServerSettings) -> Self {
        Self {
            store: Arc::new(store),
            settings: Arc::new(settings),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let root = state.settings.api_root.clone();
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route(
            &root,
            get(handlers::list_tasks)
                .post(handlers::create_task)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            &format!("{root}/"),
            get(handlers::list_tasks)
                .post(handlers::create_task)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            &format!("{root}/reset"),
            post(handlers::reset_tasks).fallback(handlers::method_not_allowed),
        )
        .route(
            &format!("{root}/:id"),
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task)
                .fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::fallback)
        .layer(from_fn(log_requests))
        .layer(DefaultBodyLimit::max(state.settings.max_body_bytes))
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "handled request"
    );
    response
}

/// Binds the configured address and serves until ctrl-c.
pub async fn serve(store: TaskStore, settings: ServerSettings) -> Result<(), AppError> {
    let addr = settings.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|err| AppError::io(format!("bind {addr} failed: {err}")))?;
    let local = listener.local_addr()?;
    info!(
        addr = %local,
        api_root = %settings.api_root,
        store = %store.path().display(),
        "server listening"
    );

    let app = build_router(AppState::new(store, settings));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await;
}

async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            error!(error = %err, "failed to listen for shutdown signal; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
