//!
//! coordinator dashboard HTTP server
//! ---------------------------------
//! This module defines the Axum-based API-proxy surface of the dashboard.
//!
//! Responsibilities:
//! - One route per coordinator resource (tasks, artifacts, attachments,
//!   workers, groups, admin), each a single-attempt pass-through.
//! - Uniform validation and error relay, see `proxy`.
//! - Startup logging and graceful shutdown on Ctrl-C / SIGTERM.
//!
//! The server holds no per-user state: callers send their token and the
//! coordinator address with every request.

use std::net::SocketAddr;

use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tracing::info;

use crate::config::ServerConfig;
use crate::coordinator::CoordinatorClient;

pub mod admin;
pub mod attachments;
pub mod auth;
pub mod groups;
pub mod proxy;
pub mod tasks;
pub mod workers;

/// Shared server state injected into all handlers.
#[derive(Clone, Default)]
pub struct AppState {
    /// Connection pool for outbound coordinator calls.
    pub coordinator: CoordinatorClient,
}

impl AppState {
    pub fn new(coordinator: CoordinatorClient) -> Self { Self { coordinator } }
}

/// Build the full route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { Json(serde_json::json!({"status": "ok"})) }))
        // auth
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify", post(auth::verify))
        .route("/api/auth/change-password", post(auth::change_password))
        // tasks and artifacts
        .route("/api/tasks/submit", post(tasks::submit))
        .route("/api/tasks/query", post(tasks::query))
        .route("/api/tasks/{uuid}", get(tasks::get_task))
        .route("/api/tasks/{uuid}/cancel", post(tasks::cancel))
        .route("/api/tasks/{uuid}/labels", post(tasks::update_labels))
        .route("/api/tasks/{uuid}/spec", post(tasks::change_spec))
        .route("/api/tasks/{uuid}/artifacts/upload", post(tasks::upload_artifact))
        .route(
            "/api/tasks/{uuid}/artifacts/{content_type}",
            get(tasks::download_artifact).delete(tasks::delete_artifact),
        )
        // attachments
        .route("/api/attachments/upload", post(attachments::upload))
        .route("/api/attachments/download", post(attachments::download))
        .route("/api/attachments/query", post(attachments::query))
        .route("/api/attachments/delete", post(attachments::delete))
        // workers
        .route("/api/workers/query", post(workers::query))
        .route("/api/workers/{id}", get(workers::get_worker))
        .route("/api/workers/{id}/cancel", delete(workers::cancel))
        .route("/api/workers/{id}/tags", post(workers::replace_tags))
        .route("/api/workers/{id}/groups", post(workers::update_groups))
        // groups
        .route("/api/groups/create", post(groups::create))
        .route("/api/groups/{group_name}", get(groups::get_group))
        .route("/api/groups/{group_name}/users", post(groups::update_users).delete(groups::remove_users))
        .route("/api/users/groups", post(groups::my_groups))
        // admin
        .route("/api/admin/workers/{id}/cancel", delete(admin::cancel_worker))
        .route("/api/admin/groups/{group_name}/storage-quota", post(admin::set_storage_quota))
        .route("/api/admin/users", get(admin::mock_list_users))
        .route("/api/admin/users/groups", get(admin::mock_list_groups))
        .route("/api/admin/users/create", post(admin::create_user))
        .route("/api/admin/users/{username}", get(admin::mock_get_user))
        .route("/api/admin/users/{username}/password", post(admin::reset_password))
        .route("/api/admin/shutdown", post(admin::shutdown))
        .with_state(state)
}

fn log_startup(cfg: &ServerConfig) {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let cwd = std::env::current_dir().ok();
    info!(
        target: "startup",
        "coordinator dashboard starting: bind={}, http_port={}, RUST_LOG='{}', cwd={:?}",
        cfg.bind_addr, cfg.http_port, rust_log, cwd
    );
}

/// Start the dashboard HTTP server and block until a shutdown signal arrives.
pub async fn run_with_config(cfg: ServerConfig) -> anyhow::Result<()> {
    log_startup(&cfg);
    let app = router(AppState::new(CoordinatorClient::new()));

    let addr: SocketAddr = cfg.socket_addr();
    info!(target: "startup", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!(target: "startup", "server stopped");
    Ok(())
}

/// Convenience entry point using defaults (port 3000 on all interfaces).
pub async fn run() -> anyhow::Result<()> {
    run_with_config(ServerConfig::default()).await
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => { sigterm.recv().await; }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
