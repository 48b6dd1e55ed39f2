//! Backend for the terminal portfolio: sessions, command telemetry, uploads, leads, and the
//! admin read APIs, served over HTTP with axum.
//!
//! Handlers share an [`AppState`] holding the persistence backend, the blob store, the URL
//! signer, and the admin gate. [`router`] wires the routes; `site_server` binds it.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod auth;
pub mod blob;
pub mod config;
pub mod error;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

pub use auth::AdminGate;
pub use blob::{BlobStore, LocalBlobStore, MemoryBlobStore, UrlSigner};
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use store::{MemoryStore, SiteStore, SqliteStore};

/// Largest accepted request body (multipart uploads included).
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Sessions, logs, file records, and leads.
    pub store: Arc<dyn SiteStore>,
    /// Uploaded bytes.
    pub blobs: Arc<dyn BlobStore>,
    /// Signs and checks blob URLs.
    pub signer: Arc<UrlSigner>,
    /// Admin password check.
    pub gate: Arc<AdminGate>,
}

impl AppState {
    /// Builds state from storage backends and startup configuration.
    pub fn new(store: Arc<dyn SiteStore>, blobs: Arc<dyn BlobStore>, config: &ServerConfig) -> Self {
        Self {
            store,
            blobs,
            signer: Arc::new(UrlSigner::new(
                config.signing_key.clone(),
                config.signed_url_ttl,
            )),
            gate: Arc::new(AdminGate::new(config.admin_password.as_deref())),
        }
    }
}

/// Builds the HTTP router.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/files", get(routes::files::list_files))
        .route(
            "/api/files/:id",
            get(routes::files::download).delete(routes::files::delete_file),
        )
        .route("/api/dashboard", get(routes::files::dashboard))
        .route("/api/admin/leads", get(routes::admin::leads))
        .route("/api/admin/logs", get(routes::admin::logs))
        .route("/api/admin/sessions", get(routes::admin::sessions))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/api/health", get(routes::health))
        .route(
            "/api/research/session/create",
            post(routes::session::create_session),
        )
        .route(
            "/api/research/behavioral/track",
            post(routes::session::track_command),
        )
        .route("/api/upload", post(routes::files::upload))
        .route("/api/blobs/*path", get(routes::files::blob))
        .route("/api/leads", post(routes::leads::create_lead))
        .route("/api/admin/login", post(routes::admin::login))
        .merge(admin)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
