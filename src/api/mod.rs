//! Task API Facade: one thin `#[OpenApi]` impl per resource group, each
//! delegating straight to the catalog/engine/reader/artifacts layer. DTOs
//! live in the sibling `models` module; session auth is enforced globally by
//! the `auth::SessionAuth` middleware wrapping the whole route, including the
//! WebSocket upgrade paths (an unauthenticated upgrade is rejected with a
//! plain HTTP 401 before the handshake completes, rather than a post-upgrade
//! close frame).

pub mod artifacts;
pub mod auth;
pub mod books;
pub mod health;
pub mod models;
pub mod reader;
pub mod tasks;
pub mod users;
pub mod ws;

use std::collections::HashMap;
use std::sync::Arc;

use poem::{EndpointExt, Route};
use poem_openapi::OpenApiService;
use sea_orm::DatabaseConnection;

use crate::artifacts::ArtifactManager;
use crate::config::Config;
use crate::engine::DownloadEngine;
use crate::progress_bus::ProgressBus;
use crate::quota::QuotaLedger;
use crate::reader::ReaderService;
use crate::source_client::SourceClient;
use crate::storage::BlobStore;

/// Shared dependencies every resource-group API struct borrows a clone of.
pub struct AppState {
    pub db: DatabaseConnection,
    pub store: BlobStore,
    pub engine: Arc<DownloadEngine>,
    pub reader: Arc<ReaderService>,
    pub artifacts: Arc<ArtifactManager>,
    pub quota: QuotaLedger,
    pub bus: Arc<ProgressBus>,
    pub clients: HashMap<String, Arc<dyn SourceClient>>,
    pub config: Arc<Config>,
}

pub fn build_route(state: Arc<AppState>) -> Route {
    let version = env!("CARGO_PKG_VERSION");
    let api = (
        health::HealthApi { state: Arc::clone(&state) },
        auth::AuthApi { state: Arc::clone(&state) },
        books::BooksApi { state: Arc::clone(&state) },
        reader::ReaderApi { state: Arc::clone(&state) },
        artifacts::ArtifactsApi { state: Arc::clone(&state) },
        tasks::TasksApi { state: Arc::clone(&state) },
        users::UsersApi { state: Arc::clone(&state) },
    );
    let api_service = OpenApiService::new(api, "novelforge", version).server("/api");
    let ui = api_service.rapidoc();
    let spec = api_service.spec();

    Route::new()
        .nest("/", api_service)
        .nest("/ui", ui)
        .nest("/spec", poem::endpoint::make_sync(move |_| spec.clone()))
        .at("/ws/tasks/:task_uuid", poem::get(ws::task_progress_ws))
        .at("/ws/books/:book_uuid", poem::get(ws::book_progress_ws))
        .with(auth::SessionAuth {
            secret_key: state.config.secret_key.clone(),
            app_password: state.config.app_password.clone(),
        })
        .data(state)
}
