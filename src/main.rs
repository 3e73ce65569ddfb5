mod api;
mod artifacts;
mod catalog;
mod config;
mod domain;
mod engine;
mod error;
mod html;
mod progress_bus;
mod quota;
mod reader;
mod source_client;
mod storage;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use config::Config;
use migration::MigratorTrait;
use poem::listener::TcpListener;
use poem::Server;
use sea_orm::Database;
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use api::AppState;
use artifacts::ArtifactManager;
use engine::DownloadEngine;
use progress_bus::ProgressBus;
use quota::QuotaLedger;
use reader::ReaderService;
use source_client::biquge::BiqugeClient;
use source_client::fanqie::FanqieClient;
use source_client::qimao::QimaoClient;
use source_client::SourceClient;
use storage::BlobStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let default_filter = format!("{}=info,poem=info,reqwest=warn,h2=warn", env!("CARGO_PKG_NAME"));
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_level(true)
        .pretty()
        .finish()
        .with(ErrorLayer::default())
        .init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting novelforge");

    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    }

    let config_path = std::env::var("NOVELFORGE_CONFIG").ok().map(std::path::PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let db = Database::connect(&config.database_url)
        .await
        .with_context(|| "failed to connect to database")?;
    migration::Migrator::up(&db, None)
        .await
        .with_context(|| "failed to run database migrations")?;

    let store = BlobStore::new(config.data_dir.clone());
    let timeout = Duration::from_secs(config.api_timeout_secs);

    let mut fanqie_client = FanqieClient::new(config.fanqie_api_base_url.clone(), timeout, config.api_retry_times);
    let mut qimao_client = QimaoClient::new(config.qimao_api_base_url.clone(), timeout, config.api_retry_times);
    let mut biquge_client = BiqugeClient::new(config.biquge_api_base_url.clone(), timeout, config.api_retry_times);
    if let Some(api_key) = &config.rain_api_key {
        fanqie_client = fanqie_client.with_api_key(api_key.clone());
        qimao_client = qimao_client.with_api_key(api_key.clone());
        biquge_client = biquge_client.with_api_key(api_key.clone());
    }

    let mut clients: HashMap<String, Arc<dyn SourceClient>> = HashMap::new();
    clients.insert("fanqie".to_string(), Arc::new(fanqie_client) as Arc<dyn SourceClient>);
    clients.insert("qimao".to_string(), Arc::new(qimao_client) as Arc<dyn SourceClient>);
    clients.insert("biquge".to_string(), Arc::new(biquge_client) as Arc<dyn SourceClient>);

    let quota = QuotaLedger::new(db.clone(), config.daily_word_limit);
    let bus = Arc::new(ProgressBus::new());
    let engine = Arc::new(DownloadEngine::new(
        db.clone(),
        store.clone(),
        quota.clone(),
        Arc::clone(&bus),
        clients.clone(),
        config.concurrent_downloads,
        Duration::from_secs_f64(config.download_delay_secs),
    ));
    let artifact_manager = Arc::new(ArtifactManager::new(
        db.clone(),
        store.clone(),
        config.epub_language.clone(),
        config.epub_publisher.clone(),
    ));
    let reader = Arc::new(ReaderService::new(db.clone(), store.clone(), Arc::clone(&engine), Arc::clone(&artifact_manager)));

    let config = Arc::new(config);
    let state = Arc::new(AppState {
        db,
        store,
        engine,
        reader,
        artifacts: artifact_manager,
        quota,
        bus,
        clients,
        config: Arc::clone(&config),
    });

    let bind_addr = format!("{}:{}", config.host, config.port);
    let route = api::build_route(state);
    tracing::info!(%bind_addr, "starting HTTP server");
    Server::new(TcpListener::bind(bind_addr)).run(route).await?;
    Ok(())
}
