//! HBnB Catalog Server
//!
//! REST API over States, Cities, Amenities, Users, Places and Reviews.
//!
//! Records live either in a JSON file or in an embedded SQLite database,
//! chosen with `HBNB_TYPE_STORAGE`.

mod config;
mod extractors;
mod handlers;
mod services;
mod storage;
mod unit_of_work;

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use hbnb_core::ports::{Storage, StoreSource};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{AppConfig, RunEnv, StorageMode};
use services::Catalog;
use storage::{DbStorage, FileStorage};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    /// Exclusive for the whole of every mutating request, shared by reads
    pub gate: Arc<RwLock<()>>,
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting HBnB server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, storage={:?}, env={:?}",
        config.bind_address(),
        config.type_storage,
        config.env
    );

    let storage = build_storage(&config).await?;
    let state = AppState {
        catalog: Arc::new(Catalog::new(storage)),
        gate: Arc::new(RwLock::new(())),
    };

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("Failed to parse bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server listening on {}", addr);
    axum::serve(listener, app(state))
        .await
        .context("Server error")?;

    Ok(())
}

/// Construct the configured engine and load whatever it already holds
async fn build_storage(config: &AppConfig) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.type_storage {
        StorageMode::File => {
            let storage = FileStorage::new(&config.file_path);
            info!("Using JSON file storage at: {}", storage.path().display());
            Arc::new(storage)
        }
        StorageMode::Db => Arc::new(
            DbStorage::connect(&config.db_path, config.env == RunEnv::Test)
                .await
                .context("Failed to initialize database")?,
        ),
    };

    let report = storage.reload().await.context("Failed to load storage")?;
    match report.source {
        StoreSource::Absent => info!("No existing store, starting empty"),
        StoreSource::Loaded => info!("Loaded {} objects", report.loaded),
    }
    if !report.is_clean() {
        warn!("{} stored records could not be loaded", report.rejected.len());
    }

    Ok(storage)
}

pub(crate) fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .fallback(handlers::index::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            unit_of_work::unit_of_work,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    use handlers::{amenities, cities, index, place_amenities, places, reviews, states, users};

    Router::new()
        .route("/status", get(index::status))
        .route("/stats", get(index::stats))
        .route("/states", get(states::list).post(states::create))
        .route(
            "/states/:id",
            get(states::get).put(states::update).delete(states::delete),
        )
        .route(
            "/states/:id/cities",
            get(cities::list_of_state).post(cities::create_in_state),
        )
        .route(
            "/cities/:id",
            get(cities::get).put(cities::update).delete(cities::delete),
        )
        .route(
            "/cities/:id/places",
            get(places::list_of_city).post(places::create_in_city),
        )
        .route("/amenities", get(amenities::list).post(amenities::create))
        .route(
            "/amenities/:id",
            get(amenities::get)
                .put(amenities::update)
                .delete(amenities::delete),
        )
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:id",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route(
            "/places/:id",
            get(places::get).put(places::update).delete(places::delete),
        )
        .route("/places_search", post(places::search))
        .route(
            "/places/:id/reviews",
            get(reviews::list_of_place).post(reviews::create_in_place),
        )
        .route(
            "/reviews/:id",
            get(reviews::get).put(reviews::update).delete(reviews::delete),
        )
        .route("/places/:id/amenities", get(place_amenities::list))
        .route(
            "/places/:id/amenities/:amenity_id",
            post(place_amenities::link).delete(place_amenities::unlink),
        )
}
