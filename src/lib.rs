//! Admin console gateway.
//!
//! Serves the console's CRUD screens for permissions, roles, warehouses and
//! system configurations by forwarding every operation to the admin backend
//! (or a local SQLite stand-in), with validation, permission gating and a
//! tag-invalidated read cache in front of it.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod forms;
pub mod gateway;
pub mod listing;
pub mod modal;
pub mod models;
pub mod mutation;
pub mod notify;
pub mod permissions;
pub mod schema;

use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use errors::AppError;
use gateway::{Backend, Gateway, HttpBackend, LocalBackend, TagCache};
use models::{AdminEntity, Envelope, Permission, Role, SystemConfiguration, Warehouse};
use mutation::Mutations;
use notify::TracingNotifier;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    pub mutations: Mutations,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, config: Config) -> Self {
        let cache = Arc::new(TagCache::new(config.cache_ttl));
        let gateway = Gateway::new(backend, cache);
        let mutations = Mutations::new(
            gateway.clone(),
            Arc::new(TracingNotifier),
            config.snapshot_page_size,
        );
        Self {
            gateway,
            mutations,
            config: Arc::new(config),
        }
    }
}

/// Pick the backend from the configuration and build the state around it.
pub async fn build_state(config: Config) -> Result<AppState, AppError> {
    let backend: Arc<dyn Backend> = match &config.backend_url {
        Some(url) => {
            tracing::info!("Forwarding to remote backend at {}", url);
            Arc::new(HttpBackend::new(url)?)
        }
        None => {
            tracing::info!("No backend URL configured, serving from {:?}", config.db_path);
            let local = LocalBackend::open(&config.db_path).await?;
            if config.seed_demo {
                gateway::seed_demo(local.repository()).await?;
            }
            Arc::new(local)
        }
    };

    Ok(AppState::new(backend, config))
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new();
    let api_routes = resource_routes::<Permission>(api_routes);
    let api_routes = resource_routes::<Role>(api_routes);
    let api_routes = resource_routes::<Warehouse>(api_routes);
    let api_routes = resource_routes::<SystemConfiguration>(api_routes)
        .route(
            "/system-configurations/{id}/set-current",
            post(api::set_current),
        )
        .route("/warehouses/{id}/image", post(api::upload_image))
        // Dialog and toolbar support
        .route("/ui/{res}/form", get(api::form_definition))
        .route("/ui/{res}/actions", get(api::list_actions))
        .route("/ui/sanitize-link", post(api::sanitize_link))
        .layer(middleware::from_fn(auth::session_layer));

    // Health check and internal hooks (no session required)
    let open_routes = Router::new()
        .route("/health", get(health_check))
        .route("/internal/revalidate", post(api::revalidate));

    Router::new()
        .nest("/api", api_routes)
        .merge(open_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn resource_routes<E: AdminEntity>(router: Router<AppState>) -> Router<AppState> {
    let collection = format!("/{}", E::KIND.route());
    let item = format!("{}/{{id}}", collection);

    router
        .route(&collection, get(api::list::<E>).post(api::create::<E>))
        .route(
            &item,
            get(api::detail::<E>)
                .put(api::update::<E>)
                .delete(api::remove::<E>),
        )
}

#[derive(Debug, serde::Serialize)]
struct Health {
    status: &'static str,
    backend: &'static str,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Envelope<Health> {
    Envelope::ok(
        Health {
            status: "ok",
            backend: state.gateway.backend_name(),
        },
        200,
    )
}

#[cfg(test)]
mod test_support;
