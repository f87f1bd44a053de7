mod data;
mod reads;
mod service_info;
mod variants;

pub use data::get_data;
pub use reads::get_reads;
pub use service_info::{reads_service_info, service_info, variants_service_info};
pub use variants::get_variants;

use crate::formats::load_reference;
use crate::resolver::Resolver;
use crate::{Config, Result};
use crate::slice::SliceService;
use crate::ticket::{ChunkPlanner, TicketService};
use axum::{
    Router,
    http::{HeaderMap, header},
    routing::get,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub tickets: Arc<TicketService>,
    pub slices: Arc<SliceService>,
    /// Host written into tickets when a request has no `Host` header
    pub fallback_host: String,
}

impl AppState {
    pub fn new(resolver: Arc<dyn Resolver>, config: &Config) -> Result<Self> {
        let reference = load_reference(config.reference_path.as_deref())?;
        let planner = ChunkPlanner::new(config.chunk_size, config.normalized_base_path());
        Ok(Self {
            tickets: Arc::new(TicketService::new(
                resolver.clone(),
                planner,
                reference.clone(),
            )),
            slices: Arc::new(SliceService::new(
                resolver,
                config.temporary_files_path.clone(),
                reference,
            )),
            fallback_host: config.fallback_host(),
        })
    }
}

/// Build the service router. Routes live under `base_path`; `/data` is also
/// served at the root because whole-file tickets carry no base path.
pub fn create_router(state: AppState, base_path: &str, cors: bool) -> Router {
    let routes = Router::new()
        .route("/reads/service-info", get(reads_service_info))
        .route("/reads/{id}", get(get_reads))
        .route("/variants/service-info", get(variants_service_info))
        .route("/variants/{id}", get(get_variants))
        .route("/data", get(get_data))
        .route("/", get(service_info))
        .route("/service-info", get(service_info));

    let app = if base_path.is_empty() {
        routes
    } else {
        Router::new()
            .nest(base_path, routes)
            .route("/data", get(get_data))
    };

    let app = app.with_state(state).layer(TraceLayer::new_for_http());

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

fn request_host(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(fallback)
        .to_string()
}
