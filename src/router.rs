use axum::{
    Router,
    routing::{get, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::Database;
use crate::handlers::{health, managers, requests};
use crate::service::{ManagerService, RequestService};

/// Shared handler state. Every field is a cheap clone over the same pool;
/// each handler call checks out its own session.
#[derive(Clone)]
pub struct TimeOffState {
    pub db: Database,
    pub requests: RequestService,
    pub managers: ManagerService,
}

impl TimeOffState {
    pub fn new(db: Database, bcrypt_cost: u32) -> Self {
        Self {
            requests: RequestService::new(db.clone()),
            managers: ManagerService::new(db.clone(), bcrypt_cost),
            db,
        }
    }
}

pub fn time_off_router(state: TimeOffState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route(
            "/managers",
            get(managers::list_managers).post(managers::create_manager),
        )
        .route(
            "/managers/{id}",
            get(managers::get_manager)
                .patch(managers::update_manager)
                .delete(managers::delete_manager),
        )
        .route("/managers/{id}/requests", get(managers::manager_requests))
        .route(
            "/requests",
            get(requests::list_requests).post(requests::submit_request),
        )
        .route(
            "/requests/{id}",
            get(requests::get_request).delete(requests::delete_request),
        )
        .route("/requests/{id}/decision", put(requests::decide_request));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
