use axum::{Json, extract::State};
use serde::Serialize;

use crate::router::TimeOffState;

pub const SERVICE_NAME: &str = "time-off-api";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

impl HealthResponse {
    fn from_probe(db_healthy: bool) -> Self {
        Self {
            status: if db_healthy { "healthy" } else { "unhealthy" },
            service: SERVICE_NAME,
            version: SERVICE_VERSION,
            database: if db_healthy { "connected" } else { "disconnected" },
        }
    }
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Time Off System API",
    })
}

/// GET /health -> always 200; store reachability is reported in the body.
pub async fn health(State(state): State<TimeOffState>) -> Json<HealthResponse> {
    Json(HealthResponse::from_probe(state.db.ping().await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_result_drives_both_fields() {
        let up = HealthResponse::from_probe(true);
        assert_eq!((up.status, up.database), ("healthy", "connected"));
        let down = HealthResponse::from_probe(false);
        assert_eq!((down.status, down.database), ("unhealthy", "disconnected"));
        assert_eq!(down.service, "time-off-api");
        assert_eq!(down.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn root_message() {
        let Json(body) = root().await;
        assert_eq!(body.message, "Time Off System API");
    }
}
