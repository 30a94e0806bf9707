use axum::{Json, extract::State, http::StatusCode};

use crate::db::{Manager, TimeOffRequestView};
use crate::error::TimeOffError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery};
use crate::router::TimeOffState;
use crate::service::{ManagerRegistration, ManagerRequestQuery, ManagerUpdate};

/// GET /api/managers
pub async fn list_managers(
    State(state): State<TimeOffState>,
) -> Result<Json<Vec<Manager>>, TimeOffError> {
    Ok(Json(state.managers.list_managers().await?))
}

/// POST /api/managers
pub async fn create_manager(
    State(state): State<TimeOffState>,
    ApiJson(body): ApiJson<ManagerRegistration>,
) -> Result<(StatusCode, Json<Manager>), TimeOffError> {
    let manager = state.managers.create_manager(&body).await?;
    Ok((StatusCode::CREATED, Json(manager)))
}

/// GET /api/managers/{id}
pub async fn get_manager(
    State(state): State<TimeOffState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Manager>, TimeOffError> {
    Ok(Json(state.managers.get_manager(id).await?))
}

/// PATCH /api/managers/{id}
pub async fn update_manager(
    State(state): State<TimeOffState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<ManagerUpdate>,
) -> Result<Json<Manager>, TimeOffError> {
    Ok(Json(state.managers.update_manager(id, &body).await?))
}

/// DELETE /api/managers/{id} -> removes the manager and every request they own.
pub async fn delete_manager(
    State(state): State<TimeOffState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, TimeOffError> {
    state.managers.delete_manager(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/managers/{id}/requests?status=
pub async fn manager_requests(
    State(state): State<TimeOffState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ManagerRequestQuery>,
) -> Result<Json<Vec<TimeOffRequestView>>, TimeOffError> {
    let requests = state
        .requests
        .list_manager_requests(id, query.status()?)
        .await?;
    Ok(Json(requests))
}
