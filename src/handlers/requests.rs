use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::db::{Decision, RequestFilter, TimeOffRequest, TimeOffRequestView};
use crate::error::TimeOffError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery};
use crate::router::TimeOffState;
use crate::service::{RequestQuery, RequestSubmission};

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    pub decision: Decision,
}

/// GET /api/requests?manager_id=&status=
pub async fn list_requests(
    State(state): State<TimeOffState>,
    ApiQuery(query): ApiQuery<RequestQuery>,
) -> Result<Json<Vec<TimeOffRequestView>>, TimeOffError> {
    let filter = RequestFilter::try_from(query)?;
    Ok(Json(state.requests.list_requests(filter).await?))
}

/// POST /api/requests
pub async fn submit_request(
    State(state): State<TimeOffState>,
    ApiJson(body): ApiJson<RequestSubmission>,
) -> Result<(StatusCode, Json<TimeOffRequest>), TimeOffError> {
    let created = state.requests.submit_request(&body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/requests/{id}
pub async fn get_request(
    State(state): State<TimeOffState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<TimeOffRequestView>, TimeOffError> {
    Ok(Json(state.requests.get_request(id).await?))
}

/// PUT /api/requests/{id}/decision with `{"decision": "approved" | "denied"}`
pub async fn decide_request(
    State(state): State<TimeOffState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<DecisionBody>,
) -> Result<Json<TimeOffRequest>, TimeOffError> {
    Ok(Json(state.requests.decide_request(id, body.decision).await?))
}

/// DELETE /api/requests/{id}
pub async fn delete_request(
    State(state): State<TimeOffState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, TimeOffError> {
    state.requests.delete_request(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
