use crate::core::error::AccountError;
use crate::core::state::AppState;
use crate::utils::time::current_timestamp;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub users: i64,
    pub timestamp: i64,
}

/// Health check handler
///
/// GET /health
///
/// Counts the user table, so a 200 also means the store answers.
pub async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AccountError> {
    let users = state.store.count()?;

    Ok((
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            users,
            timestamp: current_timestamp(),
        }),
    ))
}
