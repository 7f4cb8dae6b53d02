//! `/api/mysql-test` handlers.
//!
//! - GET  - run the fixed read query
//! - POST - insert `{name, age}`
//!
//! Both sit behind the request gate; by the time they run the token and origin
//! have been checked and a [`GateContext`] is attached.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    middleware::gate::GateContext,
    models::user::{CreateUserResponse, ListUsersResponse, NewUser},
    state::AppState,
};

/// List users.
///
/// # Response
///
/// - **200 OK**: `{ "success": true, "message": ..., "testData": [...] }`
/// - **500**: `{ "success": false, "message": ..., "error": "<driver message>" }`
pub async fn list_users(
    State(state): State<AppState>,
    Extension(gate): Extension<GateContext>,
) -> Result<Json<ListUsersResponse>, AppError> {
    let rows = state.store.list_users().await.map_err(AppError::Query)?;

    tracing::debug!(origin = %gate.origin, rows = rows.len(), "Listed users");

    Ok(Json(ListUsersResponse::new(rows)))
}

/// Insert a user.
///
/// # Request Body
///
/// ```json
/// { "name": "a", "age": 1 }
/// ```
///
/// # Response
///
/// - **201 Created**: `{ "success": true, "message": ..., "insertId": 42 }`
/// - **400**: body is not valid `{name, age}` JSON
/// - **500**: insert failed
pub async fn create_user(
    State(state): State<AppState>,
    Extension(gate): Extension<GateContext>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(user) = payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;

    let insert_id = state
        .store
        .insert_user(&user)
        .await
        .map_err(AppError::Insert)?;

    tracing::info!(origin = %gate.origin, insert_id, "Inserted user");

    Ok((StatusCode::CREATED, Json(CreateUserResponse::new(insert_id))))
}
