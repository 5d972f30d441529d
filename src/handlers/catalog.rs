//! Passthrough collection endpoints: tools, reviews and profiles. Pure
//! insert/list/fetch with no business logic.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::DocumentStore;

use super::{parse_document_id, require_object};

async fn insert_into(
    state: &AppState,
    collection: &'static str,
    body: Value,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let doc = require_object(body)?;
    let id = DocumentStore::new(state.pool(), collection).insert(&doc).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "acknowledged": true, "insertedId": id })),
    ))
}

/// GET /tool - list the catalog
pub async fn tool_list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let tools = DocumentStore::new(state.pool(), "tools").list().await?;
    Ok(Json(Value::Array(tools)))
}

/// POST /tool - add a catalog entry
pub async fn tool_create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    insert_into(&state, "tools", body).await
}

/// GET /tool/:id - fetch one tool
pub async fn tool_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let tool_id = parse_document_id(&id, "tool")?;
    let tool = DocumentStore::new(state.pool(), "tools")
        .find(tool_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("tool {id} not found")))?;
    Ok(Json(tool))
}

/// GET /review - list reviews
pub async fn review_list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let reviews = DocumentStore::new(state.pool(), "reviews").list().await?;
    Ok(Json(Value::Array(reviews)))
}

/// POST /review - add a review
pub async fn review_create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    insert_into(&state, "reviews", body).await
}

/// POST /profile - add a profile document
pub async fn profile_create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    insert_into(&state, "profiles", body).await
}
