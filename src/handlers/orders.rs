//! Order endpoints: placement, listing (all or by owner), fetch and
//! cancellation. Payment finalization lives in handlers::payments.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::OrderStore;

use super::{parse_document_id, require_object};

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    /// Presence of the filter selects the customer "my orders" view;
    /// absence the admin "all orders" view.
    pub email: Option<String>,
}

/// GET /order - list orders, optionally filtered by owner email
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Value>, ApiError> {
    let orders = OrderStore::new(state.pool())
        .list(query.email.as_deref())
        .await?;
    let docs = orders.iter().map(|o| o.to_document()).collect();
    Ok(Json(Value::Array(docs)))
}

/// GET /order/:id - fetch one order
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let order_id = parse_document_id(&id, "order")?;
    let order = OrderStore::new(state.pool())
        .find(order_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order {id} not found")))?;
    Ok(Json(order.to_document()))
}

/// POST /order - place an order; the body is stored as-is
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let order = require_object(body)?;
    let id = OrderStore::new(state.pool()).insert(&order).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "acknowledged": true, "insertedId": id })),
    ))
}

/// DELETE /order/:id - unconditional cancellation, paid or not
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let order_id = parse_document_id(&id, "order")?;
    let deleted = OrderStore::new(state.pool()).delete(order_id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found(format!("order {id} not found")));
    }
    Ok(Json(json!({ "acknowledged": true, "deletedCount": deleted })))
}
