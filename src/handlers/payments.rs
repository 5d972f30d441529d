//! Payment endpoints: intent creation against the external gateway, and
//! order finalization (payment log append + paid transition).

use axum::{
    extract::{Path, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::gateway::to_minor_units;
use crate::state::AppState;
use crate::store::{OrderStore, PaymentStore, StoreError};

use super::{parse_document_id, require_object};

/// POST /create-payment-intent - body {totalPrice} -> {clientSecret}
pub async fn create_intent(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let body = require_object(body)?;
    let total_price = parse_total_price(body.get("totalPrice"))?;

    let amount = to_minor_units(total_price)
        .map_err(|_| ApiError::validation("totalPrice is out of range"))?;
    let client_secret = state.gateway().create_intent(amount).await?;

    Ok(Json(json!({ "clientSecret": client_secret })))
}

/// PATCH /order/:id - finalize a payment
///
/// Idempotent per (order, transactionId): a repeat of the same
/// confirmation is a no-op, a different transaction against a paid order
/// is a conflict. The payment log row and the paid transition commit in
/// one transaction.
pub async fn finalize_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let order_id = parse_document_id(&id, "order")?;
    let payment = require_object(body)?;
    let transaction_id = payment
        .get("transactionId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::validation("transactionId is required"))?;

    let orders = OrderStore::new(state.pool());
    let order = orders
        .find(order_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order {id} not found")))?;

    if order.paid {
        return if order.transaction_id.as_deref() == Some(transaction_id.as_str()) {
            // Same confirmation replayed: answer with the current state,
            // no second payment row, no second update.
            Ok(Json(order.to_document()))
        } else {
            Err(ApiError::conflict(format!(
                "order {id} is already paid with a different transaction"
            )))
        };
    }

    let mut tx = state.pool().begin().await.map_err(StoreError::from)?;
    PaymentStore::record(&mut tx, order_id, &payment).await?;
    let updated = OrderStore::mark_paid(&mut tx, order_id, &transaction_id).await?;
    if updated == 0 {
        // Lost a race with a concurrent finalize; dropping tx rolls the
        // payment row back.
        return Err(ApiError::conflict(format!("order {id} is already paid")));
    }
    tx.commit().await.map_err(StoreError::from)?;

    // Return the authoritative post-update record, not the attempted
    // update document.
    let order = orders
        .find(order_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("order {id} not found")))?;
    Ok(Json(order.to_document()))
}

/// totalPrice arrives as a JSON number or a numeric string; anything else
/// (or a non-positive amount) fails validation.
fn parse_total_price(value: Option<&Value>) -> Result<Decimal, ApiError> {
    let price = match value {
        Some(Value::Number(n)) => n.to_string().parse::<Decimal>().ok(),
        Some(Value::String(s)) => s.parse::<Decimal>().ok(),
        _ => None,
    }
    .ok_or_else(|| ApiError::validation("totalPrice must be a number"))?;

    if price <= Decimal::ZERO {
        return Err(ApiError::validation("totalPrice must be positive"));
    }
    Ok(price)
}
