//! Append-only payment log. Write-only audit trail: nothing in the API
//! reads it back.

use serde_json::{Map, Value};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::StoreError;

pub struct PaymentStore;

impl PaymentStore {
    /// Append one confirmed payment. Part of the finalization transaction
    /// so the log row never lands without the matching order update.
    pub async fn record(
        tx: &mut Transaction<'_, Postgres>,
        order_id: Uuid,
        body: &Map<String, Value>,
    ) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO payments (id, order_id, doc) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(order_id)
            .bind(Value::Object(body.clone()))
            .execute(&mut **tx)
            .await?;
        Ok(id)
    }
}
