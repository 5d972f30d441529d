//! Order store: placed orders, queryable by id or owner email, with the
//! single paid transition applied by the payment finalizer.

use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::StoreError;

/// An order as read back from the store.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub email: Option<String>,
    pub paid: bool,
    pub transaction_id: Option<String>,
    pub doc: Value,
}

impl Order {
    /// API document: doc fields plus id, email, paid and (once paid)
    /// transactionId.
    pub fn to_document(&self) -> Value {
        let mut map = match &self.doc {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        map.insert("_id".to_string(), Value::String(self.id.to_string()));
        if let Some(email) = &self.email {
            map.insert("email".to_string(), Value::String(email.clone()));
        }
        map.insert("paid".to_string(), Value::Bool(self.paid));
        if let Some(tx) = &self.transaction_id {
            map.insert("transactionId".to_string(), Value::String(tx.clone()));
        }
        Value::Object(map)
    }
}

fn order_from_row(row: sqlx::postgres::PgRow) -> Result<Order, StoreError> {
    Ok(Order {
        id: row.try_get("id").map_err(StoreError::Query)?,
        email: row.try_get("email").map_err(StoreError::Query)?,
        paid: row.try_get("paid").map_err(StoreError::Query)?,
        transaction_id: row.try_get("transaction_id").map_err(StoreError::Query)?,
        doc: row.try_get("doc").map_err(StoreError::Query)?,
    })
}

const SELECT_ORDER: &str = "SELECT id, email, paid, transaction_id, doc FROM orders";

pub struct OrderStore<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderStore<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert the order body as-is. The owner email, when present, is
    /// lifted into its own column for the by-owner listing.
    pub async fn insert(&self, body: &Map<String, Value>) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let email = body.get("email").and_then(Value::as_str);
        sqlx::query("INSERT INTO orders (id, email, doc) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(email)
            .bind(Value::Object(body.clone()))
            .execute(self.pool)
            .await?;
        Ok(id)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        row.map(order_from_row).transpose()
    }

    /// All orders, or the owner's orders when an email filter is given.
    pub async fn list(&self, owner_email: Option<&str>) -> Result<Vec<Order>, StoreError> {
        let rows = match owner_email {
            Some(email) => {
                sqlx::query(&format!(
                    "{SELECT_ORDER} WHERE email = $1 ORDER BY created_at"
                ))
                .bind(email)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!("{SELECT_ORDER} ORDER BY created_at"))
                    .fetch_all(self.pool)
                    .await?
            }
        };
        rows.into_iter().map(order_from_row).collect()
    }

    /// The one happy-path mutation: Placed -> Paid. Runs inside the
    /// finalization transaction so the payment log row and the order
    /// update commit together. Matches unpaid orders only: a concurrent
    /// finalize that loses the race affects zero rows, and a paid
    /// order's recorded transaction can never be overwritten.
    pub async fn mark_paid(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        transaction_id: &str,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE orders SET paid = TRUE, transaction_id = $2 WHERE id = $1 AND paid = FALSE",
        )
        .bind(id)
        .bind(transaction_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Unconditional delete; paid orders are not protected.
    pub async fn delete(&self, id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
