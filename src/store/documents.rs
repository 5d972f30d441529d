//! Generic document store backing the passthrough collections (tools,
//! reviews, profiles): insert, list, fetch-by-id, no further logic.

use serde_json::{Map, Value};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::StoreError;

/// Collections served by the generic store. Table names are interpolated
/// into SQL, so only members of this list are ever accepted.
pub const COLLECTIONS: &[&str] = &["tools", "reviews", "profiles"];

pub struct DocumentStore<'a> {
    pool: &'a PgPool,
    collection: &'static str,
}

impl<'a> DocumentStore<'a> {
    /// Panics if the collection is not allow-listed; callers pass literals
    /// from COLLECTIONS only.
    pub fn new(pool: &'a PgPool, collection: &'static str) -> Self {
        assert_known_collection(collection);
        Self { pool, collection }
    }

    pub async fn insert(&self, body: &Map<String, Value>) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(&format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2)",
            self.collection
        ))
        .bind(id)
        .bind(Value::Object(body.clone()))
        .execute(self.pool)
        .await?;
        Ok(id)
    }

    pub async fn list(&self) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT id, doc FROM {} ORDER BY created_at",
            self.collection
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(StoreError::Query)?;
                let doc: Value = row.try_get("doc").map_err(StoreError::Query)?;
                Ok(with_id(id, doc))
            })
            .collect()
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query(&format!("SELECT id, doc FROM {} WHERE id = $1", self.collection))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => {
                let id: Uuid = row.try_get("id").map_err(StoreError::Query)?;
                let doc: Value = row.try_get("doc").map_err(StoreError::Query)?;
                Ok(Some(with_id(id, doc)))
            }
            None => Ok(None),
        }
    }
}

fn assert_known_collection(collection: &str) {
    assert!(
        COLLECTIONS.contains(&collection),
        "unknown collection: {collection}"
    );
}

fn with_id(id: Uuid, doc: Value) -> Value {
    let mut map = match doc {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.insert("_id".to_string(), Value::String(id.to_string()));
    Value::Object(map)
}
