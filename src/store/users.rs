//! Identity store: users keyed by email, arbitrary profile fields in a
//! JSONB doc, role kept in its own column.

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{PgPool, Row};

use super::StoreError;

/// Shape of the write result returned to login clients, mirroring the
/// matched/modified counters the storefront frontend already consumes.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertOutcome {
    pub acknowledged: bool,
    #[serde(rename = "matchedCount")]
    pub matched_count: u64,
    #[serde(rename = "modifiedCount")]
    pub modified_count: u64,
    #[serde(rename = "upsertedId", skip_serializing_if = "Option::is_none")]
    pub upserted_id: Option<String>,
}

pub struct UserStore<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStore<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Login upsert: merge the submitted profile fields into the stored
    /// doc (submitted keys replace, absent keys are left untouched).
    /// Inserts the record when the email is new. The role column is never
    /// written here, so an admin grant survives any later login.
    pub async fn upsert_login(
        &self,
        email: &str,
        profile: &Map<String, Value>,
    ) -> Result<UpsertOutcome, StoreError> {
        let doc = Value::Object(profile.clone());
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, doc) VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET doc = users.doc || EXCLUDED.doc
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(email)
        .bind(&doc)
        .fetch_one(self.pool)
        .await?;

        let inserted: bool = row.try_get("inserted").map_err(StoreError::Query)?;
        Ok(UpsertOutcome {
            acknowledged: true,
            matched_count: if inserted { 0 } else { 1 },
            modified_count: if inserted { 0 } else { 1 },
            upserted_id: inserted.then(|| email.to_string()),
        })
    }

    /// Missing users are simply not admins; a lookup miss is not an error.
    pub async fn is_admin(&self, email: &str) -> Result<bool, StoreError> {
        let role: Option<Option<String>> =
            sqlx::query_scalar("SELECT role FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(self.pool)
                .await?;
        Ok(matches!(role, Some(Some(ref r)) if r == "admin"))
    }

    /// Update-only: does not create the record if the email is unknown.
    /// Returns the number of matched rows.
    pub async fn grant_admin(&self, email: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE users SET role = 'admin' WHERE email = $1")
            .bind(email)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// True when no user holds the admin role yet. Used to allow the
    /// first grant to bootstrap an empty deployment.
    pub async fn no_admin_exists(&self) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM users WHERE role = 'admin'")
            .fetch_one(self.pool)
            .await?;
        Ok(count == 0)
    }

    /// All users as API documents: profile fields plus email and role.
    pub async fn list(&self) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query("SELECT email, role, doc FROM users ORDER BY email")
            .fetch_all(self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let email: String = row.try_get("email").map_err(StoreError::Query)?;
                let role: Option<String> = row.try_get("role").map_err(StoreError::Query)?;
                let doc: Value = row.try_get("doc").map_err(StoreError::Query)?;
                Ok(user_document(email, role, doc))
            })
            .collect()
    }
}

fn user_document(email: String, role: Option<String>, doc: Value) -> Value {
    let mut map = match doc {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.insert("email".to_string(), Value::String(email));
    if let Some(role) = role {
        map.insert("role".to_string(), Value::String(role));
    }
    Value::Object(map)
}
