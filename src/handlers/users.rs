//! Identity endpoints: login upsert + token issuance, user listing, and
//! the admin role check and grant.

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use crate::auth::generate_token;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::store::UserStore;

use super::require_object;

/// GET /user - list all users
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let users = UserStore::new(state.pool()).list().await?;
    Ok(Json(Value::Array(users)))
}

/// PUT /user/:email - login upsert, always answers with a fresh token
///
/// No credential is checked; any caller who knows an email receives a
/// valid token for it. Inherited surface, documented in DESIGN.md.
pub async fn login(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::validation("email must not be empty"));
    }

    let profile = require_object(body)?;
    let result = UserStore::new(state.pool())
        .upsert_login(email, &profile)
        .await?;
    let token = generate_token(email, &state.config().token_secret)?;

    Ok(Json(json!({ "result": result, "token": token })))
}

/// GET /admin/:email - admin status; unknown emails are plain non-admins
pub async fn admin_status(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let admin = UserStore::new(state.pool()).is_admin(&email).await?;
    Ok(Json(json!({ "admin": admin })))
}

/// PUT /user/admin/:email - grant the admin role
///
/// Guarded: the caller must hold a valid token and already be an admin.
/// The first grant on a deployment with no admins is open so the role
/// can be bootstrapped at all.
pub async fn grant_admin(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(email): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let users = UserStore::new(state.pool());

    if !users.is_admin(&caller.email).await? && !users.no_admin_exists().await? {
        return Err(ApiError::forbidden("caller is not an admin"));
    }

    let matched = users.grant_admin(&email).await?;
    if matched == 0 {
        return Err(ApiError::not_found(format!("user {email} not found")));
    }

    tracing::info!(grantee = %email, granted_by = %caller.email, "admin role granted");
    Ok(Json(json!({
        "acknowledged": true,
        "matchedCount": matched,
        "modifiedCount": matched,
    })))
}
