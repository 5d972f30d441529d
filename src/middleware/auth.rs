use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::validate_token;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller context extracted from a bearer token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub email: String,
}

/// Bearer-token middleware: validates the JWT and injects AuthUser into
/// the request extensions. Applied only to guarded routes; the rest of
/// the surface is public.
pub async fn bearer_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;
    let claims = validate_token(&token, &state.config().token_secret)?;

    request.extensions_mut().insert(AuthUser {
        email: claims.email,
    });
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;

    let value = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("invalid Authorization header"))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        Some(_) => Err(ApiError::unauthorized("empty bearer token")),
        None => Err(ApiError::unauthorized(
            "Authorization header must use the Bearer scheme",
        )),
    }
}
