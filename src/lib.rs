pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod store;

use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Assemble the full router. Kept out of main so integration tests can
/// drive the app without binding a socket.
pub fn app(state: AppState) -> Router {
    // Only the admin grant is guarded; the rest of the surface is public.
    let guarded = Router::new()
        .route("/user/admin/:email", put(handlers::users::grant_admin))
        .route_layer(from_fn_with_state(state.clone(), middleware::bearer_auth));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(
            "/tool",
            get(handlers::catalog::tool_list).post(handlers::catalog::tool_create),
        )
        .route("/tool/:id", get(handlers::catalog::tool_get))
        .route("/user", get(handlers::users::list))
        .route("/user/:email", put(handlers::users::login))
        .route("/admin/:email", get(handlers::users::admin_status))
        .route("/create-payment-intent", post(handlers::payments::create_intent))
        .route(
            "/review",
            get(handlers::catalog::review_list).post(handlers::catalog::review_create),
        )
        .route(
            "/order",
            get(handlers::orders::list).post(handlers::orders::create),
        )
        .route(
            "/order/:id",
            get(handlers::orders::get)
                .patch(handlers::payments::finalize_order)
                .delete(handlers::orders::delete),
        )
        .route("/profile", post(handlers::catalog::profile_create))
        .merge(guarded)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// GET / - liveness text
async fn root() -> &'static str {
    "Drill World storefront API is running"
}

/// GET /health - store connectivity probe
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => (
            StatusCode::OK,
            axum::Json(json!({ "status": "ok", "timestamp": now, "store": "ok" })),
        ),
        Err(e) => {
            // Log the driver detail; clients only learn the store is down.
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "store": "unreachable",
                })),
            )
        }
    }
}
