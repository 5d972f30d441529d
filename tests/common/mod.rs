#![allow(dead_code)] // not every test binary uses every helper

//! Shared harness: builds the router with an in-memory mock payment
//! gateway. Store-backed scenarios use TEST_DATABASE_URL when set and
//! are skipped otherwise.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;

use drillworld_api::config::AppConfig;
use drillworld_api::gateway::{GatewayError, PaymentGateway};
use drillworld_api::state::AppState;
use drillworld_api::{app, store};

pub const TEST_TOKEN_SECRET: &str = "integration-test-secret";

/// Records every requested amount and answers with a predictable
/// Stripe-shaped client secret.
#[derive(Default)]
pub struct MockGateway {
    pub amounts: Mutex<Vec<i64>>,
    pub fail: bool,
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(&self, amount_minor: i64) -> Result<String, GatewayError> {
        if self.fail {
            return Err(GatewayError::Rejected {
                status: reqwest::StatusCode::PAYMENT_REQUIRED,
                body: "mock rejection".to_string(),
            });
        }
        self.amounts.lock().unwrap().push(amount_minor);
        Ok(format!("pi_mock{amount_minor}_secret_test"))
    }
}

fn test_config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        token_secret: TEST_TOKEN_SECRET.to_string(),
        stripe_secret_key: "sk_test_unused".to_string(),
        port: 0,
        database_max_connections: 2,
    }
}

/// Router over a lazily-connecting pool: never touches a real database,
/// suitable for everything that fails or finishes before the store.
pub fn offline_app(gateway: Arc<MockGateway>) -> Router {
    let url = "postgres://nobody@127.0.0.1:1/unreachable";
    // Short acquire timeout keeps store-unreachable paths fast.
    let pool = sqlx::postgres::PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_millis(500))
        .connect_lazy(url)
        .expect("lazy pool");
    app(AppState::new(test_config(url.to_string()), pool, gateway))
}

/// Router over the database named by TEST_DATABASE_URL, schema applied.
/// Returns None (skip) when the variable is unset.
pub async fn db_app(gateway: Arc<MockGateway>) -> Option<(Router, PgPool)> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = store::connect(&url, 2).await.expect("test database");
    store::init_schema(&pool).await.expect("schema");
    let state = AppState::new(test_config(url), pool.clone(), gateway);
    Some((app(state), pool))
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request")
}

pub fn json_request(method: &str, path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn authed_json_request(
    method: &str,
    path: &str,
    token: &str,
    body: Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
