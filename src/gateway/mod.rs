//! Payment intent gateway: thin call-through to the Stripe payment
//! intents API. Only the client-usable secret ever leaves this module.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

const PAYMENT_INTENTS_URL: &str = "https://api.stripe.com/v1/payment_intents";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("payment gateway rejected the request: {status} {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("amount out of range: {0}")]
    AmountOutOfRange(Decimal),
}

/// Convert a major-unit price (dollars) to minor units (cents), rounded
/// to the nearest cent. USD-style 2-decimal currencies only.
pub fn to_minor_units(total_price: Decimal) -> Result<i64, GatewayError> {
    total_price
        .checked_mul(Decimal::from(100))
        .map(|cents| cents.round())
        .and_then(|cents| cents.to_i64())
        .ok_or(GatewayError::AmountOutOfRange(total_price))
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Request a card payment intent for the given minor-unit amount and
    /// return the client secret.
    async fn create_intent(&self, amount_minor: i64) -> Result<String, GatewayError>;
}

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    client_secret: String,
}

impl StripeGateway {
    /// Fails if the HTTP client cannot be built; a client without the
    /// request timeout is not an acceptable fallback.
    pub fn new(secret_key: impl Into<String>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            secret_key: secret_key.into(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, amount_minor: i64) -> Result<String, GatewayError> {
        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", "usd".to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self
            .client
            .post(PAYMENT_INTENTS_URL)
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected { status, body });
        }

        let intent: PaymentIntent = response.json().await?;
        Ok(intent.client_secret)
    }
}
