//! Store-backed scenarios covering login upsert, role grants and the
//! order/payment lifecycle. These run only when TEST_DATABASE_URL points
//! at a reachable Postgres instance; otherwise each test skips.

mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{
    authed_json_request, body_json, db_app, get, json_request, MockGateway, TEST_TOKEN_SECRET,
};
use drillworld_api::auth::{validate_token, TOKEN_TTL_SECS};

fn unique_email(tag: &str) -> String {
    format!("{tag}-{}@example.com", Uuid::new_v4().simple())
}

#[tokio::test]
async fn login_upsert_merges_fields_and_issues_an_hour_token() -> Result<()> {
    let Some((app, _pool)) = db_app(Arc::new(MockGateway::default())).await else {
        return Ok(());
    };
    let email = unique_email("login");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/user/{email}"),
            json!({ "name": "Ada", "city": "Dhaka" }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let token = body["token"].as_str().unwrap();
    let claims = validate_token(token, TEST_TOKEN_SECRET)?;
    assert_eq!(claims.email, email);
    assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);

    // Second login overwrites submitted keys only; earlier fields stay.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/user/{email}"),
            json!({ "city": "Chittagong" }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/user")).await?;
    let users = body_json(response).await;
    let user = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == email.as_str())
        .expect("upserted user is listed");
    assert_eq!(user["name"], "Ada");
    assert_eq!(user["city"], "Chittagong");
    Ok(())
}

#[tokio::test]
async fn admin_check_on_unknown_email_is_false_not_an_error() -> Result<()> {
    let Some((app, _pool)) = db_app(Arc::new(MockGateway::default())).await else {
        return Ok(());
    };

    let response = app
        .oneshot(get(&format!("/admin/{}", unique_email("ghost"))))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["admin"], false);
    Ok(())
}

#[tokio::test]
async fn admin_grant_by_an_admin_sticks_and_survives_relogin() -> Result<()> {
    let Some((app, pool)) = db_app(Arc::new(MockGateway::default())).await else {
        return Ok(());
    };
    let granter = unique_email("granter");
    let grantee = unique_email("grantee");

    // Log both users in; seed the granter's role directly.
    for email in [&granter, &grantee] {
        let response = app
            .clone()
            .oneshot(json_request("PUT", &format!("/user/{email}"), json!({})))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
    }
    sqlx::query("UPDATE users SET role = 'admin' WHERE email = $1")
        .bind(&granter)
        .execute(&pool)
        .await?;

    let token = drillworld_api::auth::generate_token(&granter, TEST_TOKEN_SECRET)?;
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PUT",
            &format!("/user/admin/{grantee}"),
            &token,
            json!({}),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get(&format!("/admin/{grantee}")))
        .await?;
    assert_eq!(body_json(response).await["admin"], true);

    // A later plain login must not clobber the granted role.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/user/{grantee}"),
            json!({ "name": "Grace" }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get(&format!("/admin/{grantee}"))).await?;
    assert_eq!(body_json(response).await["admin"], true);
    Ok(())
}

#[tokio::test]
async fn admin_grant_by_a_non_admin_is_forbidden_once_an_admin_exists() -> Result<()> {
    let Some((app, pool)) = db_app(Arc::new(MockGateway::default())).await else {
        return Ok(());
    };
    let existing_admin = unique_email("root");
    let caller = unique_email("pleb");

    for email in [&existing_admin, &caller] {
        app.clone()
            .oneshot(json_request("PUT", &format!("/user/{email}"), json!({})))
            .await?;
    }
    sqlx::query("UPDATE users SET role = 'admin' WHERE email = $1")
        .bind(&existing_admin)
        .execute(&pool)
        .await?;

    let token = drillworld_api::auth::generate_token(&caller, TEST_TOKEN_SECRET)?;
    let response = app
        .oneshot(authed_json_request(
            "PUT",
            &format!("/user/admin/{}", unique_email("target")),
            &token,
            json!({}),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn order_lifecycle_place_finalize_idempotently_then_cancel() -> Result<()> {
    let Some((app, pool)) = db_app(Arc::new(MockGateway::default())).await else {
        return Ok(());
    };
    let email = unique_email("buyer");

    // Place
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/order",
            json!({ "email": &email, "item": "drill", "totalPrice": 50 }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order_id = body_json(response).await["insertedId"]
        .as_str()
        .unwrap()
        .to_string();

    // Listed exactly once under the owner filter
    let response = app
        .clone()
        .oneshot(get(&format!("/order?email={email}")))
        .await?;
    let orders = body_json(response).await;
    let mine: Vec<_> = orders
        .as_array()
        .unwrap()
        .iter()
        .filter(|o| o["_id"] == order_id.as_str())
        .collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["paid"], false);

    // Finalize
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/order/{order_id}"),
            json!({ "transactionId": "tx123", "amount": 5000 }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["paid"], true);
    assert_eq!(body["transactionId"], "tx123");

    // Replaying the same confirmation neither appends a second payment
    // row nor changes the order.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/order/{order_id}"),
            json!({ "transactionId": "tx123", "amount": 5000 }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let payment_rows: i64 = sqlx::query_scalar("SELECT count(*) FROM payments WHERE order_id = $1")
        .bind(Uuid::parse_str(&order_id)?)
        .fetch_one(&pool)
        .await?;
    assert_eq!(payment_rows, 1);

    // A different transaction against a paid order is a conflict.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/order/{order_id}"),
            json!({ "transactionId": "tx999" }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Cancel, then the order is gone.
    let response = app
        .clone()
        .oneshot(json_request("DELETE", &format!("/order/{order_id}"), json!({})))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get(&format!("/order/{order_id}"))).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn racing_finalize_writers_cannot_double_log_or_overwrite_the_transaction() -> Result<()> {
    let Some((_app, pool)) = db_app(Arc::new(MockGateway::default())).await else {
        return Ok(());
    };
    use drillworld_api::store::{OrderStore, PaymentStore};

    let orders = OrderStore::new(&pool);
    let body = json!({ "email": unique_email("racer"), "item": "drill" });
    let order_id = orders.insert(body.as_object().unwrap()).await?;

    // Two writers that both read the order as unpaid before either
    // committed, as two concurrent PATCH requests would.
    let mut first = pool.begin().await?;
    let mut second = pool.begin().await?;

    let pay1 = json!({ "transactionId": "tx123" });
    let pay2 = json!({ "transactionId": "tx999" });
    PaymentStore::record(&mut first, order_id, pay1.as_object().unwrap()).await?;
    PaymentStore::record(&mut second, order_id, pay2.as_object().unwrap()).await?;

    assert_eq!(OrderStore::mark_paid(&mut first, order_id, "tx123").await?, 1);
    first.commit().await?;

    // The loser matches zero rows; dropping its transaction rolls the
    // second payment row back, as the handler's conflict path does.
    assert_eq!(OrderStore::mark_paid(&mut second, order_id, "tx999").await?, 0);
    drop(second);

    let order = orders.find(order_id).await?.expect("order still present");
    assert!(order.paid);
    assert_eq!(order.transaction_id.as_deref(), Some("tx123"));

    let payment_rows: i64 = sqlx::query_scalar("SELECT count(*) FROM payments WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(payment_rows, 1);
    Ok(())
}

#[tokio::test]
async fn finalizing_a_missing_order_is_not_found_and_logs_no_payment() -> Result<()> {
    let Some((app, pool)) = db_app(Arc::new(MockGateway::default())).await else {
        return Ok(());
    };
    let ghost = Uuid::new_v4();

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/order/{ghost}"),
            json!({ "transactionId": "tx-none" }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let payment_rows: i64 = sqlx::query_scalar("SELECT count(*) FROM payments WHERE order_id = $1")
        .bind(ghost)
        .fetch_one(&pool)
        .await?;
    assert_eq!(payment_rows, 0);
    Ok(())
}

#[tokio::test]
async fn catalog_insert_and_fetch_round_trip() -> Result<()> {
    let Some((app, _pool)) = db_app(Arc::new(MockGateway::default())).await else {
        return Ok(());
    };

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tool",
            json!({ "name": "Hammer Drill", "price": 120 }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let tool_id = body_json(response).await["insertedId"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app.clone().oneshot(get(&format!("/tool/{tool_id}"))).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let tool = body_json(response).await;
    assert_eq!(tool["name"], "Hammer Drill");

    let response = app.oneshot(get("/tool")).await?;
    let tools = body_json(response).await;
    assert!(tools
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["_id"] == tool_id.as_str()));
    Ok(())
}
