use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use serde_json::{Value, json};

use yamdb_core::api::routes::v1;
use yamdb_core::application::unit_of_work::AppUnitOfWork;
use yamdb_core::auth::AccessTokens;
use yamdb_core::database::memory::{MemoryDatabase, UnavailableUsers};
use yamdb_core::mail::RecordingMailer;
use yamdb_model::UserId;
use yamdb_server::{AppState, create_app};

mod common;

use common::{TEST_TOKEN_KEY, build_test_app, test_config};

#[tokio::test]
async fn signup_mails_a_code_that_buys_one_token() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .post(v1::auth::SIGNUP)
        .json(&json!({ "username": "reader", "email": "reader@yamdb.test" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({ "username": "reader", "email": "reader@yamdb.test" }));

    let code = app
        .mailer
        .last_code_for("reader@yamdb.test")
        .await
        .expect("code mailed");

    let response = app
        .server
        .post(v1::auth::TOKEN)
        .json(&json!({ "username": "reader", "confirmation_code": code }))
        .await;
    response.assert_status_ok();
    let token = response.json::<Value>()["token"]
        .as_str()
        .expect("token")
        .to_string();

    let me = app.server.get(v1::users::CURRENT).authorization_bearer(&token).await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["role"], "user");

    // The code is spent once a token was issued.
    let reuse = app
        .server
        .post(v1::auth::TOKEN)
        .json(&json!({ "username": "reader", "confirmation_code": code }))
        .await;
    reuse.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        reuse.json::<Value>(),
        json!({ "confirmation_code": ["Invalid confirmation code."] })
    );
    Ok(())
}

#[tokio::test]
async fn repeated_signup_resends_for_the_same_pair() -> Result<()> {
    let app = build_test_app()?;
    let payload = json!({ "username": "reader", "email": "reader@yamdb.test" });

    app.server.post(v1::auth::SIGNUP).json(&payload).await.assert_status_ok();
    app.server.post(v1::auth::SIGNUP).json(&payload).await.assert_status_ok();
    assert_eq!(app.mailer.sent().await.len(), 2);

    let taken = app
        .server
        .post(v1::auth::SIGNUP)
        .json(&json!({ "username": "reader", "email": "other@yamdb.test" }))
        .await;
    taken.assert_status(StatusCode::BAD_REQUEST);
    assert!(taken.json::<Value>().get("username").is_some());

    let email_taken = app
        .server
        .post(v1::auth::SIGNUP)
        .json(&json!({ "username": "another", "email": "reader@yamdb.test" }))
        .await;
    email_taken.assert_status(StatusCode::BAD_REQUEST);
    assert!(email_taken.json::<Value>().get("email").is_some());
    Ok(())
}

#[tokio::test]
async fn signup_validates_fields() -> Result<()> {
    let app = build_test_app()?;

    let empty = app.server.post(v1::auth::SIGNUP).json(&json!({})).await;
    empty.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = empty.json();
    assert_eq!(body["username"][0], "This field is required.");
    assert_eq!(body["email"][0], "This field is required.");

    let reserved = app
        .server
        .post(v1::auth::SIGNUP)
        .json(&json!({ "username": "me", "email": "me@yamdb.test" }))
        .await;
    reserved.assert_status(StatusCode::BAD_REQUEST);
    assert!(reserved.json::<Value>().get("username").is_some());

    let bad_chars = app
        .server
        .post(v1::auth::SIGNUP)
        .json(&json!({ "username": "bad name!", "email": "not-an-email" }))
        .await;
    bad_chars.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = bad_chars.json();
    assert!(body.get("username").is_some());
    assert!(body.get("email").is_some());
    assert!(app.mailer.sent().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn token_errors() -> Result<()> {
    let app = build_test_app()?;

    let missing = app.server.post(v1::auth::TOKEN).json(&json!({})).await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = missing.json();
    assert!(body.get("username").is_some());
    assert!(body.get("confirmation_code").is_some());

    let unknown = app
        .server
        .post(v1::auth::TOKEN)
        .json(&json!({ "username": "ghost", "confirmation_code": "abc" }))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        unknown.json::<Value>(),
        json!({ "detail": "No User matches the given query." })
    );

    app.server
        .post(v1::auth::SIGNUP)
        .json(&json!({ "username": "reader", "email": "reader@yamdb.test" }))
        .await
        .assert_status_ok();
    let wrong = app
        .server
        .post(v1::auth::TOKEN)
        .json(&json!({ "username": "reader", "confirmation_code": "0-deadbeef" }))
        .await;
    wrong.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn invalid_bearer_tokens_are_rejected_even_on_reads() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .get(v1::titles::COLLECTION)
        .authorization_bearer("not-a-jwt")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>(),
        json!({ "detail": "Given token not valid for any token type" })
    );

    // Other schemes are ignored and the request proceeds anonymously.
    let response = app
        .server
        .get(v1::titles::COLLECTION)
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic cm9vdDpyb290"),
        )
        .await;
    response.assert_status_ok();
    Ok(())
}

#[tokio::test]
async fn tokens_for_deleted_users_stop_working() -> Result<()> {
    let app = build_test_app()?;
    let admin = app.admin_token().await?;
    let token = app.token_for("reader", "reader@yamdb.test").await?;

    app.server
        .delete(&yamdb_core::api::routes::utils::replace_param(
            v1::users::ITEM,
            "{username}",
            "reader",
        ))
        .authorization_bearer(&admin)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .get(v1::users::CURRENT)
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn user_store_outage_is_a_server_error_not_a_bad_token() -> Result<()> {
    let mut unit_of_work = AppUnitOfWork::in_memory(Arc::new(MemoryDatabase::new()));
    unit_of_work.users = Arc::new(UnavailableUsers);
    let state = AppState::new(
        Arc::new(unit_of_work),
        None,
        Arc::new(test_config()?),
        Arc::new(RecordingMailer::new()),
    )?;
    let server = TestServer::new(create_app(state))?;

    let token = AccessTokens::new(TEST_TOKEN_KEY.as_bytes(), Duration::from_secs(3600))
        .issue(UserId(1))?;
    let response = server
        .get(v1::categories::COLLECTION)
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({ "detail": "A server error occurred." })
    );

    // Anonymous reads never touch the users store.
    server
        .get(v1::categories::COLLECTION)
        .await
        .assert_status_ok();
    Ok(())
}
