use anyhow::Result;
use axum::http::{HeaderValue, StatusCode, header};
use serde_json::{Value, json};

use yamdb_core::api::routes::{HEALTH, PING, v1};

mod common;

use common::build_test_app;

#[tokio::test]
async fn probes_report_ok() -> Result<()> {
    let app = build_test_app()?;

    let ping = app.server.get(PING).await;
    ping.assert_status_ok();
    assert_eq!(ping.json::<Value>()["status"], "ok");

    let health = app.server.get(HEALTH).await;
    health.assert_status_ok();
    let body: Value = health.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "in-memory");
    Ok(())
}

#[tokio::test]
async fn unknown_paths_render_json() -> Result<()> {
    let app = build_test_app()?;

    let response = app.server.get("/api/v1/nothing-here/").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>(), json!({ "detail": "Not found." }));

    let response = app.server.delete(v1::titles::COLLECTION).await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        response.json::<Value>(),
        json!({ "detail": "Method \"DELETE\" not allowed." })
    );
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .post(v1::auth::SIGNUP)
        .add_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )
        .bytes("{not json".into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["detail"].is_string());

    let response = app
        .server
        .post(v1::auth::SIGNUP)
        .json(&json!({ "username": ["root"], "email": "x@yamdb.test" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "username": ["Not a valid string."] })
    );
    Ok(())
}

#[tokio::test]
async fn lists_page_through_results() -> Result<()> {
    let app = build_test_app()?;
    let admin = app.admin_token().await?;

    for n in 0..12 {
        app.server
            .post(v1::categories::COLLECTION)
            .authorization_bearer(&admin)
            .json(&json!({ "name": format!("Category {n:02}"), "slug": format!("c{n:02}") }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let first = app.server.get(v1::categories::COLLECTION).await;
    first.assert_status_ok();
    let body: Value = first.json();
    assert_eq!(body["count"], 12);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(10));
    assert_eq!(body["previous"], Value::Null);
    let next = body["next"].as_str().expect("next link");
    assert!(next.ends_with("/api/v1/categories/?page=2"), "{next}");

    let second = app
        .server
        .get(v1::categories::COLLECTION)
        .add_query_param("page", 2)
        .await;
    second.assert_status_ok();
    let body: Value = second.json();
    assert_eq!(body["results"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["results"][0]["slug"], "c10");
    assert_eq!(body["next"], Value::Null);
    let previous = body["previous"].as_str().expect("previous link");
    assert!(previous.ends_with("/api/v1/categories/"), "{previous}");

    for page in ["3", "zero", "0"] {
        let response = app
            .server
            .get(v1::categories::COLLECTION)
            .add_query_param("page", page)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>(), json!({ "detail": "Invalid page." }));
    }
    Ok(())
}
