use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};

use yamdb_core::api::routes::{utils::replace_param, v1};

mod common;

use common::build_test_app;

fn user_path(username: &str) -> String {
    replace_param(v1::users::ITEM, "{username}", username)
}

#[tokio::test]
async fn user_admin_requires_the_admin_role() -> Result<()> {
    let app = build_test_app()?;
    let admin = app.admin_token().await?;
    let moderator = app.token_with_role(&admin, "mod", "moderator").await?;

    app.server
        .get(v1::users::COLLECTION)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .get(v1::users::COLLECTION)
        .authorization_bearer(&moderator)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .post(v1::users::COLLECTION)
        .authorization_bearer(&moderator)
        .json(&json!({ "username": "x", "email": "x@yamdb.test" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .get(&user_path("mod"))
        .authorization_bearer(&moderator)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_manages_accounts() -> Result<()> {
    let app = build_test_app()?;
    let admin = app.admin_token().await?;

    let created = app
        .server
        .post(v1::users::COLLECTION)
        .authorization_bearer(&admin)
        .json(&json!({
            "username": "critic",
            "email": "critic@yamdb.test",
            "first_name": "Roger",
            "bio": "Thumbs up."
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    assert_eq!(
        created.json::<Value>(),
        json!({
            "username": "critic",
            "email": "critic@yamdb.test",
            "first_name": "Roger",
            "last_name": "",
            "bio": "Thumbs up.",
            "role": "user"
        })
    );

    let duplicate = app
        .server
        .post(v1::users::COLLECTION)
        .authorization_bearer(&admin)
        .json(&json!({ "username": "critic", "email": "critic2@yamdb.test" }))
        .await;
    duplicate.assert_status(StatusCode::BAD_REQUEST);
    assert!(duplicate.json::<Value>().get("username").is_some());

    let listed = app
        .server
        .get(v1::users::COLLECTION)
        .authorization_bearer(&admin)
        .await;
    listed.assert_status_ok();
    let body: Value = listed.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["username"], "critic");
    assert_eq!(body["results"][1]["username"], "root");

    let searched = app
        .server
        .get(v1::users::COLLECTION)
        .add_query_param("search", "crit")
        .authorization_bearer(&admin)
        .await;
    assert_eq!(searched.json::<Value>()["count"], 1);

    let promoted = app
        .server
        .patch(&user_path("critic"))
        .authorization_bearer(&admin)
        .json(&json!({ "role": "moderator" }))
        .await;
    promoted.assert_status_ok();
    assert_eq!(promoted.json::<Value>()["role"], "moderator");

    let bad_role = app
        .server
        .patch(&user_path("critic"))
        .authorization_bearer(&admin)
        .json(&json!({ "role": "overlord" }))
        .await;
    bad_role.assert_status(StatusCode::BAD_REQUEST);
    assert!(bad_role.json::<Value>().get("role").is_some());

    app.server
        .get(&user_path("critic"))
        .authorization_bearer(&admin)
        .await
        .assert_status_ok();
    app.server
        .delete(&user_path("critic"))
        .authorization_bearer(&admin)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let gone = app
        .server
        .get(&user_path("critic"))
        .authorization_bearer(&admin)
        .await;
    gone.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn put_is_not_offered_on_users() -> Result<()> {
    let app = build_test_app()?;
    let admin = app.admin_token().await?;

    let response = app
        .server
        .put(&user_path("root"))
        .authorization_bearer(&admin)
        .json(&json!({ "username": "root", "email": "root@yamdb.test" }))
        .await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        response.json::<Value>(),
        json!({ "detail": "Method \"PUT\" not allowed." })
    );
    Ok(())
}

#[tokio::test]
async fn profile_edits_cannot_change_the_role() -> Result<()> {
    let app = build_test_app()?;
    let token = app.token_for("reader", "reader@yamdb.test").await?;

    app.server
        .get(v1::users::CURRENT)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .patch(v1::users::CURRENT)
        .authorization_bearer(&token)
        .json(&json!({ "bio": "I read a lot.", "role": "admin" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["bio"], "I read a lot.");
    assert_eq!(body["role"], "user");

    let blank = app
        .server
        .patch(v1::users::CURRENT)
        .authorization_bearer(&token)
        .json(&json!({ "email": "" }))
        .await;
    blank.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(blank.json::<Value>()["email"][0], "This field may not be blank.");
    Ok(())
}
