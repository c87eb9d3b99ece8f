use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};

use yamdb_core::api::routes::{utils::replace_param, v1};

mod common;

use common::build_test_app;

fn title_path(id: i64) -> String {
    replace_param(v1::titles::ITEM, "{title_id}", id.to_string())
}

#[tokio::test]
async fn taxa_are_public_to_read_and_admin_to_write() -> Result<()> {
    let app = build_test_app()?;
    let admin = app.admin_token().await?;
    let reader = app.token_for("reader", "reader@yamdb.test").await?;

    app.server
        .post(v1::genres::COLLECTION)
        .json(&json!({ "name": "Drama", "slug": "drama" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .post(v1::genres::COLLECTION)
        .authorization_bearer(&reader)
        .json(&json!({ "name": "Drama", "slug": "drama" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    for (name, slug) in [("Drama", "drama"), ("Documentary", "docs"), ("Comedy", "comedy")] {
        let response = app
            .server
            .post(v1::genres::COLLECTION)
            .authorization_bearer(&admin)
            .json(&json!({ "name": name, "slug": slug }))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>(), json!({ "name": name, "slug": slug }));
    }

    let listed = app.server.get(v1::genres::COLLECTION).await;
    listed.assert_status_ok();
    let body: Value = listed.json();
    assert_eq!(body["count"], 3);
    assert_eq!(body["next"], Value::Null);
    assert_eq!(body["previous"], Value::Null);
    assert_eq!(body["results"][0]["slug"], "comedy");

    let searched = app
        .server
        .get(v1::genres::COLLECTION)
        .add_query_param("search", "d")
        .await;
    let body: Value = searched.json();
    assert_eq!(body["count"], 3);
    let searched = app
        .server
        .get(v1::genres::COLLECTION)
        .add_query_param("search", "doc")
        .await;
    assert_eq!(searched.json::<Value>()["results"][0]["slug"], "docs");

    let duplicate = app
        .server
        .post(v1::genres::COLLECTION)
        .authorization_bearer(&admin)
        .json(&json!({ "name": "Drama again", "slug": "drama" }))
        .await;
    duplicate.assert_status(StatusCode::BAD_REQUEST);
    assert!(duplicate.json::<Value>().get("slug").is_some());

    let genre_item = replace_param(v1::genres::ITEM, "{slug}", "docs");
    app.server
        .delete(&genre_item)
        .authorization_bearer(&admin)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .delete(&genre_item)
        .authorization_bearer(&admin)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Taxa have no detail view.
    app.server
        .get(&genre_item)
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

#[tokio::test]
async fn titles_embed_relations_on_read_and_echo_slugs_on_write() -> Result<()> {
    let app = build_test_app()?;
    let admin = app.admin_token().await?;
    let title_id = app.seed_title(&admin).await?;

    let response = app.server.get(&title_path(title_id)).await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({
            "id": title_id,
            "name": "The Godfather",
            "year": 1972,
            "rating": null,
            "description": "An offer you can't refuse.",
            "genre": [
                { "name": "Crime", "slug": "crime" },
                { "name": "Drama", "slug": "drama" }
            ],
            "category": { "name": "Movies", "slug": "movie" }
        })
    );

    let patched = app
        .server
        .patch(&title_path(title_id))
        .authorization_bearer(&admin)
        .json(&json!({ "genre": ["crime"] }))
        .await;
    patched.assert_status_ok();
    let body: Value = patched.json();
    assert_eq!(body["genre"], json!(["crime"]));
    assert_eq!(body["category"], "movie");
    assert_eq!(body["name"], "The Godfather");
    assert!(body.get("rating").is_none());

    let partial_put = app
        .server
        .put(&title_path(title_id))
        .authorization_bearer(&admin)
        .json(&json!({ "name": "The Godfather Part II" }))
        .await;
    partial_put.assert_status(StatusCode::BAD_REQUEST);
    let errors: Value = partial_put.json();
    assert!(errors.get("year").is_some());
    assert!(errors.get("category").is_some());
    assert!(errors.get("genre").is_some());

    let put = app
        .server
        .put(&title_path(title_id))
        .authorization_bearer(&admin)
        .json(&json!({
            "name": "The Godfather Part II",
            "year": 1974,
            "category": "movie",
            "genre": ["drama"]
        }))
        .await;
    put.assert_status_ok();
    let body: Value = put.json();
    assert_eq!(body["year"], 1974);
    assert_eq!(body["description"], "");
    Ok(())
}

#[tokio::test]
async fn title_writes_validate_slugs_and_year() -> Result<()> {
    let app = build_test_app()?;
    let admin = app.admin_token().await?;
    app.seed_title(&admin).await?;

    let response = app
        .server
        .post(v1::titles::COLLECTION)
        .authorization_bearer(&admin)
        .json(&json!({
            "name": "Unknown",
            "year": 1999,
            "category": "podcast",
            "genre": ["drama", "jazz"]
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["category"][0], "Object with slug=podcast does not exist.");
    assert_eq!(body["genre"][0], "Object with slug=jazz does not exist.");

    let future = app
        .server
        .post(v1::titles::COLLECTION)
        .authorization_bearer(&admin)
        .json(&json!({
            "name": "Future",
            "year": 3000,
            "category": "movie",
            "genre": ["drama"]
        }))
        .await;
    future.assert_status(StatusCode::BAD_REQUEST);
    assert!(future.json::<Value>().get("year").is_some());

    let reader = app.token_for("reader", "reader@yamdb.test").await?;
    app.server
        .post(v1::titles::COLLECTION)
        .authorization_bearer(&reader)
        .json(&json!({ "name": "Mine", "year": 2000, "category": "movie", "genre": [] }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn titles_filter_by_query_parameters() -> Result<()> {
    let app = build_test_app()?;
    let admin = app.admin_token().await?;
    app.seed_title(&admin).await?;
    app.server
        .post(v1::categories::COLLECTION)
        .authorization_bearer(&admin)
        .json(&json!({ "name": "Books", "slug": "book" }))
        .await
        .assert_status(StatusCode::CREATED);
    app.server
        .post(v1::titles::COLLECTION)
        .authorization_bearer(&admin)
        .json(&json!({
            "name": "Crime and Punishment",
            "year": 1866,
            "category": "book",
            "genre": ["crime"]
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let count = |params: &'static [(&'static str, &'static str)]| {
        let mut request = app.server.get(v1::titles::COLLECTION);
        for (key, value) in params {
            request = request.add_query_param(key, value);
        }
        request
    };

    assert_eq!(count(&[]).await.json::<Value>()["count"], 2);
    assert_eq!(count(&[("genre", "crime")]).await.json::<Value>()["count"], 2);
    assert_eq!(count(&[("genre", "drama")]).await.json::<Value>()["count"], 1);
    assert_eq!(count(&[("category", "book")]).await.json::<Value>()["count"], 1);
    assert_eq!(count(&[("name", "CRIME")]).await.json::<Value>()["count"], 1);
    assert_eq!(count(&[("year", "1972")]).await.json::<Value>()["count"], 1);

    let bad_year = count(&[("year", "nineteen")]).await;
    bad_year.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(bad_year.json::<Value>(), json!({ "year": ["Enter a number."] }));
    Ok(())
}

#[tokio::test]
async fn deleting_a_category_keeps_its_titles() -> Result<()> {
    let app = build_test_app()?;
    let admin = app.admin_token().await?;
    let title_id = app.seed_title(&admin).await?;

    app.server
        .delete(&replace_param(v1::categories::ITEM, "{slug}", "movie"))
        .authorization_bearer(&admin)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = app.server.get(&title_path(title_id)).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["category"], Value::Null);

    app.server
        .delete(&title_path(title_id))
        .authorization_bearer(&admin)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .get(&title_path(title_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn title_fields_are_decoded_leniently() -> Result<()> {
    let app = build_test_app()?;
    let admin = app.admin_token().await?;
    let title_id = app.seed_title(&admin).await?;

    let created = app
        .server
        .post(v1::titles::COLLECTION)
        .authorization_bearer(&admin)
        .json(&json!({
            "name": "Heat",
            "year": "1995",
            "category": "movie",
            "genre": ["crime"]
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    assert_eq!(created.json::<Value>()["year"], 1995);

    let rejected = app
        .server
        .patch(&title_path(title_id))
        .authorization_bearer(&admin)
        .json(&json!({ "year": "nineteen seventy-two", "genre": "drama" }))
        .await;
    rejected.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        rejected.json::<Value>(),
        json!({
            "year": ["A valid integer is required."],
            "genre": ["Expected a list of items but got type \"str\"."]
        })
    );
    Ok(())
}
