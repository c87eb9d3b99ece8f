use std::sync::Arc;

use anyhow::{Context, Result};
use axum_test::TestServer;
use serde_json::{Value, json};

use yamdb_config::Config;
use yamdb_config::loader::compose_config;
use yamdb_config::models::sources::EnvConfig;
use yamdb_core::api::routes::v1;
use yamdb_core::application::unit_of_work::AppUnitOfWork;
use yamdb_core::database::memory::MemoryDatabase;
use yamdb_core::mail::RecordingMailer;
use yamdb_server::{AppState, create_app};

pub const TEST_TOKEN_KEY: &str = "integration-test-token-key-0123456789abcdef";

// Code is used by test modules, but not in this scope
#[allow(unused)]
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

#[allow(unused)]
pub fn test_config() -> Result<Config> {
    let env = EnvConfig {
        token_key: Some(TEST_TOKEN_KEY.to_string()),
        dev_mode: Some(true),
        ..EnvConfig::default()
    };
    let load = compose_config(None, env, None, false).context("test config")?;
    Ok(load.config)
}

#[allow(unused)]
pub fn build_test_app() -> Result<TestApp> {
    let config = Arc::new(test_config()?);
    let unit_of_work = AppUnitOfWork::in_memory(Arc::new(MemoryDatabase::new()));
    let mailer = Arc::new(RecordingMailer::new());
    let state = AppState::new(Arc::new(unit_of_work), None, config, mailer.clone())?;
    let server = TestServer::new(create_app(state.clone()))?;
    Ok(TestApp {
        server,
        state,
        mailer,
    })
}

#[allow(unused)]
impl TestApp {
    /// Runs signup and token exchange for `username`, returning the access
    /// token.
    pub async fn token_for(&self, username: &str, email: &str) -> Result<String> {
        let response = self
            .server
            .post(v1::auth::SIGNUP)
            .json(&json!({ "username": username, "email": email }))
            .await;
        response.assert_status_ok();

        let code = self
            .mailer
            .last_code_for(email)
            .await
            .context("confirmation code mailed")?;
        let response = self
            .server
            .post(v1::auth::TOKEN)
            .json(&json!({ "username": username, "confirmation_code": code }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("token in response")
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.state
            .accounts
            .create_superuser("root".into(), "root@yamdb.test".into())
            .await?;
        self.token_for("root", "root@yamdb.test").await
    }

    /// Creates a user and assigns `role` through the admin API.
    pub async fn token_with_role(
        &self,
        admin_token: &str,
        username: &str,
        role: &str,
    ) -> Result<String> {
        let email = format!("{username}@yamdb.test");
        let response = self
            .server
            .post(v1::users::COLLECTION)
            .authorization_bearer(admin_token)
            .json(&json!({ "username": username, "email": email, "role": role }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        self.token_for(username, &email).await
    }

    /// Seeds a category, two genres and one title; returns the title id.
    pub async fn seed_title(&self, admin_token: &str) -> Result<i64> {
        for (path, name, slug) in [
            (v1::categories::COLLECTION, "Movies", "movie"),
            (v1::genres::COLLECTION, "Drama", "drama"),
            (v1::genres::COLLECTION, "Crime", "crime"),
        ] {
            self.server
                .post(path)
                .authorization_bearer(admin_token)
                .json(&json!({ "name": name, "slug": slug }))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let response = self
            .server
            .post(v1::titles::COLLECTION)
            .authorization_bearer(admin_token)
            .json(&json!({
                "name": "The Godfather",
                "year": 1972,
                "description": "An offer you can't refuse.",
                "category": "movie",
                "genre": ["drama", "crime"]
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        body["id"].as_i64().context("title id")
    }
}
