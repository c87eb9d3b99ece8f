use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use yamdb_core::error::CoreError;
use yamdb_model::User;

use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, INVALID_TOKEN};

const BEARER: &str = "Bearer ";

/// Resolves a `Bearer` token into the request's [`User`] extension.
///
/// Requests without credentials, or with a different scheme, pass through
/// anonymously. A bearer token that fails validation is rejected with 401
/// on every route, reads included.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(&request) else {
        return next.run(request).await;
    };

    match state.accounts.authenticate(&token).await {
        Ok(user) => {
            debug!(user_id = %user.id, "request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(CoreError::InvalidToken(reason)) => {
            debug!(%reason, "bearer token rejected");
            AppError::unauthorized(INVALID_TOKEN).into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

fn extract_bearer_token(request: &Request) -> Option<String> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;
    value
        .strip_prefix(BEARER)
        .map(|token| token.trim().to_string())
}

/// The caller, if the request carried a valid token.
#[derive(Debug, Clone, Default)]
pub struct Actor(pub Option<User>);

impl Actor {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Actor(parts.extensions.get::<User>().cloned()))
    }
}
