use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::credential::models::LoginCredentials;
use crate::credential::ports::LoginServicePort;
use crate::inbound::http::router::AppState;

/// Exchange a username and password for a signed access token.
pub async fn authenticate(
    State(state): State<AppState>,
    body: Result<Json<AuthenticateRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<AuthenticateResponseData>, ApiError> {
    let Json(body) = body?;
    let credentials = LoginCredentials::from_parts(body.username, body.password)?;

    let outcome = state
        .login_service
        .login(credentials, Utc::now())
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        AuthenticateResponseData {
            token: outcome.token,
        },
    ))
}

/// Fields are optional so an absent one is reported by name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthenticateRequestBody {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticateResponseData {
    pub token: String,
}
