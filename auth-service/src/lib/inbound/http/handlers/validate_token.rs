use auth::TokenClaims;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::credential::errors::CredentialError;
use crate::credential::ports::LoginServicePort;
use crate::inbound::http::router::AppState;

pub async fn validate_token(
    State(state): State<AppState>,
    body: Result<Json<ValidateTokenRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<ValidateTokenResponseData>, ApiError> {
    let Json(body) = body?;
    let token = body
        .token
        .ok_or(CredentialError::MissingParameter("token"))?;

    let claims = state.login_service.validate_token(&token, Utc::now())?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ValidateTokenResponseData { claims },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidateTokenRequestBody {
    token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidateTokenResponseData {
    pub claims: TokenClaims,
}
