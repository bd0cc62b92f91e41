use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use chrono::Utc;

use crate::credential::models::UserId;
use crate::credential::ports::LoginServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Identity of the bearer, stored in request extensions by [`authenticate`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Middleware that validates bearer tokens and adds the caller to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer_token(&req)?;

    let claims = state
        .login_service
        .validate_token(token, Utc::now())
        .map_err(|e| {
            tracing::warn!(error = %e, "Bearer token rejected");
            unauthorized("Invalid or expired token")
        })?;

    let user_id = UserId::from_string(&claims.user_uuid).map_err(|e| {
        tracing::error!(error = %e, "Token carries an unparseable user_uuid");
        unauthorized("Invalid token format")
    })?;

    req.extensions_mut().insert(AuthenticatedUser { user_id });

    Ok(next.run(req).await)
}

fn extract_bearer_token(req: &Request) -> Result<&str, Response> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let value = header
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header"))?;

    value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            unauthorized("Invalid Authorization header format. Expected: Bearer <token>")
        })
}

fn unauthorized(message: &str) -> Response {
    ApiError::Unauthorized(message.to_string()).into_response()
}
