use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::authenticate::authenticate;
use super::handlers::change_password::change_password;
use super::handlers::get_profile::get_profile;
use super::handlers::validate_token::validate_token;
use super::middleware::authenticate as auth_middleware;
use crate::credential::ports::LoginServicePort;

#[derive(Clone)]
pub struct AppState {
    pub login_service: Arc<dyn LoginServicePort>,
}

pub fn create_router(login_service: Arc<dyn LoginServicePort>) -> Router {
    let state = AppState { login_service };

    let public_routes = Router::new()
        .route("/api/auth/login", post(authenticate))
        .route("/api/auth/validate", post(validate_token));

    let protected_routes = Router::new()
        .route("/api/users/me", get(get_profile))
        .route("/api/users/me/password", post(change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Headers are left out of the span; they carry bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
