use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::credential::models::UserProfile;
use crate::credential::ports::LoginServicePort;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// Account of the bearer.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<GetProfileResponseData>, ApiError> {
    state
        .login_service
        .get_profile(&user.user_id)
        .await
        .map_err(ApiError::from)
        .map(|ref profile| ApiSuccess::new(StatusCode::OK, profile.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetProfileResponseData {
    pub username: String,
    pub realname: String,
    pub user_uuid: String,
    pub user_permissions: Vec<String>,
}

impl From<&UserProfile> for GetProfileResponseData {
    fn from(profile: &UserProfile) -> Self {
        Self {
            username: profile.username.as_str().to_string(),
            realname: profile.display_name.clone(),
            user_uuid: profile.user_id.to_string(),
            user_permissions: profile.permissions.clone(),
        }
    }
}
