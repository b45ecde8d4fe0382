use serde::{Deserialize, Serialize};

use super::{repo_types::Role, session::IdentityView};

/// Request body for registration. `role` defaults to `JOB_SEEKER`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after login or register; the token itself travels in the cookie.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: IdentityView,
}
