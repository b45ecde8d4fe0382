use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument};

use super::{
    cookie::{removal_cookie, token_cookie},
    dto::{AuthResponse, LoginRequest, RegisterRequest, SessionResponse},
    jwt::JwtKeys,
    repo_types::User,
    services::{authenticate, register_account, Registration},
    session::CurrentIdentity,
};
use crate::{error::AppError, extract::ApiJson, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", get(logout).post(logout))
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/api/me", get(session))
}

fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user: &User,
    failure: &'static str,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let token = JwtKeys::from_ref(state)
        .mint(user.id, user.role)
        .map_err(AppError::storage(failure))?;
    let jar = jar.add(token_cookie(token, state.config.cookie_secure()));
    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            role: user.role,
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let registration = Registration::parse(
        &payload.email,
        &payload.password,
        &payload.full_name,
        payload.role.as_deref(),
    )?;
    let user = register_account(state.store.as_ref(), registration).await?;
    issue_session(&state, jar, &user, "An error occurred during registration")
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let user = authenticate(state.store.as_ref(), &payload.email, &payload.password).await?;
    issue_session(&state, jar, &user, "An error occurred during login")
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    info!("session cookie cleared");
    (jar.remove(removal_cookie()), Redirect::to("/"))
}

/// Current identity without the password hash, or a bare 401.
#[instrument(skip(identity))]
pub async fn session(CurrentIdentity(identity): CurrentIdentity) -> Response {
    match identity {
        Some(identity) => Json(SessionResponse {
            user: identity.into(),
        })
        .into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}
