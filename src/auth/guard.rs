//! Perimeter check run before any page or action code.
//!
//! Token-only: it never touches the store. Authentication is decided first,
//! then role prefixes. Every failure ends in a redirect, never an error body.

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info};

use super::{
    cookie::{read_token, removal_cookie},
    jwt::JwtKeys,
    repo_types::Role,
};
use crate::state::AppState;

/// Paths the guard does not look at.
const BYPASS_PREFIXES: &[&str] = &["/api", "/static", "/favicon.ico"];

/// Paths that need a valid session.
const AUTH_PREFIXES: &[&str] = &[
    "/profile",
    "/jobs/applications",
    "/jobs/saved",
    "/employer/profile",
    "/employer/jobs",
    "/employer/applications",
    "/admin/dashboard",
    "/admin/employers",
    "/admin/users",
    "/admin/jobs",
    "/notifications",
];

/// Paths reserved for one role once a session exists.
const ROLE_PREFIXES: &[(&str, Role)] = &[("/employer", Role::Employer), ("/admin", Role::Admin)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathPolicy {
    pub login_required: bool,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    /// Continue, but drop the unusable cookie on the way out.
    PassClearingCookie,
    RedirectToLogin { callback: String, clear_cookie: bool },
    RedirectHome,
}

fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// `None` for paths outside the guard's scope.
pub fn policy_for(path: &str) -> Option<PathPolicy> {
    if BYPASS_PREFIXES.iter().any(|p| under(path, p)) {
        return None;
    }
    Some(PathPolicy {
        login_required: AUTH_PREFIXES.iter().any(|p| under(path, p)),
        role: ROLE_PREFIXES
            .iter()
            .find(|(p, _)| under(path, p))
            .map(|(_, role)| *role),
    })
}

pub fn decide(path: &str, token: Option<&str>, keys: &JwtKeys) -> GuardDecision {
    let Some(policy) = policy_for(path) else {
        return GuardDecision::Pass;
    };

    let anonymous = |clear_cookie: bool| {
        if policy.login_required {
            GuardDecision::RedirectToLogin {
                callback: path.to_string(),
                clear_cookie,
            }
        } else if clear_cookie {
            GuardDecision::PassClearingCookie
        } else {
            GuardDecision::Pass
        }
    };

    let Some(token) = token else {
        return anonymous(false);
    };
    let Some(claims) = keys.validate(token) else {
        return anonymous(true);
    };

    match policy.role {
        Some(required) if claims.role != required => GuardDecision::RedirectHome,
        _ => GuardDecision::Pass,
    }
}

/// Encodes each path segment so the callback decodes back to the exact path.
fn login_url(callback: &str) -> String {
    let encoded = callback
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    format!("/login?callbackUrl={encoded}")
}

pub async fn route_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let keys = JwtKeys::from_ref(&state);
    let path = req.uri().path().to_owned();
    let token = read_token(&jar);

    match decide(&path, token.as_deref(), &keys) {
        GuardDecision::Pass => next.run(req).await,
        GuardDecision::PassClearingCookie => {
            debug!(%path, "clearing invalid session cookie");
            (jar.remove(removal_cookie()), next.run(req).await).into_response()
        }
        GuardDecision::RedirectToLogin {
            callback,
            clear_cookie,
        } => {
            info!(%path, clear_cookie, "redirecting to login");
            let redirect = Redirect::temporary(&login_url(&callback));
            if clear_cookie {
                (jar.remove(removal_cookie()), redirect).into_response()
            } else {
                redirect.into_response()
            }
        }
        GuardDecision::RedirectHome => {
            info!(%path, "role not allowed on path, redirecting home");
            Redirect::temporary("/").into_response()
        }
    }
}
