use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::jwt::TOKEN_TTL;

pub const TOKEN_COOKIE: &str = "token";

/// HTTP-only session cookie, valid for the token's lifetime on every path.
pub fn token_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(TOKEN_TTL)
        .build()
}

/// Cookie handed to `CookieJar::remove`; the path must match the one set at login.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, "")).path("/").build()
}

/// The stored credential, if any. An empty value counts as absent.
pub fn read_token(jar: &CookieJar) -> Option<String> {
    jar.get(TOKEN_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}
