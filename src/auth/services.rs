use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    password::{hash_password, verify_password},
    repo_types::{NewUser, Role, User},
};
use crate::{error::AppError, store::Store};

const REGISTER_FAILED: &str = "An error occurred during registration";
const LOGIN_FAILED: &str = "An error occurred during login";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

lazy_static! {
    /// Verified against on unknown emails so both login failures cost one Argon2 run.
    static ref DUMMY_HASH: Option<String> = hash_password("jobboard-unknown-user").ok();
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Parsed registration input.
#[derive(Debug)]
pub struct Registration<'a> {
    pub email: String,
    pub password: &'a str,
    pub display_name: &'a str,
    pub role: Role,
}

impl<'a> Registration<'a> {
    pub fn parse(
        email: &str,
        password: &'a str,
        display_name: &'a str,
        role: Option<&str>,
    ) -> Result<Self, AppError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AppError::validation("Invalid email"));
        }
        if password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        let role = match role {
            None => Role::JobSeeker,
            Some(raw) => raw.parse()?,
        };
        if role == Role::Admin {
            return Err(AppError::validation("Admin accounts cannot be self-registered"));
        }
        Ok(Self {
            email,
            password,
            display_name,
            role,
        })
    }
}

/// Creates the user and its profile; duplicate email is a conflict.
pub async fn register_account(
    store: &dyn Store,
    registration: Registration<'_>,
) -> Result<User, AppError> {
    let existing = store
        .find_user_by_email(&registration.email)
        .await
        .map_err(AppError::storage(REGISTER_FAILED))?;
    if existing.is_some() {
        warn!(email = %registration.email, "email already registered");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let hash = hash_password(registration.password).map_err(AppError::storage(REGISTER_FAILED))?;

    // The unique index still catches a concurrent registration of the same email.
    let user = store
        .create_user(NewUser {
            email: &registration.email,
            password_hash: &hash,
            role: registration.role,
            display_name: registration.display_name,
        })
        .await
        .map_err(AppError::storage(REGISTER_FAILED))?
        .ok_or_else(|| AppError::Conflict("User already exists".into()))?;

    info!(user_id = %user.id, role = %user.role, "user registered");
    Ok(user)
}

/// Checks credentials. Unknown email and wrong password are indistinguishable.
pub async fn authenticate(store: &dyn Store, email: &str, password: &str) -> Result<User, AppError> {
    let email = normalize_email(email);
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let Some(user) = store
        .find_user_by_email(&email)
        .await
        .map_err(AppError::storage(LOGIN_FAILED))?
    else {
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = verify_password(password, hash);
        }
        warn!(%email, "login unknown email");
        return Err(invalid());
    };

    let ok = verify_password(password, &user.password_hash).map_err(AppError::storage(LOGIN_FAILED))?;
    if !ok {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}
