//! Resolves the request's cookie into the current user and role profile.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{
    cookie::read_token,
    jwt::JwtKeys,
    repo_types::{AdminProfile, EmployerProfile, JobSeekerProfile, Role, User, UserRecord},
};
use crate::{error::AppError, state::AppState, store::Store};

/// The profile matching the user's role. Exactly one per identity.
#[derive(Debug, Clone)]
pub enum Profile {
    JobSeeker(JobSeekerProfile),
    Employer(EmployerProfile),
    Admin(AdminProfile),
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
    pub profile: Profile,
}

impl Identity {
    /// Pairs the user with the profile its role calls for. A user whose
    /// matching profile row is missing has no usable identity.
    pub fn from_record(record: UserRecord) -> Option<Self> {
        let UserRecord {
            user,
            job_seeker,
            employer,
            admin,
        } = record;
        let profile = match user.role {
            Role::JobSeeker => job_seeker.map(Profile::JobSeeker),
            Role::Employer => employer.map(Profile::Employer),
            Role::Admin => admin.map(Profile::Admin),
        };
        match profile {
            Some(profile) => Some(Self { user, profile }),
            None => {
                error!(user_id = %user.id, role = %user.role, "user has no profile for its role");
                None
            }
        }
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn job_seeker(&self) -> Option<&JobSeekerProfile> {
        match &self.profile {
            Profile::JobSeeker(p) => Some(p),
            _ => None,
        }
    }

    pub fn employer(&self) -> Option<&EmployerProfile> {
        match &self.profile {
            Profile::Employer(p) => Some(p),
            _ => None,
        }
    }

    pub fn admin(&self) -> Option<&AdminProfile> {
        match &self.profile {
            Profile::Admin(p) => Some(p),
            _ => None,
        }
    }
}

/// Session lookup: token validation, then a store read.
///
/// Never fails. A missing or invalid token, a deleted user, a role that no
/// longer matches the token, and storage errors all yield `None`.
pub async fn current_identity(
    store: &dyn Store,
    keys: &JwtKeys,
    token: Option<&str>,
) -> Option<Identity> {
    let claims = keys.validate(token?)?;

    let record = match store.find_user_record(claims.sub).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!(user_id = %claims.sub, "token subject no longer exists");
            return None;
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), user_id = %claims.sub, "identity lookup failed");
            return None;
        }
    };

    if record.user.role != claims.role {
        warn!(user_id = %claims.sub, token_role = %claims.role, "token role does not match user");
        return None;
    }

    Identity::from_record(record)
}

/// Extractor form of [`current_identity`]; never rejects.
pub struct CurrentIdentity(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let keys = JwtKeys::from_ref(&state);
        let jar = CookieJar::from_headers(&parts.headers);
        let token = read_token(&jar);
        let identity = current_identity(state.store.as_ref(), &keys, token.as_deref()).await;
        Ok(CurrentIdentity(identity))
    }
}

impl CurrentIdentity {
    fn require<'a, P>(
        &'a self,
        capability: &'static str,
        pick: impl FnOnce(&'a Identity) -> Option<&'a P>,
    ) -> Result<(&'a Identity, &'a P), AppError> {
        let Some(identity) = self.0.as_ref() else {
            warn!(capability, "unauthenticated request to gated action");
            return Err(AppError::unauthorized());
        };
        match pick(identity) {
            Some(profile) => Ok((identity, profile)),
            None => {
                warn!(user_id = %identity.user.id, role = %identity.role(), capability, "missing capability");
                Err(AppError::unauthorized())
            }
        }
    }

    pub fn job_seeker(&self) -> Result<(&Identity, &JobSeekerProfile), AppError> {
        self.require("job_seeker", Identity::job_seeker)
    }

    pub fn employer(&self) -> Result<(&Identity, &EmployerProfile), AppError> {
        self.require("employer", Identity::employer)
    }

    pub fn admin(&self) -> Result<(&Identity, &AdminProfile), AppError> {
        self.require("admin", Identity::admin)
    }
}

/// Identity as returned by the session query endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub job_seeker: Option<JobSeekerProfile>,
    pub employer: Option<EmployerProfile>,
    pub admin: Option<AdminProfile>,
}

impl From<Identity> for IdentityView {
    fn from(identity: Identity) -> Self {
        let Identity { user, profile } = identity;
        let (job_seeker, employer, admin) = match profile {
            Profile::JobSeeker(p) => (Some(p), None, None),
            Profile::Employer(p) => (None, Some(p), None),
            Profile::Admin(p) => (None, None, Some(p)),
        };
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            job_seeker,
            employer,
            admin,
        }
    }
}
