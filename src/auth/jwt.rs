use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::{claims::Claims, repo_types::Role};
use crate::{config::JwtConfig, state::AppState};

/// Lifetime of a session token and of the cookie that carries it.
pub const TOKEN_TTL: Duration = Duration::days(7);

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }

    pub fn mint(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.mint_at(user_id, role, OffsetDateTime::now_utc())
    }

    pub fn mint_at(
        &self,
        user_id: Uuid,
        role: Role,
        issued_at: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = issued_at + TOKEN_TTL;
        let claims = Claims {
            sub: user_id,
            role,
            iat: issued_at.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, role = %role, "jwt signed");
        Ok(token)
    }

    /// Checks signature, expiry, issuer and audience. Every failure,
    /// including garbage input, is reported as `None`.
    pub fn validate(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => {
                debug!(user_id = %data.claims.sub, role = %data.claims.role, "jwt verified");
                Some(data.claims)
            }
            Err(e) => {
                debug!(error = %e, "jwt rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
        })
    }

    /// Replaces the character at `idx` with a different base64url character.
    fn flip_char(token: &str, idx: usize) -> String {
        let mut bytes = token.as_bytes().to_vec();
        bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn mint_then_validate_returns_same_identity() {
        let keys = make_keys("dev-secret");
        for role in [Role::JobSeeker, Role::Employer, Role::Admin] {
            let user_id = Uuid::new_v4();
            let token = keys.mint(user_id, role).expect("mint");
            let claims = keys.validate(&token).expect("valid token");
            assert_eq!(claims.sub, user_id);
            assert_eq!(claims.role, role);
            assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
        }
    }

    #[test]
    fn token_is_valid_until_expiry_and_invalid_after() {
        let keys = make_keys("dev-secret");
        let user_id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        let almost_expired = keys
            .mint_at(user_id, Role::Employer, now - TOKEN_TTL + Duration::minutes(1))
            .unwrap();
        assert!(keys.validate(&almost_expired).is_some());

        let expired = keys
            .mint_at(user_id, Role::Employer, now - TOKEN_TTL - Duration::seconds(1))
            .unwrap();
        assert!(keys.validate(&expired).is_none());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let ours = make_keys("our-secret");
        let theirs = make_keys("their-secret");
        let token = theirs.mint(Uuid::new_v4(), Role::Admin).unwrap();
        assert!(ours.validate(&token).is_none());
    }

    #[test]
    fn tampered_payload_or_signature_is_rejected() {
        let keys = make_keys("dev-secret");
        let token = keys.mint(Uuid::new_v4(), Role::JobSeeker).unwrap();
        let first_dot = token.find('.').unwrap();
        let second_dot = token.rfind('.').unwrap();

        let payload_mid = (first_dot + second_dot) / 2;
        assert!(keys.validate(&flip_char(&token, payload_mid)).is_none());

        // Skip the final character: its low bits may be padding.
        let signature_mid = (second_dot + token.len()) / 2;
        assert!(keys.validate(&flip_char(&token, signature_mid)).is_none());
    }

    #[test]
    fn malformed_tokens_are_rejected_without_error() {
        let keys = make_keys("dev-secret");
        for garbage in ["", "abc", "a.b.c", "not a token at all"] {
            assert!(keys.validate(garbage).is_none());
        }
    }

    #[test]
    fn wrong_issuer_or_audience_is_rejected() {
        let good = make_keys("same-secret");
        let other = JwtKeys::new(&JwtConfig {
            secret: "same-secret".into(),
            issuer: "elsewhere".into(),
            audience: "someone-else".into(),
        });
        let token = other.mint(Uuid::new_v4(), Role::Admin).unwrap();
        assert!(good.validate(&token).is_none());
    }
}
