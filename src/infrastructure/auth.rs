//! Bearer-token identity.
//!
//! Members sign in with an external provider; this module only verifies the
//! HS256 tokens it issues. The token subject is the member id.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::env;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::domain::CirculationError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MEMBER: &str = "member";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // member id
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn member_id(&self) -> &str {
        &self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn require_admin(&self) -> Result<(), CirculationError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CirculationError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = CirculationError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or(CirculationError::Unauthenticated)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(CirculationError::Unauthenticated)?;

        decode_jwt(token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            CirculationError::Unauthenticated
        })
    }
}

fn get_jwt_secret() -> Result<String, String> {
    match env::var("JWT_SECRET") {
        Ok(secret) => Ok(secret),
        Err(_) if cfg!(debug_assertions) => Ok("secret".to_string()),
        Err(_) => Err("JWT_SECRET environment variable must be set in production".to_string()),
    }
}

pub fn create_jwt(member_id: &str, role: &str) -> Result<String, String> {
    let secret = get_jwt_secret()?;
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| "token expiry out of range".to_string())?
        .timestamp();

    let claims = Claims {
        sub: member_id.to_owned(),
        role: role.to_owned(),
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn decode_jwt(token: &str) -> Result<Claims, String> {
    let secret = get_jwt_secret()?;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_keeps_subject_and_role() {
        let token = create_jwt("member-42", ROLE_MEMBER).unwrap();
        let claims = decode_jwt(&token).unwrap();
        assert_eq!(claims.member_id(), "member-42");
        assert!(!claims.is_admin());
        assert_eq!(claims.require_admin(), Err(CirculationError::Forbidden));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(decode_jwt("not.a.token").is_err());
    }
}
