// src/auth.rs
//! JWT session tokens and Rocket request guards.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::environment::Secrets;
use crate::error::ApiError;
use crate::models::Role;

pub const TOKEN_VALIDITY_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Mint a session token for a verified user.
pub fn mint_token(user_id: i64, role: Role, secret: &str) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        user_id,
        role,
        iat: now,
        exp: now + TOKEN_VALIDITY_HOURS * 3600,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to sign session token")
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .context("Invalid session token")?;
    Ok(data.claims)
}

/// Any bearer of a valid session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub role: Role,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ApiError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let secrets = match req.guard::<&State<Secrets>>().await {
            Outcome::Success(secrets) => secrets,
            _ => {
                return Outcome::Error((
                    Status::InternalServerError,
                    ApiError::Server("Server error".to_string()),
                ))
            }
        };

        let header = match req.headers().get_one("Authorization") {
            Some(value) => value,
            None => {
                return Outcome::Error((
                    Status::Unauthorized,
                    ApiError::Auth("Authorization header missing".to_string()),
                ))
            }
        };

        let token = match header.strip_prefix("Bearer ") {
            Some(token) => token.trim(),
            None => {
                return Outcome::Error((
                    Status::Unauthorized,
                    ApiError::Auth("Malformed Authorization header".to_string()),
                ))
            }
        };

        match decode_token(token, &secrets.jwt_secret) {
            Ok(claims) => Outcome::Success(AuthenticatedUser {
                user_id: claims.user_id,
                role: claims.role,
            }),
            Err(e) => {
                warn!("Rejected session token: {}", e);
                Outcome::Error((
                    Status::Unauthorized,
                    ApiError::Auth("Invalid or expired token".to_string()),
                ))
            }
        }
    }
}

/// Narrows [`AuthenticatedUser`] to the admin role for moderation routes.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ApiError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedUser::from_request(req).await {
            Outcome::Success(user) if user.role == Role::Admin => {
                Outcome::Success(AdminUser(user))
            }
            Outcome::Success(_) => Outcome::Error((
                Status::Forbidden,
                ApiError::Auth("Admin access required".to_string()),
            )),
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(f) => Outcome::Forward(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_and_decode_round_trip() {
        let token = mint_token(42, Role::Seeker, "unit-test-secret").unwrap();
        let claims = decode_token(&token, "unit-test-secret").unwrap();

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, Role::Seeker);
        assert!(claims.exp - claims.iat == TOKEN_VALIDITY_HOURS * 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = mint_token(7, Role::Provider, "secret-a").unwrap();
        assert!(decode_token(&token, "secret-b").is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(decode_token("not.a.token", "secret").is_err());
    }
}
