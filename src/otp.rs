// src/otp.rs
//! OTP challenge issue and verification.
//!
//! The server holds no OTP state: the issued code is echoed to the caller,
//! who presents it back alongside the user's input. Verification is a
//! stateless comparison plus an identity lookup.

use rand::Rng;
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::mint_token;
use crate::dispatch::OtpChannel;
use crate::environment::Secrets;
use crate::error::{ApiError, ApiResult};
use crate::identity::lookup_identity;
use crate::models::{IdentityRecord, Role};

/// Six digits, never with a leading zero.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

#[derive(Debug)]
pub struct ChallengeIssued {
    pub message: String,
    pub server_otp: String,
}

#[derive(Debug)]
pub struct VerificationOutcome {
    pub message: String,
    pub user: Option<IdentityRecord>,
    pub is_new_user: bool,
    pub token: Option<String>,
}

pub struct OtpManager<'a> {
    pool: &'a SqlitePool,
    channel: &'a dyn OtpChannel,
    secrets: &'a Secrets,
}

impl<'a> OtpManager<'a> {
    pub fn new(pool: &'a SqlitePool, channel: &'a dyn OtpChannel, secrets: &'a Secrets) -> Self {
        Self {
            pool,
            channel,
            secrets,
        }
    }

    fn validate_role(role: Option<&str>) -> ApiResult<Role> {
        let role = match role {
            Some(r) if !r.trim().is_empty() => r.trim(),
            _ => return Err(ApiError::Validation("Role is required".to_string())),
        };
        Role::parse(role)
            .ok_or_else(|| ApiError::Validation("Invalid role specified".to_string()))
    }

    fn validate_contact<'c>(
        whatsapp: Option<&'c str>,
        email: Option<&'c str>,
    ) -> ApiResult<(Option<&'c str>, Option<&'c str>)> {
        let whatsapp = whatsapp.map(str::trim).filter(|s| !s.is_empty());
        let email = email.map(str::trim).filter(|s| !s.is_empty());
        if whatsapp.is_none() && email.is_none() {
            return Err(ApiError::Validation(
                "WhatsApp number or email is required".to_string(),
            ));
        }
        Ok((whatsapp, email))
    }

    /// Issue a challenge. With `login_request` set, the contact must already
    /// belong to a registered user of the given role.
    pub async fn request_challenge(
        &self,
        whatsapp: Option<&str>,
        email: Option<&str>,
        role: Option<&str>,
        login_request: bool,
    ) -> ApiResult<ChallengeIssued> {
        let (whatsapp, email) = Self::validate_contact(whatsapp, email)?;
        let role = Self::validate_role(role)?;

        if login_request {
            let user = lookup_identity(self.pool, role, whatsapp, email)
                .await
                .map_err(ApiError::server)?;
            if user.is_none() {
                return Err(ApiError::NotFound(
                    "User not found, please register first".to_string(),
                ));
            }
        }

        let otp = generate_otp();
        let body = format!("Your verification code is {otp}");

        let message = if let Some(number) = whatsapp {
            self.channel.send(number, &body).await.map_err(|e| {
                tracing::error!("WhatsApp OTP delivery failed: {}", e);
                ApiError::Delivery("Failed to send WhatsApp OTP".to_string())
            })?;
            "OTP sent on WhatsApp".to_string()
        } else {
            // validate_contact guarantees email is present here
            let address = email.unwrap_or_default();
            self.channel.send(address, &body).await.map_err(|e| {
                tracing::error!("Email OTP delivery failed: {}", e);
                ApiError::Delivery("Failed to send Email OTP".to_string())
            })?;
            "OTP sent on email".to_string()
        };

        info!("OTP challenge issued for role {}", role.as_str());
        Ok(ChallengeIssued {
            message,
            server_otp: otp,
        })
    }

    /// Verify a challenge and establish a session for registered users.
    /// New contacts verify successfully with no user and no token; the
    /// client follows up with registration.
    pub async fn verify_challenge(
        &self,
        whatsapp: Option<&str>,
        email: Option<&str>,
        role: Option<&str>,
        otp: Option<&str>,
        server_otp: Option<&str>,
        bypass: bool,
    ) -> ApiResult<VerificationOutcome> {
        let (whatsapp, email) = Self::validate_contact(whatsapp, email)?;
        let role = Self::validate_role(role)?;

        let bypassed = bypass && self.secrets.allow_otp_bypass;
        if !bypassed {
            let otp = otp.map(str::trim).filter(|s| !s.is_empty());
            let server_otp = server_otp.map(str::trim).filter(|s| !s.is_empty());
            match (otp, server_otp) {
                (Some(otp), Some(server_otp)) => {
                    if otp != server_otp {
                        return Err(ApiError::Auth("Invalid OTP".to_string()));
                    }
                }
                _ => {
                    return Err(ApiError::Validation(
                        "OTP and server OTP are required".to_string(),
                    ))
                }
            }
        }

        let user = lookup_identity(self.pool, role, whatsapp, email)
            .await
            .map_err(ApiError::server)?;

        let token = match &user {
            Some(record) => Some(
                mint_token(record.id(), role, &self.secrets.jwt_secret)
                    .map_err(ApiError::server)?,
            ),
            None => None,
        };

        let is_new_user = user.is_none();
        let message = if bypassed {
            "Bypass successful".to_string()
        } else {
            "OTP verification successful".to_string()
        };

        info!(
            "OTP verified for role {} (new user: {})",
            role.as_str(),
            is_new_user
        );
        Ok(VerificationOutcome {
            message,
            user,
            is_new_user,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::dispatch::ConsoleChannel;
    use crate::identity::{NewSeeker, SeekerRepository};

    fn secrets(bypass: bool) -> Secrets {
        Secrets {
            jwt_secret: "unit-test-secret".to_string(),
            otp_gateway_url: None,
            allow_otp_bypass: bypass,
        }
    }

    #[test]
    fn test_generated_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[tokio::test]
    async fn test_challenge_requires_contact_and_role() {
        let db = Database::in_memory().await.unwrap();
        let secrets = secrets(false);
        let channel = ConsoleChannel;
        let manager = OtpManager::new(db.pool(), &channel, &secrets);

        let no_contact = manager
            .request_challenge(None, None, Some("seeker"), false)
            .await;
        assert!(matches!(no_contact, Err(ApiError::Validation(m)) if m.contains("required")));

        let no_role = manager
            .request_challenge(Some("+911234567890"), None, None, false)
            .await;
        assert!(matches!(no_role, Err(ApiError::Validation(m)) if m == "Role is required"));

        let bad_role = manager
            .request_challenge(Some("+911234567890"), None, Some("wizard"), false)
            .await;
        assert!(matches!(bad_role, Err(ApiError::Validation(m)) if m == "Invalid role specified"));
    }

    #[tokio::test]
    async fn test_login_challenge_requires_existing_user() {
        let db = Database::in_memory().await.unwrap();
        let secrets = secrets(false);
        let channel = ConsoleChannel;
        let manager = OtpManager::new(db.pool(), &channel, &secrets);

        let missing = manager
            .request_challenge(Some("+911234567890"), None, Some("seeker"), true)
            .await;
        assert!(
            matches!(missing, Err(ApiError::NotFound(m)) if m == "User not found, please register first")
        );

        SeekerRepository::new(db.pool())
            .create(NewSeeker {
                full_name: "Asha Verma".to_string(),
                whatsapp_number: Some("+911234567890".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let issued = manager
            .request_challenge(Some("+911234567890"), None, Some("seeker"), true)
            .await
            .unwrap();
        assert_eq!(issued.message, "OTP sent on WhatsApp");
        assert_eq!(issued.server_otp.len(), 6);
    }

    #[tokio::test]
    async fn test_verify_matches_echoed_code() {
        let db = Database::in_memory().await.unwrap();
        let secrets = secrets(false);
        let channel = ConsoleChannel;
        let manager = OtpManager::new(db.pool(), &channel, &secrets);

        let outcome = manager
            .verify_challenge(
                Some("+911234567890"),
                None,
                Some("seeker"),
                Some("482913"),
                Some("482913"),
                false,
            )
            .await
            .unwrap();
        assert_eq!(outcome.message, "OTP verification successful");
        assert!(outcome.is_new_user);
        assert!(outcome.user.is_none());
        assert!(outcome.token.is_none());

        let mismatch = manager
            .verify_challenge(
                Some("+911234567890"),
                None,
                Some("seeker"),
                Some("111111"),
                Some("482913"),
                false,
            )
            .await;
        assert!(matches!(mismatch, Err(ApiError::Auth(m)) if m == "Invalid OTP"));

        let incomplete = manager
            .verify_challenge(Some("+911234567890"), None, Some("seeker"), None, None, false)
            .await;
        assert!(
            matches!(incomplete, Err(ApiError::Validation(m)) if m == "OTP and server OTP are required")
        );
    }

    #[tokio::test]
    async fn test_registered_user_gets_token() {
        let db = Database::in_memory().await.unwrap();
        let secrets = secrets(false);
        let channel = ConsoleChannel;
        let manager = OtpManager::new(db.pool(), &channel, &secrets);

        SeekerRepository::new(db.pool())
            .create(NewSeeker {
                full_name: "Asha Verma".to_string(),
                email: Some("asha@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome = manager
            .verify_challenge(
                None,
                Some("asha@example.com"),
                Some("seeker"),
                Some("482913"),
                Some("482913"),
                false,
            )
            .await
            .unwrap();
        assert!(!outcome.is_new_user);
        assert!(outcome.user.is_some());
        let token = outcome.token.unwrap();
        let claims = crate::auth::decode_token(&token, "unit-test-secret").unwrap();
        assert_eq!(claims.role, Role::Seeker);
    }

    #[tokio::test]
    async fn test_bypass_honors_environment_gate() {
        let db = Database::in_memory().await.unwrap();
        let channel = ConsoleChannel;

        let open = secrets(true);
        let manager = OtpManager::new(db.pool(), &channel, &open);
        let outcome = manager
            .verify_challenge(Some("+911234567890"), None, Some("seeker"), None, None, true)
            .await
            .unwrap();
        assert_eq!(outcome.message, "Bypass successful");

        let closed = secrets(false);
        let manager = OtpManager::new(db.pool(), &channel, &closed);
        let refused = manager
            .verify_challenge(Some("+911234567890"), None, Some("seeker"), None, None, true)
            .await;
        assert!(matches!(refused, Err(ApiError::Validation(_))));
    }
}
