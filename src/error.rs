// src/error.rs
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error taxonomy for the public API. Every variant carries the
/// user-visible message; the HTTP status is derived from the variant.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input.
    Validation(String),
    /// An identity or job reference did not resolve.
    NotFound(String),
    /// OTP mismatch or bad/missing session token.
    Auth(String),
    /// OTP dispatch to the outbound channel failed.
    Delivery(String),
    /// Duplicate profile on create.
    Conflict(String),
    /// Unclassified persistence or runtime failure.
    Server(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) | ApiError::Auth(_) | ApiError::Conflict(_) => {
                Status::BadRequest
            }
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Delivery(_) | ApiError::Server(_) => Status::InternalServerError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(m)
            | ApiError::NotFound(m)
            | ApiError::Auth(m)
            | ApiError::Delivery(m)
            | ApiError::Conflict(m)
            | ApiError::Server(m) => m,
        }
    }

    /// Wrap an internal failure, logging the cause and hiding it from the
    /// client.
    pub fn server(err: anyhow::Error) -> Self {
        tracing::error!("internal error: {:#}", err);
        ApiError::Server("Server error".to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let body = Json(ErrorBody {
            success: false,
            message: self.message().to_string(),
        });
        let mut response = body.respond_to(req)?;
        response.set_status(status);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Validation("x".into()).status(), Status::BadRequest);
        assert_eq!(ApiError::NotFound("x".into()).status(), Status::NotFound);
        assert_eq!(ApiError::Auth("x".into()).status(), Status::BadRequest);
        assert_eq!(ApiError::Conflict("x".into()).status(), Status::BadRequest);
        assert_eq!(
            ApiError::Delivery("x".into()).status(),
            Status::InternalServerError
        );
        assert_eq!(
            ApiError::Server("x".into()).status(),
            Status::InternalServerError
        );
    }

    #[test]
    fn test_message_passthrough() {
        let err = ApiError::NotFound("User not found, please register first".into());
        assert_eq!(err.message(), "User not found, please register first");
        assert_eq!(err.to_string(), "User not found, please register first");
    }
}
