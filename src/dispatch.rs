// src/dispatch.rs
//! OTP delivery channels.
//!
//! Delivery sits behind a trait so verification logic never knows whether
//! codes travel over the messaging gateway or land on stdout during local
//! development.

use serde_json::json;
use tracing::{error, info};

use crate::environment::Secrets;

#[rocket::async_trait]
pub trait OtpChannel: Send + Sync {
    /// Deliver `message` to `contact` (a WhatsApp number or email address).
    async fn send(&self, contact: &str, message: &str) -> Result<(), String>;
}

/// Prints codes to stdout. The default when no gateway is configured.
pub struct ConsoleChannel;

#[rocket::async_trait]
impl OtpChannel for ConsoleChannel {
    async fn send(&self, contact: &str, message: &str) -> Result<(), String> {
        println!("-------------------------------------------------");
        println!("One-time code for {contact}");
        println!("{message}");
        println!("-------------------------------------------------");
        info!("Console OTP delivery to {}", contact);
        Ok(())
    }
}

/// Relays codes through an HTTP messaging gateway.
pub struct GatewayChannel {
    client: reqwest::Client,
    base_url: String,
}

impl GatewayChannel {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[rocket::async_trait]
impl OtpChannel for GatewayChannel {
    async fn send(&self, contact: &str, message: &str) -> Result<(), String> {
        let response = self
            .client
            .post(&self.base_url)
            .json(&json!({ "to": contact, "body": message }))
            .send()
            .await
            .map_err(|e| {
                error!("Gateway request failed: {}", e);
                format!("Gateway request failed: {e}")
            })?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Gateway returned {} for {}", status, contact);
            return Err(format!("Gateway returned {status}"));
        }

        info!("Gateway OTP delivery to {}", contact);
        Ok(())
    }
}

/// Pick the channel the environment calls for.
pub fn channel_from_secrets(secrets: &Secrets) -> Box<dyn OtpChannel> {
    match &secrets.otp_gateway_url {
        Some(url) => Box::new(GatewayChannel::new(url.clone())),
        None => Box::new(ConsoleChannel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_channel_always_delivers() {
        let channel = ConsoleChannel;
        assert!(channel.send("+911234567890", "Your code is 123456").await.is_ok());
    }
}
