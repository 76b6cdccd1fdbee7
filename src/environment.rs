// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub database_path: PathBuf,
    pub uploads_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

impl EnvironmentConfig {
    /// Load configuration based on environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);
        Self::load_from_file(&environment)
    }

    fn get_environment() -> String {
        std::env::var("JOBCONNECTOR_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_from_file(environment: &str) -> Result<Self> {
        let config_path = PathBuf::from("config.yaml");
        if !config_path.exists() {
            anyhow::bail!(
                "config.yaml not found in current directory. Server cannot start without configuration."
            );
        }

        let config_content =
            std::fs::read_to_string(&config_path).context("Failed to read config.yaml")?;

        let config_file: ConfigFile =
            serde_yaml::from_str(&config_content).context("Failed to parse config.yaml")?;

        let env_config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        Ok(Self {
            database_path: Self::resolve_path(&env_config.database_path)?,
            uploads_path: Self::resolve_path(&env_config.uploads_path)?,
        })
    }

    fn resolve_path(path: &PathBuf) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.clone())
        } else {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(path))
        }
    }
}

/// Secrets and switches supplied through the environment rather than
/// config.yaml: the token signing key, the outbound OTP gateway, and the
/// OTP bypass escape hatch.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub jwt_secret: String,
    pub otp_gateway_url: Option<String>,
    pub allow_otp_bypass: bool,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let otp_gateway_url = std::env::var("OTP_GATEWAY_URL")
            .ok()
            .filter(|v| !v.is_empty());

        // Bypass is a trusted-client testing hatch. Defaults on only in
        // debug builds; production must opt in explicitly.
        let allow_otp_bypass = std::env::var("OTP_ALLOW_BYPASS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(cfg!(debug_assertions));

        Ok(Self {
            jwt_secret,
            otp_gateway_url,
            allow_otp_bypass,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path_absolute() {
        let path = PathBuf::from("/tmp/jobconnector.db");
        assert_eq!(EnvironmentConfig::resolve_path(&path).unwrap(), path);
    }

    #[test]
    fn test_resolve_path_relative() {
        let resolved = EnvironmentConfig::resolve_path(&PathBuf::from("data/app.db")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("data/app.db"));
    }
}
