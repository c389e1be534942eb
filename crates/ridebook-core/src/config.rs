//! Configuration module
//!
//! Client configuration for the driver-management tooling: backend location and
//! credentials, request/upload timeouts and per-category document size limits.

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_API_VERSION, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_UPLOAD_TIMEOUT_SECS, MIB,
};
use crate::models::FileType;

/// Authentication strategy for the backend API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_version: String,
    pub auth: Auth,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub max_license_size_mb: u64,
    pub max_insurance_size_mb: u64,
    pub max_identity_size_mb: u64,
    pub max_vehicle_registration_size_mb: u64,
    pub environment: String,
}

impl ClientConfig {
    /// Load `.env` (if present) and read configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("RIDEBOOK_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let api_version =
            lookup("RIDEBOOK_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let auth = match (lookup("RIDEBOOK_API_KEY"), lookup("RIDEBOOK_TOKEN")) {
            (Some(key), _) if !key.trim().is_empty() => Auth::XApiKey(key),
            (_, Some(token)) if !token.trim().is_empty() => Auth::Bearer(token),
            _ => {
                return Err(anyhow::anyhow!(
                    "Missing credentials. Set RIDEBOOK_API_KEY or RIDEBOOK_TOKEN"
                ))
            }
        };

        let parse_u64 = |key: &str, default: u64| -> Result<u64, anyhow::Error> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
                None => Ok(default),
            }
        };

        let config = ClientConfig {
            api_url,
            api_version,
            auth,
            request_timeout_secs: parse_u64(
                "RIDEBOOK_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            upload_timeout_secs: parse_u64(
                "RIDEBOOK_UPLOAD_TIMEOUT_SECS",
                DEFAULT_UPLOAD_TIMEOUT_SECS,
            )?,
            max_license_size_mb: parse_u64(
                "MAX_LICENSE_SIZE_MB",
                FileType::License.default_max_size_bytes() / MIB,
            )?,
            max_insurance_size_mb: parse_u64(
                "MAX_INSURANCE_SIZE_MB",
                FileType::Insurance.default_max_size_bytes() / MIB,
            )?,
            max_identity_size_mb: parse_u64(
                "MAX_IDENTITY_SIZE_MB",
                FileType::Identity.default_max_size_bytes() / MIB,
            )?,
            max_vehicle_registration_size_mb: parse_u64(
                "MAX_VEHICLE_REGISTRATION_SIZE_MB",
                FileType::VehicleRegistration.default_max_size_bytes() / MIB,
            )?,
            environment: lookup("ENVIRONMENT")
                .or_else(|| lookup("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let is_https = self.api_url.starts_with("https://");
        if !is_https && !self.api_url.starts_with("http://") {
            return Err(anyhow::anyhow!(
                "RIDEBOOK_API_URL must start with http:// or https://"
            ));
        }
        if self.is_production() && !is_https {
            return Err(anyhow::anyhow!(
                "RIDEBOOK_API_URL must use https:// in production"
            ));
        }
        if self.request_timeout_secs == 0 || self.upload_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Timeouts must be greater than zero"));
        }
        for file_type in FileType::ALL {
            let mb = self.max_size_mb(file_type);
            if mb == 0 {
                return Err(anyhow::anyhow!(
                    "Size limit for {} documents must be greater than zero",
                    file_type
                ));
            }
            if mb.checked_mul(MIB).is_none() {
                return Err(anyhow::anyhow!(
                    "Size limit for {} documents is too large: {} MB",
                    file_type,
                    mb
                ));
            }
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    /// API prefix, e.g. `/api/v1`.
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    fn max_size_mb(&self, file_type: FileType) -> u64 {
        match file_type {
            FileType::License => self.max_license_size_mb,
            FileType::Insurance => self.max_insurance_size_mb,
            FileType::Identity => self.max_identity_size_mb,
            FileType::VehicleRegistration => self.max_vehicle_registration_size_mb,
        }
    }

    /// Size limit in bytes. Saturates on a limit that `validate` would reject.
    pub fn max_size_bytes(&self, file_type: FileType) -> u64 {
        self.max_size_mb(file_type).saturating_mul(MIB)
    }
}
