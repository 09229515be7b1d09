//! Application configuration loaded from environment variables.
//!
//! Backends are chosen by which credentials are present: a Firebase API key
//! selects the hosted session provider, a GCP project selects Firestore.
//! Without them the app runs fully in-process.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Single-shot geolocation request options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeolocationOptions {
    /// Ask the device for its most precise fix
    pub high_accuracy: bool,
    /// Give up after this long
    pub timeout: Duration,
    /// A previous fix younger than this may be reused
    pub max_cache_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(10_000),
            max_cache_age: Duration::ZERO,
        }
    }
}

/// Fixed device position used when no real location API is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Local API port
    pub port: u16,
    /// UI shell origin allowed by CORS
    pub frontend_url: String,
    /// Firebase Web API key (hosted session provider)
    pub firebase_api_key: Option<String>,
    /// GCP project ID (Firestore document store)
    pub gcp_project_id: Option<String>,
    /// Simulated checkout delay for the premium upgrade
    pub premium_upgrade_delay: Duration,
    pub geolocation: GeolocationOptions,
    pub device_fix: Option<DeviceFix>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self::test_default()
    }
}

impl Config {
    /// In-process backends and no simulated delays.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            firebase_api_key: None,
            gcp_project_id: None,
            premium_upgrade_delay: Duration::ZERO,
            geolocation: GeolocationOptions::default(),
            device_fix: Some(DeviceFix {
                latitude: 37.3318,
                longitude: -122.0312,
                accuracy: 12.0,
            }),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = GeolocationOptions::default();
        let geolocation = GeolocationOptions {
            high_accuracy: parse_var("GEO_HIGH_ACCURACY")?.unwrap_or(defaults.high_accuracy),
            timeout: parse_var("GEO_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            max_cache_age: parse_var("GEO_MAX_AGE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_cache_age),
        };

        let device_fix = match (
            parse_var::<f64>("DEVICE_LATITUDE")?,
            parse_var::<f64>("DEVICE_LONGITUDE")?,
        ) {
            (Some(latitude), Some(longitude)) => Some(DeviceFix {
                latitude,
                longitude,
                accuracy: parse_var("DEVICE_ACCURACY")?.unwrap_or(50.0),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("DEVICE_LONGITUDE")),
            (None, Some(_)) => return Err(ConfigError::Missing("DEVICE_LATITUDE")),
        };

        Ok(Self {
            port: parse_var("PORT")?.unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            firebase_api_key: non_empty_var("FIREBASE_API_KEY"),
            gcp_project_id: non_empty_var("GCP_PROJECT_ID"),
            premium_upgrade_delay: Duration::from_millis(
                parse_var("PREMIUM_UPGRADE_DELAY_MS")?.unwrap_or(2000),
            ),
            geolocation,
            device_fix,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    non_empty_var(name)
        .map(|raw| raw.parse().map_err(|_| ConfigError::Invalid(name, raw)))
        .transpose()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("PORT", "9090");
        env::set_var("GEO_TIMEOUT_MS", "2500");
        env::set_var("PREMIUM_UPGRADE_DELAY_MS", "10");
        env::remove_var("DEVICE_LATITUDE");
        env::remove_var("DEVICE_LONGITUDE");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 9090);
        assert_eq!(config.geolocation.timeout, Duration::from_millis(2500));
        assert!(config.geolocation.high_accuracy);
        assert_eq!(config.premium_upgrade_delay, Duration::from_millis(10));
        assert!(config.device_fix.is_none());

        env::remove_var("PORT");
        env::remove_var("GEO_TIMEOUT_MS");
        env::remove_var("PREMIUM_UPGRADE_DELAY_MS");

        // Kept in the same test: env vars are process-global.
        env::set_var("GEO_MAX_AGE_MS", "soon");
        let err = Config::from_env().unwrap_err();
        env::remove_var("GEO_MAX_AGE_MS");

        assert!(matches!(err, ConfigError::Invalid("GEO_MAX_AGE_MS", _)));
    }
}
