use chrono_tz::Tz;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the Bookly REST backend, including the `/api` prefix.
    pub api_base_url: Url,
    /// Public origin used to build shareable booking links.
    pub public_base_url: String,
    pub debug: bool,
    pub auth_token: String,
    pub enable_swagger: bool,
    pub port: u16,
    /// Business timezone; "today" and month boundaries are decided here, not
    /// in the host clock's zone.
    pub timezone: Tz,
    /// Seconds between appointment cache refreshes.
    pub refresh_interval_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // Load from environment variables with APP_ prefix. No key
            // separator: APP_AUTH_TOKEN must map to the flat `auth_token`
            // key, not a nested `auth.token`.
            .add_source(Environment::with_prefix("APP"))
            .set_default("api_base_url", "http://localhost:3001/api")?
            .set_default("public_base_url", "http://localhost:8080/book")?
            .set_default("debug", false)?
            .set_default("auth_token", "default-token-change-me")?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .set_default("timezone", "America/New_York")?
            .set_default("refresh_interval_secs", 120)?
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_defaults() {
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.refresh_interval_secs, 120);
        assert_eq!(settings.timezone, chrono_tz::America::New_York);
        assert_eq!(
            settings.api_base_url.as_str(),
            "http://localhost:3001/api"
        );
    }

    #[test]
    #[serial]
    fn test_port_override() {
        unsafe { std::env::set_var("APP_PORT", "9090") };
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.port, 9090);
        unsafe { std::env::remove_var("APP_PORT") };
    }

    #[test]
    #[serial]
    fn test_multi_word_overrides() {
        unsafe {
            std::env::set_var("APP_AUTH_TOKEN", "override-secret");
            std::env::set_var("APP_API_BASE_URL", "http://backend:4000/api");
            std::env::set_var("APP_REFRESH_INTERVAL_SECS", "30");
        }
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.auth_token, "override-secret");
        assert_eq!(settings.api_base_url.as_str(), "http://backend:4000/api");
        assert_eq!(settings.refresh_interval_secs, 30);
        unsafe {
            std::env::remove_var("APP_AUTH_TOKEN");
            std::env::remove_var("APP_API_BASE_URL");
            std::env::remove_var("APP_REFRESH_INTERVAL_SECS");
        }
    }
}
