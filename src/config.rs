//! Service configuration loaded from the environment.
//!
//! Values come from process environment variables, optionally seeded from an
//! env file by `dotenv`. Everything is parsed and validated once at startup and
//! then passed explicitly to the components that need it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;
use crate::intake::FormSchema;
use crate::profile::GenAiConfig;
use crate::pubsub::TrackerConfig;
use crate::report::SmtpConfig;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "'{}' is not one of development, staging, production",
                other
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub app_name: String,
    pub environment: Environment,
    /// Lowercase tracing level used when `RUST_LOG` is not set.
    pub log_level: String,
    pub host: String,
    pub port: u16,

    /// Maximum deliveries of one message id that reach downstream processing.
    pub max_endpoint_retries: u32,
    pub tracker: TrackerConfig,

    /// Optional YAML override for the positional form table.
    pub form_schema_path: Option<PathBuf>,

    pub genai: GenAiConfig,
    pub smtp: SmtpConfig,

    /// Recipient of every profile report.
    pub designer_email: String,
    pub email_max_attempts: u32,
    pub retry_delay: Duration,
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// Call `dotenv` before this if an env file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match get("ENVIRONMENT") {
            Some(value) => value
                .parse::<Environment>()
                .map_err(|reason| ConfigError::Invalid { key: "ENVIRONMENT", reason })?,
            None => Environment::Development,
        };

        let log_level = get("LOG_LEVEL")
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_else(|| "info".to_string());
        let log_level = match log_level.as_str() {
            "warning" => "warn".to_string(),
            "critical" => "error".to_string(),
            _ => log_level,
        };
        if !VALID_LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(ConfigError::Invalid {
                key: "LOG_LEVEL",
                reason: format!("'{}' is not one of {:?}", log_level, VALID_LOG_LEVELS),
            });
        }

        let max_endpoint_retries: u32 = parse_or(&get, "MAX_ENDPOINT_RETRIES", 3)?;
        if max_endpoint_retries > 10 {
            return Err(ConfigError::Invalid {
                key: "MAX_ENDPOINT_RETRIES",
                reason: "must be between 0 and 10".to_string(),
            });
        }

        let capacity: usize = parse_or(&get, "RETRY_TRACKER_CAPACITY", 10_000)?;
        if capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "RETRY_TRACKER_CAPACITY",
                reason: "must be positive".to_string(),
            });
        }
        let ttl_secs: u64 = parse_or(&get, "RETRY_TRACKER_TTL_SECS", 24 * 60 * 60)?;
        if ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "RETRY_TRACKER_TTL_SECS",
                reason: "must be positive".to_string(),
            });
        }

        let smtp_port: u16 = parse_or(&get, "SMTP_PORT", 587)?;
        if smtp_port == 0 {
            return Err(ConfigError::Invalid {
                key: "SMTP_PORT",
                reason: "must be between 1 and 65535".to_string(),
            });
        }

        let designer_email = get("DESIGNER_EMAIL").ok_or(ConfigError::Missing("DESIGNER_EMAIL"))?;

        let genai_defaults = GenAiConfig::default();
        let genai = GenAiConfig {
            api_key: get("GEMINI_API_KEY"),
            model: get("GENAI_MODEL").unwrap_or(genai_defaults.model),
            base_url: get("GENAI_BASE_URL").unwrap_or(genai_defaults.base_url),
            timeout: Duration::from_secs(parse_or(
                &get,
                "GENAI_TIMEOUT_SECS",
                genai_defaults.timeout.as_secs(),
            )?),
        };

        let username = get("SMTP_USERNAME");
        let smtp = SmtpConfig {
            server: get("SMTP_SERVER").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: smtp_port,
            sender_email: get("SENDER_EMAIL").or_else(|| username.clone()),
            username,
            password: get("SMTP_PASSWORD"),
            use_tls: parse_or(&get, "SMTP_USE_TLS", true)?,
            sender_name: get("SENDER_NAME").unwrap_or_else(|| "Interior AI Service".to_string()),
        };

        Ok(Self {
            app_name: get("APP_NAME").unwrap_or_else(|| "Interior AI Service".to_string()),
            environment,
            log_level,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            max_endpoint_retries,
            tracker: TrackerConfig {
                capacity,
                ttl: Duration::from_secs(ttl_secs),
            },
            form_schema_path: get("FORM_SCHEMA_PATH").map(PathBuf::from),
            genai,
            smtp,
            designer_email,
            email_max_attempts: parse_or(&get, "EMAIL_MAX_ATTEMPTS", 3)?,
            retry_delay: Duration::from_secs(parse_or(&get, "RETRY_DELAY_SECONDS", 5)?),
        })
    }

    /// Load the positional form table, from `FORM_SCHEMA_PATH` when set.
    pub fn load_form_schema(&self) -> Result<FormSchema, ConfigError> {
        match &self.form_schema_path {
            Some(path) => Ok(FormSchema::load_from_file(Path::new(path))?),
            None => Ok(FormSchema::default()),
        }
    }

    /// Whether the GenAI collaborator has everything it needs.
    pub fn genai_ready(&self) -> bool {
        self.genai.api_key.is_some() && !self.genai.model.is_empty()
    }

    /// Whether the SMTP collaborator has everything it needs.
    pub fn email_ready(&self) -> bool {
        self.smtp.username.is_some()
            && self.smtp.password.is_some()
            && self.smtp.sender_email.is_some()
            && !self.smtp.server.is_empty()
            && !self.designer_email.is_empty()
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("'{}': {}", raw, e),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DESIGNER_EMAIL", "designer@example.com")]).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_endpoint_retries, 3);
        assert_eq!(config.tracker.capacity, 10_000);
        assert_eq!(config.tracker.ttl, Duration::from_secs(86_400));
        assert_eq!(config.smtp.server, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 587);
        assert!(config.smtp.use_tls);
        assert_eq!(config.genai.model, "gemini-1.5-pro");
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert!(config.form_schema_path.is_none());
    }

    #[test]
    fn test_designer_email_required() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DESIGNER_EMAIL")));
    }

    #[test]
    fn test_max_endpoint_retries_override_and_bounds() {
        let config = load(&[
            ("DESIGNER_EMAIL", "d@example.com"),
            ("MAX_ENDPOINT_RETRIES", "5"),
        ])
        .unwrap();
        assert_eq!(config.max_endpoint_retries, 5);

        let err = load(&[
            ("DESIGNER_EMAIL", "d@example.com"),
            ("MAX_ENDPOINT_RETRIES", "11"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MAX_ENDPOINT_RETRIES", .. }));

        let err = load(&[
            ("DESIGNER_EMAIL", "d@example.com"),
            ("MAX_ENDPOINT_RETRIES", "three"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MAX_ENDPOINT_RETRIES", .. }));
    }

    #[test]
    fn test_environment_and_log_level_validation() {
        let config = load(&[
            ("DESIGNER_EMAIL", "d@example.com"),
            ("ENVIRONMENT", "Production"),
            ("LOG_LEVEL", "WARNING"),
        ])
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.log_level, "warn");

        assert!(load(&[("DESIGNER_EMAIL", "d@example.com"), ("ENVIRONMENT", "qa")]).is_err());
        assert!(load(&[("DESIGNER_EMAIL", "d@example.com"), ("LOG_LEVEL", "loud")]).is_err());
    }

    #[test]
    fn test_smtp_port_zero_rejected() {
        let err = load(&[("DESIGNER_EMAIL", "d@example.com"), ("SMTP_PORT", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SMTP_PORT", .. }));
    }

    #[test]
    fn test_readiness_flags() {
        let config = load(&[("DESIGNER_EMAIL", "d@example.com")]).unwrap();
        assert!(!config.genai_ready());
        assert!(!config.email_ready());

        let config = load(&[
            ("DESIGNER_EMAIL", "d@example.com"),
            ("GEMINI_API_KEY", "key"),
            ("SMTP_USERNAME", "studio@example.com"),
            ("SMTP_PASSWORD", "secret"),
        ])
        .unwrap();
        assert!(config.genai_ready());
        assert!(config.email_ready());
        assert_eq!(config.smtp.sender_email.as_deref(), Some("studio@example.com"));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = load(&[("DESIGNER_EMAIL", "d@example.com"), ("PORT", "  ")]).unwrap();
        assert_eq!(config.port, 8080);
    }
}
