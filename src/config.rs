//! Runtime configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `LUMENWATCH_*` environment variables, then command-line [`Overrides`].
//! Nested keys use `__`, so `LUMENWATCH_MAIL__RECIPIENT` sets `mail.recipient`.
//! The merged result is validated once.
//!
//! ```toml
//! channel = "sensors/light"
//! threshold = 1800
//! capacity = 30
//!
//! [mail]
//! transport_service = "relay"
//! endpoint = "http://localhost:8025"
//! user = "alerts@example.com"
//! secret = "app-password"
//! recipient = "ops@example.com"
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use lumenwatch_core::MonitorConfig;
use lumenwatch_notify::{DispatchError, MailSettings, MailTransport, MemoryTransport};
use lumenwatch_types::Domain;

const ENV_PREFIX: &str = "LUMENWATCH";

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Command-line values; they take precedence over file and environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub threshold: Option<f64>,
    pub capacity: Option<usize>,
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Channel path the samples come from.
    pub channel: String,
    pub threshold: f64,
    /// Rolling window capacity.
    pub capacity: usize,
    pub domain_min: f64,
    pub domain_max: f64,
    /// Object field holding the reading.
    pub field: String,
    /// Also mail when the level returns to or above the threshold.
    pub notify_recovery: bool,
    pub mail: MailConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            channel: "sensors/light".to_string(),
            threshold: 1800.0,
            capacity: 30,
            domain_min: Domain::ADC_12_BIT.min,
            domain_max: Domain::ADC_12_BIT.max,
            field: "light".to_string(),
            notify_recovery: false,
            mail: MailConfig::default(),
        }
    }
}

/// Mail transport and addressing.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// `"memory"` or `"relay"`.
    pub transport_service: String,
    pub endpoint: Option<String>,
    pub user: String,
    pub secret: String,
    /// Sender address; falls back to `user`.
    pub from: Option<String>,
    pub recipient: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport_service: "memory".to_string(),
            endpoint: None,
            user: String::new(),
            secret: String::new(),
            from: None,
            recipient: String::new(),
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("transport_service", &self.transport_service)
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .field("from", &self.from)
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl Settings {
    /// Load settings from an optional file, the process environment and
    /// command-line overrides, then validate the merged result once.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None, overrides)
    }

    /// Like [`load`](Self::load), reading environment overrides from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder = builder
            .set_override_option("threshold", overrides.threshold)?
            .set_override_option("capacity", overrides.capacity.map(|c| c as u64))?;

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() {
            return Err(ConfigError::Invalid {
                field: "threshold",
                reason: "must be a finite number".to_string(),
            });
        }
        if self.capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        let (min, max) = (self.domain_min, self.domain_max);
        if min.is_nan() || max.is_nan() || min >= max {
            return Err(ConfigError::Invalid {
                field: "domain_min",
                reason: format!("domain {}..={} is empty", min, max),
            });
        }
        Ok(())
    }

    pub fn domain(&self) -> Domain {
        Domain::new(self.domain_min, self.domain_max)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig::new(self.channel.clone(), self.threshold, self.capacity)
            .domain(self.domain())
    }

    pub fn mail_settings(&self) -> MailSettings {
        MailSettings::new(self.mail.sender(), self.mail.recipient.clone())
            .with_alert_threshold(self.threshold)
    }
}

impl MailConfig {
    pub fn sender(&self) -> String {
        self.from.clone().unwrap_or_else(|| self.user.clone())
    }

    /// Construct the transport named by `transport_service`.
    pub fn build_transport(&self) -> Result<Arc<dyn MailTransport>, DispatchError> {
        match self.transport_service.as_str() {
            "memory" => Ok(Arc::new(MemoryTransport::new())),
            #[cfg(feature = "relay")]
            "relay" => {
                let mut builder = lumenwatch_notify::RelayTransport::builder()
                    .credentials(self.user.clone(), self.secret.clone());
                if let Some(endpoint) = &self.endpoint {
                    builder = builder.endpoint(endpoint.clone());
                }
                Ok(Arc::new(builder.build()?))
            }
            other => Err(DispatchError::configuration(
                "transport_service",
                format!("unknown transport '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn toml_file() -> NamedTempFile {
        Builder::new().suffix(".toml").tempfile().unwrap()
    }

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(None, no_env(), &Overrides::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.threshold, 1800.0);
        assert_eq!(settings.capacity, 30);
        assert_eq!(settings.domain(), Domain::ADC_12_BIT);
        assert_eq!(settings.mail.transport_service, "memory");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = toml_file();
        writeln!(
            file,
            r#"
threshold = 1500
capacity = 10
notify_recovery = true

[mail]
user = "alerts@example.com"
recipient = "ops@example.com"
"#
        )
        .unwrap();

        let settings = Settings::load_with_env(Some(file.path()), no_env(), &Overrides::default()).unwrap();
        assert_eq!(settings.threshold, 1500.0);
        assert_eq!(settings.capacity, 10);
        assert!(settings.notify_recovery);
        assert_eq!(settings.channel, "sensors/light");
        assert_eq!(settings.mail.sender(), "alerts@example.com");
        assert_eq!(settings.mail.recipient, "ops@example.com");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = toml_file();
        writeln!(file, "threshold = 1500\n[mail]\nrecipient = \"a@b.c\"").unwrap();

        let env = HashMap::from([
            ("LUMENWATCH_THRESHOLD".to_string(), "900".to_string()),
            ("LUMENWATCH_MAIL__RECIPIENT".to_string(), "d@e.f".to_string()),
        ]);

        let settings = Settings::load_with_env(Some(file.path()), Some(env), &Overrides::default()).unwrap();
        assert_eq!(settings.threshold, 900.0);
        assert_eq!(settings.mail.recipient, "d@e.f");
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let env = HashMap::from([("LUMENWATCH_CAPACITY".to_string(), "0".to_string())]);
        let err = Settings::load_with_env(None, Some(env), &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "capacity", .. }));
    }

    #[test]
    fn test_overrides_win_and_are_validated_after_merge() {
        let mut file = toml_file();
        writeln!(file, "capacity = 0\nthreshold = 1500").unwrap();

        // The file alone is invalid
        let err = Settings::load_with_env(Some(file.path()), no_env(), &Overrides::default());
        assert!(matches!(err, Err(ConfigError::Invalid { field: "capacity", .. })));

        let env = HashMap::from([("LUMENWATCH_THRESHOLD".to_string(), "900".to_string())]);
        let overrides = Overrides {
            threshold: Some(1200.0),
            capacity: Some(5),
        };
        let settings = Settings::load_with_env(Some(file.path()), Some(env), &overrides).unwrap();
        assert_eq!(settings.capacity, 5);
        assert_eq!(settings.threshold, 1200.0);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let overrides = Overrides {
            threshold: None,
            capacity: Some(0),
        };
        let err = Settings::load_with_env(None, no_env(), &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "capacity", .. }));
    }

    #[test]
    fn test_rejects_empty_domain() {
        let settings = Settings {
            domain_min: 10.0,
            domain_max: 10.0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Settings::load_with_env(
            Some(Path::new("/nonexistent/lumenwatch.toml")),
            no_env(),
            &Overrides::default(),
        );
        assert!(matches!(err, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_secret_is_not_logged() {
        let mail = MailConfig {
            secret: "hunter2".to_string(),
            ..MailConfig::default()
        };
        assert!(!format!("{:?}", mail).contains("hunter2"));
    }

    #[test]
    fn test_unknown_transport() {
        let mail = MailConfig {
            transport_service: "carrier-pigeon".to_string(),
            ..MailConfig::default()
        };
        let err = mail.build_transport().unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Configuration {
                field: "transport_service",
                ..
            }
        ));
    }

    #[test]
    fn test_memory_transport() {
        let transport = MailConfig::default().build_transport().unwrap();
        assert_eq!(transport.name(), "memory");
    }
}
