//! Configuration loader and validator for the index-notification batch.
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {0}")]
    Missing(String),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Environment variables required for any useful work. No defaults.
const REQUIRED_KEYS: [&str; 5] = [
    "INDEXPING_API_KEY",
    "BLOG_ID",
    "MAIL_FROM",
    "MAIL_PASSWORD",
    "MAIL_TO",
];

const DEFAULT_BATCH_SIZE: u32 = 5;
const DEFAULT_NOTIFY_DELAY_SECONDS: u64 = 10;

/// Runtime configuration, validated once at startup and handed to the
/// components that need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Credential for the content and indexing APIs.
    pub api_key: String,
    /// Blog whose post URLs are mirrored.
    pub blog_id: String,
    /// Sender address for the summary report (also the SMTP login).
    pub mail_from: String,
    /// SMTP password for `mail_from`.
    pub mail_password: String,
    /// Recipient address for the summary report.
    pub mail_to: String,
    /// Maximum number of URLs notified per run.
    pub batch_size: u32,
    /// Unconditional pause after each notification attempt.
    pub notify_delay: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Every missing or
    /// empty required key is collected so the error names all offenders at
    /// once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = Vec::with_capacity(REQUIRED_KEYS.len());
        let mut missing = Vec::new();
        for key in REQUIRED_KEYS {
            match lookup(key).filter(|v| !v.trim().is_empty()) {
                Some(value) => values.push(value),
                None => missing.push(key),
            }
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing.join(", ")));
        }
        let mut values = values.into_iter();

        let batch_size = match lookup("BATCH_SIZE") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "BATCH_SIZE",
                reason: format!("expected a positive integer, got {raw:?}"),
            })?,
            None => DEFAULT_BATCH_SIZE,
        };
        let delay_seconds = match lookup("NOTIFY_DELAY_SECONDS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "NOTIFY_DELAY_SECONDS",
                reason: format!("expected a number of seconds, got {raw:?}"),
            })?,
            None => DEFAULT_NOTIFY_DELAY_SECONDS,
        };

        Ok(Config {
            api_key: values.next().unwrap_or_default(),
            blog_id: values.next().unwrap_or_default(),
            mail_from: values.next().unwrap_or_default(),
            mail_password: values.next().unwrap_or_default(),
            mail_to: values.next().unwrap_or_default(),
            batch_size,
            notify_delay: Duration::from_secs(delay_seconds),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("INDEXPING_API_KEY", "key-1"),
            ("BLOG_ID", "blog-9"),
            ("MAIL_FROM", "robot@example.com"),
            ("MAIL_PASSWORD", "hunter2"),
            ("MAIL_TO", "ops@example.com"),
        ])
    }

    fn lookup_in<'a>(env: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| env.get(key).map(|v| v.to_string())
    }

    #[test]
    fn loads_all_required_keys() {
        let env = full_env();
        let cfg = Config::from_lookup(lookup_in(&env)).unwrap();
        assert_eq!(cfg.api_key, "key-1");
        assert_eq!(cfg.blog_id, "blog-9");
        assert_eq!(cfg.mail_from, "robot@example.com");
        assert_eq!(cfg.mail_password, "hunter2");
        assert_eq!(cfg.mail_to, "ops@example.com");
        assert_eq!(cfg.batch_size, 5);
        assert_eq!(cfg.notify_delay, Duration::from_secs(10));
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let mut env = full_env();
        env.remove("MAIL_PASSWORD");
        let err = Config::from_lookup(lookup_in(&env)).unwrap_err();
        match err {
            ConfigError::Missing(keys) => assert_eq!(keys, "MAIL_PASSWORD"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut env = full_env();
        env.insert("BLOG_ID", "   ");
        let err = Config::from_lookup(lookup_in(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(keys) if keys.contains("BLOG_ID")));
    }

    #[test]
    fn all_missing_keys_are_collected() {
        let mut env = full_env();
        env.remove("BLOG_ID");
        env.remove("MAIL_TO");
        let err = Config::from_lookup(lookup_in(&env)).unwrap_err();
        match err {
            ConfigError::Missing(keys) => {
                assert!(keys.contains("BLOG_ID"));
                assert!(keys.contains("MAIL_TO"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn batch_tuning_overrides() {
        let mut env = full_env();
        env.insert("BATCH_SIZE", "12");
        env.insert("NOTIFY_DELAY_SECONDS", "0");
        let cfg = Config::from_lookup(lookup_in(&env)).unwrap();
        assert_eq!(cfg.batch_size, 12);
        assert_eq!(cfg.notify_delay, Duration::ZERO);
    }

    #[test]
    fn invalid_batch_size_is_rejected() {
        let mut env = full_env();
        env.insert("BATCH_SIZE", "many");
        let err = Config::from_lookup(lookup_in(&env)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "BATCH_SIZE",
                ..
            }
        ));
    }
}
