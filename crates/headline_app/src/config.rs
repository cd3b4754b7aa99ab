//! Process configuration, read once from the environment at startup.
//!
//! Every required key is checked before anything else runs, and all problems
//! are reported together.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use engine_logging::{LogDestination, DEFAULT_LOG_FILE};
use headline_engine::{
    DeliveryPolicy, TelegramSettings, DEFAULT_API_BASE, DEFAULT_BUTTON_TEXT,
    DEFAULT_HEADING_SELECTOR, DEFAULT_MESSAGE_HEADER, DEFAULT_SEEN_LOG,
};
use log::LevelFilter;
use url::Url;

pub const SOURCE_URL: &str = "TLS_URL";
pub const BOT_TOKEN: &str = "BOT_TOKEN";
pub const CHAT_ID: &str = "CHAT_ID";

const REQUIRED: [&str; 3] = [SOURCE_URL, BOT_TOKEN, CHAT_ID];

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub missing: Vec<&'static str>,
    pub invalid: Vec<String>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!(
                "missing required environment variables: {}",
                self.missing.join(", ")
            ));
        }
        if !self.invalid.is_empty() {
            parts.push(format!("invalid values: {}", self.invalid.join("; ")));
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub source_url: String,
    pub bot_token: String,
    pub chat_id: String,
    pub seen_log: PathBuf,
    pub heading_selector: String,
    pub api_base: String,
    pub message_header: String,
    pub button_text: String,
    pub delivery_policy: DeliveryPolicy,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let missing: Vec<&'static str> = REQUIRED
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .collect();
        let mut invalid = Vec::new();

        let source_url = get(SOURCE_URL).unwrap_or_default();
        if !source_url.is_empty() {
            check_http_url(SOURCE_URL, &source_url, &mut invalid);
        }
        let api_base = get("TELEGRAM_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        check_http_url("TELEGRAM_API_BASE", &api_base, &mut invalid);

        let delivery_policy = match get("DELIVERY_POLICY") {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                invalid.push(format!("DELIVERY_POLICY: {err}"));
                DeliveryPolicy::default()
            }),
            None => DeliveryPolicy::default(),
        };

        let request_timeout = match get("FETCH_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    invalid.push(format!(
                        "FETCH_TIMEOUT_SECS: expected a positive number of seconds, got {raw:?}"
                    ));
                    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        if !missing.is_empty() || !invalid.is_empty() {
            return Err(ConfigError { missing, invalid });
        }

        Ok(Self {
            source_url,
            bot_token: get(BOT_TOKEN).unwrap_or_default(),
            chat_id: get(CHAT_ID).unwrap_or_default(),
            seen_log: get("TITLES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SEEN_LOG)),
            heading_selector: get("HEADING_SELECTOR")
                .unwrap_or_else(|| DEFAULT_HEADING_SELECTOR.to_string()),
            api_base,
            message_header: get("MESSAGE_HEADER")
                .unwrap_or_else(|| DEFAULT_MESSAGE_HEADER.to_string()),
            button_text: get("BUTTON_TEXT").unwrap_or_else(|| DEFAULT_BUTTON_TEXT.to_string()),
            delivery_policy,
            request_timeout,
        })
    }

    pub fn telegram_settings(&self) -> TelegramSettings {
        let mut settings = TelegramSettings::new(
            self.bot_token.clone(),
            self.chat_id.clone(),
            self.source_url.clone(),
        );
        settings.api_base = self.api_base.clone();
        settings.header = self.message_header.clone();
        settings.button_text = self.button_text.clone();
        settings.request_timeout = self.request_timeout;
        settings
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("source_url", &self.source_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("seen_log", &self.seen_log)
            .field("heading_selector", &self.heading_selector)
            .field("api_base", &self.api_base)
            .field("delivery_policy", &self.delivery_policy)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

fn check_http_url(key: &str, value: &str, invalid: &mut Vec<String>) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => invalid.push(format!("{key}: unsupported scheme {:?}", url.scheme())),
        Err(err) => invalid.push(format!("{key}: {err}")),
    }
}

/// Logger settings. Bad values fall back to defaults and are reported once
/// the logger is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub destination: LogDestination,
    pub level: LevelFilter,
    pub file: PathBuf,
    pub warnings: Vec<String>,
}

impl LoggingSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        let destination = match lookup("LOG_DESTINATION") {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                warnings.push(format!("LOG_DESTINATION: {err}; using terminal"));
                LogDestination::default()
            }),
            None => LogDestination::default(),
        };
        let level = match lookup("LOG_LEVEL") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warnings.push(format!("LOG_LEVEL: unknown level {raw:?}; using info"));
                LevelFilter::Info
            }),
            None => LevelFilter::Info,
        };
        let file = lookup("LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        Self {
            destination,
            level,
            file,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            (SOURCE_URL, "https://example.com/news"),
            (BOT_TOKEN, "123:abc"),
            (CHAT_ID, "-100500"),
        ]
    }

    #[test]
    fn all_missing_keys_are_reported_together() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.missing, vec![SOURCE_URL, BOT_TOKEN, CHAT_ID]);
        assert_eq!(
            err.to_string(),
            "missing required environment variables: TLS_URL, BOT_TOKEN, CHAT_ID"
        );
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let err =
            Config::from_lookup(lookup(&[(SOURCE_URL, "https://example.com"), (BOT_TOKEN, "  ")]))
                .unwrap_err();
        assert_eq!(err.missing, vec![BOT_TOKEN, CHAT_ID]);
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let config = Config::from_lookup(lookup(&required())).unwrap();
        assert_eq!(config.source_url, "https://example.com/news");
        assert_eq!(config.seen_log, PathBuf::from("titles.txt"));
        assert_eq!(config.heading_selector, "h3");
        assert_eq!(config.api_base, "https://api.telegram.org");
        assert_eq!(config.delivery_policy, DeliveryPolicy::AtMostOnce);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn optional_keys_override_defaults() {
        let mut pairs = required();
        pairs.extend([
            ("TITLES_PATH", "/var/lib/watch/titles.txt"),
            ("HEADING_SELECTOR", "h2.title"),
            ("DELIVERY_POLICY", "at-least-once"),
            ("FETCH_TIMEOUT_SECS", "5"),
            ("TELEGRAM_API_BASE", "http://localhost:8081"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.seen_log, PathBuf::from("/var/lib/watch/titles.txt"));
        assert_eq!(config.heading_selector, "h2.title");
        assert_eq!(config.delivery_policy, DeliveryPolicy::AtLeastOnce);
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        let telegram = config.telegram_settings();
        assert_eq!(telegram.api_base, "http://localhost:8081");
        assert_eq!(telegram.source_url, "https://example.com/news");
    }

    #[test]
    fn invalid_values_are_aggregated_with_missing_keys() {
        let err = Config::from_lookup(lookup(&[
            (SOURCE_URL, "ftp://example.com"),
            ("DELIVERY_POLICY", "exactly-once"),
            ("FETCH_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert_eq!(err.missing, vec![BOT_TOKEN, CHAT_ID]);
        assert_eq!(err.invalid.len(), 3);
        assert!(err.invalid[0].starts_with("TLS_URL"));
    }

    #[test]
    fn debug_output_hides_token() {
        let config = Config::from_lookup(lookup(&required())).unwrap();
        assert!(!format!("{config:?}").contains("123:abc"));
    }

    #[test]
    fn logging_falls_back_on_bad_values() {
        let settings = LoggingSettings::from_lookup(lookup(&[
            ("LOG_DESTINATION", "syslog"),
            ("LOG_LEVEL", "loud"),
        ]));
        assert_eq!(settings.destination, LogDestination::Terminal);
        assert_eq!(settings.level, LevelFilter::Info);
        assert_eq!(settings.warnings.len(), 2);
    }

    #[test]
    fn logging_reads_level_and_file() {
        let settings = LoggingSettings::from_lookup(lookup(&[
            ("LOG_DESTINATION", "both"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FILE", "/tmp/watch.log"),
        ]));
        assert_eq!(settings.destination, LogDestination::Both);
        assert_eq!(settings.level, LevelFilter::Debug);
        assert_eq!(settings.file, PathBuf::from("/tmp/watch.log"));
        assert!(settings.warnings.is_empty());
    }
}
