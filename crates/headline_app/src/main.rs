//! Checks the configured page once for new headings and reports them to Telegram.
//!
//! Meant to be started by an external scheduler (cron, systemd timer). Runs
//! against the same seen log must not overlap.

mod config;

use std::process::ExitCode;

use anyhow::anyhow;
use engine_logging::{engine_error, engine_info, engine_warn};
use headline_engine::{
    Engine, FetchSettings, HeadingExtractor, ReqwestFetcher, RunReport, SeenStore,
    TelegramNotifier,
};

use crate::config::{Config, ConfigError, LoggingSettings};

fn main() -> ExitCode {
    // A missing .env is normal in production.
    let _ = dotenvy::dotenv();

    let logging = LoggingSettings::from_env();
    engine_logging::initialize(logging.destination, logging.level, &logging.file);
    for warning in &logging.warnings {
        engine_warn!("{}", warning);
    }

    ExitCode::from(exit_status(run(Config::from_env())))
}

/// 0 for a completed run with or without new entries, 1 for any failure.
fn exit_status(outcome: anyhow::Result<RunReport>) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(err) => {
            engine_error!("{}", err);
            1
        }
    }
}

fn run(config: Result<Config, ConfigError>) -> anyhow::Result<RunReport> {
    let config = config?;
    engine_info!("Starting run with {:?}", config);

    let engine = build_engine(&config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| anyhow!("failed to start async runtime: {err}"))?;

    let report = runtime.block_on(engine.run_once())?;
    engine_info!(
        "Run finished: {} headings, {} new",
        report.candidates,
        report.delta.len()
    );
    Ok(report)
}

fn build_engine(config: &Config) -> anyhow::Result<Engine> {
    let extractor = HeadingExtractor::new(&config.heading_selector)?;
    let fetcher = ReqwestFetcher::new(FetchSettings {
        request_timeout: config.request_timeout,
        ..FetchSettings::default()
    });
    let notifier = TelegramNotifier::new(config.telegram_settings())?;

    Ok(Engine::new(
        config.source_url.clone(),
        Box::new(fetcher),
        Box::new(extractor),
        Box::new(notifier),
        SeenStore::new(config.seen_log.clone()),
    )
    .with_policy(config.delivery_policy))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::TcpListener;

    use headline_core::Entry;
    use tempfile::TempDir;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| map.get(key).cloned())
    }

    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn completed_run_exits_zero_with_or_without_entries() {
        let quiet = RunReport {
            candidates: 3,
            delta: Vec::new(),
            notified: false,
        };
        let busy = RunReport {
            candidates: 1,
            delta: vec![Entry::normalize("News A").unwrap()],
            notified: true,
        };
        assert_eq!(exit_status(Ok(quiet)), 0);
        assert_eq!(exit_status(Ok(busy)), 0);
    }

    #[test]
    fn missing_configuration_exits_one() {
        assert_eq!(exit_status(run(config(&[]))), 1);
    }

    #[test]
    fn fetch_failure_exits_one_without_touching_the_log() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("titles.txt");
        let source = format!("http://127.0.0.1:{}/news", closed_port());
        let log_path = log.to_string_lossy().into_owned();

        let outcome = run(config(&[
            ("TLS_URL", source.as_str()),
            ("BOT_TOKEN", "123:abc"),
            ("CHAT_ID", "42"),
            ("TITLES_PATH", log_path.as_str()),
            ("FETCH_TIMEOUT_SECS", "5"),
        ]));

        assert_eq!(exit_status(outcome), 1);
        assert!(!log.exists());
    }
}
