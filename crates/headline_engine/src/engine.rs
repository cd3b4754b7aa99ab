use std::fmt;
use std::str::FromStr;

use engine_logging::{engine_info, engine_warn};
use headline_core::{compute_delta, Entry};

use crate::{
    decode_html, DecodeError, Extractor, FetchError, Fetcher, Notifier, NotifyError, PersistError,
    SeenStore,
};

/// What happens to the seen log when notification fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Record the entries as seen regardless. A failed notification is not retried.
    #[default]
    AtMostOnce,
    /// Leave the log untouched, so the next run reports the same entries again.
    AtLeastOnce,
}

impl FromStr for DeliveryPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "at-most-once" => Ok(Self::AtMostOnce),
            "at-least-once" => Ok(Self::AtLeastOnce),
            other => Err(format!("unknown delivery policy {other:?}")),
        }
    }
}

impl fmt::Display for DeliveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtMostOnce => f.write_str("at-most-once"),
            Self::AtLeastOnce => f.write_str("at-least-once"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("loading seen entries: {0}")]
    SeenLoad(#[source] PersistError),
    #[error("fetching source page: {0}")]
    Fetch(#[from] FetchError),
    #[error("parsing source page: {0}")]
    Decode(#[from] DecodeError),
    #[error("sending notification for {pending} new entries: {source}")]
    Notify {
        pending: usize,
        #[source]
        source: NotifyError,
    },
    #[error("saving seen entries: {0}")]
    SeenAppend(#[source] PersistError),
    #[error(
        "sending notification for {pending} new entries: {notify}; saving them as seen also failed: {source}"
    )]
    NotifyAndAppend {
        pending: usize,
        notify: NotifyError,
        #[source]
        source: PersistError,
    },
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Non-blank headings found on the page, duplicates included.
    pub candidates: usize,
    /// Entries reported by this run, in page order.
    pub delta: Vec<Entry>,
    pub notified: bool,
}

/// One fetch, extract, diff, notify, persist pass over the source page.
pub struct Engine {
    source_url: String,
    fetcher: Box<dyn Fetcher>,
    extractor: Box<dyn Extractor>,
    notifier: Box<dyn Notifier>,
    store: SeenStore,
    policy: DeliveryPolicy,
}

impl Engine {
    pub fn new(
        source_url: impl Into<String>,
        fetcher: Box<dyn Fetcher>,
        extractor: Box<dyn Extractor>,
        notifier: Box<dyn Notifier>,
        store: SeenStore,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            fetcher,
            extractor,
            notifier,
            store,
            policy: DeliveryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn run_once(&self) -> Result<RunReport, RunError> {
        let mut seen = self.store.load().map_err(RunError::SeenLoad)?;

        let fetched = self.fetcher.fetch(&self.source_url).await?;
        let decoded = decode_html(&fetched.bytes, fetched.metadata.content_type.as_deref())?;
        let candidates = self.extractor.extract(&decoded.html);
        let candidate_count = candidates.len();

        let delta = compute_delta(candidates, &mut seen);
        if delta.is_empty() {
            engine_info!("No new entries ({} headings checked)", candidate_count);
            return Ok(RunReport {
                candidates: candidate_count,
                delta,
                notified: false,
            });
        }

        engine_info!("New entries: {}", delta.len());
        for entry in &delta {
            engine_info!("-> {}", entry);
        }

        let pending = delta.len();
        match self.notifier.notify(&delta).await {
            Ok(()) => {
                self.store.append(&delta).map_err(RunError::SeenAppend)?;
            }
            Err(notify) => {
                match self.policy {
                    DeliveryPolicy::AtLeastOnce => {
                        engine_warn!(
                            "Notification failed ({}); not recording {} entries, they will be reported again next run",
                            notify,
                            pending
                        );
                    }
                    DeliveryPolicy::AtMostOnce => {
                        engine_warn!(
                            "Notification failed ({}); recording {} entries as seen anyway",
                            notify,
                            pending
                        );
                        if let Err(source) = self.store.append(&delta) {
                            return Err(RunError::NotifyAndAppend {
                                pending,
                                notify,
                                source,
                            });
                        }
                    }
                }
                return Err(RunError::Notify {
                    pending,
                    source: notify,
                });
            }
        }

        Ok(RunReport {
            candidates: candidate_count,
            delta,
            notified: true,
        })
    }
}
