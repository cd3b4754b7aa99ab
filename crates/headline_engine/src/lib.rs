//! Headline engine: IO collaborators and the single-run pipeline.
mod decode;
mod engine;
mod extract;
mod fetch;
mod notify;
mod persist;
mod types;

pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use engine::{DeliveryPolicy, Engine, RunError, RunReport};
pub use extract::{Extractor, HeadingExtractor, SelectorError, DEFAULT_HEADING_SELECTOR};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use notify::{
    compose_message, escape_markdown, Notifier, NotifyError, TelegramNotifier, TelegramSettings,
    DEFAULT_API_BASE, DEFAULT_BUTTON_TEXT, DEFAULT_MESSAGE_HEADER,
};
pub use persist::{log_order, PersistError, SeenStore, DEFAULT_SEEN_LOG};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
