//! Telegram Bot API notifier.
//!
//! Sends one `sendMessage` call per run listing the new entries, with an
//! inline button pointing back at the source page.

use std::fmt;
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use headline_core::Entry;
use serde::Serialize;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_MESSAGE_HEADER: &str = "🔥 *Site updates:*";
pub const DEFAULT_BUTTON_TEXT: &str = "🌐 Open site";

/// Telegram legacy Markdown.
const PARSE_MODE: &str = "Markdown";

/// Characters that legacy Markdown treats as markup.
const RESERVED: [char; 4] = ['_', '*', '`', '['];

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("telegram request failed: {0}")]
    Transport(String),
    #[error("telegram sendMessage failed: {status} - {body}")]
    Status { status: u16, body: String },
}

/// Delivers a run's new entries somewhere a human will see them.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, entries: &[Entry]) -> Result<(), NotifyError>;
}

#[derive(Clone)]
pub struct TelegramSettings {
    /// Base URL of the Bot API, without a trailing slash.
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
    /// Target of the inline button.
    pub source_url: String,
    pub header: String,
    pub button_text: String,
    pub request_timeout: Duration,
}

impl TelegramSettings {
    pub fn new(
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            source_url: source_url.into(),
            header: DEFAULT_MESSAGE_HEADER.to_string(),
            button_text: DEFAULT_BUTTON_TEXT.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("api_base", &self.api_base)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("source_url", &self.source_url)
            .field("header", &self.header)
            .field("button_text", &self.button_text)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
    reply_markup: ReplyMarkup<'a>,
}

#[derive(Debug, Serialize)]
struct ReplyMarkup<'a> {
    inline_keyboard: Vec<Vec<InlineButton<'a>>>,
}

#[derive(Debug, Serialize)]
struct InlineButton<'a> {
    text: &'a str,
    url: &'a str,
}

pub struct TelegramNotifier {
    settings: TelegramSettings,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(settings: TelegramSettings) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| NotifyError::Client(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn payload(&self, entries: &[Entry]) -> SendMessage<'_> {
        let message = compose_message(&self.settings.header, entries);
        SendMessage {
            chat_id: &self.settings.chat_id,
            text: escape_markdown(&message),
            parse_mode: PARSE_MODE,
            reply_markup: ReplyMarkup {
                inline_keyboard: vec![vec![InlineButton {
                    text: &self.settings.button_text,
                    url: &self.settings.source_url,
                }]],
            },
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, entries: &[Entry]) -> Result<(), NotifyError> {
        if entries.is_empty() {
            return Ok(());
        }

        let payload = self.payload(entries);
        // The endpoint embeds the bot token; keep it out of error text.
        let response = self
            .client
            .post(self.settings.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            engine_warn!("Telegram sendMessage failed: {} - {}", status, body);
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        engine_debug!(
            "Telegram notification sent to chat {} ({} entries)",
            self.settings.chat_id,
            entries.len()
        );
        Ok(())
    }
}

/// Header, blank line, then one bullet block per entry in the given order.
pub fn compose_message(header: &str, entries: &[Entry]) -> String {
    let mut message = String::with_capacity(header.len() + entries.len() * 32);
    message.push_str(header);
    message.push_str("\n\n");
    for entry in entries {
        message.push_str("• ");
        message.push_str(entry.as_str());
        message.push_str("\n\n");
    }
    message
}

/// Prefixes every legacy-Markdown reserved character with a backslash.
///
/// Applied to the whole composed message, so markup in the header is escaped too.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
