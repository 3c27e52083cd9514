//! Remote feed fetching.
//!
//! [`FeedFetcher`] downloads calendar text from an untrusted URL under three
//! limits that compose:
//! - a deadline on the whole download (connect, headers and body)
//! - a byte cap, checked against `Content-Length` before reading and against
//!   the streamed body while reading
//! - a structural check that the text looks like an iCalendar document
//!
//! The body is decoded with the `charset` the server declares, unless a byte
//! order mark says otherwise. Undeclared bodies are read as UTF-8.
//!
//! On timeout the request future is dropped, which aborts the in-flight
//! request and releases its connection.

use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{FeedError, FeedResult};

/// Marker every iCalendar document must contain.
pub const CALENDAR_MARKER: &str = "BEGIN:VCALENDAR";

const ACCEPT_CALENDAR: &str = "text/calendar, text/plain;q=0.9, */*;q=0.8";

/// Limits applied to a feed download.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Deadline for the whole download.
    pub timeout: Duration,

    /// Maximum body size in bytes.
    pub max_bytes: usize,

    /// User agent string.
    pub user_agent: String,
}

impl FetchConfig {
    /// Default deadline in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

    /// Default body cap in bytes.
    pub const DEFAULT_MAX_BYTES: usize = 5_000_000;

    /// Sets the download deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the body cap.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            max_bytes: Self::DEFAULT_MAX_BYTES,
            user_agent: format!("timetable/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client for downloading iCal feeds.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    config: FetchConfig,
}

impl FeedFetcher {
    /// Creates a fetcher with the given limits.
    pub fn new(config: FetchConfig) -> FeedResult<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(FeedError::network)?;

        Ok(Self { client, config })
    }

    /// Downloads calendar text from `url`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidUrl`] before any network activity
    /// - [`FeedError::Timeout`] when the deadline passes
    /// - [`FeedError::HttpError`] on a non-success status
    /// - [`FeedError::TooLarge`] when the body exceeds the cap
    /// - [`FeedError::NotACalendar`] when the marker is missing
    /// - [`FeedError::Network`] on transport failures
    pub async fn fetch_calendar_text(&self, url: &str) -> FeedResult<String> {
        let url = validate_url(url)?;

        debug!(url = %url, timeout = ?self.config.timeout, "Fetching calendar feed");

        let text = match tokio::time::timeout(self.config.timeout, self.download(url.clone())).await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(url = %url, "Feed download timed out");
                return Err(FeedError::Timeout);
            }
        };

        if !text.contains(CALENDAR_MARKER) {
            return Err(FeedError::NotACalendar);
        }

        debug!(url = %url, bytes = text.len(), "Fetched calendar feed");
        Ok(text)
    }

    async fn download(&self, url: Url) -> FeedResult<String> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_CALENDAR)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        trace!(status = %status, "Received response");

        if !status.is_success() {
            return Err(FeedError::HttpError {
                status: status.as_u16(),
            });
        }

        let limit = self.config.max_bytes;
        if let Some(length) = response.content_length()
            && length > limit as u64
        {
            debug!(length, limit, "Advertised Content-Length exceeds cap");
            return Err(FeedError::TooLarge { limit });
        }

        let declared = declared_encoding(&response);
        let body = read_capped(response, limit).await?;
        let text = decode_body(&body, declared);

        if text.len() > limit {
            return Err(FeedError::TooLarge { limit });
        }

        Ok(text)
    }
}

/// Reads the body chunk by chunk, aborting as soon as it crosses `limit`.
async fn read_capped(mut response: Response, limit: usize) -> FeedResult<Vec<u8>> {
    let mut body = Vec::new();

    while let Some(chunk) = response.chunk().await.map_err(map_transport_error)? {
        if body.len() + chunk.len() > limit {
            debug!(read = body.len() + chunk.len(), limit, "Body exceeds cap");
            return Err(FeedError::TooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// The encoding named by the `charset` parameter of `Content-Type`.
fn declared_encoding(response: &Response) -> Option<&'static Encoding> {
    let content_type = response.headers().get(CONTENT_TYPE)?.to_str().ok()?;
    let label = charset_label(content_type)?;
    let encoding = Encoding::for_label(label.as_bytes());
    if encoding.is_none() {
        debug!(charset = %label, "Unknown charset, reading body as UTF-8");
    }
    encoding
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Decodes `body`. A byte order mark wins over `declared` and is stripped.
fn decode_body(body: &[u8], declared: Option<&'static Encoding>) -> String {
    let (text, used, had_errors) = declared.unwrap_or(UTF_8).decode(body);
    if had_errors {
        debug!(encoding = used.name(), "Replaced malformed sequences in feed body");
    }
    text.into_owned()
}

fn map_transport_error(err: reqwest::Error) -> FeedError {
    if err.is_timeout() {
        FeedError::Timeout
    } else {
        FeedError::network(err)
    }
}

/// Parses `url` and checks that it uses http or https.
pub fn validate_url(url: &str) -> FeedResult<Url> {
    let trimmed = url.trim();
    let parsed = Url::parse(trimmed).map_err(|_| FeedError::invalid_url(trimmed))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(FeedError::invalid_url(trimmed)),
    }
}
