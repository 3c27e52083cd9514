//! Error types for feed fetching.
//!
//! Every variant is recoverable at the request boundary: the display text is
//! safe to hand back to the caller, and no state has been written when one of
//! these is returned.

use std::fmt;
use thiserror::Error;

/// The category of a feed error.
///
/// Used for structured logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedErrorCode {
    InvalidUrl,
    Timeout,
    HttpError,
    TooLarge,
    NotACalendar,
    Unparseable,
    NetworkError,
}

impl FeedErrorCode {
    /// Returns a machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::Timeout => "timeout",
            Self::HttpError => "http_error",
            Self::TooLarge => "too_large",
            Self::NotACalendar => "not_a_calendar",
            Self::Unparseable => "unparseable",
            Self::NetworkError => "network_error",
        }
    }
}

impl fmt::Display for FeedErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while fetching a feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The URL does not parse or is not http/https.
    #[error("Please provide a valid http or https iCal URL.")]
    InvalidUrl { url: String },

    /// The download did not finish before the deadline.
    #[error("Request timed out while downloading the iCal file.")]
    Timeout,

    /// The remote answered with a non-success status.
    #[error("Failed to download iCal file ({status}).")]
    HttpError { status: u16 },

    /// The advertised or actual body size exceeds the cap.
    #[error("iCal file is too large.")]
    TooLarge { limit: usize },

    /// The body does not look like an iCalendar document.
    #[error("URL did not return an iCal file.")]
    NotACalendar,

    /// The body carries the calendar marker but no component in it decodes.
    #[error("iCal file could not be parsed.")]
    Unparseable { reason: String },

    /// Transport failure (DNS, connect, TLS, body read).
    #[error("Failed to download iCal file: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },
}

impl FeedError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network error from a reqwest failure.
    pub fn network(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Returns the error code.
    pub fn code(&self) -> FeedErrorCode {
        match self {
            Self::InvalidUrl { .. } => FeedErrorCode::InvalidUrl,
            Self::Timeout => FeedErrorCode::Timeout,
            Self::HttpError { .. } => FeedErrorCode::HttpError,
            Self::TooLarge { .. } => FeedErrorCode::TooLarge,
            Self::NotACalendar => FeedErrorCode::NotACalendar,
            Self::Unparseable { .. } => FeedErrorCode::Unparseable,
            Self::Network { .. } => FeedErrorCode::NetworkError,
        }
    }
}

/// A specialized Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
