//! Error types for venue-timeline operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimelineError {
    /// A rule book or venue rule set failed validation at load time.
    #[error("Invalid configuration for venue '{venue}': {message}")]
    Config { venue: String, message: String },

    #[error("Unknown venue: {0}")]
    UnknownVenue(String),

    /// An input event whose time window is inverted.
    #[error("Invalid event '{title}': {message}")]
    InvalidEvent { title: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TimelineError {
    pub(crate) fn config(venue: &str, message: impl Into<String>) -> Self {
        TimelineError::Config {
            venue: venue.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TimelineError>;
