// src/error.rs

//! Unified error handling for the watcher.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Upstream call failed at the protocol level
    #[error("Transport error for {context}: {message}")]
    Transport { context: String, message: String },

    /// Listing row or detail parameters had an unexpected shape
    #[error("Shape error: {0}")]
    Shape(String),

    /// Ledger file exists but cannot be parsed
    #[error("Corrupt state in {path}: {message}")]
    CorruptState { path: String, message: String },

    /// A notification channel failed to deliver
    #[error("Notification via {channel} failed: {message}")]
    Notification { channel: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a transport error with context.
    pub fn transport(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a shape error.
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// Create a corrupt-state error for the given file.
    pub fn corrupt_state(path: impl AsRef<Path>, message: impl fmt::Display) -> Self {
        Self::CorruptState {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a notification error for a channel.
    pub fn notification(channel: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Notification {
            channel: channel.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the pipeline may skip the offending item and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Shape(_) | Self::Notification { .. })
    }
}
