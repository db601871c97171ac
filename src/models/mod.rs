// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod announcement;
pub mod config;
mod query;

// Re-export all public types
pub use announcement::{
    Announcement, DetailFailure, DetailParams, IdentityKey, MatchedAnnouncement, ROW_ARITY,
    RunResult, RunStats,
};
pub use config::{
    Config, LineConfig, LoggingConfig, MopsConfig, NotifyConfig, PathsConfig, PipelineConfig,
    TelegramConfig,
};
pub use query::{ListingQuery, ROC_YEAR_OFFSET};
