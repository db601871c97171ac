//! Utility functions and helpers.

pub mod console;
pub mod http;
pub mod time;

/// Collapse every whitespace run (line breaks included) to one space and
/// trim both ends.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
