// src/services/keywords.rs

//! Keyword matcher.
//!
//! Keywords come from a plain text file, one per line. Blank lines and
//! lines starting with `#` are ignored. The set is ordered longest-first so
//! that when only a few hits are shown (digest previews), the specific
//! keyword comes before the generic one it contains.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::utils::normalize_text;

/// Ordered keyword set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keywords {
    items: Vec<String>,
}

impl Keywords {
    /// Load keywords from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Parse keywords from text.
    pub fn parse(text: &str) -> Self {
        let mut seen = HashSet::new();
        let mut items: Vec<String> = text
            .lines()
            .map(normalize_text)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter(|line| seen.insert(line.clone()))
            .collect();

        // Stable: equal lengths keep file order.
        items.sort_by_key(|k| std::cmp::Reverse(k.chars().count()));
        Self { items }
    }

    /// Every keyword contained in the normalized subject, in keyword order.
    pub fn matches(&self, subject: &str) -> Vec<&str> {
        let subject = normalize_text(subject);
        self.items
            .iter()
            .filter(|k| subject.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Keywords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let text = iter
            .into_iter()
            .map(Into::into)
            .collect::<Vec<String>>()
            .join("\n");
        Self::parse(&text)
    }
}
