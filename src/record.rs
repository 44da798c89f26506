use crate::indicators::IndicatorType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Everything extracted from a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// The URL as requested, not the final URL after redirects.
    pub url: String,

    /// Document title, or "Unknown Title" when the page has none.
    pub title: String,

    /// Readable text content; `None` for pages without substantial prose.
    pub text_content: Option<String>,

    /// Raw fetched HTML, retained for audit and debugging.
    pub html_content: String,

    /// Deduplicated indicators per type. All five types are always present
    /// as keys, possibly with empty sets.
    pub indicators: HashMap<IndicatorType, HashSet<String>>,

    /// Raw href values in document order; not deduplicated or normalized.
    pub links: Vec<String>,

    /// Best-effort document metadata (author, date, description, ...).
    /// Absent fields are simply omitted.
    pub metadata: HashMap<String, String>,

    /// When extraction ran.
    pub timestamp: DateTime<Utc>,
}

impl PageRecord {
    /// True when `text_content` contains any of `keywords`,
    /// case-insensitively. Pages without text never match.
    pub fn matches_keywords(&self, keywords: &[String]) -> bool {
        let Some(text) = &self.text_content else {
            return false;
        };
        if keywords.is_empty() {
            return false;
        }

        let text = text.to_lowercase();
        keywords
            .iter()
            .any(|keyword| text.contains(&keyword.to_lowercase()))
    }
}
