use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The indicator kinds the scanner recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorType {
    IpAddress,
    EmailAddress,
    BitcoinAddress,
    Url,
    OnionUrl,
}

impl IndicatorType {
    pub const ALL: [IndicatorType; 5] = [
        IndicatorType::IpAddress,
        IndicatorType::EmailAddress,
        IndicatorType::BitcoinAddress,
        IndicatorType::Url,
        IndicatorType::OnionUrl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorType::IpAddress => "ip_address",
            IndicatorType::EmailAddress => "email_address",
            IndicatorType::BitcoinAddress => "bitcoin_address",
            IndicatorType::Url => "url",
            IndicatorType::OnionUrl => "onion_url",
        }
    }
}

/// Scans text for indicator-shaped strings.
///
/// The patterns are permissive by design and are a known false-positive
/// source: `999.999.999.999` matches the IP pattern, and no base58 checksum
/// is computed for Bitcoin addresses. They recognize shapes, they do not
/// validate values.
pub struct IndicatorScanner {
    ip: Regex,
    email: Regex,
    bitcoin: Regex,
    url: Regex,
    onion: Regex,
}

impl IndicatorScanner {
    pub fn new() -> Self {
        Self {
            ip: Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").expect("valid regex"),
            email: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .expect("valid regex"),
            // Non-capturing prefix group so the whole address is the match,
            // not just the bc1/1/3 prefix.
            bitcoin: Regex::new(r"\b(?:bc1|[13])[a-zA-HJ-NP-Z0-9]{25,39}\b")
                .expect("valid regex"),
            url: Regex::new(r"https?://[^\s<>]+").expect("valid regex"),
            onion: Regex::new(r"\b[a-z2-7]{16,56}\.onion\b").expect("valid regex"),
        }
    }

    /// Scans `text` and returns deduplicated matches per type.
    ///
    /// Every [`IndicatorType`] is always present as a key, possibly with an
    /// empty set, so callers never have to distinguish "absent" from "empty".
    pub fn scan(&self, text: &str) -> HashMap<IndicatorType, HashSet<String>> {
        let mut found: HashMap<IndicatorType, HashSet<String>> = IndicatorType::ALL
            .iter()
            .map(|kind| (*kind, HashSet::new()))
            .collect();

        for (kind, pattern) in [
            (IndicatorType::IpAddress, &self.ip),
            (IndicatorType::EmailAddress, &self.email),
            (IndicatorType::BitcoinAddress, &self.bitcoin),
            (IndicatorType::Url, &self.url),
            (IndicatorType::OnionUrl, &self.onion),
        ] {
            let matches = found.get_mut(&kind).expect("all keys inserted above");
            for m in pattern.find_iter(text) {
                matches.insert(m.as_str().to_string());
            }
        }

        found
    }
}

impl Default for IndicatorScanner {
    fn default() -> Self {
        Self::new()
    }
}
