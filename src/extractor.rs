use crate::error::{Result, ScraperError};
use crate::indicators::IndicatorScanner;
use crate::proxy::{TorProxy, USER_AGENT};
use crate::record::PageRecord;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const UNKNOWN_TITLE: &str = "Unknown Title";

/// Elements whose text is never page prose.
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Turns a URL into a [`PageRecord`]: fetch (via Tor when required), parse,
/// extract text and metadata, scan for indicators, collect links.
pub struct ContentExtractor {
    proxy: TorProxy,
    scanner: IndicatorScanner,
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self::with_proxy(TorProxy::new())
    }

    pub fn with_proxy(proxy: TorProxy) -> Self {
        Self {
            proxy,
            scanner: IndicatorScanner::new(),
        }
    }

    /// Extracts one page.
    ///
    /// The proxy route is taken when `use_tor` is set or the URL host ends in
    /// `.onion` -- an onion target is never fetched directly, regardless of
    /// the flag. An empty response body is an error, not a silently empty
    /// record.
    pub async fn extract_content(&self, url: &str, use_tor: bool) -> Result<PageRecord> {
        info!(url, use_tor, "extracting content");

        let html_content = if use_tor || is_onion_url(url) {
            self.proxy.get_page(url, None, None).await?
        } else {
            self.fetch_direct(url).await?
        };

        if html_content.trim().is_empty() {
            return Err(ScraperError::NoContent(url.to_string()));
        }

        let document = Html::parse_document(&html_content);

        let title = extract_title(&document);
        let text_content = extract_text(&document);
        let metadata = extract_metadata(&document);
        let links = extract_links(&document);
        let indicators = self.scanner.scan(text_content.as_deref().unwrap_or(""));

        debug!(
            url,
            links = links.len(),
            has_text = text_content.is_some(),
            "extraction complete"
        );

        Ok(PageRecord {
            url: url.to_string(),
            title,
            text_content,
            html_content,
            indicators,
            links,
            metadata,
            timestamp: Utc::now(),
        })
    }

    /// Clearnet path: a plain client, no proxy. Certificate verification
    /// stays enabled here; the relaxed trust policy is proxy-only.
    async fn fetch_direct(&self, url: &str) -> Result<String> {
        debug!(url, "fetching page directly");

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(self.proxy.config().timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(ScraperError::Fetch)?;

        let response = client.get(url).send().await.map_err(ScraperError::Fetch)?;
        let response = response.error_for_status().map_err(ScraperError::Fetch)?;
        response.text().await.map_err(ScraperError::Fetch)
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// True when the URL host ends in `.onion`.
pub fn is_onion_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|host| host.ends_with(".onion")))
        .unwrap_or(false)
}

fn extract_title(document: &Html) -> String {
    let selector = Selector::parse("title").expect("valid selector");
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

/// Readability-style main text: every text node under `<body>` outside
/// script/style containers, whitespace-normalized, one chunk per node.
/// Returns `None` for pages with no prose at all; that is not an error.
fn extract_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("body").expect("valid selector");
    let body = document.select(&selector).next()?;

    let mut chunks: Vec<String> = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let inside_skipped = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| SKIPPED_ELEMENTS.contains(&el.value().name()));
        if inside_skipped {
            continue;
        }

        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !normalized.is_empty() {
            chunks.push(normalized);
        }
    }

    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join("\n"))
    }
}

/// Best-effort document metadata from meta tags. Absent fields are omitted.
fn extract_metadata(document: &Html) -> HashMap<String, String> {
    // First selector wins per key; og:/article: variants are fallbacks.
    let sources = [
        ("author", r#"meta[name="author"]"#),
        ("author", r#"meta[property="article:author"]"#),
        ("description", r#"meta[name="description"]"#),
        ("description", r#"meta[property="og:description"]"#),
        ("date", r#"meta[property="article:published_time"]"#),
        ("date", r#"meta[name="date"]"#),
        ("sitename", r#"meta[property="og:site_name"]"#),
    ];

    let mut metadata = HashMap::new();
    for (key, selector) in sources {
        if metadata.contains_key(key) {
            continue;
        }
        let selector = Selector::parse(selector).expect("valid selector");
        if let Some(content) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            && !content.trim().is_empty()
        {
            metadata.insert(key.to_string(), content.trim().to_string());
        }
    }

    metadata
}

/// Raw hrefs in document order. Deduplication and normalization are the
/// crawler's job, not the extractor's.
fn extract_links(document: &Html) -> Vec<String> {
    let selector = Selector::parse("a[href]").expect("valid selector");
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(str::to_string)
        .collect()
}
