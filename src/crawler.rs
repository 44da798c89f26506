use crate::extractor::{ContentExtractor, is_onion_url};
use crate::record::PageRecord;
use std::collections::{HashSet, VecDeque};
use tracing::{info, warn};
use url::Url;

/// Breadth-first crawler bounded by depth and page count.
///
/// Traversal is strictly sequential: one fetch completes or fails before the
/// next is issued. The frontier queue and visited set are locals of a single
/// `crawl` call, so independent crawls may run concurrently without sharing
/// any state. Parallel fan-out within one crawl is deliberately not offered.
pub struct Crawler {
    extractor: ContentExtractor,
    max_depth: usize,
    max_pages: usize,
    keyword_filter: Vec<String>,
}

impl Crawler {
    pub fn new() -> Self {
        Self {
            extractor: ContentExtractor::new(),
            max_depth: 1,
            max_pages: 10,
            keyword_filter: Vec::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    /// Keywords gate which pages appear in the result list. They never gate
    /// traversal: links from a filtered-out page are still followed.
    pub fn with_keyword_filter(mut self, keywords: Vec<String>) -> Self {
        self.keyword_filter = keywords;
        self
    }

    /// Crawls breadth-first from `start_url` and returns the pages that were
    /// extracted successfully and passed the keyword filter, in visitation
    /// order.
    ///
    /// Whether fetches go through Tor is decided once from the seed URL and
    /// applied to the whole crawl. A failing page is logged and skipped; it
    /// still counts against the page budget and is never retried within this
    /// crawl.
    pub async fn crawl(&self, start_url: &str) -> Vec<PageRecord> {
        let use_tor = is_onion_url(start_url);

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<(String, usize)> = VecDeque::new();
        frontier.push_back((start_url.to_string(), 0));

        let mut results = Vec::new();

        info!(
            start_url,
            use_tor,
            max_depth = self.max_depth,
            max_pages = self.max_pages,
            "starting crawl"
        );

        while visited.len() < self.max_pages {
            let Some((url, depth)) = frontier.pop_front() else {
                break;
            };
            if visited.contains(&url) || depth > self.max_depth {
                continue;
            }

            // Inserted before extraction: a failing page consumes budget and
            // is not retried.
            visited.insert(url.clone());

            let page = match self.extractor.extract_content(&url, use_tor).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(%url, error = %e, "skipping page after extraction failure");
                    continue;
                }
            };

            if depth < self.max_depth {
                for link in &page.links {
                    let Ok(parsed) = Url::parse(link) else {
                        continue;
                    };
                    // Hostless links (relative hrefs are not resolved against
                    // the page URL) and fragment links are dropped. Dedup
                    // happens at pop time via the visited set.
                    if parsed.host_str().is_none_or(str::is_empty) || parsed.fragment().is_some()
                    {
                        continue;
                    }
                    frontier.push_back((link.clone(), depth + 1));
                }
            }

            if !self.keyword_filter.is_empty() && !page.matches_keywords(&self.keyword_filter) {
                continue;
            }

            results.push(page);
        }

        info!(
            visited = visited.len(),
            extracted = results.len(),
            "crawl complete"
        );
        results
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}
