use thiserror::Error;

/// Failures on the Tor SOCKS5 proxy path.
///
/// "Proxy unreachable" and "proxy reachable but the request failed" are
/// different operational problems (restart Tor vs. the target is down), so
/// they are distinct variants rather than one opaque error.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("cannot reach Tor proxy: {0}")]
    Connection(String),

    #[error("request via Tor proxy timed out: {0}")]
    Timeout(String),

    #[error("HTTP status {0} via Tor proxy")]
    Status(u16),

    #[error("proxy transport error: {0}")]
    Other(String),
}

/// Failures during page extraction.
///
/// Transport errors are wrapped, never swallowed: the source is preserved so
/// a caller can tell "Tor is down" from "the target site is down".
#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("no content retrieved from {0}")]
    NoContent(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("proxy error while fetching page")]
    Proxy(#[from] ProxyError),

    #[error("direct fetch failed")]
    Fetch(#[source] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ScraperError>;
