pub mod crawler;
pub mod error;
pub mod extractor;
pub mod indicators;
pub mod proxy;
pub mod record;

pub use crawler::Crawler;
pub use error::{ProxyError, Result, ScraperError};
pub use extractor::ContentExtractor;
pub use indicators::{IndicatorScanner, IndicatorType};
pub use proxy::{PostBody, ProxyConfig, TorProxy};
pub use record::PageRecord;
