use crate::error::ProxyError;
use reqwest::Client;
use reqwest::header::HeaderMap;
use std::env;
use std::time::Duration;
use tracing::{debug, error};

/// Fixed desktop browser User-Agent. Onion services commonly block the
/// default user agents of HTTP libraries; a realistic browser string reduces
/// that friction.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; rv:102.0) Gecko/20100101 Firefox/102.0";

const DEFAULT_PROXY_HOST: &str = "127.0.0.1";
const DEFAULT_PROXY_PORT: u16 = 9050;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connectivity-check endpoint; the body carries a known success marker when
/// the request actually left through a Tor circuit.
const TOR_CHECK_URL: &str = "https://check.torproject.org/";
const TOR_CHECK_MARKER: &str = "Congratulations";

/// Tor SOCKS5 listener settings, fixed at construction.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PROXY_HOST.to_string(),
            port: DEFAULT_PROXY_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProxyConfig {
    /// Reads `TOR_PROXY_HOST`, `TOR_PROXY_PORT` and `TOR_PROXY_TIMEOUT`,
    /// falling back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("TOR_PROXY_HOST").unwrap_or(defaults.host),
            port: env::var("TOR_PROXY_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            timeout_secs: env::var("TOR_PROXY_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    /// The socks5h:// scheme makes reqwest resolve hostnames through the
    /// proxy; .onion names do not exist in public DNS.
    pub fn proxy_url(&self) -> String {
        format!("socks5h://{}:{}", self.host, self.port)
    }
}

/// POST body; form-encoded and JSON are mutually exclusive by construction.
#[derive(Debug, Clone)]
pub enum PostBody {
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

/// HTTP GET/POST over a local Tor SOCKS5 proxy.
///
/// No connection state is held across calls: every request builds a fresh
/// scoped client and drops it on return, so error paths cannot leak pooled
/// connections. High page counts pay repeated handshake cost; acceptable for
/// an occasional-use intelligence tool, wrong for a production crawler.
pub struct TorProxy {
    config: ProxyConfig,
    check_url: String,
}

impl TorProxy {
    pub fn new() -> Self {
        Self::with_config(ProxyConfig::default())
    }

    pub fn with_config(config: ProxyConfig) -> Self {
        Self {
            config,
            check_url: TOR_CHECK_URL.to_string(),
        }
    }

    /// Overrides the connectivity-check endpoint, e.g. for a self-hosted
    /// mirror of the Tor check service.
    pub fn with_check_url(mut self, url: impl Into<String>) -> Self {
        self.check_url = url.into();
        self
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// SECURITY TRADE-OFF: certificate verification is disabled on the
    /// proxied client. Many onion services and their self-signed clearnet
    /// mirrors fail standard verification and would be unreachable
    /// otherwise. The cost is that a man-in-the-middle between the Tor exit
    /// and the target cannot be detected; nothing fetched through this
    /// client carries TLS authenticity.
    fn build_client(&self) -> Result<Client, ProxyError> {
        let proxy = reqwest::Proxy::all(self.config.proxy_url())
            .map_err(|e| ProxyError::Connection(format!("invalid proxy URL: {e}")))?;

        Client::builder()
            .proxy(proxy)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| ProxyError::Other(format!("failed to build proxied client: {e}")))
    }

    /// Probes whether the proxy is usable for anonymized traffic.
    ///
    /// `Ok(true)`: reachable and properly circuited. `Ok(false)`: the proxy
    /// answered but the success marker was absent, so traffic is not going
    /// through Tor. `Err`: the proxy endpoint itself is unreachable. Callers
    /// must treat the last two differently.
    pub async fn check_connection(&self) -> Result<bool, ProxyError> {
        debug!(check_url = %self.check_url, "checking Tor connectivity");
        let client = self.build_client()?;

        let body = async {
            let response = client.get(&self.check_url).send().await?;
            response.text().await
        }
        .await
        .map_err(|e| {
            error!(error = %e, "failed to reach Tor proxy");
            ProxyError::Connection(e.to_string())
        })?;

        Ok(body.contains(TOR_CHECK_MARKER) && body.contains("Tor"))
    }

    /// Fetches `url` through the proxy and returns the response body.
    ///
    /// One attempt, one error: timeouts surface as [`ProxyError::Timeout`],
    /// connection failures as [`ProxyError::Connection`], and any
    /// non-success status after redirects as [`ProxyError::Status`]. Callers
    /// retry externally if they want retries.
    pub async fn get_page(
        &self,
        url: &str,
        headers: Option<HeaderMap>,
        params: Option<&[(String, String)]>,
    ) -> Result<String, ProxyError> {
        debug!(url, "fetching page via Tor proxy");
        let client = self.build_client()?;

        let mut request = client.get(url);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        if let Some(params) = params {
            request = request.query(params);
        }

        let response = request.send().await.map_err(classify_transport_error)?;
        let response = response.error_for_status().map_err(|e| {
            ProxyError::Status(e.status().map(|s| s.as_u16()).unwrap_or(0))
        })?;

        response.text().await.map_err(classify_transport_error)
    }

    /// POSTs to `url` through the proxy; same error contract as
    /// [`TorProxy::get_page`].
    pub async fn post_page(
        &self,
        url: &str,
        body: Option<PostBody>,
        headers: Option<HeaderMap>,
    ) -> Result<String, ProxyError> {
        debug!(url, "posting via Tor proxy");
        let client = self.build_client()?;

        let mut request = client.post(url);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        match body {
            Some(PostBody::Form(fields)) => request = request.form(&fields),
            Some(PostBody::Json(value)) => request = request.json(&value),
            None => {}
        }

        let response = request.send().await.map_err(classify_transport_error)?;
        let response = response.error_for_status().map_err(|e| {
            ProxyError::Status(e.status().map(|s| s.as_u16()).unwrap_or(0))
        })?;

        response.text().await.map_err(classify_transport_error)
    }
}

impl Default for TorProxy {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_transport_error(err: reqwest::Error) -> ProxyError {
    if err.is_timeout() {
        ProxyError::Timeout(err.to_string())
    } else if err.is_connect() {
        ProxyError::Connection(err.to_string())
    } else {
        ProxyError::Other(err.to_string())
    }
}
