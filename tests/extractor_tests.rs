// Integration tests for single-page extraction

use darkscout::{ContentExtractor, IndicatorType, ProxyConfig, ScraperError, TorProxy};
use std::collections::HashSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dead_proxy() -> TorProxy {
    // Nothing listens on the discard port; any proxied fetch must fail fast.
    TorProxy::with_config(ProxyConfig {
        host: "127.0.0.1".to_string(),
        port: 9,
        timeout_secs: 2,
    })
}

async fn mount_html(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_extract_content_full_record() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/listing",
        r#"<html>
            <head>
                <title>Market Listing</title>
                <meta name="author" content="vendor123">
                <meta name="description" content="weekly credential drop">
            </head>
            <body>
                <p>Contact me at a@b.com or 10.0.0.1, see http://x.com</p>
                <a href="http://other.example/next">next</a>
            </body>
        </html>"#,
    )
    .await;

    let extractor = ContentExtractor::new();
    let url = format!("{}/listing", server.uri());
    let record = extractor.extract_content(&url, false).await.unwrap();

    assert_eq!(record.url, url);
    assert_eq!(record.title, "Market Listing");
    assert!(record.text_content.as_deref().unwrap().contains("a@b.com"));
    assert!(record.html_content.contains("<title>Market Listing</title>"));
    assert_eq!(record.links, vec!["http://other.example/next"]);
    assert_eq!(
        record.metadata.get("author").map(String::as_str),
        Some("vendor123")
    );
    assert_eq!(
        record.metadata.get("description").map(String::as_str),
        Some("weekly credential drop")
    );

    assert_eq!(
        record.indicators.get(&IndicatorType::EmailAddress).unwrap(),
        &HashSet::from(["a@b.com".to_string()])
    );
    assert_eq!(
        record.indicators.get(&IndicatorType::IpAddress).unwrap(),
        &HashSet::from(["10.0.0.1".to_string()])
    );
    assert_eq!(
        record.indicators.get(&IndicatorType::Url).unwrap(),
        &HashSet::from(["http://x.com".to_string()])
    );
    // All five types are present as keys even when nothing matched.
    assert_eq!(record.indicators.len(), 5);
}

#[tokio::test]
async fn test_extract_content_empty_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let extractor = ContentExtractor::new();
    let url = format!("{}/empty", server.uri());
    let err = extractor.extract_content(&url, false).await.unwrap_err();

    assert!(matches!(err, ScraperError::NoContent(_)));
}

#[tokio::test]
async fn test_extract_content_direct_path_never_touches_proxy() {
    // The proxy points at a dead port; if the clearnet path consulted it,
    // this extraction would fail instead of succeeding.
    let server = MockServer::start().await;
    mount_html(&server, "/", "<html><body><p>clearnet</p></body></html>").await;

    let extractor = ContentExtractor::with_proxy(dead_proxy());
    let url = format!("{}/", server.uri());
    let record = extractor.extract_content(&url, false).await.unwrap();

    assert_eq!(record.text_content.as_deref(), Some("clearnet"));
}

#[tokio::test]
async fn test_extract_content_onion_host_forces_proxy_path() {
    // use_tor = false, but the host ends in .onion: the proxy path must be
    // taken, and with a dead proxy that surfaces as a wrapped proxy error.
    let extractor = ContentExtractor::with_proxy(dead_proxy());
    let err = extractor
        .extract_content("http://expyuzz4wqqyqhjn.onion/", false)
        .await
        .unwrap_err();

    assert!(matches!(err, ScraperError::Proxy(_)));
}

#[tokio::test]
async fn test_extract_content_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let extractor = ContentExtractor::new();
    let url = format!("{}/gone", server.uri());
    let err = extractor.extract_content(&url, false).await.unwrap_err();

    assert!(matches!(err, ScraperError::Fetch(_)));
}
