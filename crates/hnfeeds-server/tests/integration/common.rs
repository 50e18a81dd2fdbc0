use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hnfeeds_client::build_feed_service;
use hnfeeds_core::config::ResolverConfig;
use hnfeeds_server::routes;
use hnfeeds_server::state::AppState;

pub const ARTICLE_SENTENCE: &str =
    "The borrow checker, once understood, turns into a design tool rather than an obstacle.";

pub struct TestApp {
    pub router: Router,
    pub upstream: MockServer,
}

impl TestApp {
    /// Request path that makes the server fetch `path` from the upstream mock.
    pub fn feed_path(&self, path: &str) -> String {
        let host = self.upstream.uri().trim_start_matches("http://").to_string();
        format!("/{host}{path}")
    }
}

pub fn rss(items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link)| {
            format!(
                "<item><title>{title}</title><link>{link}</link>\
                 <description>HN summary of {title}</description>\
                 <pubDate>Fri, 01 Mar 2024 12:30:00 +0000</pubDate></item>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Hacker News</title>{items}</channel></rss>"#
    )
}

pub fn article_page() -> String {
    let paragraph = format!("<p>{}</p>", ARTICLE_SENTENCE.repeat(3));
    format!(
        "<html><head><title>Upstream article</title></head><body>\
         <nav class=\"menu\"><a href=\"/\">Home</a></nav>\
         <article class=\"post\">{paragraph}{paragraph}</article></body></html>"
    )
}

/// Start an upstream mock serving `/feed` and `/article`, and build the app
/// against it without a full-text service.
pub async fn setup_test_app() -> TestApp {
    let upstream = MockServer::start().await;
    let article = format!("{}/article", upstream.uri());

    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rss(&[
            ("Show HN: A thing", "https://news.ycombinator.com/item?id=1"),
            ("Report", "https://example.com/report.pdf"),
            ("Ownership explained", article.as_str()),
        ])))
        .mount(&upstream)
        .await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
        .mount(&upstream)
        .await;

    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rss(&[])))
        .mount(&upstream)
        .await;

    let config = ResolverConfig::default()
        .with_fetch_timeout(Duration::from_secs(2))
        .with_max_workers(3);
    let feeds = build_feed_service(&config)
        .await
        .expect("Failed to build feed service");

    TestApp {
        router: routes::router(Arc::new(AppState { feeds })),
        upstream,
    }
}
