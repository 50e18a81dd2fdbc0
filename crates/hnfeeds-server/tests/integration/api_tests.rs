use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::integration::common::{ARTICLE_SENTENCE, rss, setup_test_app};

#[tokio::test]
async fn index_returns_hint() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"<p>Must pass an url with a feed to parse!</p>");
}

#[tokio::test]
async fn favicon_returns_empty_404() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(Request::get("/favicon.ico").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
}

#[tokio::test]
async fn feed_is_rewritten() {
    let app = setup_test_app().await;
    let uri = app.feed_path("/feed");

    let response = app
        .router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/xml; charset=utf-8"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let feed = feed_rs::parser::parse(&body[..]).unwrap();

    assert_eq!(
        feed.title.map(|t| t.content).as_deref(),
        Some("Hacker News (hn_feeds)")
    );

    let titles: Vec<_> = feed
        .entries
        .iter()
        .map(|e| e.title.as_ref().map(|t| t.content.clone()).unwrap_or_default())
        .collect();
    assert_eq!(
        titles,
        vec!["Show HN: A thing", "[pdf] Report", "Ownership explained"]
    );

    let article = &feed.entries[2];
    let content = article
        .content
        .as_ref()
        .and_then(|c| c.body.clone())
        .unwrap_or_default();
    assert!(content.contains(ARTICLE_SENTENCE));
    assert!(content.ends_with("HN summary of Ownership explained"));
    assert!(!content.contains("Home"));
}

#[tokio::test]
async fn query_string_is_forwarded() {
    let app = setup_test_app().await;
    Mock::given(method("GET"))
        .and(path("/newest"))
        .and(query_param("points", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(rss(&[("Popular", "https://news.ycombinator.com/item?id=2")])),
        )
        .expect(1)
        .mount(&app.upstream)
        .await;

    let uri = app.feed_path("/newest?points=100");
    let response = app
        .router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn feed_without_entries_returns_404() {
    let app = setup_test_app().await;
    let uri = app.feed_path("/empty");

    let response = app
        .router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
}

#[tokio::test]
async fn unknown_feed_returns_404() {
    let app = setup_test_app().await;
    let uri = app.feed_path("/missing");

    let response = app
        .router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
