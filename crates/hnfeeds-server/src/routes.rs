use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{Html, IntoResponse};
use axum::routing::get;

use hnfeeds_core::feed::to_xml;

use crate::error::ApiError;
use crate::state::AppState;

pub const ATOM_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Build the router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/favicon.ico", get(no_favicon))
        .route("/{*path}", get(render_feed))
        .with_state(state)
}

pub async fn index() -> Html<&'static str> {
    Html("<p>Must pass an url with a feed to parse!</p>")
}

pub async fn no_favicon() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// `GET /<host>/<path>?<query>` renders the feed at `http://<host>/<path>?<query>`.
pub async fn render_feed(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Result<impl IntoResponse, ApiError> {
    let source_url = source_url(&uri);
    tracing::info!(url = %source_url, "Creating feed");

    let feed = state.feeds.create_feed(&source_url).await.inspect_err(|e| {
        tracing::warn!(url = %source_url, error = %e, "No feed");
    })?;
    let xml = to_xml(&feed)?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, ATOM_CONTENT_TYPE)], xml))
}

/// Rebuild the source feed URL from the request path and query.
pub fn source_url(uri: &Uri) -> String {
    let path = uri.path().trim_start_matches('/');
    match uri.query() {
        Some(query) => format!("http://{path}?{query}"),
        None => format!("http://{path}"),
    }
}
