use hnfeeds_client::DefaultFeedService;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub feeds: DefaultFeedService,
}
