//! HTTP surface: one route that renders the rewritten feed for any source URL.

pub mod error;
pub mod routes;
pub mod state;
