use axum::{routing::post, Router};

pub mod events;
pub mod system;

/// Router for the CloudEvents receiver mounted at `path`.
pub fn router(path: &str) -> Router {
    Router::new().route(path, post(events::receive))
}
