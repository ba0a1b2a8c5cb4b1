//! HTTP shell: CloudEvents receiver, health endpoints, server lifecycle.

pub mod app;
pub mod cloudevent;
pub mod middleware;
pub mod server;
