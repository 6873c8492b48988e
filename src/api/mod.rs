//! HTTP API serving the agents as JSON endpoints

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use server::router;
pub use server::serve_api;
