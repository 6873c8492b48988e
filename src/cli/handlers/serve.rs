//! API server handlers

use std::sync::Arc;

use crate::FinAgents;
use crate::Result;

pub async fn handle_serve_api(
    app: FinAgents,
    host: Option<String>,
    port: Option<u16>,
    cors: bool,
) -> Result<()> {
    use crate::api::serve_api;

    // CLI arguments take priority over config
    let host = host.unwrap_or_else(|| app.config().api.host.clone());
    let port = port.unwrap_or(app.config().api.port);
    let cors = cors || app.config().api.enable_cors;

    println!("🚀 Starting finagents API Server");
    println!("=================================\n");
    println!("📍 Host: {host}");
    println!("🔌 Port: {port}");
    println!("🌐 CORS: {}", if cors { "Enabled" } else { "Disabled" });
    println!();

    serve_api(Arc::new(app), &host, port, cors).await
}
