pub mod agents;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod errors;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;
pub mod store;
pub mod tools;

#[cfg(test)]
mod config_tests;

pub use app::AgentModels;
pub use app::AgentTools;
pub use app::FinAgents;
pub use config::AppConfig;
pub use errors::*;
