//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - init: Database schema and index creation
//! - documents: Ingestion and document question answering
//! - agents: Research, stock analysis and evaluation
//! - collections: Listing and deleting collections
//! - info: Configuration display
//! - serve: API server

pub mod agents;
pub mod collections;
pub mod documents;
pub mod info;
pub mod init;
pub mod serve;

// Re-export all public handlers
pub use agents::*;
pub use collections::*;
pub use documents::*;
pub use info::*;
pub use init::*;
pub use serve::*;
