//! Database initialization handler

use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::database::Database;
use crate::AppConfig;
use crate::Result;

/// Create the pgvector extension, tables and indexes
pub async fn handle_init_command(config: &AppConfig) -> Result<()> {
    print_info("🗄️  Initializing finagents database...");

    let database = Database::from_config(config).await?;
    database.init_schema(config).await?;

    print_success(&format!(
        "Schema ready for {} ({} dimensions)",
        config.embedding_model(),
        config.embedding_dimension()
    ));
    if config.vector_indexes_enabled() {
        print_success(&format!(
            "ivfflat cosine index created (lists = {})",
            config.vector_index_lists()
        ));
    } else {
        print_info("Vector index disabled (performance.enable_vector_indexes = false)");
    }

    println!();
    print_info("To add a document, run:");
    println!("   finagents ingest <url> --collection <key>");

    Ok(())
}
