//! Collection management handlers

use crate::cli::output::print_collection_list;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::FinAgents;
use crate::Result;

pub async fn handle_list_collections(app: &FinAgents) -> Result<()> {
    let collections = app.store().list_collections().await?;
    print_collection_list(&collections);
    Ok(())
}

pub async fn handle_delete_collection(app: &FinAgents, key: &str) -> Result<()> {
    if app.store().delete_collection(key).await? {
        print_success(&format!("Deleted collection '{key}'"));
    } else {
        print_warning(&format!("Collection '{key}' does not exist"));
    }
    Ok(())
}
