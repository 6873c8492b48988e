//! Text preprocessing utilities for embedding generation
//!
//! Normalizes whitespace and strips control characters before text is sent
//! to the embedding provider. Stored passages and queries go through the
//! same path, so identical text always embeds identically.

use tracing::trace;

use crate::errors::FinAgentsError;
use crate::errors::Result;

/// Preprocess text for embedding generation
///
/// This function handles:
/// - Normalizing whitespace and newlines
/// - Replacing control characters
/// - Rejecting empty or whitespace-only input
pub fn preprocess_text_for_embedding(text: &str) -> Result<String> {
    if text.is_empty() {
        return Err(FinAgentsError::EmbeddingError(
            "Empty text provided".to_string(),
        ));
    }

    let sanitized = sanitize_text(&normalize_whitespace(text));

    if sanitized.is_empty() {
        return Err(FinAgentsError::EmbeddingError(
            "Text contains only whitespace after preprocessing".to_string(),
        ));
    }

    trace!(
        "Preprocessed text: {} -> {} chars",
        text.len(),
        sanitized.len()
    );
    Ok(sanitized)
}

/// Normalize whitespace and newlines
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Sanitize text by replacing control characters
fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        // Clean up multiple spaces but preserve single spaces
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}
