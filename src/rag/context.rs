//! Context assembly from retrieved passages

use crate::models::RetrievedPassage;

/// Context block plus exactly the passages it contains
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub context: String,
    /// Passages in citation order: `[1]` is `used[0]`
    pub used: Vec<RetrievedPassage>,
}

/// Assembler for creating a citation-tagged context from passages
pub struct ContextAssembler {
    max_context_length: usize,
}

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new(max_context_length: usize) -> Self {
        Self { max_context_length }
    }

    /// Tag passages `[1]..[n]` in retrieval order until the budget is spent
    ///
    /// The first passage is always included so a non-empty retrieval never
    /// yields an empty context.
    #[must_use]
    pub fn assemble(&self, results: &[RetrievedPassage]) -> AssembledContext {
        let mut context = String::new();
        let mut used = Vec::new();
        let mut total_length = 0;

        for result in results {
            let entry = Self::format_passage(used.len() + 1, result);
            let entry_length = entry.chars().count();

            if !used.is_empty() && total_length + entry_length > self.max_context_length {
                break;
            }

            context.push_str(&entry);
            total_length += entry_length;
            used.push(result.clone());
        }

        AssembledContext { context, used }
    }

    fn format_passage(citation: usize, result: &RetrievedPassage) -> String {
        format!(
            "[{}] (source: {}, page {}, score {:.2})\n{}\n\n",
            citation,
            result.passage.source_url,
            result.passage.page,
            result.score,
            result.passage.text.trim()
        )
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(12_000)
    }
}
