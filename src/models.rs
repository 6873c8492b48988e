use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// A contiguous span of source-document text stored with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub passage_id: String,
    pub collection_key: String,
    pub document_id: String,
    pub source_url: String,
    pub sequence_index: u32,
    /// 1-based page the passage starts on
    pub page: u32,
    pub text: String,
    pub token_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl Passage {
    /// Deterministic id: identical bytes ingested into the same key overwrite in place
    #[must_use]
    pub fn make_id(document_id: &str, sequence_index: u32) -> String {
        format!("{document_id}-{sequence_index:05}")
    }
}

/// Bookkeeping for a named group of passages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub collection_key: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub passage_count: u64,
    pub document_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionInfo {
    /// `model/dimension` label used in mismatch errors
    #[must_use]
    pub fn embedding_label(&self) -> String {
        format!("{}/{}", self.embedding_model, self.dimension)
    }
}

/// All passages of one document, written to the store as one unit
#[derive(Debug, Clone)]
pub struct PassageBatch {
    pub collection_key: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub document_id: String,
    pub source_url: String,
    pub passages: Vec<Passage>,
}

/// A passage returned by similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub passage: Passage,
    /// Cosine similarity, higher is closer
    pub score: f32,
}

/// Outcome of ingesting one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub collection_key: String,
    pub document_id: String,
    pub source_url: String,
    pub page_count: usize,
    pub passage_count: usize,
}

/// Generated answer plus the passages the model was given
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub collection_key: String,
    pub text: String,
    pub sources: Vec<RetrievedPassage>,
}

impl Answer {
    /// Citation lines in the order the passages were tagged in the prompt
    #[must_use]
    pub fn citations(&self) -> Vec<String> {
        self.sources
            .iter()
            .enumerate()
            .map(|(idx, source)| {
                format!(
                    "[{}] {} (page {}, passage {}, score {:.2})",
                    idx + 1,
                    source.passage.source_url,
                    source.passage.page,
                    source.passage.sequence_index,
                    source.score
                )
            })
            .collect()
    }

    /// Get a formatted string representation
    #[must_use]
    pub fn format(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Question: {}\n\n", self.question));
        output.push_str(&format!("Answer:\n{}\n\n", self.text.trim()));
        output.push_str(&format!("Sources ({} passages):\n", self.sources.len()));
        for (citation, source) in self.citations().iter().zip(&self.sources) {
            output.push_str(&format!(
                "  {citation}\n      \"{}\"\n",
                truncate_str(&source.passage.text.replace('\n', " "), 80)
            ));
        }
        output
    }
}

/// Where a piece of generated content came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    Passage {
        collection_key: String,
        passage_id: String,
        source_url: String,
        page: u32,
        score: f32,
    },
    Web {
        url: String,
        title: String,
    },
    MarketData {
        symbol: String,
        url: String,
    },
}

impl Source {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Passage { source_url, .. } => source_url,
            Self::Web { url, .. } | Self::MarketData { url, .. } => url,
        }
    }
}

impl From<&RetrievedPassage> for Source {
    fn from(retrieved: &RetrievedPassage) -> Self {
        Self::Passage {
            collection_key: retrieved.passage.collection_key.clone(),
            passage_id: retrieved.passage.passage_id.clone(),
            source_url: retrieved.passage.source_url.clone(),
            page: retrieved.passage.page,
            score: retrieved.score,
        }
    }
}

/// Tool-backed agent output (research, stock analysis)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub query: String,
    pub text: String,
    pub sources: Vec<Source>,
    pub generated_at: DateTime<Utc>,
}

/// 1-5 scores parsed from an evaluation report; `None` when the model omitted one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationScores {
    pub faithfulness: Option<u8>,
    pub context_relevance: Option<u8>,
    pub answer_completeness: Option<u8>,
    pub source_attribution: Option<u8>,
    pub response_coherence: Option<u8>,
    pub overall: Option<u8>,
}

impl EvaluationScores {
    /// Sum of the five metrics, when all of them are present
    #[must_use]
    pub fn metric_total(&self) -> Option<u8> {
        Some(
            self.faithfulness?
                + self.context_relevance?
                + self.answer_completeness?
                + self.source_attribution?
                + self.response_coherence?,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub query: String,
    pub report: String,
    pub scores: EvaluationScores,
}

/// Result of any agent call, with sources tracked by the pipeline itself
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "agent", rename_all = "snake_case")]
pub enum GenerationResult {
    Answer(Answer),
    Research(Report),
    StockAnalysis(Report),
    Evaluation(EvaluationReport),
}

impl GenerationResult {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(answer) => &answer.text,
            Self::Research(report) | Self::StockAnalysis(report) => &report.text,
            Self::Evaluation(evaluation) => &evaluation.report,
        }
    }

    #[must_use]
    pub fn sources(&self) -> Vec<Source> {
        match self {
            Self::Answer(answer) => answer.sources.iter().map(Source::from).collect(),
            Self::Research(report) | Self::StockAnalysis(report) => report.sources.clone(),
            Self::Evaluation(_) => Vec::new(),
        }
    }
}

/// Truncate at a character boundary, appending "..." when shortened
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(seq: u32, page: u32, score: f32) -> RetrievedPassage {
        RetrievedPassage {
            passage: Passage {
                passage_id: Passage::make_id("abc123", seq),
                collection_key: "report".to_string(),
                document_id: "abc123".to_string(),
                source_url: "https://example.com/report.pdf".to_string(),
                sequence_index: seq,
                page,
                text: format!("passage number {seq}"),
                token_count: 3,
                embedding: Vec::new(),
            },
            score,
        }
    }

    #[test]
    fn test_passage_id_is_zero_padded() {
        assert_eq!(Passage::make_id("abc123", 7), "abc123-00007");
    }

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_str("short", 10), "short");
    }

    #[test]
    fn test_answer_citations_follow_source_order() {
        let answer = Answer {
            question: "q".to_string(),
            collection_key: "report".to_string(),
            text: "a".to_string(),
            sources: vec![retrieved(4, 2, 0.91), retrieved(1, 1, 0.55)],
        };

        let citations = answer.citations();
        assert_eq!(citations.len(), 2);
        assert!(citations[0].starts_with("[1] https://example.com/report.pdf (page 2, passage 4"));
        assert!(citations[1].starts_with("[2]"));
        assert!(answer.format().contains("Sources (2 passages)"));
    }

    #[test]
    fn test_generation_result_sources_always_present() {
        let answer = GenerationResult::Answer(Answer {
            question: "q".to_string(),
            collection_key: "report".to_string(),
            text: "a".to_string(),
            sources: vec![retrieved(0, 1, 0.8)],
        });
        let sources = answer.sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url(), "https://example.com/report.pdf");

        let evaluation = GenerationResult::Evaluation(EvaluationReport {
            query: "q".to_string(),
            report: "r".to_string(),
            scores: EvaluationScores::default(),
        });
        assert!(evaluation.sources().is_empty());
        assert_eq!(evaluation.text(), "r");
    }

    #[test]
    fn test_metric_total_requires_all_scores() {
        let mut scores = EvaluationScores {
            faithfulness: Some(4),
            context_relevance: Some(5),
            answer_completeness: Some(3),
            source_attribution: Some(4),
            response_coherence: None,
            overall: None,
        };
        assert_eq!(scores.metric_total(), None);
        scores.response_coherence = Some(5);
        assert_eq!(scores.metric_total(), Some(21));
    }

    #[test]
    fn test_source_serializes_with_type_tag() {
        let source = Source::Web {
            url: "https://example.com".to_string(),
            title: "Example".to_string(),
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "web");
    }
}
