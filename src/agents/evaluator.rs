//! RAG answer evaluation

use std::sync::Arc;

use regex::Regex;
use tracing::info;

use super::AgentSettings;
use crate::errors::FinAgentsError;
use crate::errors::Result;
use crate::llm::generate_with_deadline;
use crate::llm::AgentPrompts;
use crate::llm::GenerationRequest;
use crate::llm::LanguageModel;
use crate::models::Answer;
use crate::models::EvaluationReport;
use crate::models::EvaluationScores;

pub struct RagEvaluator {
    model: Arc<dyn LanguageModel>,
    settings: AgentSettings,
}

impl RagEvaluator {
    pub fn new(model: Arc<dyn LanguageModel>, settings: AgentSettings) -> Self {
        Self { model, settings }
    }

    /// Score a response against the query and the context it was given
    ///
    /// An empty context is allowed and is reported to the model as such.
    pub async fn evaluate(
        &self,
        query: &str,
        response: &str,
        context: &[String],
    ) -> Result<EvaluationReport> {
        let query = query.trim();
        let response = response.trim();
        if query.is_empty() || response.is_empty() {
            return Err(FinAgentsError::ValidationError(
                "Evaluation needs a non-empty query and response".to_string(),
            ));
        }

        let context_text = if context.is_empty() {
            "(no context provided)".to_string()
        } else {
            context
                .iter()
                .enumerate()
                .map(|(idx, passage)| format!("[{}] {}", idx + 1, passage.trim()))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let system = format!(
            "{}\n\n{}",
            AgentPrompts::evaluator_description(),
            AgentPrompts::evaluator_instructions()
        );
        let prompt = AgentPrompts::evaluation().render_with(&[
            ("query", query),
            ("context", &context_text),
            ("response", response),
        ]);
        let request = self.settings.apply(
            GenerationRequest::new(system, prompt)
                .with_expected_output(AgentPrompts::evaluator_expected_output()),
        );

        let report =
            generate_with_deadline(self.model.as_ref(), &request, self.settings.timeout).await?;
        let scores = parse_scores(&report);
        info!(
            "Evaluation finished: overall {}",
            scores
                .overall
                .map_or_else(|| "n/a".to_string(), |s| format!("{s}/25"))
        );

        Ok(EvaluationReport {
            query: query.to_string(),
            report,
            scores,
        })
    }

    /// Evaluate a RAG answer against the passages it cited
    pub async fn evaluate_answer(&self, answer: &Answer) -> Result<EvaluationReport> {
        let context: Vec<String> = answer
            .sources
            .iter()
            .map(|source| source.passage.text.clone())
            .collect();
        self.evaluate(&answer.question, &answer.text, &context).await
    }
}

/// `n / d` with optional spaces around the slash
const SCORE_PATTERN: &str = r"([0-9]+)\s*/\s*([0-9]+)";

/// Pull `Metric: n/5` and `Overall Score: n/25` values out of a report
///
/// The first in-range value for each metric wins; anything absent or out of
/// range is `None`.
#[must_use]
pub fn parse_scores(report: &str) -> EvaluationScores {
    let mut scores = EvaluationScores::default();
    let Ok(pattern) = Regex::new(SCORE_PATTERN) else {
        return scores;
    };

    for line in report.lines() {
        let line = line.to_lowercase();
        let slots = [
            ("faithfulness", &mut scores.faithfulness),
            ("context relevance", &mut scores.context_relevance),
            ("answer completeness", &mut scores.answer_completeness),
            ("source attribution", &mut scores.source_attribution),
            ("response coherence", &mut scores.response_coherence),
        ];
        for (label, slot) in slots {
            if slot.is_none() {
                *slot = score_after(&pattern, &line, label, 5);
            }
        }
        if scores.overall.is_none() {
            scores.overall = score_after(&pattern, &line, "overall", 25);
        }
    }

    scores
}

/// `n` from the first `n/d` after `label` on the line, if `d` is `denominator`
fn score_after(pattern: &Regex, line: &str, label: &str, denominator: u8) -> Option<u8> {
    let start = line.find(label)? + label.len();
    let captures = pattern.captures(&line[start..])?;

    // "4/50" is not a score out of 5
    let denom: u32 = captures.get(2)?.as_str().parse().ok()?;
    if denom != u32::from(denominator) {
        return None;
    }

    let value: u8 = captures.get(1)?.as_str().parse().ok()?;
    (1..=denominator).contains(&value).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::RecordingModel;
    use crate::models::Passage;
    use crate::models::RetrievedPassage;

    const REPORT: &str = "# RAG Evaluation Report

## Metric Scores

### Faithfulness: 4/5
- Justification: grounded

### Context Relevance: 5/5

### **Answer Completeness**: 3 / 5

### Source Attribution: 7/5

### Response Coherence: {score}/5

## Overall Score: 19/25
";

    #[test]
    fn test_parse_scores() {
        let scores = parse_scores(REPORT);
        assert_eq!(scores.faithfulness, Some(4));
        assert_eq!(scores.context_relevance, Some(5));
        assert_eq!(scores.answer_completeness, Some(3));
        assert_eq!(scores.source_attribution, None);
        assert_eq!(scores.response_coherence, None);
        assert_eq!(scores.overall, Some(19));
    }

    #[test]
    fn test_score_after_rejects_longer_denominator() {
        let pattern = Regex::new(SCORE_PATTERN).unwrap();
        assert_eq!(score_after(&pattern, "faithfulness: 4/50", "faithfulness", 5), None);
        assert_eq!(score_after(&pattern, "faithfulness: 4 / 50", "faithfulness", 5), None);
        assert_eq!(score_after(&pattern, "overall score: 19/25", "overall", 25), Some(19));
        assert_eq!(score_after(&pattern, "no label here 4/5", "faithfulness", 5), None);
    }

    #[test]
    fn test_parse_scores_with_non_ascii_separators() {
        let scores = parse_scores(
            "Faithfulness:\u{a0}4/5\n\
             Context Relevance \u{2014}5/5\n\
             ★ Answer Completeness ★ 2\u{a0}/\u{a0}5\n\
             Source Attribution: ★★★\n\
             Overall Score\u{a0}: 17 / 25",
        );
        assert_eq!(scores.faithfulness, Some(4));
        assert_eq!(scores.context_relevance, Some(5));
        assert_eq!(scores.answer_completeness, Some(2));
        assert_eq!(scores.source_attribution, None);
        assert_eq!(scores.overall, Some(17));
    }

    #[tokio::test]
    async fn test_evaluate_answer_uses_cited_passages() {
        let model = Arc::new(RecordingModel::new(REPORT));
        let evaluator = RagEvaluator::new(model.clone(), AgentSettings::default());
        let answer = Answer {
            question: "Did revenue increase?".to_string(),
            collection_key: "q3".to_string(),
            text: "Yes, quarterly revenue rose 12% [1].".to_string(),
            sources: vec![RetrievedPassage {
                passage: Passage {
                    passage_id: "doc-00001".to_string(),
                    collection_key: "q3".to_string(),
                    document_id: "doc".to_string(),
                    source_url: "https://example.com/q3.pdf".to_string(),
                    sequence_index: 1,
                    page: 2,
                    text: "Quarterly revenue rose 12% year over year.".to_string(),
                    token_count: 7,
                    embedding: Vec::new(),
                },
                score: 0.9,
            }],
        };

        let evaluation = evaluator.evaluate_answer(&answer).await.unwrap();
        assert_eq!(evaluation.scores.overall, Some(19));
        assert_eq!(evaluation.query, "Did revenue increase?");

        let request = model.last_request();
        assert!(request
            .prompt
            .contains("[1] Quarterly revenue rose 12% year over year."));
        assert!(request.system.contains("Faithfulness (1-5)"));
    }

    #[tokio::test]
    async fn test_empty_context_allowed_empty_response_rejected() {
        let model = Arc::new(RecordingModel::new("Overall Score: 10/25"));
        let evaluator = RagEvaluator::new(model.clone(), AgentSettings::default());

        let evaluation = evaluator.evaluate("q", "r", &[]).await.unwrap();
        assert_eq!(evaluation.scores.overall, Some(10));
        assert!(model.last_request().prompt.contains("(no context provided)"));

        let err = evaluator.evaluate("q", "  ", &[]).await.unwrap_err();
        assert!(matches!(err, FinAgentsError::ValidationError(_)));
    }
}
