//! Web research agent

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::AgentSettings;
use crate::errors::FinAgentsError;
use crate::errors::Result;
use crate::llm::generate_with_deadline;
use crate::llm::prompts::datetime_instruction;
use crate::llm::AgentPrompts;
use crate::llm::GenerationRequest;
use crate::llm::LanguageModel;
use crate::models::Report;
use crate::models::Source;
use crate::tools::ArticleScraper;
use crate::tools::SearchHit;
use crate::tools::WebSearch;

pub const DEFAULT_MAX_SOURCES: usize = 5;

/// Material gathered for one search hit
struct Gathered {
    hit: SearchHit,
    text: String,
}

pub struct ResearchAgent {
    model: Arc<dyn LanguageModel>,
    search: Arc<dyn WebSearch>,
    scraper: Arc<dyn ArticleScraper>,
    max_sources: usize,
    settings: AgentSettings,
}

impl ResearchAgent {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        search: Arc<dyn WebSearch>,
        scraper: Arc<dyn ArticleScraper>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            model,
            search,
            scraper,
            max_sources: DEFAULT_MAX_SOURCES,
            settings,
        }
    }

    #[must_use]
    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources.max(1);
        self
    }

    /// Research a topic on the web and write a report citing the pages used
    ///
    /// # Errors
    /// - `ValidationError` for an empty topic
    /// - `NoContextError` when the search yields no usable page
    /// - `FetchError` / `TimeoutError` from the search provider
    /// - `GenerationError` / `TimeoutError` from the language model
    pub async fn run(&self, topic: &str) -> Result<Report> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(FinAgentsError::ValidationError(
                "Research topic must not be empty".to_string(),
            ));
        }

        info!("Researching: {}", topic);
        let hits = self.search.search(topic, self.max_sources).await?;

        let mut seen = HashSet::new();
        let hits: Vec<SearchHit> = hits
            .into_iter()
            .filter(|hit| seen.insert(hit.url.clone()))
            .take(self.max_sources)
            .collect();
        debug!("{} unique search results", hits.len());

        let gathered = self.gather(hits).await;
        if gathered.is_empty() {
            return Err(FinAgentsError::NoContextError(format!(
                "Web search returned no usable sources for '{topic}'"
            )));
        }

        let now = Utc::now();
        let system = format!(
            "{}\n\n{}\n\n{}",
            AgentPrompts::research_description(),
            AgentPrompts::research_instructions(),
            datetime_instruction(now)
        );
        let prompt = AgentPrompts::research().render_with(&[
            ("topic", topic),
            ("sources", &format_sources(&gathered)),
        ]);
        let request = self.settings.apply(
            GenerationRequest::new(system, prompt)
                .with_expected_output(AgentPrompts::research_expected_output()),
        );

        let text =
            generate_with_deadline(self.model.as_ref(), &request, self.settings.timeout).await?;
        info!("Research report written from {} sources", gathered.len());

        Ok(Report {
            query: topic.to_string(),
            text,
            sources: gathered
                .into_iter()
                .map(|g| Source::Web {
                    url: g.hit.url,
                    title: g.hit.title,
                })
                .collect(),
            generated_at: now,
        })
    }

    /// Scrape every hit concurrently; a page that cannot be scraped falls back
    /// to its search snippet, and is dropped when it has none
    async fn gather(&self, hits: Vec<SearchHit>) -> Vec<Gathered> {
        let scrapes = join_all(hits.iter().map(|hit| self.scraper.scrape(&hit.url))).await;

        hits.into_iter()
            .zip(scrapes)
            .filter_map(|(hit, scraped)| match scraped {
                Ok(article) => Some(Gathered {
                    text: article.text,
                    hit,
                }),
                Err(e) if !hit.snippet.trim().is_empty() => {
                    warn!("Using search snippet for {}: {}", hit.url, e);
                    Some(Gathered {
                        text: hit.snippet.clone(),
                        hit,
                    })
                }
                Err(e) => {
                    warn!("Skipping {}: {}", hit.url, e);
                    None
                }
            })
            .collect()
    }
}

fn format_sources(gathered: &[Gathered]) -> String {
    gathered
        .iter()
        .enumerate()
        .map(|(idx, g)| {
            format!(
                "[{}] {}\nURL: {}\n{}\n",
                idx + 1,
                g.hit.title,
                g.hit.url,
                g.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
