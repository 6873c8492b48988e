//! Application facade wiring the store, embedder, models and tools together

use std::sync::Arc;

use tracing::info;

use crate::agents::AgentSettings;
use crate::agents::RagEvaluator;
use crate::agents::ResearchAgent;
use crate::agents::StockAnalysisAgent;
use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingService;
use crate::errors::FinAgentsError;
use crate::errors::Result;
use crate::ingest::DocumentIngestor;
use crate::llm::LanguageModel;
use crate::llm::LlmService;
use crate::rag::RagOptions;
use crate::rag::RagService;
use crate::store::InMemoryVectorStore;
use crate::store::VectorStore;
use crate::tools::ArticleScraper;
use crate::tools::DuckDuckGoSearch;
use crate::tools::MarketDataProvider;
use crate::tools::ReadabilityScraper;
use crate::tools::WebSearch;
use crate::tools::YahooFinance;

/// One model per agent
#[derive(Clone)]
pub struct AgentModels {
    pub rag: Arc<dyn LanguageModel>,
    pub research: Arc<dyn LanguageModel>,
    pub stock: Arc<dyn LanguageModel>,
    pub evaluator: Arc<dyn LanguageModel>,
}

impl AgentModels {
    /// The same model for every agent
    pub fn shared(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            rag: Arc::clone(&model),
            research: Arc::clone(&model),
            stock: Arc::clone(&model),
            evaluator: model,
        }
    }

    /// Per-agent model ids from configuration, all on one provider
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let llm = LlmService::new(config)?;
        Ok(Self {
            rag: Arc::new(llm.with_model(config.rag_model())),
            research: Arc::new(llm.with_model(config.research_model())),
            stock: Arc::new(llm.with_model(config.stock_model())),
            evaluator: Arc::new(llm.with_model(config.evaluator_model())),
        })
    }
}

/// External tools used by the research and stock agents
#[derive(Clone)]
pub struct AgentTools {
    pub search: Arc<dyn WebSearch>,
    pub scraper: Arc<dyn ArticleScraper>,
    pub market: Arc<dyn MarketDataProvider>,
}

impl AgentTools {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            search: Arc::new(DuckDuckGoSearch::new(config)?),
            scraper: Arc::new(ReadabilityScraper::new(config)?),
            market: Arc::new(YahooFinance::new(config)?),
        })
    }
}

/// Every agent, constructed once from configuration and shared by reference
pub struct FinAgents {
    config: AppConfig,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    models: AgentModels,
    ingestor: DocumentIngestor,
    rag: RagService,
    research: ResearchAgent,
    stock: StockAnalysisAgent,
    evaluator: RagEvaluator,
}

impl FinAgents {
    /// Connect to PostgreSQL and check the schema was initialised for this embedder
    pub async fn connect(config: AppConfig) -> Result<Self> {
        let database = Database::from_config(&config).await?;
        database.verify_schema_or_error().await?;

        if let Some(stored) = database.stored_dimension().await? {
            if stored != config.embedding_dimension() {
                return Err(FinAgentsError::ConfigError(format!(
                    "Database stores {stored}-dimensional embeddings but embeddings.dimension is {}",
                    config.embedding_dimension()
                )));
            }
        }

        Self::with_store(config, Arc::new(database))
    }

    /// Process-local store; collections vanish on exit
    pub fn in_memory(config: AppConfig) -> Result<Self> {
        info!("Using in-memory vector store");
        Self::with_store(config, Arc::new(InMemoryVectorStore::new()))
    }

    /// Real embedder, models and tools over the given store
    pub fn with_store(config: AppConfig, store: Arc<dyn VectorStore>) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingService::new(&config)?);
        let models = AgentModels::from_config(&config)?;
        let tools = AgentTools::from_config(&config)?;
        Self::from_parts(config, store, embedder, models, tools)
    }

    /// Assemble from explicit parts
    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        models: AgentModels,
        tools: AgentTools,
    ) -> Result<Self> {
        config.validate()?;

        let ingestor = DocumentIngestor::new(&config, Arc::clone(&embedder), Arc::clone(&store))?;
        let rag = RagService::new(
            Arc::clone(&store),
            Arc::clone(&embedder),
            Arc::clone(&models.rag),
            RagOptions::from_config(&config),
        );

        let settings = AgentSettings::from_config(&config);
        let research = ResearchAgent::new(
            Arc::clone(&models.research),
            tools.search,
            tools.scraper,
            settings.clone(),
        )
        .with_max_sources(config.tools.max_search_results);
        let stock = StockAnalysisAgent::new(Arc::clone(&models.stock), tools.market, settings.clone())
            .with_news_count(config.tools.news_count);
        let evaluator = RagEvaluator::new(Arc::clone(&models.evaluator), settings);

        Ok(Self {
            config,
            store,
            embedder,
            models,
            ingestor,
            rag,
            research,
            stock,
            evaluator,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    #[must_use]
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    #[must_use]
    pub const fn models(&self) -> &AgentModels {
        &self.models
    }

    #[must_use]
    pub const fn ingestor(&self) -> &DocumentIngestor {
        &self.ingestor
    }

    #[must_use]
    pub const fn rag(&self) -> &RagService {
        &self.rag
    }

    #[must_use]
    pub const fn research(&self) -> &ResearchAgent {
        &self.research
    }

    #[must_use]
    pub const fn stock(&self) -> &StockAnalysisAgent {
        &self.stock
    }

    #[must_use]
    pub const fn evaluator(&self) -> &RagEvaluator {
        &self.evaluator
    }
}
