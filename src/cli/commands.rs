//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "finagents")]
#[command(about = "Financial AI agents: document Q&A, web research, stock analysis and evaluation")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep collections in memory instead of PostgreSQL
    #[arg(long, global = true)]
    pub in_memory: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database schema and indexes
    Init,
    /// Fetch a document and add its passages to a collection
    Ingest {
        /// Document URL (PDF, plain text or Markdown)
        url: String,
        /// Collection key
        #[arg(long)]
        collection: String,
    },
    /// Ask a question about an ingested collection
    Ask {
        /// The question
        question: String,
        /// Collection key
        #[arg(long)]
        collection: String,
        /// Also score the answer with the evaluator
        #[arg(long)]
        evaluate: bool,
    },
    /// Ingest a document, then ask one question about it
    Rag {
        /// Document URL
        pdf_url: String,
        /// The question
        question: String,
        /// Collection key (derived from the URL when omitted)
        #[arg(long)]
        collection: Option<String>,
    },
    /// Research a topic on the web and write a report
    Research {
        /// Topic to research
        topic: String,
    },
    /// Analyse stocks named in a query
    Stock {
        /// What to analyse, e.g. "Compare Apple (AAPL) and NVDA"
        query: String,
        /// Ticker to analyse (repeatable); extracted from the query when omitted
        #[arg(short, long = "ticker")]
        tickers: Vec<String>,
    },
    /// Evaluate a RAG response
    Evaluate {
        /// The original query
        query: String,
        /// The response to evaluate
        response: String,
        /// Retrieved context, comma-separated
        context: String,
    },
    /// Manage collections
    #[command(subcommand)]
    Collections(CollectionCommands),
    /// Show current configuration
    Config,
    /// Start the HTTP API server
    Serve {
        /// Host to bind (default from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (default from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable permissive CORS
        #[arg(long)]
        cors: bool,
    },
}

#[derive(Subcommand)]
pub enum CollectionCommands {
    /// List collections with their embedding model and counts
    List,
    /// Delete a collection and all its passages
    Delete {
        /// Collection key
        key: String,
    },
}
