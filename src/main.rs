use clap::Parser;
use finagents::cli::handlers::*;
use finagents::cli::output::print_error;
use finagents::cli::CollectionCommands;
use finagents::cli::Cli;
use finagents::cli::Commands;
use finagents::config::AppConfig;
use finagents::FinAgents;
use finagents::Result;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.kind(), e);
        print_error(&format!("{}: {}", e.kind(), e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    if cli.verbose {
        finagents::logging::init_logging_with_level("debug")?;
    } else if std::env::var("RUST_LOG").is_ok() {
        finagents::logging::init_logging()?;
    } else {
        finagents::logging::init_logging_with_config(Some(&config))?;
    }

    match cli.command {
        Commands::Init => handle_init_command(&config).await,
        Commands::Config => handle_config_command(&config),
        command => {
            // Research, stock and evaluate never touch the vector store
            let needs_database = matches!(
                command,
                Commands::Ingest { .. }
                    | Commands::Ask { .. }
                    | Commands::Rag { .. }
                    | Commands::Collections(_)
                    | Commands::Serve { .. }
            );
            let app = if cli.in_memory || !needs_database {
                FinAgents::in_memory(config)?
            } else {
                FinAgents::connect(config).await?
            };
            dispatch(app, command).await
        }
    }
}

async fn dispatch(app: FinAgents, command: Commands) -> Result<()> {
    match command {
        Commands::Ingest { url, collection } => handle_ingest(&app, &url, &collection).await,
        Commands::Ask {
            question,
            collection,
            evaluate,
        } => handle_ask(&app, &question, &collection, evaluate).await,
        Commands::Rag {
            pdf_url,
            question,
            collection,
        } => handle_rag(&app, &pdf_url, &question, collection.as_deref()).await,
        Commands::Research { topic } => handle_research(&app, &topic).await,
        Commands::Stock { query, tickers } => handle_stock(&app, &query, &tickers).await,
        Commands::Evaluate {
            query,
            response,
            context,
        } => handle_evaluate(&app, &query, &response, &context).await,
        Commands::Collections(CollectionCommands::List) => handle_list_collections(&app).await,
        Commands::Collections(CollectionCommands::Delete { key }) => {
            handle_delete_collection(&app, &key).await
        }
        Commands::Serve { host, port, cors } => handle_serve_api(app, host, port, cors).await,
        Commands::Init | Commands::Config => Ok(()),
    }
}
