//! docq: ask questions about a document from the command line.
//!
//! Reads already-extracted document text, stores it, and answers each query
//! in order through the cache and the resilient invoker. Repeating a query
//! within the cache TTL is answered without contacting the provider.

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docquery::document::PDF_CONTENT_TYPE;
use docquery::{
    Config, DocQueryError, DocumentChat, DocumentStore, ExtractedText, GeminiClient,
    ResilientInvoker, ResponseCache, Secrets,
};

/// Ask questions about a document.
#[derive(Parser)]
#[command(name = "docq")]
#[command(version)]
#[command(about = "Cached, retrying question answering over a document")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File holding the extracted document text (reads stdin when omitted).
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Page count reported by the text extractor.
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Queries to answer, in order.
    #[arg(required = true)]
    queries: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging();

    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    let api_key = secrets.require_gemini_api_key()?;

    let text = read_document(args.file.as_ref())?;
    let filename = args
        .file
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stdin".to_string());

    let documents = Arc::new(DocumentStore::new());
    let id = documents.ingest(
        filename,
        PDF_CONTENT_TYPE,
        ExtractedText::new(text, args.pages),
    )?;

    let provider = GeminiClient::with_options(
        api_key,
        &config.gemini.base_url,
        &config.gemini.model,
        Duration::from_secs(config.gemini.timeout_secs),
    )?;
    let chat = DocumentChat::new(
        documents,
        Arc::new(ResponseCache::new(&config.cache.to_cache_config())),
        ResilientInvoker::new(Arc::new(provider), config.retry.to_retry_policy()),
    );

    info!(%id, model = config.gemini.model, queries = args.queries.len(), "docq starting");

    for query in &args.queries {
        match chat.ask(id, query).await {
            Ok(answer) => println!("{answer}"),
            Err(DocQueryError::Invocation(e)) => {
                eprintln!("error ({}): {}", e.status_code(), e.user_message());
            }
            Err(e) => eprintln!("error ({}): {e}", e.status_code()),
        }
    }

    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,docquery=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_document(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}
