use chrono::Utc;
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::{Config, Credentials};
use crate::document::load_pdf_pages;
use crate::embeddings::chunking::chunk_pages;
use crate::embeddings::watsonx::WatsonxEmbedder;
use crate::generation::WatsonxGenerator;
use crate::index::{PassageRecord, VectorStore};
use crate::observability::InteractionLogger;
use crate::retriever::Retriever;
use crate::server;
use crate::{Result, SahayError};

/// Build the vector index from the configured PDF.
///
/// The index is assembled fully in memory and written once; a failure at
/// any step aborts the command without leaving a half-written index.
#[inline]
pub async fn run_ingest(base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir)?;
    // Fail fast on missing credentials, before any network call
    let credentials =
        Credentials::from_env().map_err(|e| SahayError::Config(e.to_string()))?;

    let pdf_path = config.document_path();
    let source = pdf_path
        .file_name()
        .map_or_else(|| "document".to_string(), |n| n.to_string_lossy().into_owned());

    info!("Ingesting {}", pdf_path.display());
    let pages = load_pdf_pages(&pdf_path)?;
    println!("📄 Loaded {} pages from {}", pages.len(), pdf_path.display());

    let passages = chunk_pages(&source, &pages, &config.chunking)?;
    if passages.is_empty() {
        return Err(SahayError::DocumentRead(format!(
            "No text could be extracted from {}",
            pdf_path.display()
        )));
    }
    println!("✂️  Cut the document into {} passages", passages.len());

    let embedder = WatsonxEmbedder::new(&config.watsonx, &credentials)?;

    let progress = ProgressBar::new(passages.len() as u64);
    let mut vectors = Vec::with_capacity(passages.len());
    let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
    for group in texts.chunks(config.watsonx.batch_size as usize) {
        vectors.extend(embedder.embed_batch(group)?);
        progress.inc(group.len() as u64);
    }
    progress.finish_and_clear();
    println!(
        "🧠 Embedded {} passages with {} ({} dimensions)",
        vectors.len(),
        config.watsonx.embedding_model,
        embedder.dimension()
    );

    let created_at = Utc::now().to_rfc3339();
    let records: Vec<PassageRecord> = passages
        .into_iter()
        .zip(vectors)
        .map(|(passage, vector)| PassageRecord {
            id: Uuid::new_v4().to_string(),
            vector,
            passage,
            created_at: created_at.clone(),
        })
        .collect();

    let index_dir = config.index_dir();
    let mut store = VectorStore::create(&index_dir).await?;
    store.build(&records).await?;

    println!("🗄️  Vector index written to {}", index_dir.display());
    println!("Ingestion complete. Start the chat interface with `sahay serve`.");

    Ok(())
}

/// Launch the interactive web chat interface.
#[inline]
pub async fn run_serve(base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir)?;
    // Fail fast on missing credentials, before any network call
    let credentials =
        Credentials::from_env().map_err(|e| SahayError::Config(e.to_string()))?;

    let store = Arc::new(VectorStore::open(&config.index_dir()).await?);
    let indexed = store.count().await?;
    info!("Opened vector index with {} passages", indexed);

    let embedder = Arc::new(WatsonxEmbedder::new(&config.watsonx, &credentials)?);
    let generator = WatsonxGenerator::new(&config.watsonx, &credentials)?;
    let logger = InteractionLogger::new(config.log_path())?;

    let retriever = Retriever::new(embedder, Arc::clone(&store), config.retrieval.top_k);
    let state = server::app_state(retriever, generator, logger, store);

    println!(
        "🌾 Sahay AI is ready: http://{}:{} ({} passages indexed)",
        config.server.host, config.server.port, indexed
    );
    println!("Press Ctrl+C to stop.");

    server::serve(state, &config.server.host, config.server.port).await
}

/// Report the state of the document, credentials, index, and log.
#[inline]
pub async fn show_status(base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir)?;

    println!("📊 Sahay Status");
    println!("{}", "=".repeat(40));

    match Credentials::from_env() {
        Ok(_) => println!("🔑 Credentials: present"),
        Err(e) => println!("🔑 Credentials: missing ({})", e),
    }

    let pdf_path = config.document_path();
    if pdf_path.exists() {
        println!("📄 Document: {}", pdf_path.display());
    } else {
        println!("📄 Document: not found at {}", pdf_path.display());
    }

    match VectorStore::open(&config.index_dir()).await {
        Ok(store) => match store.count().await {
            Ok(count) => println!("🗄️  Index: {} passages", count),
            Err(e) => println!("🗄️  Index: unreadable ({})", e),
        },
        Err(SahayError::IndexNotFound(_)) => {
            println!("🗄️  Index: not built yet (run `sahay ingest`)");
        }
        Err(e) => println!("🗄️  Index: error ({})", e),
    }

    let log_path = config.log_path();
    if log_path.exists() {
        let interactions = std::fs::read_to_string(&log_path)
            .map(|content| content.lines().count())
            .unwrap_or(0);
        println!("📝 Interaction log: {} records", interactions);
    } else {
        println!("📝 Interaction log: empty");
    }

    Ok(())
}
