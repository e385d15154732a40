
use anyhow::{Context, Result};
use console::style;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::RagError;
use crate::config::Config;
use crate::database::lancedb::{StoreManifest, VectorStore};
use crate::embeddings::{Embedder, OllamaClient};
use crate::ingest::Indexer;
use crate::rag::{Answer, RetrievalChain, source_file_name};

const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "q"];

/// Load the dataset, embed it and persist the vector store
///
/// `dataset` overrides `paths.dataset_dir`. With `rebuild` the existing
/// store is cleared first.
#[inline]
pub async fn run_ingest(config: &Config, dataset: Option<PathBuf>, rebuild: bool) -> Result<()> {
    let dataset_dir = dataset.unwrap_or_else(|| config.dataset_dir().to_path_buf());
    let store_dir = config.store_dir();

    let embedder =
        OllamaClient::new(&config.ollama).context("Failed to initialize Ollama client")?;
    let batch_size = config.ollama.batch_size as usize;

    println!("Loading documents from {}...", dataset_dir.display());
    println!(
        "Embedding with {} into {}",
        style(embedder.model()).cyan(),
        style(store_dir.display()).cyan()
    );

    let indexer = Indexer::new(Arc::new(embedder), store_dir).with_batch_size(batch_size);
    match indexer.ingest(&dataset_dir, rebuild).await {
        Ok(stats) => {
            println!("Loaded {} documents.", stats.documents_loaded);
            println!(
                "{}",
                style(format!(
                    "Ingestion complete. Vector store holds {} entries.",
                    stats.total_entries
                ))
                .green()
            );
            Ok(())
        }
        Err(RagError::EmptyDataset(dir)) => {
            info!("No documents found in {}", dir);
            println!("No documents found. Exiting.");
            Ok(())
        }
        Err(e) => Err(e).context("Ingestion failed"),
    }
}

/// Interactive question loop on stdin/stdout
#[inline]
pub async fn run_console(config: &Config) -> Result<()> {
    println!("Initializing components...");
    let chain = RetrievalChain::from_config(config)
        .await
        .context("Failed to initialize RAG")?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    console_loop(&chain, stdin, &mut stdout).await
}

/// Read questions from `input` until EOF or an exit command, answering each
///
/// Errors from a single question are printed and the loop continues. Input
/// that is not valid UTF-8 is decoded lossily.
#[inline]
pub async fn console_loop<R: AsyncBufRead + Unpin + Send, W: Write + Send>(
    chain: &RetrievalChain,
    mut input: R,
    output: &mut W,
) -> Result<()> {
    writeln!(output, "\n--- Quick RAG (type 'exit' to quit) ---\n")?;

    let mut line = Vec::new();
    loop {
        write!(output, "Query: ")?;
        output.flush()?;

        line.clear();
        if input.read_until(b'\n', &mut line).await? == 0 {
            writeln!(output)?;
            break;
        }

        let decoded = String::from_utf8_lossy(&line);
        let query = decoded.trim();
        if EXIT_COMMANDS
            .iter()
            .any(|cmd| query.eq_ignore_ascii_case(cmd))
        {
            break;
        }
        if query.is_empty() {
            continue;
        }

        writeln!(output, "Thinking...")?;
        match chain.answer(query).await {
            Ok(answer) => write_answer(output, &answer)?,
            Err(e) => {
                error!("Error during query: {}", e);
                writeln!(output, "{} {}", style("Error:").red(), e)?;
            }
        }
    }

    Ok(())
}

fn write_answer<W: Write>(output: &mut W, answer: &Answer) -> Result<()> {
    writeln!(output, "\nAnswer: {}\n", answer.answer)?;
    writeln!(output, "Sources:")?;
    for (i, source) in answer.sources.iter().enumerate() {
        writeln!(
            output,
            "{}. {} (Source: {})",
            i + 1,
            source.metadata.title,
            source_file_name(&source.metadata.source)
        )?;
    }
    writeln!(output, "{}", "-".repeat(50))?;
    Ok(())
}

/// Report configuration, service reachability and store contents
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("{}", style("Quick RAG Status").bold().cyan());
    println!("{}", "=".repeat(50));
    println!();

    println!("{}", style("Embeddings:").bold().yellow());
    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check().await {
            Ok(()) => println!(
                "   {} Ollama reachable, model {} available",
                style("✓").green(),
                config.ollama.model
            ),
            Err(e) => println!("   {} {}", style("✗").red(), e),
        },
        Err(e) => println!("   {} Invalid Ollama settings: {:#}", style("✗").red(), e),
    }

    println!();
    println!("{}", style("LLM:").bold().yellow());
    println!("   Endpoint: {}", config.llm.base_url);
    println!("   Model: {}", config.llm.model);
    match config.api_key() {
        Ok(_) => println!("   {} API key configured", style("✓").green()),
        Err(e) => println!("   {} {}", style("✗").red(), e),
    }

    println!();
    println!("{}", style("Vector Store:").bold().yellow());
    let store_dir = config.store_dir();
    println!("   Path: {}", store_dir.display());
    if store_dir.is_dir() {
        match StoreManifest::load(store_dir)? {
            Some(manifest) => {
                println!(
                    "   Built with: {} ({} dimensions) at {}",
                    manifest.embedding_model, manifest.embedding_dimension, manifest.created_at
                );
                match VectorStore::open_existing(store_dir, &manifest.embedding_model).await {
                    Ok(store) => println!("   Entries: {}", store.count_entries().await?),
                    Err(e) => println!("   {} {}", style("✗").red(), e),
                }
                if manifest.embedding_model != config.ollama.model {
                    println!(
                        "   {} Configured model {} differs; run 'quick-rag ingest --rebuild'",
                        style("⚠").yellow(),
                        config.ollama.model
                    );
                }
            }
            None => println!("   Empty"),
        }
    } else {
        println!("   Not created yet");
    }

    println!();
    println!("{}", style("Next Steps:").bold());
    println!("   • Use 'quick-rag ingest' to index {}", config.dataset_dir().display());
    println!("   • Use 'quick-rag ask' for console questions");
    println!("   • Use 'quick-rag serve' to start the web chat");

    Ok(())
}
