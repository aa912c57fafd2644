use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use regassist::audit::{AuditMetrics, AuditSink, MemoryAuditLog, SqliteAuditLog};
use regassist::cache::EmbeddingCache;
use regassist::db::Db;
use regassist::embeddings::OpenAIEmbedder;
use regassist::graph::{GraphIndex, GraphRetriever, SharedGraph};
use regassist::llm::OpenAIChat;
use regassist::retrieve::{load_pages, LexicalRetriever, Retriever};
use regassist::{Availability, Config, Orchestrator};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "regassist")]
#[command(version, about = "Grounded GDPR question answering with answer verification")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a question and verify the answer against retrieved evidence
    Ask {
        question: String,
        /// JSON array of pre-extracted pages
        #[arg(long)]
        pages: PathBuf,
        /// Retrieve through the structural graph instead of plain lexical search
        #[arg(long)]
        graph: bool,
        /// Print the full run (steps + diagnostics) as JSON
        #[arg(long)]
        json: bool,
        /// Override pipeline.k_retrieval
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Build the structural graph and report its completeness
    Graph {
        #[arg(long)]
        pages: PathBuf,
    },
    /// Aggregate grounding metrics from the audit database
    Metrics,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    match cli.command {
        Command::Ask {
            question,
            pages,
            graph,
            json,
            k,
        } => {
            if let Some(k) = k {
                config.pipeline.k_retrieval = k.max(1);
            }
            let pages = load_pages(&pages).with_context(|| format!("Failed to load pages from {}", pages.display()))?;
            let lexical = LexicalRetriever::new(pages.clone());
            if graph {
                let shared = Arc::new(SharedGraph::new(GraphIndex::build(&pages, &config.graph)));
                let retriever = GraphRetriever::new(lexical, shared, config.graph.clone());
                ask(retriever, &config, &question, json).await?;
            } else {
                ask(lexical, &config, &question, json).await?;
            }
        }
        Command::Graph { pages } => {
            let pages = load_pages(&pages).with_context(|| format!("Failed to load pages from {}", pages.display()))?;
            let index = GraphIndex::build(&pages, &config.graph);
            println!(
                "Structural graph: {} nodes, {} edges",
                index.graph().node_count(),
                index.graph().edge_count()
            );
            println!("{}", serde_json::to_string_pretty(&index.completeness())?);
        }
        Command::Metrics => {
            let path = config
                .audit_db_path()
                .context("audit.db_path is not configured; no persisted audit log to read")?;
            let events = SqliteAuditLog::load_events(&Db::new(path)).await?;
            println!("{}", AuditMetrics::from_events(&events).format_report());
        }
    }

    Ok(())
}

async fn ask<R: Retriever>(retriever: R, config: &Config, question: &str, json: bool) -> Result<()> {
    let embedder = build_embedder(config);
    let generator = build_generator(config);
    if let Some(reason) = generator.unavailable_reason() {
        log::warn!("Generation offline ({}); answers will be context dumps", reason);
    }
    if let Some(reason) = embedder.unavailable_reason() {
        log::warn!("Embeddings offline ({}); support scoring degrades to all-low", reason);
    }

    let orchestrator = Orchestrator::new(retriever, embedder, generator, build_audit_sink(config)?, config.pipeline.clone());
    let outcome = orchestrator.run(question).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.answer);
    }
    Ok(())
}

fn build_embedder(config: &Config) -> Availability<OpenAIEmbedder> {
    let cfg = &config.embeddings;
    let cache = (cfg.cache_capacity > 0).then(|| Arc::new(EmbeddingCache::new(cfg.cache_capacity)));
    Availability::from_env(&cfg.api_key_env, |key| {
        OpenAIEmbedder::new(key, cfg.model.clone(), cfg.batch_size).map(|embedder| {
            let embedder = embedder.with_dimensions(cfg.dimensions);
            match cache {
                Some(cache) => embedder.with_cache(cache),
                None => embedder,
            }
        })
    })
    .flatten()
}

fn build_generator(config: &Config) -> Availability<OpenAIChat> {
    let cfg = &config.generation;
    Availability::from_env(&cfg.api_key_env, |key| {
        OpenAIChat::new(key, cfg.model.clone(), cfg.temperature, cfg.max_tokens)
    })
    .flatten()
}

fn build_audit_sink(config: &Config) -> Result<Arc<dyn AuditSink>> {
    Ok(match config.audit_db_path() {
        Some(path) => {
            let sink = SqliteAuditLog::open(Db::new(path))
                .with_context(|| format!("Failed to open audit database {}", path.display()))?;
            Arc::new(sink)
        }
        None => Arc::new(MemoryAuditLog::new()),
    })
}
