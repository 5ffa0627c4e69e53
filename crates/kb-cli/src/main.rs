//! kb CLI - Command-line interface for the knowledge base.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use kb_core::{EntityKind, KbConfig, Store};
use kb_index::{is_stale, Indexer};
use kb_query::QueryEngine;
use kb_store::SqliteStore;

/// kb - Knowledge-base indexing and cross-reference graph
#[derive(Parser)]
#[command(name = "kb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database path (default: from config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Corpus root directory (default: from config)
    #[arg(short, long, global = true)]
    corpus: Option<PathBuf>,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Index the corpus
    Index {
        /// Only run when the index is out of date
        #[arg(long)]
        if_stale: bool,
    },

    /// Show index status and statistics
    Status,

    /// Search the knowledge base
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<u32>,

        /// Emit results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up a rule by identifier (e.g. CR-1)
    Rule {
        /// Rule identifier
        id: String,
    },

    /// Look up a verification type by identifier (e.g. VR-BUILD)
    Vr {
        /// Verification type identifier
        id: String,
    },

    /// Traverse the cross-reference graph from an entity
    Graph {
        /// Entity kind: cr, vr, incident, or correction
        kind: String,

        /// Entity identifier
        id: String,

        /// Maximum traversal depth
        #[arg(long)]
        depth: Option<u32>,
    },
}

fn load_config(cli: &Cli) -> Result<KbConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => KbConfig::load(path)?,
        None => KbConfig::load_default()?,
    };
    if let Some(db) = &cli.database {
        config.database.path = db.clone();
    }
    if let Some(corpus) = &cli.corpus {
        config.corpus.root = corpus.clone();
    }
    Ok(config)
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Init => {
            let _store = SqliteStore::open(&config.database.path)?;
            println!("Initialized database at: {}", config.database.path.display());
        }
        Commands::Index { if_stale } => {
            let store = Arc::new(SqliteStore::open(&config.database.path)?);
            let indexer = Indexer::new(store, config.clone());
            let stats = if if_stale {
                indexer.index_if_stale().await?
            } else {
                indexer.index_all().await?
            };
            println!(
                "Indexed {} files: {} chunks, {} edges, {} failures",
                stats.files_indexed, stats.chunks_created, stats.edges_created, stats.failures
            );
        }
        Commands::Status => {
            let store = Arc::new(SqliteStore::open(&config.database.path)?);
            let stats = store.get_stats().await?;
            let stale = is_stale(store.as_ref(), &config.corpus).await?;

            println!("Corpus root: {}", config.corpus.root.display());
            println!("Database:    {}", config.database.path.display());
            println!("Status:      {}", if stale { "stale" } else { "fresh" });
            println!();
            println!("Documents:          {}", stats.documents);
            println!("Chunks:             {}", stats.chunks);
            println!("Rules:              {}", stats.rules);
            println!("Verification types: {}", stats.verification_types);
            println!("Incidents:          {}", stats.incidents);
            println!("Corrections:        {}", stats.corrections);
            println!("Edges:              {}", stats.edges);
            println!("Storage:            {} bytes", stats.storage_bytes);
        }
        Commands::Search { query, top_k, json } => {
            let store = Arc::new(SqliteStore::open(&config.database.path)?);
            let engine = QueryEngine::new(store, config);
            let results = engine.search(&query, top_k).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!(
                    "{} result(s) in {}ms",
                    results.total_results, results.latency_ms
                );
                for hit in &results.results {
                    println!();
                    println!(
                        "{}. {} ({}:{}-{}) [{:.3}]",
                        hit.rank,
                        if hit.chunk.heading.is_empty() {
                            "(preamble)"
                        } else {
                            &hit.chunk.heading
                        },
                        hit.file_path,
                        hit.chunk.line_start,
                        hit.chunk.line_end,
                        hit.score
                    );
                    for line in hit.chunk.content.lines().take(3) {
                        println!("   {}", line);
                    }
                }
            }
        }
        Commands::Rule { id } => {
            let store = Arc::new(SqliteStore::open(&config.database.path)?);
            let engine = QueryEngine::new(store, config);
            match engine.rule(&id).await? {
                Some(rule) => {
                    println!("{}: {}", rule.rule_id, rule.rule_text);
                    if let Some(vr) = &rule.vr_type {
                        println!("Verified by: {}", vr);
                    }
                    if let Some(path) = &rule.reference_path {
                        println!("Reference:   {}", path);
                    }
                }
                None => {
                    eprintln!("No rule found with id '{}'", id);
                    std::process::exit(1);
                }
            }
        }
        Commands::Vr { id } => {
            let store = Arc::new(SqliteStore::open(&config.database.path)?);
            let engine = QueryEngine::new(store, config);
            match engine.verification_type(&id).await? {
                Some(vr) => {
                    println!("{}: {}", vr.vr_type, vr.command);
                    if let Some(desc) = &vr.description {
                        println!("{}", desc);
                    }
                }
                None => {
                    eprintln!("No verification type found with id '{}'", id);
                    std::process::exit(1);
                }
            }
        }
        Commands::Graph { kind, id, depth } => {
            let Some(kind) = EntityKind::parse(&kind) else {
                eprintln!("Unknown entity kind '{}' (expected cr, vr, incident, or correction)", kind);
                std::process::exit(1);
            };

            let store = Arc::new(SqliteStore::open(&config.database.path)?);
            let engine = QueryEngine::new(store, config);
            let traversal = engine.traverse(kind, &id, depth).await?;

            println!(
                "{} entities within {} hop(s) of {}:",
                traversal.nodes.len(),
                traversal.max_depth,
                traversal.start
            );
            for node in &traversal.nodes {
                println!("  [{}] {}", node.distance, node.entity);
            }
        }
    }

    Ok(())
}
