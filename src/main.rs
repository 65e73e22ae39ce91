//! # QA Knowledge Base CLI (`qakb`)
//!
//! The `qakb` binary is the upload boundary around the retrieval core. It
//! collects support documents and a reference HTML page, rebuilds the
//! knowledge base, and answers queries with a documentation-grounded
//! context string.
//!
//! ## Usage
//!
//! ```bash
//! qakb --config ./config/qakb.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `qakb build --docs <paths> --page <html>` | Rebuild the knowledge base |
//! | `qakb query "<text>"` | Retrieve context for a query |
//! | `qakb status` | Show build status of the current knowledge base |

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use qa_kb::config;
use qa_kb::embedding;
use qa_kb::models::{DocumentKind, SupportDoc};
use qa_kb::service::KnowledgeBase;
use qa_kb::store::sqlite::SqliteIndexStore;

/// QA Knowledge Base - documentation-grounded context retrieval for QA
/// test generation.
#[derive(Parser)]
#[command(
    name = "qakb",
    about = "QA Knowledge Base - documentation-grounded context retrieval for QA test generation",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/qakb.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the knowledge base from support documents and a reference
    /// HTML page.
    ///
    /// The previous knowledge base is destroyed entirely; there is no
    /// incremental update. Directories are walked recursively and files with
    /// unsupported extensions are skipped with a warning.
    Build {
        /// Support document files or directories (.txt, .md, .json, .pdf).
        #[arg(long = "docs", required = true, num_args = 1..)]
        docs: Vec<PathBuf>,

        /// Reference HTML page (e.g. checkout.html).
        #[arg(long)]
        page: PathBuf,
    },

    /// Retrieve documentation context for a natural-language query.
    ///
    /// Prints ranked chunk blocks labeled with their source document and
    /// chunk index, separated by blank lines.
    Query {
        /// The query text.
        query: String,

        /// Number of chunks to retrieve (defaults to retrieval.top_k).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show build status of the current knowledge base.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    let store = SqliteIndexStore::new(&cfg.index.dir);
    let embedder = embedding::create_embedder(&cfg.embedding)?;
    let kb = KnowledgeBase::new(Box::new(store), embedder, cfg.chunking.clone())?;

    match cli.command {
        Commands::Build { docs, page } => {
            let support_docs = collect_support_docs(&docs)?;
            let page_bytes = std::fs::read(&page)
                .with_context(|| format!("Failed to read reference page: {}", page.display()))?;
            let reference_html = String::from_utf8_lossy(&page_bytes).into_owned();

            let info = kb.build(&support_docs, &reference_html).await?;

            println!("build");
            println!("  documents: {}", info.documents);
            println!("  chunks indexed: {}", info.chunks);
            if info.degraded_parses > 0 {
                println!("  lossy parses: {}", info.degraded_parses);
            }
            println!("  model: {} ({} dims)", info.model, info.dims);
            println!("ok");
        }
        Commands::Query { query, top_k } => {
            let top_k = top_k.unwrap_or(cfg.retrieval.top_k);
            let context = kb.retrieve(&query, top_k).await?;
            if context.is_empty() {
                println!("No results.");
            } else {
                println!("{}", context);
            }
        }
        Commands::Status => match kb.status().await? {
            Some(info) => {
                let built_at = chrono::DateTime::from_timestamp(info.built_at, 0)
                    .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| info.built_at.to_string());
                println!("knowledge base: built");
                println!("  documents: {}", info.documents);
                println!("  chunks: {}", info.chunks);
                println!("  model: {} ({} dims)", info.model, info.dims);
                println!("  built at: {}", built_at);
            }
            None => {
                println!("knowledge base: not built");
            }
        },
    }

    Ok(())
}

/// Collect support documents from the given files and directories.
///
/// Directories are walked in file-name order for deterministic document
/// ordinals. Files with unsupported extensions are skipped with a warning;
/// an empty result is an error - the pipeline requires at least one document.
fn collect_support_docs(paths: &[PathBuf]) -> Result<Vec<SupportDoc>> {
    let mut docs = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() {
                    push_supported(&mut docs, entry.path())?;
                }
            }
        } else {
            push_supported(&mut docs, path)?;
        }
    }

    if docs.is_empty() {
        bail!("no support documents found (supported: .txt, .md, .json, .pdf)");
    }
    Ok(docs)
}

fn push_supported(docs: &mut Vec<SupportDoc>, path: &Path) -> Result<()> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if DocumentKind::from_filename(&filename) == DocumentKind::Other {
        eprintln!("Warning: skipping unsupported file {}", path.display());
        return Ok(());
    }

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    docs.push(SupportDoc { filename, bytes });
    Ok(())
}
