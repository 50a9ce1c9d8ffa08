use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::{logging, server};
use lexdraft_core::config::{self, AppConfig};
use lexdraft_core::models::CaseInput;
use lexdraft_core::pipeline;
use lexdraft_core::rag::RagSystem;
use lexdraft_core::{LetterService, ServiceError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);
    let cfg = config::load(cli.config.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Serve { host, port } => run_serve(cfg, host, port).await,
        Commands::Ingest { force } => run_ingest(cfg, force, json).await,
        Commands::Search { query, k } => {
            let service = LetterService::start(cfg).await?;
            let hits = service.search(&query, k).await.map_err(service_error)?;
            emit(json, &hits, || {
                for hit in &hits {
                    let excerpt: String = hit.chunk.content.chars().take(80).collect();
                    println!("{:>10.4}  {}  {}", hit.score, hit.citation(), excerpt);
                }
            })
        }
        Commands::Generate { case } => {
            let raw = std::fs::read_to_string(&case)
                .with_context(|| format!("failed to read {}", case.display()))?;
            let input: CaseInput = serde_json::from_str(&raw)
                .with_context(|| format!("invalid case file {}", case.display()))?;
            let service = LetterService::start(cfg).await?;
            let response = service.generate_letter(input).await.map_err(service_error)?;
            emit(json, &response, || {
                println!(
                    "{}: case {}",
                    response.message,
                    response.case_id.as_deref().unwrap_or("-")
                );
                if let Some(letter) = &response.letter {
                    for section in &letter.supporting_sections {
                        println!("  cites {section}");
                    }
                }
            })
        }
        Commands::Cases => {
            let service = LetterService::open(&cfg).await?;
            let list = service.list_cases().await.map_err(service_error)?;
            emit(json, &list, || {
                for case in &list.cases {
                    println!(
                        "{}  {}  {}",
                        case.id,
                        case.created_at.format("%Y-%m-%d %H:%M"),
                        case.input.case_title
                    );
                }
                println!("{} case(s)", list.cases.len());
            })
        }
        Commands::Case { id } => {
            let service = LetterService::open(&cfg).await?;
            let case = service.get_case(&id).await.map_err(service_error)?;
            emit(json, &case, || {
                println!("{} ({})", case.input.case_title, case.id);
                println!("client: {}", case.input.client_name);
                println!("created: {}", case.created_at.to_rfc3339());
                for section in &case.content.supporting_sections {
                    println!("  cites {section}");
                }
                println!("\n{}", case.content.formal_letter);
            })
        }
        Commands::Export { id, out } => {
            let service = LetterService::open(&cfg).await?;
            let bundle = service.export_case(&id).await.map_err(service_error)?;
            std::fs::create_dir_all(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            let letter = out.join(format!("{id}_letter.html"));
            let arguments = out.join(format!("{id}_arguments.html"));
            std::fs::write(&letter, &bundle.formal_content)?;
            std::fs::write(&arguments, &bundle.arguments)?;
            let written = serde_json::json!({
                "case_title": &bundle.case_title,
                "letter": &letter,
                "arguments": &arguments,
            });
            emit(json, &written, || {
                println!("exported {}", bundle.case_title);
                println!("  {}", letter.display());
                println!("  {}", arguments.display());
            })
        }
        Commands::Delete { id } => {
            let service = LetterService::open(&cfg).await?;
            service.delete_case(&id).await.map_err(service_error)?;
            let body = serde_json::json!({ "success": true, "case_id": &id });
            emit(json, &body, || println!("deleted case {id}"))
        }
        Commands::Health => {
            let service = LetterService::start(cfg).await?;
            let health = service.health();
            emit(json, &health, || {
                println!(
                    "status: {}, rag ready: {}, generator ready: {}",
                    health.status, health.rag_system_ready, health.letter_generator_ready
                );
            })
        }
    }
}

#[derive(Parser)]
#[command(name = "lexdraft")]
#[command(about = "Draft legal letters grounded in statute text", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the WebSocket API server
    Serve {
        /// Bind host (defaults to server.host)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (defaults to server.port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Build the vector store from the configured documents
    Ingest {
        /// Rebuild even if a saved store matches the documents
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Retrieve the provisions closest to a query
    Search {
        query: String,
        /// Number of results (defaults to retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,
    },
    /// Generate a letter and argument memo for a case file
    Generate {
        /// JSON file with the case details
        #[arg(long)]
        case: PathBuf,
    },
    /// List stored cases, newest first
    Cases,
    /// Show one stored case
    Case { id: String },
    /// Write the letter and arguments of a case as HTML
    Export {
        id: String,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Delete a stored case
    Delete { id: String },
    /// Report whether retrieval and generation are ready
    Health,
}

async fn run_serve(cfg: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| cfg.server.host.clone());
    let port = port.unwrap_or(cfg.server.port);
    let service = Arc::new(LetterService::start(cfg).await?);
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;

    tokio::select! {
        res = server::run(listener, service) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}

async fn run_ingest(cfg: AppConfig, force: bool, json: bool) -> Result<()> {
    if force {
        let summary = pipeline::rebuild_index(cfg).await?;
        return emit(json, &summary, || {
            println!(
                "indexed {} document(s): {} pages, {} sections, {} chunks",
                summary.documents, summary.pages, summary.sections, summary.chunks
            );
        });
    }

    let registry = pipeline::build_registry(&cfg);
    let (rag, summary) = RagSystem::bootstrap(cfg, registry, false).await?;
    let body = serde_json::json!({
        "rebuilt": summary.is_some(),
        "chunks": rag.documents().len(),
        "summary": &summary,
    });
    emit(json, &body, || match &summary {
        Some(s) => println!(
            "indexed {} document(s): {} pages, {} sections, {} chunks",
            s.documents, s.pages, s.sections, s.chunks
        ),
        None => println!(
            "vector store is up to date ({} chunks)",
            rag.documents().len()
        ),
    })
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}

fn service_error(e: ServiceError) -> anyhow::Error {
    anyhow::anyhow!("{e:#} (status {})", e.status_code())
}
