//! # MedGraph - Clinical Knowledge Graph
//!
//! The main binary for the MedGraph clinical knowledge graph.
//!
//! This application provides:
//! - HTTP query service (axum-based)
//! - CLI interface for graph queries
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               apps/medgraph (THE BINARY)             │
//! │                                                      │
//! │   ┌─────────────┐          ┌─────────────────────┐   │
//! │   │    CLI      │          │  HTTP API (axum)    │   │
//! │   │   (clap)    │          │  + SnapshotCell     │   │
//! │   └──────┬──────┘          └──────────┬──────────┘   │
//! │          └──────────────┬─────────────┘              │
//! │                         ▼                            │
//! │                 ┌────────────────┐                   │
//! │                 │ medgraph-core  │                   │
//! │                 │  (THE LOGIC)   │                   │
//! │                 └────────────────┘                   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! medgraph --source catalog.json serve --host 0.0.0.0 --port 8080
//!
//! # CLI queries
//! medgraph -s catalog.json status
//! medgraph -s catalog.json symptom febre
//! medgraph -s catalog.json paths --from gene:CYP2C9 --to symptom:cefaleia --depth 4
//! ```

use clap::Parser;
use medgraph::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // MEDGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("MEDGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "medgraph=info,medgraph_core=info,tower_http=debug".into());

    // Logs go to stderr so `--json-mode` output on stdout stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the MedGraph startup banner.
fn print_banner() {
    println!(
        r#"
  MedGraph v{}
  Clinical knowledge graph: diseases, symptoms, exams, medications, genes
"#,
        env!("CARGO_PKG_VERSION")
    );
}
