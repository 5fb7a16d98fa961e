//! # MedGraph CLI Module
//!
//! This module implements the CLI interface for MedGraph.
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server
//! - `status` - Show graph metrics
//! - `symptom` - Diseases causing a symptom
//! - `treatments` - Medications treating a disease
//! - `indications` - Diseases treated by a medication
//! - `paths` - Simple paths between two nodes
//! - `subgraph` - Node-induced subgraph
//! - `clusters` - Comorbidity clusters (unsupported)
//! - `export` - Export the graph as a JSON document

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use medgraph_core::MedGraphError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// MedGraph - clinical knowledge graph
///
/// Builds a typed, weighted graph of diseases, symptoms, exams, medications
/// and genes from a catalog, and answers relationship queries over it.
#[derive(Parser, Debug)]
#[command(name = "medgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print build report details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Catalog JSON file to build the graph from
    #[arg(short, long, global = true)]
    pub source: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show graph metrics
    Status,

    /// Find diseases that cause a symptom
    Symptom {
        /// Symptom text (case-insensitive substring)
        text: String,
    },

    /// Find medications that treat a disease
    Treatments {
        /// Disease id, raw or `disease:`-namespaced
        disease: String,
    },

    /// Find diseases a medication treats
    Indications {
        /// Medication id, raw or `medication:`-namespaced
        medication: String,
    },

    /// Enumerate simple paths between two nodes
    Paths {
        /// Source node id
        #[arg(short, long)]
        from: String,

        /// Target node id
        #[arg(short, long)]
        to: String,

        /// Maximum path length in edges
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Extract a node-induced subgraph
    Subgraph {
        /// Node ids (comma-separated)
        #[arg(short, long)]
        nodes: String,
    },

    /// Find comorbidity clusters
    Clusters {
        /// Minimum co-occurrence count
        #[arg(short, long, default_value = "2")]
        min: usize,
    },

    /// Export the graph as a JSON document
    Export {
        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), MedGraphError> {
    let (host, port) = match &cli.command {
        Some(Commands::Serve { host, port }) => (host.clone(), *port),
        _ => (None, None),
    };
    let config =
        AppConfig::load(cli.config.as_deref())?.with_cli(cli.source.clone(), host, port);
    config.validate()?;

    let output = Output {
        json: cli.json_mode,
        verbose: cli.verbose,
    };

    match cli.command {
        Some(Commands::Serve { .. }) => cmd_serve(&config, output).await,
        Some(Commands::Status) | None => cmd_status(&config, output),
        Some(Commands::Symptom { text }) => cmd_symptom(&config, output, &text),
        Some(Commands::Treatments { disease }) => cmd_treatments(&config, output, &disease),
        Some(Commands::Indications { medication }) => {
            cmd_indications(&config, output, &medication)
        }
        Some(Commands::Paths { from, to, depth }) => {
            cmd_paths(&config, output, &from, &to, depth)
        }
        Some(Commands::Subgraph { nodes }) => cmd_subgraph(&config, output, &nodes),
        Some(Commands::Clusters { min }) => cmd_clusters(&config, output, min),
        Some(Commands::Export { output: path }) => cmd_export(&config, output, path.as_deref()),
    }
}
