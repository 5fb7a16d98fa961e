//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command builds the graph from the configured source first; there
//! is no persisted state between invocations.

use crate::api;
use crate::config::AppConfig;
use medgraph_core::{
    BuildReport, Catalog, Graph, GraphBuilder, GraphMetrics, GraphPath, MedGraphError, NodeId,
    Related, export_document, find_comorbidity_clusters, find_diseases_by_symptom,
    find_diseases_for_medication, find_medications_for_disease, find_paths_with_limits,
    get_subgraph,
    primitives::{MAX_PATH_DEPTH, MAX_SUBGRAPH_NODES},
    write_document,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum catalog file size (100 MB).
const MAX_SOURCE_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), MedGraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| MedGraphError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(MedGraphError::Source(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, MedGraphError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        MedGraphError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(MedGraphError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| MedGraphError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// GRAPH LOADING
// =============================================================================

/// Build a graph from a catalog file. Without a source the graph is empty.
pub fn load_graph(source: Option<&Path>) -> Result<(Graph, BuildReport), MedGraphError> {
    let Some(path) = source else {
        tracing::warn!("No entity source configured, using an empty graph");
        return Ok((Graph::new(), BuildReport::default()));
    };

    validate_file_size(path, MAX_SOURCE_FILE_SIZE)?;
    let catalog = Catalog::load(path)?;
    tracing::info!(source = %path.display(), "building graph from catalog");
    Ok(GraphBuilder::new().build(&catalog))
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Output options shared by all commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Emit JSON instead of text.
    pub json: bool,
    /// Report skipped records.
    pub verbose: bool,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), MedGraphError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| MedGraphError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

/// Load the configured graph, reporting skipped records when verbose.
fn load(config: &AppConfig, output: Output) -> Result<Graph, MedGraphError> {
    let (graph, report) = load_graph(config.source.as_deref())?;
    if output.verbose && report.skipped() > 0 {
        eprintln!("Build report:");
        eprintln!("  Undecodable records:      {}", report.rejected_records);
        eprintln!("  Diseases without id:      {}", report.skipped_diseases);
        eprintln!("  Medications without id:   {}", report.skipped_medications);
        eprintln!("  Empty labels:             {}", report.skipped_labels);
        eprintln!("  Unresolved interactions:  {}", report.unresolved_interactions);
        eprintln!("  Empty gene annotations:   {}", report.skipped_annotations);
    }
    Ok(graph)
}

fn print_related(title: &str, result: &Related, output: Output) -> Result<(), MedGraphError> {
    if output.json {
        return print_json(result);
    }

    match &result.anchor {
        Some(anchor) => println!("{} {} ({})", title, anchor.label, anchor.id),
        None if result.edges.is_empty() => {
            println!("{}: not found", title);
            return Ok(());
        }
        None => println!("{} (no record)", title),
    }
    println!();

    for edge in &result.edges {
        let other = if result.anchor.as_ref().is_some_and(|a| a.id == edge.source) {
            &edge.target
        } else {
            &edge.source
        };
        let label = result
            .related
            .iter()
            .find(|n| &n.id == other)
            .map(|n| n.label.as_str())
            .unwrap_or("(no record)");
        println!("  {:<40} {:<10} {:.2}", other, label, edge.weight.value());
    }
    println!();
    println!("{} related, {} edges", result.related.len(), result.edges.len());
    Ok(())
}

fn format_path(path: &GraphPath) -> String {
    let mut text = path.nodes.first().map(ToString::to_string).unwrap_or_default();
    for (edge, node) in path.edges.iter().zip(path.nodes.iter().skip(1)) {
        text.push_str(&format!(" -[{} {:.2}]-> {}", edge.kind, edge.weight.value(), node));
    }
    text
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(config: &AppConfig, output: Output) -> Result<(), MedGraphError> {
    let graph = load(config, output)?;

    if !output.json {
        println!("MedGraph Server Starting...");
        println!();
        println!("Configuration:");
        println!("  Address:  {}", config.bind_addr());
        match &config.source {
            Some(source) => println!("  Source:   {}", source.display()),
            None => println!("  Source:   (none)"),
        }
        println!("  Nodes:    {}", graph.node_count());
        println!("  Edges:    {}", graph.edge_count());
        println!();
        println!("Endpoints:");
        println!("  GET  /health - Health check");
        println!("  GET  /status - Snapshot status");
        println!("  POST /query  - Execute a query");
        println!("  GET  /export - Export graph document");
        println!("  POST /reload - Rebuild from source");
        println!();
        println!("Press Ctrl+C to stop");
        println!();
    }

    api::run_server(config, graph).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show graph metrics.
pub fn cmd_status(config: &AppConfig, output: Output) -> Result<(), MedGraphError> {
    let graph = load(config, output)?;
    let metrics = GraphMetrics::from_graph(&graph);

    if output.json {
        return print_json(&metrics);
    }

    println!("MedGraph Status");
    println!("===============");
    match &config.source {
        Some(source) => println!("Source: {}", source.display()),
        None => println!("Source: (none)"),
    }
    println!();
    println!("Nodes:          {}", metrics.node_count);
    for (kind, count) in &metrics.nodes_by_kind {
        println!("  {:<18} {}", kind.as_str(), count);
    }
    println!("Edges:          {}", metrics.edge_count);
    for (kind, count) in &metrics.edges_by_kind {
        println!("  {:<18} {}", kind.as_str(), count);
    }
    println!("Dangling Edges: {}", metrics.dangling_edges);

    Ok(())
}

// =============================================================================
// RELATIONSHIP COMMANDS
// =============================================================================

/// Diseases causing a symptom.
pub fn cmd_symptom(config: &AppConfig, output: Output, text: &str) -> Result<(), MedGraphError> {
    let graph = load(config, output)?;
    print_related("Symptom", &find_diseases_by_symptom(&graph, text), output)
}

/// Medications treating a disease.
pub fn cmd_treatments(
    config: &AppConfig,
    output: Output,
    disease: &str,
) -> Result<(), MedGraphError> {
    let graph = load(config, output)?;
    print_related("Disease", &find_medications_for_disease(&graph, disease), output)
}

/// Diseases a medication treats.
pub fn cmd_indications(
    config: &AppConfig,
    output: Output,
    medication: &str,
) -> Result<(), MedGraphError> {
    let graph = load(config, output)?;
    print_related(
        "Medication",
        &find_diseases_for_medication(&graph, medication),
        output,
    )
}

// =============================================================================
// PATHS COMMAND
// =============================================================================

/// Simple paths between two nodes.
pub fn cmd_paths(
    config: &AppConfig,
    output: Output,
    from: &str,
    to: &str,
    depth: Option<usize>,
) -> Result<(), MedGraphError> {
    let depth = depth.unwrap_or(config.paths.max_depth);
    if depth > MAX_PATH_DEPTH {
        return Err(MedGraphError::InvalidQuery(format!(
            "Depth {} exceeds maximum {}",
            depth, MAX_PATH_DEPTH
        )));
    }

    let graph = load(config, output)?;
    let limits = config.paths.limits(depth, None);
    let search = find_paths_with_limits(&graph, &NodeId::from(from), &NodeId::from(to), &limits);

    if output.json {
        return print_json(&search);
    }

    if search.paths.is_empty() {
        println!("No paths from {} to {} within {} edges", from, to, depth);
    }
    for (i, path) in search.paths.iter().enumerate() {
        println!("{:>3}. [{:.2}] {}", i + 1, path.total_weight, format_path(path));
    }
    if search.truncated {
        println!();
        println!("Search truncated after {} expansions", search.expansions);
    }
    Ok(())
}

// =============================================================================
// SUBGRAPH COMMAND
// =============================================================================

/// Node-induced subgraph over comma-separated ids.
pub fn cmd_subgraph(config: &AppConfig, output: Output, nodes: &str) -> Result<(), MedGraphError> {
    let ids: Vec<NodeId> = nodes
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(NodeId::from)
        .collect();

    if ids.is_empty() {
        return Err(MedGraphError::InvalidQuery("No node ids given".to_string()));
    }
    if ids.len() > MAX_SUBGRAPH_NODES {
        return Err(MedGraphError::InvalidQuery(format!(
            "Subgraph of {} nodes exceeds maximum {}",
            ids.len(),
            MAX_SUBGRAPH_NODES
        )));
    }

    let graph = load(config, output)?;
    let sub = get_subgraph(&graph, &ids);

    if output.json {
        return print_json(&medgraph_core::GraphDocument::from_graph(&sub));
    }

    println!("Nodes ({}):", sub.node_count());
    for node in sub.nodes() {
        println!("  {:<40} {}", node.id, node.label);
    }
    println!("Edges ({}):", sub.edge_count());
    for edge in sub.edges() {
        println!(
            "  {} -[{} {:.2}]-> {}",
            edge.source,
            edge.kind,
            edge.weight.value(),
            edge.target
        );
    }
    Ok(())
}

// =============================================================================
// CLUSTERS COMMAND
// =============================================================================

/// Comorbidity clusters.
pub fn cmd_clusters(config: &AppConfig, output: Output, min: usize) -> Result<(), MedGraphError> {
    let graph = load(config, output)?;
    let clusters = find_comorbidity_clusters(&graph, min)?;

    if output.json {
        return print_json(&clusters);
    }
    for cluster in &clusters {
        let names: Vec<&str> = cluster.diseases.iter().map(NodeId::as_str).collect();
        println!("{} ({})", names.join(", "), cluster.co_occurrences);
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the graph as a JSON document, to a file or stdout.
pub fn cmd_export(
    config: &AppConfig,
    output: Output,
    path: Option<&Path>,
) -> Result<(), MedGraphError> {
    let graph = load(config, output)?;

    match path {
        Some(path) => {
            let target = validate_output_path(path)?;
            write_document(&graph, &target)?;
            if !output.json {
                println!(
                    "Exported {} nodes and {} edges to {}",
                    graph.node_count(),
                    graph.edge_count(),
                    target.display()
                );
            }
        }
        None => println!("{}", export_document(&graph)?),
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
