//! # Path Search
//!
//! Exhaustive, depth-bounded enumeration of simple paths between two nodes.
//!
//! - Follows outgoing edges only
//! - Each returned path is simple: no node id repeats
//! - `max_depth` (counted in edges) is never exceeded
//! - Results sorted by length ascending, then total weight descending
//!
//! The search is exponential in dense graphs. [`PathLimits`] adds a
//! node-expansion budget and an optional deadline on top of the depth bound;
//! when either is hit the search stops and reports `truncated`.

use crate::primitives::DEFAULT_MAX_EXPANSIONS;
use crate::{Edge, Graph, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// How many expansions run between two deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 256;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// One simple path through the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPath {
    /// Node ids from source to target, inclusive.
    pub nodes: Vec<NodeId>,
    /// Edges traversed, one fewer than `nodes`.
    pub edges: Vec<Edge>,
    /// Sum of edge weights.
    pub total_weight: f64,
}

impl GraphPath {
    /// Path length in edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Outcome of a bounded path search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathSearch {
    /// Paths found, sorted.
    pub paths: Vec<GraphPath>,
    /// `true` if the expansion budget or deadline cut the search short.
    pub truncated: bool,
    /// Nodes expanded during the search.
    pub expansions: usize,
}

// =============================================================================
// LIMITS
// =============================================================================

/// Bounds applied to a path search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathLimits {
    /// Maximum path length in edges.
    pub max_depth: usize,
    /// Maximum number of node expansions; `None` for depth-only bounding.
    pub max_expansions: Option<usize>,
    /// Wall-clock budget for the whole search.
    pub timeout: Option<Duration>,
}

impl PathLimits {
    /// Depth bound only.
    #[must_use]
    pub fn depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            max_expansions: None,
            timeout: None,
        }
    }

    /// Depth bound plus the default expansion budget.
    #[must_use]
    pub fn bounded(max_depth: usize) -> Self {
        Self {
            max_depth,
            max_expansions: Some(DEFAULT_MAX_EXPANSIONS),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = Some(max_expansions);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// =============================================================================
// SEARCH
// =============================================================================

/// Enumerate every simple path from `source` to `target` of at most
/// `max_depth` edges.
///
/// Returns an empty list if `source` is not a node of the graph. When
/// `source == target` the single zero-length path is returned.
#[must_use]
pub fn find_paths(graph: &Graph, source: &NodeId, target: &NodeId, max_depth: usize) -> Vec<GraphPath> {
    find_paths_with_limits(graph, source, target, &PathLimits::depth(max_depth)).paths
}

/// Path search under explicit [`PathLimits`].
#[must_use]
pub fn find_paths_with_limits(
    graph: &Graph,
    source: &NodeId,
    target: &NodeId,
    limits: &PathLimits,
) -> PathSearch {
    if !graph.contains_node(source) {
        return PathSearch::default();
    }

    let mut search = DepthFirst {
        graph,
        target,
        limits,
        deadline: limits.timeout.map(|t| Instant::now() + t),
        visited: BTreeSet::new(),
        node_stack: Vec::new(),
        edge_stack: Vec::new(),
        frames: Vec::new(),
        found: Vec::new(),
        expansions: 0,
        truncated: false,
    };
    search.run(source);

    let mut paths = search.found;
    // Stable sort: equal (length, weight) keep discovery order.
    paths.sort_by(|a, b| {
        a.len()
            .cmp(&b.len())
            .then_with(|| b.total_weight.total_cmp(&a.total_weight))
    });

    if search.truncated {
        tracing::warn!(
            source = %source,
            target = %target,
            expansions = search.expansions,
            "path search truncated by limits"
        );
    }

    PathSearch {
        paths,
        truncated: search.truncated,
        expansions: search.expansions,
    }
}

/// Outgoing edges of one node on the current path, and the next to try.
struct Frame<'g> {
    edges: Vec<&'g Edge>,
    next: usize,
}

/// Iterative DFS state.
///
/// `frames` replaces the call stack, so search depth is bounded by heap
/// rather than thread stack. `visited`, `node_stack` and `edge_stack` are
/// pushed in `enter` and popped in `leave`, so sibling branches never see
/// each other's state; `edge_stack` is always one shorter than
/// `node_stack`.
struct DepthFirst<'g> {
    graph: &'g Graph,
    target: &'g NodeId,
    limits: &'g PathLimits,
    deadline: Option<Instant>,
    visited: BTreeSet<&'g NodeId>,
    node_stack: Vec<&'g NodeId>,
    edge_stack: Vec<&'g Edge>,
    frames: Vec<Frame<'g>>,
    found: Vec<GraphPath>,
    expansions: usize,
    truncated: bool,
}

impl<'g> DepthFirst<'g> {
    fn run(&mut self, source: &'g NodeId) {
        self.enter(source);

        while !self.truncated {
            let Some(frame) = self.frames.last_mut() else {
                break;
            };
            let next = frame.edges.get(frame.next).copied();
            frame.next += 1;

            match next {
                Some(edge) if self.visited.contains(&edge.target) => {}
                Some(edge) => {
                    self.edge_stack.push(edge);
                    self.enter(&edge.target);
                }
                None => {
                    self.frames.pop();
                    self.leave();
                }
            }
        }
    }

    /// Step onto `node`: record it if it is the target, otherwise open a
    /// frame over its outgoing edges when depth and budget allow.
    fn enter(&mut self, node: &'g NodeId) {
        self.visited.insert(node);
        self.node_stack.push(node);

        if node == self.target {
            self.record();
            self.leave();
        } else if self.edge_stack.len() < self.limits.max_depth && self.try_expand() {
            let graph = self.graph;
            self.frames.push(Frame {
                edges: graph.outgoing(node).collect(),
                next: 0,
            });
        } else {
            self.leave();
        }
    }

    /// Step back off the last node of the current path.
    fn leave(&mut self) {
        if let Some(node) = self.node_stack.pop() {
            self.visited.remove(node);
        }
        self.edge_stack.pop();
    }

    /// Account for one expansion; returns `false` once a limit is exceeded.
    fn try_expand(&mut self) -> bool {
        if self
            .limits
            .max_expansions
            .is_some_and(|max| self.expansions >= max)
        {
            self.truncated = true;
            return false;
        }

        self.expansions += 1;

        if let Some(deadline) = self.deadline {
            if self.expansions % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                self.truncated = true;
                return false;
            }
        }
        true
    }

    fn record(&mut self) {
        let edges: Vec<Edge> = self.edge_stack.iter().map(|e| (*e).clone()).collect();
        let total_weight = edges.iter().map(|e| e.weight.value()).sum();
        self.found.push(GraphPath {
            nodes: self.node_stack.iter().map(|n| (*n).clone()).collect(),
            edges,
            total_weight,
        });
    }
}

// =============================================================================
// TESTS
// =============================================================================
