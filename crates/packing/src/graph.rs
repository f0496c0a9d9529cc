//! Undirected graph instances and the standard packing rows derived from them.
//!
//! - Reads the DIMACS-like edge format: `p edge <n> <m>` declares the node
//!   count, `e <u> <v> [<w>]` a 1-indexed edge with optional weight (default 1).
//!   Other lines are ignored, and lines may come in any order.
//! - Stores nodes 0-indexed and every edge as `(min, max)`.
//! - Builds degree rows (matching), edge rows (stable set), complement edges
//!   and the inner-ball radius of the standard simplex.

use std::fmt;
use std::path::Path;

use nalgebra::DVector;

#[derive(Debug)]
pub enum GraphError {
    Io(std::io::Error),
    Malformed { line: usize, reason: String },
    NodeOutOfRange { line: usize, node: usize, num_nodes: usize },
    SelfLoop { line: usize, node: usize },
    MissingHeader,
}

impl GraphError {
    fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "reading instance failed: {err}"),
            Self::Malformed { line, reason } => write!(f, "line {line}: {reason}"),
            Self::NodeOutOfRange {
                line,
                node,
                num_nodes,
            } => write!(f, "line {line}: node {node} outside 1..={num_nodes}"),
            Self::SelfLoop { line, node } => write!(f, "line {line}: self loop at node {node}"),
            Self::MissingHeader => write!(f, "missing `p edge <nodes> <edges>` line"),
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GraphError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// How objective coefficients are assigned to an instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Weighting {
    /// Edge weights from the file (matching); unit node weights (stable set).
    #[default]
    Instance,
    /// `deg(u) + deg(v)` per edge (matching); `deg(v)` per node (stable set).
    Degree,
}

/// Simple undirected graph with weighted edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    num_nodes: usize,
    edges: Vec<(usize, usize)>,
    weights: Vec<f64>,
}

impl Graph {
    /// Build from 0-indexed edges; endpoints are normalized to `(min, max)`.
    ///
    /// Panics on a self loop, an endpoint `>= num_nodes` or a weight count that
    /// differs from the edge count. Use `from_dimacs_str` for untrusted input.
    pub fn new(num_nodes: usize, edges: &[(usize, usize)], weights: Option<&[f64]>) -> Self {
        let edges: Vec<_> = edges.iter().map(|&(u, v)| (u.min(v), u.max(v))).collect();
        let weights = match weights {
            Some(w) => w.to_vec(),
            None => vec![1.0; edges.len()],
        };
        assert_eq!(edges.len(), weights.len(), "one weight per edge");
        assert!(
            edges.iter().all(|&(u, v)| u != v && v < num_nodes),
            "edges must join two distinct nodes below {num_nodes}"
        );
        Self {
            num_nodes,
            edges,
            weights,
        }
    }

    pub fn read_dimacs(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_dimacs_str(&text)
    }

    pub fn from_dimacs_str(text: &str) -> Result<Self, GraphError> {
        let mut num_nodes: Option<usize> = None;
        // (line, u, v) kept 1-indexed until the header is known.
        let mut raw: Vec<(usize, usize, usize)> = Vec::new();
        let mut weights = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let lineno = idx + 1;
            let mut tok = line.split_whitespace();
            match tok.next() {
                Some("p") => {
                    let _format = tok.next();
                    let n = tok
                        .next()
                        .ok_or_else(|| GraphError::malformed(lineno, "header lacks node count"))?;
                    num_nodes = Some(parse_index(n, lineno)?);
                }
                Some("e") => {
                    let u = tok
                        .next()
                        .ok_or_else(|| GraphError::malformed(lineno, "edge lacks endpoints"))?;
                    let v = tok
                        .next()
                        .ok_or_else(|| GraphError::malformed(lineno, "edge lacks endpoint"))?;
                    let w = match tok.next() {
                        Some(w) => w.parse::<f64>().map_err(|_| {
                            GraphError::malformed(lineno, format!("bad weight `{w}`"))
                        })?,
                        None => 1.0,
                    };
                    raw.push((lineno, parse_index(u, lineno)?, parse_index(v, lineno)?));
                    weights.push(w);
                }
                _ => {}
            }
        }
        let num_nodes = num_nodes.ok_or(GraphError::MissingHeader)?;
        let mut edges = Vec::with_capacity(raw.len());
        for (line, u, v) in raw {
            for node in [u, v] {
                if node == 0 || node > num_nodes {
                    return Err(GraphError::NodeOutOfRange {
                        line,
                        node,
                        num_nodes,
                    });
                }
            }
            if u == v {
                return Err(GraphError::SelfLoop { line, node: u });
            }
            edges.push((u.min(v) - 1, u.max(v) - 1));
        }
        Ok(Self {
            num_nodes,
            edges,
            weights,
        })
    }

    /// DIMACS text that `from_dimacs_str` reads back unchanged.
    pub fn to_dimacs(&self) -> String {
        let mut out = format!("p edge {} {}\n", self.num_nodes, self.edges.len());
        for (&(u, v), w) in self.edges.iter().zip(&self.weights) {
            out.push_str(&format!("e {} {} {w}\n", u + 1, v + 1));
        }
        out
    }

    pub fn write_dimacs(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        std::fs::write(path, self.to_dimacs())?;
        Ok(())
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn degrees(&self) -> Vec<usize> {
        let mut deg = vec![0; self.num_nodes];
        for &(u, v) in &self.edges {
            deg[u] += 1;
            deg[v] += 1;
        }
        deg
    }

    /// Indices of the edges incident to `node`.
    pub fn incident_edges(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(move |&(_, &(u, v))| u == node || v == node)
            .map(|(k, _)| k)
    }

    /// Objective over edges for the matching family.
    pub fn edge_objective(&self, weighting: Weighting) -> DVector<f64> {
        match weighting {
            Weighting::Instance => DVector::from_column_slice(&self.weights),
            Weighting::Degree => {
                let deg = self.degrees();
                DVector::from_iterator(
                    self.edges.len(),
                    self.edges.iter().map(|&(u, v)| (deg[u] + deg[v]) as f64),
                )
            }
        }
    }

    /// Objective over nodes for the stable-set family.
    pub fn node_objective(&self, weighting: Weighting) -> DVector<f64> {
        match weighting {
            Weighting::Instance => DVector::from_element(self.num_nodes, 1.0),
            Weighting::Degree => {
                DVector::from_iterator(self.num_nodes, self.degrees().into_iter().map(|d| d as f64))
            }
        }
    }

    /// One row per node: indicator of its incident edges (`Σ_{e∋v} x_e <= 1`).
    pub fn degree_rows(&self) -> Vec<DVector<f64>> {
        (0..self.num_nodes).map(|v| self.degree_row(v)).collect()
    }

    pub fn degree_row(&self, node: usize) -> DVector<f64> {
        let mut row = DVector::zeros(self.edges.len());
        for k in self.incident_edges(node) {
            row[k] = 1.0;
        }
        row
    }

    /// One row per edge over the nodes (`x_u + x_v <= 1`).
    pub fn edge_rows(&self) -> Vec<DVector<f64>> {
        self.edges
            .iter()
            .map(|&(u, v)| {
                let mut row = DVector::zeros(self.num_nodes);
                row[u] = 1.0;
                row[v] = 1.0;
                row
            })
            .collect()
    }

    /// Node pairs `(u, v)`, `u < v`, that are not joined by an edge.
    pub fn complement_edges(&self) -> Vec<(usize, usize)> {
        let n = self.num_nodes;
        let mut adjacent = vec![false; n * n];
        for &(u, v) in &self.edges {
            adjacent[u * n + v] = true;
        }
        (0..n)
            .flat_map(|u| (u + 1..n).map(move |v| (u, v)))
            .filter(|&(u, v)| !adjacent[u * n + v])
            .collect()
    }
}

fn parse_index(tok: &str, line: usize) -> Result<usize, GraphError> {
    tok.parse::<usize>()
        .map_err(|_| GraphError::malformed(line, format!("bad integer `{tok}`")))
}

/// Radius of the ball inscribed in the standard simplex of dimension `dim`.
pub fn inner_radius_simplex(dim: usize) -> f64 {
    1.0 / (dim as f64).sqrt()
}
