//! Synthetic matching instances built from overlapping odd sets.
//!
//! Purpose
//! - Reproducible benchmark graphs on which odd-set cuts matter.
//!
//! Model
//! - Draw `num_odd_sets` random node subsets of size `odd_set_size` and add
//!   all their internal edges (first occurrence wins, insertion order kept).
//! - Weighted variant: merge nodes into a random laminar family by repeatedly
//!   joining `radix` current sets (odd `radix` keeps every merged set odd).
//!   An edge then weighs `Σ 2 / (|S| - 1)` over merged sets `S` containing
//!   both endpoints, so every set's odd-set inequality is tight-ish.
//! - Determinism: one `StdRng` seeded from `seed`.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::Graph;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    InvalidParams { reason: String },
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParams { reason } => write!(f, "invalid generator params: {reason}"),
        }
    }
}

impl std::error::Error for GeneratorError {}

/// Odd-set instance parameters.
#[derive(Clone, Copy, Debug)]
pub struct OddSetCfg {
    pub num_nodes: usize,
    pub num_odd_sets: usize,
    pub odd_set_size: usize,
    /// Laminar weights instead of unit weights.
    pub weighted: bool,
    /// Sets merged per step of the laminar family.
    pub radix: usize,
}

impl Default for OddSetCfg {
    fn default() -> Self {
        Self {
            num_nodes: 30,
            num_odd_sets: 10,
            odd_set_size: 5,
            weighted: false,
            radix: 3,
        }
    }
}

pub fn generate_odd_set_graph(cfg: &OddSetCfg, seed: u64) -> Result<Graph, GeneratorError> {
    if cfg.odd_set_size < 2 || cfg.odd_set_size > cfg.num_nodes {
        return Err(GeneratorError::InvalidParams {
            reason: format!(
                "odd_set_size {} must lie in 2..={}",
                cfg.odd_set_size, cfg.num_nodes
            ),
        });
    }
    if cfg.radix < 2 {
        return Err(GeneratorError::InvalidParams {
            reason: format!("radix {} must be at least 2", cfg.radix),
        });
    }
    let n = cfg.num_nodes;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut edges: Vec<(usize, usize)> = Vec::new();
    for _ in 0..cfg.num_odd_sets {
        let subset = rand::seq::index::sample(&mut rng, n, cfg.odd_set_size).into_vec();
        for (a, &i) in subset.iter().enumerate() {
            for &j in &subset[a + 1..] {
                let e = (i.min(j), i.max(j));
                if !edges.contains(&e) {
                    edges.push(e);
                }
            }
        }
    }

    let weights = cfg
        .weighted
        .then(|| laminar_weights(n, &edges, cfg.radix, &mut rng));
    Ok(Graph::new(n, &edges, weights.as_deref()))
}

/// Edge weights from a random laminar family of merged node sets.
fn laminar_weights(n: usize, edges: &[(usize, usize)], radix: usize, rng: &mut StdRng) -> Vec<f64> {
    // Tree nodes 0..n are the singletons; merged sets are appended after them.
    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut size: Vec<usize> = vec![1; n];
    let mut open: Vec<usize> = (0..n).collect();
    while open.len() >= radix {
        let id = parent.len();
        parent.push(None);
        let mut merged = 0;
        for _ in 0..radix {
            let child = open.swap_remove(rng.gen_range(0..open.len()));
            parent[child] = Some(id);
            merged += size[child];
        }
        size.push(merged);
        open.push(id);
    }

    let ancestors = |mut v: usize| {
        let mut out = Vec::new();
        while let Some(p) = parent[v] {
            out.push(p);
            v = p;
        }
        out
    };
    edges
        .iter()
        .map(|&(u, v)| {
            let up = ancestors(u);
            ancestors(v)
                .into_iter()
                .filter(|a| up.contains(a))
                .map(|a| 2.0 / (size[a] - 1) as f64)
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_sets_become_cliques() {
        let cfg = OddSetCfg {
            num_nodes: 5,
            num_odd_sets: 1,
            odd_set_size: 5,
            ..OddSetCfg::default()
        };
        let g = generate_odd_set_graph(&cfg, 7).unwrap();
        assert_eq!(g.num_nodes(), 5);
        assert_eq!(g.num_edges(), 10);
        assert!(g.degrees().iter().all(|&d| d == 4));
    }

    #[test]
    fn same_seed_same_graph() {
        let cfg = OddSetCfg {
            weighted: true,
            ..OddSetCfg::default()
        };
        let a = generate_odd_set_graph(&cfg, 11).unwrap();
        let b = generate_odd_set_graph(&cfg, 11).unwrap();
        assert_eq!(a, b);
        assert!(a.num_edges() > 0);
        assert!(a.edges().iter().all(|&(u, v)| u < v && v < cfg.num_nodes));
    }

    #[test]
    fn laminar_weights_on_three_nodes() {
        // One merge of all three nodes: each edge gets 2 / (3 - 1).
        let cfg = OddSetCfg {
            num_nodes: 3,
            num_odd_sets: 1,
            odd_set_size: 3,
            weighted: true,
            radix: 3,
        };
        let g = generate_odd_set_graph(&cfg, 0).unwrap();
        let w = g.edge_objective(crate::graph::Weighting::Instance);
        assert!(w.iter().all(|&x| (x - 1.0).abs() < 1e-12));
    }

    #[test]
    fn rejects_bad_params() {
        let too_big = OddSetCfg {
            num_nodes: 3,
            odd_set_size: 5,
            ..OddSetCfg::default()
        };
        assert!(generate_odd_set_graph(&too_big, 0).is_err());
        let bad_radix = OddSetCfg {
            radix: 1,
            ..OddSetCfg::default()
        };
        assert!(generate_odd_set_graph(&bad_radix, 0).is_err());
    }
}
