//! Greedy multi-trial colouring of the building adjacency graph.
//!
//! A single greedy pass can get stuck when the palette is small, so the
//! engine runs several independently seeded trials and keeps the one
//! with the fewest conflict edges.

use std::collections::BTreeMap;

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::adjacency::AdjacencyGraph;
use crate::domain::FeatureId;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ColouringError {
    #[error("palette has no colours")]
    EmptyPalette,
    #[error("at least one colouring trial is required")]
    NoTrials,
}

/// How a node picks among the colours its neighbours leave free
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ColourStrategy {
    /// Lowest free palette index
    #[default]
    FirstFit,
    /// Uniformly random free index
    RandomAvailable,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColouringConfig {
    pub trials: usize,
    pub seed: u64,
    pub strategy: ColourStrategy,
    pub parallel: bool,
}

impl Default for ColouringConfig {
    fn default() -> Self {
        Self {
            trials: 50,
            seed: 0,
            strategy: ColourStrategy::default(),
            parallel: true,
        }
    }
}

/// Palette index per building plus the number of conflict edges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColourAssignment {
    pub colours: BTreeMap<FeatureId, usize>,
    pub conflicts: usize,
    /// Index of the trial that produced this assignment
    pub trial: usize,
}

impl ColourAssignment {
    pub fn colour_of(&self, id: FeatureId) -> Option<usize> {
        self.colours.get(&id).copied()
    }
}

/// Graph relabelled to dense indices so trials work on plain vectors
struct DenseGraph {
    ids: Vec<FeatureId>,
    neighbours: Vec<Vec<usize>>,
}

impl DenseGraph {
    fn new(graph: &AdjacencyGraph) -> Self {
        let ids: Vec<FeatureId> = graph.nodes().collect();
        let index: BTreeMap<FeatureId, usize> =
            ids.iter().enumerate().map(|(n, &id)| (id, n)).collect();
        let neighbours = ids
            .iter()
            .map(|&id| graph.neighbours(id).map(|v| index[&v]).collect())
            .collect();
        Self { ids, neighbours }
    }

    fn conflicts(&self, colours: &[usize]) -> usize {
        self.neighbours
            .iter()
            .enumerate()
            .map(|(u, ns)| {
                ns.iter()
                    .filter(|&&v| u < v && colours[u] == colours[v])
                    .count()
            })
            .sum()
    }
}

/// Seed of trial `trial`, independent of how many trials run
fn trial_seed(seed: u64, trial: usize) -> u64 {
    seed ^ (trial as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn colour_pass(
    graph: &DenseGraph,
    palette_size: usize,
    strategy: ColourStrategy,
    rng: &mut StdRng,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..graph.ids.len()).collect();
    order.shuffle(rng);
    // stable, so the shuffle decides between equal degrees
    order.sort_by_key(|&u| std::cmp::Reverse(graph.neighbours[u].len()));

    let mut colours: Vec<Option<usize>> = vec![None; graph.ids.len()];
    let mut taken = vec![false; palette_size];
    for u in order {
        taken.fill(false);
        for &v in &graph.neighbours[u] {
            if let Some(c) = colours[v] {
                taken[c] = true;
            }
        }

        let mut free = (0..palette_size).filter(|&c| !taken[c]);
        let pick = match strategy {
            ColourStrategy::FirstFit => free.next(),
            ColourStrategy::RandomAvailable => free.choose(rng),
        };
        colours[u] = Some(pick.unwrap_or_else(|| rng.random_range(0..palette_size)));
    }

    colours.into_iter().map(|c| c.unwrap_or(0)).collect()
}

fn run_dense_trial(
    graph: &DenseGraph,
    palette_size: usize,
    strategy: ColourStrategy,
    seed: u64,
    trial: usize,
) -> ColourAssignment {
    let mut rng = StdRng::seed_from_u64(trial_seed(seed, trial));
    let colours = colour_pass(graph, palette_size, strategy, &mut rng);
    let conflicts = graph.conflicts(&colours);
    debug!("colouring trial {trial}: {conflicts} conflicts");

    ColourAssignment {
        colours: graph.ids.iter().copied().zip(colours).collect(),
        conflicts,
        trial,
    }
}

/// One greedy colouring pass, seeded as trial `trial` of `seed`
pub fn run_trial(
    graph: &AdjacencyGraph,
    palette_size: usize,
    strategy: ColourStrategy,
    seed: u64,
    trial: usize,
) -> Result<ColourAssignment, ColouringError> {
    if palette_size == 0 {
        return Err(ColouringError::EmptyPalette);
    }
    let dense = DenseGraph::new(graph);
    Ok(run_dense_trial(&dense, palette_size, strategy, seed, trial))
}

/// Number of edges whose endpoints share a colour. Uncoloured nodes never
/// conflict.
pub fn count_conflicts(graph: &AdjacencyGraph, colours: &BTreeMap<FeatureId, usize>) -> usize {
    graph
        .edges()
        .filter(|(u, v)| match (colours.get(u), colours.get(v)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        })
        .count()
}

/// Colour every node with one of `palette_size` colours, keeping the best
/// of `config.trials` trials.
///
/// The best trial has the fewest conflicts, ties going to the lowest
/// trial index, so parallel and sequential runs return the same
/// assignment. Sequential runs stop at the first conflict-free trial.
pub fn assign_colours(
    graph: &AdjacencyGraph,
    palette_size: usize,
    config: &ColouringConfig,
) -> Result<ColourAssignment, ColouringError> {
    if palette_size == 0 {
        return Err(ColouringError::EmptyPalette);
    }
    if config.trials == 0 {
        return Err(ColouringError::NoTrials);
    }
    if graph.is_empty() {
        return Ok(ColourAssignment::default());
    }

    let dense = DenseGraph::new(graph);
    let run = |trial| run_dense_trial(&dense, palette_size, config.strategy, config.seed, trial);

    let best = if config.parallel {
        (0..config.trials)
            .into_par_iter()
            .map(run)
            .min_by_key(|a| (a.conflicts, a.trial))
    } else {
        let mut best: Option<ColourAssignment> = None;
        for trial in 0..config.trials {
            let candidate = run(trial);
            let perfect = candidate.conflicts == 0;
            if best.as_ref().is_none_or(|b| candidate.conflicts < b.conflicts) {
                best = Some(candidate);
            }
            if perfect {
                break;
            }
        }
        best
    };

    let best = best.ok_or(ColouringError::NoTrials)?;
    info!(
        "Colouring: {} buildings, {} colours, best trial {} of {} with {} conflicts",
        dense.ids.len(),
        palette_size,
        best.trial,
        config.trials,
        best.conflicts
    );
    Ok(best)
}
