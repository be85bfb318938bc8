use std::collections::{BTreeMap, BTreeSet};

use crate::domain::FeatureId;

/// Simple undirected graph over buildings.
///
/// Edges are stored in both endpoints' neighbour sets, so membership is
/// symmetric by construction; self-loops and duplicates are refused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    neighbours: BTreeMap<FeatureId, BTreeSet<FeatureId>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: FeatureId) {
        self.neighbours.entry(id).or_default();
    }

    /// Add the edge u-v. Returns false for self-loops and existing edges.
    pub fn add_edge(&mut self, u: FeatureId, v: FeatureId) -> bool {
        if u == v {
            return false;
        }
        let inserted = self.neighbours.entry(u).or_default().insert(v);
        self.neighbours.entry(v).or_default().insert(u);
        inserted
    }

    pub fn contains_edge(&self, u: FeatureId, v: FeatureId) -> bool {
        self.neighbours.get(&u).is_some_and(|n| n.contains(&v))
    }

    pub fn neighbours(&self, id: FeatureId) -> impl Iterator<Item = FeatureId> + '_ {
        self.neighbours.get(&id).into_iter().flatten().copied()
    }

    pub fn degree(&self, id: FeatureId) -> usize {
        self.neighbours.get(&id).map_or(0, BTreeSet::len)
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.neighbours.keys().copied()
    }

    /// Every edge once, as (smaller id, larger id)
    pub fn edges(&self) -> impl Iterator<Item = (FeatureId, FeatureId)> + '_ {
        self.neighbours
            .iter()
            .flat_map(|(&u, ns)| ns.iter().filter(move |&&v| u < v).map(move |&v| (u, v)))
    }

    pub fn node_count(&self) -> usize {
        self.neighbours.len()
    }

    pub fn edge_count(&self) -> usize {
        self.neighbours.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }
}
