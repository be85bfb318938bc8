//! Ring reconstruction from unordered, arbitrarily oriented segments.
//!
//! Segments are point-id sequences. Only shared endpoint ids tell which
//! segment continues which, so the chainer keeps an endpoint index
//! (`PointId -> segments ending there`) and walks it like a graph.

use std::collections::HashMap;

use crate::domain::PointId;

/// Result of chaining one role's segments
#[derive(Debug, Default, PartialEq)]
pub struct Chains {
    /// Closed rings, first id repeated at the end
    pub rings: Vec<Vec<PointId>>,
    /// Chains that could not be closed
    pub open: Vec<Vec<PointId>>,
}

/// Merge segments into closed rings.
///
/// Segments that are already closed become rings on their own. The rest
/// are chained: start from any unused segment and keep appending an unused
/// segment that starts or ends at the chain's open end, reversing it when
/// it ends there. When the tail cannot be extended the chain is flipped
/// once and grown from its other end before being reported as open.
///
/// A chain that comes back to any id it already passed through closes the
/// loop from that id, so rings touching at a single vertex come out as
/// separate rings.
pub fn chain_rings(segments: &[&[PointId]]) -> Chains {
    let mut chains = Chains::default();
    let mut endpoints: HashMap<PointId, Vec<usize>> = HashMap::new();
    let mut used = vec![false; segments.len()];

    for (i, segment) in segments.iter().enumerate() {
        let (Some(&first), Some(&last)) = (segment.first(), segment.last()) else {
            used[i] = true;
            continue;
        };
        if segment.len() < 2 {
            used[i] = true;
            continue;
        }
        if first == last {
            chains.rings.push(segment.to_vec());
            used[i] = true;
            continue;
        }
        endpoints.entry(first).or_default().push(i);
        endpoints.entry(last).or_default().push(i);
    }

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;

        let mut walk = Walk::default();
        walk.extend(segments[start].iter().copied(), &mut chains.rings);
        let mut flipped = false;

        loop {
            let Some(end) = walk.end() else {
                break;
            };
            let next = endpoints
                .get(&end)
                .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));

            match next {
                Some(i) => {
                    used[i] = true;
                    walk.extend(oriented(segments[i], end), &mut chains.rings);
                }
                // everything walked so far went into rings
                None if walk.chain.len() < 2 => break,
                None if !flipped => {
                    flipped = true;
                    walk.reverse();
                }
                None => {
                    chains.open.push(walk.chain);
                    break;
                }
            }
        }
    }

    chains
}

/// Chain under construction, with the position of every id on it
#[derive(Debug, Default)]
struct Walk {
    chain: Vec<PointId>,
    positions: HashMap<PointId, usize>,
}

impl Walk {
    fn end(&self) -> Option<PointId> {
        self.chain.last().copied()
    }

    /// Append ids one at a time. An id already on the chain cuts the loop
    /// starting there off into `rings`; the walk goes on from that id.
    fn extend(&mut self, ids: impl IntoIterator<Item = PointId>, rings: &mut Vec<Vec<PointId>>) {
        for id in ids {
            match self.positions.get(&id) {
                Some(&at) => {
                    let mut ring = self.chain.split_off(at);
                    for dropped in &ring[1..] {
                        self.positions.remove(dropped);
                    }
                    ring.push(id);
                    self.chain.push(id);
                    rings.push(ring);
                }
                None => {
                    self.positions.insert(id, self.chain.len());
                    self.chain.push(id);
                }
            }
        }
    }

    fn reverse(&mut self) {
        self.chain.reverse();
        self.positions = self
            .chain
            .iter()
            .enumerate()
            .map(|(at, &id)| (id, at))
            .collect();
    }
}

/// Ids of `segment` after the shared endpoint `end`, in walking order
fn oriented(segment: &[PointId], end: PointId) -> Vec<PointId> {
    if segment.first() == Some(&end) {
        segment[1..].to_vec()
    } else {
        segment.iter().rev().skip(1).copied().collect()
    }
}
