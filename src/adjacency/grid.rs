use std::collections::{BTreeSet, HashMap};

use geo::Rect;

/// Uniform grid over (lon, lat) used to find candidate pairs without
/// testing every pair of items.
#[derive(Debug, Clone)]
pub struct GridIndex {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl GridIndex {
    /// `cell_size` must be positive and finite
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    fn cell(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    /// Register `item` in every cell its rectangle touches
    pub fn insert(&mut self, item: usize, rect: Rect<f64>) {
        let (min_x, min_y) = self.cell(rect.min().x, rect.min().y);
        let (max_x, max_y) = self.cell(rect.max().x, rect.max().y);
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                self.cells.entry((cx, cy)).or_default().push(item);
            }
        }
    }

    /// Every pair of items sharing at least one cell, as (smaller, larger)
    pub fn candidate_pairs(&self) -> BTreeSet<(usize, usize)> {
        let mut pairs = BTreeSet::new();
        for items in self.cells.values() {
            for (n, &a) in items.iter().enumerate() {
                for &b in &items[n + 1..] {
                    if a != b {
                        pairs.insert((a.min(b), a.max(b)));
                    }
                }
            }
        }
        pairs
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect<f64> {
        Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 })
    }

    #[test]
    fn test_only_nearby_items_pair_up() {
        let mut grid = GridIndex::new(1.0);
        grid.insert(0, rect(0.1, 0.1, 0.4, 0.4));
        grid.insert(1, rect(0.5, 0.5, 0.9, 0.9));
        grid.insert(2, rect(5.1, 5.1, 5.2, 5.2));

        let pairs = grid.candidate_pairs();
        assert!(pairs.contains(&(0, 1)));
        assert!(!pairs.contains(&(0, 2)));
        assert!(!pairs.contains(&(1, 2)));
    }

    #[test]
    fn test_item_spanning_cells() {
        let mut grid = GridIndex::new(1.0);
        grid.insert(0, rect(0.5, 0.5, 2.5, 0.6));
        grid.insert(1, rect(2.1, 0.1, 2.2, 0.2));

        assert_eq!(grid.cell_count(), 3);
        assert_eq!(grid.candidate_pairs().len(), 1);
    }

    #[test]
    fn test_negative_coordinates() {
        let mut grid = GridIndex::new(0.5);
        grid.insert(0, rect(-0.4, -0.4, -0.1, -0.1));
        grid.insert(1, rect(0.1, 0.1, 0.2, 0.2));
        assert!(grid.candidate_pairs().is_empty());
    }
}
