#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Breadth-first next-hop steering for ground enemies.

use std::collections::VecDeque;

use glam::Vec2;
use hordefall_core::{CellCoord, Tile, TileMapView};

/// Computes fresh single-step movement targets over the open tiles of a map.
///
/// Nothing is cached between queries; the buffers are only reused to avoid
/// reallocating them every frame.
#[derive(Clone, Debug, Default)]
pub struct Pathfinder {
    visited: Vec<bool>,
    predecessors: Vec<usize>,
    frontier: VecDeque<usize>,
}

impl Pathfinder {
    /// Creates a pathfinder with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point a ground enemy at `from` should steer towards to approach `to`.
    ///
    /// Returns `to` unchanged when both points share a tile, the centre of the
    /// next tile on a shortest 4-connected path when one exists, and `to`
    /// clamped one tile inside the border ring when it does not.
    pub fn next_step_target(&mut self, map: TileMapView<'_>, from: Vec2, to: Vec2) -> Vec2 {
        let from_cell = map.clamped_cell(from);
        let to_cell = map.clamped_cell(to);
        if from_cell == to_cell {
            return to;
        }

        let inner = map.size().saturating_sub(2).max(2) as f32;
        let fallback = to.clamp(Vec2::splat(2.0), Vec2::splat(inner));
        let (Some(source), Some(target)) = (snap(map, from_cell), snap(map, to_cell)) else {
            return fallback;
        };
        if source == target {
            return to;
        }

        match self.search(map, source, target) {
            Some(next) => next.center(),
            None => fallback,
        }
    }

    fn search(
        &mut self,
        map: TileMapView<'_>,
        source: CellCoord,
        target: CellCoord,
    ) -> Option<CellCoord> {
        let cell_count = map.size() as usize * map.size() as usize;
        self.visited.clear();
        self.visited.resize(cell_count, false);
        self.predecessors.clear();
        self.predecessors.resize(cell_count, usize::MAX);
        self.frontier.clear();

        let source_index = map.index(source)?;
        let target_index = map.index(target)?;
        self.visited[source_index] = true;
        self.frontier.push_back(source_index);

        while let Some(current) = self.frontier.pop_front() {
            for neighbor in neighbors(map.cell_at(current), map.size()) {
                let Some(neighbor_index) = map.index(neighbor) else {
                    continue;
                };
                if self.visited[neighbor_index] {
                    continue;
                }
                self.visited[neighbor_index] = true;
                if map.tile(neighbor) != Some(Tile::Empty) {
                    continue;
                }
                self.predecessors[neighbor_index] = current;
                if neighbor_index == target_index {
                    return Some(self.first_hop(map, source_index, target_index));
                }
                self.frontier.push_back(neighbor_index);
            }
        }

        None
    }

    fn first_hop(&self, map: TileMapView<'_>, source: usize, target: usize) -> CellCoord {
        let mut hop = target;
        while self.predecessors[hop] != source {
            debug_assert_ne!(self.predecessors[hop], usize::MAX);
            hop = self.predecessors[hop];
        }
        map.cell_at(hop)
    }
}

/// Nearest open interior cell around `cell`, scanning an expanding square spiral.
fn snap(map: TileMapView<'_>, cell: CellCoord) -> Option<CellCoord> {
    if map.tile(cell) == Some(Tile::Empty) {
        return Some(cell);
    }

    let size = i64::from(map.size());
    let span = 2 * size + 1;
    Spiral::default()
        .take((span * span) as usize)
        .filter_map(|(dx, dy)| {
            let column = i64::from(cell.column()) + dx;
            let row = i64::from(cell.row()) + dy;
            let interior = (1..size - 1).contains(&column) && (1..size - 1).contains(&row);
            interior.then(|| CellCoord::new(column as u32, row as u32))
        })
        .find(|candidate| map.tile(*candidate) == Some(Tile::Empty))
}

/// Offsets of a square spiral around the origin, turning left at each corner.
#[derive(Clone, Copy, Debug)]
struct Spiral {
    offset: (i64, i64),
    delta: (i64, i64),
}

impl Default for Spiral {
    fn default() -> Self {
        Self {
            offset: (0, 0),
            delta: (0, -1),
        }
    }
}

impl Iterator for Spiral {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        let (x, y) = self.offset;
        if x == y || (x < 0 && x == -y) || (x > 0 && x == 1 - y) {
            self.delta = (-self.delta.1, self.delta.0);
        }
        self.offset = (x + self.delta.0, y + self.delta.1);
        Some(self.offset)
    }
}

fn neighbors(cell: CellCoord, size: u32) -> impl Iterator<Item = CellCoord> {
    let column = cell.column();
    let row = cell.row();
    let left = column.checked_sub(1).map(|c| CellCoord::new(c, row));
    let right = (column + 1 < size).then(|| CellCoord::new(column + 1, row));
    let up = row.checked_sub(1).map(|r| CellCoord::new(column, r));
    let down = (row + 1 < size).then(|| CellCoord::new(column, row + 1));
    [left, right, up, down].into_iter().flatten()
}
