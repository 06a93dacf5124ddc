#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic maze generation for Hordefall waves.
//!
//! Wave zero is an open arena enclosed by the border ring. Every later wave is
//! a maze carved over the lattice of odd cells by a random walk, seeded from
//! the run seed and the wave index so that a wave always produces the same
//! layout within a run.

use hordefall_core::{
    derive_labeled_seed, derive_wave_seed, CellCoord, MapTuning, Tile, TileLayout,
    RNG_STREAM_BORDER, RNG_STREAM_WALL_HEIGHTS,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Half the edge length of the block opened around the maze centre.
const CENTER_BLOCK_REACH: u32 = 2;

/// Pure system producing [`TileLayout`] values for waves.
#[derive(Debug)]
pub struct MapGeneration {
    tuning: MapTuning,
    run_seed: u64,
    stamps: Vec<u32>,
}

impl MapGeneration {
    /// Creates a generator for the provided run seed.
    #[must_use]
    pub fn new(tuning: MapTuning, run_seed: u64) -> Self {
        Self {
            tuning,
            run_seed,
            stamps: Vec::new(),
        }
    }

    /// Edge length of generated layouts.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.tuning.size
    }

    /// Generates the layout of the provided wave.
    #[must_use]
    pub fn generate(&mut self, wave: u32) -> TileLayout {
        let size = self.tuning.size;
        let cells = (size * size) as usize;
        let mut heights = vec![0.0; cells];
        let mut border_rng =
            ChaCha8Rng::seed_from_u64(derive_labeled_seed(self.run_seed, RNG_STREAM_BORDER));
        for (index, height) in heights.iter_mut().enumerate() {
            if is_border(size, index) {
                *height = self.tuning.border_height.at(border_rng.gen());
            }
        }

        if wave == 0 {
            let tiles = (0..cells)
                .map(|index| {
                    if is_border(size, index) {
                        Tile::Wall
                    } else {
                        Tile::Empty
                    }
                })
                .collect();
            return TileLayout::new(size, tiles, heights);
        }

        let wave_seed = derive_wave_seed(self.run_seed, wave);
        let mut rng = ChaCha8Rng::seed_from_u64(wave_seed);
        let mut maze = Maze::walled(size);

        let half = size / 2;
        for _ in 0..self.tuning.seed_holes {
            let column = 1 + 2 * rng.gen_range(0..half);
            let row = 1 + 2 * rng.gen_range(0..half);
            maze.open(CellCoord::new(column, row));
        }

        self.stamps.clear();
        self.stamps.resize(cells, 0);
        for pass in 1..=self.tuning.carve_passes {
            self.carve(&mut maze, pass, wave, &mut rng);
        }

        self.clear_pillars(&mut maze, &mut rng);

        let mut height_rng =
            ChaCha8Rng::seed_from_u64(derive_labeled_seed(wave_seed, RNG_STREAM_WALL_HEIGHTS));
        for (index, height) in heights.iter_mut().enumerate() {
            if !is_border(size, index) && maze.tiles[index] == Tile::Wall {
                *height = self.tuning.wall_height.at(height_rng.gen());
            }
        }

        debug!(wave, seed = wave_seed, "maze generated");
        TileLayout::new(size, maze.tiles, heights)
    }

    fn carve(&mut self, maze: &mut Maze, pass: u32, wave: u32, rng: &mut ChaCha8Rng) {
        let size = maze.size;
        let center = (size / 2) | 1;
        for row in center - CENTER_BLOCK_REACH..=center + CENTER_BLOCK_REACH {
            for column in center - CENTER_BLOCK_REACH..=center + CENTER_BLOCK_REACH {
                self.stamp(maze, CellCoord::new(column, row), pass);
            }
        }

        let mut cursor = CellCoord::new(center, center);
        let mut batches = 0;
        loop {
            for _ in 0..self.tuning.carve_batch {
                let from = cursor;
                cursor = step(cursor, size, rng.gen_range(0..4));
                let index = maze.index(cursor);
                if self.stamps[index] == pass {
                    continue;
                }
                self.stamp(maze, cursor, pass);
                self.stamp(maze, midpoint(from, cursor), pass);
            }
            batches += 1;

            if self.first_unvisited(size, pass).is_none() {
                return;
            }
            if batches >= self.tuning.carve_retry_limit {
                break;
            }
        }

        warn!(wave, pass, batches, "carve walk exhausted, linking remaining cells");
        self.link_remaining(maze, pass);
    }

    /// Connects every unvisited lattice cell to a visited neighbour, sweeping
    /// in row-major order until the lattice is fully visited.
    fn link_remaining(&mut self, maze: &mut Maze, pass: u32) {
        let size = maze.size;
        while self.first_unvisited(size, pass).is_some() {
            let mut linked = false;
            for row in (1..size - 1).step_by(2) {
                for column in (1..size - 1).step_by(2) {
                    let cell = CellCoord::new(column, row);
                    if self.stamps[maze.index(cell)] == pass {
                        continue;
                    }
                    let visited = lattice_neighbors(cell, size)
                        .find(|neighbor| self.stamps[maze.index(*neighbor)] == pass);
                    if let Some(neighbor) = visited {
                        self.stamp(maze, cell, pass);
                        self.stamp(maze, midpoint(cell, neighbor), pass);
                        linked = true;
                    }
                }
            }
            debug_assert!(linked, "lattice sweep made no progress");
            if !linked {
                return;
            }
        }
    }

    fn clear_pillars(&self, maze: &mut Maze, rng: &mut ChaCha8Rng) {
        let size = maze.size;
        for row in (2..size - 1).step_by(2) {
            for column in (2..size - 1).step_by(2) {
                let cell = CellCoord::new(column, row);
                let index = maze.index(cell);
                if maze.tiles[index] != Tile::Wall {
                    continue;
                }
                let isolated = [
                    CellCoord::new(column - 1, row),
                    CellCoord::new(column + 1, row),
                    CellCoord::new(column, row - 1),
                    CellCoord::new(column, row + 1),
                ]
                .into_iter()
                .all(|neighbor| maze.tiles[maze.index(neighbor)] == Tile::Empty);
                if isolated && rng.gen::<f32>() >= self.tuning.pillar_keep_chance {
                    maze.tiles[index] = Tile::Empty;
                }
            }
        }
    }

    fn first_unvisited(&self, size: u32, pass: u32) -> Option<CellCoord> {
        (1..size - 1).step_by(2).find_map(|row| {
            (1..size - 1)
                .step_by(2)
                .map(|column| CellCoord::new(column, row))
                .find(|cell| self.stamps[(cell.row() * size + cell.column()) as usize] != pass)
        })
    }

    fn stamp(&mut self, maze: &mut Maze, cell: CellCoord, pass: u32) {
        let index = maze.index(cell);
        self.stamps[index] = pass;
        maze.open(cell);
    }
}

#[derive(Debug)]
struct Maze {
    size: u32,
    tiles: Vec<Tile>,
}

impl Maze {
    fn walled(size: u32) -> Self {
        Self {
            size,
            tiles: vec![Tile::Wall; (size * size) as usize],
        }
    }

    fn index(&self, cell: CellCoord) -> usize {
        (cell.row() * self.size + cell.column()) as usize
    }

    fn open(&mut self, cell: CellCoord) {
        let index = self.index(cell);
        self.tiles[index] = Tile::Empty;
    }
}

/// Moves two cells in one of four directions, staying on the odd lattice.
fn step(cell: CellCoord, size: u32, direction: u32) -> CellCoord {
    let (column, row) = (cell.column(), cell.row());
    match direction {
        0 if column < size - 2 => CellCoord::new(column + 2, row),
        1 if row < size - 2 => CellCoord::new(column, row + 2),
        2 if column > 2 => CellCoord::new(column - 2, row),
        3 if row > 2 => CellCoord::new(column, row - 2),
        _ => cell,
    }
}

fn midpoint(a: CellCoord, b: CellCoord) -> CellCoord {
    CellCoord::new((a.column() + b.column()) / 2, (a.row() + b.row()) / 2)
}

fn lattice_neighbors(cell: CellCoord, size: u32) -> impl Iterator<Item = CellCoord> {
    (0..4)
        .map(move |direction| step(cell, size, direction))
        .filter(move |neighbor| *neighbor != cell)
}

fn is_border(size: u32, index: usize) -> bool {
    let width = size as usize;
    let column = index % width;
    let row = index / width;
    column == 0 || row == 0 || column + 1 == width || row + 1 == width
}
