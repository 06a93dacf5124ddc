use hordefall_core::{Tile, TileLayout, TileMapView};

/// Installed tile layout with animated interior wall heights.
#[derive(Clone, Debug)]
pub(crate) struct Arena {
    size: u32,
    tiles: Vec<Tile>,
    base_heights: Vec<f32>,
    heights: Vec<f32>,
    level: f32,
}

impl Arena {
    /// Open arena with a zero-height border, used before the first game.
    pub(crate) fn empty(size: u32) -> Self {
        let cells = (size * size) as usize;
        let mut tiles = vec![Tile::Empty; cells];
        for (index, tile) in tiles.iter_mut().enumerate() {
            if is_border(size, index) {
                *tile = Tile::Wall;
            }
        }
        Self::from_layout(TileLayout::new(size, tiles, vec![0.0; cells]), 1.0)
    }

    pub(crate) fn from_layout(layout: TileLayout, level: f32) -> Self {
        let size = layout.size();
        let tiles = layout.tiles().to_vec();
        let base_heights = layout.heights().to_vec();
        let mut arena = Self {
            size,
            heights: base_heights.clone(),
            base_heights,
            tiles,
            level,
        };
        arena.fade(level);
        arena
    }

    /// Moves interior walls to `level`, `0.0` sunk below the floor to `1.0` raised.
    pub(crate) fn fade(&mut self, level: f32) {
        self.level = level.clamp(0.0, 1.0);
        for (index, height) in self.heights.iter_mut().enumerate() {
            let base = self.base_heights[index];
            *height = if is_border(self.size, index) || self.tiles[index] == Tile::Empty {
                base
            } else {
                base - 1.0 + self.level
            };
        }
    }

    pub(crate) fn level(&self) -> f32 {
        self.level
    }

    pub(crate) fn view(&self) -> TileMapView<'_> {
        TileMapView::new(self.size, &self.tiles, &self.heights)
    }
}

fn is_border(size: u32, index: usize) -> bool {
    let width = size as usize;
    let column = index % width;
    let row = index / width;
    column == 0 || row == 0 || column + 1 == width || row + 1 == width
}
