//! Base tile grid.
//!
//! Every base is a square grid of tiles. A tile is empty, blocked by
//! terrain, or occupied by a building. Two-tile buildings occupy two
//! horizontally adjacent tiles that reference the same building.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::base::BuildingId;
use crate::error::{BaseError, Result};
use crate::templates::Footprint;

/// Default edge length of a base grid (`BASE_SIZE`).
pub const BASE_SIZE: u32 = 5;

/// Smallest grid that can hold a two-tile building.
pub const MIN_BASE_SIZE: u32 = 2;

/// Tile coordinates inside a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Column (x).
    pub col: u32,
    /// Row (y).
    pub row: u32,
}

impl Tile {
    /// Create a tile coordinate.
    #[must_use]
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// The tile to the right.
    #[must_use]
    pub const fn right(self) -> Self {
        Self::new(self.col + 1, self.row)
    }

    /// Orthogonal neighbours inside a `size × size` grid.
    fn neighbours(self, size: u32) -> impl Iterator<Item = Tile> {
        let Tile { col, row } = self;
        [
            (col.checked_sub(1), Some(row)),
            (Some(col + 1), Some(row)),
            (Some(col), row.checked_sub(1)),
            (Some(col), Some(row + 1)),
        ]
        .into_iter()
        .filter_map(move |(c, r)| match (c, r) {
            (Some(c), Some(r)) if c < size && r < size => Some(Tile::new(c, r)),
            _ => None,
        })
    }
}

/// State of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileCell {
    /// Free for construction.
    #[default]
    Empty,
    /// Holds a building.
    Occupied(BuildingId),
    /// Blocked by terrain.
    Blocked,
}

/// Square tile grid of a base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseGrid {
    size: u32,
    /// Cells in row-major order.
    cells: Vec<TileCell>,
}

impl BaseGrid {
    /// Create an empty grid.
    ///
    /// # Panics
    ///
    /// Panics if `size` is smaller than [`MIN_BASE_SIZE`].
    #[must_use]
    pub fn new(size: u32) -> Self {
        assert!(size >= MIN_BASE_SIZE, "BaseGrid size must be at least {MIN_BASE_SIZE}");
        Self {
            size,
            cells: vec![TileCell::Empty; (size as usize) * (size as usize)],
        }
    }

    /// Edge length.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    fn index(&self, tile: Tile) -> usize {
        (tile.row as usize) * (self.size as usize) + (tile.col as usize)
    }

    /// Whether the tile lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, tile: Tile) -> bool {
        tile.col < self.size && tile.row < self.size
    }

    /// Cell at `tile`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, tile: Tile) -> Option<TileCell> {
        self.in_bounds(tile).then(|| self.cells[self.index(tile)])
    }

    /// Set a cell. Returns `false` when out of bounds.
    pub fn set(&mut self, tile: Tile, cell: TileCell) -> bool {
        if self.in_bounds(tile) {
            let index = self.index(tile);
            self.cells[index] = cell;
            true
        } else {
            false
        }
    }

    /// Whether a building can go on the tile.
    #[must_use]
    pub fn is_available(&self, tile: Tile) -> bool {
        matches!(self.get(tile), Some(TileCell::Empty))
    }

    /// Iterate all tiles with their cells.
    pub fn tiles(&self) -> impl Iterator<Item = (Tile, TileCell)> + '_ {
        let size = self.size;
        self.cells.iter().enumerate().map(move |(i, &cell)| {
            let i = i as u32;
            (Tile::new(i % size, i / size), cell)
        })
    }

    /// Tiles a building with `footprint` would cover when clicked at `tile`.
    ///
    /// Two-tile buildings extend to the right; in the right-most column, or
    /// when the right tile is taken, they extend to the left instead. The
    /// returned tiles are ordered left to right.
    pub fn resolve_footprint(&self, tile: Tile, footprint: Footprint) -> Result<Vec<Tile>> {
        match self.get(tile) {
            None => return Err(BaseError::InvalidPosition(tile)),
            Some(TileCell::Blocked) => return Err(BaseError::TileBlocked(tile)),
            Some(TileCell::Occupied(_)) => return Err(BaseError::TileOccupied(tile)),
            Some(TileCell::Empty) => {}
        }

        if footprint == Footprint::Single {
            return Ok(vec![tile]);
        }

        let right_free = tile.col + 1 < self.size && self.is_available(tile.right());
        if right_free {
            return Ok(vec![tile, tile.right()]);
        }

        let Some(left_col) = tile.col.checked_sub(1) else {
            return Err(self.refusal(tile.right()));
        };
        let left = Tile::new(left_col, tile.row);
        if self.is_available(left) {
            Ok(vec![left, tile])
        } else {
            Err(self.refusal(left))
        }
    }

    fn refusal(&self, tile: Tile) -> BaseError {
        match self.get(tile) {
            Some(TileCell::Blocked) => BaseError::TileBlocked(tile),
            Some(TileCell::Occupied(_)) => BaseError::TileOccupied(tile),
            _ => BaseError::InvalidPosition(tile),
        }
    }

    /// Mark tiles as occupied by `building`.
    pub fn occupy(&mut self, tiles: &[Tile], building: BuildingId) {
        for &tile in tiles {
            self.set(tile, TileCell::Occupied(building));
        }
    }

    /// Clear tiles back to empty.
    pub fn clear(&mut self, tiles: &[Tile]) {
        for &tile in tiles {
            self.set(tile, TileCell::Empty);
        }
    }

    /// Tiles currently holding `building`.
    #[must_use]
    pub fn tiles_of(&self, building: BuildingId) -> Vec<Tile> {
        self.tiles()
            .filter(|&(_, cell)| cell == TileCell::Occupied(building))
            .map(|(tile, _)| tile)
            .collect()
    }

    /// Tiles reachable from `start` by orthogonal steps through tiles
    /// accepted by `passable`. The result is indexed like the cell array.
    fn flood(&self, start: &[Tile], passable: impl Fn(Tile, TileCell) -> bool) -> Vec<bool> {
        let mut seen = vec![false; self.cells.len()];
        let mut queue: VecDeque<Tile> = VecDeque::new();
        for &tile in start {
            if let Some(cell) = self.get(tile) {
                if passable(tile, cell) && !seen[self.index(tile)] {
                    seen[self.index(tile)] = true;
                    queue.push_back(tile);
                }
            }
        }
        while let Some(tile) = queue.pop_front() {
            for next in tile.neighbours(self.size) {
                let index = self.index(next);
                if !seen[index] && passable(next, self.cells[index]) {
                    seen[index] = true;
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Whether every building tile except `excluded` stays connected to
    /// the `anchor` tiles through other building tiles.
    #[must_use]
    pub fn buildings_connected_without(&self, anchor: &[Tile], excluded: BuildingId) -> bool {
        let passable = |_: Tile, cell: TileCell| {
            matches!(cell, TileCell::Occupied(id) if id != excluded)
        };
        let seen = self.flood(anchor, passable);
        self.tiles()
            .filter(|&(tile, cell)| passable(tile, cell))
            .all(|(tile, _)| seen[self.index(tile)])
    }

    /// Whether every non-blocked tile is reachable from every other one.
    #[must_use]
    pub fn free_space_connected(&self) -> bool {
        let passable = |_: Tile, cell: TileCell| cell != TileCell::Blocked;
        let Some((first, _)) = self.tiles().find(|&(tile, cell)| passable(tile, cell)) else {
            return true;
        };
        let seen = self.flood(&[first], passable);
        self.tiles()
            .filter(|&(tile, cell)| passable(tile, cell))
            .all(|(tile, _)| seen[self.index(tile)])
    }

    /// Block up to `count` random empty tiles, never splitting the free
    /// space. Returns the number of tiles blocked.
    pub fn add_blocked_tiles<R: Rng + ?Sized>(&mut self, count: u32, rng: &mut R) -> u32 {
        let mut placed = 0;
        let mut attempts = count * 10;
        while placed < count && attempts > 0 {
            attempts -= 1;
            let tile = Tile::new(rng.gen_range(0..self.size), rng.gen_range(0..self.size));
            if !self.is_available(tile) {
                continue;
            }
            self.set(tile, TileCell::Blocked);
            if self.free_space_connected() {
                placed += 1;
            } else {
                self.set(tile, TileCell::Empty);
            }
        }
        placed
    }

    /// Pick a random empty position that fits `footprint`.
    pub fn random_free_position<R: Rng + ?Sized>(
        &self,
        footprint: Footprint,
        rng: &mut R,
    ) -> Option<Vec<Tile>> {
        let candidates: Vec<Vec<Tile>> = self
            .tiles()
            .filter_map(|(tile, _)| self.resolve_footprint(tile, footprint).ok())
            .collect();
        if candidates.is_empty() {
            None
        } else {
            let pick = rng.gen_range(0..candidates.len());
            candidates.into_iter().nth(pick)
        }
    }
}
