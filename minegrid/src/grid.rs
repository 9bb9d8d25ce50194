use std::fmt;
use std::num::NonZeroUsize;

use itertools::iproduct;
use serde::{Deserialize, Serialize};

/// A position on the grid, addressed as `(row, col)` from the top-left corner.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The shape of a board, fixed for the board's lifetime.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: NonZeroUsize,
    pub cols: NonZeroUsize,
}

impl GridSize {
    /// Creates a new size, or [`None`] if either dimension is zero.
    pub fn new(rows: usize, cols: usize) -> Option<Self> {
        Some(Self {
            rows: NonZeroUsize::new(rows)?,
            cols: NonZeroUsize::new(cols)?,
        })
    }

    /// The total number of cells.
    pub fn cells(self) -> usize {
        self.rows.get() * self.cols.get()
    }

    /// Whether the given position lies within the grid.
    pub fn contains(self, pos: GridPos) -> bool {
        pos.row < self.rows.get() && pos.col < self.cols.get()
    }

    /// Converts a position into a flat cell index, if in bounds.
    pub fn index_of(self, pos: GridPos) -> Option<usize> {
        self.contains(pos)
            .then(|| pos.row * self.cols.get() + pos.col)
    }

    /// Converts a flat cell index back into a position, if in bounds.
    pub fn pos_at(self, index: usize) -> Option<GridPos> {
        let row = index / self.cols.get();
        (row < self.rows.get()).then(|| GridPos {
            row,
            col: index % self.cols.get(),
        })
    }

    /// All positions of the grid in row-major order.
    pub fn positions(self) -> impl Iterator<Item = GridPos> {
        iproduct!(0..self.rows.get(), 0..self.cols.get()).map(|(row, col)| GridPos { row, col })
    }

    /// The 8-connected in-bounds neighbors of a position.
    ///
    /// Edges and corners simply have fewer neighbors; the grid never wraps.
    pub fn neighbors(self, pos: GridPos) -> impl Iterator<Item = GridPos> {
        iproduct!(
            pos.row.saturating_sub(1)..=pos.row.saturating_add(1),
            pos.col.saturating_sub(1)..=pos.col.saturating_add(1)
        )
        .map(|(row, col)| GridPos { row, col })
        .filter(move |&neighbor| neighbor != pos && self.contains(neighbor))
    }

    /// The 8-connected neighbors of a cell as flat indices.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn neighbor_indices(self, index: usize) -> impl Iterator<Item = usize> {
        let pos = self.pos_at(index).expect("cell index should be valid");
        self.neighbors(pos).map(move |neighbor| {
            self.index_of(neighbor)
                .expect("neighbors should be within bounds")
        })
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}
