use bitvec::{bitbox, boxed::BitBox, slice::BitSlice};

/// Stores which cells of a board contain a mine.
///
/// Owned exclusively by [`Board`](crate::board::Board) once a round starts; the only layout change
/// after construction happens through the board's first-select redeal.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct MineMap {
    mines: BitBox,
}

impl MineMap {
    /// Creates a new [`MineMap`] without any mines.
    pub fn new(cell_count: usize) -> Self {
        Self {
            mines: bitbox![0; cell_count],
        }
    }

    /// The total number of cells.
    pub fn len(&self) -> usize {
        self.mines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mines.is_empty()
    }

    /// Returns whether the given cell contains a mine.
    pub fn is_mine(&self, index: usize) -> bool {
        self.mines[index]
    }

    /// Returns the total number of mines.
    pub fn mine_count(&self) -> usize {
        self.mines.count_ones()
    }

    /// Places or removes a mine at the given cell.
    ///
    /// Does nothing if the state of the cell already matches.
    pub fn set_mine(&mut self, index: usize, is_mine: bool) {
        self.mines.set(index, is_mine);
    }

    /// Shorthand for [`Self::set_mine()`] with `true`.
    pub fn place_mine(&mut self, index: usize) {
        self.set_mine(index, true);
    }

    /// Shorthand for [`Self::set_mine()`] with `false`.
    pub fn remove_mine(&mut self, index: usize) {
        self.set_mine(index, false);
    }

    /// The underlying occupancy mask.
    pub fn as_bitslice(&self) -> &BitSlice {
        &self.mines
    }
}
