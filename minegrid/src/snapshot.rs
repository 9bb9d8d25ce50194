use bitvec::boxed::BitBox;
use serde::{Deserialize, Serialize};

use crate::grid::{GridPos, GridSize};

/// Immutable per-turn view of a board, handed to solver rules and agents.
///
/// Carries only what an honest player could see: which cells can still be opened, which are
/// flagged, and the proximity numbers of open cells (hidden cells read as `0`). All derived masks
/// are computed eagerly at construction; a snapshot holds no reference back to the board, and a
/// fresh one is produced every turn. Callers that want lookback keep their own history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardView {
    size: GridSize,
    openable: BitBox,
    flagged: BitBox,
    open: BitBox,
    proximity: Box<[i8]>,
}

impl BoardView {
    pub(crate) fn new(size: GridSize, openable: BitBox, flagged: BitBox, proximity: Box<[i8]>) -> Self {
        let mut open = openable.clone();
        open |= &flagged;
        let open = !open;
        Self {
            size,
            openable,
            flagged,
            open,
            proximity,
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn cells(&self) -> usize {
        self.size.cells()
    }

    /// Whether the cell is hidden and unflagged, i.e. a legal target for a select.
    pub fn is_hidden(&self, index: usize) -> bool {
        self.openable[index]
    }

    pub fn is_flagged(&self, index: usize) -> bool {
        self.flagged[index]
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open[index]
    }

    /// The proximity number of an open cell; `0` for anything not open.
    pub fn proximity(&self, index: usize) -> i8 {
        self.proximity[index]
    }

    /// All open cells as flat indices.
    pub fn open_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.open.iter_ones()
    }

    /// All hidden, unflagged cells as flat indices.
    pub fn hidden_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.openable.iter_ones()
    }

    /// Converts a flat index of this snapshot back into a position.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn pos_at(&self, index: usize) -> GridPos {
        self.size
            .pos_at(index)
            .expect("snapshot index should be within bounds")
    }
}

/// The three persisted layouts of a board, serialized together on game end.
///
/// The engine only exposes these; writing one archive per finished game is the job of an external
/// collaborator. [`Self::completed`] and [`Self::failed`] recompute the end-of-game verdict from
/// the restored masks alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayouts {
    pub size: GridSize,
    pub mine_layout: BitBox,
    pub open_layout: BitBox,
    pub flag_layout: BitBox,
}

impl BoardLayouts {
    /// True iff all non-mine cells are open, or the flags exactly mark the mines.
    pub fn completed(&self) -> bool {
        let mut covered = self.open_layout.clone();
        covered |= &self.mine_layout;
        covered.all() || self.flag_layout == self.mine_layout
    }

    /// True iff more mines are open than the given forgiveness threshold tolerates.
    pub fn failed(&self, forgiveness: usize) -> bool {
        let mut open_mines = self.open_layout.clone();
        open_mines &= &self.mine_layout;
        open_mines.count_ones() > forgiveness
    }
}
