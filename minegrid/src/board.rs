use std::collections::VecDeque;
use std::fmt;
use std::iter::once;

use bitvec::{bitbox, boxed::BitBox};
use rand::{seq::IteratorRandom, RngCore};
use thiserror::Error;

use crate::{
    grid::{GridPos, GridSize},
    mine_map::MineMap,
    proximity::ProximityMap,
    seeder::{SeedError, Seeder},
    snapshot::{BoardLayouts, BoardView},
};

/// The authoritative state of a single round.
///
/// Owns the mine layout, the derived proximity numbers and the live open/flag masks, and enforces
/// that no cell is ever open and flagged at the same time. A board is created once per round and
/// replaced wholesale on "new game"; there is no partial reset.
///
/// Harmless no-ops (selecting an open cell, chording without enough flags, flagging an open cell)
/// return `Ok` with unchanged state. Contract violations (out-of-bounds positions, a late
/// [`Board::first_select`]) return a [`BoardError`].
pub struct Board {
    size: GridSize,
    mines: MineMap,
    proximity: ProximityMap,
    open: BitBox,
    flags: BitBox,
    forgiveness: usize,
    open_count: usize,
    flag_count: usize,
    open_mine_count: usize,
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("position {pos} is outside the {size} grid")]
    OutOfBounds { pos: GridPos, size: GridSize },
    #[error("first select is only permitted before any cell is open")]
    FirstSelectAfterOpen,
    #[error("not enough free cells to relocate {displaced} displaced mines")]
    NoRoomForMines { displaced: usize },
}

impl Board {
    /// Creates a board for one round, seeding the mine layout with the given seeder.
    pub fn new(
        size: GridSize,
        seeder: &dyn Seeder,
        forgiveness: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Self, SeedError> {
        let mines = seeder.seed(size, rng)?;
        Ok(Self::with_mines(size, mines, forgiveness))
    }

    /// Builds a board from an explicit mine layout, for deterministic setups.
    ///
    /// # Panics
    ///
    /// Panics if the mask length does not match the grid.
    pub fn with_mines(size: GridSize, mines: MineMap, forgiveness: usize) -> Self {
        assert_eq!(
            mines.len(),
            size.cells(),
            "mine mask must match the grid size"
        );
        let proximity = ProximityMap::compute(size, &mines);
        Self {
            size,
            mines,
            proximity,
            open: bitbox![0; size.cells()],
            flags: bitbox![0; size.cells()],
            forgiveness,
            open_count: 0,
            flag_count: 0,
            open_mine_count: 0,
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn forgiveness(&self) -> usize {
        self.forgiveness
    }

    fn index_of(&self, pos: GridPos) -> Result<usize, BoardError> {
        self.size.index_of(pos).ok_or(BoardError::OutOfBounds {
            pos,
            size: self.size,
        })
    }

    /// Opens a hidden cell, flood-filling through the surrounding zero-proximity region.
    ///
    /// Selecting an already open cell does nothing. Selecting a flagged cell also does nothing:
    /// the flag protects against accidental opens and has to be toggled off first. This is a
    /// public contract, not an error.
    pub fn select(&mut self, pos: GridPos) -> Result<(), BoardError> {
        let index = self.index_of(pos)?;
        self.select_index(index);
        Ok(())
    }

    pub(crate) fn select_index(&mut self, index: usize) {
        if self.open[index] || self.flags[index] {
            return;
        }
        self.open_cell(index);
        if self.proximity.get(index) == 0 {
            self.propagate(index);
        }
    }

    /// Breadth-first reveal of the contiguous zero-proximity region around `start`.
    ///
    /// Nonzero cells bordering the region are opened but do not propagate further. Flagged cells
    /// block the fill. Each cell is opened at most once, so this terminates after at most one pass
    /// over the grid.
    fn propagate(&mut self, start: usize) {
        debug_assert_eq!(self.proximity.get(start), 0);
        let mut queue = VecDeque::from([start]);
        while let Some(index) = queue.pop_front() {
            for neighbor in self.size.neighbor_indices(index) {
                if self.open[neighbor] || self.flags[neighbor] {
                    continue;
                }
                self.open_cell(neighbor);
                if self.proximity.get(neighbor) == 0 {
                    queue.push_back(neighbor);
                }
            }
        }
    }

    fn open_cell(&mut self, index: usize) {
        debug_assert!(!self.flags[index]);
        if self.open.replace(index, true) {
            return;
        }
        self.open_count += 1;
        if self.mines.is_mine(index) {
            self.open_mine_count += 1;
        }
    }

    /// Toggles a cell between hidden and flagged. No-op on open cells.
    pub fn toggle_flag(&mut self, pos: GridPos) -> Result<(), BoardError> {
        let index = self.index_of(pos)?;
        if self.open[index] {
            return Ok(());
        }
        let flagged = self.flags[index];
        if self.flags.replace(index, !flagged) {
            self.flag_count -= 1;
        } else {
            self.flag_count += 1;
        }
        Ok(())
    }

    /// Opens all neighbors of an open cell whose mines are fully accounted for.
    ///
    /// A neighbor counts as accounted when it is flagged, or when it is an open mine (pre-revealed
    /// mines on forgiving boards count like flags). If the accounted number does not match the
    /// cell's proximity, or the cell is not open, this is a silent no-op.
    pub fn chord(&mut self, pos: GridPos) -> Result<(), BoardError> {
        let index = self.index_of(pos)?;
        if !self.open[index] {
            return Ok(());
        }

        let accounted = self
            .size
            .neighbor_indices(index)
            .filter(|&neighbor| {
                self.flags[neighbor] || (self.open[neighbor] && self.mines.is_mine(neighbor))
            })
            .count();
        if accounted as i8 != self.proximity.get(index) {
            return Ok(());
        }

        for neighbor in self.size.neighbor_indices(index) {
            self.select_index(neighbor);
        }
        Ok(())
    }

    /// Chords the entire board to a fixed point.
    ///
    /// Each pass computes the known-mine mask (flags plus open mines), finds the open cells whose
    /// proximity is exactly accounted by known mine neighbors, and opens every hidden cell
    /// adjacent to at least one of them. Stops as soon as a pass opens nothing; the pass count is
    /// additionally bounded by the cell count, since every productive pass opens at least one
    /// cell.
    pub fn superchord(&mut self) {
        for _ in 0..self.size.cells() {
            let opened_before = self.open_count;

            let mut known = self.open.clone();
            known &= self.mines.as_bitslice();
            known |= &self.flags;

            let mut to_open = Vec::new();
            for index in self.open.iter_ones() {
                let proximity = self.proximity.get(index);
                if proximity < 0 {
                    continue;
                }
                let known_neighbors = self
                    .size
                    .neighbor_indices(index)
                    .filter(|&neighbor| known[neighbor])
                    .count();
                if known_neighbors as i8 == proximity {
                    to_open.extend(
                        self.size
                            .neighbor_indices(index)
                            .filter(|&neighbor| !self.open[neighbor] && !self.flags[neighbor]),
                    );
                }
            }

            for index in to_open {
                self.select_index(index);
            }

            if self.open_count == opened_before {
                break;
            }
        }
    }

    /// One-time redeal guaranteeing a safe first select.
    ///
    /// Mines at `pos` and its neighbors are relocated to uniformly-random free cells outside the
    /// protected zone, keeping the total mine count unchanged, and the proximity numbers are
    /// recomputed. All flags are cleared, since the layout they referred to no longer exists.
    /// Finally `pos` is opened like a normal select.
    ///
    /// # Errors
    ///
    /// Fails with [`BoardError::FirstSelectAfterOpen`] once any cell is open (which includes a
    /// second call), and with [`BoardError::NoRoomForMines`] when the board is too crowded to
    /// relocate the displaced mines. In the latter case the board is left untouched.
    pub fn first_select(&mut self, pos: GridPos, rng: &mut dyn RngCore) -> Result<(), BoardError> {
        let index = self.index_of(pos)?;
        if self.open_count > 0 {
            return Err(BoardError::FirstSelectAfterOpen);
        }

        let protected: Vec<usize> = once(index)
            .chain(self.size.neighbor_indices(index))
            .collect();
        let displaced = protected
            .iter()
            .filter(|&&cell| self.mines.is_mine(cell))
            .count();

        if displaced > 0 {
            let candidates: Vec<usize> = (0..self.size.cells())
                .filter(|&cell| !self.mines.is_mine(cell) && !protected.contains(&cell))
                .collect();
            if candidates.len() < displaced {
                return Err(BoardError::NoRoomForMines { displaced });
            }

            for &cell in &protected {
                self.mines.remove_mine(cell);
            }
            for cell in candidates.into_iter().choose_multiple(rng, displaced) {
                self.mines.place_mine(cell);
            }
            self.proximity = ProximityMap::compute(self.size, &self.mines);
        }

        self.flags.fill(false);
        self.flag_count = 0;
        self.select_index(index);
        Ok(())
    }

    pub fn is_open(&self, pos: GridPos) -> Result<bool, BoardError> {
        Ok(self.open[self.index_of(pos)?])
    }

    pub fn is_flagged(&self, pos: GridPos) -> Result<bool, BoardError> {
        Ok(self.flags[self.index_of(pos)?])
    }

    pub fn proximity_at(&self, pos: GridPos) -> Result<i8, BoardError> {
        Ok(self.proximity.get(self.index_of(pos)?))
    }

    /// The total number of placed flags.
    pub fn flags(&self) -> usize {
        self.flag_count
    }

    /// The total number of mines in the layout.
    pub fn mines(&self) -> usize {
        self.mines.mine_count()
    }

    /// The number of mines that are currently open.
    pub fn open_mines(&self) -> usize {
        self.open_mine_count
    }

    /// The total number of open cells, mines included.
    pub fn open_cells(&self) -> usize {
        self.open_count
    }

    pub fn cells(&self) -> usize {
        self.size.cells()
    }

    /// True iff all non-mine cells are open, or the flags exactly mark the mines.
    pub fn completed(&self) -> bool {
        let mut covered = self.open.clone();
        covered |= self.mines.as_bitslice();
        covered.all() || self.flags.as_bitslice() == self.mines.as_bitslice()
    }

    /// True iff more mines are open than the forgiveness threshold tolerates.
    pub fn failed(&self) -> bool {
        self.open_mine_count > self.forgiveness
    }

    /// Produces the per-turn snapshot for solvers and agents.
    pub fn snapshot(&self) -> BoardView {
        let mut openable = self.open.clone();
        openable |= &self.flags;
        let openable = !openable;

        let proximity = (0..self.size.cells())
            .map(|index| {
                if self.open[index] {
                    self.proximity.get(index)
                } else {
                    0
                }
            })
            .collect();

        BoardView::new(self.size, openable, self.flags.clone(), proximity)
    }

    /// The three matrices an external collaborator persists on game end.
    pub fn layouts(&self) -> BoardLayouts {
        BoardLayouts {
            size: self.size,
            mine_layout: self.mines.as_bitslice().to_bitvec().into_boxed_bitslice(),
            open_layout: self.open.clone(),
            flag_layout: self.flags.clone(),
        }
    }
}

fn color_code(proximity: i8) -> &'static str {
    match proximity {
        1 => "\x1B[34m",
        2 => "\x1B[32m",
        3 => "\x1B[31m",
        4 => "\x1B[35m",
        _ => "",
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size.rows.get() {
            for col in 0..self.size.cols.get() {
                let index = self
                    .size
                    .index_of(GridPos::new(row, col))
                    .expect("display position should be within bounds");
                if self.flags[index] {
                    write!(f, "\x1B[33mF\x1B[0m ")?;
                } else if !self.open[index] {
                    write!(f, "░ ")?;
                } else if self.mines.is_mine(index) {
                    write!(f, "\x1B[31m*\x1B[0m ")?;
                } else {
                    let proximity = self.proximity.get(index);
                    if proximity == 0 {
                        write!(f, "  ")?;
                    } else {
                        write!(f, "{}{proximity}\x1B[0m ", color_code(proximity))?;
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::seeder::CountSeeder;

    use super::*;

    fn p(row: usize, col: usize) -> GridPos {
        GridPos::new(row, col)
    }

    fn board_with_mines(
        rows: usize,
        cols: usize,
        mines: &[(usize, usize)],
        forgiveness: usize,
    ) -> Board {
        let size = GridSize::new(rows, cols).unwrap();
        let mut map = MineMap::new(size.cells());
        for &(row, col) in mines {
            map.place_mine(size.index_of(p(row, col)).unwrap());
        }
        Board::with_mines(size, map, forgiveness)
    }

    #[test]
    fn select_floods_entire_zero_region() {
        // 3x3, mine at (0,0): every non-mine cell is reachable through zero-proximity cells.
        let mut board = board_with_mines(3, 3, &[(0, 0)], 0);
        board.select(p(2, 2)).unwrap();

        for pos in board.size().positions() {
            let expected = pos != p(0, 0);
            assert_eq!(board.is_open(pos).unwrap(), expected, "at {pos}");
        }
        assert!(board.completed());
        assert!(!board.failed());
    }

    #[test]
    fn flood_stops_at_numbered_ring() {
        let mut board = board_with_mines(5, 5, &[(2, 2)], 0);
        board.select(p(0, 0)).unwrap();

        assert_eq!(board.open_cells(), 24);
        assert!(!board.is_open(p(2, 2)).unwrap());
        // the ring around the mine is open but did not propagate into the mine
        assert!(board.is_open(p(1, 1)).unwrap());
        assert_eq!(board.proximity_at(p(1, 1)).unwrap(), 1);
    }

    #[test]
    fn flood_does_not_open_flagged_cells() {
        let mut board = board_with_mines(3, 3, &[(0, 0)], 0);
        board.toggle_flag(p(2, 0)).unwrap();
        board.select(p(2, 2)).unwrap();

        assert!(!board.is_open(p(2, 0)).unwrap());
        assert!(board.is_flagged(p(2, 0)).unwrap());
    }

    #[test]
    fn select_is_idempotent_and_ignores_flagged() {
        let mut board = board_with_mines(3, 3, &[(0, 0)], 0);
        board.select(p(2, 2)).unwrap();
        let open_cells = board.open_cells();
        board.select(p(2, 2)).unwrap();
        assert_eq!(board.open_cells(), open_cells);

        let mut board = board_with_mines(3, 3, &[(0, 0)], 0);
        board.toggle_flag(p(0, 0)).unwrap();
        board.select(p(0, 0)).unwrap();
        assert!(!board.is_open(p(0, 0)).unwrap());
        assert_eq!(board.open_mines(), 0);
    }

    #[test]
    fn toggle_flag_round_trips_and_skips_open_cells() {
        let mut board = board_with_mines(3, 3, &[(0, 0)], 0);
        board.toggle_flag(p(1, 1)).unwrap();
        assert!(board.is_flagged(p(1, 1)).unwrap());
        assert_eq!(board.flags(), 1);
        board.toggle_flag(p(1, 1)).unwrap();
        assert!(!board.is_flagged(p(1, 1)).unwrap());
        assert_eq!(board.flags(), 0);

        board.select(p(2, 2)).unwrap();
        board.toggle_flag(p(2, 2)).unwrap();
        assert!(!board.is_flagged(p(2, 2)).unwrap());
    }

    #[test]
    fn chord_opens_remaining_neighbors_when_flags_match() {
        // (1,1) sees both mines; flag them, then chord opens everything else around it.
        let mut board = board_with_mines(3, 3, &[(0, 0), (0, 2)], 0);
        board.select(p(1, 1)).unwrap();
        assert_eq!(board.proximity_at(p(1, 1)).unwrap(), 2);

        board.toggle_flag(p(0, 0)).unwrap();
        board.toggle_flag(p(0, 2)).unwrap();
        board.chord(p(1, 1)).unwrap();

        assert!(board.is_open(p(0, 1)).unwrap());
        assert!(board.is_open(p(1, 0)).unwrap());
        assert!(board.is_open(p(1, 2)).unwrap());
        assert!(board.is_open(p(2, 2)).unwrap());
        assert_eq!(board.open_mines(), 0);
    }

    #[test]
    fn chord_without_enough_flags_is_a_no_op() {
        let mut board = board_with_mines(3, 3, &[(0, 0), (0, 2)], 0);
        board.select(p(1, 1)).unwrap();
        board.toggle_flag(p(0, 0)).unwrap();

        let open_cells = board.open_cells();
        board.chord(p(1, 1)).unwrap();
        assert_eq!(board.open_cells(), open_cells);

        // chord on a hidden cell is equally harmless
        board.chord(p(2, 2)).unwrap();
        assert_eq!(board.open_cells(), open_cells);
    }

    #[test]
    fn chord_counts_open_mines_like_flags() {
        let mut board = board_with_mines(3, 3, &[(0, 0)], 8);
        board.select(p(0, 0)).unwrap();
        assert_eq!(board.open_mines(), 1);
        assert!(!board.failed());

        board.select(p(1, 1)).unwrap();
        board.chord(p(1, 1)).unwrap();

        assert!(board.is_open(p(2, 2)).unwrap());
        assert_eq!(board.open_mines(), 1);
    }

    #[test]
    fn superchord_reaches_fixed_point_and_is_idempotent_there() {
        let mut board = board_with_mines(3, 3, &[(0, 0)], 0);
        board.select(p(1, 1)).unwrap();
        board.toggle_flag(p(0, 0)).unwrap();

        board.superchord();
        let open_cells = board.open_cells();
        assert_eq!(open_cells, 8);
        assert!(board.completed());

        board.superchord();
        assert_eq!(board.open_cells(), open_cells);
    }

    #[test]
    fn first_select_relocates_mines_and_preserves_count() {
        let size = GridSize::new(5, 5).unwrap();
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut board =
                Board::new(size, &CountSeeder::new(8), 0, &mut rng).unwrap();

            board.first_select(p(2, 2), &mut rng).unwrap();

            assert_eq!(board.mines(), 8);
            assert!(board.is_open(p(2, 2)).unwrap());
            assert_eq!(board.open_mines(), 0);
            for neighbor in size.neighbors(p(2, 2)) {
                assert_ne!(board.proximity_at(neighbor).unwrap(), -1);
            }
        }
    }

    #[test]
    fn first_select_clears_stale_flags() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut board = board_with_mines(4, 4, &[(0, 0), (3, 3)], 0);
        board.toggle_flag(p(0, 0)).unwrap();
        board.first_select(p(0, 1), &mut rng).unwrap();
        assert_eq!(board.flags(), 0);
        assert_eq!(board.mines(), 2);
    }

    #[test]
    fn first_select_errors_once_any_cell_is_open() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut board = board_with_mines(4, 4, &[(0, 0)], 0);
        board.first_select(p(3, 3), &mut rng).unwrap();
        assert!(matches!(
            board.first_select(p(3, 3), &mut rng),
            Err(BoardError::FirstSelectAfterOpen)
        ));

        let mut board = board_with_mines(4, 4, &[(0, 0)], 0);
        board.select(p(3, 3)).unwrap();
        assert!(matches!(
            board.first_select(p(0, 1), &mut rng),
            Err(BoardError::FirstSelectAfterOpen)
        ));
    }

    #[test]
    fn first_select_errors_without_room_to_relocate() {
        // every cell outside the protected zone already holds a mine
        let mut board = board_with_mines(
            2,
            3,
            &[(0, 0), (0, 2), (1, 2)],
            0,
        );
        let mut rng = StdRng::seed_from_u64(3);
        let result = board.first_select(p(0, 0), &mut rng);
        assert!(matches!(result, Err(BoardError::NoRoomForMines { .. })));
        assert_eq!(board.mines(), 3);
        assert_eq!(board.open_cells(), 0);
    }

    #[test]
    fn out_of_bounds_positions_are_contract_violations() {
        let mut board = board_with_mines(3, 3, &[(0, 0)], 0);
        let outside = p(3, 0);
        assert!(matches!(
            board.select(outside),
            Err(BoardError::OutOfBounds { .. })
        ));
        assert!(matches!(
            board.toggle_flag(outside),
            Err(BoardError::OutOfBounds { .. })
        ));
        assert!(matches!(
            board.chord(outside),
            Err(BoardError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn completed_via_flags_matching_mines() {
        let mut board = board_with_mines(2, 2, &[(0, 0)], 0);
        assert!(!board.completed());
        board.toggle_flag(p(0, 0)).unwrap();
        assert!(board.completed());
        board.toggle_flag(p(1, 1)).unwrap();
        assert!(!board.completed());
    }

    #[test]
    fn forgiveness_delays_failure() {
        let mut strict = board_with_mines(3, 3, &[(0, 0)], 0);
        strict.select(p(0, 0)).unwrap();
        assert!(strict.failed());

        let mut forgiving = board_with_mines(3, 3, &[(0, 0), (0, 2), (2, 0)], 2);
        forgiving.select(p(0, 0)).unwrap();
        assert!(!forgiving.failed());
        forgiving.select(p(0, 2)).unwrap();
        assert!(!forgiving.failed());
        forgiving.select(p(2, 0)).unwrap();
        assert!(forgiving.failed());
    }

    #[test]
    fn snapshot_masks_proximity_of_hidden_cells() {
        let mut board = board_with_mines(3, 3, &[(0, 0)], 0);
        board.select(p(1, 1)).unwrap();
        board.toggle_flag(p(0, 1)).unwrap();

        let view = board.snapshot();
        let index = |pos: GridPos| board.size().index_of(pos).unwrap();
        assert_eq!(view.proximity(index(p(1, 1))), 1);
        assert_eq!(view.proximity(index(p(0, 0))), 0);
        assert!(view.is_flagged(index(p(0, 1))));
        assert!(view.is_open(index(p(1, 1))));
        assert!(view.is_hidden(index(p(2, 2))));
    }

    #[test]
    fn random_operations_hold_invariants() {
        let size = GridSize::new(9, 9).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut board = Board::new(size, &CountSeeder::new(12), 99, &mut rng).unwrap();

        for _ in 0..200 {
            let pos = p(rng.gen_range(0..9), rng.gen_range(0..9));
            match rng.gen_range(0..4) {
                0 => board.select(pos).unwrap(),
                1 => board.toggle_flag(pos).unwrap(),
                2 => board.chord(pos).unwrap(),
                _ => board.superchord(),
            }

            assert_eq!(board.mines(), 12);
            let layouts = board.layouts();
            let mut both = layouts.open_layout.clone();
            both &= &layouts.flag_layout;
            assert!(both.not_any(), "a cell is both open and flagged");
        }
    }

    #[test]
    fn layouts_round_trip_matches_board_verdicts() {
        let mut board = board_with_mines(3, 3, &[(0, 0)], 0);
        board.select(p(2, 2)).unwrap();

        let layouts = board.layouts();
        let bytes = bcs::to_bytes(&layouts).unwrap();
        let restored: BoardLayouts = bcs::from_bytes(&bytes).unwrap();

        assert_eq!(restored, layouts);
        assert_eq!(restored.completed(), board.completed());
        assert_eq!(restored.failed(board.forgiveness()), board.failed());
    }
}
