use crate::{grid::GridSize, mine_map::MineMap};

/// Value stored for mine cells; never a valid neighbor count.
pub const MINE_SENTINEL: i8 = -1;

/// Per-cell neighbor-mine counts derived from a mine layout.
///
/// Non-mine cells hold the number of their 8-connected neighbors that contain a mine (0 to 8);
/// mine cells hold [`MINE_SENTINEL`]. Out-of-grid neighbors count as zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProximityMap {
    counts: Box<[i8]>,
}

impl ProximityMap {
    /// Derives the counts for the given mine layout.
    pub fn compute(size: GridSize, mines: &MineMap) -> Self {
        let counts = (0..size.cells())
            .map(|index| {
                if mines.is_mine(index) {
                    MINE_SENTINEL
                } else {
                    size.neighbor_indices(index)
                        .filter(|&neighbor| mines.is_mine(neighbor))
                        .count() as i8
                }
            })
            .collect();
        Self { counts }
    }

    pub fn get(&self, index: usize) -> i8 {
        self.counts[index]
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.counts
    }
}
