use rand::{seq::IteratorRandom, Rng, RngCore};
use thiserror::Error;

use crate::{grid::GridSize, mine_map::MineMap};

/// Produces the initial mine layout for a board shape.
///
/// Implementations draw all randomness from the caller-supplied generator, so a given seeder and
/// rng seed always reproduce the same layout.
pub trait Seeder {
    fn seed(&self, size: GridSize, rng: &mut dyn RngCore) -> Result<MineMap, SeedError>;
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("{0} is not a valid probability")]
    InvalidProbability(f64),
    #[error("cannot place {mines} mines on a board with only {cells} cells")]
    TooManyMines { mines: usize, cells: usize },
}

/// Seeds each site independently with a fixed mine probability.
///
/// The resulting mine count is random; use [`CountSeeder`] for an exact count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformSeeder {
    probability: f64,
}

impl UniformSeeder {
    /// Creates a seeder with the given per-site mine probability.
    pub fn new(probability: f64) -> Result<Self, SeedError> {
        (0.0..=1.0)
            .contains(&probability)
            .then_some(Self { probability })
            .ok_or(SeedError::InvalidProbability(probability))
    }
}

impl Seeder for UniformSeeder {
    fn seed(&self, size: GridSize, rng: &mut dyn RngCore) -> Result<MineMap, SeedError> {
        let mut mines = MineMap::new(size.cells());
        for index in 0..size.cells() {
            if rng.gen_bool(self.probability) {
                mines.place_mine(index);
            }
        }
        Ok(mines)
    }
}

/// Seeds exactly `mines` sites, drawn uniformly without replacement from all cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountSeeder {
    mines: usize,
}

impl CountSeeder {
    pub fn new(mines: usize) -> Self {
        Self { mines }
    }
}

impl Seeder for CountSeeder {
    fn seed(&self, size: GridSize, rng: &mut dyn RngCore) -> Result<MineMap, SeedError> {
        let cells = size.cells();
        if self.mines > cells {
            return Err(SeedError::TooManyMines {
                mines: self.mines,
                cells,
            });
        }

        let mut mines = MineMap::new(cells);
        for index in (0..cells).choose_multiple(rng, self.mines) {
            mines.place_mine(index);
        }
        Ok(mines)
    }
}

/// Seeds `round(density * cells)` mines, drawn like [`CountSeeder`].
///
/// The count is a fraction of the total site count, not of anything else; a density of `0.2` on a
/// 10x10 board yields exactly 20 mines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensitySeeder {
    density: f64,
}

impl DensitySeeder {
    /// Creates a seeder with the given mine density in `[0, 1]`.
    pub fn new(density: f64) -> Result<Self, SeedError> {
        (0.0..=1.0)
            .contains(&density)
            .then_some(Self { density })
            .ok_or(SeedError::InvalidProbability(density))
    }
}

impl Seeder for DensitySeeder {
    fn seed(&self, size: GridSize, rng: &mut dyn RngCore) -> Result<MineMap, SeedError> {
        let mines = (self.density * size.cells() as f64).round() as usize;
        CountSeeder::new(mines).seed(size, rng)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn size(rows: usize, cols: usize) -> GridSize {
        GridSize::new(rows, cols).unwrap()
    }

    #[test]
    fn count_seeder_places_exactly_n_mines() {
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mines = CountSeeder::new(10).seed(size(5, 5), &mut rng).unwrap();
            assert_eq!(mines.mine_count(), 10);
        }
    }

    #[test]
    fn count_seeder_rejects_too_many_mines() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = CountSeeder::new(30).seed(size(5, 5), &mut rng);
        assert!(matches!(
            result,
            Err(SeedError::TooManyMines { mines: 30, cells: 25 })
        ));
    }

    #[test]
    fn uniform_seeder_rejects_invalid_probability() {
        assert!(UniformSeeder::new(-0.1).is_err());
        assert!(UniformSeeder::new(1.5).is_err());
    }

    #[test]
    fn uniform_seeder_extremes() {
        let mut rng = StdRng::seed_from_u64(3);
        let none = UniformSeeder::new(0.0)
            .unwrap()
            .seed(size(4, 4), &mut rng)
            .unwrap();
        assert_eq!(none.mine_count(), 0);
        let all = UniformSeeder::new(1.0)
            .unwrap()
            .seed(size(4, 4), &mut rng)
            .unwrap();
        assert_eq!(all.mine_count(), 16);
    }

    #[test]
    fn density_seeder_scales_with_site_count() {
        let mut rng = StdRng::seed_from_u64(5);
        let mines = DensitySeeder::new(0.2)
            .unwrap()
            .seed(size(10, 10), &mut rng)
            .unwrap();
        assert_eq!(mines.mine_count(), 20);
    }
}
