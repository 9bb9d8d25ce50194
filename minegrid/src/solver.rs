mod constraint;

pub use constraint::exact_inference;

use bitvec::bitbox;
use itertools::Itertools;
use rand::{seq::IteratorRandom, RngCore};

use crate::{action::Action, snapshot::BoardView};

/// A deduction rule: pure function from a snapshot to proposed actions.
///
/// An empty result is the expected majority case, not an error; callers fall through to the next
/// rule or to guessing. Rules never mutate anything and never address cells outside the snapshot.
pub type Rule = fn(&BoardView) -> Vec<Action>;

/// Neighbors whose mine is already accounted for: flags, plus mines opened on forgiving boards.
fn accounted_neighbors(view: &BoardView, index: usize) -> usize {
    view.size()
        .neighbor_indices(index)
        .filter(|&neighbor| view.is_flagged(neighbor) || view.proximity(neighbor) < 0)
        .count()
}

fn hidden_neighbors(view: &BoardView, index: usize) -> Vec<usize> {
    view.size()
        .neighbor_indices(index)
        .filter(|&neighbor| view.is_hidden(neighbor))
        .collect()
}

/// An open numbered cell together with its unresolved surroundings.
struct FrontierCell {
    index: usize,
    /// Proximity minus already accounted neighbors.
    remaining: usize,
    hidden: Vec<usize>,
}

fn frontier(view: &BoardView) -> Vec<FrontierCell> {
    view.open_indices()
        .filter_map(|index| {
            let proximity = view.proximity(index);
            if proximity < 0 {
                return None;
            }
            let hidden = hidden_neighbors(view, index);
            if hidden.is_empty() {
                return None;
            }
            let remaining = (proximity as usize).checked_sub(accounted_neighbors(view, index))?;
            Some(FrontierCell {
                index,
                remaining,
                hidden,
            })
        })
        .collect()
}

/// Flags every hidden neighbor of cells whose remaining mines fill their hidden neighborhood.
///
/// When an open cell's proximity minus its flagged neighbors equals the number of its still
/// hidden neighbors, each of those neighbors must be a mine.
pub fn flag_obvious(view: &BoardView) -> Vec<Action> {
    let mut marked = bitbox![0; view.cells()];
    let mut actions = Vec::new();
    for cell in frontier(view) {
        if cell.remaining > 0 && cell.remaining == cell.hidden.len() {
            for neighbor in cell.hidden {
                if !marked.replace(neighbor, true) {
                    actions.push(Action::Flag(view.pos_at(neighbor)));
                }
            }
        }
    }
    actions
}

/// Opens every hidden neighbor of cells whose proximity is fully accounted by flags.
///
/// The single-pass counterpart of [`Board::superchord`](crate::board::Board::superchord): once a
/// cell's flagged neighbors match its proximity, all of its other hidden neighbors are provably
/// safe.
pub fn open_satisfied(view: &BoardView) -> Vec<Action> {
    let mut marked = bitbox![0; view.cells()];
    let mut actions = Vec::new();
    for cell in frontier(view) {
        if cell.remaining == 0 {
            for neighbor in cell.hidden {
                if !marked.replace(neighbor, true) {
                    actions.push(Action::Select(view.pos_at(neighbor)));
                }
            }
        }
    }
    actions
}

/// Pairwise neighbor-set subtraction between numbered cells that share hidden neighbors.
///
/// The shared region can hold at most `min` of the two remaining counts (and never more mines
/// than cells). If one cell's remaining count minus that bound equals the size of its private
/// hidden region, every private cell must be a mine. Resolves configurations like the classic
/// 1-2 pattern that no single-cell rule can crack.
pub fn subtract_pairs(view: &BoardView) -> Vec<Action> {
    let frontier = frontier(view);
    let mut marked = bitbox![0; view.cells()];
    let mut actions = Vec::new();

    for (a, b) in frontier.iter().tuple_combinations() {
        let (pos_a, pos_b) = (view.pos_at(a.index), view.pos_at(b.index));
        if pos_a.row.abs_diff(pos_b.row) > 2 || pos_a.col.abs_diff(pos_b.col) > 2 {
            continue;
        }

        let shared: Vec<usize> = a
            .hidden
            .iter()
            .filter(|index| b.hidden.contains(index))
            .copied()
            .collect();
        if shared.is_empty() {
            continue;
        }
        let shared_max = a.remaining.min(b.remaining).min(shared.len());

        for cell in [a, b] {
            let private: Vec<usize> = cell
                .hidden
                .iter()
                .filter(|index| !shared.contains(index))
                .copied()
                .collect();
            if !private.is_empty() && cell.remaining - shared_max == private.len() {
                for neighbor in private {
                    if !marked.replace(neighbor, true) {
                        actions.push(Action::Flag(view.pos_at(neighbor)));
                    }
                }
            }
        }
    }
    actions
}

/// Opens one arbitrary hidden cell.
///
/// The fallback when no deductive rule fires; not a [`Rule`] since it needs randomness.
pub fn random_guess(view: &BoardView, rng: &mut dyn RngCore) -> Vec<Action> {
    view.hidden_indices()
        .choose(rng)
        .map(|index| vec![Action::Select(view.pos_at(index))])
        .unwrap_or_default()
}
