use crate::grid::GridPos;

/// A single move requested by a player or agent.
///
/// The first three variants target one cell; [`Action::Superchord`] operates on the whole board
/// and [`Action::Surrender`] asks the driver to abandon the round.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    Select(GridPos),
    Flag(GridPos),
    Chord(GridPos),
    Superchord,
    Surrender,
}
