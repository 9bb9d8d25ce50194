use bitvec::bitbox;

use crate::{action::Action, snapshot::BoardView};

/// Components with more hidden cells than this are skipped rather than enumerated.
const MAX_COMPONENT_VARS: u32 = 20;

/// One open numbered cell expressed as an equation over its hidden neighbors.
///
/// Exactly `remaining` of the cells in `hidden` are mines.
#[derive(Clone, Debug)]
struct CellConstraint {
    remaining: usize,
    hidden: Vec<usize>,
}

impl CellConstraint {
    fn overlaps(&self, other: &Self) -> bool {
        self.hidden.iter().any(|index| other.hidden.contains(index))
    }
}

fn gather(view: &BoardView) -> Vec<CellConstraint> {
    view.open_indices()
        .filter_map(|index| {
            let proximity = view.proximity(index);
            if proximity < 0 {
                return None;
            }
            let mut remaining = proximity as usize;
            let mut hidden = Vec::new();
            for neighbor in view.size().neighbor_indices(index) {
                if view.is_flagged(neighbor) || view.proximity(neighbor) < 0 {
                    // flags and mines already open on forgiving boards are accounted for
                    remaining = remaining.checked_sub(1)?;
                } else if view.is_hidden(neighbor) {
                    hidden.push(neighbor);
                }
            }
            if hidden.is_empty() {
                return None;
            }
            Some(CellConstraint { remaining, hidden })
        })
        .collect()
}

/// Partitions constraints into connected components under shared-cell overlap.
///
/// Constraints in different components share no hidden cells, so each component can be
/// enumerated independently, which keeps the exponential step bounded by the largest
/// component rather than the whole frontier.
fn group_overlapping(mut constraints: Vec<CellConstraint>) -> Vec<Vec<CellConstraint>> {
    let mut groups: Vec<Vec<CellConstraint>> = Vec::new();
    while let Some(constraint) = constraints.pop() {
        let mut group = vec![constraint];
        // Adding a constraint can bridge previously separate ones, so rescan until settled.
        loop {
            let before = group.len();
            let mut index = 0;
            while index < constraints.len() {
                if group.iter().any(|member| member.overlaps(&constraints[index])) {
                    group.push(constraints.swap_remove(index));
                } else {
                    index += 1;
                }
            }
            if group.len() == before {
                break;
            }
        }
        groups.push(group);
    }
    groups
}

/// Cells proven mined or safe in every mine placement consistent with one component.
fn solve_component(view: &BoardView, component: &[CellConstraint]) -> Vec<Action> {
    let mut vars: Vec<usize> = component
        .iter()
        .flat_map(|constraint| constraint.hidden.iter().copied())
        .collect();
    vars.sort_unstable();
    vars.dedup();
    if vars.len() as u32 > MAX_COMPONENT_VARS {
        return Vec::new();
    }

    // Local bit positions of each constraint's hidden cells within the component.
    let constraint_masks: Vec<(usize, u32)> = component
        .iter()
        .map(|constraint| {
            let mask = constraint
                .hidden
                .iter()
                .map(|index| {
                    let bit = vars
                        .binary_search(index)
                        .unwrap_or_else(|_| unreachable!("vars contain every hidden cell"));
                    1u32 << bit
                })
                .fold(0, |mask, bit| mask | bit);
            (constraint.remaining, mask)
        })
        .collect();

    let all = (1u32 << vars.len()) - 1;
    let mut safe = all;
    let mut mined = all;
    let mut any_valid = false;
    for assignment in 0..=all {
        let valid = constraint_masks
            .iter()
            .all(|&(remaining, mask)| (assignment & mask).count_ones() as usize == remaining);
        if valid {
            any_valid = true;
            safe &= !assignment;
            mined &= assignment;
        }
    }
    if !any_valid {
        return Vec::new();
    }

    let mut actions = Vec::new();
    for (bit, &index) in vars.iter().enumerate() {
        if mined & (1 << bit) != 0 {
            actions.push(Action::Flag(view.pos_at(index)));
        } else if safe & (1 << bit) != 0 {
            actions.push(Action::Select(view.pos_at(index)));
        }
    }
    actions
}

/// Exhaustive inference over the constraint frontier.
///
/// Builds one equation per open numbered cell, splits the system into overlap components and
/// enumerates every mine placement per component. Cells that come out mined in all placements
/// are flagged, cells that come out clear in all placements are opened. Finds everything the
/// cheaper rules find and more, at exponential cost in the component size; oversized components
/// yield nothing rather than stall the turn.
pub fn exact_inference(view: &BoardView) -> Vec<Action> {
    let constraints = gather(view);
    if constraints.is_empty() {
        return Vec::new();
    }

    let mut marked = bitbox![0; view.cells()];
    let mut actions = Vec::new();
    for component in group_overlapping(constraints) {
        for action in solve_component(view, &component) {
            let (Action::Flag(pos) | Action::Select(pos)) = action else {
                continue;
            };
            let index = view
                .size()
                .index_of(pos)
                .unwrap_or_else(|| unreachable!("component cells lie on the grid"));
            if !marked.replace(index, true) {
                actions.push(action);
            }
        }
    }
    actions
}
