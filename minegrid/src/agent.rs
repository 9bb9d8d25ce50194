use rand::{rngs::StdRng, SeedableRng};

use crate::{
    action::Action,
    grid::GridSize,
    snapshot::BoardView,
    solver::{self, Rule},
};

/// End-of-turn feedback pushed back to an agent after its actions were applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameStatus {
    pub completed: bool,
    pub failed: bool,
    pub flags: usize,
    pub open_cells: usize,
    pub open_mines: usize,
}

/// Something that plays rounds of the game against a driver.
///
/// The driver calls [`Self::start`] once per round, then alternates [`Self::act`] with applying
/// the returned actions and reporting the outcome through [`Self::react`]. Returning no actions
/// or [`Action::Surrender`] ends the round from the agent's side.
pub trait Agent {
    /// Called before the first turn of each round.
    fn start(&mut self, size: GridSize);

    /// Proposes the next batch of actions for the given snapshot.
    fn act(&mut self, view: &BoardView) -> Vec<Action>;

    /// Receives the board status after the batch was applied. Optional lookback hook.
    fn react(&mut self, status: GameStatus) {
        let _ = status;
    }
}

/// Plays by picking a random hidden cell every turn. The baseline everything else must beat.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn start(&mut self, _size: GridSize) {}

    fn act(&mut self, view: &BoardView) -> Vec<Action> {
        solver::random_guess(view, &mut self.rng)
    }
}

/// Runs a pipeline of deduction rules, falling back to a random guess when none fires.
///
/// Rules are tried in order each turn and the first non-empty result wins, so cheap rules should
/// come first. With guessing disabled the agent surrenders instead of gambling.
pub struct RulesAgent {
    rules: Vec<Rule>,
    rng: StdRng,
    guess_when_stuck: bool,
}

impl RulesAgent {
    /// The full pipeline, cheapest rule first.
    pub fn new() -> Self {
        Self::with_rules(vec![
            solver::flag_obvious,
            solver::open_satisfied,
            solver::subtract_pairs,
            solver::exact_inference,
        ])
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            rng: StdRng::from_entropy(),
            guess_when_stuck: true,
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new()
        }
    }

    pub fn guess_when_stuck(mut self, guess: bool) -> Self {
        self.guess_when_stuck = guess;
        self
    }
}

impl Default for RulesAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RulesAgent {
    fn start(&mut self, _size: GridSize) {}

    fn act(&mut self, view: &BoardView) -> Vec<Action> {
        for rule in &self.rules {
            let actions = rule(view);
            if !actions.is_empty() {
                return actions;
            }
        }
        if self.guess_when_stuck {
            let guess = solver::random_guess(view, &mut self.rng);
            if !guess.is_empty() {
                return guess;
            }
        }
        vec![Action::Surrender]
    }
}

fn make_random() -> Box<dyn Agent> {
    Box::new(RandomAgent::new())
}

fn make_rules() -> Box<dyn Agent> {
    Box::new(RulesAgent::new())
}

fn make_cautious() -> Box<dyn Agent> {
    Box::new(RulesAgent::new().guess_when_stuck(false))
}

/// Named constructors for every built-in agent.
pub const REGISTRY: &[(&str, fn() -> Box<dyn Agent>)] = &[
    ("random", make_random),
    ("rules", make_rules),
    ("cautious", make_cautious),
];

/// Builds the agent registered under `name`, if any.
pub fn create(name: &str) -> Option<Box<dyn Agent>> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, constructor)| constructor())
}
