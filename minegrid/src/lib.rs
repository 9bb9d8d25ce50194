//! A Minesweeper engine with pluggable mine seeding and a rule-based solver.
//!
//! [`board::Board`] owns the authoritative game state and exposes the four player moves
//! (select, flag, chord and superchord) plus a first-select redeal that keeps opening moves
//! survivable. [`seeder`] produces mine layouts, [`solver`] derives safe moves from a
//! [`snapshot::BoardView`], and [`agent`] wires rules together into full players a driver can
//! run unattended.

pub mod action;
pub mod agent;
pub mod board;
pub mod grid;
pub mod mine_map;
pub mod proximity;
pub mod seeder;
pub mod snapshot;
pub mod solver;
