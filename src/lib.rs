//! SAT-based VLSI Floorplanner
//!
//! This library packs rectangular circuits onto a board of fixed width,
//! searching ascending board heights and deciding each one with a SAT solver.

pub mod config;
pub mod floorplan;
pub mod sat;
pub mod packing;
pub mod utils;

pub use config::Settings;
pub use floorplan::{Circuit, HeightRange, Instance};
pub use packing::{PackingProblem, SearchOutcome, Solution};

use anyhow::Result;

/// Main entry point: load the configured instance and search for the lowest packing
pub fn solve_floorplan(settings: Settings) -> Result<SearchOutcome> {
    let mut problem = PackingProblem::new(settings)?;
    problem.solve()
}

/// Search for the lowest packing of an in-memory instance
pub fn solve_instance(settings: Settings, instance: Instance) -> Result<SearchOutcome> {
    let mut problem = PackingProblem::with_instance(settings, instance)?;
    problem.solve()
}
