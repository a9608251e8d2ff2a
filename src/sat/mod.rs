//! SAT encoding and solving of fixed-height packing problems

pub mod formula;
pub mod variables;
pub mod cnf;
pub mod constraints;
pub mod encoder;
pub mod solver;

pub use formula::Formula;
pub use variables::{PlacementVariables, VariableManager};
pub use cnf::{Clause, CnfEncoder};
pub use constraints::{Axis, ConstraintGenerator, ConstraintStatistics};
pub use encoder::{EncodingStatistics, HeightAttempt, Layout, SatEncoder};
pub use solver::{SatSolver, SolverResultType, SolverSolution};
