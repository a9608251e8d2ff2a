//! Height search, solutions and their validation

pub mod batch;
pub mod problem;
pub mod solution;
pub mod validator;

pub use batch::{solve_batch, solve_directory, BatchEntry, BatchStatus};
pub use problem::{InstanceAnalysis, PackingProblem, SearchOutcome};
pub use solution::{PlacedCircuit, Solution, SolutionMetadata, SolutionSummary};
pub use validator::{SolutionValidator, ValidationResult, Violation};
