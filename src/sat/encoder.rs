//! SAT encoder for one candidate board height

use super::constraints::{ConstraintGenerator, ConstraintStatistics};
use super::solver::{SatSolver, SolverResultType, SolverSolution};
use super::variables::VariableStatistics;
use crate::config::{EncodingConfig, EncodingStrength};
use crate::floorplan::Instance;
use anyhow::{Context, Result};
use std::time::Duration;

/// Offsets and rotation flags decoded from a satisfying assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub x: Vec<usize>,
    pub y: Vec<usize>,
    pub rotated: Vec<bool>,
}

/// Outcome of checking a single board height
#[derive(Debug, Clone)]
pub struct HeightAttempt {
    pub board_height: usize,
    pub result: SolverResultType,
    pub solve_time: Duration,
    pub variables: usize,
    pub clauses: usize,
}

/// Encodes an instance at a fixed board height, solves it and decodes the model
pub struct SatEncoder {
    instance: Instance,
    encoding: EncodingConfig,
    constraint_generator: ConstraintGenerator,
    solver: SatSolver,
    board_height: usize,
    encoded: bool,
}

impl SatEncoder {
    /// Create an encoder with fresh variables for `board_height`
    pub fn new(instance: &Instance, board_height: usize, encoding: &EncodingConfig) -> Result<Self> {
        let constraint_generator = ConstraintGenerator::new(instance, board_height, encoding)
            .with_context(|| format!("Failed to allocate variables for height {}", board_height))?;

        Ok(Self {
            instance: instance.clone(),
            encoding: encoding.clone(),
            constraint_generator,
            solver: SatSolver::new(),
            board_height,
            encoded: false,
        })
    }

    /// Generate the enabled constraints and hand them to the solver
    pub fn encode(&mut self) -> Result<()> {
        if self.encoded {
            return Ok(());
        }

        let clauses = self.constraint_generator.generate_all_constraints();
        self.solver
            .add_clauses(&clauses)
            .context("Failed to add clauses to SAT solver")?;
        self.encoded = true;

        Ok(())
    }

    /// Check the height and decode the layout when satisfiable
    pub fn solve(&mut self) -> Result<(HeightAttempt, Option<Layout>)> {
        self.encode()?;

        let solution = self.solver.solve().context("SAT solving failed")?;
        let statistics = self.solver.statistics();

        let attempt = HeightAttempt {
            board_height: self.board_height,
            result: statistics.result.unwrap_or(SolverResultType::Unknown),
            solve_time: statistics.solve_time,
            variables: self.constraint_generator.variable_manager().variable_count(),
            clauses: statistics.clause_count,
        };

        let layout = match solution {
            Some(solution) => Some(self.decode(&solution)?),
            None => None,
        };

        Ok((attempt, layout))
    }

    /// Read offsets and rotations out of a satisfying assignment.
    ///
    /// The offset on each axis is the first index at which the model asserts
    /// the circuit's whole run for its chosen orientation. With strong
    /// existence this is simply the first true indicator.
    pub fn decode(&self, solution: &SolverSolution) -> Result<Layout> {
        let vars = self.constraint_generator.variables();
        let n = self.instance.len();

        let mut layout = Layout {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            rotated: Vec::with_capacity(n),
        };

        for (c, circuit) in self.instance.circuits.iter().enumerate() {
            let rotated = solution.value(vars.r[c]);
            let oriented = if rotated { circuit.rotated() } else { *circuit };

            let x = Self::first_run_offset(&vars.x[c], oriented.width, solution)
                .with_context(|| format!("Model places circuit {} in no column run", c))?;
            let y = Self::first_run_offset(&vars.y[c], oriented.height, solution)
                .with_context(|| format!("Model places circuit {} in no row run", c))?;

            layout.x.push(x);
            layout.y.push(y);
            layout.rotated.push(rotated);
        }

        Ok(layout)
    }

    /// First offset whose whole run of `span` indicators is true
    fn first_run_offset(vars: &[i32], span: usize, solution: &SolverSolution) -> Option<usize> {
        if span > vars.len() {
            return None;
        }

        (0..=vars.len() - span).find(|&i| vars[i..i + span].iter().all(|&v| solution.value(v)))
    }

    /// Get encoding statistics
    pub fn statistics(&self) -> EncodingStatistics {
        EncodingStatistics {
            circuits: self.instance.len(),
            board_width: self.instance.board_width,
            board_height: self.board_height,
            strength: self.encoding.strength,
            allow_rotation: self.encoding.allow_rotation,
            variables: self.constraint_generator.variable_manager().statistics(),
            constraints: self.constraint_generator.statistics().clone(),
        }
    }
}

/// Statistics about the SAT encoding of one height
#[derive(Debug, Clone)]
pub struct EncodingStatistics {
    pub circuits: usize,
    pub board_width: usize,
    pub board_height: usize,
    pub strength: EncodingStrength,
    pub allow_rotation: bool,
    pub variables: VariableStatistics,
    pub constraints: ConstraintStatistics,
}

impl std::fmt::Display for EncodingStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Encoding Statistics:")?;
        writeln!(f, "  Board: {}x{}", self.board_width, self.board_height)?;
        writeln!(f, "  Circuits: {}", self.circuits)?;
        writeln!(f, "  Strength: {:?}", self.strength)?;
        writeln!(f, "  Rotation allowed: {}", self.allow_rotation)?;
        write!(f, "{}", self.variables)?;
        write!(f, "{}", self.constraints)?;
        Ok(())
    }
}
