//! SAT solver integration using CaDiCaL

use super::cnf::Clause;
use anyhow::Result;
use cadical::Solver;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// SAT solver wrapper for CaDiCaL
pub struct SatSolver {
    solver: Solver,
    variable_count: usize,
    clause_count: usize,
    last_result: Option<SolverResultType>,
    last_solve_time: Duration,
}

/// Satisfying assignment returned by the solver
#[derive(Debug, Clone)]
pub struct SolverSolution {
    pub assignment: HashMap<i32, bool>,
    pub solve_time: Duration,
}

impl SolverSolution {
    /// Value of a variable; unassigned variables read as false
    pub fn value(&self, var: i32) -> bool {
        self.assignment.get(&var).copied().unwrap_or(false)
    }
}

/// Statistics about the solving process
#[derive(Debug, Clone)]
pub struct SolverStatistics {
    pub variable_count: usize,
    pub clause_count: usize,
    pub solve_time: Duration,
    pub result: Option<SolverResultType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverResultType {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

impl SatSolver {
    /// Create a new SAT solver instance
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            variable_count: 0,
            clause_count: 0,
            last_result: None,
            last_solve_time: Duration::ZERO,
        }
    }

    /// Add clauses to the solver
    pub fn add_clauses(&mut self, clauses: &[Clause]) -> Result<()> {
        for clause in clauses {
            self.add_clause(clause)?;
        }
        Ok(())
    }

    /// Add a single clause to the solver
    pub fn add_clause(&mut self, clause: &Clause) -> Result<()> {
        if clause.is_empty() {
            anyhow::bail!("Cannot add empty clause (unsatisfiable)");
        }

        for &literal in &clause.literals {
            let var = literal.unsigned_abs() as usize;
            if var > self.variable_count {
                self.variable_count = var;
            }
        }

        self.solver.add_clause(clause.literals.iter().copied());

        self.clause_count += 1;
        Ok(())
    }

    /// Run the solver and report sat, unsat or unknown
    pub fn check(&mut self) -> SolverResultType {
        let start_time = Instant::now();
        let result = match self.solver.solve() {
            Some(true) => SolverResultType::Satisfiable,
            Some(false) => SolverResultType::Unsatisfiable,
            None => SolverResultType::Unknown,
        };
        self.last_solve_time = start_time.elapsed();
        self.last_result = Some(result);
        result
    }

    /// Solve the SAT problem and return the satisfying assignment, if any
    pub fn solve(&mut self) -> Result<Option<SolverSolution>> {
        match self.check() {
            SolverResultType::Satisfiable => Ok(Some(SolverSolution {
                assignment: self.extract_assignment(),
                solve_time: self.last_solve_time,
            })),
            SolverResultType::Unsatisfiable | SolverResultType::Unknown => Ok(None),
        }
    }

    /// Extract variable assignment from the solver
    fn extract_assignment(&self) -> HashMap<i32, bool> {
        let mut assignment = HashMap::new();

        for var in 1..=self.variable_count as i32 {
            if let Some(value) = self.solver.value(var) {
                assignment.insert(var, value);
            }
        }

        assignment
    }

    /// Get solver statistics
    pub fn statistics(&self) -> SolverStatistics {
        SolverStatistics {
            variable_count: self.variable_count,
            clause_count: self.clause_count,
            solve_time: self.last_solve_time,
            result: self.last_result,
        }
    }

    /// Get the number of variables
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    /// Get the number of clauses
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    /// Wall time of the most recent check
    pub fn last_solve_time(&self) -> Duration {
        self.last_solve_time
    }
}

impl Default for SatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Solver Statistics:")?;
        writeln!(f, "  Variables: {}", self.variable_count)?;
        writeln!(f, "  Clauses: {}", self.clause_count)?;
        writeln!(f, "  Solve time: {:.3}s", self.solve_time.as_secs_f64())?;
        match self.result {
            Some(result) => writeln!(f, "  Result: {:?}", result)?,
            None => writeln!(f, "  Result: not solved")?,
        }
        Ok(())
    }
}
