//! Tseitin transformation of formulas into clauses

use super::formula::Formula;
use super::variables::VariableManager;

/// Represents a SAT clause (disjunction of literals)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub literals: Vec<i32>, // Positive for variable, negative for negation
}

impl Clause {
    /// Create a new clause from literals
    pub fn new(literals: Vec<i32>) -> Self {
        Self { literals }
    }

    /// Create a unit clause (single literal)
    pub fn unit(literal: i32) -> Self {
        Self { literals: vec![literal] }
    }

    /// Create a binary clause (two literals)
    pub fn binary(lit1: i32, lit2: i32) -> Self {
        Self { literals: vec![lit1, lit2] }
    }

    /// Check if clause is empty (unsatisfiable)
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Check if clause is unit
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    pub fn is_satisfied_by<F: Fn(i32) -> bool>(&self, value: &F) -> bool {
        self.literals
            .iter()
            .any(|&lit| value(lit.abs()) == (lit > 0))
    }
}

/// Lowers formulas to CNF, introducing one auxiliary variable per
/// non-literal sub-formula that is not asserted at the top level.
#[derive(Debug, Default)]
pub struct CnfEncoder {
    clauses: Vec<Clause>,
    /// Variable forced true, allocated on first use of a constant
    true_literal: Option<i32>,
}

impl CnfEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add clauses requiring `formula` to hold
    pub fn assert(&mut self, formula: &Formula, vars: &mut VariableManager) {
        match formula {
            Formula::Const(true) => {}
            Formula::Const(false) => {
                let t = self.true_literal(vars);
                self.clauses.push(Clause::unit(-t));
            }
            Formula::Var(id) => self.clauses.push(Clause::unit(*id)),
            Formula::And(fs) => {
                for f in fs {
                    self.assert(f, vars);
                }
            }
            Formula::Or(fs) => {
                if fs.is_empty() {
                    self.assert(&Formula::Const(false), vars);
                } else {
                    let literals = fs.iter().map(|f| self.define(f, vars)).collect();
                    self.clauses.push(Clause::new(literals));
                }
            }
            Formula::Implies(a, b) => {
                let la = self.define(a, vars);
                let lb = self.define(b, vars);
                self.clauses.push(Clause::binary(-la, lb));
            }
            Formula::Not(inner) => self.assert_negation(inner, vars),
            Formula::Xor(..) => {
                let lit = self.define(formula, vars);
                self.clauses.push(Clause::unit(lit));
            }
        }
    }

    fn assert_negation(&mut self, inner: &Formula, vars: &mut VariableManager) {
        match inner {
            Formula::Const(b) => self.assert(&Formula::Const(!b), vars),
            Formula::Var(id) => self.clauses.push(Clause::unit(-id)),
            Formula::Not(f) => self.assert(f, vars),
            Formula::And(fs) => {
                if fs.is_empty() {
                    self.assert(&Formula::Const(false), vars);
                } else {
                    let literals = fs.iter().map(|f| -self.define(f, vars)).collect();
                    self.clauses.push(Clause::new(literals));
                }
            }
            Formula::Or(fs) => {
                for f in fs {
                    self.assert_negation(f, vars);
                }
            }
            Formula::Implies(a, b) => {
                self.assert(a, vars);
                self.assert_negation(b, vars);
            }
            Formula::Xor(..) => {
                let lit = self.define(inner, vars);
                self.clauses.push(Clause::unit(-lit));
            }
        }
    }

    /// Return a literal equivalent to `formula`
    pub fn define(&mut self, formula: &Formula, vars: &mut VariableManager) -> i32 {
        match formula {
            Formula::Const(true) => self.true_literal(vars),
            Formula::Const(false) => -self.true_literal(vars),
            Formula::Var(id) => *id,
            Formula::Not(inner) => -self.define(inner, vars),
            Formula::And(fs) => {
                let literals: Vec<i32> = fs.iter().map(|f| self.define(f, vars)).collect();
                match literals.as_slice() {
                    [] => self.true_literal(vars),
                    [single] => *single,
                    _ => {
                        let a = vars.fresh_auxiliary();
                        let mut long = Vec::with_capacity(literals.len() + 1);
                        long.push(a);
                        for &lit in &literals {
                            self.clauses.push(Clause::binary(-a, lit));
                            long.push(-lit);
                        }
                        self.clauses.push(Clause::new(long));
                        a
                    }
                }
            }
            Formula::Or(fs) => {
                let literals: Vec<i32> = fs.iter().map(|f| self.define(f, vars)).collect();
                match literals.as_slice() {
                    [] => -self.true_literal(vars),
                    [single] => *single,
                    _ => {
                        let o = vars.fresh_auxiliary();
                        let mut long = Vec::with_capacity(literals.len() + 1);
                        long.push(-o);
                        for &lit in &literals {
                            self.clauses.push(Clause::binary(o, -lit));
                            long.push(lit);
                        }
                        self.clauses.push(Clause::new(long));
                        o
                    }
                }
            }
            Formula::Xor(a, b) => {
                let la = self.define(a, vars);
                let lb = self.define(b, vars);
                let x = vars.fresh_auxiliary();
                self.clauses.push(Clause::new(vec![-x, la, lb]));
                self.clauses.push(Clause::new(vec![-x, -la, -lb]));
                self.clauses.push(Clause::new(vec![x, -la, lb]));
                self.clauses.push(Clause::new(vec![x, la, -lb]));
                x
            }
            Formula::Implies(a, b) => {
                let la = self.define(a, vars);
                let lb = self.define(b, vars);
                let o = vars.fresh_auxiliary();
                self.clauses.push(Clause::binary(o, la));
                self.clauses.push(Clause::binary(o, -lb));
                self.clauses.push(Clause::new(vec![-o, -la, lb]));
                o
            }
        }
    }

    fn true_literal(&mut self, vars: &mut VariableManager) -> i32 {
        match self.true_literal {
            Some(t) => t,
            None => {
                let t = vars.fresh_auxiliary();
                self.clauses.push(Clause::unit(t));
                self.true_literal = Some(t);
                t
            }
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    pub fn into_clauses(self) -> Vec<Clause> {
        self.clauses
    }
}
