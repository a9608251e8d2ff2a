//! Propositional formulas over SAT variables
//!
//! The placement constraints are stated as formulas built from the usual
//! connectives and only lowered to clauses by the [`CnfEncoder`](super::CnfEncoder).

use std::fmt;

/// A propositional formula over positive integer variable ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    Const(bool),
    Var(i32),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Xor(Box<Formula>, Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn var(id: i32) -> Self {
        debug_assert!(id > 0, "variable ids are positive");
        Formula::Var(id)
    }

    pub fn negate(f: Formula) -> Self {
        match f {
            Formula::Const(b) => Formula::Const(!b),
            Formula::Not(inner) => *inner,
            other => Formula::Not(Box::new(other)),
        }
    }

    /// Conjunction; the empty conjunction is true
    pub fn and<I: IntoIterator<Item = Formula>>(fs: I) -> Self {
        Formula::And(fs.into_iter().collect())
    }

    /// Disjunction; the empty disjunction is false
    pub fn or<I: IntoIterator<Item = Formula>>(fs: I) -> Self {
        Formula::Or(fs.into_iter().collect())
    }

    pub fn xor(a: Formula, b: Formula) -> Self {
        Formula::Xor(Box::new(a), Box::new(b))
    }

    pub fn implies(a: Formula, b: Formula) -> Self {
        Formula::Implies(Box::new(a), Box::new(b))
    }

    /// Evaluate under an assignment; unassigned variables read as false
    pub fn eval<F: Fn(i32) -> bool>(&self, value: &F) -> bool {
        match self {
            Formula::Const(b) => *b,
            Formula::Var(id) => value(*id),
            Formula::Not(f) => !f.eval(value),
            Formula::And(fs) => fs.iter().all(|f| f.eval(value)),
            Formula::Or(fs) => fs.iter().any(|f| f.eval(value)),
            Formula::Xor(a, b) => a.eval(value) != b.eval(value),
            Formula::Implies(a, b) => !a.eval(value) || b.eval(value),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, fs: &[Formula], op: &str, empty: &str) -> fmt::Result {
            if fs.is_empty() {
                return write!(f, "{}", empty);
            }
            write!(f, "(")?;
            for (i, sub) in fs.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", sub)?;
            }
            write!(f, ")")
        }

        match self {
            Formula::Const(b) => write!(f, "{}", if *b { "⊤" } else { "⊥" }),
            Formula::Var(id) => write!(f, "v{}", id),
            Formula::Not(inner) => write!(f, "¬{}", inner),
            Formula::And(fs) => join(f, fs, "∧", "⊤"),
            Formula::Or(fs) => join(f, fs, "∨", "⊥"),
            Formula::Xor(a, b) => write!(f, "({} ⊕ {})", a, b),
            Formula::Implies(a, b) => write!(f, "({} → {})", a, b),
        }
    }
}
