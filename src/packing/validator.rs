//! Geometric validation of packing solutions

use super::solution::Solution;
use crate::floorplan::{Circuit, Instance};
use itertools::Itertools;
use std::time::Instant;
use thiserror::Error;

/// Checks a solution independently of the encoding that produced it
pub struct SolutionValidator {
    allow_rotation: bool,
}

/// A single reason a solution is rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Violation {
    #[error("board width {found} differs from instance width {expected}")]
    BoardWidth { expected: usize, found: usize },
    #[error("solution has {found} circuits, instance has {expected}")]
    CircuitCount { expected: usize, found: usize },
    #[error("solution lists {circuits} circuits but {offsets} offset pairs")]
    OffsetCount { circuits: usize, offsets: usize },
    #[error("circuit {circuit} is {found}, instance gives {expected}")]
    Dimensions {
        circuit: usize,
        expected: Circuit,
        found: Circuit,
    },
    #[error("circuit {circuit} is rotated but rotation is disabled")]
    RotationNotAllowed { circuit: usize },
    #[error("circuit {circuit} at ({x}, {y}) sized {size} leaves the {board_width}x{board_height} board")]
    OutOfBounds {
        circuit: usize,
        x: usize,
        y: usize,
        size: Circuit,
        board_width: usize,
        board_height: usize,
    },
    #[error("circuits {first} and {second} overlap")]
    Overlap { first: usize, second: usize },
}

/// Result of solution validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
    pub error_message: Option<String>,
    pub details: ValidationDetails,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationDetails {
    pub circuits_checked: usize,
    pub pairs_checked: usize,
    pub validation_time_ms: u64,
}

impl SolutionValidator {
    pub fn new(allow_rotation: bool) -> Self {
        Self { allow_rotation }
    }

    /// Validate a solution against the instance it claims to pack
    pub fn validate(&self, solution: &Solution, original: &Instance) -> ValidationResult {
        let start_time = Instant::now();
        let mut violations = self.check_instance(solution, original);
        let (geometry, details) = Self::check_geometry(solution);
        violations.extend(geometry);

        Self::finish(violations, details, start_time)
    }

    fn finish(violations: Vec<Violation>, mut details: ValidationDetails, start_time: Instant) -> ValidationResult {
        details.validation_time_ms = start_time.elapsed().as_millis() as u64;
        let is_valid = violations.is_empty();
        let error_message = if is_valid {
            None
        } else {
            Some(Self::generate_error_message(&violations))
        };

        ValidationResult {
            is_valid,
            violations,
            error_message,
            details,
        }
    }

    fn check_instance(&self, solution: &Solution, original: &Instance) -> Vec<Violation> {
        let mut violations = Vec::new();

        if solution.board_width != original.board_width {
            violations.push(Violation::BoardWidth {
                expected: original.board_width,
                found: solution.board_width,
            });
        }

        if solution.len() != original.len() {
            violations.push(Violation::CircuitCount {
                expected: original.len(),
                found: solution.len(),
            });
        }

        for (i, (placed, given)) in solution.circuits.iter().zip(&original.circuits).enumerate() {
            let rotated = solution.rotated.get(i).copied().unwrap_or(false);
            let expected = if rotated { given.rotated() } else { *given };

            if *placed != expected {
                violations.push(Violation::Dimensions {
                    circuit: i,
                    expected,
                    found: *placed,
                });
            }

            if rotated && !self.allow_rotation && !given.is_square() {
                violations.push(Violation::RotationNotAllowed { circuit: i });
            }
        }

        violations
    }

    fn check_geometry(solution: &Solution) -> (Vec<Violation>, ValidationDetails) {
        let mut violations = Vec::new();
        let mut details = ValidationDetails::default();

        let offsets = solution.x.len().min(solution.y.len());
        if offsets != solution.len() {
            violations.push(Violation::OffsetCount {
                circuits: solution.len(),
                offsets,
            });
        }

        let placements = solution.placements();
        details.circuits_checked = placements.len();

        for p in &placements {
            if p.right() > solution.board_width || p.top() > solution.board_height {
                violations.push(Violation::OutOfBounds {
                    circuit: p.index,
                    x: p.x,
                    y: p.y,
                    size: Circuit::new(p.width, p.height),
                    board_width: solution.board_width,
                    board_height: solution.board_height,
                });
            }
        }

        for (a, b) in placements.iter().tuple_combinations() {
            details.pairs_checked += 1;
            if a.overlaps(b) {
                violations.push(Violation::Overlap {
                    first: a.index,
                    second: b.index,
                });
            }
        }

        (violations, details)
    }

    fn generate_error_message(violations: &[Violation]) -> String {
        let mut message = format!("Found {} violations. ", violations.len());

        for (i, violation) in violations.iter().take(3).enumerate() {
            if i == 0 {
                message.push_str("Examples: ");
            }
            message.push_str(&format!("{}; ", violation));
        }

        if violations.len() > 3 {
            message.push_str(&format!("... and {} more", violations.len() - 3));
        }

        message
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Validation Result:")?;
        writeln!(f, "  Valid: {}", self.is_valid)?;
        writeln!(f, "  Circuits checked: {}", self.details.circuits_checked)?;
        writeln!(f, "  Pairs checked: {}", self.details.pairs_checked)?;
        writeln!(f, "  Validation time: {}ms", self.details.validation_time_ms)?;

        if !self.violations.is_empty() {
            writeln!(f, "  Violations:")?;
            for violation in &self.violations {
                writeln!(f, "    - {}", violation)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packing::solution::SolutionMetadata;
    use crate::sat::Layout;
    use std::time::Duration;

    fn solution(instance: &Instance, height: usize, x: Vec<usize>, y: Vec<usize>, rotated: Vec<bool>) -> Solution {
        Solution::new(
            instance,
            height,
            Layout { x, y, rotated },
            Duration::ZERO,
            SolutionMetadata::default(),
        )
    }

    #[test]
    fn test_valid_solution() {
        let instance = Instance::from_dimensions(3, &[2, 1], &[2, 2]).unwrap();
        let sol = solution(&instance, 2, vec![0, 2], vec![0, 0], vec![false, false]);

        let result = SolutionValidator::new(true).validate(&sol, &instance);
        assert!(result.is_valid, "{}", result);
        assert_eq!(result.details.pairs_checked, 1);
        assert!(result.error_message.is_none());
    }

    #[test]
    fn test_overlap_detected() {
        let instance = Instance::from_dimensions(3, &[2, 2], &[2, 2]).unwrap();
        let sol = solution(&instance, 4, vec![0, 1], vec![0, 1], vec![false, false]);

        let result = SolutionValidator::new(true).validate(&sol, &instance);
        assert!(!result.is_valid);
        assert_eq!(result.violations, vec![Violation::Overlap { first: 0, second: 1 }]);
    }

    #[test]
    fn test_out_of_bounds_detected() {
        let instance = Instance::from_dimensions(3, &[2], &[2]).unwrap();
        let sol = solution(&instance, 2, vec![2], vec![0], vec![false]);

        let result = SolutionValidator::new(true).validate(&sol, &instance);
        assert!(!result.is_valid);
        assert!(matches!(result.violations[0], Violation::OutOfBounds { circuit: 0, .. }));
    }

    #[test]
    fn test_rotated_dimensions_must_be_swapped() {
        let original = Instance::from_dimensions(2, &[5], &[2]).unwrap();

        let mut rotated = original.clone();
        rotated.apply_rotations(&[true]);
        let good = solution(&rotated, 5, vec![0], vec![0], vec![true]);
        assert!(SolutionValidator::new(true).validate(&good, &original).is_valid);

        // Flag set but dimensions left as given
        let bad = solution(&original, 5, vec![0], vec![0], vec![true]);
        let result = SolutionValidator::new(true).validate(&bad, &original);
        assert!(result
            .violations
            .iter()
            .any(|v| matches!(v, Violation::Dimensions { circuit: 0, .. })));
    }

    #[test]
    fn test_rotation_disabled() {
        let original = Instance::from_dimensions(2, &[5], &[2]).unwrap();
        let mut rotated = original.clone();
        rotated.apply_rotations(&[true]);
        let sol = solution(&rotated, 5, vec![0], vec![0], vec![true]);

        let result = SolutionValidator::new(false).validate(&sol, &original);
        assert_eq!(result.violations, vec![Violation::RotationNotAllowed { circuit: 0 }]);
    }

    #[test]
    fn test_instance_mismatch() {
        let original = Instance::from_dimensions(3, &[2, 1], &[2, 2]).unwrap();
        let other = Instance::from_dimensions(4, &[2], &[2]).unwrap();
        let sol = solution(&other, 2, vec![0], vec![0], vec![false]);

        let result = SolutionValidator::new(true).validate(&sol, &original);
        assert!(result.violations.contains(&Violation::BoardWidth { expected: 3, found: 4 }));
        assert!(result.violations.contains(&Violation::CircuitCount { expected: 2, found: 1 }));
        assert!(result.error_message.unwrap().starts_with("Found 2 violations"));
    }
}
