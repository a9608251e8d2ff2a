//! Constraint generation for the floorplanning SAT encoding

use super::cnf::{Clause, CnfEncoder};
use super::formula::Formula;
use super::variables::{PlacementVariables, VariableManager};
use crate::config::{EncodingConfig, EncodingStrength};
use crate::floorplan::Instance;
use anyhow::Result;
use itertools::Itertools;

/// Orientation branch of a circuit along one axis, carrying the run length
/// the circuit covers in that orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    NotRotated(usize),
    Rotated(usize),
}

impl Placement {
    /// Both branches for a circuit whose span is `span` un-rotated and
    /// `rotated_span` rotated
    pub fn branches(span: usize, rotated_span: usize) -> [Placement; 2] {
        [Placement::NotRotated(span), Placement::Rotated(rotated_span)]
    }

    pub fn span(self) -> usize {
        match self {
            Placement::NotRotated(span) | Placement::Rotated(span) => span,
        }
    }

    /// Condition on the rotation flag under which this branch applies
    pub fn rotation_condition(self, r: i32) -> Formula {
        match self {
            Placement::NotRotated(_) => Formula::negate(Formula::var(r)),
            Placement::Rotated(_) => Formula::var(r),
        }
    }

    /// Offsets at which a run of this branch fits below `limit`
    pub fn offsets(self, limit: usize) -> std::ops::Range<usize> {
        match (limit + 1).checked_sub(self.span()) {
            Some(count) => 0..count,
            None => 0..0,
        }
    }
}

/// Board axis an occupancy constraint is stated on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Clause counts of one assembled encoding, by constraint family
#[derive(Debug, Clone, Default)]
pub struct ConstraintStatistics {
    pub existence_clauses: usize,
    pub unicity_clauses: usize,
    pub impenetrability_clauses: usize,
    pub rotation_clauses: usize,
    pub total_clauses: usize,
}

/// Generates SAT constraints placing every circuit on a board of fixed height
pub struct ConstraintGenerator {
    variable_manager: VariableManager,
    variables: PlacementVariables,
    widths: Vec<usize>,
    heights: Vec<usize>,
    board_width: usize,
    board_height: usize,
    strength: EncodingStrength,
    allow_rotation: bool,
    statistics: ConstraintStatistics,
}

impl ConstraintGenerator {
    /// Create a generator with fresh variables for `board_height`
    pub fn new(instance: &Instance, board_height: usize, encoding: &EncodingConfig) -> Result<Self> {
        let mut variable_manager = VariableManager::new(instance.len(), instance.board_width, board_height);
        let variables = variable_manager.placement_variables()?;

        Ok(Self {
            variable_manager,
            variables,
            widths: instance.widths(),
            heights: instance.heights(),
            board_width: instance.board_width,
            board_height,
            strength: encoding.strength,
            allow_rotation: encoding.allow_rotation,
            statistics: ConstraintStatistics::default(),
        })
    }

    /// Generate all enabled constraints as clauses
    pub fn generate_all_constraints(&mut self) -> Vec<Clause> {
        let mut encoder = CnfEncoder::new();

        // 1. Existence on both axes, sharing the rotation flags
        let before = encoder.clause_count();
        for axis in [Axis::Horizontal, Axis::Vertical] {
            let existence = if self.strength.uses_strong_existence() {
                self.strong_existence(axis)
            } else {
                self.existence(axis)
            };
            encoder.assert(&existence, &mut self.variable_manager);
        }
        self.statistics.existence_clauses = encoder.clause_count() - before;

        // 2. Unicity (if enabled)
        let before = encoder.clause_count();
        if self.strength.uses_unicity() {
            for axis in [Axis::Horizontal, Axis::Vertical] {
                encoder.assert(&self.unicity(axis), &mut self.variable_manager);
            }
        }
        self.statistics.unicity_clauses = encoder.clause_count() - before;

        // 3. Pairwise non-overlap
        let before = encoder.clause_count();
        encoder.assert(&self.impenetrability(), &mut self.variable_manager);
        self.statistics.impenetrability_clauses = encoder.clause_count() - before;

        // 4. Rotation lock (if rotation is disabled)
        let before = encoder.clause_count();
        if !self.allow_rotation {
            encoder.assert(&self.rotation_lock(), &mut self.variable_manager);
        }
        self.statistics.rotation_clauses = encoder.clause_count() - before;

        self.statistics.total_clauses = encoder.clause_count();
        encoder.into_clauses()
    }

    /// Occupancy variables, un-rotated spans, rotated spans and bound of an axis
    fn axis(&self, axis: Axis) -> (&[Vec<i32>], &[usize], &[usize], usize) {
        match axis {
            Axis::Horizontal => (
                self.variables.x.as_slice(),
                self.widths.as_slice(),
                self.heights.as_slice(),
                self.board_width,
            ),
            Axis::Vertical => (
                self.variables.y.as_slice(),
                self.heights.as_slice(),
                self.widths.as_slice(),
                self.board_height,
            ),
        }
    }

    /// Every circuit covers a contiguous run on `axis`, either un-rotated or
    /// rotated but not both
    pub fn existence(&self, axis: Axis) -> Formula {
        self.placement_choice(axis, false)
    }

    /// Like [`existence`](Self::existence), additionally forcing every
    /// indicator outside the chosen run to false
    pub fn strong_existence(&self, axis: Axis) -> Formula {
        self.placement_choice(axis, true)
    }

    fn placement_choice(&self, axis: Axis, strong: bool) -> Formula {
        let (vars, spans, rotated_spans, limit) = self.axis(axis);

        Formula::and((0..vars.len()).map(|c| {
            let [straight, turned] = Placement::branches(spans[c], rotated_spans[c]);
            let r = self.variables.r[c];
            Formula::xor(
                Self::branch(&vars[c], straight, limit, r, strong),
                Self::branch(&vars[c], turned, limit, r, strong),
            )
        }))
    }

    /// Disjunction over the offsets at which `placement` fits
    fn branch(vars: &[i32], placement: Placement, limit: usize, r: i32, strong: bool) -> Formula {
        let span = placement.span();

        Formula::or(placement.offsets(limit).map(|i| {
            let mut parts: Vec<Formula> = Self::run(vars, i, span).collect();
            if strong {
                parts.extend(
                    vars.iter()
                        .enumerate()
                        .filter(|(j, _)| *j < i || *j >= i + span)
                        .map(|(_, &v)| Formula::negate(Formula::var(v))),
                );
            }
            parts.push(placement.rotation_condition(r));
            Formula::and(parts)
        }))
    }

    /// Indicators of the run of `span` positions starting at `offset`
    fn run(vars: &[i32], offset: usize, span: usize) -> impl Iterator<Item = Formula> + '_ {
        vars[offset..offset + span].iter().map(|&v| Formula::var(v))
    }

    /// No circuit fully asserts two runs of the same orientation at
    /// different offsets of one axis
    pub fn unicity(&self, axis: Axis) -> Formula {
        let (vars, spans, rotated_spans, limit) = self.axis(axis);
        let mut constraints = Vec::new();

        for c in 0..vars.len() {
            let r = self.variables.r[c];
            for placement in Placement::branches(spans[c], rotated_spans[c]) {
                let span = placement.span();
                for (i, j) in placement.offsets(limit).tuple_combinations() {
                    let both = Self::run(&vars[c], i, span)
                        .chain(Self::run(&vars[c], j, span))
                        .chain(std::iter::once(placement.rotation_condition(r)));
                    constraints.push(Formula::negate(Formula::and(both)));
                }
            }
        }

        Formula::and(constraints)
    }

    /// Two circuits sharing a column share no row
    pub fn impenetrability(&self) -> Formula {
        let x = &self.variables.x;
        let y = &self.variables.y;

        Formula::and((0..x.len()).tuple_combinations().map(|(c, k)| {
            let share_column = Formula::or(
                (0..self.board_width).map(|s| Formula::and([Formula::var(x[c][s]), Formula::var(x[k][s])])),
            );
            let disjoint_rows = Formula::and((0..self.board_height).map(|i| {
                Formula::negate(Formula::and([Formula::var(y[c][i]), Formula::var(y[k][i])]))
            }));
            Formula::implies(share_column, disjoint_rows)
        }))
    }

    /// Pin every rotation flag to false
    pub fn rotation_lock(&self) -> Formula {
        Formula::and(self.variables.r.iter().map(|&r| Formula::negate(Formula::var(r))))
    }

    pub fn variables(&self) -> &PlacementVariables {
        &self.variables
    }

    pub fn variable_manager(&self) -> &VariableManager {
        &self.variable_manager
    }

    pub fn board_height(&self) -> usize {
        self.board_height
    }

    /// Clause counts of the last [`generate_all_constraints`](Self::generate_all_constraints) call
    pub fn statistics(&self) -> &ConstraintStatistics {
        &self.statistics
    }
}

impl std::fmt::Display for ConstraintStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Constraint Statistics:")?;
        writeln!(f, "  Existence clauses: {}", self.existence_clauses)?;
        writeln!(f, "  Unicity clauses: {}", self.unicity_clauses)?;
        writeln!(f, "  Impenetrability clauses: {}", self.impenetrability_clauses)?;
        writeln!(f, "  Rotation clauses: {}", self.rotation_clauses)?;
        writeln!(f, "  Total clauses: {}", self.total_clauses)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn encoding(strength: EncodingStrength) -> EncodingConfig {
        EncodingConfig {
            strength,
            allow_rotation: true,
        }
    }

    /// Assignment placing each circuit at the given offsets and orientation
    fn layout_assignment(
        generator: &ConstraintGenerator,
        placed: &[(usize, usize, usize, usize, bool)],
    ) -> HashMap<i32, bool> {
        let vars = generator.variables();
        let mut assignment = HashMap::new();

        for (c, &(x, y, w, h, rotated)) in placed.iter().enumerate() {
            for (j, &v) in vars.x[c].iter().enumerate() {
                assignment.insert(v, j >= x && j < x + w);
            }
            for (j, &v) in vars.y[c].iter().enumerate() {
                assignment.insert(v, j >= y && j < y + h);
            }
            assignment.insert(vars.r[c], rotated);
        }

        assignment
    }

    fn holds(formula: &Formula, assignment: &HashMap<i32, bool>) -> bool {
        formula.eval(&|id| assignment.get(&id).copied().unwrap_or(false))
    }

    #[test]
    fn test_placement_branches() {
        let [straight, turned] = Placement::branches(3, 1);
        assert_eq!(straight.span(), 3);
        assert_eq!(turned.span(), 1);
        assert_eq!(straight.offsets(4), 0..2);
        assert_eq!(turned.offsets(4), 0..4);
        assert_eq!(Placement::NotRotated(5).offsets(2), 0..0);
        assert_eq!(straight.rotation_condition(7), Formula::negate(Formula::var(7)));
        assert_eq!(turned.rotation_condition(7), Formula::var(7));
    }

    #[test]
    fn test_existence_accepts_valid_layout() {
        let instance = Instance::from_dimensions(3, &[2, 1], &[2, 2]).unwrap();
        let generator = ConstraintGenerator::new(&instance, 2, &encoding(EncodingStrength::Basic)).unwrap();

        let assignment = layout_assignment(&generator, &[(0, 0, 2, 2, false), (2, 0, 1, 2, false)]);
        assert!(holds(&generator.existence(Axis::Horizontal), &assignment));
        assert!(holds(&generator.existence(Axis::Vertical), &assignment));
        assert!(holds(&generator.impenetrability(), &assignment));
    }

    #[test]
    fn test_existence_ties_axes_to_the_rotation_flag() {
        let instance = Instance::from_dimensions(3, &[3], &[1]).unwrap();
        let generator = ConstraintGenerator::new(&instance, 3, &encoding(EncodingStrength::Basic)).unwrap();

        // Rotated footprint 1x3 claimed with the flag unset
        let assignment = layout_assignment(&generator, &[(0, 0, 1, 3, false)]);
        assert!(!holds(&generator.existence(Axis::Horizontal), &assignment));

        let assignment = layout_assignment(&generator, &[(0, 0, 1, 3, true)]);
        assert!(holds(&generator.existence(Axis::Horizontal), &assignment));
        assert!(holds(&generator.existence(Axis::Vertical), &assignment));
    }

    #[test]
    fn test_existence_rejects_circuit_wider_than_board() {
        let instance = Instance::from_dimensions(2, &[3], &[3]).unwrap();
        let generator = ConstraintGenerator::new(&instance, 3, &encoding(EncodingStrength::Basic)).unwrap();

        let assignment: HashMap<i32, bool> = (1..=generator.variable_manager().variable_count() as i32)
            .map(|v| (v, true))
            .collect();
        assert!(!holds(&generator.existence(Axis::Horizontal), &assignment));
    }

    #[test]
    fn test_strong_existence_rejects_stray_indicators() {
        let instance = Instance::from_dimensions(4, &[2], &[1]).unwrap();
        let generator = ConstraintGenerator::new(&instance, 1, &encoding(EncodingStrength::Strong)).unwrap();

        let mut assignment = layout_assignment(&generator, &[(0, 0, 2, 1, false)]);
        assert!(holds(&generator.strong_existence(Axis::Horizontal), &assignment));

        // Column 3 set outside the run
        assignment.insert(generator.variables().x[0][3], true);
        assert!(holds(&generator.existence(Axis::Horizontal), &assignment));
        assert!(!holds(&generator.strong_existence(Axis::Horizontal), &assignment));
    }

    #[test]
    fn test_unicity_rejects_two_runs() {
        let instance = Instance::from_dimensions(4, &[1], &[1]).unwrap();
        let generator = ConstraintGenerator::new(&instance, 1, &encoding(EncodingStrength::Unique)).unwrap();

        let mut assignment = layout_assignment(&generator, &[(1, 0, 1, 1, false)]);
        assert!(holds(&generator.unicity(Axis::Horizontal), &assignment));

        assignment.insert(generator.variables().x[0][3], true);
        assert!(!holds(&generator.unicity(Axis::Horizontal), &assignment));
    }

    #[test]
    fn test_unicity_uses_the_oriented_span() {
        // Rotated 1x3 circuit covering rows 0..3 of a 3-high board; the
        // un-rotated height 1 would see three runs here
        let instance = Instance::from_dimensions(3, &[3], &[1]).unwrap();
        let generator = ConstraintGenerator::new(&instance, 3, &encoding(EncodingStrength::Unique)).unwrap();

        let assignment = layout_assignment(&generator, &[(0, 0, 1, 3, true)]);
        assert!(holds(&generator.unicity(Axis::Vertical), &assignment));
        assert!(holds(&generator.unicity(Axis::Horizontal), &assignment));
    }

    #[test]
    fn test_impenetrability_rejects_overlap() {
        let instance = Instance::from_dimensions(3, &[2, 2], &[2, 2]).unwrap();
        let generator = ConstraintGenerator::new(&instance, 4, &encoding(EncodingStrength::Basic)).unwrap();

        // Sharing column 1 and row 1
        let overlapping = layout_assignment(&generator, &[(0, 0, 2, 2, false), (1, 1, 2, 2, false)]);
        assert!(!holds(&generator.impenetrability(), &overlapping));

        // Sharing column 1 only
        let stacked = layout_assignment(&generator, &[(0, 0, 2, 2, false), (1, 2, 2, 2, false)]);
        assert!(holds(&generator.impenetrability(), &stacked));
    }

    #[test]
    fn test_rotation_lock() {
        let instance = Instance::from_dimensions(3, &[1, 2], &[2, 1]).unwrap();
        let generator = ConstraintGenerator::new(&instance, 2, &encoding(EncodingStrength::Basic)).unwrap();

        let upright = layout_assignment(&generator, &[(0, 0, 1, 2, false), (1, 0, 2, 1, false)]);
        assert!(holds(&generator.rotation_lock(), &upright));

        let turned = layout_assignment(&generator, &[(0, 0, 2, 1, true), (0, 1, 1, 2, true)]);
        assert!(!holds(&generator.rotation_lock(), &turned));
    }

    #[test]
    fn test_statistics_by_strength() {
        let instance = Instance::from_dimensions(3, &[2, 1], &[2, 2]).unwrap();

        let mut basic = ConstraintGenerator::new(&instance, 3, &encoding(EncodingStrength::Basic)).unwrap();
        let basic_clauses = basic.generate_all_constraints();
        let stats = basic.statistics().clone();
        assert_eq!(stats.total_clauses, basic_clauses.len());
        assert_eq!(stats.unicity_clauses, 0);
        assert_eq!(stats.rotation_clauses, 0);
        assert!(stats.existence_clauses > 0);
        assert!(stats.impenetrability_clauses > 0);
        assert!(basic_clauses.iter().all(|c| !c.is_empty()));

        let mut full = ConstraintGenerator::new(&instance, 3, &encoding(EncodingStrength::StrongUnique)).unwrap();
        let full_clauses = full.generate_all_constraints();
        assert!(full.statistics().unicity_clauses > 0);
        assert!(full_clauses.len() > basic_clauses.len());

        let mut locked = ConstraintGenerator::new(
            &instance,
            3,
            &EncodingConfig {
                strength: EncodingStrength::Basic,
                allow_rotation: false,
            },
        )
        .unwrap();
        locked.generate_all_constraints();
        assert_eq!(locked.statistics().rotation_clauses, 2);
    }
}
