//! Height search over a floorplanning instance

use super::{Solution, SolutionValidator};
use super::solution::SolutionMetadata;
use crate::config::{OutputFormat, Settings};
use crate::floorplan::{load_instance_from_file, HeightRange, Instance};
use crate::sat::{EncodingStatistics, HeightAttempt, SatEncoder, SolverResultType};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;
use std::time::{Duration, Instant};

/// Result of scanning the candidate heights
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Sat(Solution),
    Unsat,
}

impl SearchOutcome {
    pub fn is_sat(&self) -> bool {
        matches!(self, SearchOutcome::Sat(_))
    }

    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SearchOutcome::Sat(solution) => Some(solution),
            SearchOutcome::Unsat => None,
        }
    }

    pub fn into_solution(self) -> Option<Solution> {
        match self {
            SearchOutcome::Sat(solution) => Some(solution),
            SearchOutcome::Unsat => None,
        }
    }

    /// Render in the output file format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        let content = match (self, format) {
            (SearchOutcome::Sat(solution), OutputFormat::Text) => solution.to_text(),
            (SearchOutcome::Sat(solution), OutputFormat::Json) => solution.to_json()?,
            (SearchOutcome::Unsat, OutputFormat::Text) => "unsat\n".to_string(),
            (SearchOutcome::Unsat, OutputFormat::Json) => {
                serde_json::to_string_pretty(&serde_json::json!({ "status": "unsat" }))?
            }
        };
        Ok(content)
    }

    /// Write the outcome to `path`, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P, format: OutputFormat) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, self.render(format)?)
            .with_context(|| format!("Failed to write output file: {}", path.display()))
    }
}

/// A floorplanning problem: an instance plus the settings to search it with
pub struct PackingProblem {
    settings: Settings,
    /// Dimensions as given; rotations are applied to `instance` only
    original: Instance,
    instance: Instance,
    validator: SolutionValidator,
    attempts: Vec<HeightAttempt>,
}

impl PackingProblem {
    /// Create a new problem, loading the instance named by the settings
    pub fn new(settings: Settings) -> Result<Self> {
        let instance = load_instance_from_file(&settings.input.instance_file)
            .context("Failed to load instance file")?;

        Self::with_instance(settings, instance)
    }

    /// Create a problem with an explicit instance (useful for testing)
    pub fn with_instance(settings: Settings, instance: Instance) -> Result<Self> {
        let validator = SolutionValidator::new(settings.encoding.allow_rotation);

        Ok(Self {
            settings,
            original: instance.clone(),
            instance,
            validator,
            attempts: Vec::new(),
        })
    }

    /// Candidate heights, clamped by the configured cap
    pub fn height_range(&self) -> HeightRange {
        HeightRange::estimate(&self.original).with_cap(self.settings.solver.max_height)
    }

    /// Try ascending heights until one is satisfiable.
    ///
    /// On success the circuits of [`instance`](Self::instance) carry the
    /// chosen rotations.
    pub fn solve(&mut self) -> Result<SearchOutcome> {
        let start_time = Instant::now();
        self.instance = self.original.clone();
        self.attempts.clear();

        let range = self.height_range();
        info!(
            "Packing {} circuits on a board of width {}, heights {}",
            self.original.len(),
            self.original.board_width,
            range
        );

        if range.is_empty() {
            info!("Candidate height range is empty");
            return Ok(SearchOutcome::Unsat);
        }

        let oversized = self.original.oversized_circuits(self.settings.encoding.allow_rotation);
        if !oversized.is_empty() {
            warn!("Circuits {:?} are wider than the board in every allowed orientation", oversized);
        }

        for height in range.heights() {
            let mut encoder = SatEncoder::new(&self.original, height, &self.settings.encoding)
                .with_context(|| format!("Failed to build encoding for height {}", height))?;
            let (attempt, layout) = encoder
                .solve()
                .with_context(|| format!("SAT solving failed at height {}", height))?;

            debug!(
                "Height {}: {} variables, {} clauses, {:?} in {:.3}s",
                height,
                attempt.variables,
                attempt.clauses,
                attempt.result,
                attempt.solve_time.as_secs_f64()
            );
            if attempt.result == SolverResultType::Unknown {
                warn!("Solver returned unknown at height {}, moving on", height);
            }

            let metadata = SolutionMetadata {
                strength: self.settings.encoding.strength,
                allow_rotation: self.settings.encoding.allow_rotation,
                heights_tried: self.attempts.len() + 1,
                variables: attempt.variables,
                clauses: attempt.clauses,
                solve_time_ms: attempt.solve_time.as_millis() as u64,
                total_time_ms: 0,
                utilization: 0.0,
            };
            let solve_time = attempt.solve_time;
            self.attempts.push(attempt);

            if let Some(layout) = layout {
                self.instance.apply_rotations(&layout.rotated);

                let mut solution = Solution::new(&self.instance, height, layout, solve_time, metadata);
                solution.metadata.total_time_ms = start_time.elapsed().as_millis() as u64;

                if self.settings.solver.validate_solutions {
                    let result = self.validator.validate(&solution, &self.original);
                    if !result.is_valid {
                        anyhow::bail!(
                            "Decoded packing at height {} failed validation: {}",
                            height,
                            result.error_message.unwrap_or_else(|| "Unknown error".to_string())
                        );
                    }
                }

                info!(
                    "Found packing at height {} after {} heights in {:.3}s",
                    height,
                    self.attempts.len(),
                    start_time.elapsed().as_secs_f64()
                );
                return Ok(SearchOutcome::Sat(solution));
            }
        }

        info!("No packing found for heights {}", range);
        Ok(SearchOutcome::Unsat)
    }

    /// Instance as given, or with rotations applied after a successful solve
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn original_instance(&self) -> &Instance {
        &self.original
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Heights checked by the last [`solve`](Self::solve)
    pub fn attempts(&self) -> &[HeightAttempt] {
        &self.attempts
    }

    /// Total solver time of the last search
    pub fn total_solve_time(&self) -> Duration {
        self.attempts.iter().map(|a| a.solve_time).sum()
    }

    /// Encoding size at `board_height` without solving
    pub fn encoding_statistics(&self, board_height: usize) -> Result<EncodingStatistics> {
        let mut encoder = SatEncoder::new(&self.original, board_height, &self.settings.encoding)?;
        encoder.encode()?;
        Ok(encoder.statistics())
    }

    /// Instance statistics and the encoding size at the lowest candidate height
    pub fn analyze(&self) -> Result<InstanceAnalysis> {
        let range = self.height_range();
        let circuits = &self.original.circuits;

        let encoding = if range.is_empty() {
            None
        } else {
            Some(self.encoding_statistics(range.min)?)
        };

        Ok(InstanceAnalysis {
            circuits: circuits.len(),
            board_width: self.original.board_width,
            total_area: self.original.total_area(),
            tallest: circuits.iter().map(|c| c.height).max().unwrap_or(0),
            widest: circuits.iter().map(|c| c.width).max().unwrap_or(0),
            square_circuits: circuits.iter().filter(|c| c.is_square()).count(),
            oversized: self.original.oversized_circuits(self.settings.encoding.allow_rotation),
            range,
            encoding,
        })
    }
}

/// Static facts about an instance
#[derive(Debug, Clone)]
pub struct InstanceAnalysis {
    pub circuits: usize,
    pub board_width: usize,
    pub total_area: usize,
    pub tallest: usize,
    pub widest: usize,
    pub square_circuits: usize,
    /// Circuits too wide for the board in every allowed orientation
    pub oversized: Vec<usize>,
    pub range: HeightRange,
    /// Encoding size at the lowest candidate height
    pub encoding: Option<EncodingStatistics>,
}

impl std::fmt::Display for InstanceAnalysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance Analysis:")?;
        writeln!(f, "  Circuits: {} ({} square)", self.circuits, self.square_circuits)?;
        writeln!(f, "  Board width: {}", self.board_width)?;
        writeln!(f, "  Total area: {}", self.total_area)?;
        writeln!(f, "  Tallest circuit: {}", self.tallest)?;
        writeln!(f, "  Widest circuit: {}", self.widest)?;
        writeln!(f, "  Candidate heights: {}", self.range)?;
        if !self.oversized.is_empty() {
            writeln!(f, "  Circuits that cannot fit: {:?}", self.oversized)?;
        }
        if let Some(encoding) = &self.encoding {
            writeln!(f)?;
            write!(f, "{}", encoding)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingStrength;
    use crate::floorplan::Circuit;

    fn settings(strength: EncodingStrength, allow_rotation: bool) -> Settings {
        let mut settings = Settings::default();
        settings.encoding.strength = strength;
        settings.encoding.allow_rotation = allow_rotation;
        settings
    }

    fn assert_packed(solution: &Solution, original: &Instance) {
        let result = SolutionValidator::new(true).validate(solution, original);
        assert!(result.is_valid, "{}", result);
    }

    #[test]
    fn test_two_circuits_side_by_side() {
        let instance = Instance::from_dimensions(3, &[2, 1], &[2, 2]).unwrap();
        let mut problem = PackingProblem::with_instance(settings(EncodingStrength::Basic, true), instance.clone()).unwrap();

        let outcome = problem.solve().unwrap();
        let solution = outcome.solution().unwrap();

        assert!(problem.height_range().contains(solution.board_height));
        assert!(solution.board_height <= 4);
        assert_eq!(solution.board_height, 2);
        assert_eq!(problem.attempts().len(), 1);
        assert_packed(solution, &instance);
    }

    #[test]
    fn test_rotation_required() {
        let instance = Instance::from_dimensions(2, &[5], &[2]).unwrap();
        let mut problem = PackingProblem::with_instance(settings(EncodingStrength::Basic, true), instance.clone()).unwrap();

        let solution = problem.solve().unwrap().into_solution().unwrap();
        assert_eq!(solution.board_height, 5);
        assert_eq!(solution.rotated, vec![true]);
        assert_eq!(solution.circuits, vec![Circuit::new(2, 5)]);
        assert_eq!(problem.instance().circuits, vec![Circuit::new(2, 5)]);
        assert_eq!(problem.original_instance().circuits, vec![Circuit::new(5, 2)]);
        assert_packed(&solution, &instance);
    }

    #[test]
    fn test_rotation_disabled_is_unsat() {
        let instance = Instance::from_dimensions(2, &[5], &[2]).unwrap();
        let mut problem = PackingProblem::with_instance(settings(EncodingStrength::Basic, false), instance).unwrap();

        assert!(!problem.solve().unwrap().is_sat());
        assert_eq!(problem.attempts().len(), problem.height_range().len());
    }

    #[test]
    fn test_unsat_after_scanning_every_height() {
        // 3x3 cannot fit a board of width 2 in any orientation
        let mut widths = vec![3];
        let mut heights = vec![3];
        widths.extend([1; 6]);
        heights.extend([1; 6]);
        let instance = Instance::from_dimensions(2, &widths, &heights).unwrap();
        let mut problem = PackingProblem::with_instance(settings(EncodingStrength::Basic, true), instance).unwrap();

        let range = problem.height_range();
        assert_eq!((range.min, range.max), (8, 9));

        assert!(!problem.solve().unwrap().is_sat());
        assert_eq!(problem.attempts().len(), 2);
        assert!(problem
            .attempts()
            .iter()
            .all(|a| a.result == SolverResultType::Unsatisfiable));
    }

    #[test]
    fn test_empty_range_skips_the_scan() {
        let instance = Instance::from_dimensions(3, &[2, 1], &[2, 2]).unwrap();
        let mut settings = settings(EncodingStrength::Basic, true);
        settings.solver.max_height = Some(1);
        let mut problem = PackingProblem::with_instance(settings, instance).unwrap();

        assert!(problem.height_range().is_empty());
        assert!(!problem.solve().unwrap().is_sat());
        assert!(problem.attempts().is_empty());
    }

    #[test]
    fn test_every_strength_finds_the_optimum() {
        let instance = Instance::from_dimensions(4, &[2, 2, 2, 2], &[2, 2, 2, 2]).unwrap();

        for strength in [
            EncodingStrength::Basic,
            EncodingStrength::Strong,
            EncodingStrength::Unique,
            EncodingStrength::StrongUnique,
        ] {
            let mut problem = PackingProblem::with_instance(settings(strength, true), instance.clone()).unwrap();
            let solution = problem.solve().unwrap().into_solution().unwrap();
            assert_eq!(solution.board_height, 4, "{:?}", strength);
            assert_eq!(solution.metadata.strength, strength);
            assert_packed(&solution, &instance);
        }
    }

    /// Backtracking placement of every circuit on a `width` x `height` grid
    fn packs(width: usize, height: usize, circuits: &[Circuit], allow_rotation: bool) -> bool {
        fn place(grid: &mut [bool], width: usize, height: usize, rest: &[Circuit], allow_rotation: bool) -> bool {
            let Some((first, rest)) = rest.split_first() else {
                return true;
            };

            let mut shapes = vec![*first];
            if allow_rotation && !first.is_square() {
                shapes.push(first.rotated());
            }

            for shape in shapes {
                if shape.width > width || shape.height > height {
                    continue;
                }
                for y in 0..=height - shape.height {
                    for x in 0..=width - shape.width {
                        let cells: Vec<usize> = (y..y + shape.height)
                            .flat_map(|row| (x..x + shape.width).map(move |col| row * width + col))
                            .collect();
                        if cells.iter().any(|&i| grid[i]) {
                            continue;
                        }

                        cells.iter().for_each(|&i| grid[i] = true);
                        if place(grid, width, height, rest, allow_rotation) {
                            return true;
                        }
                        cells.iter().for_each(|&i| grid[i] = false);
                    }
                }
            }
            false
        }

        place(&mut vec![false; width * height], width, height, circuits, allow_rotation)
    }

    #[test]
    fn test_infeasible_lowest_height_is_skipped() {
        // Two 2x2 squares on width 3: area bound gives 3, they only stack at 4
        let instance = Instance::from_dimensions(3, &[2, 2], &[2, 2]).unwrap();

        for strength in [
            EncodingStrength::Basic,
            EncodingStrength::Strong,
            EncodingStrength::Unique,
            EncodingStrength::StrongUnique,
        ] {
            let mut problem = PackingProblem::with_instance(settings(strength, true), instance.clone()).unwrap();
            assert_eq!(problem.height_range().min, 3);

            let solution = problem.solve().unwrap().into_solution().unwrap();
            assert_eq!(solution.board_height, 4, "{:?}", strength);
            assert_eq!(solution.metadata.heights_tried, 2);
            assert_eq!(problem.attempts().len(), 2);
            assert_eq!(problem.attempts()[0].board_height, 3);
            assert_eq!(problem.attempts()[0].result, SolverResultType::Unsatisfiable);
            assert_eq!(problem.attempts()[1].result, SolverResultType::Satisfiable);
            assert_eq!(
                problem.total_solve_time(),
                problem.attempts().iter().map(|a| a.solve_time).sum::<Duration>()
            );
            assert_packed(&solution, &instance);
        }
    }

    #[test]
    fn test_lowest_height_matches_exhaustive_search() {
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = |bound: usize| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            1 + (seed >> 33) as usize % bound
        };

        for _ in 0..30 {
            let board_width = next(4);
            let count = next(3);
            let circuits: Vec<Circuit> = (0..count).map(|_| Circuit::new(next(3), next(3))).collect();
            let instance = Instance::new(board_width, circuits).unwrap();

            for allow_rotation in [true, false] {
                let expected = HeightRange::estimate(&instance)
                    .heights()
                    .find(|&h| packs(board_width, h, &instance.circuits, allow_rotation));

                for strength in [EncodingStrength::Basic, EncodingStrength::StrongUnique] {
                    let mut problem =
                        PackingProblem::with_instance(settings(strength, allow_rotation), instance.clone()).unwrap();
                    let found = problem.solve().unwrap().solution().map(|s| s.board_height);
                    assert_eq!(
                        found, expected,
                        "{:?} rotation={} strength={:?}",
                        instance, allow_rotation, strength
                    );
                }
            }
        }
    }

    #[test]
    fn test_mixed_sizes_without_rotation() {
        let instance = Instance::from_dimensions(5, &[3, 2, 2, 1, 3], &[2, 3, 2, 4, 1]).unwrap();
        let mut problem = PackingProblem::with_instance(settings(EncodingStrength::Strong, false), instance.clone()).unwrap();

        let solution = problem.solve().unwrap().into_solution().unwrap();
        assert!(solution.rotated.iter().all(|&r| !r));
        assert_eq!(solution.circuits, instance.circuits);
        assert!(problem.height_range().contains(solution.board_height));
        assert_packed(&solution, &instance);
    }

    #[test]
    fn test_repeated_solve_starts_from_given_dimensions() {
        let instance = Instance::from_dimensions(2, &[5], &[2]).unwrap();
        let mut problem = PackingProblem::with_instance(settings(EncodingStrength::Basic, true), instance).unwrap();

        let first = problem.solve().unwrap().into_solution().unwrap();
        let second = problem.solve().unwrap().into_solution().unwrap();
        assert_eq!(first.board_height, second.board_height);
        assert_eq!(second.rotated, vec![true]);
    }

    #[test]
    fn test_outcome_output() {
        let temp_dir = tempfile::tempdir().unwrap();

        let unsat = SearchOutcome::Unsat;
        assert_eq!(unsat.render(OutputFormat::Text).unwrap(), "unsat\n");
        let json: serde_json::Value = serde_json::from_str(&unsat.render(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["status"], "unsat");

        let instance = Instance::from_dimensions(2, &[5], &[2]).unwrap();
        let mut problem = PackingProblem::with_instance(settings(EncodingStrength::Basic, true), instance).unwrap();
        let outcome = problem.solve().unwrap();

        let path = temp_dir.path().join("out/out-2.txt");
        outcome.save(&path, OutputFormat::Text).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "2 5\n1\n2 5 0 0\n");
    }

    #[test]
    fn test_analyze() {
        let instance = Instance::from_dimensions(3, &[2, 1], &[2, 2]).unwrap();
        let problem = PackingProblem::with_instance(settings(EncodingStrength::Basic, true), instance).unwrap();

        let analysis = problem.analyze().unwrap();
        assert_eq!(analysis.total_area, 6);
        assert_eq!(analysis.tallest, 2);
        assert_eq!(analysis.square_circuits, 1);
        assert!(analysis.oversized.is_empty());

        let encoding = analysis.encoding.unwrap();
        assert_eq!(encoding.board_height, 2);
        assert!(encoding.constraints.total_clauses > 0);
    }
}
