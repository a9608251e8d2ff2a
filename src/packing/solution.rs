//! Solution representation for packing problems

use crate::config::EncodingStrength;
use crate::floorplan::io::{content_lines, parse_fields};
use crate::floorplan::{Circuit, Instance, InstanceError};
use crate::sat::Layout;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A packing of every circuit on a board of fixed height
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub board_width: usize,
    pub board_height: usize,
    /// Final circuit dimensions, swapped where rotated
    pub circuits: Vec<Circuit>,
    pub x: Vec<usize>,
    pub y: Vec<usize>,
    pub rotated: Vec<bool>,
    /// Solver time at the satisfiable height
    #[serde(skip)]
    pub solve_time: Duration,
    pub metadata: SolutionMetadata,
}

/// How a solution was found
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolutionMetadata {
    pub strength: EncodingStrength,
    pub allow_rotation: bool,
    /// Heights checked, including the satisfiable one
    pub heights_tried: usize,
    pub variables: usize,
    pub clauses: usize,
    pub solve_time_ms: u64,
    pub total_time_ms: u64,
    /// Fraction of the board covered by circuits
    pub utilization: f64,
}

/// One circuit at its decoded position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedCircuit {
    pub index: usize,
    pub width: usize,
    pub height: usize,
    pub x: usize,
    pub y: usize,
    pub rotated: bool,
}

impl PlacedCircuit {
    /// Exclusive right edge
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    /// Exclusive top edge
    pub fn top(&self) -> usize {
        self.y + self.height
    }

    pub fn overlaps(&self, other: &PlacedCircuit) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.top() && other.y < self.top()
    }

    pub fn contains(&self, col: usize, row: usize) -> bool {
        (self.x..self.right()).contains(&col) && (self.y..self.top()).contains(&row)
    }
}

impl Solution {
    /// Build a solution from an instance whose rotations were already applied
    pub fn new(
        instance: &Instance,
        board_height: usize,
        layout: Layout,
        solve_time: Duration,
        mut metadata: SolutionMetadata,
    ) -> Self {
        metadata.utilization = instance.total_area() as f64 / (instance.board_width * board_height) as f64;

        Self {
            board_width: instance.board_width,
            board_height,
            circuits: instance.circuits.clone(),
            x: layout.x,
            y: layout.y,
            rotated: layout.rotated,
            solve_time,
            metadata,
        }
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    /// Every circuit with its position
    pub fn placements(&self) -> Vec<PlacedCircuit> {
        self.circuits
            .iter()
            .enumerate()
            .map(|(i, c)| PlacedCircuit {
                index: i,
                width: c.width,
                height: c.height,
                x: self.x.get(i).copied().unwrap_or(0),
                y: self.y.get(i).copied().unwrap_or(0),
                rotated: self.rotated.get(i).copied().unwrap_or(false),
            })
            .collect()
    }

    pub fn rotated_count(&self) -> usize {
        self.rotated.iter().filter(|&&r| r).count()
    }

    /// Write the plain text format: board size, circuit count, then
    /// "width height x y" per circuit
    pub fn to_text(&self) -> String {
        let mut output = format!("{} {}\n{}\n", self.board_width, self.board_height, self.len());
        for p in self.placements() {
            output.push_str(&format!("{} {} {} {}\n", p.width, p.height, p.x, p.y));
        }
        output
    }

    /// Parse the plain text format back, inferring rotation flags from
    /// the dimensions of `original`
    pub fn from_text(content: &str, original: &Instance) -> Result<Self, InstanceError> {
        let mut lines = content_lines(content);

        let (line_no, line) = lines.next().ok_or(InstanceError::Empty)?;
        let [board_width, board_height] = parse_fields::<2>(line_no, line, "board width and height")?;

        let (line_no, line) = lines.next().ok_or(InstanceError::Malformed {
            line: line_no + 1,
            expected: "circuit count",
            found: String::new(),
        })?;
        let [declared] = parse_fields::<1>(line_no, line, "circuit count")?;

        let mut circuits = Vec::with_capacity(declared);
        let mut x = Vec::with_capacity(declared);
        let mut y = Vec::with_capacity(declared);

        for (line_no, line) in lines {
            let [w, h, cx, cy] = parse_fields::<4>(line_no, line, "circuit width, height, x and y")?;
            if w == 0 || h == 0 {
                return Err(InstanceError::NonPositive { line: line_no });
            }
            circuits.push(Circuit::new(w, h));
            x.push(cx);
            y.push(cy);
        }

        if circuits.len() != declared {
            return Err(InstanceError::CircuitCount {
                declared,
                found: circuits.len(),
            });
        }

        let rotated = circuits
            .iter()
            .zip(&original.circuits)
            .map(|(placed, given)| placed != given && *placed == given.rotated())
            .chain(std::iter::repeat(false))
            .take(circuits.len())
            .collect();

        Ok(Self {
            board_width,
            board_height,
            circuits,
            x,
            y,
            rotated,
            solve_time: Duration::ZERO,
            metadata: SolutionMetadata::default(),
        })
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Create from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a text solution checked against `original`
    pub fn load_text_file<P: AsRef<Path>>(path: P, original: &Instance) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read solution file: {}", path.display()))?;

        Self::from_text(&content, original)
            .with_context(|| format!("Failed to parse solution file: {}", path.display()))
    }

    pub fn summary(&self) -> SolutionSummary {
        SolutionSummary {
            board_width: self.board_width,
            board_height: self.board_height,
            circuits: self.len(),
            rotated: self.rotated_count(),
            utilization: self.metadata.utilization,
            heights_tried: self.metadata.heights_tried,
            solve_time_ms: self.solve_time.as_millis() as u64,
        }
    }
}

/// Summary of a solution for display purposes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionSummary {
    pub board_width: usize,
    pub board_height: usize,
    pub circuits: usize,
    pub rotated: usize,
    pub utilization: f64,
    pub heights_tried: usize,
    pub solve_time_ms: u64,
}

impl std::fmt::Display for SolutionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} board, {} circuits ({} rotated), {:.1}% used, {} heights, {}ms",
            self.board_width,
            self.board_height,
            self.circuits,
            self.rotated,
            self.utilization * 100.0,
            self.heights_tried,
            self.solve_time_ms
        )
    }
}
