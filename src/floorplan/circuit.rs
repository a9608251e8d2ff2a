//! Circuit and instance representation

use super::InstanceError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rectangular circuit to be placed on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Circuit {
    pub width: usize,
    pub height: usize,
}

impl Circuit {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Larger of the two sides, the circuit's height in the worst orientation
    pub fn max_side(&self) -> usize {
        self.width.max(self.height)
    }

    pub fn min_side(&self) -> usize {
        self.width.min(self.height)
    }

    /// Circuit turned by 90 degrees
    pub fn rotated(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn rotate(&mut self) {
        std::mem::swap(&mut self.width, &mut self.height);
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A floorplanning instance: a board of fixed width and the circuits to pack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub board_width: usize,
    pub circuits: Vec<Circuit>,
}

impl Instance {
    /// Create an instance, rejecting empty circuit lists and zero dimensions
    pub fn new(board_width: usize, circuits: Vec<Circuit>) -> Result<Self> {
        if board_width == 0 {
            anyhow::bail!("Board width must be positive");
        }

        if circuits.is_empty() {
            anyhow::bail!("Instance must contain at least one circuit");
        }

        for (i, circuit) in circuits.iter().enumerate() {
            if circuit.width == 0 || circuit.height == 0 {
                anyhow::bail!("Circuit {} has a zero dimension ({})", i, circuit);
            }
        }

        let instance = Self { board_width, circuits };
        if instance.checked_total_area().is_none() || instance.checked_stacked_height().is_none() {
            return Err(InstanceError::TooLarge.into());
        }

        Ok(instance)
    }

    /// Create an instance from parallel width and height lists
    pub fn from_dimensions(board_width: usize, widths: &[usize], heights: &[usize]) -> Result<Self> {
        if widths.len() != heights.len() {
            anyhow::bail!(
                "Width list has {} entries but height list has {}",
                widths.len(),
                heights.len()
            );
        }

        let circuits = widths
            .iter()
            .zip(heights)
            .map(|(&w, &h)| Circuit::new(w, h))
            .collect();

        Self::new(board_width, circuits)
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    pub fn widths(&self) -> Vec<usize> {
        self.circuits.iter().map(|c| c.width).collect()
    }

    pub fn heights(&self) -> Vec<usize> {
        self.circuits.iter().map(|c| c.height).collect()
    }

    /// Sum of circuit areas; construction guarantees it fits in `usize`
    pub fn total_area(&self) -> usize {
        self.circuits.iter().map(Circuit::area).sum()
    }

    fn checked_total_area(&self) -> Option<usize> {
        self.circuits
            .iter()
            .try_fold(0usize, |acc, c| acc.checked_add(c.width.checked_mul(c.height)?))
    }

    fn checked_stacked_height(&self) -> Option<usize> {
        self.circuits
            .iter()
            .try_fold(0usize, |acc, c| acc.checked_add(c.max_side()))
    }

    /// Swap width and height of every circuit whose flag is set
    pub fn apply_rotations(&mut self, rotated: &[bool]) {
        for (circuit, &flag) in self.circuits.iter_mut().zip(rotated) {
            if flag {
                circuit.rotate();
            }
        }
    }

    /// Circuits that cannot fit the board width in any orientation
    pub fn oversized_circuits(&self, allow_rotation: bool) -> Vec<usize> {
        self.circuits
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                let narrowest = if allow_rotation { c.min_side() } else { c.width };
                narrowest > self.board_width
            })
            .map(|(i, _)| i)
            .collect()
    }
}
