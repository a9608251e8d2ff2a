//! Variable management for SAT encoding

use std::collections::HashMap;
use anyhow::Result;

/// Types of variables used in the SAT encoding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// Circuit occupies board column `col`
    Column { circuit: usize, col: usize },
    /// Circuit occupies board row `row`
    Row { circuit: usize, row: usize },
    /// Circuit is placed with width and height swapped
    Rotation { circuit: usize },
}

/// Occupancy and rotation variables of one board height
#[derive(Debug, Clone)]
pub struct PlacementVariables {
    /// `x[c][j]`: circuit `c` covers column `j`
    pub x: Vec<Vec<i32>>,
    /// `y[c][j]`: circuit `c` covers row `j`
    pub y: Vec<Vec<i32>>,
    /// `r[c]`: circuit `c` is rotated
    pub r: Vec<i32>,
}

/// Manages SAT variables and their mapping to integers
#[derive(Debug)]
pub struct VariableManager {
    /// Map from variable type to SAT variable ID (positive integer)
    variable_map: HashMap<VariableType, i32>,
    /// Next available variable ID
    next_id: i32,
    /// Tseitin definitions allocated after the named variables
    auxiliary_count: usize,
    circuits: usize,
    board_width: usize,
    board_height: usize,
}

impl VariableManager {
    /// Create a new variable manager for one candidate board height
    pub fn new(circuits: usize, board_width: usize, board_height: usize) -> Self {
        Self {
            variable_map: HashMap::new(),
            next_id: 1, // SAT variables start from 1
            auxiliary_count: 0,
            circuits,
            board_width,
            board_height,
        }
    }

    /// Get or create a variable ID for the given variable type
    pub fn get_variable(&mut self, var_type: VariableType) -> Result<i32> {
        if let Some(&id) = self.variable_map.get(&var_type) {
            return Ok(id);
        }

        self.validate_variable(&var_type)?;

        let id = self.next_id;
        self.next_id += 1;
        self.variable_map.insert(var_type, id);
        Ok(id)
    }

    pub fn x_variable(&mut self, circuit: usize, col: usize) -> Result<i32> {
        self.get_variable(VariableType::Column { circuit, col })
    }

    pub fn y_variable(&mut self, circuit: usize, row: usize) -> Result<i32> {
        self.get_variable(VariableType::Row { circuit, row })
    }

    pub fn rotation_variable(&mut self, circuit: usize) -> Result<i32> {
        self.get_variable(VariableType::Rotation { circuit })
    }

    /// Allocate every placement variable, circuit by circuit
    pub fn placement_variables(&mut self) -> Result<PlacementVariables> {
        let mut x = Vec::with_capacity(self.circuits);
        let mut y = Vec::with_capacity(self.circuits);
        let mut r = Vec::with_capacity(self.circuits);

        for c in 0..self.circuits {
            x.push((0..self.board_width).map(|j| self.x_variable(c, j)).collect::<Result<Vec<_>>>()?);
        }
        for c in 0..self.circuits {
            y.push((0..self.board_height).map(|j| self.y_variable(c, j)).collect::<Result<Vec<_>>>()?);
        }
        for c in 0..self.circuits {
            r.push(self.rotation_variable(c)?);
        }

        Ok(PlacementVariables { x, y, r })
    }

    /// Allocate an unnamed variable for a Tseitin definition
    pub fn fresh_auxiliary(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        self.auxiliary_count += 1;
        id
    }

    /// Get the total number of variables created
    pub fn variable_count(&self) -> usize {
        (self.next_id - 1) as usize
    }

    /// Get (circuits, board width, board height)
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.circuits, self.board_width, self.board_height)
    }

    /// Validate that a variable type is within bounds
    fn validate_variable(&self, var_type: &VariableType) -> Result<()> {
        let circuit = match var_type {
            VariableType::Column { circuit, col } => {
                if *col >= self.board_width {
                    anyhow::bail!("Column {} out of bounds (board width: {})", col, self.board_width);
                }
                circuit
            }
            VariableType::Row { circuit, row } => {
                if *row >= self.board_height {
                    anyhow::bail!("Row {} out of bounds (board height: {})", row, self.board_height);
                }
                circuit
            }
            VariableType::Rotation { circuit } => circuit,
        };

        if *circuit >= self.circuits {
            anyhow::bail!("Circuit {} out of bounds (circuits: {})", circuit, self.circuits);
        }
        Ok(())
    }

    /// Get statistics about variable usage
    pub fn statistics(&self) -> VariableStatistics {
        let mut column_vars = 0;
        let mut row_vars = 0;
        let mut rotation_vars = 0;

        for var_type in self.variable_map.keys() {
            match var_type {
                VariableType::Column { .. } => column_vars += 1,
                VariableType::Row { .. } => row_vars += 1,
                VariableType::Rotation { .. } => rotation_vars += 1,
            }
        }

        VariableStatistics {
            total_variables: self.variable_count(),
            column_variables: column_vars,
            row_variables: row_vars,
            rotation_variables: rotation_vars,
            auxiliary_variables: self.auxiliary_count,
        }
    }
}

/// Statistics about variable usage
#[derive(Debug, Clone)]
pub struct VariableStatistics {
    pub total_variables: usize,
    pub column_variables: usize,
    pub row_variables: usize,
    pub rotation_variables: usize,
    pub auxiliary_variables: usize,
}

impl std::fmt::Display for VariableStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Variable Statistics:")?;
        writeln!(f, "  Total variables: {}", self.total_variables)?;
        writeln!(f, "  Column variables: {}", self.column_variables)?;
        writeln!(f, "  Row variables: {}", self.row_variables)?;
        writeln!(f, "  Rotation variables: {}", self.rotation_variables)?;
        writeln!(f, "  Auxiliary variables: {}", self.auxiliary_variables)?;
        Ok(())
    }
}
