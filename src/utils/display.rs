//! Display and output formatting utilities

use crate::packing::{BatchEntry, BatchStatus, Solution};

/// Format solutions for display
pub struct SolutionFormatter;

impl SolutionFormatter {
    /// Format a single solution for console output
    pub fn format_solution(solution: &Solution, render_board: bool) -> String {
        let mut output = String::new();

        output.push_str(&format!("=== Packing {}x{} ===\n", solution.board_width, solution.board_height));
        output.push_str(&format!("Solve Time: {:.3}s\n", solution.solve_time.as_secs_f64()));
        output.push_str(&format!("Heights Tried: {}\n", solution.metadata.heights_tried));
        output.push_str(&format!("Utilization: {:.1}%\n", solution.metadata.utilization * 100.0));
        output.push_str(&format!(
            "Encoding: {} variables, {} clauses\n",
            solution.metadata.variables, solution.metadata.clauses
        ));
        output.push('\n');

        output.push_str("Circuit | Size    | Position | Rotated\n");
        output.push_str("--------|---------|----------|--------\n");
        for p in solution.placements() {
            output.push_str(&format!(
                "{:7} | {:7} | {:8} | {}\n",
                Self::label(p.index),
                format!("{}x{}", p.width, p.height),
                format!("({},{})", p.x, p.y),
                if p.rotated { "yes" } else { "no" }
            ));
        }

        if render_board {
            output.push('\n');
            output.push_str(&Self::render_board(solution));
        }

        output
    }

    /// Draw the board with one letter per circuit and row 0 at the bottom
    pub fn render_board(solution: &Solution) -> String {
        let placements = solution.placements();
        let mut output = String::new();

        for row in (0..solution.board_height).rev() {
            for col in 0..solution.board_width {
                let cell = placements
                    .iter()
                    .find(|p| p.contains(col, row))
                    .map_or('·', |p| Self::letter(p.index));
                output.push(cell);
            }
            output.push('\n');
        }

        output
    }

    /// Format batch results as a summary table
    pub fn format_batch_summary(entries: &[BatchEntry]) -> String {
        let mut output = String::new();

        output.push_str("Batch Summary:\n");
        output.push_str("Instance     | Status | Height | Rotated | Time(ms)\n");
        output.push_str("-------------|--------|--------|---------|---------\n");

        for entry in entries {
            let (height, rotated) = match &entry.status {
                BatchStatus::Solved { board_height, rotated } => (board_height.to_string(), rotated.to_string()),
                _ => ("-".to_string(), "-".to_string()),
            };

            output.push_str(&format!(
                "{:12} | {:6} | {:6} | {:7} | {:8}\n",
                entry.name,
                entry.status.to_string(),
                height,
                rotated,
                entry.elapsed.as_millis()
            ));
        }

        let solved = entries
            .iter()
            .filter(|e| matches!(e.status, BatchStatus::Solved { .. }))
            .count();
        output.push_str(&format!("\n{}/{} instances solved\n", solved, entries.len()));

        output
    }

    fn letter(index: usize) -> char {
        const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
        LETTERS[index % LETTERS.len()] as char
    }

    fn label(index: usize) -> String {
        format!("{} ({})", Self::letter(index), index)
    }
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    /// Check if terminal supports color
    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err() && (std::env::var("TERM").unwrap_or_default() != "dumb")
    }

    /// Format success message
    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    /// Format error message
    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    /// Format warning message
    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    /// Format info message
    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}
