//! File I/O for floorplanning instances

use super::{Circuit, Instance};
use anyhow::{Context, Result};
use std::path::Path;
use thiserror::Error;

/// Structured errors raised while parsing instance and solution files
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstanceError {
    #[error("file is empty")]
    Empty,
    #[error("line {line}: expected {expected}, found {found:?}")]
    Malformed {
        line: usize,
        expected: &'static str,
        found: String,
    },
    #[error("line {line}: dimensions must be positive")]
    NonPositive { line: usize },
    #[error("declared {declared} circuits but found {found}")]
    CircuitCount { declared: usize, found: usize },
    #[error("circuit dimensions overflow the total area or stacked height")]
    TooLarge,
}

/// Numbered non-blank lines of a file
pub(crate) fn content_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// Parse exactly `N` whitespace-separated integers from one line
pub(crate) fn parse_fields<const N: usize>(
    line_no: usize,
    line: &str,
    expected: &'static str,
) -> Result<[usize; N], InstanceError> {
    let malformed = || InstanceError::Malformed {
        line: line_no,
        expected,
        found: line.to_string(),
    };

    let values = line
        .split_whitespace()
        .map(|token| token.parse::<usize>().map_err(|_| malformed()))
        .collect::<Result<Vec<_>, _>>()?;

    values.try_into().map_err(|_| malformed())
}

/// Load an instance from a text file
/// Format: board width, circuit count, then one "width height" line per circuit
pub fn load_instance_from_file<P: AsRef<Path>>(path: P) -> Result<Instance> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read instance file: {}", path.as_ref().display()))?;

    parse_instance_from_string(&content)
        .with_context(|| format!("Failed to parse instance file: {}", path.as_ref().display()))
}

/// Parse an instance from its string representation
pub fn parse_instance_from_string(content: &str) -> Result<Instance> {
    let mut lines = content_lines(content);

    let (line_no, line) = lines.next().ok_or(InstanceError::Empty)?;
    let [board_width] = parse_fields::<1>(line_no, line, "board width")?;
    if board_width == 0 {
        return Err(InstanceError::NonPositive { line: line_no }.into());
    }

    let (line_no, line) = lines.next().ok_or(InstanceError::Malformed {
        line: line_no + 1,
        expected: "circuit count",
        found: String::new(),
    })?;
    let [declared] = parse_fields::<1>(line_no, line, "circuit count")?;

    let mut circuits = Vec::with_capacity(declared);
    for (line_no, line) in lines {
        let [width, height] = parse_fields::<2>(line_no, line, "circuit \"width height\"")?;
        if width == 0 || height == 0 {
            return Err(InstanceError::NonPositive { line: line_no }.into());
        }
        circuits.push(Circuit::new(width, height));
    }

    if circuits.len() != declared {
        return Err(InstanceError::CircuitCount {
            declared,
            found: circuits.len(),
        }
        .into());
    }

    Instance::new(board_width, circuits)
}

/// Convert an instance to its string representation
pub fn instance_to_string(instance: &Instance) -> String {
    let mut result = format!("{}\n{}\n", instance.board_width, instance.len());

    for circuit in &instance.circuits {
        result.push_str(&format!("{} {}\n", circuit.width, circuit.height));
    }

    result
}

/// Save an instance to a text file
pub fn save_instance_to_file<P: AsRef<Path>>(instance: &Instance, path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(&path, instance_to_string(instance))
        .with_context(|| format!("Failed to write instance to file: {}", path.as_ref().display()))?;

    Ok(())
}

/// Load every `*.txt` instance in a directory, sorted by file name
pub fn load_instances_from_directory<P: AsRef<Path>>(dir_path: P) -> Result<Vec<(String, Instance)>> {
    let dir = std::fs::read_dir(&dir_path)
        .with_context(|| format!("Failed to read directory: {}", dir_path.as_ref().display()))?;

    let mut instances = Vec::new();

    for entry in dir {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();

            match load_instance_from_file(&path) {
                Ok(instance) => instances.push((name, instance)),
                Err(e) => log::warn!("Skipping {}: {:#}", path.display(), e),
            }
        }
    }

    instances.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(instances)
}

/// Create example instance files
pub fn create_example_instances<P: AsRef<Path>>(output_dir: P) -> Result<()> {
    let dir = output_dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    // Two circuits side by side
    std::fs::write(dir.join("ins-1.txt"), "3\n2\n2 2\n1 2\n")
        .context("Failed to write ins-1.txt")?;

    // Only fits when rotated
    std::fs::write(dir.join("ins-2.txt"), "2\n1\n5 2\n")
        .context("Failed to write ins-2.txt")?;

    // Perfect 4x4 tiling
    std::fs::write(dir.join("ins-3.txt"), "4\n4\n2 2\n2 2\n2 2\n2 2\n")
        .context("Failed to write ins-3.txt")?;

    // Mixed sizes on a wider board
    std::fs::write(dir.join("ins-4.txt"), "5\n5\n3 2\n2 3\n2 2\n1 4\n3 1\n")
        .context("Failed to write ins-4.txt")?;

    Ok(())
}
