//! Configuration settings for the SAT floorplanner

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub encoding: EncodingConfig,
    pub solver: SolverConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub strength: EncodingStrength,
    pub allow_rotation: bool,
}

/// Which placement constraints are asserted next to existence and
/// impenetrability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EncodingStrength {
    /// Existence on both axes plus impenetrability
    #[default]
    Basic,
    /// Indicators outside the chosen run are forced false
    Strong,
    /// Basic plus uniqueness of the run offset
    Unique,
    /// Strong existence plus uniqueness
    StrongUnique,
}

impl EncodingStrength {
    pub fn uses_strong_existence(self) -> bool {
        matches!(self, EncodingStrength::Strong | EncodingStrength::StrongUnique)
    }

    pub fn uses_unicity(self) -> bool {
        matches!(self, EncodingStrength::Unique | EncodingStrength::StrongUnique)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Upper clamp on the board heights tried
    pub max_height: Option<usize>,
    pub validate_solutions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub instance_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub output_file: PathBuf,
    pub render_board: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            encoding: EncodingConfig {
                strength: EncodingStrength::Basic,
                allow_rotation: true,
            },
            solver: SolverConfig {
                max_height: None,
                validate_solutions: true,
            },
            input: InputConfig {
                instance_file: PathBuf::from("instances/ins-1.txt"),
            },
            output: OutputConfig {
                format: OutputFormat::Text,
                output_file: PathBuf::from("out/out-1.txt"),
                render_board: false,
            },
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the settings before a solve
    pub fn validate(&self) -> Result<()> {
        if self.solver.max_height == Some(0) {
            anyhow::bail!("Maximum board height must be positive");
        }

        if !self.input.instance_file.exists() {
            anyhow::bail!("Instance file does not exist: {}", self.input.instance_file.display());
        }

        Ok(())
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, cli_overrides: &CliOverrides) {
        if let Some(ref instance_file) = cli_overrides.instance_file {
            self.input.instance_file = instance_file.clone();
        }
        if let Some(ref output_file) = cli_overrides.output_file {
            self.output.output_file = output_file.clone();
        }
        if let Some(strength) = cli_overrides.strength {
            self.encoding.strength = strength;
        }
        if cli_overrides.no_rotation {
            self.encoding.allow_rotation = false;
        }
        if let Some(format) = cli_overrides.format {
            self.output.format = format;
        }
        if let Some(max_height) = cli_overrides.max_height {
            self.solver.max_height = Some(max_height);
        }
    }
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub instance_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub strength: Option<EncodingStrength>,
    pub no_rotation: bool,
    pub format: Option<OutputFormat>,
    pub max_height: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_strength_flags() {
        assert!(!EncodingStrength::Basic.uses_strong_existence());
        assert!(!EncodingStrength::Basic.uses_unicity());
        assert!(EncodingStrength::Strong.uses_strong_existence());
        assert!(!EncodingStrength::Strong.uses_unicity());
        assert!(!EncodingStrength::Unique.uses_strong_existence());
        assert!(EncodingStrength::Unique.uses_unicity());
        assert!(EncodingStrength::StrongUnique.uses_strong_existence());
        assert!(EncodingStrength::StrongUnique.uses_unicity());
    }

    #[test]
    fn test_yaml_round_trip_keeps_strength() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config/default.yaml");

        let mut settings = Settings::default();
        settings.encoding.strength = EncodingStrength::StrongUnique;
        settings.solver.max_height = Some(12);
        settings.to_file(&path).unwrap();

        let loaded = Settings::from_file(&path).unwrap();
        assert_eq!(loaded.encoding.strength, EncodingStrength::StrongUnique);
        assert_eq!(loaded.solver.max_height, Some(12));
        assert!(loaded.encoding.allow_rotation);
    }

    #[test]
    fn test_yaml_uses_snake_case_names() {
        let yaml = serde_yaml::to_string(&Settings::default()).unwrap();
        assert!(yaml.contains("strength: basic"));
        assert!(yaml.contains("format: text"));
    }

    #[test]
    fn test_merge_with_cli() {
        let mut settings = Settings::default();
        let overrides = CliOverrides {
            instance_file: Some(PathBuf::from("ins-7.txt")),
            output_file: None,
            strength: Some(EncodingStrength::Strong),
            no_rotation: true,
            format: Some(OutputFormat::Json),
            max_height: Some(20),
        };
        settings.merge_with_cli(&overrides);

        assert_eq!(settings.input.instance_file, PathBuf::from("ins-7.txt"));
        assert_eq!(settings.output.output_file, PathBuf::from("out/out-1.txt"));
        assert_eq!(settings.encoding.strength, EncodingStrength::Strong);
        assert!(!settings.encoding.allow_rotation);
        assert_eq!(settings.output.format, OutputFormat::Json);
        assert_eq!(settings.solver.max_height, Some(20));
    }

    #[test]
    fn test_validate_rejects_missing_instance() {
        let mut settings = Settings::default();
        settings.input.instance_file = PathBuf::from("/definitely/not/here.txt");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_height_cap() {
        let temp_dir = tempdir().unwrap();
        let instance = temp_dir.path().join("ins.txt");
        std::fs::write(&instance, "2\n1\n1 1\n").unwrap();

        let mut settings = Settings::default();
        settings.input.instance_file = instance;
        assert!(settings.validate().is_ok());

        settings.solver.max_height = Some(0);
        assert!(settings.validate().is_err());
    }
}
