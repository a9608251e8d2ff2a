//! Configuration management for the SAT floorplanner

pub mod settings;

pub use settings::{
    Settings, EncodingConfig, EncodingStrength, SolverConfig, InputConfig, OutputConfig,
    OutputFormat, CliOverrides
};
