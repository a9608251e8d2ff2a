//! Main CLI application for the SAT floorplanner

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use vlsi_floorplan_sat::{
    config::{CliOverrides, EncodingStrength, OutputFormat, Settings},
    floorplan::{create_example_instances, load_instance_from_file},
    packing::{solve_directory, PackingProblem, SearchOutcome, Solution, SolutionValidator},
    utils::{ColorOutput, SolutionFormatter},
};

#[derive(Parser)]
#[command(name = "vlsi_floorplan_sat")]
#[command(about = "SAT-based VLSI floorplanner")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the lowest board height packing an instance
    Solve {
        /// Instance file
        input: PathBuf,

        /// Output file for the solution or "unsat"
        output: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Encoding strength (overrides config)
        #[arg(short, long, value_enum)]
        strength: Option<EncodingStrength>,

        /// Keep every circuit in its given orientation
        #[arg(long)]
        no_rotation: bool,

        /// Output format (overrides config)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Largest board height to try (overrides config)
        #[arg(long)]
        max_height: Option<usize>,

        /// Draw the packed board
        #[arg(short, long)]
        render: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Solve every instance in a directory in parallel
    Batch {
        /// Directory of *.txt instance files
        input_dir: PathBuf,

        /// Directory for out-* files
        output_dir: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Encoding strength (overrides config)
        #[arg(short, long, value_enum)]
        strength: Option<EncodingStrength>,

        /// Keep every circuit in its given orientation
        #[arg(long)]
        no_rotation: bool,

        /// Output format (overrides config)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Largest board height to try (overrides config)
        #[arg(long)]
        max_height: Option<usize>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check a text solution file against its instance
    Validate {
        /// Instance file
        instance: PathBuf,

        /// Solution file in text format
        solution: PathBuf,

        /// Reject rotated circuits
        #[arg(long)]
        no_rotation: bool,

        /// Draw the packed board
        #[arg(short, long)]
        render: bool,
    },

    /// Show instance statistics, height bounds and encoding size
    Analyze {
        /// Instance file
        input: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Encoding strength (overrides config)
        #[arg(short, long, value_enum)]
        strength: Option<EncodingStrength>,

        /// Keep every circuit in its given orientation
        #[arg(long)]
        no_rotation: bool,

        /// Largest board height to try (overrides config)
        #[arg(long)]
        max_height: Option<usize>,
    },

    /// Create example configuration and instance files
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Solve { verbose, .. } | Commands::Batch { verbose, .. } => *verbose,
        _ => false,
    };
    init_logging(verbose)?;

    match cli.command {
        Commands::Solve {
            input, output, config, strength, no_rotation,
            format, max_height, render, verbose
        } => {
            let overrides = CliOverrides {
                instance_file: Some(input),
                output_file: Some(output),
                strength,
                no_rotation,
                format,
                max_height,
            };
            solve_command(config, overrides, render, verbose)
        }
        Commands::Batch {
            input_dir, output_dir, config, strength, no_rotation,
            format, max_height, verbose: _
        } => {
            let overrides = CliOverrides {
                strength,
                no_rotation,
                format,
                max_height,
                ..CliOverrides::default()
            };
            batch_command(config, input_dir, output_dir, overrides)
        }
        Commands::Validate { instance, solution, no_rotation, render } => {
            validate_command(instance, solution, no_rotation, render)
        }
        Commands::Analyze { input, config, strength, no_rotation, max_height } => {
            let overrides = CliOverrides {
                instance_file: Some(input),
                strength,
                no_rotation,
                max_height,
                ..CliOverrides::default()
            };
            analyze_command(config, overrides)
        }
        Commands::Setup { directory, force } => {
            setup_command(directory, force)
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .context("Failed to initialise logger")
}

/// Load the configuration file, falling back to defaults when it is missing
fn load_settings(config_path: &PathBuf) -> Result<Settings> {
    if config_path.exists() {
        Settings::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))
    } else {
        println!("{}", ColorOutput::warning(&format!(
            "Config file {} not found, using defaults", config_path.display()
        )));
        Ok(Settings::default())
    }
}

fn solve_command(
    config_path: PathBuf,
    cli_overrides: CliOverrides,
    render: bool,
    verbose: bool,
) -> Result<()> {
    println!("{}", ColorOutput::info("🔄 Starting SAT floorplanner"));

    let mut settings = load_settings(&config_path)?;
    settings.merge_with_cli(&cli_overrides);
    if render {
        settings.output.render_board = true;
    }

    if verbose {
        println!("Configuration:");
        println!("  Strength: {:?}", settings.encoding.strength);
        println!("  Rotation: {}", settings.encoding.allow_rotation);
        println!("  Max height: {:?}", settings.solver.max_height);
        println!("  Instance file: {}", settings.input.instance_file.display());
        println!("  Output file: {}", settings.output.output_file.display());
        println!();
    }

    settings.validate()
        .context("Configuration validation failed")?;

    let start_time = Instant::now();
    let mut problem = PackingProblem::new(settings.clone())
        .context("Failed to create packing problem")?;

    if verbose {
        println!("{}", problem.analyze()?);
    }

    println!("{}", ColorOutput::info(&format!(
        "🧮 Searching heights {}...", problem.height_range()
    )));
    let outcome = problem.solve()
        .context("Failed to solve packing problem")?;

    let total_time = start_time.elapsed();

    match &outcome {
        SearchOutcome::Sat(solution) => {
            println!("{}", ColorOutput::success(&format!(
                "✅ Packed at height {} in {:.3}s ({:.3}s in the solver)",
                solution.board_height,
                total_time.as_secs_f64(),
                problem.total_solve_time().as_secs_f64()
            )));
            println!("{}", solution.summary());
            println!("\n{}", SolutionFormatter::format_solution(solution, settings.output.render_board));
        }
        SearchOutcome::Unsat => {
            println!("{}", ColorOutput::warning(&format!(
                "❌ No packing within heights {} ({} tried, {:.3}s in the solver)",
                problem.height_range(),
                problem.attempts().len(),
                problem.total_solve_time().as_secs_f64()
            )));
        }
    }

    outcome.save(&settings.output.output_file, settings.output.format)
        .context("Failed to save solution")?;
    println!("{}", ColorOutput::success(&format!(
        "Result saved to {}", settings.output.output_file.display()
    )));

    Ok(())
}

fn batch_command(
    config_path: PathBuf,
    input_dir: PathBuf,
    output_dir: PathBuf,
    cli_overrides: CliOverrides,
) -> Result<()> {
    println!("{}", ColorOutput::info(&format!(
        "📦 Solving instances in {}", input_dir.display()
    )));

    let mut settings = load_settings(&config_path)?;
    settings.merge_with_cli(&cli_overrides);

    let start_time = Instant::now();
    let entries = solve_directory(&settings, &input_dir, &output_dir)
        .context("Batch solve failed")?;

    println!("\n{}", SolutionFormatter::format_batch_summary(&entries));
    println!("{}", ColorOutput::success(&format!(
        "Results saved to {} in {:.3}s",
        output_dir.display(),
        start_time.elapsed().as_secs_f64()
    )));

    Ok(())
}

fn validate_command(
    instance_path: PathBuf,
    solution_path: PathBuf,
    no_rotation: bool,
    render: bool,
) -> Result<()> {
    println!("{}", ColorOutput::info("🔍 Validating solution..."));

    let instance = load_instance_from_file(&instance_path)?;
    let solution = Solution::load_text_file(&solution_path, &instance)?;

    let validator = SolutionValidator::new(!no_rotation);
    let result = validator.validate(&solution, &instance);

    println!("{}", result);

    if render && result.is_valid {
        println!("{}", SolutionFormatter::render_board(&solution));
    }

    if result.is_valid {
        println!("{}", ColorOutput::success("✅ Solution is valid!"));
    } else {
        println!("{}", ColorOutput::error("❌ Solution is invalid"));
        if let Some(error) = result.error_message {
            println!("Error: {}", error);
        }
    }

    Ok(())
}

fn analyze_command(config_path: PathBuf, cli_overrides: CliOverrides) -> Result<()> {
    println!("{}", ColorOutput::info("🔬 Analyzing instance..."));

    let mut settings = load_settings(&config_path)?;
    settings.merge_with_cli(&cli_overrides);

    let problem = PackingProblem::new(settings)
        .context("Failed to create problem for analysis")?;

    let analysis = problem.analyze()?;
    println!("{}", analysis);

    if analysis.range.is_empty() {
        println!("{}", ColorOutput::warning("Candidate height range is empty, the instance is unsat"));
    }

    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    println!("{}", ColorOutput::info("🛠️  Setting up project structure..."));

    let config_dir = directory.join("config");
    let input_dir = directory.join("instances");
    let output_dir = directory.join("out");

    for dir in [&config_dir, &input_dir, &output_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let config_path = config_dir.join("default.yaml");
    if !config_path.exists() || force {
        Settings::default().to_file(&config_path)
            .context("Failed to create default configuration")?;
        println!("Created: {}", config_path.display());
    } else {
        println!("Skipped: {} (already exists)", config_path.display());
    }

    create_example_instances(&input_dir)
        .context("Failed to create example instances")?;
    println!("Created example instances in: {}", input_dir.display());

    let examples_dir = config_dir.join("examples");
    std::fs::create_dir_all(&examples_dir)?;

    let mut strong_config = Settings::default();
    strong_config.encoding.strength = EncodingStrength::StrongUnique;
    strong_config.input.instance_file = PathBuf::from("instances/ins-4.txt");
    strong_config.output.output_file = PathBuf::from("out/out-4.txt");
    strong_config.to_file(&examples_dir.join("strong.yaml"))?;

    let mut fixed_config = Settings::default();
    fixed_config.encoding.allow_rotation = false;
    fixed_config.output.format = OutputFormat::Json;
    fixed_config.output.render_board = true;
    fixed_config.input.instance_file = PathBuf::from("instances/ins-3.txt");
    fixed_config.output.output_file = PathBuf::from("out/out-3.json");
    fixed_config.to_file(&examples_dir.join("no_rotation.yaml"))?;

    println!("Created example configurations in: {}", examples_dir.display());

    println!("\n{}", ColorOutput::success("✅ Setup complete!"));
    println!("\nNext steps:");
    println!("1. Edit configuration files in {}", config_dir.display());
    println!("2. Add your instances to {}", input_dir.display());
    println!("3. Run: cargo run -- solve instances/ins-1.txt out/out-1.txt");

    Ok(())
}
