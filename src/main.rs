//! accel-denoise CLI entry point.
//!
//! `denoise` runs the filter pipeline over sample tables, `validate` reports
//! drift for denoised tables, and `generate` writes synthetic recordings.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use accel_denoise::{
    io, Axis, AxisData, DenoisingPipeline, FilterConfig, SampleGenerator, SampleSeries, Stage,
    TimeUnit, UnitScale, ValidationEngine, ValidationResult,
};

#[derive(Parser)]
#[command(name = "accel-denoise")]
#[command(version)]
#[command(about = "Accelerometer denoising with drift-based validation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Denoise one or more sample tables
    Denoise(DenoiseArgs),

    /// Integrate denoised tables and report position drift
    Validate(ValidateArgs),

    /// Write a synthetic sample table
    Generate(GenerateArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Full,
    Mpu6050,
    Impulse,
    Passthrough,
}

#[derive(Clone, Copy, ValueEnum)]
enum StageArg {
    Offset,
    Lowpass,
    Median,
    Kalman,
    Savgol,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Offset => Self::Offset,
            StageArg::Lowpass => Self::LowPass,
            StageArg::Median => Self::Median,
            StageArg::Kalman => Self::Kalman,
            StageArg::Savgol => Self::SavitzkyGolay,
        }
    }
}

#[derive(Args)]
struct DenoiseArgs {
    /// Input CSV files (`Time,AccX,AccY,AccZ`), or capture logs with `--capture`
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file; only valid with a single input. Defaults to `denoised_<name>.csv`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON filter configuration; overrides `--preset`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in filter configuration
    #[arg(long, value_enum, default_value = "full")]
    preset: Preset,

    /// Disable a stage (repeatable)
    #[arg(long = "disable", value_enum)]
    disabled: Vec<StageArg>,

    /// Unit of the `Time` column
    #[arg(long, default_value = "s")]
    time_unit: TimeUnit,

    /// Sampling rate override in Hz
    #[arg(long)]
    fs: Option<f64>,

    /// Inputs are raw `ax,ay,az` capture logs without timestamps
    #[arg(long)]
    capture: bool,
}

#[derive(Args)]
struct ValidateArgs {
    /// Denoised CSV files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file; only valid with a single input. Defaults to `validation_<name>.csv`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sensor counts per g
    #[arg(long, default_value_t = accel_denoise::MPU6050_COUNTS_PER_G)]
    counts_per_g: f64,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    /// Sensor at rest with a constant bias
    Stationary,
    /// Constant acceleration along X
    ConstantX,
    /// Ramp up, coast, ramp down on all axes
    Movement,
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(value_enum)]
    scenario: Scenario,

    /// Output CSV file
    #[arg(short, long)]
    output: PathBuf,

    /// Sample period in seconds
    #[arg(long, default_value_t = 0.1)]
    dt: f64,

    /// Noise standard deviation in g
    #[arg(long, default_value_t = 0.02)]
    noise: f64,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Duration in seconds (constant-x, movement)
    #[arg(long, default_value_t = 30.0)]
    duration: f64,

    /// Sample count (stationary)
    #[arg(long, default_value_t = 200)]
    samples: usize,

    /// Bias in g (stationary)
    #[arg(long, default_value_t = 0.02)]
    bias: f64,

    /// X acceleration in g (constant-x)
    #[arg(long, default_value_t = 0.1)]
    acc_x: f64,

    /// Peak acceleration per axis in g (movement)
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [0.6, 4.0, 0.06])]
    peak: Vec<f64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Denoise(args) => denoise(&args),
        Commands::Validate(args) => validate(&args),
        Commands::Generate(args) => generate(&args),
    }
}

/// Sibling of `input` named `<prefix>_<file name>`.
fn prefixed_path(input: &Path, prefix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map_or_else(|| "output.csv".into(), |n| n.to_string_lossy().into_owned());
    input.with_file_name(format!("{prefix}_{name}"))
}

fn output_paths(
    inputs: &[PathBuf],
    output: Option<&Path>,
    prefix: &str,
) -> anyhow::Result<Vec<PathBuf>> {
    match output {
        Some(path) if inputs.len() == 1 => Ok(vec![path.to_path_buf()]),
        Some(_) => bail!("--output requires exactly one input, got {}", inputs.len()),
        None => Ok(inputs.iter().map(|p| prefixed_path(p, prefix)).collect()),
    }
}

fn load_config(args: &DenoiseArgs) -> anyhow::Result<FilterConfig> {
    let mut config = match &args.config {
        Some(path) => FilterConfig::from_json_file(path)
            .with_context(|| format!("loading filter configuration {}", path.display()))?,
        None => match args.preset {
            Preset::Full => FilterConfig::default(),
            Preset::Mpu6050 => FilterConfig::mpu6050(),
            Preset::Impulse => FilterConfig::impulse_rejection(),
            Preset::Passthrough => FilterConfig::passthrough(),
        },
    };
    for &stage in &args.disabled {
        config = config.with_stage(stage.into(), false);
    }
    Ok(config)
}

fn read_input(path: &Path, args: &DenoiseArgs) -> anyhow::Result<SampleSeries> {
    let series = if args.capture {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        io::read_capture(BufReader::new(file))?
    } else {
        io::read_samples(path, args.time_unit)?
    };
    Ok(series)
}

fn denoise(args: &DenoiseArgs) -> anyhow::Result<()> {
    let outputs = output_paths(&args.inputs, args.output.as_deref(), "denoised")?;
    let pipeline = DenoisingPipeline::new(load_config(args)?)?;

    let batch = args
        .inputs
        .iter()
        .map(|p| read_input(p, args).with_context(|| format!("reading {}", p.display())))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let results = match args.fs {
        Some(fs) => pipeline.run_batch_with_rate(&batch, fs),
        None => pipeline.run_batch(&batch),
    };

    for ((input, output), result) in args.inputs.iter().zip(&outputs).zip(results) {
        let table = result.with_context(|| format!("denoising {}", input.display()))?;
        io::write_denoised(output, &table)
            .with_context(|| format!("writing {}", output.display()))?;
        info!(
            input = %input.display(),
            output = %output.display(),
            samples = table.len(),
            "denoised"
        );
        if let Some(issue) = table.sampling.fallback {
            println!(
                "{}: timestamps unusable ({issue}), assumed {} Hz",
                input.display(),
                table.sampling.fs
            );
        }
    }
    Ok(())
}

fn print_report(input: &Path, result: &ValidationResult) {
    println!("\nResults for '{}':", input.display());
    if !result.sampling.is_reliable() {
        println!("(drift computed at fallback rate {} Hz)", result.sampling.fs);
    }
    println!("Final Position Drift:");
    for (axis, pair) in result.summary().iter() {
        println!(
            "{axis}-axis: Raw = {:.2}m, Denoised = {:.2}m",
            pair.raw, pair.denoised
        );
    }
}

fn validate(args: &ValidateArgs) -> anyhow::Result<()> {
    let outputs = output_paths(&args.inputs, args.output.as_deref(), "validation")?;
    let engine = ValidationEngine::new(UnitScale {
        counts_per_g: args.counts_per_g,
        ..UnitScale::default()
    })?;

    let tables = args
        .inputs
        .iter()
        .map(|p| io::read_denoised(p).with_context(|| format!("reading {}", p.display())))
        .collect::<anyhow::Result<Vec<_>>>()?;

    for ((input, output), result) in args
        .inputs
        .iter()
        .zip(&outputs)
        .zip(engine.validate_batch(&tables))
    {
        print_report(input, &result);
        io::write_validation(output, &result)
            .with_context(|| format!("writing {}", output.display()))?;
        println!("Results saved to '{}'.", output.display());
    }
    Ok(())
}

fn generate(args: &GenerateArgs) -> anyhow::Result<()> {
    let mut generator = SampleGenerator::new(args.dt, args.noise, args.seed)?;
    let sample = match args.scenario {
        Scenario::Stationary => generator.stationary(args.samples, args.bias)?,
        Scenario::ConstantX => generator.constant_x(args.duration, args.acc_x)?,
        Scenario::Movement => {
            let [x, y, z] = <[f64; 3]>::try_from(args.peak.as_slice())
                .context("--peak takes exactly three values")?;
            generator.trapezoidal(args.duration, AxisData::new(x, y, z))?
        }
    };

    io::write_samples(&args.output, &sample.series)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Generated {} samples at {} Hz to '{}'",
        sample.series.len(),
        1.0 / args.dt,
        args.output.display()
    );
    for axis in Axis::ALL {
        println!(
            "Theoretical {axis}-axis displacement: {:.2} m",
            sample.expected_position[axis]
        );
    }
    Ok(())
}
