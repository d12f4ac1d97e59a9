use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{error, warn};

use effortrs::error::ErrorSeverity;
use effortrs::{
    logging, AppConfig, EffortError, EffortClassifier, HeartRateSample, HeartRateZone, ImportManager,
    LogLevel, Quality, WorkoutQuality, WorkoutQualityAnalyzer, WorkoutRecord, WorkoutType,
    ZoneCalculator,
};

/// effortrs - Heart-rate effort and workout quality scoring
///
/// Derives heart-rate zones from a maximum heart rate, classifies single
/// readings, and scores recorded workouts by workout type.
#[derive(Parser)]
#[command(name = "effortrs")]
#[command(version)]
#[command(about = "Heart-rate effort and workout quality scoring", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the five heart-rate zones
    Zones {
        /// Maximum heart rate in bpm (defaults to the configured profile)
        #[arg(short, long)]
        max_hr: Option<u16>,
    },

    /// Classify a single heart-rate reading
    Classify {
        /// Heart rate in bpm
        heart_rate: u16,

        #[arg(short, long)]
        max_hr: Option<u16>,
    },

    /// Score a recorded workout
    Score {
        /// Sample file (CSV or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Workout type (Weightlifting, Cardio, HIIT, CrossFit, Running, Cycling, Yoga, Other)
        #[arg(short = 't', long)]
        workout_type: Option<String>,

        /// Duration in seconds (defaults to the span of the sample timestamps)
        #[arg(short, long)]
        duration: Option<f64>,

        #[arg(short, long)]
        max_hr: Option<u16>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a complete workout record as JSON
    Record {
        /// Sample file (CSV or JSON)
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short = 't', long)]
        workout_type: Option<String>,

        #[arg(short, long)]
        max_hr: Option<u16>,

        /// Free-text notes stored with the record
        #[arg(short, long)]
        notes: Option<String>,
    },
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "From (bpm)")]
    min: u16,
    #[tabled(rename = "To (bpm)")]
    max: u16,
    #[tabled(rename = "Effort")]
    effort: &'static str,
}

#[derive(Tabled)]
struct TimeInZoneRow {
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Time (%)")]
    percent: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Log at the error's severity and print its user-facing message
fn report_error(err: &anyhow::Error) {
    let Some(effort_error) = err.chain().find_map(|cause| cause.downcast_ref::<EffortError>())
    else {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        return;
    };

    match effort_error.severity() {
        ErrorSeverity::Warning => warn!(error = %effort_error, "Command rejected"),
        ErrorSeverity::Error => error!(error = ?effort_error, "Command failed"),
    }
    eprintln!("{} {}", "Error:".red().bold(), effort_error.user_message());
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };
    if cli.verbose > 0 {
        config.logging.level = LogLevel::from_verbosity(cli.verbose);
    }
    logging::init_logging(&config.logging)?;

    match cli.command {
        Commands::Zones { max_hr } => {
            let max_hr = config.resolve_max_heart_rate(max_hr)?;
            let zones = ZoneCalculator::compute_zones(max_hr)?;

            println!("{}", format!("Heart-rate zones for {} bpm max", max_hr).green().bold());
            let rows: Vec<ZoneRow> = zones
                .ranges()
                .into_iter()
                .map(|(zone, range)| ZoneRow {
                    zone: zone.to_string(),
                    min: range.min,
                    max: range.max,
                    effort: zone.description(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Classify { heart_rate, max_hr } => {
            let max_hr = config.resolve_max_heart_rate(max_hr)?;
            let reading = EffortClassifier::classify(heart_rate, max_hr)?;

            println!(
                "{} bpm: {} ({}), intensity {}",
                heart_rate,
                reading.zone.to_string().cyan().bold(),
                reading.description,
                reading.intensity
            );
        }

        Commands::Score {
            file,
            workout_type,
            duration,
            max_hr,
            json,
        } => {
            let max_hr = config.resolve_max_heart_rate(max_hr)?;
            let workout_type = resolve_workout_type(workout_type.as_deref(), &config);
            let samples = load_samples(&file)?;
            let duration = duration.unwrap_or_else(|| sample_span_seconds(&samples));

            let quality = WorkoutQualityAnalyzer::score(&samples, max_hr, duration, workout_type)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&quality)?);
            } else {
                print_quality(&quality, workout_type, samples.len());
            }
        }

        Commands::Record {
            file,
            workout_type,
            max_hr,
            notes,
        } => {
            let max_hr = config.resolve_max_heart_rate(max_hr)?;
            let workout_type = resolve_workout_type(workout_type.as_deref(), &config);
            let samples = load_samples(&file)?;

            let (start, end) = match (samples.first(), samples.last()) {
                (Some(first), Some(last)) => (first.timestamp, last.timestamp),
                _ => anyhow::bail!("{} contains no samples", file.display()),
            };

            let record =
                WorkoutRecord::complete(workout_type, start, end, samples, max_hr, notes)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

fn resolve_workout_type(name: Option<&str>, config: &AppConfig) -> WorkoutType {
    name.map(WorkoutType::parse_lenient)
        .unwrap_or(config.scoring.default_workout_type)
}

fn load_samples(file: &Path) -> Result<Vec<HeartRateSample>> {
    ImportManager::new()
        .import_file(file)
        .with_context(|| format!("Failed to load samples from {}", file.display()))
}

/// Seconds between the first and last sample, zero for fewer than two
fn sample_span_seconds(samples: &[HeartRateSample]) -> f64 {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) if last.timestamp > first.timestamp => {
            (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0
        }
        _ => 0.0,
    }
}

fn print_quality(quality: &WorkoutQuality, workout_type: WorkoutType, sample_count: usize) {
    let label = match quality.quality {
        Quality::Excellent => quality.quality.to_string().green(),
        Quality::Good => quality.quality.to_string().cyan(),
        Quality::Fair => quality.quality.to_string().yellow(),
        Quality::Poor => quality.quality.to_string().red(),
    };

    println!(
        "{}",
        format!("{} workout, {} samples", workout_type, sample_count).bold()
    );
    println!("  Score:     {} ({})", quality.score.to_string().bold(), label);
    println!(
        "  Intensity: avg {} / max {}",
        quality.average_intensity, quality.max_intensity
    );

    if !quality.time_in_zones.is_empty() {
        let rows: Vec<TimeInZoneRow> = HeartRateZone::ALL
            .iter()
            .map(|&zone| TimeInZoneRow {
                zone: zone.to_string(),
                percent: quality.time_in(zone),
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if let Some(metrics) = &quality.workout_specific {
        if let Some(hrv) = metrics.hr_variability {
            println!("  HR variability:    {} bpm", hrv);
        }
        if let Some(spikes) = metrics.peak_spikes {
            println!("  Peak spikes:       {}", spikes);
        }
        if let Some(sustained) = metrics.sustained_aerobic {
            println!("  Sustained aerobic: {}%", sustained);
        }
        if let Some(transitions) = metrics.zone_transitions {
            println!("  Zone transitions:  {}", transitions);
        }
    }
}
