use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::error::{EffortError, Result};
use crate::quality::WorkoutQualityAnalyzer;

/// A single heart-rate reading taken during a workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateSample {
    /// Heart rate in beats per minute; `None` marks a missing or invalid reading
    pub heart_rate: Option<u16>,

    /// When the reading was taken
    pub timestamp: DateTime<Utc>,
}

impl HeartRateSample {
    pub fn new(heart_rate: u16, timestamp: DateTime<Utc>) -> Self {
        Self {
            heart_rate: Some(heart_rate),
            timestamp,
        }
    }

    /// A sample whose reading was lost or rejected by the source
    pub fn missing(timestamp: DateTime<Utc>) -> Self {
        Self {
            heart_rate: None,
            timestamp,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.heart_rate.is_some()
    }
}

/// Workout types; the scoring formula is chosen from this
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkoutType {
    Weightlifting,
    Cardio,
    #[serde(rename = "HIIT")]
    Hiit,
    CrossFit,
    Running,
    Cycling,
    Yoga,
    #[serde(other)]
    Other,
}

impl WorkoutType {
    pub const ALL: [WorkoutType; 8] = [
        WorkoutType::Weightlifting,
        WorkoutType::Cardio,
        WorkoutType::Hiit,
        WorkoutType::CrossFit,
        WorkoutType::Running,
        WorkoutType::Cycling,
        WorkoutType::Yoga,
        WorkoutType::Other,
    ];

    /// Parse a workout type name, falling back to `Other` for anything unrecognized
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(workout_type = name, "Unrecognized workout type, scoring as Other");
            WorkoutType::Other
        })
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutType::Weightlifting => write!(f, "Weightlifting"),
            WorkoutType::Cardio => write!(f, "Cardio"),
            WorkoutType::Hiit => write!(f, "HIIT"),
            WorkoutType::CrossFit => write!(f, "CrossFit"),
            WorkoutType::Running => write!(f, "Running"),
            WorkoutType::Cycling => write!(f, "Cycling"),
            WorkoutType::Yoga => write!(f, "Yoga"),
            WorkoutType::Other => write!(f, "Other"),
        }
    }
}

impl std::str::FromStr for WorkoutType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weightlifting" | "weights" | "strength" => Ok(WorkoutType::Weightlifting),
            "cardio" => Ok(WorkoutType::Cardio),
            "hiit" => Ok(WorkoutType::Hiit),
            "crossfit" => Ok(WorkoutType::CrossFit),
            "running" | "run" => Ok(WorkoutType::Running),
            "cycling" | "ride" => Ok(WorkoutType::Cycling),
            "yoga" => Ok(WorkoutType::Yoga),
            "other" => Ok(WorkoutType::Other),
            _ => Err(format!("Invalid workout type: {}", s)),
        }
    }
}

/// The five heart-rate zones, ordered from easiest to hardest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeartRateZone {
    Recovery,
    FatBurn,
    Aerobic,
    Anaerobic,
    Max,
}

impl HeartRateZone {
    pub const ALL: [HeartRateZone; 5] = [
        HeartRateZone::Recovery,
        HeartRateZone::FatBurn,
        HeartRateZone::Aerobic,
        HeartRateZone::Anaerobic,
        HeartRateZone::Max,
    ];

    /// Position of the zone in [`HeartRateZone::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Fixed effort label shown next to a reading
    pub fn description(self) -> &'static str {
        match self {
            HeartRateZone::Recovery => "Very Light",
            HeartRateZone::FatBurn => "Light",
            HeartRateZone::Aerobic => "Moderate",
            HeartRateZone::Anaerobic => "Hard",
            HeartRateZone::Max => "Maximum",
        }
    }
}

impl fmt::Display for HeartRateZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeartRateZone::Recovery => write!(f, "Recovery"),
            HeartRateZone::FatBurn => write!(f, "Fat Burn"),
            HeartRateZone::Aerobic => write!(f, "Aerobic"),
            HeartRateZone::Anaerobic => write!(f, "Anaerobic"),
            HeartRateZone::Max => write!(f, "Max"),
        }
    }
}

/// Inclusive heart-rate range of one zone, in bpm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRange {
    pub min: u16,
    pub max: u16,
}

impl ZoneRange {
    pub fn width(&self) -> u16 {
        self.max.saturating_sub(self.min)
    }

    pub fn contains(&self, heart_rate: u16) -> bool {
        heart_rate >= self.min && heart_rate <= self.max
    }
}

/// Heart-rate zones derived from a maximum heart rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneBounds {
    pub recovery: ZoneRange,
    pub fat_burn: ZoneRange,
    pub aerobic: ZoneRange,
    pub anaerobic: ZoneRange,
    pub max: ZoneRange,
}

impl ZoneBounds {
    pub fn get(&self, zone: HeartRateZone) -> ZoneRange {
        match zone {
            HeartRateZone::Recovery => self.recovery,
            HeartRateZone::FatBurn => self.fat_burn,
            HeartRateZone::Aerobic => self.aerobic,
            HeartRateZone::Anaerobic => self.anaerobic,
            HeartRateZone::Max => self.max,
        }
    }

    /// Zones paired with their ranges in ascending order
    pub fn ranges(&self) -> [(HeartRateZone, ZoneRange); 5] {
        HeartRateZone::ALL.map(|zone| (zone, self.get(zone)))
    }
}

/// Instantaneous effort for a single heart-rate value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffortReading {
    pub zone: HeartRateZone,

    /// 0-100, piecewise linear across the five zones
    pub intensity: u8,

    pub description: String,
}

/// Qualitative banding of a workout score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Quality {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            Quality::Excellent
        } else if score >= 60 {
            Quality::Good
        } else if score >= 40 {
            Quality::Fair
        } else {
            Quality::Poor
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Excellent => write!(f, "Excellent"),
            Quality::Good => write!(f, "Good"),
            Quality::Fair => write!(f, "Fair"),
            Quality::Poor => write!(f, "Poor"),
        }
    }
}

/// Derived metrics that feed the type-specific scoring formulas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSpecificMetrics {
    /// Population standard deviation of the valid readings, in bpm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hr_variability: Option<u16>,

    /// Readings above the anaerobic ceiling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_spikes: Option<u32>,

    /// Reserved in the record shape; never computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_efficiency: Option<f64>,

    /// Longest unbroken aerobic run as a percentage of all samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustained_aerobic: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_transitions: Option<u32>,
}

/// Quality summary of one workout, stored as part of its record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutQuality {
    pub average_intensity: u8,
    pub max_intensity: u8,

    /// Percentage of all samples (missing readings included) spent in each zone
    pub time_in_zones: BTreeMap<HeartRateZone, u8>,

    pub quality: Quality,
    pub score: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_specific: Option<WorkoutSpecificMetrics>,
}

impl WorkoutQuality {
    /// Result for a workout with no samples at all
    pub fn empty() -> Self {
        Self {
            average_intensity: 0,
            max_intensity: 0,
            time_in_zones: BTreeMap::new(),
            quality: Quality::Poor,
            score: 0,
            workout_specific: None,
        }
    }

    pub fn time_in(&self, zone: HeartRateZone) -> u8 {
        self.time_in_zones.get(&zone).copied().unwrap_or(0)
    }
}

impl Default for WorkoutQuality {
    fn default() -> Self {
        Self::empty()
    }
}

/// Min/avg/max over the valid readings of a sample sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSummary {
    pub min: Option<u16>,
    pub avg: Option<u16>,
    pub max: Option<u16>,
}

impl HeartRateSummary {
    pub fn from_samples(samples: &[HeartRateSample]) -> Self {
        let valid: Vec<u16> = samples.iter().filter_map(|s| s.heart_rate).collect();
        if valid.is_empty() {
            return Self::default();
        }

        let sum: u64 = valid.iter().map(|&hr| u64::from(hr)).sum();
        let avg = (sum as f64 / valid.len() as f64).round() as u16;

        Self {
            min: valid.iter().min().copied(),
            avg: Some(avg),
            max: valid.iter().max().copied(),
        }
    }
}

/// Completed workout as handed to the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: Uuid,

    #[serde(rename = "type")]
    pub workout_type: WorkoutType,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    /// Raw samples in recording order
    pub heart_rate_data: Vec<HeartRateSample>,

    pub min_heart_rate: Option<u16>,
    pub avg_heart_rate: Option<u16>,
    pub max_heart_rate: Option<u16>,

    pub quality: WorkoutQuality,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WorkoutRecord {
    /// Close out a workout: summarize the samples and score the session
    pub fn complete(
        workout_type: WorkoutType,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        heart_rate_data: Vec<HeartRateSample>,
        max_heart_rate: u16,
        notes: Option<String>,
    ) -> Result<Self> {
        if end_time < start_time {
            return Err(EffortError::invalid_argument(
                "end_time",
                end_time,
                format!("workout cannot end before it starts ({})", start_time),
            ));
        }

        let duration_seconds = (end_time - start_time).num_milliseconds() as f64 / 1000.0;
        let quality = WorkoutQualityAnalyzer::score(
            &heart_rate_data,
            max_heart_rate,
            duration_seconds,
            workout_type,
        )?;
        let summary = HeartRateSummary::from_samples(&heart_rate_data);

        Ok(Self {
            id: Uuid::new_v4(),
            workout_type,
            start_time,
            end_time,
            heart_rate_data,
            min_heart_rate: summary.min,
            avg_heart_rate: summary.avg,
            max_heart_rate: summary.max,
            quality,
            notes,
        })
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }
}
