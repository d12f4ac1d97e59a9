use std::collections::BTreeMap;

use statrs::statistics::Statistics;
use tracing::{debug, trace};

use crate::effort::EffortClassifier;
use crate::error::{EffortError, Result};
use crate::models::{
    HeartRateSample, HeartRateZone, Quality, WorkoutQuality, WorkoutSpecificMetrics,
    WorkoutType, ZoneBounds,
};
use crate::zones::ZoneCalculator;

/// Workout quality scoring from heart-rate samples
pub struct WorkoutQualityAnalyzer;

impl WorkoutQualityAnalyzer {
    /// One hour of work earns the full duration score
    pub const FULL_DURATION_SECONDS: f64 = 3600.0;

    /// Standard deviation (bpm) that earns the full variability score
    pub const FULL_VARIABILITY_BPM: f64 = 30.0;

    /// Variability score used when there are too few readings to measure it
    pub const DEFAULT_VARIABILITY_SCORE: f64 = 50.0;

    /// Score a completed (or in-progress) workout.
    ///
    /// Missing readings count toward the sample total: they add zero to the
    /// intensity series and to the zone-percentage denominators, but are left out
    /// of variability, spikes, the aerobic run and zone transitions.
    pub fn score(
        samples: &[HeartRateSample],
        max_heart_rate: u16,
        duration_seconds: f64,
        workout_type: WorkoutType,
    ) -> Result<WorkoutQuality> {
        ZoneCalculator::validate_max_heart_rate(max_heart_rate)?;
        Self::validate_duration(duration_seconds)?;

        if samples.is_empty() {
            debug!(%workout_type, "No heart-rate samples, returning empty quality");
            return Ok(WorkoutQuality::empty());
        }

        let zones = ZoneCalculator::compute_zones(max_heart_rate)?;
        let scan = SampleScan::run(samples, &zones);
        let sample_count = samples.len();

        // Stored rounded; the formulas below use this rounded value
        let average_intensity = (scan.intensity_sum as f64 / sample_count as f64).round() as u8;
        let max_intensity = scan.peak_intensity;

        let time_in_zones: BTreeMap<HeartRateZone, u8> = HeartRateZone::ALL
            .iter()
            .map(|&zone| (zone, percentage(scan.zone_counts[zone.index()], sample_count)))
            .collect();

        let metrics = WorkoutSpecificMetrics {
            hr_variability: Self::hr_variability(&scan.valid_heart_rates),
            peak_spikes: Some(scan.peak_spikes),
            recovery_efficiency: None,
            sustained_aerobic: Some(percentage(scan.longest_aerobic_run, sample_count)),
            zone_transitions: Some(scan.zone_transitions),
        };

        trace!(
            ?time_in_zones,
            ?metrics,
            valid = scan.valid_heart_rates.len(),
            "Sample scan complete"
        );

        let inputs = ScoreInputs {
            average_intensity: f64::from(average_intensity),
            max_intensity: f64::from(max_intensity),
            time_in_zones: &time_in_zones,
            metrics: &metrics,
            sample_count: sample_count as f64,
            duration_seconds,
        };
        let score = inputs.weighted_score(workout_type).round().clamp(0.0, 100.0) as u8;
        let quality = Quality::from_score(score);

        debug!(
            %workout_type,
            samples = sample_count,
            max_heart_rate,
            score,
            %quality,
            "Scored workout"
        );

        Ok(WorkoutQuality {
            average_intensity,
            max_intensity,
            time_in_zones,
            quality,
            score,
            workout_specific: Some(metrics),
        })
    }

    /// Population standard deviation, rounded; undefined for fewer than two readings
    fn hr_variability(valid: &[f64]) -> Option<u16> {
        if valid.len() <= 1 {
            return None;
        }
        Some(valid.population_std_dev().round() as u16)
    }

    fn validate_duration(duration_seconds: f64) -> Result<()> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(EffortError::invalid_argument(
                "duration_seconds",
                duration_seconds,
                "must be a finite, non-negative number of seconds",
            ));
        }
        Ok(())
    }
}

/// Everything the per-sample pass accumulates
#[derive(Debug, Default)]
struct SampleScan {
    intensity_sum: u64,
    peak_intensity: u8,
    zone_counts: [usize; 5],
    valid_heart_rates: Vec<f64>,
    peak_spikes: u32,
    longest_aerobic_run: usize,
    zone_transitions: u32,
}

impl SampleScan {
    fn run(samples: &[HeartRateSample], zones: &ZoneBounds) -> Self {
        let mut scan = SampleScan {
            valid_heart_rates: Vec::with_capacity(samples.len()),
            ..Default::default()
        };
        let mut aerobic_run = 0usize;
        let mut previous_zone: Option<HeartRateZone> = None;

        for sample in samples {
            let Some(heart_rate) = sample.heart_rate else {
                // Breaks the aerobic run; intensity contributes 0
                aerobic_run = 0;
                continue;
            };

            let (zone, intensity) = EffortClassifier::zone_and_intensity(heart_rate, zones);
            scan.intensity_sum += u64::from(intensity);
            scan.peak_intensity = scan.peak_intensity.max(intensity);
            scan.zone_counts[zone.index()] += 1;
            scan.valid_heart_rates.push(f64::from(heart_rate));

            if heart_rate > zones.anaerobic.max {
                scan.peak_spikes += 1;
            }

            // Inclusive on both edges, unlike zone classification
            if zones.aerobic.contains(heart_rate) {
                aerobic_run += 1;
                scan.longest_aerobic_run = scan.longest_aerobic_run.max(aerobic_run);
            } else {
                aerobic_run = 0;
            }

            if previous_zone.is_some_and(|previous| previous != zone) {
                scan.zone_transitions += 1;
            }
            previous_zone = Some(zone);
        }

        scan
    }
}

struct ScoreInputs<'a> {
    average_intensity: f64,
    max_intensity: f64,
    time_in_zones: &'a BTreeMap<HeartRateZone, u8>,
    metrics: &'a WorkoutSpecificMetrics,
    sample_count: f64,
    duration_seconds: f64,
}

impl ScoreInputs<'_> {
    /// Unrounded 0-100 score for the workout type
    fn weighted_score(&self, workout_type: WorkoutType) -> f64 {
        let duration_score = (self.duration_seconds / WorkoutQualityAnalyzer::FULL_DURATION_SECONDS
            * 100.0)
            .min(100.0);
        let time_in_high_intensity =
            self.zone(HeartRateZone::Anaerobic) + self.zone(HeartRateZone::Max);

        match workout_type {
            WorkoutType::Weightlifting => {
                let variability_score = self
                    .metrics
                    .hr_variability
                    .map(|hrv| {
                        (f64::from(hrv) / WorkoutQualityAnalyzer::FULL_VARIABILITY_BPM * 100.0)
                            .min(100.0)
                    })
                    .unwrap_or(WorkoutQualityAnalyzer::DEFAULT_VARIABILITY_SCORE);
                let spikes = f64::from(self.metrics.peak_spikes.unwrap_or(0));
                let spikes_score =
                    (spikes / (self.sample_count / 10.0).max(1.0) * 100.0).min(100.0);

                0.30 * self.max_intensity
                    + 0.25 * spikes_score
                    + 0.25 * variability_score
                    + 0.10 * duration_score
                    + 0.10 * self.average_intensity
            }
            WorkoutType::Cardio | WorkoutType::Running | WorkoutType::Cycling => {
                let sustained_aerobic = f64::from(self.metrics.sustained_aerobic.unwrap_or(0));

                0.35 * sustained_aerobic
                    + 0.30 * self.average_intensity
                    + 0.20 * duration_score
                    + 0.15 * self.zone(HeartRateZone::Aerobic)
            }
            WorkoutType::Hiit | WorkoutType::CrossFit => {
                let transitions = f64::from(self.metrics.zone_transitions.unwrap_or(0));
                let transitions_score =
                    (transitions / (self.sample_count / 5.0).max(1.0) * 100.0).min(100.0);

                0.30 * time_in_high_intensity
                    + 0.25 * transitions_score
                    + 0.25 * self.max_intensity
                    + 0.20 * self.average_intensity
            }
            WorkoutType::Yoga | WorkoutType::Other => {
                0.35 * self.average_intensity
                    + 0.30 * self.max_intensity
                    + 0.20 * time_in_high_intensity
                    + 0.15 * duration_score
            }
        }
    }

    fn zone(&self, zone: HeartRateZone) -> f64 {
        f64::from(self.time_in_zones.get(&zone).copied().unwrap_or(0))
    }
}

/// `round(count / total * 100)`
fn percentage(count: usize, total: usize) -> u8 {
    if total == 0 {
        0
    } else {
        (count as f64 / total as f64 * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn samples_from(readings: &[Option<u16>]) -> Vec<HeartRateSample> {
        readings
            .iter()
            .enumerate()
            .map(|(i, &heart_rate)| HeartRateSample {
                heart_rate,
                timestamp: at(i as i64 * 5),
            })
            .collect()
    }

    fn constant(heart_rate: u16, count: usize) -> Vec<HeartRateSample> {
        samples_from(&vec![Some(heart_rate); count])
    }

    fn metrics(quality: &WorkoutQuality) -> &WorkoutSpecificMetrics {
        quality.workout_specific.as_ref().unwrap()
    }

    #[test]
    fn test_empty_samples_short_circuit() {
        for workout_type in WorkoutType::ALL {
            let quality = WorkoutQualityAnalyzer::score(&[], 190, 1800.0, workout_type).unwrap();
            assert_eq!(quality, WorkoutQuality::empty());
            assert!(quality.time_in_zones.is_empty());
            assert!(quality.workout_specific.is_none());
        }
    }

    #[test]
    fn test_single_sample_on_recovery_ceiling() {
        let samples = constant(100, 1);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 200, 60.0, WorkoutType::Other).unwrap();

        assert_eq!(quality.average_intensity, 20);
        assert_eq!(quality.max_intensity, 20);
        assert_eq!(quality.time_in(HeartRateZone::Recovery), 100);
        assert_eq!(quality.time_in(HeartRateZone::FatBurn), 0);
        assert_eq!(quality.time_in_zones.len(), 5);
        // 0.35*20 + 0.30*20 + 0.20*0 + 0.15*1.67 = 13.25
        assert_eq!(quality.score, 13);
        assert_eq!(quality.quality, Quality::Poor);
        assert_eq!(metrics(&quality).hr_variability, None);
    }

    #[test]
    fn test_single_sample_above_fat_burn_floor() {
        // 100 bpm sits on the recovery ceiling; 101 is the first fat-burn value
        let samples = constant(101, 1);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 200, 60.0, WorkoutType::Other).unwrap();
        assert_eq!(quality.time_in(HeartRateZone::FatBurn), 100);
        assert_eq!(quality.max_intensity, 21);
    }

    #[test]
    fn test_alternating_hiit() {
        let readings: Vec<Option<u16>> = (0..10)
            .map(|i| Some(if i % 2 == 0 { 60 } else { 190 }))
            .collect();
        let samples = samples_from(&readings);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 200, 1200.0, WorkoutType::Hiit).unwrap();

        assert_eq!(metrics(&quality).zone_transitions, Some(9));
        assert_eq!(metrics(&quality).peak_spikes, Some(5));
        assert_eq!(quality.time_in(HeartRateZone::Recovery), 50);
        assert_eq!(quality.time_in(HeartRateZone::Max), 50);
        // (5*12 + 5*93) / 10 = 52.5
        assert_eq!(quality.average_intensity, 53);
        assert_eq!(quality.max_intensity, 93);
        // 0.30*50 + 0.25*100 + 0.25*93 + 0.20*53 = 73.85
        assert_eq!(quality.score, 74);
        assert_eq!(quality.quality, Quality::Good);

        let crossfit =
            WorkoutQualityAnalyzer::score(&samples, 200, 1200.0, WorkoutType::CrossFit).unwrap();
        assert_eq!(crossfit, quality);
    }

    #[test]
    fn test_missing_sample_in_denominator() {
        let mut readings = vec![Some(150); 9];
        readings.insert(4, None);
        let samples = samples_from(&readings);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 200, 600.0, WorkoutType::Other).unwrap();

        assert_eq!(quality.time_in(HeartRateZone::Anaerobic), 90);
        let total: u32 = quality.time_in_zones.values().map(|&p| u32::from(p)).sum();
        assert_eq!(total, 90);
        assert_eq!(metrics(&quality).hr_variability, Some(0));
        // Nine 67s and one 0
        assert_eq!(quality.average_intensity, 60);
        assert_eq!(quality.max_intensity, 67);
        // 0.35*60 + 0.30*67 + 0.20*90 + 0.15*16.67 = 61.6
        assert_eq!(quality.score, 62);
    }

    #[test]
    fn test_weightlifting_spikes() {
        let samples = constant(180, 10);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 200, 1800.0, WorkoutType::Weightlifting)
                .unwrap();

        assert_eq!(quality.max_intensity, 87);
        assert_eq!(metrics(&quality).peak_spikes, Some(10));
        assert_eq!(metrics(&quality).hr_variability, Some(0));
        // 0.30*87 + 0.25*100 + 0.25*0 + 0.10*50 + 0.10*87 = 64.8
        assert_eq!(quality.score, 65);
        assert_eq!(quality.quality, Quality::Good);
    }

    #[test]
    fn test_weightlifting_default_variability() {
        let samples = constant(150, 1);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 200, 0.0, WorkoutType::Weightlifting).unwrap();

        assert_eq!(metrics(&quality).hr_variability, None);
        // 0.30*67 + 0 + 0.25*50 + 0 + 0.10*67 = 39.3
        assert_eq!(quality.score, 39);
        assert_eq!(quality.quality, Quality::Poor);
    }

    #[test]
    fn test_hr_variability_population() {
        // Mean 150, deviations +-10 -> population std dev 10
        let samples = samples_from(&[Some(140), Some(160), Some(140), Some(160), None]);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 200, 600.0, WorkoutType::Weightlifting)
                .unwrap();
        assert_eq!(metrics(&quality).hr_variability, Some(10));
    }

    #[test]
    fn test_steady_cardio() {
        let samples = constant(130, 10);
        for workout_type in [WorkoutType::Cardio, WorkoutType::Running, WorkoutType::Cycling] {
            let quality =
                WorkoutQualityAnalyzer::score(&samples, 200, 3600.0, workout_type).unwrap();

            assert_eq!(metrics(&quality).sustained_aerobic, Some(100));
            assert_eq!(quality.time_in(HeartRateZone::Aerobic), 100);
            // 0.35*100 + 0.30*50 + 0.20*100 + 0.15*100
            assert_eq!(quality.score, 85);
            assert_eq!(quality.quality, Quality::Excellent);
        }
    }

    #[test]
    fn test_duration_score_caps_at_one_hour() {
        let samples = constant(130, 10);
        let hour = WorkoutQualityAnalyzer::score(&samples, 200, 3600.0, WorkoutType::Cardio)
            .unwrap();
        let two_hours =
            WorkoutQualityAnalyzer::score(&samples, 200, 7200.0, WorkoutType::Cardio).unwrap();

        assert_eq!(hour.score, 85);
        assert_eq!(two_hours.score, hour.score);
    }

    #[test]
    fn test_weightlifting_variability_caps_at_full_score() {
        let samples = samples_from(&[Some(60), Some(190), Some(60), Some(190)]);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 200, 60.0, WorkoutType::Weightlifting)
                .unwrap();

        // Mean 125, every reading 65 away
        assert_eq!(metrics(&quality).hr_variability, Some(65));
        assert_eq!(metrics(&quality).peak_spikes, Some(2));
        assert_eq!(quality.max_intensity, 93);
        assert_eq!(quality.average_intensity, 53);
        // 0.30*93 + 0.25*100 + 0.25*100 + 0.10*1.67 + 0.10*53 = 83.37
        assert_eq!(quality.score, 83);
    }

    #[test]
    fn test_sustained_aerobic_run_resets() {
        let samples = samples_from(&[
            Some(130),
            Some(130),
            None,
            Some(130),
            Some(130),
            Some(130),
            Some(150),
            Some(130),
        ]);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 200, 600.0, WorkoutType::Cardio).unwrap();
        // Longest run is 3 of 8 samples
        assert_eq!(metrics(&quality).sustained_aerobic, Some(38));
    }

    #[test]
    fn test_sustained_aerobic_includes_lower_edge() {
        // 120 bpm classifies as fat burn but still counts toward the aerobic run
        let samples = constant(120, 4);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 200, 600.0, WorkoutType::Cardio).unwrap();
        assert_eq!(quality.time_in(HeartRateZone::FatBurn), 100);
        assert_eq!(metrics(&quality).sustained_aerobic, Some(100));
    }

    #[test]
    fn test_zone_transitions_skip_missing() {
        let samples = samples_from(&[
            Some(60),
            None,
            Some(60),
            Some(190),
            None,
            Some(190),
            Some(60),
        ]);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 200, 600.0, WorkoutType::Hiit).unwrap();
        assert_eq!(metrics(&quality).zone_transitions, Some(2));
    }

    #[test]
    fn test_all_missing_samples() {
        let samples = samples_from(&[None, None, None]);
        let quality =
            WorkoutQualityAnalyzer::score(&samples, 190, 600.0, WorkoutType::Other).unwrap();

        assert_eq!(quality.average_intensity, 0);
        assert_eq!(quality.time_in_zones.len(), 5);
        assert!(quality.time_in_zones.values().all(|&p| p == 0));
        assert_eq!(metrics(&quality).hr_variability, None);
        assert_eq!(metrics(&quality).zone_transitions, Some(0));
        assert_eq!(metrics(&quality).recovery_efficiency, None);
    }

    #[test]
    fn test_score_is_deterministic() {
        let readings: Vec<Option<u16>> = (0..240u16).map(|i| Some(90 + (i * 7) % 110)).collect();
        let samples = samples_from(&readings);

        for workout_type in WorkoutType::ALL {
            let first = WorkoutQualityAnalyzer::score(&samples, 190, 2400.0, workout_type).unwrap();
            let second =
                WorkoutQualityAnalyzer::score(&samples, 190, 2400.0, workout_type).unwrap();
            assert_eq!(first, second);
            assert!(first.score <= 100);
            assert!(first.time_in_zones.values().all(|&p| p <= 100));
        }
    }

    #[test]
    fn test_yoga_uses_default_formula() {
        let samples = constant(150, 6);
        let yoga = WorkoutQualityAnalyzer::score(&samples, 200, 900.0, WorkoutType::Yoga).unwrap();
        let other =
            WorkoutQualityAnalyzer::score(&samples, 200, 900.0, WorkoutType::Other).unwrap();
        assert_eq!(yoga, other);
    }

    #[test]
    fn test_invalid_arguments() {
        let samples = constant(150, 3);
        assert!(WorkoutQualityAnalyzer::score(&samples, 0, 60.0, WorkoutType::Other).is_err());
        assert!(WorkoutQualityAnalyzer::score(&samples, 190, -1.0, WorkoutType::Other).is_err());
        assert!(
            WorkoutQualityAnalyzer::score(&samples, 190, f64::NAN, WorkoutType::Other).is_err()
        );
        // Arguments are checked even without samples
        assert!(WorkoutQualityAnalyzer::score(&[], 0, 60.0, WorkoutType::Other).is_err());
    }
}
