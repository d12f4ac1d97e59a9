//! Instantaneous effort classification
//!
//! Maps a single heart-rate value onto a zone and a 0-100 intensity. Each zone
//! owns a 20-point slice of the intensity scale (Recovery 0-20, Fat Burn 20-40,
//! Aerobic 40-60, Anaerobic 60-80, Max 80-100) and the value is interpolated
//! linearly inside its zone.

use crate::error::Result;
use crate::models::{EffortReading, HeartRateZone, ZoneBounds};
use crate::zones::ZoneCalculator;

pub struct EffortClassifier;

impl EffortClassifier {
    /// Intensity points allotted to each zone
    pub const POINTS_PER_ZONE: f64 = 20.0;

    pub const MAX_INTENSITY: u8 = 100;

    /// Classify one heart-rate value against a maximum heart rate
    pub fn classify(heart_rate: u16, max_heart_rate: u16) -> Result<EffortReading> {
        let zones = ZoneCalculator::compute_zones(max_heart_rate)?;
        let (zone, intensity) = Self::zone_and_intensity(heart_rate, &zones);

        Ok(EffortReading {
            zone,
            intensity,
            description: zone.description().to_string(),
        })
    }

    /// Zone and intensity against precomputed bounds, for per-sample callers
    pub fn zone_and_intensity(heart_rate: u16, zones: &ZoneBounds) -> (HeartRateZone, u8) {
        let zone = ZoneCalculator::zone_for(heart_rate, zones);
        (zone, Self::intensity_in_zone(heart_rate, zone, zones))
    }

    fn intensity_in_zone(heart_rate: u16, zone: HeartRateZone, zones: &ZoneBounds) -> u8 {
        let range = zones.get(zone);
        let base = zone.index() as f64 * Self::POINTS_PER_ZONE;

        // Collapsed zone: pin to its lower endpoint
        if range.width() == 0 {
            return base.round() as u8;
        }

        let offset = f64::from(heart_rate.saturating_sub(range.min));
        let intensity = (base + offset / f64::from(range.width()) * Self::POINTS_PER_ZONE).round();

        // Readings above MaxHR land past the top of the Max zone
        intensity.min(f64::from(Self::MAX_INTENSITY)) as u8
    }
}
