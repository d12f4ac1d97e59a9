use crate::error::{EffortError, Result};
use crate::models::{HeartRateZone, ZoneBounds, ZoneRange};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Zone calculation utilities
pub struct ZoneCalculator;

impl ZoneCalculator {
    pub const FAT_BURN_FLOOR: Decimal = dec!(0.50);
    pub const AEROBIC_FLOOR: Decimal = dec!(0.60);
    pub const ANAEROBIC_FLOOR: Decimal = dec!(0.70);
    pub const MAX_FLOOR: Decimal = dec!(0.85);

    /// Calculate heart rate zones from a maximum heart rate
    ///
    /// Zone boundaries as a share of MaxHR:
    /// - Recovery: 0 - 50%
    /// - Fat Burn: 50 - 60%
    /// - Aerobic: 60 - 70%
    /// - Anaerobic: 70 - 85%
    /// - Max: 85 - 100%
    ///
    /// Each zone shares its lower edge with the upper edge of the zone below.
    pub fn compute_zones(max_heart_rate: u16) -> Result<ZoneBounds> {
        Self::validate_max_heart_rate(max_heart_rate)?;

        let fat_burn_min = Self::percentage_of(max_heart_rate, Self::FAT_BURN_FLOOR)?;
        let aerobic_min = Self::percentage_of(max_heart_rate, Self::AEROBIC_FLOOR)?;
        let anaerobic_min = Self::percentage_of(max_heart_rate, Self::ANAEROBIC_FLOOR)?;
        let max_min = Self::percentage_of(max_heart_rate, Self::MAX_FLOOR)?;

        Ok(ZoneBounds {
            recovery: ZoneRange {
                min: 0,
                max: fat_burn_min,
            },
            fat_burn: ZoneRange {
                min: fat_burn_min,
                max: aerobic_min,
            },
            aerobic: ZoneRange {
                min: aerobic_min,
                max: anaerobic_min,
            },
            anaerobic: ZoneRange {
                min: anaerobic_min,
                max: max_min,
            },
            max: ZoneRange {
                min: max_min,
                max: max_heart_rate,
            },
        })
    }

    /// Determine which zone a heart rate falls into.
    ///
    /// Upper edges are inclusive, so a boundary value belongs to the lower zone.
    /// Anything above the anaerobic ceiling is `Max`, including values above MaxHR.
    pub fn zone_for(heart_rate: u16, zones: &ZoneBounds) -> HeartRateZone {
        if heart_rate <= zones.recovery.max {
            HeartRateZone::Recovery
        } else if heart_rate <= zones.fat_burn.max {
            HeartRateZone::FatBurn
        } else if heart_rate <= zones.aerobic.max {
            HeartRateZone::Aerobic
        } else if heart_rate <= zones.anaerobic.max {
            HeartRateZone::Anaerobic
        } else {
            HeartRateZone::Max
        }
    }

    /// Estimate max heart rate from age (220 - age formula)
    pub fn estimate_max_hr_from_age(age: u8) -> Result<u16> {
        if !(10..=100).contains(&age) {
            return Err(EffortError::invalid_argument(
                "age",
                age,
                "must be between 10 and 100",
            ));
        }
        Ok(220u16.saturating_sub(u16::from(age)))
    }

    /// `round(value * percentage)`, halves rounded away from zero
    pub(crate) fn percentage_of(value: u16, percentage: Decimal) -> Result<u16> {
        let rounded = (Decimal::from(value) * percentage)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        rounded.to_u16().ok_or_else(|| {
            EffortError::invalid_argument(
                "percentage",
                percentage,
                format!("{} of {} bpm is outside the heart-rate range", percentage, value),
            )
        })
    }

    pub(crate) fn validate_max_heart_rate(max_heart_rate: u16) -> Result<()> {
        if max_heart_rate == 0 {
            return Err(EffortError::invalid_argument(
                "max_heart_rate",
                max_heart_rate,
                "must be a positive number of beats per minute",
            ));
        }
        Ok(())
    }
}
