//! Level metering for the editor's horizontal meters.

/// Lowest level shown on the meter, in decibels.
pub const METER_FLOOR_DB: f32 = -60.0;
/// Highest level shown on the meter, in decibels.
pub const METER_CEILING_DB: f32 = 6.0;

/// Root mean square of a block of samples. Empty blocks measure as silence.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Converts a linear gain to decibels, floored at [METER_FLOOR_DB].
pub fn gain_to_db(gain: f32) -> f32 {
    if gain <= 0.0 || !gain.is_finite() {
        return METER_FLOOR_DB;
    }

    (20.0 * gain.log10()).max(METER_FLOOR_DB)
}

/// How much of the meter is filled for a level in decibels, from 0 to 1.
pub fn meter_fill(db: f32) -> f32 {
    ((db - METER_FLOOR_DB) / (METER_CEILING_DB - METER_FLOOR_DB)).clamp(0.0, 1.0)
}
