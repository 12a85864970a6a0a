//! Score normalization.
//!
//! An [`Equalizer`] works in two phases. [`Equalizer::setup`] sees every score
//! of the current batch and records whatever statistics it needs; afterwards
//! [`Equalizer::equalize`] maps one score at a time. Calling `setup` again
//! rebinds the equalizer to the new batch, so one instance can serve many runs.
//!
//! | Equalizer | Setup | Mapping |
//! |-----------|-------|---------|
//! | [`BinaryEqualizer`] | `mean = ceil(sum / n)` | `high` if `v >= mean`, else `low` |
//! | [`LinearEqualizer`] | `off = min(0, min)`, `range = max(0, max) - off` | `trunc((v - off) / range * out_range) + out_offset` |
//! | [`ExponentialEqualizer`] | none | `trunc((1 - e^-v) * out_range)` |

use tracing::warn;

use crate::core::pair::Score;

/// Normalizes a batch of scores
pub trait Equalizer {
    /// Collect statistics over every score of the batch
    fn setup(&mut self, values: &[Score]);

    /// Map a single score, using the statistics from the last `setup`
    fn equalize(&self, value: Score) -> Score;
}

/// Converts a float back to a score, truncating toward zero.
///
/// Out-of-range values saturate at the bounds of [`Score`].
#[inline]
fn truncate_to_score(value: f64) -> Score {
    #[allow(clippy::cast_possible_truncation)]
    {
        value as Score
    }
}

#[inline]
#[allow(clippy::cast_precision_loss)]
fn score_to_f64(value: Score) -> f64 {
    value as f64
}

/// Splits scores into two output values around the batch mean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryEqualizer {
    output_low: Score,
    output_high: Score,
    threshold: Score,
}

impl BinaryEqualizer {
    /// `output_low` for values below the mean, `output_high` for the rest
    pub fn new(output_low: Score, output_high: Score) -> Self {
        Self {
            output_low,
            output_high,
            threshold: 0,
        }
    }

    /// Threshold computed by the last `setup`
    #[must_use]
    pub fn threshold(&self) -> Score {
        self.threshold
    }
}

impl Equalizer for BinaryEqualizer {
    fn setup(&mut self, values: &[Score]) {
        if values.is_empty() {
            self.threshold = 0;
            return;
        }

        let sum: i128 = values.iter().map(|&v| i128::from(v)).sum();
        let count = i128::try_from(values.len()).unwrap_or(i128::MAX);

        // ceil(sum / count) in integers; the mean of scores always fits a score
        let mean = sum.div_euclid(count) + i128::from(sum.rem_euclid(count) != 0);
        self.threshold = Score::try_from(mean).unwrap_or(Score::MAX);
    }

    fn equalize(&self, value: Score) -> Score {
        if value >= self.threshold {
            self.output_high
        } else {
            self.output_low
        }
    }
}

/// Affine rescaling of the batch onto `[output_offset, output_offset + output_range]`
///
/// The input minimum and maximum are both seeded at 0, so the measured range
/// always contains 0: an all-positive batch is measured from 0 rather than from
/// its own minimum. A batch whose range is 0 maps every value to
/// `output_offset`. Differences and the final offset saturate at the `Score`
/// bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearEqualizer {
    output_range: Score,
    output_offset: Score,
    input_offset: Score,
    input_range: Score,
}

impl LinearEqualizer {
    /// Output from 0 to `output_range`
    pub fn new(output_range: Score) -> Self {
        Self::with_offset(output_range, 0)
    }

    /// Output from `output_offset` to `output_offset + output_range`
    pub fn with_offset(output_range: Score, output_offset: Score) -> Self {
        Self {
            output_range,
            output_offset,
            input_offset: 0,
            input_range: 0,
        }
    }

    #[must_use]
    pub fn input_offset(&self) -> Score {
        self.input_offset
    }

    #[must_use]
    pub fn input_range(&self) -> Score {
        self.input_range
    }
}

impl Equalizer for LinearEqualizer {
    fn setup(&mut self, values: &[Score]) {
        let mut min: Score = 0;
        let mut max: Score = 0;

        for &value in values {
            min = min.min(value);
            max = max.max(value);
        }

        self.input_offset = min;
        self.input_range = max.saturating_sub(min);

        if self.input_range == 0 && !values.is_empty() {
            warn!(
                count = values.len(),
                "linear equalizer input range is zero, every value maps to the output offset"
            );
        }
    }

    fn equalize(&self, value: Score) -> Score {
        if self.input_range == 0 {
            return self.output_offset;
        }

        let shifted = value.saturating_sub(self.input_offset);
        let position = score_to_f64(shifted) / score_to_f64(self.input_range);
        truncate_to_score(position * score_to_f64(self.output_range))
            .saturating_add(self.output_offset)
    }
}

/// Saturating `1 - e^-v` curve projected onto `[0, output_range]`
///
/// Meant for non-negative inputs; needs no setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialEqualizer {
    output_range: Score,
}

impl ExponentialEqualizer {
    pub fn new(output_range: Score) -> Self {
        Self { output_range }
    }
}

impl Equalizer for ExponentialEqualizer {
    fn setup(&mut self, _values: &[Score]) {}

    fn equalize(&self, value: Score) -> Score {
        let curve = 1.0 - (-score_to_f64(value)).exp();
        truncate_to_score(curve * score_to_f64(self.output_range))
    }
}
