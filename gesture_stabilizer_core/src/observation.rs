use serde::{Deserialize, Serialize};

use crate::error::StabilizerError;
use crate::labels::LabelCatalog;

/// One classifier result for one tick: arg-max label and its confidence in percent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub label: String,
    pub confidence: f32,
}

impl Observation {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// Reduce a probability vector to its arg-max observation.
    ///
    /// Values are used as-is (no renormalization); the winning probability is
    /// scaled to a percentage and kept to two decimals.
    pub fn from_distribution(
        distribution: &[f32],
        catalog: &LabelCatalog,
    ) -> Result<Self, StabilizerError> {
        if catalog.is_empty() {
            return Err(StabilizerError::EmptyCatalog);
        }
        if distribution.is_empty() {
            return Err(StabilizerError::EmptyDistribution);
        }
        if distribution.len() != catalog.len() {
            return Err(StabilizerError::LengthMismatch {
                expected: catalog.len(),
                got: distribution.len(),
            });
        }
        if let Some(index) = distribution.iter().position(|p| !p.is_finite()) {
            return Err(StabilizerError::NonFiniteProbability { index });
        }

        let (idx, p) = arg_max(distribution).ok_or(StabilizerError::EmptyDistribution)?;
        let label = catalog
            .get(idx)
            .ok_or(StabilizerError::LengthMismatch {
                expected: catalog.len(),
                got: distribution.len(),
            })?;

        Ok(Self::new(label, probability_to_percent(p)))
    }
}

/// Index and value of the largest element. Ties go to the lowest index.
#[inline]
pub fn arg_max(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

/// Scale a probability to a percentage kept to two decimals.
///
/// Scaling and rounding happen in one f64 step so the f32 input is never
/// rounded twice.
#[inline]
pub fn probability_to_percent(p: f32) -> f32 {
    ((p as f64 * 10_000.0).round() / 100.0) as f32
}

/// Round half away from zero to two decimal places.
#[inline]
pub fn round_to_hundredths(x: f32) -> f32 {
    ((x as f64 * 100.0).round() / 100.0) as f32
}
