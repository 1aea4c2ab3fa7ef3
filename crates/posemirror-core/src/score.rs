//! Accuracy percentage and tier mapping.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::TierBoundaries;

/// Discrete accuracy bucket driving message fallback and indicator color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Above the `good` boundary
    Good,
    /// Above the `warning` boundary
    Warning,
    /// Everything else
    Poor,
}

impl Tier {
    /// Short label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a deviation to `100 * (1 - deviation / max_expected)`, clamped to `[0, 100]`.
///
/// NaN inputs and a non-positive `max_expected` yield 0.
#[must_use]
pub fn accuracy_percent(deviation: f32, max_expected: f32) -> f32 {
    if !(max_expected > 0.0) {
        return 0.0;
    }
    let percent = 100.0 * (1.0 - deviation / max_expected);
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

/// Buckets an accuracy percentage. Both boundaries are exclusive.
#[must_use]
pub fn tier_for(percent: f32, boundaries: &TierBoundaries) -> Tier {
    if percent > boundaries.good {
        Tier::Good
    } else if percent > boundaries.warning {
        Tier::Warning
    } else {
        Tier::Poor
    }
}
