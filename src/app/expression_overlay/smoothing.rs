// SPDX-License-Identifier: GPL-3.0-only

//! Expression smoothing
//!
//! Raw classifier output flickers from frame to frame and is dominated by
//! "neutral". For display, neutral is damped, every other expression is
//! boosted, and the result is averaged over time per track slot. The output
//! is a display weighting, not a calibrated probability.

use crate::app::frame_processor::ExpressionDistribution;
use crate::config::SmoothingConfig;
use crate::constants::expressions::NEUTRAL;
use crate::constants::smoothing::{EXPRESSION_BOOST, NEUTRAL_DAMPING};

/// Reweight with the default boost and damping
pub fn reweight(raw: &ExpressionDistribution) -> ExpressionDistribution {
    reweight_with(raw, EXPRESSION_BOOST, NEUTRAL_DAMPING)
}

/// Damp neutral, boost the rest, clamp at 0 and renormalize
///
/// A non-positive weighted sum returns `raw` untouched.
pub fn reweight_with(
    raw: &ExpressionDistribution,
    boost: f64,
    neutral_damping: f64,
) -> ExpressionDistribution {
    let weighted: Vec<(&str, f64)> = raw
        .iter()
        .map(|(label, value)| {
            let factor = if label == NEUTRAL {
                neutral_damping
            } else {
                boost
            };
            (label, (value * factor).max(0.0))
        })
        .collect();

    let sum: f64 = weighted.iter().map(|(_, v)| v).sum();
    if sum <= 0.0 {
        return raw.clone();
    }

    weighted
        .into_iter()
        .map(|(label, value)| (label, value / sum))
        .collect()
}

/// Exponential moving average per label
///
/// Labels missing on either side count as 0. Without a previous
/// distribution the new one is returned as is.
pub fn blend(
    previous: Option<&ExpressionDistribution>,
    next: &ExpressionDistribution,
    alpha: f64,
) -> ExpressionDistribution {
    let Some(previous) = previous else {
        return next.clone();
    };

    previous
        .labels()
        .chain(next.labels())
        .map(|label| {
            let value = previous.get(label) * (1.0 - alpha) + next.get(label) * alpha;
            (label, value)
        })
        .collect()
}

/// Reweight + blend with configured parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionSmoother {
    config: SmoothingConfig,
}

impl ExpressionSmoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self { config }
    }

    /// Display distribution for a slot given its previous one
    pub fn smooth(
        &self,
        previous: Option<&ExpressionDistribution>,
        raw: &ExpressionDistribution,
    ) -> ExpressionDistribution {
        let display = reweight_with(raw, self.config.boost, self.config.neutral_damping);
        blend(previous, &display, self.config.alpha)
    }
}
