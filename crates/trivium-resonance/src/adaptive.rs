//! Adaptive crystal tuning.
//!
//! The Adaptive profile mutates its weight basis from observed traffic.
//! Mutation is an explicit step the caller drives between events —
//! `Polycrystal::assess` itself stays pure, which keeps the scoring
//! determinism property intact.
//!
//! The tuner keeps exponentially weighted moving averages of the three
//! input channels and shifts weight toward the channels that discriminate
//! (those whose observed values move), renormalizing so the basis always
//! sums to one.

use tracing::debug;

use trivium_types::CrystalKind;

use crate::error::ResonanceError;
use crate::polycrystal::Polycrystal;
use crate::score::{hash_coherence_bits, ScoreInput};

/// EWMA smoothing factor for observed channel activity.
const ALPHA: f64 = 0.1;
/// Fraction of the basis the tuner may shift per observation.
const LEARNING_RATE: f64 = 0.02;
/// Basis floor so no channel is ever dropped entirely.
const WEIGHT_FLOOR: f64 = 0.05;

/// Drives one Adaptive profile inside a polycrystal.
#[derive(Clone, Debug)]
pub struct AdaptiveTuner {
    index: usize,
    entropy_ewma: f64,
    drift_ewma: f64,
    incoherence_ewma: f64,
}

impl AdaptiveTuner {
    /// Bind to the Adaptive profile at `index` in the polycrystal.
    pub fn new(poly: &Polycrystal, index: usize) -> Result<Self, ResonanceError> {
        let profile = poly
            .profiles()
            .get(index)
            .ok_or(ResonanceError::ProfileIndexOutOfRange(index))?;
        if profile.kind != CrystalKind::Adaptive {
            return Err(ResonanceError::NotAdaptive(index));
        }
        Ok(Self {
            index,
            entropy_ewma: 0.5,
            drift_ewma: 0.5,
            incoherence_ewma: 0.5,
        })
    }

    /// Fold one observed event into the averages and write the adjusted
    /// basis back into the polycrystal.
    pub fn observe(&mut self, poly: &mut Polycrystal, input: &ScoreInput) {
        let entropy = input.entropy.clamp(0.0, 1.0);
        let drift = (input.delta_angle_deg.abs() / 180.0).clamp(0.0, 1.0);
        let incoherence = 1.0
            - hash_coherence_bits(input.declared_hash, input.expected_hash, input.hash_bits);

        self.entropy_ewma += ALPHA * (entropy - self.entropy_ewma);
        self.drift_ewma += ALPHA * (drift - self.drift_ewma);
        self.incoherence_ewma += ALPHA * (incoherence - self.incoherence_ewma);

        let mut profile = poly.profiles()[self.index].clone();
        let (w_e, w_d, w_h) = profile.weights;

        // Shift weight toward the most active channel, then renormalize.
        let activity = [self.entropy_ewma, self.drift_ewma, self.incoherence_ewma];
        let total: f64 = activity.iter().sum();
        if total <= f64::EPSILON {
            return;
        }
        let target = [
            activity[0] / total,
            activity[1] / total,
            activity[2] / total,
        ];
        let mut next = [
            w_e + LEARNING_RATE * (target[0] - w_e),
            w_d + LEARNING_RATE * (target[1] - w_d),
            w_h + LEARNING_RATE * (target[2] - w_h),
        ];
        for w in &mut next {
            *w = w.max(WEIGHT_FLOOR);
        }
        let norm: f64 = next.iter().sum();
        profile.weights = (next[0] / norm, next[1] / norm, next[2] / norm);

        debug!(
            w_entropy = profile.weights.0,
            w_delta = profile.weights.1,
            w_hash = profile.weights.2,
            "adaptive basis adjusted"
        );
        poly.replace_profile(self.index, profile);
    }
}
