//! Polycrystal voting.
//!
//! Each configured (profile, blend-weight) pair scores the event on its
//! own; the policy decides the pass/fail verdict and the blend weights
//! produce one combined ring strength. The primary (first-configured)
//! profile's bands classify the blended score.

use tracing::trace;

use trivium_types::{DeltaClass, ResonanceProfile, VotingPolicy};

use crate::error::ResonanceError;
use crate::score::{score_profile, ProfileVerdict, ScoreInput};

/// Blended outcome of one scored event.
#[derive(Clone, Debug, PartialEq)]
pub struct Resonance {
    /// Blend-weighted ring strength in [0,1].
    pub ring_strength: f64,
    /// Delta class under the primary profile's thresholds.
    pub delta_class: DeltaClass,
    /// The voting policy's verdict.
    pub pass: bool,
    /// Per-profile verdicts, in configuration order.
    pub verdicts: Vec<ProfileVerdict>,
}

/// A configured profile set plus its voting policy.
#[derive(Clone, Debug)]
pub struct Polycrystal {
    profiles: Vec<ResonanceProfile>,
    policy: VotingPolicy,
}

impl Polycrystal {
    /// Build from validated profiles. Fails fast on an empty set or an
    /// unsatisfiable policy; never re-validates on the hot path.
    pub fn new(
        profiles: Vec<ResonanceProfile>,
        policy: VotingPolicy,
    ) -> Result<Self, ResonanceError> {
        if profiles.is_empty() {
            return Err(ResonanceError::EmptyPolycrystal);
        }
        if profiles.iter().map(|p| p.blend_weight).sum::<f64>() <= 0.0 {
            return Err(ResonanceError::NonPositiveBlendWeight);
        }
        if let VotingPolicy::Quorum(n) = policy {
            if n == 0 || n > profiles.len() {
                return Err(ResonanceError::UnsatisfiableQuorum {
                    quorum: n,
                    profiles: profiles.len(),
                });
            }
        }
        Ok(Self { profiles, policy })
    }

    pub fn profiles(&self) -> &[ResonanceProfile] {
        &self.profiles
    }

    pub fn policy(&self) -> VotingPolicy {
        self.policy
    }

    /// The primary profile: first configured, owns delta classification.
    pub fn primary(&self) -> &ResonanceProfile {
        &self.profiles[0]
    }

    /// Replace the profile at `index` (the Adaptive tuner's writeback).
    pub(crate) fn replace_profile(&mut self, index: usize, profile: ResonanceProfile) {
        if index < self.profiles.len() {
            self.profiles[index] = profile;
        }
    }

    /// Score one event through every profile and blend the verdicts.
    pub fn assess(&self, input: &ScoreInput) -> Resonance {
        let verdicts: Vec<ProfileVerdict> = self
            .profiles
            .iter()
            .map(|profile| score_profile(profile, input))
            .collect();

        let fired = verdicts.iter().filter(|v| v.fires).count();
        let weight_sum: f64 = self.profiles.iter().map(|p| p.blend_weight).sum();
        let blended: f64 = self
            .profiles
            .iter()
            .zip(&verdicts)
            .map(|(p, v)| p.blend_weight * v.strength)
            .sum::<f64>()
            / weight_sum;

        let pass = match self.policy {
            VotingPolicy::Any => fired >= 1,
            VotingPolicy::All => fired == self.profiles.len(),
            VotingPolicy::Majority => fired * 2 > self.profiles.len(),
            VotingPolicy::WeightedAverage(threshold) => blended >= threshold,
            VotingPolicy::Quorum(n) => fired >= n,
        };

        let delta_class = self.primary().classify(blended);
        trace!(
            ring_strength = blended,
            fired,
            pass,
            ?delta_class,
            "polycrystal assessment"
        );

        Resonance {
            ring_strength: blended,
            delta_class,
            pass,
            verdicts,
        }
    }
}
