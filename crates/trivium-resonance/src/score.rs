//! Single-profile scoring.
//!
//! `ring_strength = clamp01(w_e·norm(entropy) + w_d·(1 − norm(Δangle)) +
//! w_h·hash_coherence)`. Hash coherence is the bitwise agreement ratio
//! between the declared identity hash and the locally recomputed
//! expectation — a concrete choice, since scoring determinism is a tested
//! property.

use trivium_types::units::clamp01;
use trivium_types::{CrystalKind, ResonanceProfile};

/// Delta-angle full scale for normalization: half a turn.
const DELTA_FULL_SCALE_DEG: f64 = 180.0;

/// Raw numeric inputs to scoring. No identity types here: the engine is
/// independent of the identity generator and the codec.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreInput {
    /// Entropy sample in [0,1].
    pub entropy: f64,
    /// Drift in degrees; magnitude is what matters.
    pub delta_angle_deg: f64,
    /// Identity hash declared by the frame.
    pub declared_hash: u64,
    /// Locally recomputed expectation for the same hash.
    pub expected_hash: u64,
    /// Significant width of the two hashes, 1–64 bits. Header-only frames
    /// carry a 32-bit truncation; identity payloads carry all 64.
    pub hash_bits: u32,
}

impl ScoreInput {
    pub fn new(entropy: f64, delta_angle_deg: f64, declared: u64, expected: u64) -> Self {
        Self {
            entropy,
            delta_angle_deg,
            declared_hash: declared,
            expected_hash: expected,
            hash_bits: 64,
        }
    }

    pub fn with_hash_bits(mut self, bits: u32) -> Self {
        self.hash_bits = bits.clamp(1, 64);
        self
    }
}

/// One profile's view of one event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProfileVerdict {
    pub strength: f64,
    /// `strength >= fire_threshold` for this profile.
    pub fires: bool,
}

/// Bitwise agreement ratio over the full 64-bit width.
pub fn hash_coherence(declared: u64, expected: u64) -> f64 {
    hash_coherence_bits(declared, expected, 64)
}

/// Bitwise agreement ratio over the low `bits` bits.
pub fn hash_coherence_bits(declared: u64, expected: u64, bits: u32) -> f64 {
    let bits = bits.clamp(1, 64);
    let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
    let disagree = ((declared ^ expected) & mask).count_ones();
    1.0 - disagree as f64 / bits as f64
}

fn norm_delta(delta_angle_deg: f64) -> f64 {
    clamp01(delta_angle_deg.abs() / DELTA_FULL_SCALE_DEG)
}

/// Score one event against one profile. Pure; branches on the crystal tag
/// rather than dispatching virtually.
pub fn score_profile(profile: &ResonanceProfile, input: &ScoreInput) -> ProfileVerdict {
    let (w_e, w_d, w_h) = profile.weights;
    let entropy = clamp01(input.entropy);
    let drift = norm_delta(input.delta_angle_deg);
    let coherence = hash_coherence_bits(input.declared_hash, input.expected_hash, input.hash_bits);

    let strength = match profile.kind {
        // TarPit inverts anomaly polarity: high entropy, high drift, and
        // hash disagreement all score HIGH, to attract what everything
        // else repels.
        CrystalKind::TarPit => clamp01(w_e * entropy + w_d * drift + w_h * (1.0 - coherence)),
        _ => clamp01(w_e * entropy + w_d * (1.0 - drift) + w_h * coherence),
    };

    ProfileVerdict {
        strength,
        fires: strength >= profile.fire_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use trivium_types::CrystalKind;

    #[test]
    fn coherence_counts_agreeing_bits() {
        assert_eq!(hash_coherence(0, 0), 1.0);
        assert_eq!(hash_coherence(u64::MAX, 0), 0.0);
        assert_eq!(hash_coherence(0b1111, 0b1100), 1.0 - 2.0 / 64.0);
        assert_eq!(hash_coherence_bits(0b1111, 0b1100, 4), 0.5);
    }

    #[test]
    fn tarpit_scores_high_on_anomaly() {
        let orbital = ResonanceProfile::preset(CrystalKind::Orbital);
        let tarpit = ResonanceProfile::preset(CrystalKind::TarPit);
        // Garbage: max entropy, wild drift, no coherence.
        let garbage = ScoreInput::new(1.0, 180.0, u64::MAX, 0);

        let clean = score_profile(&orbital, &garbage);
        let trap = score_profile(&tarpit, &garbage);
        assert!(trap.strength > 0.9);
        assert!(clean.strength < trap.strength);
    }

    #[test]
    fn perfect_input_scores_high_on_upright_profiles() {
        let profile = ResonanceProfile::preset(CrystalKind::Orbital);
        let input = ScoreInput::new(1.0, 0.0, 0xABCD, 0xABCD);
        let verdict = score_profile(&profile, &input);
        assert!((verdict.strength - 1.0).abs() < 1e-12);
        assert!(verdict.fires);
    }

    proptest! {
        /// ring_strength stays in [0,1] for any input, any profile.
        #[test]
        fn strength_in_unit_interval(
            entropy in -10.0f64..10.0,
            delta in -720.0f64..720.0,
            declared: u64,
            expected: u64,
            tag in 0u8..=4,
        ) {
            let profile = ResonanceProfile::preset(
                CrystalKind::from_wire_tag(tag).unwrap(),
            );
            let input = ScoreInput::new(entropy, delta, declared, expected);
            let v = score_profile(&profile, &input);
            prop_assert!((0.0..=1.0).contains(&v.strength));
        }

        /// Scoring is pure: identical inputs, identical scores.
        #[test]
        fn scoring_is_pure(
            entropy in 0.0f64..=1.0,
            delta in 0.0f64..=360.0,
            declared: u64,
            expected: u64,
        ) {
            let profile = ResonanceProfile::preset(CrystalKind::GroundStation);
            let input = ScoreInput::new(entropy, delta, declared, expected);
            let a = score_profile(&profile, &input);
            let b = score_profile(&profile, &input);
            prop_assert_eq!(a, b);
        }
    }
}
