//! Resonance profiles ("crystals") and delta classification.
//!
//! The profile family is a closed tagged set carrying its numbers as data:
//! one shared scoring function in `trivium-resonance` branches on the tag,
//! keeping the hot path free of virtual dispatch and every profile auditable
//! in one place.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tolerance for the weight basis check at configuration load.
const BASIS_EPSILON: f64 = 1e-9;

/// The closed crystal family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrystalKind {
    /// Balanced general-purpose profile.
    Orbital,
    /// Entropy-forward profile for noisy uplinks.
    GroundStation,
    /// Inverted polarity: scores HIGH on anomaly, for deception placements.
    TarPit,
    /// Near-zero tolerance; fires only on near-perfect coherence.
    Silent,
    /// Mutates its weight basis from observed traffic.
    Adaptive,
}

impl CrystalKind {
    /// Wire tag used by the rune codec's crystal-family sub-range.
    pub fn wire_tag(self) -> u8 {
        match self {
            CrystalKind::Orbital => 0,
            CrystalKind::GroundStation => 1,
            CrystalKind::TarPit => 2,
            CrystalKind::Silent => 3,
            CrystalKind::Adaptive => 4,
        }
    }

    pub fn from_wire_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => CrystalKind::Orbital,
            1 => CrystalKind::GroundStation,
            2 => CrystalKind::TarPit,
            3 => CrystalKind::Silent,
            4 => CrystalKind::Adaptive,
            _ => return None,
        })
    }
}

/// Delta class: what the score demands of the identity downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeltaClass {
    /// Reuse the identity unchanged.
    None,
    /// Perturb only the delta-angle/entropy sub-fields.
    Micro,
    /// Regenerate semantic + cognitive fields.
    Soft,
    /// Regenerate the full triple (new anchor, parented to the old one).
    Hard,
    /// Reject, and permanently supersede the lineage.
    Critical,
}

/// One configured resonance profile.
///
/// `weights` = (entropy, delta-angle, hash-coherence), summing to 1.
/// `thresholds` are five ascending values with `thresholds[4] == 1.0`; the
/// first four are the delta-class band boundaries, the band above
/// `thresholds[3]` is Critical. `fire_threshold` is this profile's own gate
/// threshold for its boolean "fires" flag in polycrystal voting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResonanceProfile {
    pub kind: CrystalKind,
    pub weights: (f64, f64, f64),
    pub blend_weight: f64,
    pub fire_threshold: f64,
    pub thresholds: [f64; 5],
}

impl ResonanceProfile {
    /// The stock tuning for each crystal kind.
    pub fn preset(kind: CrystalKind) -> Self {
        match kind {
            CrystalKind::Orbital => Self {
                kind,
                weights: (0.40, 0.35, 0.25),
                blend_weight: 1.0,
                fire_threshold: 0.50,
                thresholds: [0.20, 0.45, 0.70, 0.90, 1.0],
            },
            CrystalKind::GroundStation => Self {
                kind,
                weights: (0.60, 0.25, 0.15),
                blend_weight: 1.0,
                fire_threshold: 0.55,
                thresholds: [0.25, 0.50, 0.72, 0.92, 1.0],
            },
            CrystalKind::TarPit => Self {
                kind,
                weights: (0.50, 0.30, 0.20),
                blend_weight: 0.5,
                fire_threshold: 0.40,
                thresholds: [0.15, 0.35, 0.60, 0.85, 1.0],
            },
            CrystalKind::Silent => Self {
                kind,
                weights: (0.20, 0.30, 0.50),
                blend_weight: 1.0,
                fire_threshold: 0.97,
                thresholds: [0.05, 0.10, 0.20, 0.40, 1.0],
            },
            CrystalKind::Adaptive => Self {
                kind,
                weights: (1.0 / 3.0, 1.0 / 3.0, 1.0 - 2.0 / 3.0),
                blend_weight: 0.8,
                fire_threshold: 0.50,
                thresholds: [0.20, 0.45, 0.70, 0.90, 1.0],
            },
        }
    }

    /// Fail-fast validation at configuration load. Never called on the hot
    /// path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (we, wd, wh) = self.weights;
        if we < 0.0 || wd < 0.0 || wh < 0.0 {
            return Err(ConfigError::InvalidBasis {
                kind: self.kind,
                detail: "negative weight".into(),
            });
        }
        if (we + wd + wh - 1.0).abs() > BASIS_EPSILON {
            return Err(ConfigError::InvalidBasis {
                kind: self.kind,
                detail: format!("weights sum to {}, expected 1", we + wd + wh),
            });
        }
        if !(0.0..=1.0).contains(&self.fire_threshold) {
            return Err(ConfigError::InvalidThresholds {
                kind: self.kind,
                detail: format!("fire threshold {} outside [0,1]", self.fire_threshold),
            });
        }
        if self.blend_weight <= 0.0 {
            return Err(ConfigError::InvalidThresholds {
                kind: self.kind,
                detail: "blend weight must be positive".into(),
            });
        }
        let t = &self.thresholds;
        if t.windows(2).any(|w| w[0] >= w[1]) || t[0] <= 0.0 {
            return Err(ConfigError::InvalidThresholds {
                kind: self.kind,
                detail: "thresholds must be strictly ascending in (0,1]".into(),
            });
        }
        if t[4] != 1.0 {
            return Err(ConfigError::InvalidThresholds {
                kind: self.kind,
                detail: "top threshold must close the unit interval at 1.0".into(),
            });
        }
        Ok(())
    }

    /// Locate a score within this profile's bands.
    ///
    /// Bands partition `[0,1]` exhaustively and without overlap:
    /// `[0,t0) None, [t0,t1) Micro, [t1,t2) Soft, [t2,t3) Hard, [t3,1] Critical`.
    pub fn classify(&self, score: f64) -> DeltaClass {
        let t = &self.thresholds;
        if score < t[0] {
            DeltaClass::None
        } else if score < t[1] {
            DeltaClass::Micro
        } else if score < t[2] {
            DeltaClass::Soft
        } else if score < t[3] {
            DeltaClass::Hard
        } else {
            DeltaClass::Critical
        }
    }
}
