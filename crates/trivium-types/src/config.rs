//! Startup configuration for the admission pipeline.
//!
//! Supplied once at startup; no dynamic reconfiguration. Every structure
//! here validates fail-fast at load so the hot path never re-checks.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::profile::ResonanceProfile;

/// How multiple profiles' verdicts combine into one pass/fail.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum VotingPolicy {
    /// Pass if at least one profile fires.
    Any,
    /// Pass iff every profile fires.
    All,
    /// Pass if strictly more than half fire.
    Majority,
    /// Pass iff the blend-weighted mean strength meets the threshold.
    WeightedAverage(f64),
    /// Pass iff at least `n` profiles fire.
    Quorum(usize),
}

/// Admission gate thresholds and the entropy-drought fault floor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    /// Score at or above which Off/Primed conducts.
    pub gate_threshold: f64,
    /// Score below which Conducting (or Latched, rule 2) drops to Off.
    pub holding_threshold: f64,
    /// Score at or above which any state latches.
    pub perfect_threshold: f64,
    /// Entropy floor below which a sample counts toward a drought.
    pub entropy_floor: f64,
    /// Consecutive sub-floor samples that constitute a drought fault.
    pub drought_window: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            gate_threshold: 0.50,
            holding_threshold: 0.35,
            perfect_threshold: 0.98,
            entropy_floor: 0.05,
            drought_window: 8,
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.holding_threshold <= self.gate_threshold
            && self.gate_threshold <= self.perfect_threshold;
        let in_unit = [
            self.holding_threshold,
            self.gate_threshold,
            self.perfect_threshold,
            self.entropy_floor,
        ]
        .iter()
        .all(|v| (0.0..=1.0).contains(v));

        if !ordered || !in_unit {
            return Err(ConfigError::InvalidGateThresholds {
                holding: self.holding_threshold,
                gate: self.gate_threshold,
                perfect: self.perfect_threshold,
            });
        }
        if self.drought_window == 0 {
            return Err(ConfigError::InvalidDroughtWindow);
        }
        Ok(())
    }
}

/// The full startup configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Configured crystals, first entry is the primary (its bands classify
    /// the blended score).
    pub profiles: Vec<ResonanceProfile>,
    pub policy: VotingPolicy,
    pub gate: GateConfig,
    /// Ed25519 verifying key for Reset authorization, raw 32 bytes.
    pub reset_verifying_key: [u8; 32],
}

impl PipelineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profiles.is_empty() {
            return Err(ConfigError::EmptyPolycrystal);
        }
        for profile in &self.profiles {
            profile.validate()?;
        }
        match self.policy {
            VotingPolicy::WeightedAverage(t) if !(0.0..=1.0).contains(&t) => {
                return Err(ConfigError::InvalidPolicy(format!(
                    "weighted-average threshold {t} outside [0,1]"
                )));
            }
            VotingPolicy::Quorum(n) if n == 0 || n > self.profiles.len() => {
                return Err(ConfigError::InvalidPolicy(format!(
                    "quorum {n} unsatisfiable with {} profiles",
                    self.profiles.len()
                )));
            }
            _ => {}
        }
        self.gate.validate()
    }
}
