//! Configuration-load errors. These fail fast at startup; none of them can
//! occur on the hot path.

use thiserror::Error;

use crate::profile::CrystalKind;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("profile {kind:?}: invalid weight basis: {detail}")]
    InvalidBasis { kind: CrystalKind, detail: String },

    #[error("profile {kind:?}: invalid thresholds: {detail}")]
    InvalidThresholds { kind: CrystalKind, detail: String },

    #[error("gate thresholds out of order: holding={holding} gate={gate} perfect={perfect}")]
    InvalidGateThresholds {
        holding: f64,
        gate: f64,
        perfect: f64,
    },

    #[error("drought window must be at least one sample")]
    InvalidDroughtWindow,

    #[error("polycrystal must contain at least one profile")]
    EmptyPolycrystal,

    #[error("invalid voting policy: {0}")]
    InvalidPolicy(String),

    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
