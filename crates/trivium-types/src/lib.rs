//! Trivium core types.
//!
//! Shared data model for the identity-and-admission pipeline:
//!
//! - **Trivariate identity** — the (semantic-hash, cognitive-hash extract,
//!   lineage-anchor) triple identifying a logical entity. The first two are
//!   recomputed on every tick; the anchor is minted once and never changes.
//! - **Resonance profiles** ("crystals") — a closed family of scoring
//!   configurations, each with a weight basis and five delta-class thresholds.
//! - **Gate state** — the four-state latching admission machine's state,
//!   owned per gate id.
//!
//! All configuration structures validate at load time (`ConfigError`), never
//! on the hot path.

pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod profile;
pub mod units;

pub use config::{GateConfig, PipelineConfig, VotingPolicy};
pub use error::ConfigError;
pub use gate::{GateId, GateState};
pub use identity::{
    CognitiveRecord, IdentityEncoding, LineageAnchor, SemanticFields, TrivariateIdentity,
    COGNITIVE_SLOTS,
};
pub use profile::{CrystalKind, DeltaClass, ResonanceProfile};
