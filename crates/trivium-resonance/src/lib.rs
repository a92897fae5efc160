//! Trivium resonance engine.
//!
//! Scores a decoded event against one or more configured crystals and
//! blends the verdicts under a voting policy. Scoring is a pure function of
//! (input, profile configuration): identical inputs always yield identical
//! scores. The Adaptive crystal's mutation is an explicit, separate
//! `observe` step — never a side effect of scoring.

pub mod adaptive;
pub mod error;
pub mod polycrystal;
pub mod score;

pub use adaptive::AdaptiveTuner;
pub use error::ResonanceError;
pub use polycrystal::{Polycrystal, Resonance};
pub use score::{hash_coherence, hash_coherence_bits, score_profile, ProfileVerdict, ScoreInput};
