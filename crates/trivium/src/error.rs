//! Facade-level error type: one enum wrapping each plane's errors.

use thiserror::Error;

use trivium_codec::CodecError;
use trivium_gate::GateError;
use trivium_identity::IdentityError;
use trivium_resonance::ResonanceError;
use trivium_types::ConfigError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("codec: {0}")]
    Codec(#[from] CodecError),

    #[error("resonance: {0}")]
    Resonance(#[from] ResonanceError),

    #[error("gate: {0}")]
    Gate(#[from] GateError),

    #[error("identity: {0}")]
    Identity(#[from] IdentityError),
}
