use thiserror::Error;

/// Errors from the admission gate.
#[derive(Error, Debug)]
pub enum GateError {
    /// Reset signature did not verify; gate state is unchanged.
    #[error("reset authorization failed")]
    AuthorizationFailure,

    #[error("configured reset verifying key is not a valid Ed25519 key")]
    InvalidVerifyingKey,
}
