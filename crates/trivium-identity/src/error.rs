use thiserror::Error;

/// Errors from the identity generator.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("structural descriptor must contain at least one token")]
    EmptyDescriptor,

    #[error("entropy sample {0} outside [0,1]")]
    EntropyOutOfRange(f64),
}
