use thiserror::Error;

/// Resonance engine construction errors. All of them surface at
/// configuration load; the scoring path is infallible.
#[derive(Error, Debug)]
pub enum ResonanceError {
    #[error("polycrystal must contain at least one profile")]
    EmptyPolycrystal,

    #[error("quorum {quorum} unsatisfiable with {profiles} profiles")]
    UnsatisfiableQuorum { quorum: usize, profiles: usize },

    #[error("blend weights must sum to a positive value")]
    NonPositiveBlendWeight,

    #[error("profile index {0} out of range")]
    ProfileIndexOutOfRange(usize),

    #[error("profile at index {0} is not Adaptive")]
    NotAdaptive(usize),
}
