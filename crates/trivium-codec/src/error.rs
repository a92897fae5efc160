use thiserror::Error;

/// Codec-boundary rejections. Anything that decodes cleanly past this layer
/// is a normal input for scoring, however badly it scores.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed frame: expected {expected} payload bytes, got {got}")]
    MalformedFrame { expected: usize, got: usize },

    #[error("frame truncated: need at least {need} bytes, got {got}")]
    Truncated { need: usize, got: usize },

    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u16),

    #[error("unknown gate-state wire code {0}")]
    UnknownGateState(u16),

    #[error("symbol {0:#x} outside every reserved rune range")]
    UnknownRune(u32),

    #[error("rune {got:#x} at position {at}: expected a {expected} symbol")]
    UnexpectedRune {
        at: usize,
        expected: &'static str,
        got: u32,
    },

    #[error("rune stream ended before the end-of-transmission marker")]
    MissingTerminator,

    #[error("shorthand code {0:#x} not in the substitution table")]
    UnknownShorthand(u8),

    #[error("field value {value} does not fit the {field} range")]
    FieldOutOfRange { field: &'static str, value: u32 },
}
