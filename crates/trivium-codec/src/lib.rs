//! Trivium wire plane.
//!
//! Two codecs share this crate:
//!
//! - the **rune codec** ([`rune`]): bijective mapping between packed
//!   identity/annotation fields and fixed-width symbols in a reserved
//!   private-use block, with an optional shorthand table the decoder
//!   accepts transparently;
//! - the **frame codec** ([`frame`]): the 18-byte header plus variable
//!   payload carried under the reserved L2 frame type.
//!
//! Both reject malformed input at this boundary; nothing malformed reaches
//! scoring.

pub mod error;
pub mod frame;
pub mod rune;

pub use error::CodecError;
pub use frame::{
    Frame, FrameHeader, PayloadType, ResetPayload, FRAME_ETHERTYPE, HEADER_LEN, PROTOCOL_VERSION,
};
pub use rune::{Annotation, Rune, RuneClass, RuneFields};
