//! Trivium: a deterministic identity-and-admission pipeline.
//!
//! The planes, in hot-path order:
//!
//! - **identity** ([`trivium_identity`]) — trivariate identity minting and
//!   ticking, the supersession ledger, and the fast-path dispatch key;
//! - **codec** ([`trivium_codec`]) — the rune symbol codec and the
//!   18-byte-header frame codec; malformed input dies here;
//! - **resonance** ([`trivium_resonance`]) — pure crystal scoring and
//!   polycrystal voting;
//! - **gate** ([`trivium_gate`]) — the four-state latching admission
//!   machine behind a per-id registry;
//! - **bridge** ([`trivium_bridge`]) — the only async component,
//!   republishing transitions to an external bus.
//!
//! [`Pipeline`] wires them into one admission point.

pub mod error;
pub mod pipeline;

pub use error::PipelineError;
pub use pipeline::{
    identity_frame, reset_frame, Admission, AdmissionReport, MutationDirective, Pipeline,
};

pub use trivium_bridge::{Bridge, BridgeError, BusPublisher, InMemoryBus, TopicMap};
pub use trivium_codec::{
    CodecError, Frame, FrameHeader, PayloadType, ResetPayload, Rune, RuneFields,
};
pub use trivium_gate::{
    reset_message, GateError, GateRegistry, ResetAuthorizer, ResetRequest, TransitionEvent,
};
pub use trivium_identity::{
    dispatch_key, DispatchKey, IdentityError, IdentityGenerator, SupersessionLedger, TickInput,
};
pub use trivium_resonance::{
    AdaptiveTuner, Polycrystal, Resonance, ResonanceError, ScoreInput,
};
pub use trivium_types::{
    ConfigError, CrystalKind, DeltaClass, GateConfig, GateId, GateState, IdentityEncoding,
    LineageAnchor, PipelineConfig, ResonanceProfile, TrivariateIdentity, VotingPolicy,
};
