//! Trivium admission gate.
//!
//! A four-state latching machine (Off, Primed, Conducting, Latched) driven
//! by ring strength, owned per gate id inside an explicit registry. The
//! transition function is pure; the registry adds per-id single-writer
//! discipline, drought fault tracking, the transition log, and the
//! authorized Reset path — the only way out of Latched besides rule 2.

pub mod error;
pub mod registry;
pub mod reset;
pub mod transition;

pub use error::GateError;
pub use registry::{AdmissionDecision, GateRecord, GateRegistry, TransitionCause, TransitionEvent};
pub use reset::{reset_message, ResetAuthorizer, ResetRequest};
pub use transition::{step, LatchMeta};
