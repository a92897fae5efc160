//! Trivium identity plane.
//!
//! - [`IdentityGenerator`] mints trivariate identities at birth and
//!   recomputes the two hash fields on every tick, leaving the lineage
//!   anchor untouched.
//! - [`dispatch_key`] derives the 8-byte fast-path lookup hint.
//! - [`SupersessionLedger`] records lineages permanently retired by a
//!   Critical-class scoring event.

pub mod error;
pub mod generator;
pub mod keys;
pub mod supersession;

pub use error::IdentityError;
pub use generator::{IdentityGenerator, TickInput};
pub use keys::{dispatch_key, DispatchKey};
pub use supersession::SupersessionLedger;
