//! Authorized Reset.
//!
//! Reset is the only unconditional path to Off — and, with rule 2, the
//! only way out of Latched. It carries an Ed25519 signature over the gate
//! id and a caller-chosen nonce; a bad signature rejects the request and
//! leaves gate state untouched.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use tracing::warn;

use trivium_types::GateId;

use crate::error::GateError;

/// Domain separator for reset signatures.
const RESET_CONTEXT: &[u8] = b"trivium.gate.reset.v1";

/// The signed message bytes: context ‖ gate id ‖ nonce.
pub fn reset_message(gate_id: &GateId, nonce: &[u8; 8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(RESET_CONTEXT.len() + gate_id.0.len() + 8);
    message.extend_from_slice(RESET_CONTEXT);
    message.extend_from_slice(gate_id.0.as_bytes());
    message.extend_from_slice(nonce);
    message
}

/// A reset request as decoded off the wire.
#[derive(Clone, Debug)]
pub struct ResetRequest {
    pub gate_id: GateId,
    pub nonce: [u8; 8],
    pub signature: Signature,
}

/// Verifies reset signatures against the key supplied at startup.
#[derive(Clone, Debug)]
pub struct ResetAuthorizer {
    verifying_key: VerifyingKey,
}

impl ResetAuthorizer {
    pub fn new(verifying_key: VerifyingKey) -> Self {
        Self { verifying_key }
    }

    /// Build from the raw 32-byte key in the startup configuration.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, GateError> {
        let verifying_key =
            VerifyingKey::from_bytes(bytes).map_err(|_| GateError::InvalidVerifyingKey)?;
        Ok(Self { verifying_key })
    }

    pub fn verify(&self, request: &ResetRequest) -> Result<(), GateError> {
        let message = reset_message(&request.gate_id, &request.nonce);
        self.verifying_key
            .verify(&message, &request.signature)
            .map_err(|_| {
                warn!(gate_id = %request.gate_id, "reset authorization failed");
                GateError::AuthorizationFailure
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    #[test]
    fn valid_signature_verifies() {
        let signing = SigningKey::from_bytes(&[42u8; 32]);
        let authorizer = ResetAuthorizer::new(signing.verifying_key());
        let gate_id = GateId::new("uplink-7");
        let nonce = [1u8; 8];

        let request = ResetRequest {
            gate_id: gate_id.clone(),
            nonce,
            signature: signing.sign(&reset_message(&gate_id, &nonce)),
        };
        authorizer.verify(&request).unwrap();
    }

    #[test]
    fn signature_binds_the_gate_id() {
        let signing = SigningKey::from_bytes(&[42u8; 32]);
        let authorizer = ResetAuthorizer::new(signing.verifying_key());
        let nonce = [1u8; 8];

        // Signed for one gate, replayed against another.
        let signature = signing.sign(&reset_message(&GateId::new("a"), &nonce));
        let request = ResetRequest {
            gate_id: GateId::new("b"),
            nonce,
            signature,
        };
        assert!(matches!(
            authorizer.verify(&request),
            Err(GateError::AuthorizationFailure)
        ));
    }

    #[test]
    fn undecodable_key_bytes_rejected() {
        // About half of all 32-byte strings fail point decompression; scan
        // for one rather than hard-coding a curve fact.
        let bytes = (0u8..=255)
            .map(|y| {
                let mut candidate = [0u8; 32];
                candidate[0] = y;
                candidate
            })
            .find(|candidate| VerifyingKey::from_bytes(candidate).is_err())
            .unwrap();
        assert!(matches!(
            ResetAuthorizer::from_bytes(&bytes),
            Err(GateError::InvalidVerifyingKey)
        ));
    }
}
