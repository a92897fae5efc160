//! Fast-path dispatch key derivation.
//!
//! The key is a lookup hint for an external O(1) dispatch table, not a
//! credential: it is intentionally lossy, and the table must fall back to
//! exact matching on collision.

use trivium_types::TrivariateIdentity;

/// Fixed-width key consumed by the external dispatch table.
pub type DispatchKey = [u8; 8];

/// `big_endian_bytes(semantic_hash XOR cognitive_hash64)`. Pure and
/// deterministic.
pub fn dispatch_key(identity: &TrivariateIdentity) -> DispatchKey {
    (identity.semantic_hash ^ identity.cognitive_hash64).to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use trivium_types::LineageAnchor;

    fn identity(semantic: u64, cognitive: u64) -> TrivariateIdentity {
        TrivariateIdentity {
            semantic_hash: semantic,
            cognitive_hash64: cognitive,
            lineage_anchor: LineageAnchor::unpack(0),
        }
    }

    #[test]
    fn known_vector() {
        let id = identity(0xFF00_FF00_FF00_FF00, 0x0F0F_0F0F_0F0F_0F0F);
        assert_eq!(
            dispatch_key(&id),
            [0xF0, 0x0F, 0xF0, 0x0F, 0xF0, 0x0F, 0xF0, 0x0F]
        );
    }

    proptest! {
        /// Identical hash pairs always yield identical keys, regardless of
        /// the anchor.
        #[test]
        fn derivation_is_pure(semantic: u64, cognitive: u64, anchor: u128) {
            let a = identity(semantic, cognitive);
            let mut b = identity(semantic, cognitive);
            b.lineage_anchor = LineageAnchor::unpack(anchor);
            prop_assert_eq!(dispatch_key(&a), dispatch_key(&b));
            prop_assert_eq!(
                dispatch_key(&a),
                (semantic ^ cognitive).to_be_bytes()
            );
        }
    }
}
