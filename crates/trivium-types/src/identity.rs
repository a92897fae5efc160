//! The trivariate identity triple and its packed layouts.
//!
//! Layouts are normative: the codec, the key deriver, and the resonance
//! engine all read these bit positions. `semantic_hash` and
//! `cognitive_hash64` are non-cryptographic and may collide — equality is
//! evidence of identity, never proof. `lineage_anchor` is the permanent
//! identifier: minted once at birth, untouched by every later tick.

use serde::{Deserialize, Serialize};

/// Number of byte-slots in the full cognitive record.
pub const COGNITIVE_SLOTS: usize = 16;

/// The four 16-bit sub-fields packed into `semantic_hash`.
///
/// Bit layout, most significant first:
/// `[domain:16][phase:16][structure:16][delta_angle:16]`.
/// The delta-angle sub-field carries centidegrees (0.01° resolution).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticFields {
    pub domain: u16,
    pub phase: u16,
    pub structure: u16,
    pub delta_angle: u16,
}

impl SemanticFields {
    /// Pack the four sub-fields into the 64-bit semantic hash.
    pub fn pack(&self) -> u64 {
        (self.domain as u64) << 48
            | (self.phase as u64) << 32
            | (self.structure as u64) << 16
            | self.delta_angle as u64
    }

    /// Unpack a 64-bit semantic hash into its sub-fields.
    pub fn unpack(hash: u64) -> Self {
        Self {
            domain: (hash >> 48) as u16,
            phase: (hash >> 32) as u16,
            structure: (hash >> 16) as u16,
            delta_angle: hash as u16,
        }
    }
}

/// The full 128-bit cognitive record: sixteen byte-slots.
///
/// Slot map (big-endian within multi-byte fields):
/// 0–1 agent id, 2–3 task id, 4–5 sequence, 6–9 timestamp,
/// 10–11 delta-angle (centidegrees, load-bearing), 12–13 entropy (q16),
/// 14–15 checksum (XOR-fold of slots 0–13 as u16 words).
///
/// Only the 64-bit extract travels the hot path; the full record is an
/// upstream concern carried here for the codec and for checksum sealing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CognitiveRecord(pub [u8; COGNITIVE_SLOTS]);

impl CognitiveRecord {
    /// Assemble a record from its fields and seal the checksum.
    pub fn new(
        agent: u16,
        task: u16,
        sequence: u16,
        timestamp: u32,
        delta_angle: u16,
        entropy: u16,
    ) -> Self {
        let mut slots = [0u8; COGNITIVE_SLOTS];
        slots[0..2].copy_from_slice(&agent.to_be_bytes());
        slots[2..4].copy_from_slice(&task.to_be_bytes());
        slots[4..6].copy_from_slice(&sequence.to_be_bytes());
        slots[6..10].copy_from_slice(&timestamp.to_be_bytes());
        slots[10..12].copy_from_slice(&delta_angle.to_be_bytes());
        slots[12..14].copy_from_slice(&entropy.to_be_bytes());
        let mut record = Self(slots);
        let sum = record.compute_checksum();
        record.0[14..16].copy_from_slice(&sum.to_be_bytes());
        record
    }

    fn field_u16(&self, at: usize) -> u16 {
        u16::from_be_bytes([self.0[at], self.0[at + 1]])
    }

    pub fn agent(&self) -> u16 {
        self.field_u16(0)
    }

    pub fn task(&self) -> u16 {
        self.field_u16(2)
    }

    pub fn sequence(&self) -> u16 {
        self.field_u16(4)
    }

    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[6], self.0[7], self.0[8], self.0[9]])
    }

    pub fn delta_angle(&self) -> u16 {
        self.field_u16(10)
    }

    pub fn entropy(&self) -> u16 {
        self.field_u16(12)
    }

    pub fn checksum(&self) -> u16 {
        self.field_u16(14)
    }

    /// XOR-fold of slots 0–13 as seven big-endian u16 words.
    pub fn compute_checksum(&self) -> u16 {
        (0..14)
            .step_by(2)
            .map(|i| self.field_u16(i))
            .fold(0u16, |acc, w| acc ^ w)
    }

    /// True when the sealed checksum matches the slot contents.
    pub fn checksum_ok(&self) -> bool {
        self.checksum() == self.compute_checksum()
    }

    /// The 64-bit hot-path extract:
    /// `[agent:16][sequence:16][delta_angle:16][entropy:16]`.
    pub fn extract64(&self) -> u64 {
        (self.agent() as u64) << 48
            | (self.sequence() as u64) << 32
            | (self.delta_angle() as u64) << 16
            | self.entropy() as u64
    }
}

/// The 128-bit immutable birth record.
///
/// Packed layout, most significant first:
/// `[origin_domain:8][origin_agent:16][birth_ts:32][parent_fold:32]
///  [generation:8][salt:32]`.
///
/// `parent_fold` is the XOR-fold of the parent anchor's packed value down
/// to 32 bits; zero for root entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineageAnchor {
    pub origin_domain: u8,
    pub origin_agent: u16,
    pub birth_ts: u32,
    pub parent_fold: u32,
    pub generation: u8,
    pub salt: u32,
}

impl LineageAnchor {
    /// Pack into the canonical 128-bit value.
    pub fn pack(&self) -> u128 {
        (self.origin_domain as u128) << 120
            | (self.origin_agent as u128) << 104
            | (self.birth_ts as u128) << 72
            | (self.parent_fold as u128) << 40
            | (self.generation as u128) << 32
            | self.salt as u128
    }

    /// Unpack from the canonical 128-bit value.
    pub fn unpack(packed: u128) -> Self {
        Self {
            origin_domain: (packed >> 120) as u8,
            origin_agent: (packed >> 104) as u16,
            birth_ts: (packed >> 72) as u32,
            parent_fold: (packed >> 40) as u32,
            generation: (packed >> 32) as u8,
            salt: packed as u32,
        }
    }

    /// XOR-fold this anchor down to 32 bits, for child `parent_fold` fields.
    pub fn fold32(&self) -> u32 {
        let p = self.pack();
        let folded64 = (p >> 64) as u64 ^ p as u64;
        (folded64 >> 32) as u32 ^ folded64 as u32
    }
}

/// Canonical wire encodings of the triple, densest last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityEncoding {
    /// All three fields: 32 bytes.
    Full,
    /// Semantic + cognitive: 16 bytes.
    Compact,
    /// Cognitive extract alone: 8 bytes, for fixed-width dispatch keys.
    Micro,
}

/// The (semantic, cognitive, lineage) triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrivariateIdentity {
    pub semantic_hash: u64,
    pub cognitive_hash64: u64,
    pub lineage_anchor: LineageAnchor,
}

impl TrivariateIdentity {
    /// Serialize under the given encoding, big-endian throughout.
    pub fn encode(&self, encoding: IdentityEncoding) -> Vec<u8> {
        match encoding {
            IdentityEncoding::Full => {
                let mut out = Vec::with_capacity(32);
                out.extend_from_slice(&self.semantic_hash.to_be_bytes());
                out.extend_from_slice(&self.cognitive_hash64.to_be_bytes());
                out.extend_from_slice(&self.lineage_anchor.pack().to_be_bytes());
                out
            }
            IdentityEncoding::Compact => {
                let mut out = Vec::with_capacity(16);
                out.extend_from_slice(&self.semantic_hash.to_be_bytes());
                out.extend_from_slice(&self.cognitive_hash64.to_be_bytes());
                out
            }
            IdentityEncoding::Micro => self.cognitive_hash64.to_be_bytes().to_vec(),
        }
    }

    /// Parse a Full (32-byte) encoding back into the triple.
    pub fn decode_full(bytes: &[u8; 32]) -> Self {
        let mut semantic = [0u8; 8];
        semantic.copy_from_slice(&bytes[0..8]);
        let mut cognitive = [0u8; 8];
        cognitive.copy_from_slice(&bytes[8..16]);
        let mut anchor = [0u8; 16];
        anchor.copy_from_slice(&bytes[16..32]);
        Self {
            semantic_hash: u64::from_be_bytes(semantic),
            cognitive_hash64: u64::from_be_bytes(cognitive),
            lineage_anchor: LineageAnchor::unpack(u128::from_be_bytes(anchor)),
        }
    }

    /// Parse a Compact (16-byte) encoding. The anchor does not travel in
    /// this form; the caller supplies whatever lineage context it holds.
    pub fn decode_compact(bytes: &[u8; 16]) -> (u64, u64) {
        let mut semantic = [0u8; 8];
        semantic.copy_from_slice(&bytes[0..8]);
        let mut cognitive = [0u8; 8];
        cognitive.copy_from_slice(&bytes[8..16]);
        (
            u64::from_be_bytes(semantic),
            u64::from_be_bytes(cognitive),
        )
    }

    /// The semantic sub-fields, unpacked.
    pub fn semantic_fields(&self) -> SemanticFields {
        SemanticFields::unpack(self.semantic_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_pack_unpack_round_trip() {
        let fields = SemanticFields {
            domain: 0xA1B2,
            phase: 0x0003,
            structure: 0xFFFF,
            delta_angle: 1250, // 12.50°
        };
        assert_eq!(SemanticFields::unpack(fields.pack()), fields);
    }

    #[test]
    fn cognitive_record_checksum_seals_and_verifies() {
        let rec = CognitiveRecord::new(7, 2, 1001, 1_700_000_000, 314, 52000);
        assert!(rec.checksum_ok());

        let mut tampered = rec;
        tampered.0[10] ^= 0x01; // flip a delta-angle bit
        assert!(!tampered.checksum_ok());
    }

    #[test]
    fn cognitive_extract_carries_load_bearing_slots() {
        let rec = CognitiveRecord::new(0x00AA, 0x0001, 0x0042, 99, 0x1234, 0x5678);
        let x = rec.extract64();
        assert_eq!((x >> 48) as u16, 0x00AA);
        assert_eq!((x >> 32) as u16, 0x0042);
        assert_eq!((x >> 16) as u16, 0x1234);
        assert_eq!(x as u16, 0x5678);
    }

    #[test]
    fn anchor_pack_unpack_round_trip() {
        let anchor = LineageAnchor {
            origin_domain: 3,
            origin_agent: 0xBEEF,
            birth_ts: 1_700_000_000,
            parent_fold: 0xDEAD_BEEF,
            generation: 5,
            salt: 0x1234_5678,
        };
        assert_eq!(LineageAnchor::unpack(anchor.pack()), anchor);
    }

    #[test]
    fn encodings_have_documented_widths() {
        let id = TrivariateIdentity {
            semantic_hash: 1,
            cognitive_hash64: 2,
            lineage_anchor: LineageAnchor::unpack(3),
        };
        assert_eq!(id.encode(IdentityEncoding::Full).len(), 32);
        assert_eq!(id.encode(IdentityEncoding::Compact).len(), 16);
        assert_eq!(id.encode(IdentityEncoding::Micro).len(), 8);
    }

    #[test]
    fn full_encoding_round_trips() {
        let id = TrivariateIdentity {
            semantic_hash: 0xA1B2_C3D4_E5F6_0718,
            cognitive_hash64: 0x1122_3344_5566_7788,
            lineage_anchor: LineageAnchor {
                origin_domain: 9,
                origin_agent: 0x0BAD,
                birth_ts: 1_700_000_000,
                parent_fold: 77,
                generation: 2,
                salt: 0xFEED_F00D,
            },
        };
        let bytes: [u8; 32] = id.encode(IdentityEncoding::Full).try_into().unwrap();
        assert_eq!(TrivariateIdentity::decode_full(&bytes), id);

        let compact: [u8; 16] = id.encode(IdentityEncoding::Compact).try_into().unwrap();
        assert_eq!(
            TrivariateIdentity::decode_compact(&compact),
            (id.semantic_hash, id.cognitive_hash64)
        );
    }
}
