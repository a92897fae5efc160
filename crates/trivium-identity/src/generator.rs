//! Identity Generator: mint once, tick forever.
//!
//! Birth mints the immutable lineage anchor from
//! origin/agent/timestamp/parent/generation/random. Every later tick only
//! repacks `semantic_hash` and `cognitive_hash64` from fresh context —
//! anchors are never regenerated, not even across dormancy.

use chrono::Utc;
use rand::Rng;
use tracing::debug;

use trivium_types::units;
use trivium_types::{CognitiveRecord, LineageAnchor, SemanticFields, TrivariateIdentity};

use crate::error::IdentityError;

/// Per-tick context from which the two mutable hash fields derive.
#[derive(Clone, Debug)]
pub struct TickInput<'a> {
    pub domain: u16,
    pub phase: u16,
    /// Ordered structural descriptor tokens; hashed into the 16-bit
    /// structure sub-field.
    pub descriptor: &'a [&'a str],
    pub delta_angle_deg: f64,
    pub agent: u16,
    pub task: u16,
    pub sequence: u16,
    /// Entropy sample in [0,1].
    pub entropy: f64,
}

/// Stateless generator; all state lives in the identities it produces.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityGenerator;

impl IdentityGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Mint a full identity at entity birth. The anchor produced here is
    /// permanent until explicit retirement.
    pub fn mint(
        &self,
        input: &TickInput<'_>,
        parent: Option<&LineageAnchor>,
    ) -> Result<TrivariateIdentity, IdentityError> {
        let anchor = LineageAnchor {
            origin_domain: (input.domain >> 8) as u8,
            origin_agent: input.agent,
            birth_ts: Utc::now().timestamp() as u32,
            parent_fold: parent.map(LineageAnchor::fold32).unwrap_or(0),
            generation: parent.map(|p| p.generation.saturating_add(1)).unwrap_or(0),
            salt: rand::thread_rng().gen(),
        };

        debug!(
            agent = input.agent,
            generation = anchor.generation,
            "minted lineage anchor"
        );

        let (semantic, cognitive) = self.derive_hashes(input)?;
        Ok(TrivariateIdentity {
            semantic_hash: semantic,
            cognitive_hash64: cognitive,
            lineage_anchor: anchor,
        })
    }

    /// Recompute the two hash fields in place; the anchor is untouched.
    pub fn tick(
        &self,
        identity: &mut TrivariateIdentity,
        input: &TickInput<'_>,
    ) -> Result<(), IdentityError> {
        let (semantic, cognitive) = self.derive_hashes(input)?;
        identity.semantic_hash = semantic;
        identity.cognitive_hash64 = cognitive;
        Ok(())
    }

    /// Perturb only the delta-angle/entropy sub-fields of an existing
    /// identity (the Micro delta-class directive).
    pub fn perturb(
        &self,
        identity: &mut TrivariateIdentity,
        delta_angle_deg: f64,
        entropy: f64,
    ) {
        let mut fields = identity.semantic_fields();
        fields.delta_angle = units::delta_angle_to_subfield(delta_angle_deg);
        identity.semantic_hash = fields.pack();

        let delta16 = units::delta_angle_to_subfield(delta_angle_deg) as u64;
        let entropy16 = units::entropy_to_q16(entropy) as u64;
        identity.cognitive_hash64 =
            (identity.cognitive_hash64 & 0xFFFF_FFFF_0000_0000) | delta16 << 16 | entropy16;
    }

    fn derive_hashes(&self, input: &TickInput<'_>) -> Result<(u64, u64), IdentityError> {
        if input.descriptor.is_empty() {
            return Err(IdentityError::EmptyDescriptor);
        }
        if !(0.0..=1.0).contains(&input.entropy) {
            return Err(IdentityError::EntropyOutOfRange(input.entropy));
        }

        let semantic = SemanticFields {
            domain: input.domain,
            phase: input.phase,
            structure: descriptor_hash16(input.descriptor),
            delta_angle: units::delta_angle_to_subfield(input.delta_angle_deg),
        }
        .pack();

        let record = CognitiveRecord::new(
            input.agent,
            input.task,
            input.sequence,
            Utc::now().timestamp() as u32,
            units::delta_angle_to_subfield(input.delta_angle_deg),
            units::entropy_to_q16(input.entropy),
        );

        Ok((semantic, record.extract64()))
    }
}

/// Stable non-cryptographic 16-bit digest of an ordered token sequence.
///
/// blake3 keyed by token position, folded to the low 16 bits. Collisions
/// are expected and tolerated downstream.
pub fn descriptor_hash16(tokens: &[&str]) -> u16 {
    let mut hasher = blake3::Hasher::new();
    for (position, token) in tokens.iter().enumerate() {
        hasher.update(&(position as u32).to_be_bytes());
        hasher.update(token.as_bytes());
        hasher.update(&[0x1F]); // token separator
    }
    let digest = hasher.finalize();
    u16::from_be_bytes([digest.as_bytes()[0], digest.as_bytes()[1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(descriptor: &'a [&'a str]) -> TickInput<'a> {
        TickInput {
            domain: 0x0102,
            phase: 0x0001,
            descriptor,
            delta_angle_deg: 3.5,
            agent: 42,
            task: 7,
            sequence: 100,
            entropy: 0.6,
        }
    }

    #[test]
    fn mint_then_tick_preserves_anchor() {
        let generator = IdentityGenerator::new();
        let tokens = ["route", "uplink", "alpha"];
        let mut id = generator.mint(&input(&tokens), None).unwrap();
        let anchor = id.lineage_anchor;

        let other = ["route", "downlink", "beta"];
        generator.tick(&mut id, &input(&other)).unwrap();

        assert_eq!(id.lineage_anchor, anchor);
        assert_eq!(anchor.generation, 0);
        assert_eq!(anchor.parent_fold, 0);
    }

    #[test]
    fn child_anchor_points_at_parent() {
        let generator = IdentityGenerator::new();
        let tokens = ["node"];
        let parent = generator.mint(&input(&tokens), None).unwrap();
        let child = generator
            .mint(&input(&tokens), Some(&parent.lineage_anchor))
            .unwrap();

        assert_eq!(child.lineage_anchor.generation, 1);
        assert_eq!(
            child.lineage_anchor.parent_fold,
            parent.lineage_anchor.fold32()
        );
        assert_ne!(child.lineage_anchor, parent.lineage_anchor);
    }

    #[test]
    fn descriptor_hash_is_order_sensitive() {
        assert_ne!(
            descriptor_hash16(&["a", "b"]),
            descriptor_hash16(&["b", "a"])
        );
        assert_eq!(
            descriptor_hash16(&["a", "b"]),
            descriptor_hash16(&["a", "b"])
        );
    }

    #[test]
    fn empty_descriptor_rejected() {
        let generator = IdentityGenerator::new();
        let tokens: [&str; 0] = [];
        assert!(matches!(
            generator.mint(&input(&tokens), None),
            Err(IdentityError::EmptyDescriptor)
        ));
    }

    #[test]
    fn perturb_touches_only_delta_and_entropy() {
        let generator = IdentityGenerator::new();
        let tokens = ["x"];
        let mut id = generator.mint(&input(&tokens), None).unwrap();
        let before = id.semantic_fields();
        let agent_seq = id.cognitive_hash64 >> 32;

        generator.perturb(&mut id, 9.99, 0.1);

        let after = id.semantic_fields();
        assert_eq!(after.domain, before.domain);
        assert_eq!(after.phase, before.phase);
        assert_eq!(after.structure, before.structure);
        assert_eq!(after.delta_angle, 999);
        assert_eq!(id.cognitive_hash64 >> 32, agent_seq);
    }
}
