//! The admission point.
//!
//! One decoded frame flows: supersession check → polycrystal scoring →
//! gate step → dispatch-key derivation. Everything on this path is
//! synchronous and deterministic given the pipeline's current state; the
//! only async component is the bridge draining the transition sink.
//!
//! Hash expectation is tracked per gate id: the first admitted frame on a
//! gate sets it, and later frames score their declared hash against it.
//! A first contact has nothing to disagree with and scores full coherence.

use std::collections::HashMap;
use std::sync::RwLock;

use ed25519_dalek::Signature;
use tokio::sync::mpsc;
use tracing::{info, warn};

use trivium_codec::{Frame, FrameHeader, PayloadType, ResetPayload};
use trivium_gate::{GateRegistry, ResetAuthorizer, ResetRequest, TransitionEvent};
use trivium_identity::{dispatch_key, DispatchKey, IdentityGenerator, SupersessionLedger, TickInput};
use trivium_resonance::{AdaptiveTuner, Polycrystal, ScoreInput};
use trivium_types::{
    units, CrystalKind, DeltaClass, GateId, GateState, IdentityEncoding, LineageAnchor,
    PipelineConfig, TrivariateIdentity,
};

use crate::error::PipelineError;

/// What the delta class demands of the identity downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationDirective {
    /// Reuse the identity unchanged.
    Reuse,
    /// Perturb only the delta-angle/entropy sub-fields.
    Perturb,
    /// Recompute semantic + cognitive fields; anchor untouched.
    Tick,
    /// Mint a fresh triple parented to the current anchor.
    Remint,
    /// Retire the lineage and mint an unparented replacement.
    Supersede,
}

impl MutationDirective {
    pub fn for_class(class: DeltaClass) -> Self {
        match class {
            DeltaClass::None => MutationDirective::Reuse,
            DeltaClass::Micro => MutationDirective::Perturb,
            DeltaClass::Soft => MutationDirective::Tick,
            DeltaClass::Hard => MutationDirective::Remint,
            DeltaClass::Critical => MutationDirective::Supersede,
        }
    }
}

/// One scored-and-gated frame's outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct AdmissionReport {
    pub admitted: bool,
    pub state: GateState,
    pub ring_strength: f64,
    pub delta_class: DeltaClass,
    pub directive: MutationDirective,
    /// Present when the frame carried identity material and was admitted.
    pub dispatch_key: Option<DispatchKey>,
}

/// The three ways a frame leaves the admission point.
#[derive(Clone, Debug, PartialEq)]
pub enum Admission {
    /// An authorized Reset was applied; no scoring happened.
    Reset { state: GateState },
    /// The lineage was permanently retired earlier; terminal rejection.
    Superseded,
    /// The frame was scored and gated.
    Scored(AdmissionReport),
}

/// The wired pipeline: generator, polycrystal, registry, ledger.
pub struct Pipeline {
    generator: IdentityGenerator,
    polycrystal: Polycrystal,
    tuner: Option<AdaptiveTuner>,
    registry: GateRegistry,
    ledger: SupersessionLedger,
    expectations: RwLock<HashMap<GateId, u64>>,
}

impl Pipeline {
    /// Build from a validated startup configuration. Fails fast; nothing
    /// on the admission path re-validates.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let polycrystal = Polycrystal::new(config.profiles.clone(), config.policy)?;
        let tuner = match config
            .profiles
            .iter()
            .position(|p| p.kind == CrystalKind::Adaptive)
        {
            Some(index) => Some(AdaptiveTuner::new(&polycrystal, index)?),
            None => None,
        };
        let authorizer = ResetAuthorizer::from_bytes(&config.reset_verifying_key)?;
        let registry = GateRegistry::new(config.gate.clone(), authorizer);

        info!(
            profiles = config.profiles.len(),
            adaptive = tuner.is_some(),
            "pipeline assembled"
        );
        Ok(Self {
            generator: IdentityGenerator::new(),
            polycrystal,
            tuner,
            registry,
            ledger: SupersessionLedger::new(),
            expectations: RwLock::new(HashMap::new()),
        })
    }

    /// Attach the bridge's transition sink.
    pub fn with_transition_sink(self, sink: mpsc::UnboundedSender<TransitionEvent>) -> Self {
        let Self {
            generator,
            polycrystal,
            tuner,
            registry,
            ledger,
            expectations,
        } = self;
        Self {
            generator,
            polycrystal,
            tuner,
            registry: registry.with_sink(sink),
            ledger,
            expectations,
        }
    }

    pub fn registry(&self) -> &GateRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &SupersessionLedger {
        &self.ledger
    }

    pub fn generator(&self) -> &IdentityGenerator {
        &self.generator
    }

    pub fn polycrystal(&self) -> &Polycrystal {
        &self.polycrystal
    }

    /// Tear down a gate: the registry record and the gate's hash
    /// expectation are both dropped.
    pub fn teardown(&self, gate_id: &GateId) {
        self.registry.teardown(gate_id);
        let mut expectations = match self.expectations.write() {
            Ok(expectations) => expectations,
            Err(poisoned) => poisoned.into_inner(),
        };
        expectations.remove(gate_id);
    }

    /// Run one decoded frame through the admission point.
    pub fn admit(&self, gate_id: &GateId, frame: &Frame) -> Result<Admission, PipelineError> {
        if frame.header.payload_type == PayloadType::Reset {
            return self.handle_reset(gate_id, frame);
        }

        let framed = decode_identity(frame)?;
        if let Some((identity, anchored)) = &framed {
            if *anchored && self.ledger.is_superseded(&identity.lineage_anchor) {
                warn!(gate_id = %gate_id, "superseded lineage rejected");
                return Ok(Admission::Superseded);
            }
        }

        let entropy = units::entropy_from_wire(frame.header.entropy_micro);
        let delta_angle_deg = units::delta_angle_from_wire(frame.header.delta_angle_milli);
        let (declared, hash_bits) = match &framed {
            Some((identity, _)) => (identity.cognitive_hash64, 64),
            None => (frame.header.identity_hash32 as u64, 32),
        };
        let expected = self.expected_for(gate_id, declared);

        let input = ScoreInput::new(entropy, delta_angle_deg, declared, expected)
            .with_hash_bits(hash_bits);
        let resonance = self.polycrystal.assess(&input);
        let decision = self.registry.apply(
            gate_id,
            resonance.ring_strength,
            resonance.delta_class,
            resonance.pass,
            entropy,
        );

        if resonance.delta_class == DeltaClass::Critical {
            if let Some((identity, true)) = &framed {
                self.ledger.supersede(&identity.lineage_anchor);
            }
        }

        // Critical rejects the event outright, whatever the gate says: no
        // dispatch key, and the hash expectation does not move.
        let admitted = decision.admitted && resonance.delta_class != DeltaClass::Critical;
        if admitted {
            self.remember(gate_id, declared);
        }

        let key = match &framed {
            Some((identity, _)) if admitted => Some(dispatch_key(identity)),
            _ => None,
        };
        Ok(Admission::Scored(AdmissionReport {
            admitted,
            state: decision.state,
            ring_strength: decision.ring_strength,
            delta_class: decision.delta_class,
            directive: MutationDirective::for_class(decision.delta_class),
            dispatch_key: key,
        }))
    }

    /// Execute a directive against an identity, through the generator and
    /// the ledger.
    pub fn apply_directive(
        &self,
        directive: MutationDirective,
        identity: &mut TrivariateIdentity,
        input: &TickInput<'_>,
    ) -> Result<(), PipelineError> {
        match directive {
            MutationDirective::Reuse => Ok(()),
            MutationDirective::Perturb => {
                self.generator
                    .perturb(identity, input.delta_angle_deg, input.entropy);
                Ok(())
            }
            MutationDirective::Tick => {
                self.generator.tick(identity, input)?;
                Ok(())
            }
            MutationDirective::Remint => {
                let parent = identity.lineage_anchor;
                *identity = self.generator.mint(input, Some(&parent))?;
                Ok(())
            }
            MutationDirective::Supersede => {
                self.ledger.supersede(&identity.lineage_anchor);
                *identity = self.generator.mint(input, None)?;
                Ok(())
            }
        }
    }

    /// Fold one observed event into the Adaptive profile, when one is
    /// configured. Explicit by contract: `admit` never mutates the basis.
    pub fn observe(&mut self, input: &ScoreInput) {
        if let Some(tuner) = &mut self.tuner {
            tuner.observe(&mut self.polycrystal, input);
        }
    }

    fn handle_reset(&self, gate_id: &GateId, frame: &Frame) -> Result<Admission, PipelineError> {
        let payload = ResetPayload::decode(&frame.payload)?;
        let request = ResetRequest {
            gate_id: gate_id.clone(),
            nonce: payload.nonce,
            signature: Signature::from_bytes(&payload.signature),
        };
        let state = self.registry.reset(&request)?;
        Ok(Admission::Reset { state })
    }

    fn expected_for(&self, gate_id: &GateId, declared: u64) -> u64 {
        let expectations = match self.expectations.read() {
            Ok(expectations) => expectations,
            Err(poisoned) => poisoned.into_inner(),
        };
        expectations.get(gate_id).copied().unwrap_or(declared)
    }

    fn remember(&self, gate_id: &GateId, declared: u64) {
        let mut expectations = match self.expectations.write() {
            Ok(expectations) => expectations,
            Err(poisoned) => poisoned.into_inner(),
        };
        expectations.insert(gate_id.clone(), declared);
    }
}

/// Identity material off the frame, if any, plus whether the anchor was
/// on the wire (Compact carries none; its placeholder anchor must never
/// touch the ledger).
fn decode_identity(
    frame: &Frame,
) -> Result<Option<(TrivariateIdentity, bool)>, PipelineError> {
    match frame.header.payload_type {
        PayloadType::FullIdentity => {
            let bytes: [u8; 32] = frame.payload.as_slice().try_into().map_err(|_| {
                trivium_codec::CodecError::MalformedFrame {
                    expected: 32,
                    got: frame.payload.len(),
                }
            })?;
            Ok(Some((TrivariateIdentity::decode_full(&bytes), true)))
        }
        PayloadType::CompactIdentity => {
            let bytes: [u8; 16] = frame.payload.as_slice().try_into().map_err(|_| {
                trivium_codec::CodecError::MalformedFrame {
                    expected: 16,
                    got: frame.payload.len(),
                }
            })?;
            let (semantic_hash, cognitive_hash64) = TrivariateIdentity::decode_compact(&bytes);
            Ok(Some((
                TrivariateIdentity {
                    semantic_hash,
                    cognitive_hash64,
                    lineage_anchor: LineageAnchor::unpack(0),
                },
                false,
            )))
        }
        _ => Ok(None),
    }
}

/// Build an identity-bearing frame for transmission. Micro has no payload
/// form; it rides the header hash alone under a Keepalive.
pub fn identity_frame(
    identity: &TrivariateIdentity,
    gate_state: GateState,
    delta_angle_deg: f64,
    entropy: f64,
    encoding: IdentityEncoding,
) -> Frame {
    let (payload_type, payload) = match encoding {
        IdentityEncoding::Full => (PayloadType::FullIdentity, identity.encode(encoding)),
        IdentityEncoding::Compact => (PayloadType::CompactIdentity, identity.encode(encoding)),
        IdentityEncoding::Micro => (PayloadType::Keepalive, Vec::new()),
    };
    let header = FrameHeader::new(
        gate_state,
        units::delta_angle_to_wire(delta_angle_deg),
        units::entropy_to_wire(entropy),
        identity.cognitive_hash64 as u32,
        payload_type,
    );
    Frame::new(header, payload)
}

/// Build an authorized-reset frame.
pub fn reset_frame(nonce: [u8; 8], signature: [u8; 64]) -> Frame {
    let payload = ResetPayload { nonce, signature };
    let header = FrameHeader::new(GateState::Off, 0, 0, 0, PayloadType::Reset);
    Frame::new(header, payload.encode())
}
