//! Per-gate state registry.
//!
//! Gate state is reachable only through this registry — no process-wide
//! statics. Distinct gate ids update fully in parallel; one id's record
//! sits behind its own lock, so writes to it are serialized and concurrent
//! readers are always safe (staleness of observability reads is
//! acceptable). Transition events are offered to a non-blocking sink the
//! bridge drains; an absent or closed sink never stalls the hot path.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use trivium_types::{DeltaClass, GateConfig, GateId, GateState};

use crate::error::GateError;
use crate::reset::{ResetAuthorizer, ResetRequest};
use crate::transition::{step, LatchMeta};

/// What drove a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    /// A scored event passed through the transition function.
    Scored,
    /// Sustained entropy below the drought floor ("anode drop").
    Drought,
    /// An authorized Reset.
    Reset,
}

/// One recorded transition, also what the bridge republishes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub gate_id: GateId,
    pub from: GateState,
    pub to: GateState,
    pub score: f64,
    pub delta_class: DeltaClass,
    pub cause: TransitionCause,
    pub at: DateTime<Utc>,
}

/// The admit/deny decision returned to the admission point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub admitted: bool,
    pub state: GateState,
    pub ring_strength: f64,
    pub delta_class: DeltaClass,
}

/// Per-gate owned state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateRecord {
    pub state: GateState,
    pub latch: Option<LatchMeta>,
    /// Consecutive entropy samples below the drought floor.
    pub drought_run: u32,
    pub log: Vec<TransitionEvent>,
}

impl Default for GateRecord {
    fn default() -> Self {
        Self {
            state: GateState::Off,
            latch: None,
            drought_run: 0,
            log: Vec::new(),
        }
    }
}

/// Registry mapping gate id → owned state record.
pub struct GateRegistry {
    config: GateConfig,
    authorizer: ResetAuthorizer,
    gates: RwLock<HashMap<GateId, Arc<RwLock<GateRecord>>>>,
    /// Non-blocking transition sink for the bridge.
    sink: Option<mpsc::UnboundedSender<TransitionEvent>>,
}

impl GateRegistry {
    pub fn new(config: GateConfig, authorizer: ResetAuthorizer) -> Self {
        Self {
            config,
            authorizer,
            gates: RwLock::new(HashMap::new()),
            sink: None,
        }
    }

    /// Attach the bridge's transition sink. Publishing is `try_send`-style
    /// and never blocks the hot path.
    pub fn with_sink(mut self, sink: mpsc::UnboundedSender<TransitionEvent>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    fn record_for(&self, gate_id: &GateId) -> Arc<RwLock<GateRecord>> {
        if let Ok(gates) = self.gates.read() {
            if let Some(record) = gates.get(gate_id) {
                return Arc::clone(record);
            }
        }
        let mut gates = match self.gates.write() {
            Ok(gates) => gates,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(gates.entry(gate_id.clone()).or_default())
    }

    /// Current state; creates the gate on first reference.
    pub fn state_of(&self, gate_id: &GateId) -> GateState {
        let record = self.record_for(gate_id);
        let state = match record.read() {
            Ok(record) => record.state,
            Err(poisoned) => poisoned.into_inner().state,
        };
        state
    }

    /// Snapshot of a gate's transition log.
    pub fn log_of(&self, gate_id: &GateId) -> Vec<TransitionEvent> {
        let record = self.record_for(gate_id);
        let log = match record.read() {
            Ok(record) => record.log.clone(),
            Err(poisoned) => poisoned.into_inner().log.clone(),
        };
        log
    }

    /// Apply one scored event to a gate and render the admission decision.
    ///
    /// `entropy` feeds the drought tracker; the drought fault forces a step
    /// toward Off only from Off/Primed/Conducting — never out of Latched,
    /// which only rule 2 or an authorized Reset exits.
    pub fn apply(
        &self,
        gate_id: &GateId,
        ring_strength: f64,
        delta_class: DeltaClass,
        policy_pass: bool,
        entropy: f64,
    ) -> AdmissionDecision {
        let record = self.record_for(gate_id);
        let mut record = match record.write() {
            Ok(record) => record,
            Err(poisoned) => poisoned.into_inner(),
        };

        let from = record.state;
        let mut to = step(from, ring_strength, &self.config);
        let mut cause = TransitionCause::Scored;

        // Drought accounting runs on every event; the fault itself spares
        // Latched.
        if entropy < self.config.entropy_floor {
            record.drought_run = record.drought_run.saturating_add(1);
        } else {
            record.drought_run = 0;
        }
        if record.drought_run >= self.config.drought_window && to != GateState::Latched {
            if to != GateState::Off {
                warn!(gate_id = %gate_id, run = record.drought_run, "anode drop: entropy drought");
                cause = TransitionCause::Drought;
            }
            to = GateState::Off;
        }

        if to == GateState::Latched && from != GateState::Latched {
            record.latch = Some(LatchMeta {
                latched_at: Utc::now(),
                latch_score: ring_strength,
            });
        }
        if to != GateState::Latched {
            record.latch = None;
        }

        if from != to {
            self.log_transition(&mut record, gate_id, from, to, ring_strength, delta_class, cause);
        }
        record.state = to;

        let admitted = policy_pass && to.is_conducting();
        debug!(
            gate_id = %gate_id,
            score = ring_strength,
            state = %to,
            admitted,
            "admission decision"
        );
        AdmissionDecision {
            admitted,
            state: to,
            ring_strength,
            delta_class,
        }
    }

    /// Authorized Reset: unconditionally Off from any state, latch
    /// metadata cleared. The only path out of Latched besides rule 2.
    pub fn reset(&self, request: &ResetRequest) -> Result<GateState, GateError> {
        self.authorizer.verify(request)?;

        let record = self.record_for(&request.gate_id);
        let mut record = match record.write() {
            Ok(record) => record,
            Err(poisoned) => poisoned.into_inner(),
        };

        let from = record.state;
        record.latch = None;
        record.drought_run = 0;
        if from != GateState::Off {
            self.log_transition(
                &mut record,
                &request.gate_id,
                from,
                GateState::Off,
                0.0,
                DeltaClass::None,
                TransitionCause::Reset,
            );
        }
        record.state = GateState::Off;
        info!(gate_id = %request.gate_id, from = %from, "gate reset");
        Ok(GateState::Off)
    }

    /// Remove a gate at explicit teardown.
    pub fn teardown(&self, gate_id: &GateId) {
        let mut gates = match self.gates.write() {
            Ok(gates) => gates,
            Err(poisoned) => poisoned.into_inner(),
        };
        gates.remove(gate_id);
    }

    #[allow(clippy::too_many_arguments)]
    fn log_transition(
        &self,
        record: &mut GateRecord,
        gate_id: &GateId,
        from: GateState,
        to: GateState,
        score: f64,
        delta_class: DeltaClass,
        cause: TransitionCause,
    ) {
        let event = TransitionEvent {
            gate_id: gate_id.clone(),
            from,
            to,
            score,
            delta_class,
            cause,
            at: Utc::now(),
        };
        info!(
            gate_id = %gate_id,
            from = %from,
            to = %to,
            score,
            ?delta_class,
            ?cause,
            "gate transition"
        );
        record.log.push(event.clone());
        if let Some(sink) = &self.sink {
            // Receiver gone means the bridge is down; the hot path carries on.
            let _ = sink.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reset::reset_message;
    use ed25519_dalek::{Signer, SigningKey};

    fn registry() -> (GateRegistry, SigningKey) {
        let signing = SigningKey::from_bytes(&[42u8; 32]);
        let authorizer = ResetAuthorizer::new(signing.verifying_key());
        let registry = GateRegistry::new(GateConfig::default(), authorizer);
        (registry, signing)
    }

    fn apply(registry: &GateRegistry, id: &GateId, score: f64) -> AdmissionDecision {
        registry.apply(id, score, DeltaClass::None, true, 0.5)
    }

    fn signed_reset(id: &GateId, signing: &SigningKey) -> ResetRequest {
        let nonce = [7u8; 8];
        let signature = signing.sign(&reset_message(id, &nonce));
        ResetRequest {
            gate_id: id.clone(),
            nonce,
            signature,
        }
    }

    #[test]
    fn scenario_sequence_off_conduct_conduct_off() {
        let (registry, _) = registry();
        let id = GateId::new("g1");
        let states: Vec<GateState> = [0.20, 0.60, 0.40, 0.10]
            .iter()
            .map(|s| apply(&registry, &id, *s).state)
            .collect();
        assert_eq!(
            states,
            vec![
                GateState::Off,
                GateState::Conducting,
                GateState::Conducting,
                GateState::Off
            ]
        );
    }

    #[test]
    fn perfect_score_latches_and_low_scores_cannot_unlatch_above_holding() {
        let (registry, _) = registry();
        let id = GateId::new("g1");
        assert_eq!(apply(&registry, &id, 0.99).state, GateState::Latched);
        assert_eq!(apply(&registry, &id, 0.80).state, GateState::Latched);
        assert_eq!(apply(&registry, &id, 0.40).state, GateState::Latched);
    }

    #[test]
    fn valid_reset_clears_latch_metadata() {
        let (registry, signing) = registry();
        let id = GateId::new("g1");
        apply(&registry, &id, 0.99);

        let state = registry.reset(&signed_reset(&id, &signing)).unwrap();
        assert_eq!(state, GateState::Off);

        let record = registry.record_for(&id);
        let record = record.read().unwrap();
        assert!(record.latch.is_none());
        assert_eq!(record.state, GateState::Off);
    }

    #[test]
    fn forged_reset_leaves_state_unchanged() {
        let (registry, _) = registry();
        let intruder = SigningKey::from_bytes(&[99u8; 32]);
        let id = GateId::new("g1");
        apply(&registry, &id, 0.99);

        let err = registry.reset(&signed_reset(&id, &intruder)).unwrap_err();
        assert!(matches!(err, GateError::AuthorizationFailure));
        assert_eq!(registry.state_of(&id), GateState::Latched);
    }

    #[test]
    fn drought_forces_off_from_conducting() {
        let (registry, _) = registry();
        let id = GateId::new("g1");
        assert_eq!(apply(&registry, &id, 0.60).state, GateState::Conducting);

        // Scores hold above the holding threshold, but entropy has dried up.
        let mut last = GateState::Conducting;
        for _ in 0..GateConfig::default().drought_window {
            last = registry
                .apply(&id, 0.40, DeltaClass::None, true, 0.0)
                .state;
        }
        assert_eq!(last, GateState::Off);

        let log = registry.log_of(&id);
        assert!(log
            .iter()
            .any(|e| e.cause == TransitionCause::Drought && e.to == GateState::Off));
    }

    #[test]
    fn drought_never_overrides_latched() {
        let (registry, _) = registry();
        let id = GateId::new("g1");
        apply(&registry, &id, 0.99);

        for _ in 0..20 {
            registry.apply(&id, 0.80, DeltaClass::None, true, 0.0);
        }
        assert_eq!(registry.state_of(&id), GateState::Latched);
    }

    #[test]
    fn gates_are_independent() {
        let (registry, _) = registry();
        let a = GateId::new("a");
        let b = GateId::new("b");
        apply(&registry, &a, 0.99);
        assert_eq!(registry.state_of(&a), GateState::Latched);
        assert_eq!(registry.state_of(&b), GateState::Off);
    }

    #[test]
    fn transitions_reach_the_sink() {
        let (registry, _) = registry();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let registry = registry.with_sink(tx);
        let id = GateId::new("g1");

        apply(&registry, &id, 0.60);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.from, GateState::Off);
        assert_eq!(event.to, GateState::Conducting);
    }

    #[test]
    fn failing_policy_denies_even_while_conducting() {
        let (registry, _) = registry();
        let id = GateId::new("g1");
        let decision = registry.apply(&id, 0.60, DeltaClass::None, false, 0.5);
        assert_eq!(decision.state, GateState::Conducting);
        assert!(!decision.admitted);
    }
}
