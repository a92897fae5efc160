//! The pure transition function.
//!
//! Evaluated once per scored event, in priority order:
//!
//! 1. `score ≥ perfect_threshold` → Latched, regardless of current state.
//! 2. Latched and `score < holding_threshold` → Off.
//! 3. Latched otherwise → Latched.
//! 4. Off/Primed and `score ≥ gate_threshold` → Conducting.
//! 5. Conducting and `score < holding_threshold` → Off.
//! 6. otherwise → unchanged.
//!
//! Reset and drought are registry concerns: Reset is authorized out of
//! band, and drought ("anode drop") applies only in Off/Primed/Conducting —
//! it never overrides Latched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trivium_types::{GateConfig, GateState};

/// Metadata recorded when a gate latches; cleared only by Reset or by
/// falling out of Latched under rule 2.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatchMeta {
    pub latched_at: DateTime<Utc>,
    pub latch_score: f64,
}

/// Pure: identical (state, score, config) triples always yield identical
/// next states.
pub fn step(state: GateState, score: f64, config: &GateConfig) -> GateState {
    if score >= config.perfect_threshold {
        return GateState::Latched;
    }
    match state {
        GateState::Latched => {
            if score < config.holding_threshold {
                GateState::Off
            } else {
                GateState::Latched
            }
        }
        GateState::Off | GateState::Primed => {
            if score >= config.gate_threshold {
                GateState::Conducting
            } else {
                state
            }
        }
        GateState::Conducting => {
            if score < config.holding_threshold {
                GateState::Off
            } else {
                GateState::Conducting
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> GateConfig {
        GateConfig {
            gate_threshold: 0.50,
            holding_threshold: 0.35,
            perfect_threshold: 0.98,
            ..GateConfig::default()
        }
    }

    #[test]
    fn scenario_conduct_hold_drop() {
        // Off → Conducting → Conducting → Off under 0.20, 0.60, 0.40, 0.10.
        let c = config();
        let mut state = GateState::Off;
        let expected = [
            GateState::Off,
            GateState::Conducting,
            GateState::Conducting,
            GateState::Off,
        ];
        for (score, want) in [0.20, 0.60, 0.40, 0.10].iter().zip(expected) {
            state = step(state, *score, &c);
            assert_eq!(state, want);
        }
    }

    #[test]
    fn perfect_score_latches_from_off() {
        assert_eq!(step(GateState::Off, 0.99, &config()), GateState::Latched);
    }

    #[test]
    fn latched_holds_above_holding_threshold() {
        assert_eq!(step(GateState::Latched, 0.80, &config()), GateState::Latched);
    }

    #[test]
    fn latched_drops_below_holding_threshold() {
        assert_eq!(step(GateState::Latched, 0.10, &config()), GateState::Off);
    }

    #[test]
    fn primed_conducts_at_gate_threshold() {
        assert_eq!(
            step(GateState::Primed, 0.50, &config()),
            GateState::Conducting
        );
        assert_eq!(step(GateState::Primed, 0.49, &config()), GateState::Primed);
    }

    proptest! {
        /// The function is pure.
        #[test]
        fn transition_is_pure(score in 0.0f64..=1.0, which in 0u16..=3) {
            let state = GateState::from_wire_code(which).unwrap();
            let c = config();
            prop_assert_eq!(step(state, score, &c), step(state, score, &c));
        }

        /// Monotonicity: raising the score never decreases permissiveness
        /// of the next state, all else fixed.
        #[test]
        fn higher_score_never_less_permissive(
            lo in 0.0f64..=1.0,
            hi in 0.0f64..=1.0,
            which in 0u16..=3,
        ) {
            let (lo, hi) = (lo.min(hi), lo.max(hi));
            let state = GateState::from_wire_code(which).unwrap();
            let c = config();
            let a = step(state, lo, &c);
            let b = step(state, hi, &c);
            prop_assert!(b.permissiveness() >= a.permissiveness());
        }
    }
}
