//! Gate identity and the four-state latching machine's state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one logical admission gate inside the registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GateId(pub String);

impl GateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four admission states. Mutated only by the gate's transition
/// function; read by any number of observers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateState {
    #[default]
    Off,
    Primed,
    Conducting,
    Latched,
}

impl GateState {
    /// Two-byte wire code carried in the frame header.
    pub fn wire_code(self) -> u16 {
        match self {
            GateState::Off => 0,
            GateState::Primed => 1,
            GateState::Conducting => 2,
            GateState::Latched => 3,
        }
    }

    pub fn from_wire_code(code: u16) -> Option<Self> {
        Some(match code {
            0 => GateState::Off,
            1 => GateState::Primed,
            2 => GateState::Conducting,
            3 => GateState::Latched,
            _ => return None,
        })
    }

    /// Permissiveness rank: Off/Primed < Conducting < Latched.
    pub fn permissiveness(self) -> u8 {
        match self {
            GateState::Off | GateState::Primed => 0,
            GateState::Conducting => 1,
            GateState::Latched => 2,
        }
    }

    /// True when events are being admitted in this state.
    pub fn is_conducting(self) -> bool {
        matches!(self, GateState::Conducting | GateState::Latched)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateState::Off => "off",
            GateState::Primed => "primed",
            GateState::Conducting => "conducting",
            GateState::Latched => "latched",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_round_trip() {
        for state in [
            GateState::Off,
            GateState::Primed,
            GateState::Conducting,
            GateState::Latched,
        ] {
            assert_eq!(GateState::from_wire_code(state.wire_code()), Some(state));
        }
        assert_eq!(GateState::from_wire_code(9), None);
    }

    #[test]
    fn permissiveness_orders_states() {
        assert!(GateState::Off.permissiveness() < GateState::Conducting.permissiveness());
        assert!(GateState::Conducting.permissiveness() < GateState::Latched.permissiveness());
        assert_eq!(
            GateState::Off.permissiveness(),
            GateState::Primed.permissiveness()
        );
    }
}
