//! Supersession ledger.
//!
//! A Critical-class scoring event permanently retires a lineage: every
//! future event sharing the same anchor is rejected as superseded. This is
//! a terminal, logged rejection — not an error.

use std::collections::HashSet;
use std::sync::RwLock;

use tracing::warn;

use trivium_types::LineageAnchor;

/// Set of permanently superseded lineage anchors.
///
/// Writes are rare (one per Critical event); reads sit on the admission
/// path, so the set is guarded by a read-biased lock.
#[derive(Debug, Default)]
pub struct SupersessionLedger {
    retired: RwLock<HashSet<u128>>,
}

impl SupersessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a lineage permanently superseded. Idempotent.
    pub fn supersede(&self, anchor: &LineageAnchor) {
        let packed = anchor.pack();
        let inserted = match self.retired.write() {
            Ok(mut retired) => retired.insert(packed),
            Err(poisoned) => poisoned.into_inner().insert(packed),
        };
        if inserted {
            warn!(
                generation = anchor.generation,
                origin_agent = anchor.origin_agent,
                "lineage permanently superseded"
            );
        }
    }

    /// True when the lineage has been retired by a Critical event.
    pub fn is_superseded(&self, anchor: &LineageAnchor) -> bool {
        match self.retired.read() {
            Ok(retired) => retired.contains(&anchor.pack()),
            Err(poisoned) => poisoned.into_inner().contains(&anchor.pack()),
        }
    }

    pub fn len(&self) -> usize {
        match self.retired.read() {
            Ok(retired) => retired.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(salt: u32) -> LineageAnchor {
        LineageAnchor {
            origin_domain: 1,
            origin_agent: 2,
            birth_ts: 3,
            parent_fold: 0,
            generation: 0,
            salt,
        }
    }

    #[test]
    fn supersession_is_permanent_and_idempotent() {
        let ledger = SupersessionLedger::new();
        let a = anchor(1);

        assert!(!ledger.is_superseded(&a));
        ledger.supersede(&a);
        ledger.supersede(&a);
        assert!(ledger.is_superseded(&a));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn supersession_is_per_lineage() {
        let ledger = SupersessionLedger::new();
        ledger.supersede(&anchor(1));
        assert!(!ledger.is_superseded(&anchor(2)));
    }
}
