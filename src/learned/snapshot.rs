//! Knowledge snapshots

use serde::Serialize;
use std::collections::BTreeSet;

use crate::index::Introduction;

/// What a learner knows immediately after a given step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LearnedSnapshot {
    pub vocab_ids: BTreeSet<String>,
    pub suffixes: BTreeSet<String>,
    pub connectors: BTreeSet<String>,
}

impl LearnedSnapshot {
    pub fn is_empty(&self) -> bool {
        self.vocab_ids.is_empty() && self.suffixes.is_empty() && self.connectors.is_empty()
    }

    pub fn knows_vocabulary(&self, id: &str) -> bool {
        self.vocab_ids.contains(id)
    }

    pub fn knows_suffix(&self, token: &str) -> bool {
        self.suffixes.contains(token)
    }

    pub fn knows_connector(&self, token: &str) -> bool {
        self.connectors.contains(token)
    }

    /// True when every field contains the corresponding field of `earlier`
    pub fn is_superset_of(&self, earlier: &LearnedSnapshot) -> bool {
        self.vocab_ids.is_superset(&earlier.vocab_ids)
            && self.suffixes.is_superset(&earlier.suffixes)
            && self.connectors.is_superset(&earlier.connectors)
    }

    /// Union a step's introductions into this snapshot
    pub fn absorb(&mut self, intro: &Introduction) {
        self.vocab_ids.extend(intro.vocab_ids.iter().cloned());
        self.suffixes.extend(intro.suffixes.iter().cloned());
        self.connectors.extend(intro.connectors.iter().cloned());
    }
}
