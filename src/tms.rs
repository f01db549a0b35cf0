//! Truth maintenance substrate: justification state shared by facts and rules.
//!
//! Every stored item records whether a caller asserted it directly, which
//! derivations support it (`supported_by`, one [`SupportEdge`] per
//! derivation event) and which items it helped derive (forward edges).
//! When a support is withdrawn, the knowledge base:
//!
//! 1. Strips every support edge naming the removed item from its dependents
//! 2. Re-evaluates each dependent with the same disposition table
//! 3. Cascades through every dependent that is physically removed in turn
//!
//! The cascade itself lives in `kb::retract`; this module holds the state and
//! the local disposition rules.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::{FactId, ItemKey, RuleId};

// ---------------------------------------------------------------------------
// Support edge
// ---------------------------------------------------------------------------

/// One derivation event: `fact` unified with the first antecedent of `rule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SupportEdge {
    pub fact: FactId,
    pub rule: RuleId,
}

impl SupportEdge {
    pub fn new(fact: FactId, rule: RuleId) -> Self {
        Self { fact, rule }
    }

    /// Check if this edge names `key` as either its fact or its rule.
    pub fn references(&self, key: ItemKey) -> bool {
        match key {
            ItemKey::Fact(id) => self.fact == id,
            ItemKey::Rule(id) => self.rule == id,
        }
    }

    /// Both endpoints of the edge.
    pub fn endpoints(&self) -> [ItemKey; 2] {
        [ItemKey::Fact(self.fact), ItemKey::Rule(self.rule)]
    }
}

// ---------------------------------------------------------------------------
// Justification
// ---------------------------------------------------------------------------

/// Justification state of a stored item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Justification {
    /// Directly claimed true by a caller.
    pub(crate) asserted: bool,
    /// Derivations producing this item. May repeat a pair only if the same
    /// derivation was reported twice.
    pub(crate) supported_by: Vec<SupportEdge>,
    /// Facts this item helped derive.
    pub(crate) supports_facts: BTreeSet<FactId>,
    /// Rules this item helped derive.
    pub(crate) supports_rules: BTreeSet<RuleId>,
}

impl Justification {
    /// State of a caller-claimed item.
    pub fn asserted() -> Self {
        Self {
            asserted: true,
            ..Default::default()
        }
    }

    /// State of an item produced by one derivation.
    pub fn derived(edge: SupportEdge) -> Self {
        Self {
            asserted: false,
            supported_by: vec![edge],
            ..Default::default()
        }
    }

    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    pub fn is_supported(&self) -> bool {
        !self.supported_by.is_empty()
    }

    pub fn supported_by(&self) -> &[SupportEdge] {
        &self.supported_by
    }

    pub fn supports_facts(&self) -> &BTreeSet<FactId> {
        &self.supports_facts
    }

    pub fn supports_rules(&self) -> &BTreeSet<RuleId> {
        &self.supports_rules
    }

    /// All forward edges, facts first.
    pub fn dependents(&self) -> Vec<ItemKey> {
        self.supports_facts
            .iter()
            .map(|&id| ItemKey::Fact(id))
            .chain(self.supports_rules.iter().map(|&id| ItemKey::Rule(id)))
            .collect()
    }

    /// Record a forward edge to `dependent`.
    pub(crate) fn add_dependent(&mut self, dependent: ItemKey) {
        match dependent {
            ItemKey::Fact(id) => {
                self.supports_facts.insert(id);
            }
            ItemKey::Rule(id) => {
                self.supports_rules.insert(id);
            }
        }
    }

    /// Drop the forward edge to `dependent`.
    pub(crate) fn remove_dependent(&mut self, dependent: ItemKey) {
        match dependent {
            ItemKey::Fact(id) => {
                self.supports_facts.remove(&id);
            }
            ItemKey::Rule(id) => {
                self.supports_rules.remove(&id);
            }
        }
    }

    /// Remove every support edge that names `removed`; return the stripped edges.
    pub(crate) fn strip_support(&mut self, removed: ItemKey) -> Vec<SupportEdge> {
        let (stripped, kept): (Vec<_>, Vec<_>) = self
            .supported_by
            .drain(..)
            .partition(|edge| edge.references(removed));
        self.supported_by = kept;
        stripped
    }

    /// Check if any remaining support edge names `key`.
    pub fn is_supported_via(&self, key: ItemKey) -> bool {
        self.supported_by.iter().any(|edge| edge.references(key))
    }
}

// ---------------------------------------------------------------------------
// Justified capability
// ---------------------------------------------------------------------------

/// Capability shared by facts and rules: access to justification state.
pub trait Justified {
    fn justification(&self) -> &Justification;

    fn justification_mut(&mut self) -> &mut Justification;

    fn is_asserted(&self) -> bool {
        self.justification().is_asserted()
    }

    fn is_supported(&self) -> bool {
        self.justification().is_supported()
    }

    fn supported_by(&self) -> &[SupportEdge] {
        self.justification().supported_by()
    }
}

// ---------------------------------------------------------------------------
// Disposition
// ---------------------------------------------------------------------------

/// What a retraction request does to one stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    /// Asserted and still supported: `asserted` is cleared, item stays.
    Demote,
    /// Still justified (or an asserted rule): nothing changes.
    Keep,
    /// Unjustified: physically removed, dependents are re-evaluated.
    Remove,
}

impl Disposition {
    /// Disposition of a fact. A fact without support is removed whether or
    /// not it was asserted.
    pub fn for_fact(justification: &Justification) -> Self {
        match (justification.is_asserted(), justification.is_supported()) {
            (true, true) => Self::Demote,
            (false, true) => Self::Keep,
            (_, false) => Self::Remove,
        }
    }

    /// Disposition of a rule. Asserted rules are never removed and never
    /// demoted, even without support.
    pub fn for_rule(justification: &Justification) -> Self {
        if justification.is_asserted() || justification.is_supported() {
            Self::Keep
        } else {
            Self::Remove
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposition::Demote => write!(f, "demoted"),
            Disposition::Keep => write!(f, "kept"),
            Disposition::Remove => write!(f, "removed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Retraction report
// ---------------------------------------------------------------------------

/// Result of a retraction cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetractionReport {
    /// Disposition of the item the caller named.
    pub disposition: Disposition,
    /// Physically removed items; the named item first when it was removed.
    pub removed: Vec<ItemKey>,
    /// Items whose `asserted` flag was cleared, in evaluation order.
    pub demoted: Vec<ItemKey>,
    /// Maximum cascade depth reached (0 when nothing cascaded).
    pub cascade_depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(id: u64) -> FactId {
        FactId::new(id).unwrap()
    }

    fn rid(id: u64) -> RuleId {
        RuleId::new(id).unwrap()
    }

    #[test]
    fn fact_disposition_table() {
        let mut j = Justification::asserted();
        assert_eq!(Disposition::for_fact(&j), Disposition::Remove);

        j.supported_by.push(SupportEdge::new(fid(1), rid(2)));
        assert_eq!(Disposition::for_fact(&j), Disposition::Demote);

        j.asserted = false;
        assert_eq!(Disposition::for_fact(&j), Disposition::Keep);

        j.supported_by.clear();
        assert_eq!(Disposition::for_fact(&j), Disposition::Remove);
    }

    #[test]
    fn asserted_rule_is_kept_without_support() {
        let j = Justification::asserted();
        assert_eq!(Disposition::for_rule(&j), Disposition::Keep);

        let derived = Justification::derived(SupportEdge::new(fid(1), rid(2)));
        assert_eq!(Disposition::for_rule(&derived), Disposition::Keep);

        assert_eq!(
            Disposition::for_rule(&Justification::default()),
            Disposition::Remove
        );
    }

    #[test]
    fn strip_support_matches_either_endpoint() {
        let mut j = Justification::derived(SupportEdge::new(fid(1), rid(2)));
        j.supported_by.push(SupportEdge::new(fid(3), rid(4)));
        j.supported_by.push(SupportEdge::new(fid(5), rid(2)));

        let stripped = j.strip_support(ItemKey::Rule(rid(2)));
        assert_eq!(stripped.len(), 2);
        assert_eq!(j.supported_by(), &[SupportEdge::new(fid(3), rid(4))]);

        let stripped = j.strip_support(ItemKey::Fact(fid(3)));
        assert_eq!(stripped.len(), 1);
        assert!(!j.is_supported());
    }

    #[test]
    fn fact_and_rule_ids_do_not_collide_in_references() {
        let edge = SupportEdge::new(fid(7), rid(8));
        assert!(edge.references(ItemKey::Fact(fid(7))));
        assert!(!edge.references(ItemKey::Rule(rid(7))));
    }

    #[test]
    fn dependents_list_facts_before_rules() {
        let mut j = Justification::asserted();
        j.add_dependent(ItemKey::Rule(rid(2)));
        j.add_dependent(ItemKey::Fact(fid(9)));
        j.add_dependent(ItemKey::Fact(fid(3)));
        assert_eq!(
            j.dependents(),
            vec![
                ItemKey::Fact(fid(3)),
                ItemKey::Fact(fid(9)),
                ItemKey::Rule(rid(2))
            ]
        );

        j.remove_dependent(ItemKey::Fact(fid(9)));
        assert_eq!(j.supports_facts().len(), 1);
    }
}
