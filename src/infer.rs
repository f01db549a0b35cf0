//! Single-step forward inference.
//!
//! One step pairs a stored fact with a stored rule and unifies the fact with
//! the rule's first antecedent. On success:
//!
//! - a one-antecedent rule yields a fact: the instantiated consequent
//! - a longer rule yields a rule: the remaining antecedents and consequent,
//!   instantiated with the same bindings
//!
//! Either way the product carries one support edge `(fact, rule)` and both
//! parents gain a forward edge to it. The product is handed to
//! `KnowledgeBase::add`, so a re-derived item merges into the stored one.

use serde::{Deserialize, Serialize};

use crate::error::KbResult;
use crate::ids::{FactId, ItemKey, RuleId};
use crate::kb::{AssertStatus, Fact, Item, KnowledgeBase, Rule};
use crate::logic::{instantiate, unify};
use crate::tms::SupportEdge;

/// Result of one successful inference step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
    /// The stored item the product resolved to.
    pub key: ItemKey,
    /// Whether the product was new or merged into an existing item.
    pub status: AssertStatus,
    /// The support edge recorded for this step.
    pub edge: SupportEdge,
}

/// Forward-chaining inference engine.
///
/// Stateless; the knowledge base owns the agenda that decides which pairs
/// are tried.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferenceEngine;

impl InferenceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Try to derive a new item from `fact` and `rule`.
    ///
    /// Returns `Ok(None)` when the first antecedent does not unify with the
    /// fact, or when either parent is no longer stored.
    pub fn step(
        &self,
        fact: FactId,
        rule: RuleId,
        kb: &mut KnowledgeBase,
    ) -> KbResult<Option<Derivation>> {
        let (Some(f), Some(r)) = (kb.fact(fact), kb.rule(rule)) else {
            tracing::trace!(%fact, %rule, "skipping pair with a missing parent");
            return Ok(None);
        };
        tracing::trace!(fact = %f.statement(), rule = %r, "attempting inference");

        let Some((first, rest)) = r.lhs().split_first() else {
            return Ok(None);
        };
        let Some(bindings) = unify(first, f.statement()) else {
            return Ok(None);
        };

        let edge = SupportEdge::new(fact, rule);
        let rhs = instantiate(r.rhs(), &bindings);
        let product = if rest.is_empty() {
            Item::Fact(Fact::derived(rhs, edge))
        } else {
            let lhs = rest.iter().map(|st| instantiate(st, &bindings)).collect();
            Item::Rule(Rule::derived(lhs, rhs, edge))
        };
        tracing::debug!(%fact, %rule, product = %product, %bindings, "derived");

        let (key, status) = kb.add(product)?;
        kb.link(edge, key)?;
        Ok(Some(Derivation { key, status, edge }))
    }
}
