//! Provenance explanation: why an item is in the knowledge base.
//!
//! [`KnowledgeBase::explain`] walks `supported_by` edges back to asserted
//! items and returns the result as a tree. Support can be cyclic (a later
//! derivation may add an edge to an item its own parents depend on), so an
//! item already on the current path becomes a back-reference leaf.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::ItemKey;
use crate::kb::KnowledgeBase;

/// One node of an explanation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub key: ItemKey,
    /// Rendered item (`fact: ...` / `rule: ...`).
    pub item: String,
    pub asserted: bool,
    /// `true` when this node repeats an ancestor; its support is not expanded.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub back_reference: bool,
    /// One branch per support edge, in recording order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub support: Vec<SupportBranch>,
}

/// The two parents of one derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportBranch {
    pub fact: Explanation,
    pub rule: Explanation,
}

impl Explanation {
    /// Number of nodes in the tree, back-references included.
    pub fn node_count(&self) -> usize {
        1 + self
            .support
            .iter()
            .map(|b| b.fact.node_count() + b.rule.node_count())
            .sum::<usize>()
    }

    /// Longest path from this node to a leaf, in derivation steps.
    pub fn depth(&self) -> usize {
        self.support
            .iter()
            .map(|b| 1 + b.fact.depth().max(b.rule.depth()))
            .max()
            .unwrap_or(0)
    }

    fn render(&self, f: &mut std::fmt::Formatter<'_>, indent: usize) -> std::fmt::Result {
        let pad = "  ".repeat(indent);
        let status = match (self.back_reference, self.asserted) {
            (true, _) => "cycle",
            (false, true) => "asserted",
            (false, false) => "derived",
        };
        writeln!(f, "{pad}{} {} [{status}]", self.key, self.item)?;
        for branch in &self.support {
            writeln!(f, "{pad}  via {} + {}", branch.fact.key, branch.rule.key)?;
            branch.fact.render(f, indent + 2)?;
            branch.rule.render(f, indent + 2)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Explanation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.render(f, 0)
    }
}

impl KnowledgeBase {
    /// Explain how `key` is justified. `None` if it is not stored.
    pub fn explain(&self, key: ItemKey) -> Option<Explanation> {
        let mut path = BTreeSet::new();
        self.explain_inner(key, &mut path)
    }

    fn explain_inner(&self, key: ItemKey, path: &mut BTreeSet<ItemKey>) -> Option<Explanation> {
        let item = self.item(key)?;
        let justification = self.justification(key)?;

        if !path.insert(key) {
            return Some(Explanation {
                key,
                item: item.to_string(),
                asserted: justification.is_asserted(),
                back_reference: true,
                support: Vec::new(),
            });
        }

        let support = justification
            .supported_by()
            .iter()
            .filter_map(|edge| {
                Some(SupportBranch {
                    fact: self.explain_inner(edge.fact.into(), path)?,
                    rule: self.explain_inner(edge.rule.into(), path)?,
                })
            })
            .collect();
        path.remove(&key);

        Some(Explanation {
            key,
            item: item.to_string(),
            asserted: justification.is_asserted(),
            back_reference: false,
            support,
        })
    }
}
