//! Retraction with cascading re-evaluation of dependents.
//!
//! The named item gets a disposition from its own justification state. Only a
//! physical removal cascades: each dependent loses the support edges naming the
//! removed item and is then re-evaluated with the same table. The cascade is a
//! FIFO worklist rather than recursion.

use std::collections::VecDeque;

use crate::error::{KbError, KbResult};
use crate::ids::ItemKey;
use crate::tms::{Disposition, Justification, RetractionReport};

use super::{Item, KnowledgeBase};

impl KnowledgeBase {
    /// Retract the stored item equal to `item`.
    ///
    /// Returns `NotFound` (and changes nothing) when no equal item is stored.
    pub fn retract(&mut self, item: &Item) -> KbResult<RetractionReport> {
        tracing::debug!(item = %item, "retracting");
        let Some(key) = self.lookup(item) else {
            tracing::warn!(item = %item, "retraction target not found");
            return Err(KbError::NotFound {
                item: item.to_string(),
            });
        };
        self.retract_key(key)
    }

    /// Retract the stored item with arena id `key`.
    pub fn retract_key(&mut self, key: ItemKey) -> KbResult<RetractionReport> {
        let Some(j) = self.justification(key) else {
            return Err(KbError::NotFound {
                item: key.to_string(),
            });
        };

        let mut report = RetractionReport {
            disposition: disposition_of(key, j),
            removed: Vec::new(),
            demoted: Vec::new(),
            cascade_depth: 0,
        };

        let mut worklist: VecDeque<(ItemKey, usize)> = VecDeque::from([(key, 0)]);
        while let Some((current, depth)) = worklist.pop_front() {
            let Some(j) = self.justification(current) else {
                tracing::trace!(item = %current, "already removed, skipping");
                continue;
            };

            match disposition_of(current, j) {
                Disposition::Keep => {
                    tracing::trace!(item = %current, "still justified, kept");
                }
                Disposition::Demote => {
                    if let Some(j) = self.justification_mut(current) {
                        j.asserted = false;
                    }
                    tracing::debug!(item = %current, "demoted");
                    report.demoted.push(current);
                }
                Disposition::Remove => {
                    let dependents = self.remove_item(current)?;
                    tracing::debug!(item = %current, depth, dependents = dependents.len(), "removed");
                    report.removed.push(current);
                    report.cascade_depth = report.cascade_depth.max(depth);

                    for dependent in dependents {
                        if self.detach(current, dependent)? {
                            worklist.push_back((dependent, depth + 1));
                        }
                    }
                }
            }
        }

        self.verify()?;
        Ok(report)
    }

    /// Physically remove `key` from its arena and index, unlink it from the
    /// parents that derived it, and return its forward edges.
    fn remove_item(&mut self, key: ItemKey) -> KbResult<Vec<ItemKey>> {
        let justification: Justification = match key {
            ItemKey::Fact(id) => {
                let fact = self.facts.remove(&id).ok_or_else(|| missing(key))?;
                self.fact_index.remove(&fact.statement);
                fact.justification
            }
            ItemKey::Rule(id) => {
                let rule = self.rules.remove(&id).ok_or_else(|| missing(key))?;
                self.rule_index.remove(&rule.content());
                rule.justification
            }
        };

        for edge in justification.supported_by() {
            for parent in edge.endpoints() {
                if let Some(j) = self.justification_mut(parent) {
                    j.remove_dependent(key);
                }
            }
        }
        Ok(justification.dependents())
    }

    /// Strip every support edge naming `removed` from `dependent`.
    ///
    /// The surviving endpoint of each stripped edge loses its forward edge to
    /// `dependent` unless another edge still joins them. Returns `false` when
    /// `dependent` is no longer stored.
    fn detach(&mut self, removed: ItemKey, dependent: ItemKey) -> KbResult<bool> {
        let Some(j) = self.justification_mut(dependent) else {
            return Ok(false);
        };
        let stripped = j.strip_support(removed);
        let partners: Vec<ItemKey> = stripped
            .iter()
            .flat_map(|edge| edge.endpoints())
            .filter(|&endpoint| endpoint != removed && !j.is_supported_via(endpoint))
            .collect();

        for partner in partners {
            if let Some(pj) = self.justification_mut(partner) {
                pj.remove_dependent(dependent);
            }
        }
        Ok(true)
    }
}

fn disposition_of(key: ItemKey, justification: &Justification) -> Disposition {
    match key {
        ItemKey::Fact(_) => Disposition::for_fact(justification),
        ItemKey::Rule(_) => Disposition::for_rule(justification),
    }
}

fn missing(key: ItemKey) -> KbError {
    KbError::Integrity {
        message: format!("{key} vanished during retraction"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::kb::{Fact, Rule};
    use crate::logic::Statement;

    fn st(s: &str) -> Statement {
        s.parse().unwrap()
    }

    fn fact(s: &str) -> Item {
        Item::Fact(Fact::new(st(s)))
    }

    fn rule(lhs: &[&str], rhs: &str) -> Item {
        Item::Rule(Rule::new(lhs.iter().map(|s| st(s)).collect(), st(rhs)).unwrap())
    }

    fn kb() -> KnowledgeBase {
        KnowledgeBase::new(EngineConfig::strict())
    }

    #[test]
    fn unknown_item_is_not_found() {
        let mut kb = kb();
        kb.assert(fact("(pred a)")).unwrap();
        let err = kb.retract(&fact("(pred b)")).unwrap_err();
        assert!(matches!(err, KbError::NotFound { .. }));
        assert_eq!(kb.fact_count(), 1);
    }

    #[test]
    fn removal_cascades_along_chain() {
        let mut kb = kb();
        kb.assert(rule(&["(a ?X)"], "(b ?X)")).unwrap();
        kb.assert(rule(&["(b ?X)"], "(c ?X)")).unwrap();
        kb.assert(fact("(a one)")).unwrap();
        assert_eq!(kb.fact_count(), 3);

        let report = kb.retract(&fact("(a one)")).unwrap();
        assert_eq!(report.disposition, Disposition::Remove);
        assert_eq!(report.removed.len(), 3);
        assert_eq!(report.cascade_depth, 2);
        assert_eq!(kb.fact_count(), 0);
        assert_eq!(kb.rule_count(), 2);
    }

    #[test]
    fn asserted_supported_fact_is_demoted_only() {
        let mut kb = kb();
        kb.assert(rule(&["(p ?X)"], "(q ?X)")).unwrap();
        kb.assert(fact("(p a)")).unwrap();
        kb.assert(fact("(q a)")).unwrap();

        let report = kb.retract(&fact("(q a)")).unwrap();
        assert_eq!(report.disposition, Disposition::Demote);
        assert!(report.removed.is_empty());

        let id = kb.lookup_fact(&st("(q a)")).unwrap();
        assert!(!kb.fact(id).unwrap().justification.is_asserted());
    }

    #[test]
    fn derived_fact_retraction_is_a_no_op() {
        let mut kb = kb();
        kb.assert(rule(&["(p ?X)"], "(q ?X)")).unwrap();
        kb.assert(fact("(p a)")).unwrap();

        let report = kb.retract(&fact("(q a)")).unwrap();
        assert_eq!(report.disposition, Disposition::Keep);
        assert!(report.removed.is_empty() && report.demoted.is_empty());
        assert_eq!(kb.fact_count(), 2);
    }

    #[test]
    fn alternate_support_survives_cascade() {
        let mut kb = kb();
        kb.assert(rule(&["(p ?X)"], "(goal ?X)")).unwrap();
        kb.assert(rule(&["(r ?X)"], "(goal ?X)")).unwrap();
        kb.assert(fact("(p a)")).unwrap();
        kb.assert(fact("(r a)")).unwrap();

        let report = kb.retract(&fact("(p a)")).unwrap();
        assert_eq!(report.removed.len(), 1);

        let goal = kb.lookup_fact(&st("(goal a)")).unwrap();
        assert_eq!(kb.fact(goal).unwrap().justification.supported_by().len(), 1);
    }

    #[test]
    fn unsupported_derived_rule_is_removed_with_its_fact() {
        let mut kb = kb();
        kb.assert(rule(&["(p ?X)", "(r ?X)"], "(s ?X)")).unwrap();
        kb.assert(fact("(p a)")).unwrap();
        assert_eq!(kb.rule_count(), 2);

        let report = kb.retract(&fact("(p a)")).unwrap();
        assert_eq!(report.removed.len(), 2);
        assert_eq!(kb.rule_count(), 1);
    }

    #[test]
    fn asserted_rule_is_never_removed() {
        let mut kb = kb();
        kb.assert(rule(&["(p ?X)"], "(q ?X)")).unwrap();
        let report = kb.retract(&rule(&["(p ?X)"], "(q ?X)")).unwrap();
        assert_eq!(report.disposition, Disposition::Keep);
        assert_eq!(kb.rule_count(), 1);
    }

    #[test]
    fn retract_key_reports_missing_ids() {
        let mut kb = kb();
        let key = kb.assert(fact("(p a)")).unwrap().key;
        kb.retract_key(key).unwrap();
        assert!(matches!(
            kb.retract_key(key),
            Err(KbError::NotFound { .. })
        ));
    }
}
