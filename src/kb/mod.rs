//! Knowledge base: fact and rule arenas with forward chaining on assert.
//!
//! `assert` inserts or merges an item and, on first insertion, runs the
//! inference engine against every complementary stored item until no new
//! item appears. `ask` matches a fact-shaped query against stored facts.
//! `retract` (in `retract.rs`) removes an item and cascades along its
//! forward edges.

mod item;
mod query;
mod retract;

pub use item::{Fact, Item, Rule, RuleContent};
pub use query::{Answer, QueryResult};

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{KbError, KbResult};
use crate::ids::{FactId, IdAllocator, ItemKey, RuleId};
use crate::infer::InferenceEngine;
use crate::logic::{Statement, unify};
use crate::tms::{Justification, Justified, SupportEdge};

/// How an `assert` changed the stored item it resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssertStatus {
    /// No equal item was stored; it was inserted and forward chaining ran.
    Inserted,
    /// An equal unasserted item was stored and is now asserted.
    Promoted,
    /// An equal item was stored; the incoming support edges were appended.
    SupportAdded,
    /// An equal asserted item was already stored.
    Unchanged,
}

/// Outcome of one `assert` call, including everything it derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertReport {
    /// The stored item the asserted item resolved to.
    pub key: ItemKey,
    pub status: AssertStatus,
    /// Facts newly inserted by forward chaining during this call.
    pub derived_facts: usize,
    /// Rules newly inserted by forward chaining during this call.
    pub derived_rules: usize,
}

/// The knowledge base.
///
/// Items live in arenas keyed by monotonically allocated ids, so iteration
/// follows insertion order. Content indexes enforce that no two stored facts
/// share a statement and no two stored rules share `(lhs, rhs)`.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    config: EngineConfig,
    ids: IdAllocator,
    facts: BTreeMap<FactId, Fact>,
    rules: BTreeMap<RuleId, Rule>,
    fact_index: HashMap<Statement, FactId>,
    rule_index: HashMap<RuleContent, RuleId>,
    engine: InferenceEngine,
    /// Pending `(fact, rule)` inference attempts.
    agenda: VecDeque<(FactId, RuleId)>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ids: IdAllocator::new(),
            facts: BTreeMap::new(),
            rules: BTreeMap::new(),
            fact_index: HashMap::new(),
            rule_index: HashMap::new(),
            engine: InferenceEngine::new(),
            agenda: VecDeque::new(),
        }
    }

    /// Create a knowledge base from owned initial facts and rules.
    ///
    /// Every item is asserted in order (facts first), so the result is
    /// already closed under forward chaining.
    pub fn with_items(config: EngineConfig, facts: Vec<Fact>, rules: Vec<Rule>) -> KbResult<Self> {
        let mut kb = Self::new(config);
        kb.load(facts.into_iter().map(Item::Fact))?;
        kb.load(rules.into_iter().map(Item::Rule))?;
        Ok(kb)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Assert every item in order; returns how many were newly inserted.
    pub fn load(&mut self, items: impl IntoIterator<Item = Item>) -> KbResult<usize> {
        let mut inserted = 0;
        for item in items {
            if self.assert(item)?.status == AssertStatus::Inserted {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    // -----------------------------------------------------------------------
    // Assert
    // -----------------------------------------------------------------------

    /// Assert a fact or rule.
    ///
    /// A new item is stored and chained against every complementary stored
    /// item until a fixpoint. An already-stored equal item is merged: incoming
    /// support edges are appended, otherwise the stored item becomes asserted.
    ///
    /// A caller assertion is always a direct claim: whatever justification
    /// state the incoming item carries is replaced by `asserted`.
    pub fn assert(&mut self, item: impl Into<Item>) -> KbResult<AssertReport> {
        let mut item = item.into();
        *item.justification_mut() = Justification::asserted();
        tracing::debug!(item = %item, "asserting");

        let (key, status) = self.add(item)?;
        let mut report = AssertReport {
            key,
            status,
            derived_facts: 0,
            derived_rules: 0,
        };
        self.run_agenda(&mut report)?;
        self.verify()?;
        Ok(report)
    }

    /// Insert-or-merge without draining the agenda.
    ///
    /// A new item schedules one inference attempt against each complementary
    /// item stored at this moment.
    pub(crate) fn add(&mut self, mut item: Item) -> KbResult<(ItemKey, AssertStatus)> {
        if let Some(key) = self.lookup(&item) {
            let incoming = std::mem::take(&mut item.justification_mut().supported_by);
            let stored = self.justification_mut(key).ok_or_else(|| KbError::Integrity {
                message: format!("{key} is indexed but not stored"),
            })?;
            let status = if !incoming.is_empty() {
                stored.supported_by.extend(incoming);
                AssertStatus::SupportAdded
            } else if stored.asserted {
                AssertStatus::Unchanged
            } else {
                stored.asserted = true;
                AssertStatus::Promoted
            };
            tracing::debug!(%key, ?status, "merged into stored item");
            return Ok((key, status));
        }

        let key = match item {
            Item::Fact(fact) => {
                let id = self.ids.next_fact()?;
                self.agenda
                    .extend(self.rules.keys().map(|&rule| (id, rule)));
                self.fact_index.insert(fact.statement.clone(), id);
                self.facts.insert(id, fact);
                ItemKey::Fact(id)
            }
            Item::Rule(rule) => {
                let id = self.ids.next_rule()?;
                self.agenda
                    .extend(self.facts.keys().map(|&fact| (fact, id)));
                self.rule_index.insert(rule.content(), id);
                self.rules.insert(id, rule);
                ItemKey::Rule(id)
            }
        };
        tracing::debug!(%key, "inserted");
        Ok((key, AssertStatus::Inserted))
    }

    /// Record forward edges from both endpoints of `edge` to `derived`.
    pub(crate) fn link(&mut self, edge: SupportEdge, derived: ItemKey) -> KbResult<()> {
        for endpoint in edge.endpoints() {
            self.justification_mut(endpoint)
                .ok_or_else(|| KbError::Integrity {
                    message: format!("support edge names missing {endpoint}"),
                })?
                .add_dependent(derived);
        }
        Ok(())
    }

    /// Drain the agenda: the forward-chaining fixpoint.
    fn run_agenda(&mut self, report: &mut AssertReport) -> KbResult<()> {
        let engine = self.engine;
        let limit = self.config.max_derivations;
        let mut productions = 0;

        while let Some((fact, rule)) = self.agenda.pop_front() {
            let derivation = match engine.step(fact, rule, self) {
                Ok(Some(derivation)) => derivation,
                Ok(None) => continue,
                Err(e) => {
                    self.agenda.clear();
                    return Err(e);
                }
            };
            productions += 1;
            if derivation.status == AssertStatus::Inserted {
                match derivation.key {
                    ItemKey::Fact(_) => report.derived_facts += 1,
                    ItemKey::Rule(_) => report.derived_rules += 1,
                }
            }
            if productions >= limit && !self.agenda.is_empty() {
                self.agenda.clear();
                tracing::warn!(limit, "derivation limit reached, forward chaining stopped");
                return Err(KbError::FixpointLimit { limit });
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Ask
    // -----------------------------------------------------------------------

    /// Ask a fact-shaped query.
    ///
    /// A rule-shaped query is logged and returned as `Err(InvalidQuery)`
    /// rather than an empty result, so callers can tell "no match" from
    /// "not a query". Nothing is mutated either way.
    pub fn ask(&self, query: &Item) -> KbResult<QueryResult> {
        match query {
            Item::Fact(fact) => Ok(self.ask_statement(&fact.statement)),
            Item::Rule(rule) => {
                tracing::warn!(query = %rule, "invalid ask");
                Err(KbError::InvalidQuery {
                    query: rule.to_string(),
                })
            }
        }
    }

    /// Match `query` against every stored fact; one answer per match.
    pub fn ask_statement(&self, query: &Statement) -> QueryResult {
        tracing::debug!(%query, "asking");
        let mut result = QueryResult::new();
        for (&id, fact) in &self.facts {
            if let Some(bindings) = unify(query, &fact.statement) {
                result.add(bindings, vec![id]);
            }
        }
        result
    }

    // -----------------------------------------------------------------------
    // Lookup and introspection
    // -----------------------------------------------------------------------

    /// The stored item equal to `item`, if any.
    pub fn lookup(&self, item: &Item) -> Option<ItemKey> {
        match item {
            Item::Fact(fact) => self.lookup_fact(&fact.statement).map(ItemKey::Fact),
            Item::Rule(rule) => self
                .rule_index
                .get(&(rule.lhs.clone(), rule.rhs.clone()))
                .copied()
                .map(ItemKey::Rule),
        }
    }

    /// The stored fact with this statement, if any.
    pub fn lookup_fact(&self, statement: &Statement) -> Option<FactId> {
        self.fact_index.get(statement).copied()
    }

    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(&id)
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    /// Clone of the stored item under `key`.
    pub fn item(&self, key: ItemKey) -> Option<Item> {
        match key {
            ItemKey::Fact(id) => self.fact(id).cloned().map(Item::Fact),
            ItemKey::Rule(id) => self.rule(id).cloned().map(Item::Rule),
        }
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        match key {
            ItemKey::Fact(id) => self.facts.contains_key(&id),
            ItemKey::Rule(id) => self.rules.contains_key(&id),
        }
    }

    pub fn justification(&self, key: ItemKey) -> Option<&Justification> {
        match key {
            ItemKey::Fact(id) => self.facts.get(&id).map(Justified::justification),
            ItemKey::Rule(id) => self.rules.get(&id).map(Justified::justification),
        }
    }

    pub(crate) fn justification_mut(&mut self, key: ItemKey) -> Option<&mut Justification> {
        match key {
            ItemKey::Fact(id) => self.facts.get_mut(&id).map(Justified::justification_mut),
            ItemKey::Rule(id) => self.rules.get_mut(&id).map(Justified::justification_mut),
        }
    }

    /// Stored facts in insertion order.
    pub fn facts(&self) -> impl Iterator<Item = (FactId, &Fact)> {
        self.facts.iter().map(|(&id, fact)| (id, fact))
    }

    /// Stored rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().map(|(&id, rule)| (id, rule))
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    // -----------------------------------------------------------------------
    // Integrity
    // -----------------------------------------------------------------------

    fn verify(&self) -> KbResult<()> {
        if self.config.verify_integrity {
            self.check_integrity()?;
        }
        Ok(())
    }

    /// Check every provenance invariant.
    ///
    /// - indexes and arenas agree (identity)
    /// - every stored item is asserted or supported
    /// - every support edge names stored items whose forward edges point back
    /// - every forward edge points at a stored item with a support edge naming
    ///   its origin
    pub fn check_integrity(&self) -> KbResult<()> {
        let broken = |message: String| Err(KbError::Integrity { message });

        if self.fact_index.len() != self.facts.len() || self.rule_index.len() != self.rules.len() {
            return broken("content index and arena sizes differ".into());
        }
        for (statement, &id) in &self.fact_index {
            if self.facts.get(&id).map(Fact::statement) != Some(statement) {
                return broken(format!("fact index entry {statement} -> {id} is stale"));
            }
        }
        for (content, &id) in &self.rule_index {
            if self.rules.get(&id).map(Rule::content).as_ref() != Some(content) {
                return broken(format!("rule index entry for {id} is stale"));
            }
        }

        let keys = self
            .facts
            .keys()
            .map(|&id| ItemKey::Fact(id))
            .chain(self.rules.keys().map(|&id| ItemKey::Rule(id)));
        for key in keys {
            let Some(j) = self.justification(key) else {
                return broken(format!("{key} disappeared during the check"));
            };
            if !j.is_asserted() && !j.is_supported() {
                return broken(format!("{key} is neither asserted nor supported"));
            }
            for edge in j.supported_by() {
                for endpoint in edge.endpoints() {
                    match self.justification(endpoint) {
                        None => return broken(format!("{key} is supported by missing {endpoint}")),
                        Some(origin) if !origin.dependents().contains(&key) => {
                            return broken(format!("{endpoint} lacks a forward edge to {key}"));
                        }
                        Some(_) => {}
                    }
                }
            }
            for dependent in j.dependents() {
                match self.justification(dependent) {
                    None => return broken(format!("{key} has a forward edge to missing {dependent}")),
                    Some(target) if !target.is_supported_via(key) => {
                        return broken(format!("{dependent} has no support edge naming {key}"));
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Knowledge Base:")?;
        for (id, fact) in self.facts() {
            writeln!(f, "  {id}  {}  {fact}", status_flags(fact))?;
        }
        for (id, rule) in self.rules() {
            writeln!(f, "  {id}  {}  {rule}", status_flags(rule))?;
        }
        Ok(())
    }
}

/// `A` for asserted, `S<n>` for n support edges.
fn status_flags(item: &impl Justified) -> String {
    let asserted = if item.is_asserted() { "A" } else { "-" };
    format!("{asserted} S{}", item.supported_by().len())
}
