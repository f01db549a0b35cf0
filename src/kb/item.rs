//! Stored item types: facts, rules, and their tagged sum.
//!
//! Equality and hashing look at logical content only. Two facts are equal
//! when their statements are; two rules when their antecedents and
//! consequent are. Justification state never takes part, which is what lets
//! `KnowledgeBase::assert` merge a re-derived item into the stored one.

use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{KbError, KbResult, ParseError};
use crate::logic::Statement;
use crate::tms::{Justification, Justified, SupportEdge};

// ---------------------------------------------------------------------------
// Fact
// ---------------------------------------------------------------------------

/// A statement held in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub(crate) statement: Statement,
    pub(crate) justification: Justification,
}

impl Fact {
    /// A fact claimed directly by the caller.
    pub fn new(statement: Statement) -> Self {
        Self {
            statement,
            justification: Justification::asserted(),
        }
    }

    /// A fact produced by one derivation.
    pub(crate) fn derived(statement: Statement, edge: SupportEdge) -> Self {
        Self {
            statement,
            justification: Justification::derived(edge),
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }
}

impl Justified for Fact {
    fn justification(&self) -> &Justification {
        &self.justification
    }

    fn justification_mut(&mut self) -> &mut Justification {
        &mut self.justification
    }
}

impl PartialEq for Fact {
    fn eq(&self, other: &Self) -> bool {
        self.statement == other.statement
    }
}

impl Eq for Fact {}

impl Hash for Fact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.statement.hash(state);
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fact: {}", self.statement)
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// An implication from ordered antecedents (`lhs`) to one consequent (`rhs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub(crate) lhs: Vec<Statement>,
    pub(crate) rhs: Statement,
    pub(crate) justification: Justification,
}

/// Logical content of a rule, used as its identity key.
pub type RuleContent = (Vec<Statement>, Statement);

impl Rule {
    /// A rule claimed directly by the caller. `lhs` must be non-empty.
    pub fn new(lhs: Vec<Statement>, rhs: Statement) -> KbResult<Self> {
        if lhs.is_empty() {
            return Err(KbError::EmptyRule {
                rhs: rhs.to_string(),
            });
        }
        Ok(Self {
            lhs,
            rhs,
            justification: Justification::asserted(),
        })
    }

    /// A partially satisfied rule produced by one derivation.
    pub(crate) fn derived(lhs: Vec<Statement>, rhs: Statement, edge: SupportEdge) -> Self {
        Self {
            lhs,
            rhs,
            justification: Justification::derived(edge),
        }
    }

    pub fn lhs(&self) -> &[Statement] {
        &self.lhs
    }

    pub fn rhs(&self) -> &Statement {
        &self.rhs
    }

    pub(crate) fn content(&self) -> RuleContent {
        (self.lhs.clone(), self.rhs.clone())
    }
}

impl Justified for Rule {
    fn justification(&self) -> &Justification {
        &self.justification
    }

    fn justification_mut(&mut self) -> &mut Justification {
        &mut self.justification
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.lhs == other.lhs && self.rhs == other.rhs
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lhs.hash(state);
        self.rhs.hash(state);
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule: (")?;
        for (i, st) in self.lhs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{st}")?;
        }
        write!(f, ") -> {}", self.rhs)
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// Either kind of stored item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    Fact(Fact),
    Rule(Rule),
}

impl Item {
    /// `"fact"` or `"rule"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Item::Fact(_) => "fact",
            Item::Rule(_) => "rule",
        }
    }
}

impl Justified for Item {
    fn justification(&self) -> &Justification {
        match self {
            Item::Fact(fact) => fact.justification(),
            Item::Rule(rule) => rule.justification(),
        }
    }

    fn justification_mut(&mut self) -> &mut Justification {
        match self {
            Item::Fact(fact) => fact.justification_mut(),
            Item::Rule(rule) => rule.justification_mut(),
        }
    }
}

impl From<Fact> for Item {
    fn from(fact: Fact) -> Self {
        Item::Fact(fact)
    }
}

impl From<Rule> for Item {
    fn from(rule: Rule) -> Self {
        Item::Rule(rule)
    }
}

impl From<Statement> for Item {
    fn from(statement: Statement) -> Self {
        Item::Fact(Fact::new(statement))
    }
}

impl FromStr for Item {
    type Err = ParseError;

    /// Parse a single `fact: ...` or `rule: ...` line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::loader::parse_item(s, 1)
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Item::Fact(fact) => write!(f, "{fact}"),
            Item::Rule(rule) => write!(f, "{rule}"),
        }
    }
}
