//! Query results: one answer per stored fact a query matched.

use serde::{Deserialize, Serialize};

use crate::ids::FactId;
use crate::logic::Bindings;

/// One match: the bindings it produced and the facts that witness it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub bindings: Bindings,
    pub witnesses: Vec<FactId>,
}

/// All answers to an `ask`, in fact insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    answers: Vec<Answer>,
}

impl QueryResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, bindings: Bindings, witnesses: Vec<FactId>) {
        self.answers.push(Answer {
            bindings,
            witnesses,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Answer> {
        self.answers.iter()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Answer;
    type IntoIter = std::slice::Iter<'a, Answer>;

    fn into_iter(self) -> Self::IntoIter {
        self.answers.iter()
    }
}

impl std::fmt::Display for QueryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, answer) in self.answers.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if answer.bindings.is_empty() {
                write!(f, "TRUE")?;
            } else {
                write!(f, "{}", answer.bindings)?;
            }
        }
        Ok(())
    }
}
