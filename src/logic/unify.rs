//! Structural matching and substitution.
//!
//! [`unify`] matches two statements term by term. A variable on either side
//! binds to the opposite term; both sides share one binding namespace, and a
//! variable that is already bound must meet an equal term. Constants only
//! match equal constants. [`instantiate`] applies the resulting substitution,
//! leaving unbound variables in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Statement, Term};

/// Variable bindings produced by one successful match.
///
/// Keys are bare variable names (no `?`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    map: BTreeMap<String, Term>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The term a variable is bound to, if any.
    pub fn bound_to(&self, variable: &str) -> Option<&Term> {
        self.map.get(variable)
    }

    /// Bind `variable` to `value` unless it is already bound.
    ///
    /// Returns `false` when an existing binding disagrees with `value`.
    pub fn test_and_bind(&mut self, variable: &str, value: &Term) -> bool {
        match self.map.get(variable) {
            Some(existing) => existing == value,
            None => {
                self.map.insert(variable.to_string(), value.clone());
                true
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Iterate `(variable, term)` pairs in variable-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl std::fmt::Display for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (var, term) in &self.map {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "?{var} : {term}")?;
            first = false;
        }
        Ok(())
    }
}

/// Match `pattern` against `candidate`.
///
/// Returns `None` on a predicate or arity mismatch, on differing constants,
/// or when a variable would need two different values.
pub fn unify(pattern: &Statement, candidate: &Statement) -> Option<Bindings> {
    if pattern.predicate != candidate.predicate || pattern.arity() != candidate.arity() {
        return None;
    }

    let mut bindings = Bindings::new();
    for (left, right) in pattern.terms.iter().zip(&candidate.terms) {
        let consistent = match (left, right) {
            (Term::Variable(var), value) => bindings.test_and_bind(var, value),
            (value, Term::Variable(var)) => bindings.test_and_bind(var, value),
            (a, b) => a == b,
        };
        if !consistent {
            return None;
        }
    }
    Some(bindings)
}

/// Apply `bindings` to `statement`. Unbound variables are kept as-is.
pub fn instantiate(statement: &Statement, bindings: &Bindings) -> Statement {
    let terms = statement
        .terms
        .iter()
        .map(|term| match term {
            Term::Variable(var) => bindings.bound_to(var).cloned().unwrap_or_else(|| term.clone()),
            Term::Constant(_) => term.clone(),
        })
        .collect();
    Statement::new(statement.predicate.clone(), terms)
}
