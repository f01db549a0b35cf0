//! Logical statements: predicates applied to constant and variable terms.
//!
//! A [`Statement`] is the unit the unifier matches and the instantiator
//! rewrites. Terms are flat: a constant or a `?`-prefixed variable.

pub mod unify;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

pub use unify::{Bindings, instantiate, unify};

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// A term in a statement: a constant or a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// A constant symbol (e.g., `cube`).
    Constant(String),
    /// A variable, stored without its `?` prefix.
    Variable(String),
}

impl Term {
    /// Create a constant term.
    ///
    /// Returns `None` for names that would not read back as the same
    /// constant: empty, `?`-prefixed, or containing whitespace or parentheses.
    pub fn constant(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let printable = !name.is_empty()
            && !name.starts_with('?')
            && !name.contains(|c: char| c.is_whitespace() || c == '(' || c == ')');
        printable.then_some(Self::Constant(name))
    }

    /// Create a variable term. A leading `?` is accepted and stripped.
    pub fn variable(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_prefix('?') {
            Some(bare) => Self::Variable(bare.to_string()),
            None => Self::Variable(name),
        }
    }

    /// Parse a term from a token. Variables start with `?`.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        match token.strip_prefix('?') {
            Some(var) => Self::Variable(var.to_string()),
            None => Self::Constant(token.to_string()),
        }
    }

    /// Returns `true` if this term is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// The bare name (no `?` prefix for variables).
    pub fn name(&self) -> &str {
        match self {
            Self::Constant(name) | Self::Variable(name) => name,
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Constant(name) => write!(f, "{name}"),
            Term::Variable(name) => write!(f, "?{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Statement
// ---------------------------------------------------------------------------

/// A predicate applied to an ordered sequence of terms, e.g. `(isa ?X block)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Statement {
    pub predicate: String,
    pub terms: Vec<Term>,
}

impl Statement {
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            terms,
        }
    }

    /// Number of terms after the predicate.
    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if no term is a variable.
    pub fn is_ground(&self) -> bool {
        !self.terms.iter().any(Term::is_variable)
    }

    /// Distinct variable names in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for term in &self.terms {
            if let Term::Variable(name) = term {
                if !seen.contains(&name.as_str()) {
                    seen.push(name.as_str());
                }
            }
        }
        seen
    }

    /// Parse `(pred t1 t2 ...)`, attributing errors to `line`.
    pub(crate) fn parse_at(text: &str, line: usize) -> Result<Self, ParseError> {
        let syntax = |message: String| ParseError::Syntax { line, message };

        let text = text.trim();
        let inner = text
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| syntax(format!("statement must be parenthesized: '{text}'")))?;
        if inner.contains(['(', ')']) {
            return Err(syntax(format!("nested terms are not supported: '{text}'")));
        }

        let mut tokens = inner.split_whitespace();
        let predicate = tokens
            .next()
            .ok_or_else(|| syntax("statement has no predicate: '()'".into()))?;
        if predicate.starts_with('?') {
            return Err(syntax(format!("predicate cannot be a variable: '{predicate}'")));
        }

        Ok(Self {
            predicate: predicate.to_string(),
            terms: tokens.map(Term::parse).collect(),
        })
    }
}

impl FromStr for Statement {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_at(s, 1)
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}", self.predicate)?;
        for term in &self.terms {
            write!(f, " {term}")?;
        }
        write!(f, ")")
    }
}
