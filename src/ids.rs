//! Arena identifiers for stored facts and rules.
//!
//! Facts and rules reference each other through support edges and forward
//! edges. Those edges are stored as [`FactId`] / [`RuleId`] pairs rather than
//! references, so the provenance graph never forms an ownership cycle.
//! The [`IdAllocator`] hands out ids in insertion order.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::error::{KbError, KbResult};

/// Arena id of a stored fact.
///
/// Uses `NonZeroU64` so that `Option<FactId>` is the same size as `FactId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FactId(NonZeroU64);

/// Arena id of a stored rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RuleId(NonZeroU64);

impl FactId {
    /// Create a `FactId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(FactId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl RuleId {
    /// Create a `RuleId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(RuleId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for FactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fact#{}", self.0)
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule#{}", self.0)
    }
}

/// Id of any stored item: the tagged sum over the two arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKey {
    Fact(FactId),
    Rule(RuleId),
}

impl From<FactId> for ItemKey {
    fn from(id: FactId) -> Self {
        ItemKey::Fact(id)
    }
}

impl From<RuleId> for ItemKey {
    fn from(id: RuleId) -> Self {
        ItemKey::Rule(id)
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKey::Fact(id) => write!(f, "{id}"),
            ItemKey::Rule(id) => write!(f, "{id}"),
        }
    }
}

/// Monotonic id allocator shared by both arenas.
///
/// Facts and rules draw from one sequence, so ids also record global
/// insertion order.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Create a new allocator that starts from 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    fn next_raw(&mut self) -> KbResult<NonZeroU64> {
        let raw = NonZeroU64::new(self.next).ok_or(KbError::IdsExhausted)?;
        self.next = self.next.checked_add(1).unwrap_or(0);
        Ok(raw)
    }

    /// Allocate the next fact id.
    pub fn next_fact(&mut self) -> KbResult<FactId> {
        self.next_raw().map(FactId)
    }

    /// Allocate the next rule id.
    pub fn next_rule(&mut self) -> KbResult<RuleId> {
        self.next_raw().map(RuleId)
    }

    /// Return the next raw id that *would* be allocated, without consuming it.
    pub fn peek_next(&self) -> u64 {
        self.next
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
