//! Thread-safe handle around a [`KnowledgeBase`].
//!
//! Assert and retract cascades touch many items at once, so each one runs to
//! completion under the write lock. Queries and explanations take the read
//! lock.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{KbError, KbResult};
use crate::ids::ItemKey;
use crate::kb::{AssertReport, Item, KnowledgeBase, QueryResult};
use crate::logic::Statement;
use crate::provenance::Explanation;
use crate::tms::RetractionReport;

/// Cloneable, shareable knowledge base.
#[derive(Debug, Clone, Default)]
pub struct SharedKnowledgeBase {
    inner: Arc<RwLock<KnowledgeBase>>,
}

impl SharedKnowledgeBase {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self {
            inner: Arc::new(RwLock::new(kb)),
        }
    }

    fn read(&self) -> KbResult<RwLockReadGuard<'_, KnowledgeBase>> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> KbResult<RwLockWriteGuard<'_, KnowledgeBase>> {
        self.inner.write().map_err(|_| poisoned())
    }

    pub fn assert(&self, item: impl Into<Item>) -> KbResult<AssertReport> {
        self.write()?.assert(item)
    }

    pub fn retract(&self, item: &Item) -> KbResult<RetractionReport> {
        self.write()?.retract(item)
    }

    pub fn ask(&self, query: &Item) -> KbResult<QueryResult> {
        self.read()?.ask(query)
    }

    pub fn ask_statement(&self, query: &Statement) -> KbResult<QueryResult> {
        Ok(self.read()?.ask_statement(query))
    }

    pub fn explain(&self, key: ItemKey) -> KbResult<Option<Explanation>> {
        Ok(self.read()?.explain(key))
    }

    /// Run `f` with shared access to the knowledge base.
    pub fn with_read<T>(&self, f: impl FnOnce(&KnowledgeBase) -> T) -> KbResult<T> {
        Ok(f(&*self.read()?))
    }
}

impl From<KnowledgeBase> for SharedKnowledgeBase {
    fn from(kb: KnowledgeBase) -> Self {
        Self::new(kb)
    }
}

fn poisoned() -> KbError {
    tracing::warn!("knowledge base lock poisoned");
    KbError::Integrity {
        message: "knowledge base lock poisoned by a panicking writer".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::kb::{Fact, Rule};

    fn st(s: &str) -> Statement {
        s.parse().unwrap()
    }

    #[test]
    fn concurrent_asserts_keep_graph_consistent() {
        let shared = SharedKnowledgeBase::new(KnowledgeBase::new(EngineConfig::strict()));
        shared
            .assert(Rule::new(vec![st("(n ?X)")], st("(m ?X)")).unwrap())
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let fact = Fact::new(st(&format!("(n t{t}_{i})")));
                        shared.assert(fact).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let (facts, ok) = shared
            .with_read(|kb| (kb.fact_count(), kb.check_integrity().is_ok()))
            .unwrap();
        assert_eq!(facts, 200);
        assert!(ok);
        assert_eq!(shared.ask_statement(&st("(m ?X)")).unwrap().len(), 100);
    }

    #[test]
    fn poisoned_lock_is_an_integrity_error() {
        let shared = SharedKnowledgeBase::default();
        let clone = shared.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.inner.write().unwrap();
            panic!("writer panicked");
        })
        .join();

        let err = shared.ask_statement(&st("(p ?X)")).unwrap_err();
        assert!(matches!(err, KbError::Integrity { .. }));
    }
}
