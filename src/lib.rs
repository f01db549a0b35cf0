// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # forward-tms
//!
//! A forward-chaining rule engine with truth maintenance.
//!
//! Facts and rules are asserted into a [`KnowledgeBase`](kb::KnowledgeBase).
//! Every new item is unified against the complementary stored items and each
//! match derives a new fact or a partially satisfied rule, until a fixpoint.
//! Every stored item records why it is believed, so retraction can cascade
//! exactly to the items that lose their last justification.
//!
//! ## Architecture
//!
//! - **Logic** (`logic`): statements, terms, the unifier and instantiation
//! - **Knowledge base** (`kb`): arenas, merge-on-assert, `ask`, retraction cascade
//! - **Inference** (`infer`): the single-step production rule
//! - **Truth maintenance** (`tms`): support edges, justification state, dispositions
//! - **Provenance** (`provenance`): explanation trees over support edges
//! - **Loader** (`loader`): line-oriented text corpora
//!
//! ## Library usage
//!
//! ```
//! use forward_tms::config::EngineConfig;
//! use forward_tms::kb::{Item, KnowledgeBase};
//!
//! let mut kb = KnowledgeBase::new(EngineConfig::default());
//! kb.assert("rule: ((pred ?X)) -> (q ?X)".parse::<Item>().unwrap()).unwrap();
//! kb.assert("fact: (pred a)".parse::<Item>().unwrap()).unwrap();
//!
//! let answers = kb.ask(&"fact: (q ?Y)".parse::<Item>().unwrap()).unwrap();
//! assert_eq!(answers.to_string(), "?Y : a");
//! ```

pub mod config;
pub mod error;
pub mod ids;
pub mod infer;
pub mod kb;
pub mod loader;
pub mod logic;
pub mod provenance;
pub mod sync;
pub mod tms;
