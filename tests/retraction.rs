//! Retraction cascade properties.

use forward_tms::config::EngineConfig;
use forward_tms::error::KbError;
use forward_tms::kb::{Item, KnowledgeBase};
use forward_tms::logic::Statement;
use forward_tms::sync::SharedKnowledgeBase;
use forward_tms::tms::{Disposition, Justified};

fn strict_kb() -> KnowledgeBase {
    KnowledgeBase::new(EngineConfig::strict())
}

fn item(text: &str) -> Item {
    text.parse().unwrap()
}

fn st(text: &str) -> Statement {
    text.parse().unwrap()
}

fn stored_facts(kb: &KnowledgeBase) -> Vec<String> {
    let mut facts: Vec<String> = kb.facts().map(|(_, f)| f.statement().to_string()).collect();
    facts.sort();
    facts
}

#[test]
fn retraction_removes_exactly_unsupported_dependents() {
    let mut kb = strict_kb();
    kb.assert(item("rule: ((a ?X)) -> (b ?X)")).unwrap();
    kb.assert(item("rule: ((b ?X)) -> (c ?X)")).unwrap();
    kb.assert(item("rule: ((d ?X)) -> (c ?X)")).unwrap();
    kb.assert(item("fact: (a one)")).unwrap();
    kb.assert(item("fact: (d one)")).unwrap();
    kb.assert(item("fact: (a two)")).unwrap();

    let report = kb.retract(&item("fact: (a one)")).unwrap();
    assert_eq!(report.disposition, Disposition::Remove);
    assert_eq!(report.removed.len(), 2);

    // (c one) keeps its support through (d one).
    assert_eq!(
        stored_facts(&kb),
        vec!["(a two)", "(b two)", "(c one)", "(c two)", "(d one)"]
    );
    let c = kb.lookup_fact(&st("(c one)")).unwrap();
    assert_eq!(kb.fact(c).unwrap().supported_by().len(), 1);
}

#[test]
fn demoted_fact_still_answers_queries() {
    let mut kb = strict_kb();
    kb.assert(item("rule: ((p ?X)) -> (q ?X)")).unwrap();
    kb.assert(item("fact: (p a)")).unwrap();
    kb.assert(item("fact: (q a)")).unwrap();

    let report = kb.retract(&item("fact: (q a)")).unwrap();
    assert_eq!(report.disposition, Disposition::Demote);
    assert_eq!(kb.ask(&item("fact: (q ?X)")).unwrap().len(), 1);

    // Once its support goes, the demoted fact goes with it.
    let report = kb.retract(&item("fact: (p a)")).unwrap();
    assert_eq!(report.removed.len(), 2);
    assert!(kb.ask(&item("fact: (q ?X)")).unwrap().is_empty());
}

#[test]
fn cascade_demotes_asserted_dependents_that_keep_support() {
    let mut kb = strict_kb();
    kb.assert(item("rule: ((p ?X)) -> (q ?X)")).unwrap();
    kb.assert(item("rule: ((r ?X)) -> (q ?X)")).unwrap();
    kb.assert(item("fact: (p a)")).unwrap();
    kb.assert(item("fact: (r a)")).unwrap();
    kb.assert(item("fact: (q a)")).unwrap();

    let report = kb.retract(&item("fact: (p a)")).unwrap();
    let q = kb.lookup(&item("fact: (q a)")).unwrap();
    assert_eq!(report.demoted, vec![q]);
    assert!(!kb.justification(q).unwrap().is_asserted());
}

#[test]
fn cascade_removes_asserted_dependent_without_other_support() {
    let mut kb = strict_kb();
    kb.assert(item("rule: ((p ?X)) -> (q ?X)")).unwrap();
    kb.assert(item("fact: (p a)")).unwrap();
    kb.assert(item("fact: (q a)")).unwrap();

    // (q a) loses its only support edge and is removed even though asserted.
    let report = kb.retract(&item("fact: (p a)")).unwrap();
    assert_eq!(report.removed.len(), 2);
    assert!(kb.lookup_fact(&st("(q a)")).is_none());
}

#[test]
fn asserted_rule_survives_retraction_unlike_asserted_fact() {
    let mut kb = strict_kb();
    kb.assert(item("rule: ((p ?X)) -> (q ?X)")).unwrap();
    kb.assert(item("fact: (p a)")).unwrap();

    let report = kb.retract(&item("rule: ((p ?X)) -> (q ?X)")).unwrap();
    assert_eq!(report.disposition, Disposition::Keep);
    assert!(report.removed.is_empty());
    assert_eq!(kb.rule_count(), 1);
    assert!(kb.lookup_fact(&st("(q a)")).is_some());

    let report = kb.retract(&item("fact: (p a)")).unwrap();
    assert_eq!(report.disposition, Disposition::Remove);
}

#[test]
fn retracting_twice_reports_not_found() {
    let mut kb = strict_kb();
    kb.assert(item("fact: (p a)")).unwrap();
    kb.retract(&item("fact: (p a)")).unwrap();
    let err = kb.retract(&item("fact: (p a)")).unwrap_err();
    assert!(matches!(err, KbError::NotFound { .. }));
}

#[test]
fn reassertion_after_retraction_rederives() {
    let mut kb = strict_kb();
    kb.assert(item("rule: ((p ?X) (r ?X)) -> (s ?X)")).unwrap();
    kb.assert(item("fact: (p a)")).unwrap();
    kb.assert(item("fact: (r a)")).unwrap();
    assert!(kb.lookup_fact(&st("(s a)")).is_some());

    kb.retract(&item("fact: (r a)")).unwrap();
    assert!(kb.lookup_fact(&st("(s a)")).is_none());
    assert!(kb.lookup(&item("rule: ((r a)) -> (s a)")).is_some());

    kb.assert(item("fact: (r a)")).unwrap();
    assert!(kb.lookup_fact(&st("(s a)")).is_some());
    kb.check_integrity().unwrap();
}

#[test]
fn shared_handle_serializes_cascades() {
    let shared = SharedKnowledgeBase::new(strict_kb());
    shared.assert(item("rule: ((n ?X)) -> (m ?X)")).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for i in 0..10 {
                    let fact = item(&format!("fact: (n w{t}_{i})"));
                    shared.assert(fact.clone()).unwrap();
                    if i % 2 == 0 {
                        shared.retract(&fact).unwrap();
                    }
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }

    let derived = shared.ask(&item("fact: (m ?X)")).unwrap();
    assert_eq!(derived.len(), 20);
    assert!(shared.with_read(|kb| kb.check_integrity().is_ok()).unwrap());
}
