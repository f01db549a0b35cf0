//! Text corpus loader.
//!
//! One item per line:
//!
//! ```text
//! # blocks world
//! fact: (isa cube block)
//! rule: ((isa ?X block) (on ?X table)) -> (grounded ?X)
//! ```
//!
//! Blank lines and lines starting with `#` or `;` are skipped. A rule's
//! left-hand side is either a parenthesized list of statements or a single
//! bare statement.

use std::path::Path;

use crate::error::{KbError, ParseError};
use crate::kb::{Fact, Item, Rule};
use crate::logic::Statement;

/// Parse one `fact:` / `rule:` line; errors are attributed to `line`.
pub fn parse_item(text: &str, line: usize) -> Result<Item, ParseError> {
    let text = text.trim();
    let (kind, body) = text.split_once(':').unwrap_or((text, ""));

    match kind.trim() {
        "fact" => Ok(Item::Fact(Fact::new(Statement::parse_at(body, line)?))),
        "rule" => parse_rule(body, line).map(Item::Rule),
        other => Err(ParseError::Item {
            line,
            source: KbError::UnsupportedKind {
                kind: other.to_string(),
            },
        }),
    }
}

fn parse_rule(body: &str, line: usize) -> Result<Rule, ParseError> {
    let (lhs, rhs) = body.split_once("->").ok_or_else(|| ParseError::Syntax {
        line,
        message: format!("rule is missing '->': '{}'", body.trim()),
    })?;

    let rhs = Statement::parse_at(rhs, line)?;
    let lhs = parse_antecedents(lhs, line)?;
    Rule::new(lhs, rhs).map_err(|source| ParseError::Item { line, source })
}

/// `((p ?X) (r ?X))`, `()` or a bare `(p ?X)`.
fn parse_antecedents(text: &str, line: usize) -> Result<Vec<Statement>, ParseError> {
    let text = text.trim();
    let inner = text
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| ParseError::Syntax {
            line,
            message: format!("rule antecedents must be parenthesized: '{text}'"),
        })?;

    if !inner.contains('(') && !inner.trim().is_empty() {
        return Ok(vec![Statement::parse_at(text, line)?]);
    }

    let mut statements = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| ParseError::Syntax {
                    line,
                    message: format!("unbalanced ')' in '{text}'"),
                })?;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        statements.push(Statement::parse_at(&inner[s..=i], line)?);
                    }
                }
            }
            c if depth == 0 && !c.is_whitespace() => {
                return Err(ParseError::Syntax {
                    line,
                    message: format!("unexpected '{c}' between antecedents in '{text}'"),
                });
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseError::Syntax {
            line,
            message: format!("unbalanced '(' in '{text}'"),
        });
    }
    Ok(statements)
}

/// Parse a whole corpus, skipping blank and comment lines.
pub fn parse_corpus(source: &str) -> Result<Vec<Item>, ParseError> {
    source
        .lines()
        .enumerate()
        .filter(|(_, l)| {
            let l = l.trim();
            !(l.is_empty() || l.starts_with('#') || l.starts_with(';'))
        })
        .map(|(i, l)| parse_item(l, i + 1))
        .collect()
}

/// Read and parse a corpus file.
pub fn load_file(path: &Path) -> Result<Vec<Item>, ParseError> {
    let source = std::fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let items = parse_corpus(&source)?;
    tracing::debug!(path = %path.display(), items = items.len(), "corpus loaded");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fact_line() {
        let item = parse_item("fact: (color block1 red)", 1).unwrap();
        assert_eq!(item.to_string(), "fact: (color block1 red)");
    }

    #[test]
    fn parses_rule_forms() {
        let item = parse_item("rule: ((p ?X) (r ?X)) -> (s ?X)", 1).unwrap();
        let Item::Rule(rule) = item else {
            panic!("expected a rule");
        };
        assert_eq!(rule.lhs().len(), 2);

        let bare = parse_item("rule: (p ?X) -> (q ?X)", 1).unwrap();
        assert_eq!(bare.to_string(), "rule: ((p ?X)) -> (q ?X)");
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let err = parse_item("axiom: (p a)", 4).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Item {
                line: 4,
                source: KbError::UnsupportedKind { .. }
            }
        ));
    }

    #[test]
    fn empty_rule_lhs_is_rejected() {
        let err = parse_item("rule: () -> (q a)", 2).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Item {
                source: KbError::EmptyRule { .. },
                ..
            }
        ));
    }

    #[test]
    fn syntax_errors_carry_line_numbers() {
        let corpus = "# header\n\nfact: (p a)\nrule: ((p ?X) -> (q ?X)\n";
        let err = parse_corpus(corpus).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 4, .. }));

        assert!(parse_item("rule: ((p ?X)) (q ?X)", 1).is_err());
        assert!(parse_item("rule: ((p ?X) junk) -> (q ?X)", 1).is_err());
    }

    #[test]
    fn corpus_skips_comments() {
        let corpus = "; comment\nfact: (p a)\n   \n# other\nrule: ((p ?X)) -> (q ?X)\n";
        let items = parse_corpus(corpus).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].kind(), "rule");
    }

    #[test]
    fn load_file_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kb.txt");
        std::fs::write(&path, "fact: (p a)\n").unwrap();
        assert_eq!(load_file(&path).unwrap().len(), 1);
        assert!(matches!(
            load_file(&dir.path().join("missing.txt")),
            Err(ParseError::Io { .. })
        ));
    }
}
