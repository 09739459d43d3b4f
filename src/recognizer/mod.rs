/*
    This module decides whether a token prefix can still grow into a
    sentence of a grammar, one token at a time
*/

use std::collections::BTreeSet;

use indexmap::IndexSet;
use itertools::Itertools;
use thiserror::Error;

use crate::error_handling::Location;
use crate::grammar::{Grammar, GrammarError, GrammarErrorType, Name, Symbol};

pub type LegalTokens = BTreeSet<String>;

fn display_set(tokens: &LegalTokens) -> String {
    if tokens.is_empty() {
        "nothing".to_string()
    } else {
        tokens.iter().map(|token| format!("`{}`", token)).join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("`{token}` cannot follow the first {position} tokens, expected one of {}", display_set(.expected))]
pub struct Rejection {
    pub token: String,
    // Number of tokens consumed when the token was refused
    pub position: usize,
    pub expected: LegalTokens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// An incremental recognition session over some grammar.
///
/// `advance` must leave the session untouched when it refuses a token, so a
/// caller can always retry something else from the same state.
pub trait Recognizer {
    fn advance(&mut self, token: &str) -> Result<LegalTokens, Rejection>;

    fn legal_tokens(&self) -> LegalTokens;

    // True when the tokens consumed so far form a complete sentence
    fn is_accepting(&self) -> bool;

    fn consumed(&self) -> usize;

    fn checkpoint(&self) -> Checkpoint;

    fn rewind(&mut self, checkpoint: Checkpoint);
}

// A dotted production: `dot` symbols of the body have been matched, starting
// at token `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Item {
    production: usize,
    dot: usize,
    origin: usize,
}

impl Item {
    fn advanced(self) -> Self {
        Item { dot: self.dot + 1, ..self }
    }
}

/// Earley recognizer keeping one item set per consumed token. The grammar is
/// borrowed, so any number of sessions can share one immutable grammar.
#[derive(Debug, Clone)]
pub struct EarleySession<'g> {
    grammar: &'g Grammar,
    start: Name,
    sets: Vec<IndexSet<Item>>,
}

impl<'g> EarleySession<'g> {
    pub fn new(grammar: &'g Grammar, start: &Name) -> Result<Self, GrammarError> {
        if !grammar.contains(start) {
            return Err(GrammarError {
                location: Location::Grammar,
                error: GrammarErrorType::MissingStartSymbol(start.clone())
            });
        }

        let mut session = EarleySession { grammar, start: start.clone(), sets: Vec::new() };
        let mut initial = grammar.alternatives(start).iter()
            .map(|&production| Item { production, dot: 0, origin: 0 })
            .collect();
        session.close(&mut initial, 0);
        session.sets.push(initial);
        Ok(session)
    }

    fn next_symbol(&self, item: Item) -> Option<&'g Symbol> {
        self.grammar.production(item.production).body.get(item.dot)
    }

    fn expects(&self, item: Item, name: &Name) -> bool {
        matches!(self.next_symbol(item), Some(Symbol::NonTerminal(next)) if next == name)
    }

    // Runs prediction and completion over `set` (the set for position `j`)
    // until no new item appears. The set doubles as its own worklist.
    fn close(&self, set: &mut IndexSet<Item>, j: usize) {
        let mut cursor = 0;
        while let Some(&item) = set.get_index(cursor) {
            cursor += 1;
            match self.next_symbol(item) {
                Some(Symbol::NonTerminal(name)) => {
                    for &production in self.grammar.alternatives(name) {
                        set.insert(Item { production, dot: 0, origin: j });
                    }
                    if self.grammar.is_nullable(name) {
                        set.insert(item.advanced());
                    }
                }
                Some(Symbol::Terminal(_)) => {}
                // Completions that start and end at `j` are nullable and were
                // already stepped over during prediction.
                None if item.origin == j => {}
                None => {
                    let head = &self.grammar.production(item.production).head;
                    let parents = self.sets[item.origin].iter()
                        .copied()
                        .filter(|&parent| self.expects(parent, head))
                        .map(Item::advanced)
                        .collect_vec();
                    set.extend(parents);
                }
            }
        }
    }

    fn current(&self) -> &IndexSet<Item> {
        &self.sets[self.sets.len() - 1]
    }
}

impl Recognizer for EarleySession<'_> {
    fn advance(&mut self, token: &str) -> Result<LegalTokens, Rejection> {
        let j = self.sets.len();
        let mut scanned: IndexSet<Item> = self.current().iter()
            .copied()
            .filter(|&item| matches!(self.next_symbol(item), Some(Symbol::Terminal(text)) if text == token))
            .map(Item::advanced)
            .collect();

        if scanned.is_empty() {
            return Err(Rejection {
                token: token.to_string(),
                position: self.consumed(),
                expected: self.legal_tokens()
            });
        }

        self.close(&mut scanned, j);
        tracing::trace!(position = j, items = scanned.len(), token, "earley set built");
        self.sets.push(scanned);
        Ok(self.legal_tokens())
    }

    fn legal_tokens(&self) -> LegalTokens {
        self.current().iter()
            .filter_map(|&item| match self.next_symbol(item) {
                Some(Symbol::Terminal(text)) => Some(text.clone()),
                _ => None
            })
            .collect()
    }

    fn is_accepting(&self) -> bool {
        self.current().iter().any(|&item| {
            item.origin == 0
                && self.next_symbol(item).is_none()
                && self.grammar.production(item.production).head == self.start
        })
    }

    fn consumed(&self) -> usize {
        self.sets.len() - 1
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.sets.len())
    }

    fn rewind(&mut self, checkpoint: Checkpoint) {
        self.sets.truncate(checkpoint.0.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{nt, t, Production};

    fn tokens(items: &[&str]) -> LegalTokens {
        items.iter().map(|s| s.to_string()).collect()
    }

    // sum -> sum + num | num ; num -> 1 | 2
    fn arithmetic() -> Grammar {
        Grammar::new(vec![
            Production::new("sum", vec![nt("sum"), t("+"), nt("num")]),
            Production::new("sum", vec![nt("num")]),
            Production::new("num", vec![t("1")]),
            Production::new("num", vec![t("2")]),
        ]).unwrap()
    }

    #[test]
    fn left_recursion_is_recognized() {
        let grammar = arithmetic();
        let mut session = EarleySession::new(&grammar, &Name::from("sum")).unwrap();

        assert_eq!(session.legal_tokens(), tokens(&["1", "2"]));
        assert_eq!(session.advance("1"), Ok(tokens(&["+"])));
        assert!(session.is_accepting());
        assert_eq!(session.advance("+"), Ok(tokens(&["1", "2"])));
        assert!(!session.is_accepting());
        session.advance("2").unwrap();
        assert!(session.is_accepting());
        assert_eq!(session.consumed(), 3);
    }

    #[test]
    fn rejection_leaves_the_session_alone() {
        let grammar = arithmetic();
        let mut session = EarleySession::new(&grammar, &Name::from("sum")).unwrap();
        session.advance("1").unwrap();

        let rejection = session.advance("2").unwrap_err();
        assert_eq!(rejection, Rejection { token: "2".to_string(), position: 1, expected: tokens(&["+"]) });
        assert_eq!(rejection.to_string(), "`2` cannot follow the first 1 tokens, expected one of `+`");
        assert_eq!(session.consumed(), 1);
        assert_eq!(session.legal_tokens(), tokens(&["+"]));
        assert!(session.is_accepting());
    }

    #[test]
    fn rewind_restores_an_earlier_state() {
        let grammar = arithmetic();
        let mut session = EarleySession::new(&grammar, &Name::from("sum")).unwrap();
        session.advance("1").unwrap();
        let checkpoint = session.checkpoint();
        session.advance("+").unwrap();
        session.advance("2").unwrap();

        session.rewind(checkpoint);
        assert_eq!(session.consumed(), 1);
        assert_eq!(session.legal_tokens(), tokens(&["+"]));
    }

    #[test]
    fn nullable_nonterminals_are_stepped_over() {
        // s -> opt opt x ; opt -> | y
        let grammar = Grammar::new(vec![
            Production::new("s", vec![nt("opt"), nt("opt"), t("x")]),
            Production::new("opt", vec![]),
            Production::new("opt", vec![t("y")]),
        ]).unwrap();

        for input in [vec!["x"], vec!["y", "x"], vec!["y", "y", "x"]] {
            let mut session = EarleySession::new(&grammar, &Name::from("s")).unwrap();
            for token in &input {
                session.advance(token).unwrap();
            }
            assert!(session.is_accepting(), "{:?}", input);
        }

        let mut session = EarleySession::new(&grammar, &Name::from("s")).unwrap();
        assert_eq!(session.legal_tokens(), tokens(&["x", "y"]));
        session.advance("y").unwrap();
        session.advance("y").unwrap();
        assert_eq!(session.legal_tokens(), tokens(&["x"]));
    }

    #[test]
    fn sessions_share_one_grammar() {
        let grammar = arithmetic();
        let mut first = EarleySession::new(&grammar, &Name::from("sum")).unwrap();
        let second = EarleySession::new(&grammar, &Name::from("num")).unwrap();
        first.advance("2").unwrap();

        assert_eq!(second.legal_tokens(), tokens(&["1", "2"]));
        assert_eq!(second.consumed(), 0);
    }

    #[test]
    fn missing_start_symbol_is_an_error() {
        let grammar = arithmetic();
        let error = EarleySession::new(&grammar, &Name::from("product")).unwrap_err();
        assert_eq!(error, GrammarError {
            location: Location::Grammar,
            error: GrammarErrorType::MissingStartSymbol(Name::from("product"))
        });
    }
}
