/*
    This module is for storing and manipulating grammars
*/

mod builder;
mod verifier;

use std::collections::HashSet;
use std::fmt::Display;

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use thiserror::Error;

use crate::error_handling::*;

pub use builder::GrammarBuilder;

// The name of a nonterminal. Fresh names only come out of a NameAllocator, so
// they can never be confused with a name somebody typed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Name {
    Given(String),
    Fresh(usize),
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Name::Given(name) => write!(f, "{}", name),
            Name::Fresh(n) => write!(f, "rule#{}", n),
        }
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Name::Given(name.to_string())
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Name::Given(name)
    }
}

impl From<&Name> for Name {
    fn from(name: &Name) -> Self {
        name.clone()
    }
}

// The base unit in a grammar rule
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(String),
    NonTerminal(Name),
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Terminal(text) => write!(f, "`{}`", text),
            Symbol::NonTerminal(name) => write!(f, "{}", name),
        }
    }
}

pub fn t(text: &str) -> Symbol {
    Symbol::Terminal(text.to_string())
}

pub fn nt(name: impl Into<Name>) -> Symbol {
    Symbol::NonTerminal(name.into())
}

// The symbols in a single alternative
pub type Alternative = Vec<Symbol>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub head: Name,
    pub body: Alternative,
}

impl Production {
    pub fn new(head: impl Into<Name>, body: Alternative) -> Self {
        Production { head: head.into(), body }
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.head, self.body.iter().format(" "))
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum GrammarErrorType {
    // A body refers to a nonterminal that heads no production
    #[error("No production for nonterminal `{0}`")]
    DanglingNonterminal(Name),
    // A session was asked to start from a symbol with no productions
    #[error("Start symbol `{0}` has no productions")]
    MissingStartSymbol(Name),
}

impl ErrorType for GrammarErrorType {}

pub type GrammarError = Error<GrammarErrorType>;
pub type GrammarErrors = Errors<GrammarErrorType>;

// An immutable production table. Production ids are indices into
// `productions` and stay valid for the lifetime of the grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    productions: Vec<Production>,
    rules: IndexMap<Name, Vec<usize>>,
    terminals: IndexSet<String>,
    nullable: HashSet<Name>,
}

impl Grammar {
    pub fn new(productions: Vec<Production>) -> Result<Self, GrammarErrors> {
        let mut rules = IndexMap::<Name, Vec<usize>>::new();
        for (id, production) in productions.iter().enumerate() {
            rules.entry(production.head.clone()).or_default().push(id);
        }

        verifier::verify_productions(&productions, &rules)?;

        let terminals = productions.iter()
            .flat_map(|production| production.body.iter())
            .filter_map(|symbol| match symbol {
                Symbol::Terminal(text) => Some(text.clone()),
                _ => None
            })
            .collect();
        let nullable = nullable_nonterminals(&productions);

        tracing::debug!(
            productions = productions.len(),
            nonterminals = rules.len(),
            "grammar built"
        );

        Ok(Grammar { productions, rules, terminals, nullable })
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, id: usize) -> &Production {
        &self.productions[id]
    }

    // Ids of every production headed by `name`, empty if there are none
    pub fn alternatives(&self, name: &Name) -> &[usize] {
        self.rules.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.rules.contains_key(name)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Name> {
        self.rules.keys()
    }

    pub fn terminals(&self) -> impl Iterator<Item = &str> {
        self.terminals.iter().map(String::as_str)
    }

    pub fn is_nullable(&self, name: &Name) -> bool {
        self.nullable.contains(name)
    }

    // Nonterminals that can never be expanded while deriving from `start`
    pub fn unreachable_from(&self, start: &Name) -> Vec<Name> {
        let mut seen = IndexSet::new();
        let mut pending = vec![start.clone()];
        while let Some(name) = pending.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            for &id in self.alternatives(&name) {
                for symbol in &self.productions[id].body {
                    if let Symbol::NonTerminal(next) = symbol {
                        if !seen.contains(next) {
                            pending.push(next.clone());
                        }
                    }
                }
            }
        }

        self.rules.keys()
            .filter(|name| !seen.contains(*name))
            .cloned()
            .collect()
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for production in &self.productions {
            writeln!(f, "{}", production)?;
        }
        Ok(())
    }
}

// Fixpoint over the productions: a head is nullable once one of its bodies
// consists only of nullable nonterminals.
fn nullable_nonterminals(productions: &[Production]) -> HashSet<Name> {
    let mut nullable = HashSet::new();
    loop {
        let mut changed = false;
        for production in productions {
            if nullable.contains(&production.head) {
                continue;
            }
            let derives_empty = production.body.iter().all(|symbol| match symbol {
                Symbol::NonTerminal(name) => nullable.contains(name),
                Symbol::Terminal(_) => false,
            });
            if derives_empty {
                nullable.insert(production.head.clone());
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}
