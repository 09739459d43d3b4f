use indexmap::IndexSet;

use super::{nt, Alternative, Grammar, GrammarErrors, Name, Production};

// Hands out synthetic nonterminal names. Each builder owns its own allocator,
// so two builds of the same grammar produce the same names.
#[derive(Debug)]
pub struct NameAllocator {
    next: usize,
}

impl NameAllocator {
    pub fn new() -> Self {
        NameAllocator { next: 1 }
    }

    pub fn fresh(&mut self) -> Name {
        let name = Name::Fresh(self.next);
        self.next += 1;
        name
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates productions and offers combinators that desugar alternation,
/// one-or-more repetition and rule-set merging into flat productions.
///
/// The combinators only compute production lists; nothing is part of the
/// grammar until it is passed to [`GrammarBuilder::add`].
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    names: NameAllocator,
    productions: Vec<Production>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        GrammarBuilder { names: NameAllocator::new(), productions: Vec::new() }
    }

    pub fn fresh_name(&mut self) -> Name {
        self.names.fresh()
    }

    fn head_or_fresh(&mut self, head: Option<Name>) -> Name {
        match head {
            Some(head) => head,
            None => self.fresh_name(),
        }
    }

    /// One production per alternative, all under the same head.
    pub fn alt(&mut self, alternatives: impl IntoIterator<Item = Alternative>, head: Option<Name>) -> Vec<Production> {
        let head = self.head_or_fresh(head);
        alternatives.into_iter()
            .map(|body| Production { head: head.clone(), body })
            .collect()
    }

    /// Left-recursive one-or-more repetition: `base (iteration)*`.
    ///
    /// Emits `head -> base` and `head -> head iteration`. A trailing separator
    /// is not accepted; callers that need one model it themselves.
    pub fn rep(&mut self, base: Alternative, iteration: Alternative, head: Option<Name>) -> Vec<Production> {
        let head = self.head_or_fresh(head);
        let mut recursive = Vec::with_capacity(iteration.len() + 1);
        recursive.push(nt(&head));
        recursive.extend(iteration);

        vec![
            Production { head: head.clone(), body: base },
            Production { head, body: recursive },
        ]
    }

    /// Merges two rule sets and adds `head -> h` for every head `h` used in
    /// either, so `head` can stand in for the start of any merged set.
    #[allow(dead_code)] // not used by the shipped grammar
    pub fn seq(&mut self, first: Vec<Production>, second: Vec<Production>, head: Option<Name>) -> Vec<Production> {
        let head = self.head_or_fresh(head);
        let names: IndexSet<Name> = first.iter()
            .chain(second.iter())
            .map(|production| production.head.clone())
            .collect();

        let mut merged = first;
        merged.extend(second);
        merged.extend(names.into_iter().map(|name| Production { head: head.clone(), body: vec![nt(name)] }));
        merged
    }

    pub fn add(&mut self, productions: impl IntoIterator<Item = Production>) {
        self.productions.extend(productions);
    }

    pub fn add_production(&mut self, head: impl Into<Name>, body: Alternative) {
        self.productions.push(Production::new(head, body));
    }

    pub fn build(self) -> Result<Grammar, GrammarErrors> {
        Grammar::new(self.productions)
    }
}
