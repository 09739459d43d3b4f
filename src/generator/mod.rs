/*
    This module generates random sentences of a grammar
*/

use std::collections::HashMap;

use rand::prelude::*;
use thiserror::Error;

use crate::error_handling::*;
use crate::grammar::{Grammar, Name, Symbol};

#[derive(Debug, PartialEq, Error)]
pub enum GenerateErrorType {
    // The start symbol heads no production
    #[error("No definition for nonterminal `{0}`")]
    UndefinedNonterminal(Name),
    // Every expansion of the symbol recurses forever
    #[error("Nonterminal `{0}` never derives a finite sentence")]
    Unproductive(Name),
}

impl ErrorType for GenerateErrorType {}

pub type GenerateError = Error<GenerateErrorType>;
pub type GenResult = Result<Vec<String>, GenerateError>;

// Height of the shallowest derivation tree of every production. Productions
// that cannot finish are absent.
fn production_heights(grammar: &Grammar) -> HashMap<usize, usize> {
    let mut nonterminal_heights = HashMap::<&Name, usize>::new();
    let mut heights = HashMap::new();
    loop {
        let mut changed = false;
        for (id, production) in grammar.productions().iter().enumerate() {
            let children: Option<Vec<usize>> = production.body.iter()
                .map(|symbol| match symbol {
                    Symbol::Terminal(_) => Some(0),
                    Symbol::NonTerminal(name) => nonterminal_heights.get(name).copied(),
                })
                .collect();
            let Some(children) = children else { continue };
            let height = 1 + children.into_iter().max().unwrap_or(0);

            if heights.get(&id).map_or(true, |&known| height < known) {
                heights.insert(id, height);
                changed = true;
            }
            if nonterminal_heights.get(&production.head).map_or(true, |&known| height < known) {
                nonterminal_heights.insert(&production.head, height);
                changed = true;
            }
        }
        if !changed {
            return heights;
        }
    }
}

struct Generator<'g, R: Rng + ?Sized> {
    grammar: &'g Grammar,
    heights: HashMap<usize, usize>,
    rng: &'g mut R,
    max_depth: usize,
}

impl<R: Rng + ?Sized> Generator<'_, R> {
    fn generate_nonterminal(&mut self, nonterminal: &Name, depth: usize, sentence: &mut Vec<String>) {
        let candidates: Vec<(usize, usize)> = self.grammar.alternatives(nonterminal).iter()
            .filter_map(|id| self.heights.get(id).map(|&height| (*id, height)))
            .collect();

        // Too deep: only the shallowest alternatives, so the recursion bottoms out
        let candidates = if depth >= self.max_depth {
            let lowest = candidates.iter().map(|&(_, height)| height).min().unwrap_or(0);
            candidates.into_iter().filter(|&(_, height)| height == lowest).collect()
        } else {
            candidates
        };

        // Every nonterminal reached from a productive one is productive itself
        let Some(&(id, _)) = candidates.choose(&mut *self.rng) else { return };
        let grammar = self.grammar;
        for symbol in &grammar.production(id).body {
            self.generate_symbol(symbol, depth, sentence);
        }
    }

    fn generate_symbol(&mut self, symbol: &Symbol, depth: usize, sentence: &mut Vec<String>) {
        match symbol {
            Symbol::NonTerminal(name) => self.generate_nonterminal(name, depth + 1, sentence),
            Symbol::Terminal(text) => sentence.push(text.clone()),
        }
    }
}

/// Generates a random terminal sequence derivable from `start`. Below
/// `max_depth` alternatives are picked uniformly; past it only the shallowest
/// ones are, so generation always terminates.
pub fn generate<R: Rng + ?Sized>(grammar: &Grammar, start: &Name, rng: &mut R, max_depth: usize) -> GenResult {
    if !grammar.contains(start) {
        return Err(GenerateError {
            location: Location::Grammar,
            error: GenerateErrorType::UndefinedNonterminal(start.clone())
        });
    }

    let heights = production_heights(grammar);
    if !grammar.alternatives(start).iter().any(|id| heights.contains_key(id)) {
        return Err(GenerateError {
            location: Location::Grammar,
            error: GenerateErrorType::Unproductive(start.clone())
        });
    }

    let mut generator = Generator { grammar, heights, rng, max_depth };
    let mut sentence = Vec::new();
    generator.generate_nonterminal(start, 0, &mut sentence);
    Ok(sentence)
}
