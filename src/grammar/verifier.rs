use indexmap::IndexMap;

use super::GrammarErrorType::DanglingNonterminal;
use super::{Alternative, GrammarError, GrammarErrors, Name, Production, Symbol};
use crate::error_handling::Location;

pub type RuleIndex = IndexMap<Name, Vec<usize>>;

fn get_alternative_undefined_symbols(alternative: &Alternative, location: &Location, rules: &RuleIndex) -> GrammarErrors {
    // Filter out everything but nonterminals, then keep only those that head
    // no production.
    alternative.iter()
        .filter_map(|symbol| match symbol {
            Symbol::NonTerminal(name) => Some(name),
            _ => None
        })
        .filter(|name| !rules.contains_key(*name))
        .map(|name| GrammarError {
            location: location.to_owned(),
            error: DanglingNonterminal(name.to_owned())
        })
        .collect()
}

fn get_undefined_symbols(productions: &[Production], rules: &RuleIndex) -> GrammarErrors {
    // The location of a production is its head plus its position among the
    // productions sharing that head
    rules.iter()
        .flat_map(|(head, ids)| ids.iter().enumerate().map(move |(index, id)| (head, index, *id)))
        .flat_map(|(head, index, id)| {
            let location = Location::Production { head: head.clone(), index };
            get_alternative_undefined_symbols(&productions[id].body, &location, rules)
        })
        .collect()
}

pub fn verify_productions(productions: &[Production], rules: &RuleIndex) -> Result<(), GrammarErrors> {
    let mut errors = Vec::new();

    errors.extend(get_undefined_symbols(productions, rules));

    if !errors.is_empty() {
        tracing::debug!(defects = errors.len(), "grammar failed verification");
        Err(errors)
    } else {
        Ok(())
    }
}
