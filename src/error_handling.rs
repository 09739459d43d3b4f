use std::fmt::Display;

use crate::grammar::Name;

pub trait ErrorType: Display + PartialEq {}

#[derive(Debug, PartialEq, Clone)]
pub enum Location {
    // An alternative of a nonterminal, counted from zero in insertion order
    Production { head: Name, index: usize },
    // A token of the input, with its byte offsets into the source
    Token { index: usize, start: usize, end: usize },
    // The grammar as a whole
    Grammar,
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Production { head, index } => write!(f, "{}/{}", head, index),
            Location::Token { index, start, end } => write!(f, "token {} @ {}..{}", index, start, end),
            Location::Grammar => write!(f, "grammar"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Error<T: ErrorType> {
    pub location: Location,
    pub error: T
}

impl<T: ErrorType> Display for Error<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\x1b[31;49;1m[{}]\x1b[39;49;1m  {}\x1b[0m", self.location, self.error)
    }
}

pub type Errors<T> = Vec<Error<T>>;
