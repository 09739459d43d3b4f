mod cli;
mod driver;
mod error_handling;
mod generator;
mod grammar;
mod lua;
mod recognizer;
mod tokenizer;

use std::process::ExitCode;

use clap::Parser;
use itertools::Itertools;
use rand::prelude::*;
use rand::rngs::StdRng;

use cli::{Cli, Command};
use driver::{Driver, DriverConfig};
use error_handling::{Error, ErrorType};
use grammar::{Grammar, Name};
use recognizer::{EarleySession, LegalTokens, Recognizer};

fn report<T: ErrorType>(errors: &[Error<T>]) -> ExitCode {
    for error in errors {
        eprintln!("{}", error);
    }
    ExitCode::FAILURE
}

fn display_legal(legal: &LegalTokens) -> String {
    legal.iter().map(|token| format!("`{}`", token)).join(" ")
}

fn drive(grammar: &Grammar, start: &Name, source: &str, policy: driver::FailurePolicy, config: DriverConfig) -> ExitCode {
    let session = match EarleySession::new(grammar, start) {
        Ok(session) => session,
        Err(error) => return report(&[error]),
    };
    let mut driver = Driver::new(session, config);
    let tokens = lua::tokenizer().tokenize(source);

    println!("    {}", display_legal(&driver.legal_tokens()));
    let transcript = driver.drive(&tokens, policy);
    for step in &transcript.steps {
        println!("{}", &source[..step.token.end]);
        match &step.outcome {
            Ok(legal) => println!("    {}", display_legal(legal)),
            Err(error) => println!("    {}", error),
        }
    }

    let failures = transcript.failures().count();
    let consumed = driver.session().consumed();
    match (transcript.accepting, transcript.halted) {
        (true, _) => println!("accepted after {} tokens, {} refused", consumed, failures),
        (false, true) => println!("halted after {} tokens", consumed),
        (false, false) => println!("incomplete after {} tokens, {} refused", consumed, failures),
    }
    if failures == 0 && transcript.accepting {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init();

    let grammar = match lua::build_grammar() {
        Ok(grammar) => grammar,
        Err(errors) => return report(&errors),
    };
    let start = cli.start.clone().map(Name::from).unwrap_or_else(lua::start_symbol);

    match cli.command {
        Command::Tokens(input) => {
            let source = match input.read() {
                Ok(source) => source,
                Err(e) => {
                    eprintln!("Could not read input: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            for token in lua::tokenizer().tokenize(&source) {
                println!("{}", token);
            }
            ExitCode::SUCCESS
        }
        Command::Drive { input, on_error, no_recovery } => {
            let source = match input.read() {
                Ok(source) => source,
                Err(e) => {
                    eprintln!("Could not read input: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            let config = if no_recovery {
                DriverConfig { recovery_token: None }
            } else {
                DriverConfig::default()
            };
            drive(&grammar, &start, &source, on_error, config)
        }
        Command::Grammar => {
            tracing::info!(
                productions = grammar.productions().len(),
                nonterminals = grammar.nonterminals().count(),
                terminals = grammar.terminals().count(),
                "grammar summary"
            );
            for name in grammar.unreachable_from(&start) {
                tracing::warn!(%name, "nonterminal is unreachable from the start symbol");
            }
            print!("{}", grammar);
            ExitCode::SUCCESS
        }
        Command::Sample { amount, seed, depth } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            for _ in 0..amount {
                match generator::generate(&grammar, &start, &mut rng, depth) {
                    Ok(sentence) => println!("{}", sentence.join(" ")),
                    Err(error) => return report(&[error]),
                }
            }
            ExitCode::SUCCESS
        }
    }
}
