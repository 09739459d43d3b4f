use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::driver::FailurePolicy;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Start symbol (default: chunk)
    #[arg(short, long, global = true, value_name = "SYMBOL")]
    pub start: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the tokens of the input with their byte offsets
    Tokens(Input),

    /// Push the input token by token and print the legal continuations
    Drive {
        #[command(flatten)]
        input: Input,

        /// What to do after a token that cannot be pushed
        #[arg(long, value_enum, default_value_t = FailurePolicy::Skip)]
        on_error: FailurePolicy,

        /// Do not insert a statement separator in front of refused tokens
        #[arg(long)]
        no_recovery: bool,
    },

    /// Print the production table
    Grammar,

    /// Print random sentences of the grammar
    Sample {
        /// Amount to generate (default: 1)
        #[arg(short = 'n', long, value_name = "AMOUNT", default_value_t = 1)]
        amount: u32,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Depth after which the shortest expansions are preferred
        #[arg(long, default_value_t = 6)]
        depth: usize,
    },
}

#[derive(Args)]
pub struct Input {
    /// File containing the source
    #[arg(required_unless_present = "eval", conflicts_with = "eval")]
    pub file: Option<PathBuf>,

    /// Source text given directly
    #[arg(short, long, value_name = "SOURCE")]
    pub eval: Option<String>,
}

impl Input {
    pub fn read(&self) -> std::io::Result<String> {
        match (&self.eval, &self.file) {
            (Some(source), _) => Ok(source.clone()),
            (None, Some(file)) => std::fs::read_to_string(file),
            (None, None) => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn drive_defaults() {
        let cli = Cli::try_parse_from(["prefix-lua", "drive", "-e", "local x = 1;"]).unwrap();
        match cli.command {
            Command::Drive { input, on_error, no_recovery } => {
                assert_eq!(input.read().unwrap(), "local x = 1;");
                assert_eq!(on_error, FailurePolicy::Skip);
                assert!(!no_recovery);
            }
            _ => panic!("expected drive"),
        }
    }

    #[test]
    fn global_start_after_subcommand() {
        let cli = Cli::try_parse_from(["prefix-lua", "sample", "--start", "exp", "-n", "3"]).unwrap();
        assert_eq!(cli.start.as_deref(), Some("exp"));
        assert!(matches!(cli.command, Command::Sample { amount: 3, seed: None, depth: 6 }));
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["prefix-lua", "tokens"]).is_err());
        assert!(Cli::try_parse_from(["prefix-lua", "tokens", "a.lua", "-e", "x"]).is_err());
    }
}
