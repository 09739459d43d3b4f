/*
    This module feeds tokens to a recognizer one at a time and papers over
    a missing statement separator by inserting one when a token is refused
*/

use thiserror::Error;

use crate::error_handling::*;
use crate::recognizer::{LegalTokens, Recognizer, Rejection};
use crate::tokenizer::Token;

#[derive(Debug, Clone)]
pub struct DriverConfig {
    // Token tried once in front of a refused token; None turns recovery off
    pub recovery_token: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig { recovery_token: Some(crate::lua::STATEMENT_SEPARATOR.to_string()) }
    }
}

// What the driving loop does after a token that could not be pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    // Stop driving at the first irrecoverable token
    Halt,
    // Drop the token and keep going from the last good state
    Skip,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PushError {
    #[error("{rejection}; recovery is disabled")]
    NoRecovery { rejection: Rejection },
    #[error("{rejection}; inserting `{recovery_token}` did not help: {recovery}")]
    RecoveryRejected { rejection: Rejection, recovery_token: String, recovery: Rejection },
    #[error("{rejection}; still refused after inserting `{recovery_token}`: {retry}")]
    RetryRejected { rejection: Rejection, recovery_token: String, retry: Rejection },
}

impl ErrorType for PushError {}

impl PushError {
    // The rejection of the token as it was pushed, before any recovery
    pub fn rejection(&self) -> &Rejection {
        match self {
            PushError::NoRecovery { rejection }
            | PushError::RecoveryRejected { rejection, .. }
            | PushError::RetryRejected { rejection, .. } => rejection,
        }
    }
}

pub type DriveError = Error<PushError>;

#[derive(Debug)]
pub struct Step {
    pub token: Token,
    pub outcome: Result<LegalTokens, DriveError>,
}

#[derive(Debug)]
pub struct Transcript {
    pub steps: Vec<Step>,
    pub halted: bool,
    pub accepting: bool,
}

impl Transcript {
    pub fn failures(&self) -> impl Iterator<Item = &DriveError> {
        self.steps.iter().filter_map(|step| step.outcome.as_ref().err())
    }
}

/// Owns one recognition session and pushes tokens into it. A session is
/// never shared, so pushes are serialized by `&mut self`.
#[derive(Debug)]
pub struct Driver<R> {
    session: R,
    config: DriverConfig,
}

impl<R: Recognizer> Driver<R> {
    pub fn new(session: R, config: DriverConfig) -> Self {
        Driver { session, config }
    }

    pub fn session(&self) -> &R {
        &self.session
    }

    pub fn legal_tokens(&self) -> LegalTokens {
        self.session.legal_tokens()
    }

    pub fn is_accepting(&self) -> bool {
        self.session.is_accepting()
    }

    /// Advances the session by `token`. A refused token gets one retry behind
    /// the recovery token; if that fails too the session is rewound to where
    /// it was before the push.
    pub fn push(&mut self, token: &str) -> Result<LegalTokens, PushError> {
        let rejection = match self.session.advance(token) {
            Ok(legal) => return Ok(legal),
            Err(rejection) => rejection,
        };

        let recovery_token = match &self.config.recovery_token {
            Some(recovery_token) => recovery_token.clone(),
            None => return Err(PushError::NoRecovery { rejection }),
        };

        let checkpoint = self.session.checkpoint();
        if let Err(recovery) = self.session.advance(&recovery_token) {
            return Err(PushError::RecoveryRejected { rejection, recovery_token, recovery });
        }

        match self.session.advance(token) {
            Ok(legal) => {
                tracing::debug!(token, recovery_token = %recovery_token, "inserted recovery token");
                Ok(legal)
            }
            Err(retry) => {
                self.session.rewind(checkpoint);
                Err(PushError::RetryRejected { rejection, recovery_token, retry })
            }
        }
    }

    /// Pushes every token in order. What happens after a failed push is up
    /// to `policy`; the state is always the last successful one.
    #[tracing::instrument(skip_all, fields(policy = ?policy))]
    pub fn drive<'t>(&mut self, tokens: impl IntoIterator<Item = &'t Token>, policy: FailurePolicy) -> Transcript {
        let mut steps = Vec::new();
        let mut halted = false;

        for (index, token) in tokens.into_iter().enumerate() {
            let outcome = self.push(&token.text).map_err(|error| DriveError {
                location: Location::Token { index, start: token.start, end: token.end },
                error
            });

            let failed = outcome.is_err();
            if let Err(error) = &outcome {
                tracing::warn!(token = %error.error.rejection().token, %error.location, "irrecoverable token");
            }
            steps.push(Step { token: token.clone(), outcome });

            if failed && policy == FailurePolicy::Halt {
                halted = true;
                break;
            }
        }

        Transcript { steps, halted, accepting: self.is_accepting() }
    }
}
