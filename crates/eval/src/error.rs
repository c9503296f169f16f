//! Error taxonomy of the interpreter.
//!
//! `CoercionError` and `BindError` are recoverable: the dispatcher rejects
//! the current candidate and moves on. `NoMatchError` ends a line.
//! `HandlerError` is carried as data on the line's outcome unless it is
//! one of the fatal kinds. Everything fatal reaches the caller as an
//! `InterpError`.

use std::fmt;

use scenario_core::ParseError;
use scenario_ledger::{Invocation, LedgerError};

// ──────────────────────────────────────────────
// Values
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumericError {
    #[error("`{token}` is not a number")]
    Invalid { token: String },

    #[error("numeric overflow: {message}")]
    Overflow { message: String },

    #[error("division by zero")]
    DivisionByZero,
}

/// A token could not be turned into the value kind an Arg expects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoercionError {
    #[error("expected {expected}, got `{token}`")]
    Expected { expected: String, token: String },

    #[error(transparent)]
    Numeric(#[from] NumericError),

    #[error("unknown alias `{alias}`")]
    UnknownAlias { alias: String },

    /// A parenthesized argument was evaluated as a value expression and
    /// that evaluation failed.
    #[error("could not evaluate `{event}`: {message}")]
    Evaluation { event: String, message: String },
}

impl CoercionError {
    pub fn expected(expected: impl Into<String>, token: impl fmt::Display) -> Self {
        CoercionError::Expected {
            expected: expected.into(),
            token: token.to_string(),
        }
    }
}

// ──────────────────────────────────────────────
// Binding and dispatch
// ──────────────────────────────────────────────

/// Why one specification did not accept the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("expected `{verb}` at position {position}")]
    Verb { verb: String, position: usize },

    #[error("missing argument `{arg}`")]
    Missing { arg: String },

    #[error("argument `{arg}`: {source}")]
    Coercion {
        arg: String,
        #[source]
        source: CoercionError,
    },

    #[error("argument `{arg}` expects a parenthesized list, got `{token}`")]
    NotAList { arg: String, token: String },

    #[error("unexpected trailing input: {tokens}")]
    Extra { tokens: String },
}

/// One rejected candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub usage: String,
    pub error: BindError,
}

/// No specification in a family accepted the input.
///
/// The rendering lists every attempt and then every candidate's usage and
/// documentation, so the author can see what the family accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoMatchError {
    pub family: String,
    pub input: String,
    pub attempts: Vec<Attempt>,
    /// `(usage, cleaned doc)` for each candidate, in declaration order.
    pub docs: Vec<(String, String)>,
}

impl fmt::Display for NoMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = if self.family.is_empty() {
            "value expressions"
        } else {
            self.family.as_str()
        };
        write!(f, "no match for `{}` in {}", self.input, family)?;
        for attempt in &self.attempts {
            write!(f, "\n  tried `{}`: {}", attempt.usage, attempt.error)?;
        }
        if !self.docs.is_empty() {
            write!(f, "\n\navailable in {}:", family)?;
        }
        for (usage, doc) in &self.docs {
            write!(f, "\n\n  {}", usage)?;
            for line in doc.lines() {
                if line.is_empty() {
                    writeln!(f)?;
                } else {
                    write!(f, "\n      {}", line)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for NoMatchError {}

impl NoMatchError {
    /// Fold in the failure of another family sharing this head word.
    pub fn merge(mut self, other: NoMatchError) -> NoMatchError {
        self.attempts.extend(other.attempts);
        self.docs.extend(other.docs);
        self
    }
}

/// A family was assembled from specifications that break a static rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid declaration `{usage}` in {family}: {message}")]
pub struct DeclarationError {
    pub family: String,
    pub usage: String,
    pub message: String,
}

// ──────────────────────────────────────────────
// Handlers
// ──────────────────────────────────────────────

/// Failure raised while a selected specification ran.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HandlerError {
    /// The ledger rejected a state change.
    #[error("{method} reverted: {reason}")]
    Reverted {
        method: String,
        reason: String,
        invocation: Option<Box<Invocation>>,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Argument(#[from] CoercionError),

    #[error(transparent)]
    Numeric(#[from] NumericError),

    #[error("unknown alias `{0}`")]
    UnknownAlias(String),

    #[error("assertion failed: {0}")]
    Assertion(String),

    /// A nested dispatch inside the handler found nothing to run.
    #[error(transparent)]
    NoMatch(Box<NoMatchError>),

    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// Fatal errors stop the scenario. The rest are reported on the
    /// line's outcome for later assertions to inspect.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HandlerError::Assertion(_) | HandlerError::NoMatch(_) | HandlerError::Argument(_)
        )
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, HandlerError::Reverted { .. })
    }

    /// Short reason used by `Assert Failure` / `Assert Revert`: the revert
    /// reason, or the error text.
    pub fn reason(&self) -> String {
        match self {
            HandlerError::Reverted { reason, .. } => reason.clone(),
            HandlerError::Ledger(e) => e
                .revert_reason()
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string()),
            other => other.to_string(),
        }
    }
}

impl From<NoMatchError> for HandlerError {
    fn from(e: NoMatchError) -> Self {
        HandlerError::NoMatch(Box::new(e))
    }
}

// ──────────────────────────────────────────────
// Interpreter
// ──────────────────────────────────────────────

/// Fatal failure of one scenario line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    NoMatch(#[from] NoMatchError),

    #[error(transparent)]
    Handler(HandlerError),

    #[error("unknown command `{name}`")]
    UnknownFamily { name: String },

    #[error("no sender: `{alias}` does not name an account")]
    MissingSender { alias: String },

    #[error(transparent)]
    Declaration(#[from] DeclarationError),
}

/// An `InterpError` together with the scenario line that raised it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}: `{text}`\n{error}")]
pub struct ScenarioError {
    pub line: u32,
    pub text: String,
    #[source]
    pub error: InterpError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_lists_attempts_and_docs() {
        let err = NoMatchError {
            family: "Bar".into(),
            input: "Nope 1".into(),
            attempts: vec![Attempt {
                usage: "Value".into(),
                error: BindError::Verb {
                    verb: "Value".into(),
                    position: 0,
                },
            }],
            docs: vec![("Bar Value".into(), "Returns the stored value.".into())],
        };
        let text = err.to_string();
        assert!(text.starts_with("no match for `Nope 1` in Bar"));
        assert!(text.contains("tried `Value`: expected `Value` at position 0"));
        assert!(text.contains("\n\n  Bar Value\n      Returns the stored value."));
    }

    #[test]
    fn fatal_kinds() {
        assert!(HandlerError::Assertion("x".into()).is_fatal());
        assert!(HandlerError::Argument(CoercionError::UnknownAlias { alias: "A".into() }).is_fatal());
        assert!(!HandlerError::Ledger(LedgerError::revert("no")).is_fatal());
        assert!(!HandlerError::Failed("x".into()).is_fatal());
    }

    #[test]
    fn reason_prefers_revert_text() {
        let e = HandlerError::Reverted {
            method: "mint".into(),
            reason: "paused".into(),
            invocation: None,
        };
        assert_eq!(e.reason(), "paused");
        assert_eq!(e.to_string(), "mint reverted: paused");
        assert_eq!(
            HandlerError::Ledger(LedgerError::revert("bad")).reason(),
            "bad"
        );
    }
}
