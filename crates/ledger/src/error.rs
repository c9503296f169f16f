/// All errors that can be returned by a Ledger implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The program rejected the call and rolled back its state changes.
    #[error("reverted: {reason}")]
    Reverted { reason: String },

    /// No program is registered for the requested contract kind.
    #[error("unknown contract kind: {kind}")]
    UnknownKind { kind: String },

    /// No contract is deployed at the given address.
    #[error("no contract at address {address}")]
    UnknownContract { address: String },

    /// The contract exists but does not expose the method.
    #[error("{kind} has no method {method}")]
    UnknownMethod { kind: String, method: String },

    /// An argument could not be decoded by the program.
    #[error("invalid argument for {method}: {message}")]
    InvalidArgument { method: String, message: String },

    /// A backend-specific failure (transport, serialization, etc.).
    #[error("ledger backend error: {0}")]
    Backend(String),
}

impl LedgerError {
    pub fn revert(reason: impl Into<String>) -> Self {
        LedgerError::Reverted {
            reason: reason.into(),
        }
    }

    /// The revert reason, when this error is a revert.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            LedgerError::Reverted { reason } => Some(reason),
            _ => None,
        }
    }
}
