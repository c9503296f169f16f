use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A deployed object on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    /// Program kind the object was deployed from (e.g. `"Bar"`).
    pub kind: String,
    /// `0x`-prefixed, 40 hex digit address.
    pub address: String,
}

/// Per-call transaction options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOptions {
    /// Sending account address.
    pub from: Option<String>,
    /// Native value attached to the call, as a decimal string.
    pub value: Option<String>,
}

impl TxOptions {
    pub fn sender(address: impl Into<String>) -> Self {
        TxOptions {
            from: Some(address.into()),
            value: None,
        }
    }
}

/// Receipt of a state-changing call that was mined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
}

/// Result of a `send`: the call's return value, the failure if it was
/// rejected, and the receipt if it was mined. A rejected call still
/// yields an `Invocation`; only transport-level problems are returned as
/// `Err` from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub method: String,
    pub value: Option<serde_json::Value>,
    #[serde(skip)]
    pub error: Option<LedgerError>,
    pub receipt: Option<Receipt>,
}

impl Invocation {
    pub fn succeeded(
        method: impl Into<String>,
        value: serde_json::Value,
        receipt: Receipt,
    ) -> Self {
        Invocation {
            method: method.into(),
            value: Some(value),
            error: None,
            receipt: Some(receipt),
        }
    }

    pub fn failed(method: impl Into<String>, error: LedgerError) -> Self {
        Invocation {
            method: method.into(),
            value: None,
            error: Some(error),
            receipt: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
