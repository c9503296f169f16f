use async_trait::async_trait;

use crate::error::LedgerError;
use crate::record::{Handle, Invocation, TxOptions};

/// The boundary between the scenario interpreter and the system under test.
///
/// Every call may suspend. The interpreter awaits each call before binding
/// or executing anything else, so implementations never see concurrent
/// calls from a single scenario run.
///
/// ## Failure model
///
/// - `deploy` and `read` report every failure as `Err`.
/// - `send` reports a rejected call as `Ok(Invocation)` with `error` set,
///   so callers can inspect the failure. `Err` is reserved for transport
///   or backend problems where no call was attempted.
///
/// Timeouts and retries, if any, belong to the implementation.
#[async_trait]
pub trait Ledger: Send + Sync + 'static {
    /// Unlocked accounts, in a stable order. Scenario runs name them
    /// `Root`, `Geoff`, ... in this order.
    async fn accounts(&self) -> Result<Vec<String>, LedgerError>;

    /// Deploy a new object of `kind` with constructor arguments.
    async fn deploy(
        &self,
        kind: &str,
        args: &[serde_json::Value],
        opts: &TxOptions,
    ) -> Result<Handle, LedgerError>;

    /// Call a read-only method.
    async fn read(
        &self,
        handle: &Handle,
        method: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value, LedgerError>;

    /// Send a state-changing call.
    async fn send(
        &self,
        handle: &Handle,
        method: &str,
        args: &[serde_json::Value],
        opts: &TxOptions,
    ) -> Result<Invocation, LedgerError>;
}
