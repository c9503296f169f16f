//! Ledger calls made from handlers.
//!
//! These wrap the `Ledger` trait with the sender and attached value of the
//! current World, encode arguments, and turn ledger rejections into
//! `HandlerError::Reverted` so the line reports them instead of aborting.

use scenario_ledger::{Handle, LedgerError, TxOptions};
use tracing::trace;

use crate::context::Context;
use crate::error::HandlerError;
use crate::types::Value;
use crate::world::World;

fn tx_options(cx: &Context) -> Result<TxOptions, HandlerError> {
    Ok(TxOptions {
        from: Some(cx.sender()?),
        value: cx.world().tx_options().value.clone(),
    })
}

fn encode(args: &[Value]) -> Vec<serde_json::Value> {
    args.iter().map(Value::to_ledger).collect()
}

fn rejected(method: &str, error: LedgerError) -> HandlerError {
    match error {
        LedgerError::Reverted { reason } => HandlerError::Reverted {
            method: method.to_string(),
            reason,
            invocation: None,
        },
        other => HandlerError::Ledger(other),
    }
}

/// Deploy a `kind` object and trace it. The caller registers the handle.
pub async fn deploy(cx: &Context, kind: &str, args: &[Value]) -> Result<(World, Handle), HandlerError> {
    let opts = tx_options(cx)?;
    trace!(kind, from = ?opts.from, "deploy");
    let handle = cx
        .world()
        .ledger()
        .deploy(kind, &encode(args), &opts)
        .await
        .map_err(|e| rejected("constructor", e))?;
    let world = cx
        .world()
        .trace(format!("Deployed {} to {}", kind, handle.address), None);
    Ok((world, handle))
}

pub async fn read(cx: &Context, handle: &Handle, method: &str, args: &[Value]) -> Result<Value, HandlerError> {
    trace!(address = %handle.address, method, "read");
    let json = cx
        .world()
        .ledger()
        .read(handle, method, &encode(args))
        .await
        .map_err(|e| rejected(method, e))?;
    Ok(Value::from_ledger(&json))
}

/// Send a state-changing call and trace its invocation. A dry run traces
/// the call without sending it.
pub async fn send(cx: &Context, handle: &Handle, method: &str, args: &[Value]) -> Result<World, HandlerError> {
    let opts = tx_options(cx)?;
    let message = format!("{} {}", handle.kind, method);
    if cx.world().settings().dry_run {
        trace!(address = %handle.address, method, "dry run");
        return Ok(cx.world().trace(format!("[dry run] {}", message), None));
    }
    trace!(address = %handle.address, method, from = ?opts.from, "send");
    let invocation = cx
        .world()
        .ledger()
        .send(handle, method, &encode(args), &opts)
        .await?;
    match &invocation.error {
        None => Ok(cx.world().trace(message, Some(invocation))),
        Some(LedgerError::Reverted { reason }) => Err(HandlerError::Reverted {
            method: method.to_string(),
            reason: reason.clone(),
            invocation: Some(Box::new(invocation.clone())),
        }),
        Some(other) => Err(HandlerError::Ledger(other.clone())),
    }
}
