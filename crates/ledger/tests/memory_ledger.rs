//! Behavior of the in-memory ledger against a small counter program.

use scenario_ledger::memory::{arg, derive_address};
use scenario_ledger::{
    CallContext, Handle, Ledger, LedgerError, MemoryLedger, Program, ProgramState, TxOptions,
};
use serde_json::json;

struct Counter;

impl Program for Counter {
    fn kind(&self) -> &str {
        "Counter"
    }

    fn construct(
        &self,
        cx: &CallContext<'_>,
        args: &[serde_json::Value],
    ) -> Result<ProgramState, LedgerError> {
        let start = arg("constructor", args, 0)?.clone();
        let mut state = ProgramState::new();
        state.insert("count".into(), start);
        state.insert("owner".into(), json!(cx.sender));
        Ok(state)
    }

    fn read(
        &self,
        state: &ProgramState,
        method: &str,
        _args: &[serde_json::Value],
    ) -> Result<serde_json::Value, LedgerError> {
        state
            .get(method)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownMethod {
                kind: "Counter".into(),
                method: method.into(),
            })
    }

    fn send(
        &self,
        cx: &CallContext<'_>,
        state: &mut ProgramState,
        method: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value, LedgerError> {
        match method {
            "bump" => {
                let n = state["count"].as_i64().unwrap_or(0) + 1;
                state.insert("count".into(), json!(n));
                Ok(json!(n))
            }
            "bumpThenFail" => {
                state.insert("count".into(), json!(-1));
                Err(LedgerError::revert("always fails"))
            }
            "set" => {
                if Some(cx.sender) != state["owner"].as_str() {
                    return Err(LedgerError::revert("not owner"));
                }
                let v = arg(method, args, 0)?.clone();
                state.insert("count".into(), v.clone());
                Ok(v)
            }
            other => Err(LedgerError::UnknownMethod {
                kind: "Counter".into(),
                method: other.into(),
            }),
        }
    }
}

fn ledger() -> MemoryLedger {
    MemoryLedger::with_account_count(3).with_program(Counter)
}

#[tokio::test]
async fn accounts_are_stable_and_distinct() {
    let l = ledger();
    let a = l.accounts().await.unwrap();
    assert_eq!(a.len(), 3);
    assert_eq!(a, ledger().accounts().await.unwrap());
    assert_ne!(a[0], a[1]);
    assert!(a.iter().all(|x| x.len() == 42 && x.starts_with("0x")));
}

#[tokio::test]
async fn deploy_then_read() {
    let l = ledger();
    let h = l
        .deploy("Counter", &[json!(5)], &TxOptions::default())
        .await
        .unwrap();
    assert_eq!(h.kind, "Counter");
    assert_eq!(h.address, derive_address("contract", 0));
    assert_eq!(l.read(&h, "count", &[]).await.unwrap(), json!(5));
}

#[tokio::test]
async fn deploy_unknown_kind_fails() {
    let err = ledger()
        .deploy("Nope", &[], &TxOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::UnknownKind {
            kind: "Nope".into()
        }
    );
}

#[tokio::test]
async fn successful_send_commits_and_mines() {
    let l = ledger();
    let h = l
        .deploy("Counter", &[json!(1)], &TxOptions::default())
        .await
        .unwrap();
    let inv = l
        .send(&h, "bump", &[], &TxOptions::default())
        .await
        .unwrap();
    assert!(inv.is_success());
    assert_eq!(inv.value, Some(json!(2)));
    let receipt = inv.receipt.unwrap();
    assert_eq!(receipt.block_number, 2);
    assert!(receipt.tx_hash.starts_with("0x"));
    assert_eq!(l.read(&h, "count", &[]).await.unwrap(), json!(2));
}

#[tokio::test]
async fn rejected_send_leaves_state_untouched() {
    let l = ledger();
    let h = l
        .deploy("Counter", &[json!(7)], &TxOptions::default())
        .await
        .unwrap();
    let before = l.block_number();
    let inv = l
        .send(&h, "bumpThenFail", &[], &TxOptions::default())
        .await
        .unwrap();
    assert!(!inv.is_success());
    assert_eq!(
        inv.error.as_ref().and_then(|e| e.revert_reason()),
        Some("always fails")
    );
    assert!(inv.receipt.is_none());
    assert_eq!(l.read(&h, "count", &[]).await.unwrap(), json!(7));
    assert_eq!(l.block_number(), before);
}

#[tokio::test]
async fn sender_comes_from_tx_options() {
    let l = ledger();
    let accounts = l.accounts().await.unwrap();
    let h = l
        .deploy("Counter", &[json!(0)], &TxOptions::sender(accounts[1].clone()))
        .await
        .unwrap();

    let as_root = l
        .send(&h, "set", &[json!(9)], &TxOptions::default())
        .await
        .unwrap();
    assert_eq!(
        as_root.error,
        Some(LedgerError::revert("not owner"))
    );

    let as_owner = l
        .send(&h, "set", &[json!(9)], &TxOptions::sender(accounts[1].clone()))
        .await
        .unwrap();
    assert!(as_owner.is_success());
    assert_eq!(l.state_of(&h.address).unwrap()["count"], json!(9));
}

#[tokio::test]
async fn unknown_contract_is_a_transport_error() {
    let l = ledger();
    let ghost = Handle {
        kind: "Counter".into(),
        address: derive_address("ghost", 0),
    };
    assert!(matches!(
        l.send(&ghost, "bump", &[], &TxOptions::default()).await,
        Err(LedgerError::UnknownContract { .. })
    ));
    assert!(matches!(
        l.read(&ghost, "count", &[]).await,
        Err(LedgerError::UnknownContract { .. })
    ));
}
