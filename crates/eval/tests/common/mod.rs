//! Fixture catalog for integration tests: a `Bar` contract that stores a
//! value, with `Deploy Bar`, `Bar SetValue`, `Bar Fail`, `Bar Deposit`
//! commands and `Bar Value`, `Bar Owner`, `Bar Deposited` fetchers.

#![allow(dead_code)]

use std::sync::Arc;

use scenario_eval::arg::registered;
use scenario_eval::world::alias_path;
use scenario_eval::{
    coerce, invoke, Arg, Bindings, Catalog, Context, HandlerError, Interpreter, InterpreterConfig,
    RegistryEntry, Spec, Value, World,
};
use scenario_ledger::memory::arg;
use scenario_ledger::{CallContext, Ledger, LedgerError, MemoryLedger, Program, ProgramState};
use serde_json::json;

pub const BAR_REJECTED: &str = "bar: rejected";

pub struct Bar;

impl Program for Bar {
    fn kind(&self) -> &str {
        "Bar"
    }

    fn construct(
        &self,
        cx: &CallContext<'_>,
        args: &[serde_json::Value],
    ) -> Result<ProgramState, LedgerError> {
        let mut state = ProgramState::new();
        state.insert("value".into(), arg("constructor", args, 0)?.clone());
        state.insert("owner".into(), json!(cx.sender));
        state.insert("deposit".into(), json!("0"));
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
                kind: "Bar".into(),
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
            "setValue" => {
                if state.get("owner").and_then(|o| o.as_str()) != Some(cx.sender) {
                    return Err(LedgerError::revert("not owner"));
                }
                let v = arg(method, args, 0)?.clone();
                state.insert("value".into(), v.clone());
                Ok(v)
            }
            "deposit" => {
                let v = json!(cx.value.unwrap_or("0"));
                state.insert("deposit".into(), v.clone());
                Ok(v)
            }
            "fail" => {
                state.insert("value".into(), json!("-1"));
                Err(LedgerError::revert(BAR_REJECTED))
            }
            other => Err(LedgerError::UnknownMethod {
                kind: "Bar".into(),
                method: other.into(),
            }),
        }
    }
}

pub fn ledger() -> Arc<dyn Ledger> {
    Arc::new(MemoryLedger::with_account_count(6).with_program(Bar))
}

fn bar() -> Arg {
    Arg::new("bar", coerce::address()).implicit(registered(alias_path(&["Bar"])))
}

async fn deploy_bar(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let value = b.value("value")?.clone();
    let (world, handle) = invoke::deploy(&cx, "Bar", &[value.clone()]).await?;
    Ok(world.register(
        &[alias_path(&["Bar"])],
        RegistryEntry::new(handle).with_field("value", value),
    ))
}

async fn set_value(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let handle = cx.world().find_handle(&b.address("bar")?)?;
    invoke::send(&cx, &handle, "setValue", &[b.value("value")?.clone()]).await
}

async fn fail(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let handle = cx.world().find_handle(&b.address("bar")?)?;
    invoke::send(&cx, &handle, "fail", &[]).await
}

async fn deposit(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let handle = cx.world().find_handle(&b.address("bar")?)?;
    invoke::send(&cx, &handle, "deposit", &[]).await
}

fn reader(method: &'static str) -> Spec {
    let verb = match method {
        "value" => "Value",
        "owner" => "Owner",
        _ => "Deposited",
    };
    let field = if method == "deposited" { "deposit" } else { method };
    Spec::fetcher(verb, vec![bar()], move |cx: Context, b: Bindings| async move {
        let handle = cx.world().find_handle(&b.address("bar")?)?;
        invoke::read(&cx, &handle, field, &[]).await
    })
    .doc(&format!("Returns the Bar's {}.", method))
}

pub fn catalog() -> Catalog {
    Catalog::new()
        .and_then(|c| {
            c.with_commands(
                "Deploy",
                vec![Spec::command(
                    "Bar",
                    vec![Arg::new("value", coerce::number())],
                    deploy_bar,
                )
                .doc("Deploys a Bar holding `value`, registered as `Bar`.")],
            )
        })
        .and_then(|c| {
            c.with_commands(
                "Bar",
                vec![
                    Spec::command(
                        "SetValue",
                        vec![bar(), Arg::new("value", coerce::number())],
                        set_value,
                    )
                    .doc("Owner only."),
                    Spec::command("Fail", vec![bar()], fail).doc("Always reverts."),
                    Spec::command("Deposit", vec![bar()], deposit)
                        .doc("Records the attached value."),
                ],
            )
        })
        .and_then(|c| {
            c.with_values(
                "Bar",
                vec![reader("value"), reader("owner"), reader("deposited")],
            )
        })
        .expect("fixture catalog is well formed")
}

pub fn interpreter(config: InterpreterConfig) -> Interpreter {
    Interpreter::new(catalog(), config)
}

pub async fn start() -> (Interpreter, World) {
    let interp = interpreter(InterpreterConfig::default());
    let world = interp.start(ledger()).await.unwrap();
    (interp, world)
}

/// Value the World's registry holds for the field of alias `Bar`.
pub fn registered_field(world: &World, field: &str) -> Option<Value> {
    world.lookup("Bar").ok()?.field(field).cloned()
}
