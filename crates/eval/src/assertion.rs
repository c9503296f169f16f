//! `Assert` views.
//!
//! A passing assertion returns the World it was given. A failing one
//! raises `HandlerError::Assertion`, which stops the scenario.
//! `Success`, `Failure` and `Revert` inspect the error left by the most
//! recent Command line, so a script can state that a call was expected to
//! be rejected without the rejection ending the run.

use std::cmp::Ordering;

use crate::arg::{Arg, Bindings};
use crate::coerce::{boolean, core_value, string};
use crate::context::Context;
use crate::dispatch::Family;
use crate::error::{CoercionError, DeclarationError, HandlerError};
use crate::expression::Spec;
use crate::types::Value;
use crate::world::World;

fn check(cx: &Context, holds: bool, message: impl FnOnce() -> String) -> Result<World, HandlerError> {
    if holds {
        Ok(cx.world().clone())
    } else {
        Err(HandlerError::Assertion(message()))
    }
}

fn last_error(cx: &Context) -> Result<Value, CoercionError> {
    Ok(cx
        .last_error()
        .map(|e| Value::String(e.reason()))
        .unwrap_or(Value::Nothing))
}

fn last_reverted(cx: &Context) -> Result<Value, CoercionError> {
    Ok(Value::Bool(cx.last_error().is_some_and(HandlerError::is_revert)))
}

fn pair() -> Vec<Arg> {
    vec![Arg::new("a", core_value()), Arg::new("b", core_value())]
}

async fn equal(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let (x, y) = (b.value("a")?, b.value("b")?);
    check(&cx, x == y, || format!("expected {} to equal {}", x.show(), y.show()))
}

async fn not_equal(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let (x, y) = (b.value("a")?, b.value("b")?);
    check(&cx, x != y, || format!("expected {} not to equal {}", x.show(), y.show()))
}

async fn is_true(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    check(&cx, b.boolean("value")?, || "expected True, got False".to_string())
}

async fn is_false(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    check(&cx, !b.boolean("value")?, || "expected False, got True".to_string())
}

async fn less_than(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let (x, y) = (b.value("a")?, b.value("b")?);
    check(&cx, x.compare(y) == Some(Ordering::Less), || {
        format!("expected {} < {}", x.show(), y.show())
    })
}

async fn greater_than(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let (x, y) = (b.value("a")?, b.value("b")?);
    check(&cx, x.compare(y) == Some(Ordering::Greater), || {
        format!("expected {} > {}", x.show(), y.show())
    })
}

async fn success(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let error = b.value("error")?;
    check(&cx, error.is_nothing(), || {
        format!("expected success, last command failed: {}", error.show())
    })
}

async fn failure(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let error = b.optional("error").map(Value::show);
    let Some(error) = error else {
        return check(&cx, false, || {
            "expected failure, last command succeeded".to_string()
        });
    };
    match b.optional("reason") {
        Some(reason) => check(&cx, reason.show() == error, || {
            format!("expected failure `{}`, got `{}`", reason.show(), error)
        }),
        None => Ok(cx.world().clone()),
    }
}

async fn revert(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    if !b.boolean("reverted")? {
        let what = b
            .optional("error")
            .map(|e| format!("failed without revert: {}", e.show()))
            .unwrap_or_else(|| "succeeded".to_string());
        return check(&cx, false, || format!("expected revert, last command {}", what));
    }
    let error = b.string("error")?;
    match b.optional("message") {
        Some(message) => check(&cx, message.show() == error, || {
            format!("expected revert `{}`, got `{}`", message.show(), error)
        }),
        None => Ok(cx.world().clone()),
    }
}

pub fn assert_family() -> Result<Family, DeclarationError> {
    Family::new(
        "Assert",
        vec![
            Spec::view("Equal", pair(), equal).doc("Fails unless a equals b."),
            Spec::view("NotEqual", pair(), not_equal).doc("Fails if a equals b."),
            Spec::view("True", vec![Arg::new("value", boolean())], is_true)
                .doc("Fails unless the value is true."),
            Spec::view("False", vec![Arg::new("value", boolean())], is_false)
                .doc("Fails unless the value is false."),
            Spec::view("LessThan", pair(), less_than).doc("Fails unless a < b."),
            Spec::view("GreaterThan", pair(), greater_than).doc("Fails unless a > b."),
            Spec::view(
                "Success",
                vec![Arg::new("error", string()).implicit(last_error)],
                success,
            )
            .doc("Fails if the last command failed."),
            Spec::view(
                "Failure",
                vec![
                    Arg::new("error", string()).implicit(last_error),
                    Arg::new("reason", string()).nullable(),
                ],
                failure,
            )
            .doc(
                "
                Fails unless the last command failed.
                With a reason, the failure reason must match it exactly.
                ",
            ),
            Spec::view(
                "Revert",
                vec![
                    Arg::new("error", string()).implicit(last_error),
                    Arg::new("reverted", boolean()).implicit(last_reverted),
                    Arg::new("message", string()).nullable(),
                ],
                revert,
            )
            .doc(
                "
                Fails unless the last command was reverted by the ledger.
                With a message, the revert reason must match it exactly.
                ",
            ),
        ],
    )
}
