//! Core value expressions.
//!
//! Evaluated whenever a parenthesized argument does not start with the
//! name of a value family: `(Exactly 5)`, `(Exp 1.5)`, `(Add a b)`,
//! `(List 1 2 3)`, or a bare literal.

use crate::arg::{Arg, Bindings};
use crate::coerce::{address, core_value, number, string, Coercion};
use crate::context::Context;
use crate::dispatch::Family;
use crate::error::{DeclarationError, HandlerError, NumericError};
use crate::expression::Spec;
use crate::numeric::Number;
use crate::types::Value;

type NumericOp = fn(&Number, &Number) -> Result<Number, NumericError>;

fn pair(coercion: fn() -> Coercion) -> Vec<Arg> {
    vec![Arg::new("a", coercion()), Arg::new("b", coercion())]
}

fn arithmetic(verb: &str, op: NumericOp, doc: &str) -> Spec {
    Spec::fetcher(verb, pair(number), move |_cx, b| async move {
        let result = op(&b.number("a")?, &b.number("b")?)?;
        Ok::<_, HandlerError>(Value::Number(result))
    })
    .doc(doc)
}

fn comparison(verb: &str, holds: fn(&Value, &Value) -> bool, doc: &str) -> Spec {
    Spec::fetcher(verb, pair(core_value), move |_cx, b| async move {
        Ok::<_, HandlerError>(Value::Bool(holds(b.value("a")?, b.value("b")?)))
    })
    .doc(doc)
}

fn constant(verb: &str, value: Value) -> Spec {
    Spec::fetcher(verb, vec![], move |_cx, _b| {
        let value = value.clone();
        async move { Ok::<_, HandlerError>(value) }
    })
}

async fn exactly(_cx: Context, b: Bindings) -> Result<Value, HandlerError> {
    Ok(Value::Number(b.number("n")?))
}

async fn exp(_cx: Context, b: Bindings) -> Result<Value, HandlerError> {
    Ok(Value::Number(Number::exp(b.number("n")?)?))
}

async fn min(_cx: Context, b: Bindings) -> Result<Value, HandlerError> {
    Ok(Value::Number(b.number("a")?.min(b.number("b")?)))
}

async fn max(_cx: Context, b: Bindings) -> Result<Value, HandlerError> {
    Ok(Value::Number(b.number("a")?.max(b.number("b")?)))
}

async fn passthrough(_cx: Context, b: Bindings) -> Result<Value, HandlerError> {
    b.value("value").cloned()
}

fn less_than(a: &Value, b: &Value) -> bool {
    a.compare(b) == Some(std::cmp::Ordering::Less)
}

fn greater_than(a: &Value, b: &Value) -> bool {
    a.compare(b) == Some(std::cmp::Ordering::Greater)
}

pub fn core_values() -> Result<Family, DeclarationError> {
    Family::new(
        "",
        vec![
            Spec::fetcher("Exactly", vec![Arg::new("n", number())], exactly)
                .doc("Returns the number as written, e.g. `(Exactly 1.5)`."),
            Spec::fetcher("Exp", vec![Arg::new("n", number())], exp)
                .doc("Returns n × 10^18, e.g. `(Exp 1.5)` is `1.5e18`."),
            arithmetic("Add", Number::checked_add, "Returns a + b."),
            arithmetic("Sub", Number::checked_sub, "Returns a - b."),
            arithmetic("Mul", Number::checked_mul, "Returns a * b."),
            arithmetic("Div", Number::checked_div, "Returns a / b."),
            Spec::fetcher("Min", pair(number), min).doc("Returns the smaller of a and b."),
            Spec::fetcher("Max", pair(number), max).doc("Returns the larger of a and b."),
            comparison("Equal", |a, b| a == b, "True when a equals b."),
            comparison("LessThan", less_than, "True when a < b."),
            comparison("GreaterThan", greater_than, "True when a > b."),
            Spec::fetcher(
                "List",
                vec![Arg::new("value", core_value()).variadic().mapped()],
                passthrough,
            )
            .doc("Returns a list of the given values, e.g. `(List 1 2 3)`."),
            Spec::fetcher("Address", vec![Arg::new("value", address())], passthrough)
                .doc("Resolves an account, alias or literal to an address."),
            Spec::fetcher("String", vec![Arg::new("value", string())], passthrough)
                .doc("Returns the token as a string."),
            constant("True", Value::Bool(true)),
            constant("False", Value::Bool(false)),
            constant("Nothing", Value::Nothing),
            Spec::fetcher("", vec![Arg::new("value", core_value()).catchall()], passthrough)
                .doc("A literal: number, True/False, known address, else a string."),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::world::{Settings, World};
    use scenario_core::parse_event;
    use scenario_ledger::MemoryLedger;
    use std::sync::Arc;

    async fn eval(src: &str) -> Result<Value, crate::error::CoercionError> {
        let world = World::new(Arc::new(MemoryLedger::new()), Settings::default())
            .with_account("Root", format!("0x{:040x}", 1));
        let cx = Context::new(world, Arc::new(Catalog::new().unwrap()));
        cx.evaluate(&parse_event(src).unwrap()).await
    }

    #[tokio::test]
    async fn literals() {
        assert_eq!(eval("5").await.unwrap(), Value::number(5));
        assert_eq!(eval("True").await.unwrap(), Value::Bool(true));
        assert_eq!(eval("Nothing").await.unwrap(), Value::Nothing);
        assert_eq!(eval("hello").await.unwrap(), Value::string("hello"));
        assert_eq!(
            eval("Root").await.unwrap(),
            Value::Address(format!("0x{:040x}", 1))
        );
    }

    #[tokio::test]
    async fn arithmetic_nests() {
        assert_eq!(eval("Add 1 (Mul 2 3)").await.unwrap(), Value::number(7));
        assert_eq!(eval("Sub 1 3").await.unwrap(), Value::number(-2));
        assert_eq!(
            eval("Exp 1.5").await.unwrap(),
            Value::Number(Number::parse("1500000000000000000").unwrap())
        );
        assert_eq!(eval("Max 3 (Min 9 4)").await.unwrap(), Value::number(4));
        assert!(eval("Div 1 0").await.is_err());
    }

    #[tokio::test]
    async fn comparisons() {
        assert_eq!(eval("Equal 1e18 (Exp 1)").await.unwrap(), Value::Bool(true));
        assert_eq!(eval("LessThan 1 2").await.unwrap(), Value::Bool(true));
        assert_eq!(eval("GreaterThan 1 2").await.unwrap(), Value::Bool(false));
        assert_eq!(
            eval("LessThan 1 abc").await.unwrap(),
            Value::Bool(false)
        );
    }

    #[tokio::test]
    async fn lists_keep_input_order() {
        assert_eq!(
            eval("List 3 x (Add 1 1)").await.unwrap(),
            Value::List(vec![
                Value::number(3),
                Value::string("x"),
                Value::number(2)
            ])
        );
    }

    #[tokio::test]
    async fn double_wrapped_expressions_are_unwrapped() {
        assert_eq!(eval("((Exactly 2))").await.unwrap(), Value::number(2));
    }
}
