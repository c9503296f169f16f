//! Coercions: Event → Value conversions used by Args.
//!
//! A coercion on an atom parses the literal. A coercion on a
//! parenthesized list evaluates it as a value expression first and then
//! checks the tag of the result, so `(Bar Value)` is a valid Number
//! argument when `Bar Value` yields a Number.

use std::sync::Arc;

use async_trait::async_trait;
use scenario_core::Event;

use crate::context::Context;
use crate::error::CoercionError;
use crate::numeric::Number;
use crate::types::Value;

#[async_trait]
pub trait Coerce: Send + Sync {
    /// Kind name shown in usage strings and errors.
    fn kind(&self) -> String;

    async fn coerce(&self, cx: &Context, event: &Event) -> Result<Value, CoercionError>;
}

pub type Coercion = Arc<dyn Coerce>;

async fn evaluate_as(
    cx: &Context,
    event: &Event,
    expected: &str,
    accept: impl Fn(&Value) -> bool + Send,
) -> Result<Value, CoercionError> {
    let value = cx.evaluate(event).await?;
    if accept(&value) {
        Ok(value)
    } else {
        Err(CoercionError::expected(
            expected,
            format!("{} = {}", event, value.show()),
        ))
    }
}

// ──────────────────────────────────────────────
// Scalars
// ──────────────────────────────────────────────

struct NumberCoercion;

#[async_trait]
impl Coerce for NumberCoercion {
    fn kind(&self) -> String {
        "Number".into()
    }

    async fn coerce(&self, cx: &Context, event: &Event) -> Result<Value, CoercionError> {
        match event {
            Event::Atom(s) => Ok(Value::Number(Number::parse(s)?)),
            Event::List(_) => evaluate_as(cx, event, "Number", |v| v.as_number().is_some()).await,
        }
    }
}

struct StringCoercion;

#[async_trait]
impl Coerce for StringCoercion {
    fn kind(&self) -> String {
        "String".into()
    }

    async fn coerce(&self, cx: &Context, event: &Event) -> Result<Value, CoercionError> {
        match event {
            Event::Atom(s) => Ok(Value::String(s.clone())),
            Event::List(_) => evaluate_as(cx, event, "String", |v| v.as_str().is_some()).await,
        }
    }
}

/// Accepted boolean spellings, compared case-insensitively.
const TRUE_WORDS: [&str; 3] = ["true", "yes", "1"];
const FALSE_WORDS: [&str; 3] = ["false", "no", "0"];

fn parse_bool(s: &str) -> Option<bool> {
    if TRUE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(s)) {
        Some(true)
    } else if FALSE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(s)) {
        Some(false)
    } else {
        None
    }
}

struct BoolCoercion;

#[async_trait]
impl Coerce for BoolCoercion {
    fn kind(&self) -> String {
        "Bool".into()
    }

    async fn coerce(&self, cx: &Context, event: &Event) -> Result<Value, CoercionError> {
        match event {
            Event::Atom(s) => parse_bool(s)
                .map(Value::Bool)
                .ok_or_else(|| CoercionError::expected("Bool", s)),
            Event::List(_) => evaluate_as(cx, event, "Bool", |v| v.as_bool().is_some()).await,
        }
    }
}

struct AddressCoercion;

#[async_trait]
impl Coerce for AddressCoercion {
    fn kind(&self) -> String {
        "Address".into()
    }

    async fn coerce(&self, cx: &Context, event: &Event) -> Result<Value, CoercionError> {
        match event {
            Event::Atom(s) => cx
                .world()
                .resolve_address(s)
                .map(Value::Address)
                .ok_or_else(|| CoercionError::UnknownAlias { alias: s.clone() }),
            Event::List(_) => {
                evaluate_as(cx, event, "Address", |v| v.as_address().is_some()).await
            }
        }
    }
}

struct EventCoercion;

#[async_trait]
impl Coerce for EventCoercion {
    fn kind(&self) -> String {
        "Event".into()
    }

    async fn coerce(&self, _cx: &Context, event: &Event) -> Result<Value, CoercionError> {
        Ok(Value::Event(event.clone()))
    }
}

/// Literal inference: Number, then `True`/`False`, then a resolvable
/// Address, else the raw String. Lists are evaluated.
struct CoreValueCoercion;

#[async_trait]
impl Coerce for CoreValueCoercion {
    fn kind(&self) -> String {
        "Value".into()
    }

    async fn coerce(&self, cx: &Context, event: &Event) -> Result<Value, CoercionError> {
        let s = match event {
            Event::List(_) => return cx.evaluate(event).await,
            Event::Atom(s) => s,
        };
        if let Ok(n) = Number::parse(s) {
            return Ok(Value::Number(n));
        }
        if s.eq_ignore_ascii_case("true") {
            return Ok(Value::Bool(true));
        }
        if s.eq_ignore_ascii_case("false") {
            return Ok(Value::Bool(false));
        }
        if let Some(addr) = cx.world().resolve_address(s) {
            return Ok(Value::Address(addr));
        }
        Ok(Value::String(s.clone()))
    }
}

// ──────────────────────────────────────────────
// Combinators
// ──────────────────────────────────────────────

struct ListOf(Coercion);

#[async_trait]
impl Coerce for ListOf {
    fn kind(&self) -> String {
        format!("List<{}>", self.0.kind())
    }

    async fn coerce(&self, cx: &Context, event: &Event) -> Result<Value, CoercionError> {
        let items = event
            .as_list()
            .ok_or_else(|| CoercionError::expected(self.kind(), event))?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.0.coerce(cx, item).await?);
        }
        Ok(Value::List(out))
    }
}

struct OneOf(Vec<String>);

#[async_trait]
impl Coerce for OneOf {
    fn kind(&self) -> String {
        self.0.join("|")
    }

    async fn coerce(&self, _cx: &Context, event: &Event) -> Result<Value, CoercionError> {
        event
            .as_atom()
            .and_then(|s| self.0.iter().find(|c| c.eq_ignore_ascii_case(s)))
            .map(|c| Value::String(c.clone()))
            .ok_or_else(|| CoercionError::expected(self.kind(), event))
    }
}

/// Whatever `inner` accepts, except the `reserved` words.
struct NoneOf {
    inner: Coercion,
    reserved: Vec<String>,
}

#[async_trait]
impl Coerce for NoneOf {
    fn kind(&self) -> String {
        self.inner.kind()
    }

    async fn coerce(&self, cx: &Context, event: &Event) -> Result<Value, CoercionError> {
        let reserved = event
            .as_atom()
            .is_some_and(|s| self.reserved.iter().any(|r| r.eq_ignore_ascii_case(s)));
        if reserved {
            return Err(CoercionError::expected(
                format!("{} other than {}", self.kind(), self.reserved.join("|")),
                event,
            ));
        }
        self.inner.coerce(cx, event).await
    }
}

pub fn number() -> Coercion {
    Arc::new(NumberCoercion)
}

pub fn string() -> Coercion {
    Arc::new(StringCoercion)
}

pub fn boolean() -> Coercion {
    Arc::new(BoolCoercion)
}

pub fn address() -> Coercion {
    Arc::new(AddressCoercion)
}

/// Never fails: keeps the raw token tree.
pub fn event() -> Coercion {
    Arc::new(EventCoercion)
}

pub fn core_value() -> Coercion {
    Arc::new(CoreValueCoercion)
}

/// A parenthesized list with `item` applied to each element, in order,
/// stopping at the first failure.
pub fn list_of(item: Coercion) -> Coercion {
    Arc::new(ListOf(item))
}

/// One of a fixed set of words, matched case-insensitively and returned
/// in its declared spelling.
pub fn one_of(choices: &[&str]) -> Coercion {
    Arc::new(OneOf(choices.iter().map(|c| c.to_string()).collect()))
}

pub fn none_of(inner: Coercion, reserved: &[&str]) -> Coercion {
    Arc::new(NoneOf {
        inner,
        reserved: reserved.iter().map(|r| r.to_string()).collect(),
    })
}
