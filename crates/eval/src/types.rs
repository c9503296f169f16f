//! Runtime values.
//!
//! A closed tagged union. Every coercion produces one, every Fetcher
//! returns one, and assertions compare them.

use std::cmp::Ordering;
use std::fmt;

use scenario_core::Event;

use crate::numeric::{Notation, Number};

#[derive(Debug, Clone)]
pub enum Value {
    /// `0x`-prefixed, 40 hex digit ledger address.
    Address(String),
    Number(Number),
    String(String),
    Bool(bool),
    List(Vec<Value>),
    /// Raw, unevaluated token tree.
    Event(Event),
    /// Explicit "no value". Distinct from an Arg that was never bound.
    Nothing,
}

/// Whether `s` is a literal ledger address.
pub fn is_address_literal(s: &str) -> bool {
    s.len() == 42
        && (s.starts_with("0x") || s.starts_with("0X"))
        && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Address(_) => "Address",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Bool(_) => "Bool",
            Value::List(_) => "List",
            Value::Event(_) => "Event",
            Value::Nothing => "Nothing",
        }
    }

    pub fn number(n: impl Into<Number>) -> Value {
        Value::Number(n.into())
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&str> {
        match self {
            Value::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Ordering within a tag. `None` across tags and for tags without an
    /// order (events that differ).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Address(a), Value::Address(b)) => {
                Some(a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()))
            }
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Nothing, Value::Nothing) => Some(Ordering::Equal),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (Value::Event(a), Value::Event(b)) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Human-readable rendering used in traces and assertion messages.
    pub fn show(&self) -> String {
        match self {
            Value::Address(a) => a.clone(),
            Value::Number(n) => n.render(),
            Value::String(s) => s.clone(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::List(items) => format!(
                "[{}]",
                items.iter().map(Value::show).collect::<Vec<_>>().join(", ")
            ),
            Value::Event(e) => e.to_string(),
            Value::Nothing => "Nothing".to_string(),
        }
    }

    // ──────────────────────────────────────────────
    // Ledger wire values
    // ──────────────────────────────────────────────

    /// Encode for a ledger call. Numbers travel as decimal strings.
    pub fn to_ledger(&self) -> serde_json::Value {
        match self {
            Value::Address(a) => serde_json::Value::String(a.clone()),
            Value::Number(n) => n.to_ledger(),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_ledger).collect())
            }
            Value::Event(e) => serde_json::Value::String(e.to_string()),
            Value::Nothing => serde_json::Value::Null,
        }
    }

    /// Decode a ledger result. Strings that look like addresses become
    /// Addresses, strings holding a plain decimal become Numbers, objects
    /// are kept as their JSON text.
    pub fn from_ledger(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Nothing,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match Number::parse(&n.to_string()) {
                Ok(num) => Value::Number(num),
                Err(_) => Value::String(n.to_string()),
            },
            serde_json::Value::String(s) if is_address_literal(s) => Value::Address(s.clone()),
            serde_json::Value::String(s) => match Number::parse(s) {
                Ok(num) if num.notation() == Notation::Plain => Value::Number(num),
                _ => Value::String(s.clone()),
            },
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_ledger).collect())
            }
            serde_json::Value::Object(_) => Value::String(json.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Address(a), Value::Address(b)) => a.eq_ignore_ascii_case(b),
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Event(a), Value::Event(b)) => a == b,
            (Value::Nothing, Value::Nothing) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.show())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}
