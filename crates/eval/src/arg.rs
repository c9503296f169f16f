//! Argument descriptors and the binder.
//!
//! Binding order:
//! 1. implicit Args are resolved from the Context and consume nothing;
//! 2. the remaining Args take positional tokens left to right;
//! 3. leftover tokens reject the specification unless it is a catchall.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use scenario_core::Event;

use crate::coerce::Coercion;
use crate::context::Context;
use crate::error::{BindError, CoercionError, HandlerError};
use crate::numeric::Number;
use crate::types::Value;
use crate::world::AliasPath;

/// Produces the value of an implicit Arg.
pub type Resolver = Arc<dyn Fn(&Context) -> Result<Value, CoercionError> + Send + Sync>;

#[derive(Clone)]
pub struct Arg {
    name: String,
    coercion: Coercion,
    implicit: Option<Resolver>,
    variadic: bool,
    mapped: bool,
    nullable: bool,
    default: Option<Value>,
    catchall: bool,
    rescue: Option<Value>,
}

impl Arg {
    pub fn new(name: impl Into<String>, coercion: Coercion) -> Self {
        Arg {
            name: name.into(),
            coercion,
            implicit: None,
            variadic: false,
            mapped: false,
            nullable: false,
            default: None,
            catchall: false,
            rescue: None,
        }
    }

    /// Take the value from the Context instead of the input.
    pub fn implicit(
        mut self,
        resolver: impl Fn(&Context) -> Result<Value, CoercionError> + Send + Sync + 'static,
    ) -> Self {
        self.implicit = Some(Arc::new(resolver));
        self
    }

    /// Consume all remaining tokens.
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Coerce each element of a parenthesized list into a List.
    pub fn mapped(mut self) -> Self {
        self.mapped = true;
        self
    }

    /// Bind to `Nothing` when input is exhausted.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Bind to `value` when input is exhausted.
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Mark the owning specification as a fallback.
    pub fn catchall(mut self) -> Self {
        self.catchall = true;
        self
    }

    /// Bind to `value` when the coercion fails.
    pub fn rescue(mut self, value: Value) -> Self {
        self.rescue = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_implicit(&self) -> bool {
        self.implicit.is_some()
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn is_catchall(&self) -> bool {
        self.catchall
    }

    /// `<name:Kind>` for required Args, `[name:Kind]` for optional ones,
    /// `...` after variadic ones. Implicit Args have no usage.
    pub fn usage(&self) -> Option<String> {
        if self.is_implicit() {
            return None;
        }
        let mut kind = self.coercion.kind();
        if self.mapped {
            kind = format!("({}...)", kind);
        }
        let body = format!("{}:{}", self.name, kind);
        let text = if self.nullable || self.default.is_some() {
            format!("[{}]", body)
        } else {
            format!("<{}>", body)
        };
        Some(if self.variadic {
            format!("{}...", text)
        } else {
            text
        })
    }

    fn when_absent(&self) -> Option<Value> {
        if self.nullable {
            Some(Value::Nothing)
        } else {
            self.default.clone()
        }
    }

    fn recover(&self, error: CoercionError) -> Result<Value, BindError> {
        match &self.rescue {
            Some(value) => Ok(value.clone()),
            None => Err(BindError::Coercion {
                arg: self.name.clone(),
                source: error,
            }),
        }
    }

    async fn coerce_each(&self, cx: &Context, items: &[Event]) -> Result<Value, CoercionError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.coercion.coerce(cx, item).await?);
        }
        Ok(Value::List(out))
    }

    async fn bind_variadic(&self, cx: &Context, rest: &[Event]) -> Result<Value, BindError> {
        if rest.is_empty() {
            if let Some(value) = self.when_absent() {
                return Ok(value);
            }
            if self.mapped {
                return Ok(Value::List(Vec::new()));
            }
        }
        let coerced = if self.mapped {
            self.coerce_each(cx, rest).await
        } else {
            self.coercion.coerce(cx, &Event::List(rest.to_vec())).await
        };
        match coerced {
            Ok(value) => Ok(value),
            Err(_) if rest.is_empty() && self.rescue.is_none() => Err(BindError::Missing {
                arg: self.name.clone(),
            }),
            Err(e) => self.recover(e),
        }
    }

    async fn bind_one(&self, cx: &Context, token: &Event) -> Result<Value, BindError> {
        let coerced = if self.mapped {
            match token {
                Event::List(items) => self.coerce_each(cx, items).await,
                Event::Atom(_) => {
                    return Err(BindError::NotAList {
                        arg: self.name.clone(),
                        token: token.to_string(),
                    })
                }
            }
        } else {
            self.coercion.coerce(cx, token).await
        };
        coerced.or_else(|e| self.recover(e))
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arg")
            .field("name", &self.name)
            .field("kind", &self.coercion.kind())
            .field("implicit", &self.is_implicit())
            .field("variadic", &self.variadic)
            .field("mapped", &self.mapped)
            .field("nullable", &self.nullable)
            .field("default", &self.default)
            .field("catchall", &self.catchall)
            .finish()
    }
}

// ──────────────────────────────────────────────
// Implicit resolvers
// ──────────────────────────────────────────────

/// Address of the object registered at `path`.
pub fn registered(
    path: AliasPath,
) -> impl Fn(&Context) -> Result<Value, CoercionError> + Send + Sync + 'static {
    move |cx: &Context| {
        cx.world()
            .entry(&path)
            .and_then(|e| e.resolved_address())
            .map(|a| Value::Address(a.to_string()))
            .ok_or_else(|| CoercionError::UnknownAlias {
                alias: path.join("."),
            })
    }
}

/// Address of the account that will send the next transaction.
pub fn active_sender(cx: &Context) -> Result<Value, CoercionError> {
    cx.world()
        .sender()
        .map(Value::Address)
        .ok_or_else(|| CoercionError::UnknownAlias {
            alias: cx.world().settings().default_from.clone(),
        })
}

// ──────────────────────────────────────────────
// Bindings
// ──────────────────────────────────────────────

/// Bound Arg values by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(BTreeMap<String, Value>);

impl Bindings {
    pub fn new() -> Self {
        Bindings(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn value(&self, name: &str) -> Result<&Value, HandlerError> {
        self.get(name)
            .ok_or_else(|| HandlerError::Failed(format!("argument `{}` is not bound", name)))
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        kind: &str,
        pick: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T, HandlerError> {
        let value = self.value(name)?;
        pick(value).ok_or_else(|| {
            HandlerError::Failed(format!(
                "argument `{}` is {}, expected {}",
                name,
                value.type_name(),
                kind
            ))
        })
    }

    pub fn number(&self, name: &str) -> Result<Number, HandlerError> {
        self.typed(name, "Number", |v| v.as_number().cloned())
    }

    pub fn address(&self, name: &str) -> Result<String, HandlerError> {
        self.typed(name, "Address", |v| v.as_address().map(str::to_string))
    }

    pub fn string(&self, name: &str) -> Result<String, HandlerError> {
        self.typed(name, "String", |v| v.as_str().map(str::to_string))
    }

    pub fn boolean(&self, name: &str) -> Result<bool, HandlerError> {
        self.typed(name, "Bool", Value::as_bool)
    }

    pub fn list(&self, name: &str) -> Result<&[Value], HandlerError> {
        self.typed(name, "List", Value::as_list)
    }

    /// The bound value, or `None` when it is `Nothing`.
    pub fn optional(&self, name: &str) -> Option<&Value> {
        self.get(name).filter(|v| !v.is_nothing())
    }
}

// ──────────────────────────────────────────────
// Binder
// ──────────────────────────────────────────────

/// Bind `args` against positional `tokens`. With `allow_extra`, tokens
/// left over after the last Arg are ignored instead of rejecting.
pub async fn bind(
    cx: &Context,
    args: &[Arg],
    tokens: &[Event],
    allow_extra: bool,
) -> Result<Bindings, BindError> {
    let mut bound = Bindings::new();

    for arg in args {
        if let Some(resolver) = &arg.implicit {
            let value = resolver(cx).or_else(|e| arg.recover(e))?;
            bound.insert(arg.name.clone(), value);
        }
    }

    let mut rest = tokens;
    for arg in args.iter().filter(|a| !a.is_implicit()) {
        let value = if arg.variadic {
            let taken = rest;
            rest = &[];
            arg.bind_variadic(cx, taken).await?
        } else if let Some((token, tail)) = rest.split_first() {
            rest = tail;
            arg.bind_one(cx, token).await?
        } else {
            arg.when_absent().ok_or_else(|| BindError::Missing {
                arg: arg.name.clone(),
            })?
        };
        bound.insert(arg.name.clone(), value);
    }

    if !rest.is_empty() && !allow_extra {
        return Err(BindError::Extra {
            tokens: rest
                .iter()
                .map(Event::to_string)
                .collect::<Vec<_>>()
                .join(" "),
        });
    }
    Ok(bound)
}
