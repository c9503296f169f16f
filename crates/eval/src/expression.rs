//! Operation specifications: Fetchers, Commands and views.
//!
//! A specification is a literal verb, the position at which the verb
//! appears among the positional tokens, an ordered Arg list, a doc string
//! and a handler. Specifications are declared once when a catalog is
//! built and never change afterwards.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use scenario_core::Event;

use crate::arg::{bind, Arg, Bindings};
use crate::context::{BoxFuture, Context};
use crate::error::{BindError, HandlerError};
use crate::types::Value;
use crate::world::World;

/// What a specification produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Read-only, returns a Value.
    Fetcher,
    /// Returns a new World and needs a sender.
    Command,
    /// Returns a new World without needing a sender.
    View,
}

type FetchFn = dyn Fn(Context, Bindings) -> BoxFuture<'static, Result<Value, HandlerError>> + Send + Sync;
type WorldFn = dyn Fn(Context, Bindings) -> BoxFuture<'static, Result<World, HandlerError>> + Send + Sync;

#[derive(Clone)]
enum Handler {
    Fetch(Arc<FetchFn>),
    World(Arc<WorldFn>),
}

#[derive(Clone)]
pub struct Spec {
    verb: Vec<String>,
    name_pos: usize,
    args: Vec<Arg>,
    doc: String,
    catchall: bool,
    kind: Kind,
    handler: Handler,
}

impl Spec {
    fn build(verb: &str, args: Vec<Arg>, kind: Kind, handler: Handler) -> Spec {
        Spec {
            verb: verb.split_whitespace().map(str::to_string).collect(),
            name_pos: 0,
            args,
            doc: String::new(),
            catchall: false,
            kind,
            handler,
        }
    }

    pub fn fetcher<F, Fut>(verb: &str, args: Vec<Arg>, f: F) -> Spec
    where
        F: Fn(Context, Bindings) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        let handler = Handler::Fetch(Arc::new(
            move |cx: Context, b: Bindings| -> BoxFuture<'static, Result<Value, HandlerError>> {
                Box::pin(f(cx, b))
            },
        ));
        Spec::build(verb, args, Kind::Fetcher, handler)
    }

    pub fn command<F, Fut>(verb: &str, args: Vec<Arg>, f: F) -> Spec
    where
        F: Fn(Context, Bindings) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<World, HandlerError>> + Send + 'static,
    {
        let handler = Handler::World(Arc::new(
            move |cx: Context, b: Bindings| -> BoxFuture<'static, Result<World, HandlerError>> {
                Box::pin(f(cx, b))
            },
        ));
        Spec::build(verb, args, Kind::Command, handler)
    }

    /// A Command that does not send transactions.
    pub fn view<F, Fut>(verb: &str, args: Vec<Arg>, f: F) -> Spec
    where
        F: Fn(Context, Bindings) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<World, HandlerError>> + Send + 'static,
    {
        let handler = Handler::World(Arc::new(
            move |cx: Context, b: Bindings| -> BoxFuture<'static, Result<World, HandlerError>> {
                Box::pin(f(cx, b))
            },
        ));
        Spec::build(verb, args, Kind::View, handler)
    }

    pub fn doc(mut self, doc: &str) -> Spec {
        self.doc = doc.to_string();
        self
    }

    /// Expect the verb at `name_pos` among the positional tokens, so that
    /// `<Subject> <Verb> <args...>` forms can be declared.
    pub fn at(mut self, name_pos: usize) -> Spec {
        self.name_pos = name_pos;
        self
    }

    pub fn catchall(mut self) -> Spec {
        self.catchall = true;
        self
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn verb(&self) -> String {
        self.verb.join(" ")
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn is_catchall(&self) -> bool {
        self.catchall || self.args.iter().any(Arg::is_catchall)
    }

    pub fn cleaned_doc(&self) -> String {
        clean_doc(&self.doc)
    }

    /// Usage line: verb placed at its position among the Arg usages.
    pub fn usage(&self) -> String {
        let mut parts: Vec<String> = self.args.iter().filter_map(Arg::usage).collect();
        if !self.verb.is_empty() {
            let at = self.name_pos.min(parts.len());
            parts.insert(at, self.verb());
        }
        parts.join(" ")
    }

    /// Positional tokens with the verb removed, or why the verb is not
    /// where this specification expects it.
    fn positional(&self, tokens: &[Event]) -> Result<Vec<Event>, BindError> {
        let end = self.name_pos + self.verb.len();
        let matches = tokens.len() >= end
            && self
                .verb
                .iter()
                .zip(&tokens[self.name_pos..end])
                .all(|(verb, token)| verb_matches(verb, token));
        if !matches {
            return Err(BindError::Verb {
                verb: self.verb(),
                position: self.name_pos,
            });
        }
        let mut rest = tokens[..self.name_pos].to_vec();
        rest.extend_from_slice(&tokens[end..]);
        Ok(rest)
    }

    /// Bind as a regular candidate: the verb must match and every token
    /// must be consumed.
    pub async fn bind(&self, cx: &Context, tokens: &[Event]) -> Result<Bindings, BindError> {
        let positional = self.positional(tokens)?;
        bind(cx, &self.args, &positional, false).await
    }

    /// Bind as a fallback: all tokens are offered to the Args and
    /// leftovers are ignored.
    pub async fn bind_catchall(
        &self,
        cx: &Context,
        tokens: &[Event],
    ) -> Result<Bindings, BindError> {
        bind(cx, &self.args, tokens, true).await
    }

    pub async fn fetch(&self, cx: Context, bindings: Bindings) -> Result<Value, HandlerError> {
        match &self.handler {
            Handler::Fetch(f) => f(cx, bindings).await,
            Handler::World(_) => Err(HandlerError::Failed(format!(
                "`{}` is not a value expression",
                self.usage()
            ))),
        }
    }

    pub async fn execute(&self, cx: Context, bindings: Bindings) -> Result<World, HandlerError> {
        match &self.handler {
            Handler::World(f) => f(cx, bindings).await,
            Handler::Fetch(_) => Err(HandlerError::Failed(format!(
                "`{}` does not produce a World",
                self.usage()
            ))),
        }
    }
}

impl fmt::Debug for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spec")
            .field("usage", &self.usage())
            .field("kind", &self.kind)
            .field("name_pos", &self.name_pos)
            .field("catchall", &self.is_catchall())
            .finish()
    }
}

/// Case-insensitive, whitespace-trimmed comparison of a verb with a
/// token. A list token never matches.
pub fn verb_matches(verb: &str, token: &Event) -> bool {
    token
        .as_atom()
        .is_some_and(|t| t.trim().eq_ignore_ascii_case(verb.trim()))
}

/// Strip the common indentation of a doc string and surrounding blank
/// lines.
pub fn clean_doc(doc: &str) -> String {
    let lines: Vec<&str> = doc.lines().collect();
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);
    let body: Vec<&str> = lines
        .iter()
        .map(|l| strip_indent(l, indent).trim_end())
        .collect();
    let start = body.iter().position(|l| !l.is_empty()).unwrap_or(body.len());
    let end = body.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    body[start..end].join("\n")
}

/// `line` without up to `indent` leading whitespace characters.
fn strip_indent(line: &str, indent: usize) -> &str {
    let cut = line
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .take(indent)
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    &line[cut..]
}
