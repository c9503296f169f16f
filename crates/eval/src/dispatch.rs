//! Ordered-alternative dispatch.
//!
//! A family is an ordered list of specifications sharing a head word.
//! Selection is two passes over that list:
//!
//! 1. every non-catchall specification, in declaration order, must find
//!    its verb at its position and bind every remaining token;
//! 2. only if all of those fail, every catchall specification, in
//!    declaration order, is offered all tokens and may ignore leftovers.
//!
//! The first specification that binds wins. Declaration order is
//! observable behavior.

use scenario_core::Event;
use tracing::debug;

use crate::arg::Bindings;
use crate::context::Context;
use crate::error::{Attempt, DeclarationError, NoMatchError};
use crate::expression::{Kind, Spec};

#[derive(Debug, Clone)]
pub struct Family {
    name: String,
    specs: Vec<Spec>,
}

impl Family {
    /// Assemble a family, rejecting malformed declarations.
    pub fn new(name: impl Into<String>, specs: Vec<Spec>) -> Result<Family, DeclarationError> {
        let name = name.into();
        for spec in &specs {
            validate(&name, spec)?;
        }
        Ok(Family { name, specs })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn specs(&self) -> &[Spec] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Whether every specification returns a Value.
    pub fn is_value_family(&self) -> bool {
        self.specs.iter().all(|s| s.kind() == Kind::Fetcher)
    }

    /// Whether every specification returns a World.
    pub fn is_command_family(&self) -> bool {
        self.specs.iter().all(|s| s.kind() != Kind::Fetcher)
    }

    /// Pick the specification that accepts `tokens` (the input after the
    /// family's head word) and bind it.
    pub async fn select(
        &self,
        cx: &Context,
        tokens: &[Event],
    ) -> Result<(&Spec, Bindings), NoMatchError> {
        let mut attempts = Vec::new();

        for spec in self.specs.iter().filter(|s| !s.is_catchall()) {
            match spec.bind(cx, tokens).await {
                Ok(bindings) => {
                    debug!(family = %self.name, spec = %spec.usage(), "selected");
                    return Ok((spec, bindings));
                }
                Err(error) => {
                    debug!(family = %self.name, spec = %spec.usage(), %error, "rejected");
                    attempts.push(Attempt {
                        usage: spec.usage(),
                        error,
                    });
                }
            }
        }

        for spec in self.specs.iter().filter(|s| s.is_catchall()) {
            match spec.bind_catchall(cx, tokens).await {
                Ok(bindings) => {
                    debug!(family = %self.name, spec = %spec.usage(), "selected catchall");
                    return Ok((spec, bindings));
                }
                Err(error) => {
                    debug!(family = %self.name, spec = %spec.usage(), %error, "rejected catchall");
                    attempts.push(Attempt {
                        usage: spec.usage(),
                        error,
                    });
                }
            }
        }

        Err(self.no_match(tokens, attempts))
    }

    fn no_match(&self, tokens: &[Event], attempts: Vec<Attempt>) -> NoMatchError {
        let input = std::iter::once(self.name.clone())
            .filter(|n| !n.is_empty())
            .chain(tokens.iter().map(Event::to_string))
            .collect::<Vec<_>>()
            .join(" ");
        NoMatchError {
            family: self.name.clone(),
            input,
            attempts,
            docs: self
                .specs
                .iter()
                .map(|s| (self.qualified_usage(s), s.cleaned_doc()))
                .collect(),
        }
    }

    fn qualified_usage(&self, spec: &Spec) -> String {
        let usage = spec.usage();
        match (self.name.is_empty(), usage.is_empty()) {
            (true, _) => usage,
            (false, true) => self.name.clone(),
            (false, false) => format!("{} {}", self.name, usage),
        }
    }
}

fn validate(family: &str, spec: &Spec) -> Result<(), DeclarationError> {
    let explicit: Vec<_> = spec.args().iter().filter(|a| !a.is_implicit()).collect();
    if let Some(pos) = explicit.iter().position(|a| a.is_variadic()) {
        if pos + 1 != explicit.len() {
            return Err(DeclarationError {
                family: family.to_string(),
                usage: spec.usage(),
                message: format!(
                    "variadic argument `{}` must be the last explicit argument",
                    explicit[pos].name()
                ),
            });
        }
    }
    let mut names: Vec<&str> = spec.args().iter().map(|a| a.name()).collect();
    names.sort_unstable();
    if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
        return Err(DeclarationError {
            family: family.to_string(),
            usage: spec.usage(),
            message: format!("argument `{}` declared twice", dup[0]),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::Arg;
    use crate::catalog::Catalog;
    use crate::coerce;
    use crate::error::{BindError, HandlerError};
    use crate::types::Value;
    use crate::world::{Settings, World};
    use scenario_ledger::MemoryLedger;
    use std::sync::Arc;

    fn cx() -> Context {
        let world = World::new(Arc::new(MemoryLedger::new()), Settings::default());
        Context::new(world, Arc::new(Catalog::new().unwrap()))
    }

    fn tag(label: &'static str, args: Vec<Arg>) -> Spec {
        Spec::fetcher("", args, move |_cx, _b| async move {
            Ok::<_, HandlerError>(Value::string(label))
        })
    }

    async fn run(family: &Family, words: &[&str]) -> Result<Value, NoMatchError> {
        let cx = cx();
        let tokens = Event::words(words);
        let (spec, bindings) = family.select(&cx, tokens.tokens()).await?;
        Ok(spec.fetch(cx.clone(), bindings).await.unwrap())
    }

    #[tokio::test]
    async fn earlier_declaration_wins() {
        let family = Family::new(
            "F",
            vec![
                tag("first", vec![Arg::new("n", coerce::number())]),
                tag("second", vec![Arg::new("n", coerce::number())]),
            ],
        )
        .unwrap();
        assert_eq!(run(&family, &["1"]).await.unwrap(), Value::string("first"));
    }

    #[tokio::test]
    async fn bind_failure_falls_through_to_next_candidate() {
        let family = Family::new(
            "F",
            vec![
                tag("number", vec![Arg::new("n", coerce::number())]),
                tag("bool", vec![Arg::new("b", coerce::boolean())]),
            ],
        )
        .unwrap();
        assert_eq!(run(&family, &["yes"]).await.unwrap(), Value::string("bool"));
    }

    #[tokio::test]
    async fn catchall_only_after_all_specific_specs_fail() {
        let family = Family::new(
            "F",
            vec![
                tag("fallback", vec![Arg::new("raw", coerce::string()).catchall()]),
                tag("specific", vec![Arg::new("n", coerce::number())]),
            ],
        )
        .unwrap();
        assert_eq!(run(&family, &["7"]).await.unwrap(), Value::string("specific"));
        assert_eq!(
            run(&family, &["seven", "eight"]).await.unwrap(),
            Value::string("fallback")
        );
    }

    #[tokio::test]
    async fn catchall_coercion_can_still_fail() {
        let family = Family::new(
            "F",
            vec![tag("fallback", vec![Arg::new("n", coerce::number()).catchall()])],
        )
        .unwrap();
        let err = run(&family, &["x"]).await.unwrap_err();
        assert_eq!(err.attempts.len(), 1);
        assert!(matches!(err.attempts[0].error, BindError::Coercion { .. }));
    }

    #[tokio::test]
    async fn no_match_collects_every_attempt_and_doc() {
        let family = Family::new(
            "Bar",
            vec![
                tag("a", vec![]).doc("Reads A"),
                tag("b", vec![Arg::new("n", coerce::number())]).doc("Reads B"),
            ],
        )
        .unwrap();
        let err = run(&family, &["x", "y"]).await.unwrap_err();
        assert_eq!(err.input, "Bar x y");
        assert_eq!(err.attempts.len(), 2);
        assert_eq!(
            err.docs,
            vec![
                ("Bar".to_string(), "Reads A".to_string()),
                ("Bar <n:Number>".to_string(), "Reads B".to_string()),
            ]
        );
    }

    #[test]
    fn variadic_must_be_last_explicit_arg() {
        let err = Family::new(
            "F",
            vec![tag(
                "bad",
                vec![
                    Arg::new("xs", coerce::number()).variadic(),
                    Arg::new("y", coerce::number()),
                ],
            )],
        )
        .unwrap_err();
        assert!(err.message.contains("variadic"));

        let implicit_after = Family::new(
            "F",
            vec![tag(
                "ok",
                vec![
                    Arg::new("xs", coerce::number()).variadic(),
                    Arg::new("who", coerce::address()).implicit(crate::arg::active_sender),
                ],
            )],
        );
        assert!(implicit_after.is_ok());
    }

    #[test]
    fn duplicate_arg_names_are_rejected() {
        let err = Family::new(
            "F",
            vec![tag(
                "dup",
                vec![
                    Arg::new("n", coerce::number()),
                    Arg::new("n", coerce::number()),
                ],
            )],
        )
        .unwrap_err();
        assert!(err.message.contains("declared twice"));
    }
}
