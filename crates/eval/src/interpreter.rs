//! Line processing and the scenario runner.
//!
//! Each line is routed, bound and executed against the World produced by
//! the line before it:
//!
//! 1. special forms `From <account> <command>` and
//!    `Trx Value <amount> <command>` set transaction options for the
//!    nested command only;
//! 2. a command family named by the head word (falling back to a value
//!    family of the same name when no command matches);
//! 3. a value family, whose result is traced;
//! 4. otherwise `UnknownFamily`.
//!
//! A non-fatal `HandlerError` is reported on the `Outcome` and the line
//! keeps the World it started from.

use std::sync::Arc;

use scenario_core::{parse_event, parse_script, Event};
use scenario_ledger::{Ledger, TxOptions};
use tracing::{info, warn};

use crate::arg::Bindings;
use crate::catalog::Catalog;
use crate::coerce;
use crate::config::InterpreterConfig;
use crate::context::{BoxFuture, Context};
use crate::error::{HandlerError, InterpError, NoMatchError, ScenarioError};
use crate::numeric::Number;
use crate::expression::{verb_matches, Kind, Spec};
use crate::types::Value;
use crate::world::World;

/// Result of one line.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub world: World,
    /// Value produced by a Fetcher line.
    pub value: Option<Value>,
    /// Non-fatal failure of the handler. When set, `world` is the World
    /// the line started from.
    pub error: Option<HandlerError>,
    pub kind: Kind,
}

#[derive(Debug, Clone)]
pub struct LineReport {
    pub line: u32,
    pub source: String,
    pub kind: Kind,
    pub value: Option<Value>,
    pub error: Option<HandlerError>,
}

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub world: World,
    pub lines: Vec<LineReport>,
}

impl ScenarioReport {
    /// Lines whose handler failed without stopping the run.
    pub fn errors(&self) -> impl Iterator<Item = &LineReport> {
        self.lines.iter().filter(|l| l.error.is_some())
    }
}

pub struct Interpreter {
    catalog: Arc<Catalog>,
    config: InterpreterConfig,
}

impl Interpreter {
    pub fn new(catalog: Catalog, config: InterpreterConfig) -> Self {
        Interpreter {
            catalog: Arc::new(catalog),
            config,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Initial World: configured settings, and the ledger's accounts
    /// named in order by the configured account names.
    pub async fn start(&self, ledger: Arc<dyn Ledger>) -> Result<World, InterpError> {
        let addresses = ledger
            .accounts()
            .await
            .map_err(|e| InterpError::Handler(e.into()))?;
        let mut world = World::new(ledger, self.config.settings());
        for (name, address) in self.config.accounts.iter().zip(addresses) {
            world = world.with_account(name, address);
        }
        Ok(world)
    }

    pub async fn process(&self, world: &World, event: &Event) -> Result<Outcome, InterpError> {
        self.process_after(world, event, None).await
    }

    /// Process a line knowing the error left by the previous Command line,
    /// which `Assert Success`/`Failure`/`Revert` inspect.
    pub async fn process_after(
        &self,
        world: &World,
        event: &Event,
        last_error: Option<HandlerError>,
    ) -> Result<Outcome, InterpError> {
        let cx = Context::new(world.clone(), self.catalog.clone()).with_last_error(last_error);
        self.route(cx, event).await
    }

    pub async fn process_line(&self, world: &World, line: &str) -> Result<Outcome, InterpError> {
        let event = parse_event(line)?;
        self.process(world, &event).await
    }

    /// Run a whole script. Stops at the first fatal error.
    pub async fn run_script(&self, world: World, text: &str) -> Result<ScenarioReport, ScenarioError> {
        let lines = parse_script(text).map_err(|e| ScenarioError {
            line: e.line,
            text: text
                .lines()
                .nth((e.line as usize).saturating_sub(1))
                .unwrap_or_default()
                .trim()
                .to_string(),
            error: e.into(),
        })?;

        let mut world = world;
        let mut last_error: Option<HandlerError> = None;
        let mut reports = Vec::with_capacity(lines.len());
        for line in lines {
            info!(line = line.line, source = %line.source, "run");
            let outcome = self
                .process_after(&world, &line.event, last_error.clone())
                .await
                .map_err(|error| ScenarioError {
                    line: line.line,
                    text: line.source.clone(),
                    error,
                })?;
            if outcome.kind == Kind::Command {
                last_error = outcome.error.clone();
            }
            reports.push(LineReport {
                line: line.line,
                source: line.source,
                kind: outcome.kind,
                value: outcome.value,
                error: outcome.error,
            });
            world = outcome.world;
        }
        Ok(ScenarioReport {
            world,
            lines: reports,
        })
    }

    // ──────────────────────────────────────────────
    // Routing
    // ──────────────────────────────────────────────

    fn route<'a>(&'a self, cx: Context, event: &'a Event) -> BoxFuture<'a, Result<Outcome, InterpError>> {
        Box::pin(async move {
            let event = event.unwrapped();
            let tokens = event.tokens();
            let Some(head) = tokens.first().and_then(Event::as_atom) else {
                return Err(InterpError::UnknownFamily {
                    name: event.render_line(),
                });
            };

            if head.eq_ignore_ascii_case("From") {
                return self.from_form(cx, &tokens[1..]).await;
            }
            if head.eq_ignore_ascii_case("Trx") && tokens.get(1).is_some_and(|t| verb_matches("Value", t)) {
                return self.trx_value_form(cx, &tokens[2..]).await;
            }

            let rest = &tokens[1..];
            let mut unmatched = None;
            if let Some(family) = self.catalog.command_family(head) {
                match family.select(&cx, rest).await {
                    Ok((spec, bindings)) => return self.run_world(cx, spec, bindings).await,
                    Err(no_match) => unmatched = Some(no_match),
                }
            }
            if let Some(family) = self.catalog.value_family(head) {
                match family.select(&cx, rest).await {
                    Ok((spec, bindings)) => return self.run_fetcher(cx, spec, bindings, event).await,
                    Err(no_match) => {
                        // Both families share the head word; report every candidate.
                        let no_match = match unmatched {
                            Some(commands) => commands.merge(no_match),
                            None => no_match,
                        };
                        return Err(no_match.into());
                    }
                }
            }
            match unmatched {
                Some(no_match) => Err(no_match.into()),
                None => Err(InterpError::UnknownFamily {
                    name: head.to_string(),
                }),
            }
        })
    }

    async fn run_world(&self, cx: Context, spec: &Spec, bindings: Bindings) -> Result<Outcome, InterpError> {
        let kind = spec.kind();
        if kind == Kind::Command && cx.world().sender().is_none() {
            return Err(InterpError::MissingSender {
                alias: cx.world().settings().default_from.clone(),
            });
        }
        let before = cx.world().clone();
        match spec.execute(cx, bindings).await {
            Ok(world) => Ok(Outcome {
                world,
                value: None,
                error: None,
                kind,
            }),
            Err(error) => self.recover(before, error, kind),
        }
    }

    async fn run_fetcher(
        &self,
        cx: Context,
        spec: &Spec,
        bindings: Bindings,
        event: &Event,
    ) -> Result<Outcome, InterpError> {
        let before = cx.world().clone();
        match spec.fetch(cx, bindings).await {
            Ok(value) => Ok(Outcome {
                world: before.trace(format!("{} => {}", event.render_line(), value.show()), None),
                value: Some(value),
                error: None,
                kind: Kind::Fetcher,
            }),
            Err(error) => self.recover(before, error, Kind::Fetcher),
        }
    }

    fn recover(&self, world: World, error: HandlerError, kind: Kind) -> Result<Outcome, InterpError> {
        if error.is_fatal() || self.config.halt_on_handler_error {
            return Err(InterpError::Handler(error));
        }
        warn!(%error, "command failed");
        Ok(Outcome {
            world,
            value: None,
            error: Some(error),
            kind,
        })
    }

    // ──────────────────────────────────────────────
    // Special forms
    // ──────────────────────────────────────────────

    async fn from_form(&self, cx: Context, tokens: &[Event]) -> Result<Outcome, InterpError> {
        let (who, command) = match tokens.split_first() {
            Some((who, command)) if !command.is_empty() => (who, command),
            _ => {
                return Err(form_usage(
                    "From",
                    "<account:Address> <command...>",
                    "Runs the command with the given account as sender.",
                    tokens,
                )
                .into())
            }
        };
        let sender = coerce::address()
            .coerce(&cx, who)
            .await
            .ok()
            .and_then(|v| v.as_address().map(str::to_string))
            .ok_or_else(|| InterpError::MissingSender {
                alias: who.to_string(),
            })?;
        let options = TxOptions {
            from: Some(sender),
            value: cx.world().tx_options().value.clone(),
        };
        self.nested(cx, options, command).await
    }

    async fn trx_value_form(&self, cx: Context, tokens: &[Event]) -> Result<Outcome, InterpError> {
        let (amount, command) = match tokens.split_first() {
            Some((amount, command)) if !command.is_empty() => (amount, command),
            _ => {
                return Err(form_usage(
                    "Trx",
                    "Value <amount:Number> <command...>",
                    "Attaches a native value to the transactions of the command.",
                    tokens,
                )
                .into())
            }
        };
        let amount = coerce::number()
            .coerce(&cx, amount)
            .await
            .map_err(|e| InterpError::Handler(e.into()))?;
        let options = TxOptions {
            from: cx.world().tx_options().from.clone(),
            value: amount.as_number().map(Number::to_plain_string),
        };
        self.nested(cx, options, command).await
    }

    /// Run `command` with `options` in place, then put the outer options
    /// back. A failed command keeps the outer World untouched.
    async fn nested(&self, cx: Context, options: TxOptions, command: &[Event]) -> Result<Outcome, InterpError> {
        let outer = cx.world().clone();
        let inner = outer.with_tx_options(options);
        let event = Event::List(command.to_vec());
        let mut outcome = self.route(cx.with_world(inner.clone()), &event).await?;
        outcome.world = if outcome.error.is_some() || outcome.world.ptr_eq(&inner) {
            outer
        } else {
            outcome.world.with_tx_options(outer.tx_options().clone())
        };
        Ok(outcome)
    }
}

fn form_usage(name: &str, usage: &str, doc: &str, tokens: &[Event]) -> NoMatchError {
    NoMatchError {
        family: name.to_string(),
        input: std::iter::once(name.to_string())
            .chain(tokens.iter().map(Event::to_string))
            .collect::<Vec<_>>()
            .join(" "),
        attempts: Vec::new(),
        docs: vec![(format!("{} {}", name, usage), doc.to_string())],
    }
}
