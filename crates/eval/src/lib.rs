//! Scenario interpreter -- binds command lines to operation
//! specifications and runs them against a ledger.
//!
//! A line is parsed into an Event, routed to a family by its head word,
//! matched against the family's specifications in declaration order,
//! bound to typed Values, and executed. Commands return a new World;
//! Fetchers return a Value.

pub mod arg;
pub mod assertion;
pub mod builtins;
pub mod catalog;
pub mod coerce;
pub mod config;
pub mod context;
pub mod core_values;
pub mod dispatch;
pub mod error;
pub mod expression;
pub mod interpreter;
pub mod invoke;
pub mod numeric;
pub mod types;
pub mod world;

use std::sync::Arc;

use scenario_ledger::Ledger;

pub use arg::{Arg, Bindings};
pub use catalog::Catalog;
pub use coerce::{Coerce, Coercion};
pub use config::{ConfigError, InterpreterConfig};
pub use context::Context;
pub use dispatch::Family;
pub use error::{
    BindError, CoercionError, DeclarationError, HandlerError, InterpError, NoMatchError,
    NumericError, ScenarioError,
};
pub use expression::{Kind, Spec};
pub use interpreter::{Interpreter, LineReport, Outcome, ScenarioReport};
pub use numeric::{Notation, Number};
pub use types::Value;
pub use world::{AliasPath, RegistryEntry, Settings, TraceEntry, World};

/// Run a scenario script from a fresh World.
///
/// This is the top-level entry point for running a whole script. Use
/// [`Interpreter`] directly to process lines one at a time.
pub async fn run_scenario(
    ledger: Arc<dyn Ledger>,
    catalog: Catalog,
    config: InterpreterConfig,
    script: &str,
) -> Result<ScenarioReport, ScenarioError> {
    let interpreter = Interpreter::new(catalog, config);
    let world = interpreter.start(ledger).await.map_err(|error| ScenarioError {
        line: 0,
        text: String::new(),
        error,
    })?;
    interpreter.run_script(world, script).await
}
