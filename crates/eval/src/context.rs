//! What a coercion or handler can see while a line runs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use scenario_core::Event;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{CoercionError, HandlerError};
use crate::types::Value;
use crate::world::World;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The World a line starts from, the catalog of families, and the error
/// left by the most recent Command line.
#[derive(Clone)]
pub struct Context {
    world: World,
    catalog: Arc<Catalog>,
    last_error: Option<HandlerError>,
}

impl Context {
    pub fn new(world: World, catalog: Arc<Catalog>) -> Self {
        Context {
            world,
            catalog,
            last_error: None,
        }
    }

    pub fn with_last_error(mut self, error: Option<HandlerError>) -> Self {
        self.last_error = error;
        self
    }

    pub fn with_world(&self, world: World) -> Self {
        Context {
            world,
            ..self.clone()
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn last_error(&self) -> Option<&HandlerError> {
        self.last_error.as_ref()
    }

    /// Sender of the next transaction, or `MissingSender`-style failure.
    pub fn sender(&self) -> Result<String, HandlerError> {
        self.world.sender().ok_or_else(|| {
            HandlerError::UnknownAlias(self.world.settings().default_from.clone())
        })
    }

    /// Evaluate a parenthesized argument as a value expression.
    ///
    /// A head naming a value family dispatches into that family with the
    /// remaining tokens; anything else goes to the core values. The
    /// selected Fetcher runs against this context and its result becomes
    /// the argument's value.
    pub fn evaluate<'a>(&'a self, event: &'a Event) -> BoxFuture<'a, Result<Value, CoercionError>> {
        Box::pin(async move {
            let event = event.unwrapped();
            let failed = |message: String| CoercionError::Evaluation {
                event: event.to_string(),
                message,
            };
            let (family, tokens) = self.catalog.value_route(event);
            debug!(family = %family.name(), expr = %event, "evaluate");
            let (spec, bindings) = family
                .select(self, tokens)
                .await
                .map_err(|e| failed(e.to_string()))?;
            spec.fetch(self.clone(), bindings)
                .await
                .map_err(|e| failed(e.to_string()))
        })
    }
}
