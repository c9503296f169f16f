//! The set of families an interpreter knows about.
//!
//! Command families hold Commands and views and are reached by the head
//! word of a scenario line. Value families hold Fetchers and are reached
//! by the head word of a line or of a parenthesized value expression.
//! Core values (`Exactly`, `Add`, literals) answer every value expression
//! whose head does not name a value family.

use indexmap::IndexMap;
use scenario_core::Event;

use crate::assertion::assert_family;
use crate::builtins::{alias_family, print_family, read_family, setting_family};
use crate::core_values::core_values;
use crate::dispatch::Family;
use crate::error::DeclarationError;
use crate::expression::Spec;

#[derive(Debug, Clone)]
pub struct Catalog {
    commands: IndexMap<String, Family>,
    values: IndexMap<String, Family>,
    core: Family,
}

impl Catalog {
    /// Core values only; no command families.
    pub fn bare() -> Result<Catalog, DeclarationError> {
        Ok(Catalog {
            commands: IndexMap::new(),
            values: IndexMap::new(),
            core: core_values()?,
        })
    }

    /// Core values plus the built-in `Assert`, `Read`, `Print`, `Alias`
    /// and `Setting` families.
    pub fn new() -> Result<Catalog, DeclarationError> {
        let mut catalog = Catalog::bare()?;
        for family in [
            assert_family()?,
            read_family()?,
            print_family()?,
            alias_family()?,
            setting_family()?,
        ] {
            catalog.commands.insert(family.name().to_string(), family);
        }
        Ok(catalog)
    }

    /// Add or replace the command family `name`.
    pub fn with_commands(
        mut self,
        name: &str,
        specs: Vec<Spec>,
    ) -> Result<Catalog, DeclarationError> {
        let family = Family::new(name, specs)?;
        if !family.is_command_family() {
            return Err(mixed(&family, "command family contains a Fetcher"));
        }
        self.commands.insert(name.to_string(), family);
        Ok(self)
    }

    /// Add or replace the value family `name`.
    pub fn with_values(mut self, name: &str, specs: Vec<Spec>) -> Result<Catalog, DeclarationError> {
        let family = Family::new(name, specs)?;
        if !family.is_value_family() {
            return Err(mixed(&family, "value family contains a Command"));
        }
        self.values.insert(name.to_string(), family);
        Ok(self)
    }

    pub fn command_family(&self, name: &str) -> Option<&Family> {
        self.commands.get(name)
    }

    pub fn value_family(&self, name: &str) -> Option<&Family> {
        self.values.get(name)
    }

    pub fn core_values(&self) -> &Family {
        &self.core
    }

    pub fn command_families(&self) -> impl Iterator<Item = &Family> {
        self.commands.values()
    }

    pub fn value_families(&self) -> impl Iterator<Item = &Family> {
        self.values.values()
    }

    /// The family a value expression dispatches into, and the tokens it
    /// receives: a value family gets the tokens after its head, the core
    /// values get all of them.
    pub fn value_route<'e>(&self, event: &'e Event) -> (&Family, &'e [Event]) {
        let tokens = event.tokens();
        match tokens.first().and_then(Event::as_atom) {
            Some(head) => match self.values.get(head) {
                Some(family) => (family, &tokens[1..]),
                None => (&self.core, tokens),
            },
            None => (&self.core, tokens),
        }
    }
}

fn mixed(family: &Family, message: &str) -> DeclarationError {
    DeclarationError {
        family: family.name().to_string(),
        usage: family.name().to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::Bindings;
    use crate::context::Context;
    use crate::error::HandlerError;
    use crate::types::Value;
    use crate::world::World;

    async fn value(_cx: Context, _b: Bindings) -> Result<Value, HandlerError> {
        Ok(Value::number(1))
    }

    async fn world(cx: Context, _b: Bindings) -> Result<World, HandlerError> {
        Ok(cx.world().clone())
    }

    #[test]
    fn builtins_are_registered() {
        let c = Catalog::new().unwrap();
        for name in ["Assert", "Read", "Print", "Alias", "Setting"] {
            assert!(c.command_family(name).is_some(), "{name}");
        }
        assert!(Catalog::bare().unwrap().command_family("Assert").is_none());
    }

    #[test]
    fn families_must_not_mix_kinds() {
        let err = Catalog::bare()
            .unwrap()
            .with_values("Bar", vec![Spec::command("Set", vec![], world)])
            .unwrap_err();
        assert!(err.message.contains("value family"));
        assert!(Catalog::bare()
            .unwrap()
            .with_commands("Bar", vec![Spec::fetcher("Value", vec![], value)])
            .is_err());
    }

    #[test]
    fn value_route_prefers_value_families() {
        let c = Catalog::bare()
            .unwrap()
            .with_values("Bar", vec![Spec::fetcher("Value", vec![], value)])
            .unwrap();
        let bar = Event::words(&["Bar", "Value"]);
        let (family, tokens) = c.value_route(&bar);
        assert_eq!(family.name(), "Bar");
        assert_eq!(tokens, &[Event::atom("Value")]);

        let add = Event::words(&["Add", "1", "2"]);
        let (family, tokens) = c.value_route(&add);
        assert_eq!(family.name(), "");
        assert_eq!(tokens.len(), 3);
    }
}
