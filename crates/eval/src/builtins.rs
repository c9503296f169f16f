//! `Read`, `Print`, `Alias` and `Setting`.

use crate::arg::{Arg, Bindings};
use crate::coerce::{address, boolean, core_value, none_of, string};
use crate::context::Context;
use crate::dispatch::Family;
use crate::error::{DeclarationError, HandlerError};
use crate::expression::Spec;
use crate::world::{parse_alias, RegistryEntry, World};

async fn read(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let value = b.value("value")?;
    Ok(cx.world().trace(format!("Read => {}", value.show()), None))
}

async fn print(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    Ok(cx.world().trace(b.string("message")?, None))
}

async fn alias(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let name = b.string("name")?;
    let address = b.address("address")?;
    Ok(cx
        .world()
        .register(&[parse_alias(&name)], RegistryEntry::address(address)))
}

async fn dry_run(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let mut settings = cx.world().settings().clone();
    settings.dry_run = b.boolean("enabled")?;
    Ok(cx.world().with_settings(settings))
}

async fn network(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let mut settings = cx.world().settings().clone();
    settings.network = b.string("name")?;
    Ok(cx.world().with_settings(settings))
}

async fn default_from(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let mut settings = cx.world().settings().clone();
    settings.default_from = b.address("account")?;
    Ok(cx.world().with_settings(settings))
}

async fn flag(cx: Context, b: Bindings) -> Result<World, HandlerError> {
    let mut settings = cx.world().settings().clone();
    settings.flags.insert(b.string("key")?, b.string("value")?);
    Ok(cx.world().with_settings(settings))
}

pub fn read_family() -> Result<Family, DeclarationError> {
    Family::new(
        "Read",
        vec![
            Spec::view("", vec![Arg::new("value", core_value()).variadic()], read)
                .doc("Evaluates a value expression and records it in the trace, e.g. `Read Bar Value`."),
        ],
    )
}

pub fn print_family() -> Result<Family, DeclarationError> {
    Family::new(
        "Print",
        vec![Spec::view("", vec![Arg::new("message", string())], print)
            .doc("Records a message in the trace.")],
    )
}

pub fn alias_family() -> Result<Family, DeclarationError> {
    Family::new(
        "Alias",
        vec![Spec::view(
            "",
            vec![Arg::new("name", string()), Arg::new("address", address())],
            alias,
        )
        .doc("Registers a name for an address, e.g. `Alias Oracle 0x…`. Dotted names nest.")],
    )
}

/// Keys with their own `Setting` form; never stored as flags.
const SETTING_VERBS: [&str; 3] = ["DryRun", "Network", "DefaultFrom"];

pub fn setting_family() -> Result<Family, DeclarationError> {
    Family::new(
        "Setting",
        vec![
            Spec::view("DryRun", vec![Arg::new("enabled", boolean())], dry_run)
                .doc("When enabled, transactions are traced but not sent."),
            Spec::view("Network", vec![Arg::new("name", string())], network)
                .doc("Names the network the scenario runs against."),
            Spec::view("DefaultFrom", vec![Arg::new("account", address())], default_from)
                .doc("Sets the sender used when no `From` is given."),
            Spec::view(
                "",
                vec![
                    Arg::new("key", none_of(string(), &SETTING_VERBS)).catchall(),
                    Arg::new("value", string()),
                ],
                flag,
            )
            .doc("Stores any other `key value` pair as a flag."),
        ],
    )
}
