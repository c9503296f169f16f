//! The World: state threaded from one scenario line to the next.
//!
//! A `World` is a value. Every operation that changes it returns a new
//! `World` and leaves the receiver untouched; the state lives behind an
//! `Arc` and is copied on write. A line that fails simply keeps the World
//! it started with.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use scenario_ledger::{Handle, Invocation, Ledger, TxOptions};

use crate::error::HandlerError;
use crate::types::{is_address_literal, Value};

/// Hierarchical registry key, e.g. `["Tokens", "ZRX"]`.
pub type AliasPath = Vec<String>;

/// Build an alias path from its segments.
pub fn alias_path(segments: &[&str]) -> AliasPath {
    segments.iter().map(|s| s.to_string()).collect()
}

/// Split the dotted written form `Tokens.ZRX` into a path.
pub fn parse_alias(dotted: &str) -> AliasPath {
    dotted.split('.').map(str::to_string).collect()
}

/// What is stored under an alias: the deployed object, if any, and free
/// named fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryEntry {
    pub handle: Option<Handle>,
    pub data: BTreeMap<String, Value>,
}

impl RegistryEntry {
    pub fn new(handle: Handle) -> Self {
        RegistryEntry {
            handle: Some(handle),
            data: BTreeMap::new(),
        }
    }

    /// An entry that only records an address.
    pub fn address(address: impl Into<String>) -> Self {
        RegistryEntry::default().with_field("address", Value::Address(address.into()))
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.data.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Address of the entry: the handle's, else an `address` field.
    pub fn resolved_address(&self) -> Option<&str> {
        self.handle
            .as_ref()
            .map(|h| h.address.as_str())
            .or_else(|| self.data.get("address").and_then(Value::as_address))
    }
}

/// Execution-wide flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub network: String,
    pub dry_run: bool,
    /// Account alias or address used as the sender when no `From` form is
    /// active.
    pub default_from: String,
    pub flags: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            network: "development".to_string(),
            dry_run: false,
            default_from: "Root".to_string(),
            flags: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub message: String,
    pub invocation: Option<Invocation>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct State {
    accounts: IndexMap<String, String>,
    registry: IndexMap<AliasPath, RegistryEntry>,
    settings: Settings,
    trace: Vec<TraceEntry>,
    tx_options: TxOptions,
}

#[derive(Clone)]
pub struct World {
    ledger: Arc<dyn Ledger>,
    state: Arc<State>,
}

impl World {
    pub fn new(ledger: Arc<dyn Ledger>, settings: Settings) -> Self {
        World {
            ledger,
            state: Arc::new(State {
                settings,
                ..State::default()
            }),
        }
    }

    fn update(&self, f: impl FnOnce(&mut State)) -> World {
        let mut next = self.clone();
        f(Arc::make_mut(&mut next.state));
        next
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    // ──────────────────────────────────────────────
    // Accounts
    // ──────────────────────────────────────────────

    pub fn with_account(&self, name: impl Into<String>, address: impl Into<String>) -> World {
        let (name, address) = (name.into(), address.into());
        self.update(|s| {
            s.accounts.insert(name, address);
        })
    }

    pub fn accounts(&self) -> &IndexMap<String, String> {
        &self.state.accounts
    }

    pub fn account(&self, name: &str) -> Option<&str> {
        self.state.accounts.get(name).map(String::as_str)
    }

    // ──────────────────────────────────────────────
    // Registry
    // ──────────────────────────────────────────────

    /// Store `entry` under each of `paths`. The last write at a path wins.
    pub fn register(&self, paths: &[AliasPath], entry: RegistryEntry) -> World {
        self.update(|s| {
            for path in paths {
                s.registry.insert(path.clone(), entry.clone());
            }
        })
    }

    pub fn entry(&self, path: &[String]) -> Option<&RegistryEntry> {
        self.state.registry.get(path)
    }

    /// Look up a dotted alias such as `Bar` or `Tokens.ZRX`.
    pub fn lookup(&self, alias: &str) -> Result<&RegistryEntry, HandlerError> {
        self.entry(&parse_alias(alias))
            .ok_or_else(|| HandlerError::UnknownAlias(alias.to_string()))
    }

    /// Registered paths and entries in insertion order.
    pub fn registry(&self) -> impl Iterator<Item = (&AliasPath, &RegistryEntry)> {
        self.state.registry.iter()
    }

    /// Find the deployed object at `address`.
    pub fn find_handle(&self, address: &str) -> Result<Handle, HandlerError> {
        self.state
            .registry
            .values()
            .filter_map(|e| e.handle.as_ref())
            .find(|h| h.address.eq_ignore_ascii_case(address))
            .cloned()
            .ok_or_else(|| HandlerError::UnknownAlias(address.to_string()))
    }

    /// Resolve a token to an address: a literal address, then a named
    /// account, then a registry alias with a handle or `address` field.
    pub fn resolve_address(&self, token: &str) -> Option<String> {
        if is_address_literal(token) {
            return Some(token.to_string());
        }
        if let Some(addr) = self.account(token) {
            return Some(addr.to_string());
        }
        self.entry(&parse_alias(token))
            .and_then(RegistryEntry::resolved_address)
            .map(str::to_string)
    }

    // ──────────────────────────────────────────────
    // Settings, trace, transaction options
    // ──────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn with_settings(&self, settings: Settings) -> World {
        self.update(|s| s.settings = settings)
    }

    pub fn trace(&self, message: impl Into<String>, invocation: Option<Invocation>) -> World {
        let entry = TraceEntry {
            message: message.into(),
            invocation,
        };
        self.update(|s| s.trace.push(entry))
    }

    pub fn trace_entries(&self) -> &[TraceEntry] {
        &self.state.trace
    }

    pub fn tx_options(&self) -> &TxOptions {
        &self.state.tx_options
    }

    pub fn with_tx_options(&self, options: TxOptions) -> World {
        self.update(|s| s.tx_options = options)
    }

    pub fn clear_tx_options(&self) -> World {
        self.with_tx_options(TxOptions::default())
    }

    /// Sender for the next transaction: the active `From` address, else
    /// the default sender resolved against accounts and aliases.
    pub fn sender(&self) -> Option<String> {
        self.state
            .tx_options
            .from
            .clone()
            .or_else(|| self.resolve_address(&self.state.settings.default_from))
    }

    // ──────────────────────────────────────────────
    // Identity
    // ──────────────────────────────────────────────

    /// Deep equality of everything except the ledger connection.
    pub fn same_state(&self, other: &World) -> bool {
        self.state == other.state
    }

    /// Whether both Worlds share the same state allocation.
    pub fn ptr_eq(&self, other: &World) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("accounts", &self.state.accounts)
            .field("registry", &self.state.registry)
            .field("settings", &self.state.settings)
            .field("trace", &self.state.trace.len())
            .field("tx_options", &self.state.tx_options)
            .finish()
    }
}
