//! In-process simulated ledger.
//!
//! Contracts are [`Program`]s registered by kind. Deployed objects keep
//! their state as a JSON map. A `send` runs against a copy of the state and
//! only commits it if the program returns `Ok`, so a rejected call never
//! leaves partial changes behind.
//!
//! Addresses and transaction hashes are derived with SHA-256 from a
//! counter, so two runs of the same scenario see the same values.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::error::LedgerError;
use crate::record::{Handle, Invocation, Receipt, TxOptions};
use crate::traits::Ledger;

/// Persistent storage of one deployed object.
pub type ProgramState = BTreeMap<String, serde_json::Value>;

/// Number of unlocked accounts a fresh `MemoryLedger` exposes.
pub const DEFAULT_ACCOUNT_COUNT: usize = 10;

const BASE_GAS: u64 = 21_000;
const GAS_PER_ARG: u64 = 1_000;

/// Who is calling and with what attached value.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub sender: &'a str,
    pub value: Option<&'a str>,
    pub address: &'a str,
}

/// Behavior of one contract kind.
pub trait Program: Send + Sync {
    fn kind(&self) -> &str;

    /// Build the initial state from constructor arguments.
    fn construct(
        &self,
        cx: &CallContext<'_>,
        args: &[serde_json::Value],
    ) -> Result<ProgramState, LedgerError>;

    fn read(
        &self,
        state: &ProgramState,
        method: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value, LedgerError>;

    fn send(
        &self,
        cx: &CallContext<'_>,
        state: &mut ProgramState,
        method: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value, LedgerError>;
}

/// Fetch positional argument `idx` or fail with `InvalidArgument`.
pub fn arg<'a>(
    method: &str,
    args: &'a [serde_json::Value],
    idx: usize,
) -> Result<&'a serde_json::Value, LedgerError> {
    args.get(idx).ok_or_else(|| LedgerError::InvalidArgument {
        method: method.to_string(),
        message: format!("missing argument {}", idx),
    })
}

/// `0x` + 40 hex digits taken from SHA-256 of `seed:nonce`.
pub fn derive_address(seed: &str, nonce: u64) -> String {
    let digest = Sha256::digest(format!("{}:{}", seed, nonce).as_bytes());
    let hex: String = digest.iter().take(20).map(|b| format!("{:02x}", b)).collect();
    format!("0x{}", hex)
}

fn derive_tx_hash(address: &str, method: &str, nonce: u64) -> String {
    let digest = Sha256::digest(format!("{}:{}:{}", address, method, nonce).as_bytes());
    format!("0x{:x}", digest)
}

struct Deployed {
    kind: String,
    state: ProgramState,
}

#[derive(Default)]
struct Chain {
    contracts: HashMap<String, Deployed>,
    nonce: u64,
    block_number: u64,
}

pub struct MemoryLedger {
    programs: HashMap<String, Arc<dyn Program>>,
    accounts: Vec<String>,
    chain: Mutex<Chain>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::with_account_count(DEFAULT_ACCOUNT_COUNT)
    }

    pub fn with_account_count(count: usize) -> Self {
        MemoryLedger {
            programs: HashMap::new(),
            accounts: (0..count as u64)
                .map(|i| derive_address("account", i))
                .collect(),
            chain: Mutex::new(Chain::default()),
        }
    }

    /// Register a program under its kind. A later registration of the same
    /// kind replaces the earlier one.
    pub fn register(&mut self, program: impl Program + 'static) {
        self.programs
            .insert(program.kind().to_string(), Arc::new(program));
    }

    pub fn with_program(mut self, program: impl Program + 'static) -> Self {
        self.register(program);
        self
    }

    /// Current state of a deployed object, for test inspection.
    pub fn state_of(&self, address: &str) -> Option<ProgramState> {
        let chain = self.chain.lock().unwrap_or_else(|e| e.into_inner());
        chain
            .contracts
            .get(&address.to_lowercase())
            .map(|d| d.state.clone())
    }

    pub fn block_number(&self) -> u64 {
        self.chain
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .block_number
    }

    fn program(&self, kind: &str) -> Result<Arc<dyn Program>, LedgerError> {
        self.programs
            .get(kind)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownKind {
                kind: kind.to_string(),
            })
    }

    fn sender<'a>(&'a self, opts: &'a TxOptions) -> &'a str {
        opts.from
            .as_deref()
            .or_else(|| self.accounts.first().map(String::as_str))
            .unwrap_or("0x0000000000000000000000000000000000000000")
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn accounts(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self.accounts.clone())
    }

    async fn deploy(
        &self,
        kind: &str,
        args: &[serde_json::Value],
        opts: &TxOptions,
    ) -> Result<Handle, LedgerError> {
        let program = self.program(kind)?;
        let mut chain = self.chain.lock().unwrap_or_else(|e| e.into_inner());
        let address = derive_address("contract", chain.nonce);
        let cx = CallContext {
            sender: self.sender(opts),
            value: opts.value.as_deref(),
            address: &address,
        };
        let state = program.construct(&cx, args)?;
        chain.nonce += 1;
        chain.block_number += 1;
        chain.contracts.insert(
            address.clone(),
            Deployed {
                kind: kind.to_string(),
                state,
            },
        );
        trace!(kind, %address, "deployed");
        Ok(Handle {
            kind: kind.to_string(),
            address,
        })
    }

    async fn read(
        &self,
        handle: &Handle,
        method: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value, LedgerError> {
        let chain = self.chain.lock().unwrap_or_else(|e| e.into_inner());
        let deployed = chain
            .contracts
            .get(&handle.address.to_lowercase())
            .ok_or_else(|| LedgerError::UnknownContract {
                address: handle.address.clone(),
            })?;
        let program = self.program(&deployed.kind)?;
        trace!(address = %handle.address, method, "read");
        program.read(&deployed.state, method, args)
    }

    async fn send(
        &self,
        handle: &Handle,
        method: &str,
        args: &[serde_json::Value],
        opts: &TxOptions,
    ) -> Result<Invocation, LedgerError> {
        let mut chain = self.chain.lock().unwrap_or_else(|e| e.into_inner());
        let key = handle.address.to_lowercase();
        let (kind, mut scratch) = match chain.contracts.get(&key) {
            Some(d) => (d.kind.clone(), d.state.clone()),
            None => {
                return Err(LedgerError::UnknownContract {
                    address: handle.address.clone(),
                })
            }
        };
        let program = self.program(&kind)?;
        let cx = CallContext {
            sender: self.sender(opts),
            value: opts.value.as_deref(),
            address: &handle.address,
        };
        trace!(address = %handle.address, method, sender = cx.sender, "send");

        match program.send(&cx, &mut scratch, method, args) {
            Ok(value) => {
                chain.nonce += 1;
                chain.block_number += 1;
                let receipt = Receipt {
                    tx_hash: derive_tx_hash(&key, method, chain.nonce),
                    block_number: chain.block_number,
                    gas_used: BASE_GAS + GAS_PER_ARG * args.len() as u64,
                };
                if let Some(d) = chain.contracts.get_mut(&key) {
                    d.state = scratch;
                }
                Ok(Invocation::succeeded(method, value, receipt))
            }
            Err(e) => Ok(Invocation::failed(method, e)),
        }
    }
}
