mod error;
pub mod memory;
mod record;
mod traits;

pub use error::LedgerError;
pub use memory::{CallContext, MemoryLedger, Program, ProgramState};
pub use record::{Handle, Invocation, Receipt, TxOptions};
pub use traits::Ledger;
