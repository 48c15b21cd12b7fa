//! The mutable contexts composed into the VM host.
//!
//! Each context supports the transactional state-stack discipline:
//! `init_state` at transaction start, `push_state` at nested-call entry,
//! then either `pop_set_active_state` (roll back), `pop_discard` (commit)
//! or `clear_state_stack` (transaction end).

pub mod big_int;
pub mod blockchain;
pub mod metering;
pub mod output;
pub mod runtime;
pub mod storage;

pub use big_int::{BigIntContext, BigIntHandle};
pub use blockchain::BlockchainContext;
pub use metering::MeteringContext;
pub use output::OutputContext;
pub use runtime::{AsyncCallInfo, FrameStatus, RuntimeContext, WasmInstance};
pub use storage::{StorageContext, StorageStatus};
