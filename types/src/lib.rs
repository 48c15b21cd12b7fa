//! Types shared between the Vela execution engine and its embedders.
//!
//! Everything a blockchain node needs in order to drive the VM lives here:
//! the typed transaction inputs, the [`VmOutput`] record the engine produces,
//! and the two capability traits ([`BlockchainHook`], [`CryptoHook`]) the
//! engine consumes but does not implement.

#![warn(missing_docs)]

mod address;
mod code_metadata;
mod hooks;
mod return_code;
mod vm_input;
mod vm_output;

pub use address::Address;
pub use code_metadata::CodeMetadata;
pub use hooks::{BlockchainHook, CryptoError, CryptoHook, HookError};
pub use return_code::ReturnCode;
pub use vm_input::{CallType, ContractCallInput, ContractCreateInput, VmInput};
pub use vm_output::{LogEntry, OutputAccount, OutputTransfer, StorageUpdate, VmOutput};

/// Reserved function name that routes an ordinary contract call to the
/// upgrade path instead.
pub const UPGRADE_FUNCTION_NAME: &str = "upgradeContract";

/// Function executed on contract deployment and after an upgrade.
pub const INIT_FUNCTION_NAME: &str = "init";
