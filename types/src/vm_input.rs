use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::{Address, CodeMetadata};

/// Distinguishes ordinary calls from the two halves of an asynchronous call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallType {
    /// A synchronous call, the common case.
    #[default]
    DirectCall,
    /// The outbound half of an asynchronous cross-shard call.
    AsynchronousCall,
    /// The callback half, resuming a previously suspended frame.
    AsynchronousCallback,
}

/// Typed input for deploying a new contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCreateInput {
    /// The deploying account.
    pub caller: Address,
    /// Value transferred to the new contract account.
    pub call_value: BigUint,
    /// The WebAssembly module to deploy.
    pub contract_code: Vec<u8>,
    /// Flags attached to the deployed code.
    pub code_metadata: CodeMetadata,
    /// Arguments passed to the contract's `init` function.
    pub arguments: Vec<Vec<u8>>,
    /// Gas available to the whole transaction.
    pub gas_provided: u64,
    /// Price per unit of gas, used for refund bookkeeping.
    pub gas_price: u64,
}

/// Typed input for calling (or upgrading) a deployed contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCallInput {
    /// The calling account.
    pub caller: Address,
    /// The contract account being called.
    pub recipient: Address,
    /// Value transferred with the call.
    pub call_value: BigUint,
    /// Name of the exported function to execute.
    pub function: String,
    /// Ordered opaque arguments.
    pub arguments: Vec<Vec<u8>>,
    /// Gas available to the whole transaction.
    pub gas_provided: u64,
    /// Price per unit of gas.
    pub gas_price: u64,
    /// Synchronous or asynchronous flavour of the call.
    pub call_type: CallType,
}

/// The normalized per-frame view of either input variant, as held by the
/// runtime context while a frame executes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VmInput {
    /// The calling account of the current frame.
    pub caller: Address,
    /// The account whose storage and balance the frame acts upon.
    pub recipient: Address,
    /// Value transferred into the frame.
    pub call_value: BigUint,
    /// The invoked function name (`init` for deployments).
    pub function: String,
    /// Ordered opaque arguments.
    pub arguments: Vec<Vec<u8>>,
    /// Gas provided to this frame.
    pub gas_provided: u64,
    /// Price per unit of gas.
    pub gas_price: u64,
    /// Synchronous or asynchronous flavour of the call.
    pub call_type: CallType,
}

impl From<&ContractCallInput> for VmInput {
    fn from(input: &ContractCallInput) -> Self {
        VmInput {
            caller: input.caller,
            recipient: input.recipient,
            call_value: input.call_value.clone(),
            function: input.function.clone(),
            arguments: input.arguments.clone(),
            gas_provided: input.gas_provided,
            gas_price: input.gas_price,
            call_type: input.call_type,
        }
    }
}
