//! Execution error and supporting code.
use thiserror::Error;

use vela_types::{Address, HookError, ReturnCode};

use crate::{resolvers::ResolverError, wasm_prep::PreprocessingError};

/// Possible ways a contract frame can fail.
///
/// The error implements [`wasmi::HostError`] so host callbacks can trap the
/// running instance with a typed value; the invoke path downcasts it back to
/// decide the frame's outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExecutionError {
    /// Wasm interpreter error not attributable to a more specific kind.
    #[error("interpreter error: {0}")]
    Interpreter(String),
    /// The contract called `signalError`.
    #[error("{0}")]
    SignalError(String),
    /// A gas charge exceeded the remaining gas of the frame.
    #[error("out of gas")]
    GasLimit,
    /// The gas provided did not cover the up-front execution costs.
    #[error("not enough gas")]
    NotEnoughGas,
    /// An asynchronous call requested more gas than remains after locking
    /// the callback reserve.
    #[error("gas limit exceeded in async call")]
    GasLimitExceededInAsync,
    /// A host call referenced memory outside the instance's linear memory.
    #[error("bad bounds of memory access")]
    MemoryBoundsExceeded,
    /// A numeric argument was outside its allowed range.
    #[error("argument out of range: {0}")]
    ArgumentOutOfRange(String),
    /// Unable to find a function.
    #[error("function not found: {0}")]
    FunctionNotFound(String),
    /// An exported function exists but has the wrong signature.
    #[error("wrong signature for function: {0}")]
    FunctionWrongSignature(String),
    /// The callee account does not exist or holds no code.
    #[error("contract not found: {0}")]
    ContractNotFound(Address),
    /// Error preprocessing contract Wasm bytes.
    #[error("wasm preprocessing error: {0}")]
    WasmPreprocessing(#[from] PreprocessingError),
    /// The module carries an unsupported `start` section.
    #[error("unsupported wasm start section")]
    UnsupportedWasmStart,
    /// The module failed wasm validation or instantiation.
    #[error("invalid contract module: {0}")]
    InvalidModule(String),
    /// Error using the Wasm host function resolver.
    #[error("resolver error: {0}")]
    Resolver(#[from] ResolverError),
    /// Contract creation collided with an existing account.
    #[error("account collision: {0}")]
    AccountCollision(Address),
    /// A value transfer exceeded the sender's balance.
    #[error("out of funds")]
    OutOfFunds,
    /// Nested calls exceeded the maximum allowed depth.
    #[error("call stack overflow")]
    CallStackOverflow,
    /// Cooperative suspension: the frame stops here and its continuation is
    /// persisted in the output. Not a failure.
    #[error("async call triggered")]
    AsyncCallTriggered,
    /// The blockchain hook failed.
    #[error(transparent)]
    Hook(#[from] HookError),
}

impl ExecutionError {
    /// The return code surfaced for this error in a [`vela_types::VmOutput`]
    /// and to calling contracts.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            ExecutionError::SignalError(_) => ReturnCode::UserError,
            ExecutionError::GasLimit => ReturnCode::OutOfGas,
            ExecutionError::FunctionNotFound(_) => ReturnCode::FunctionNotFound,
            ExecutionError::FunctionWrongSignature(_) => ReturnCode::FunctionWrongSignature,
            ExecutionError::ContractNotFound(_) => ReturnCode::ContractNotFound,
            ExecutionError::WasmPreprocessing(_)
            | ExecutionError::UnsupportedWasmStart
            | ExecutionError::InvalidModule(_)
            | ExecutionError::Resolver(_) => ReturnCode::ContractInvalid,
            ExecutionError::AccountCollision(_) => ReturnCode::AccountCollision,
            ExecutionError::OutOfFunds => ReturnCode::OutOfFunds,
            ExecutionError::CallStackOverflow => ReturnCode::CallStackOverFlow,
            ExecutionError::AsyncCallTriggered => ReturnCode::Ok,
            ExecutionError::Interpreter(_)
            | ExecutionError::NotEnoughGas
            | ExecutionError::GasLimitExceededInAsync
            | ExecutionError::MemoryBoundsExceeded
            | ExecutionError::ArgumentOutOfRange(_)
            | ExecutionError::Hook(_) => ReturnCode::ExecutionFailed,
        }
    }
}

impl wasmi::HostError for ExecutionError {}

impl From<wasmi::Error> for ExecutionError {
    fn from(error: wasmi::Error) -> Self {
        match error
            .as_host_error()
            .and_then(|host_error| host_error.downcast_ref::<ExecutionError>())
        {
            Some(error) => error.clone(),
            None => ExecutionError::Interpreter(error.to_string()),
        }
    }
}

impl From<wasmi::Trap> for ExecutionError {
    fn from(trap: wasmi::Trap) -> Self {
        ExecutionError::from(wasmi::Error::Trap(trap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_errors_to_return_codes() {
        assert_eq!(
            ExecutionError::SignalError("nope".into()).return_code(),
            ReturnCode::UserError
        );
        assert_eq!(ExecutionError::GasLimit.return_code(), ReturnCode::OutOfGas);
        assert_eq!(
            ExecutionError::CallStackOverflow.return_code(),
            ReturnCode::CallStackOverFlow
        );
        assert_eq!(
            ExecutionError::MemoryBoundsExceeded.return_code(),
            ReturnCode::ExecutionFailed
        );
    }

    #[test]
    fn should_round_trip_through_a_wasmi_trap() {
        let trap: wasmi::Trap = ExecutionError::SignalError("stop".into()).into();
        let recovered = ExecutionError::from(trap);
        assert_eq!(recovered, ExecutionError::SignalError("stop".into()));
    }
}
