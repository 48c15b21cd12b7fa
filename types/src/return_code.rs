use core::fmt;

use serde::{Deserialize, Serialize};

/// Status of a finished contract invocation, as surfaced in
/// [`VmOutput`](crate::VmOutput) and to calling contracts.
///
/// The discriminants are part of the on-chain observable contract and must
/// never be reordered.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u64)]
pub enum ReturnCode {
    /// The invocation completed normally.
    Ok = 0,
    /// The requested function is not exported by the contract.
    FunctionNotFound = 1,
    /// The requested function exists but does not have the required signature.
    FunctionWrongSignature = 2,
    /// The callee account does not exist or holds no code.
    ContractNotFound = 3,
    /// The contract signalled an error.
    UserError = 4,
    /// The gas provided was exhausted.
    OutOfGas = 5,
    /// Contract creation collided with an existing account.
    AccountCollision = 6,
    /// A value transfer exceeded the sender's balance.
    OutOfFunds = 7,
    /// Nested calls exceeded the maximum allowed depth.
    CallStackOverFlow = 8,
    /// The contract code failed to parse or validate.
    ContractInvalid = 9,
    /// Any other failure of the execution itself.
    ExecutionFailed = 10,
}

impl ReturnCode {
    /// Returns the numeric form exposed to contracts.
    pub fn as_u64(self) -> u64 {
        self as u64
    }

    /// The default human-readable message for this status.
    pub fn message(self) -> &'static str {
        match self {
            ReturnCode::Ok => "",
            ReturnCode::FunctionNotFound => "function not found",
            ReturnCode::FunctionWrongSignature => "wrong signature for function",
            ReturnCode::ContractNotFound => "contract not found",
            ReturnCode::UserError => "user error",
            ReturnCode::OutOfGas => "out of gas",
            ReturnCode::AccountCollision => "account collision",
            ReturnCode::OutOfFunds => "out of funds",
            ReturnCode::CallStackOverFlow => "call stack overflow",
            ReturnCode::ContractInvalid => "contract invalid",
            ReturnCode::ExecutionFailed => "execution failed",
        }
    }

    /// True for every status other than [`ReturnCode::Ok`].
    pub fn is_error(self) -> bool {
        !matches!(self, ReturnCode::Ok)
    }
}

impl Default for ReturnCode {
    fn default() -> Self {
        ReturnCode::Ok
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let ReturnCode::Ok = self {
            write!(f, "ok")
        } else {
            write!(f, "{}", self.message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_preserve_discriminants() {
        assert_eq!(ReturnCode::Ok.as_u64(), 0);
        assert_eq!(ReturnCode::UserError.as_u64(), 4);
        assert_eq!(ReturnCode::OutOfGas.as_u64(), 5);
        assert_eq!(ReturnCode::ExecutionFailed.as_u64(), 10);
    }
}
