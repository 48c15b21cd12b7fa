use std::collections::BTreeMap;

use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

use crate::{Address, CallType, CodeMetadata, ReturnCode};

/// One recorded storage write.
///
/// Writes that restate the baseline value are still recorded, tagged with
/// `written: false`, so that clearing refunds can be computed downstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUpdate {
    /// The storage key.
    pub key: Vec<u8>,
    /// The new value; empty means the slot was cleared.
    pub value: Vec<u8>,
    /// False when the write restated the baseline value.
    pub written: bool,
}

/// One log entry emitted by a contract, in program order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The account that emitted the log.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<Vec<u8>>,
    /// Opaque payload.
    pub data: Vec<u8>,
}

/// A value transfer leaving the VM, recorded on the receiving account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputTransfer {
    /// The sending account.
    pub sender: Address,
    /// Amount transferred.
    pub value: BigUint,
    /// Payload attached to the transfer.
    pub data: Vec<u8>,
    /// Whether the transfer is part of an asynchronous call.
    pub call_type: CallType,
}

/// Pending modifications to one account, produced by a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputAccount {
    /// The account address.
    pub address: Address,
    /// Number of nonce increments performed by the transaction.
    pub nonce_delta: u64,
    /// Signed balance change.
    pub balance_delta: BigInt,
    /// Storage writes keyed by storage key, values in final state.
    pub storage_updates: BTreeMap<Vec<u8>, StorageUpdate>,
    /// Transfers received by this account, in program order.
    pub output_transfers: Vec<OutputTransfer>,
    /// New code, when the transaction deployed or upgraded this account.
    pub code: Option<Vec<u8>>,
    /// New code metadata, set together with `code`.
    pub code_metadata: Option<CodeMetadata>,
    /// Continuation descriptor of a suspended asynchronous call.
    pub async_call_data: Option<Vec<u8>>,
}

impl OutputAccount {
    /// An empty change-set for `address`.
    pub fn new(address: Address) -> Self {
        OutputAccount {
            address,
            ..Default::default()
        }
    }

    /// Folds `other` into `self`, preserving program order of transfers and
    /// letting later storage writes win.
    pub fn merge(&mut self, other: OutputAccount) {
        self.nonce_delta += other.nonce_delta;
        self.balance_delta += other.balance_delta;
        self.storage_updates.extend(other.storage_updates);
        self.output_transfers.extend(other.output_transfers);
        if other.code.is_some() {
            self.code = other.code;
            self.code_metadata = other.code_metadata;
        }
        if other.async_call_data.is_some() {
            self.async_call_data = other.async_call_data;
        }
    }
}

/// The single observable product of one transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VmOutput {
    /// Final status.
    pub return_code: ReturnCode,
    /// Human-readable message accompanying an error status.
    pub return_message: String,
    /// Return-data chunks in the order the contract produced them.
    pub return_data: Vec<Vec<u8>>,
    /// Gas left unspent at the end of the transaction.
    pub gas_remaining: u64,
    /// Gas credited back for storage clears.
    pub gas_refund: BigUint,
    /// Per-account pending modifications.
    pub output_accounts: BTreeMap<Address, OutputAccount>,
    /// Accounts deleted by the transaction.
    pub deleted_accounts: Vec<Address>,
    /// Log entries in program order.
    pub logs: Vec<LogEntry>,
}

impl VmOutput {
    /// An error output: all gas consumed, no state changes.
    pub fn from_error(return_code: ReturnCode, return_message: impl Into<String>) -> Self {
        VmOutput {
            return_code,
            return_message: return_message.into(),
            ..Default::default()
        }
    }

    /// Returns the change-set recorded for `address`, if any.
    pub fn account(&self, address: &Address) -> Option<&OutputAccount> {
        self.output_accounts.get(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_merge_output_accounts_in_order() {
        let address = Address::new([1; 32]);
        let mut first = OutputAccount::new(address);
        first.balance_delta = BigInt::from(10);
        first.output_transfers.push(OutputTransfer {
            sender: Address::zero(),
            value: BigUint::from(10u32),
            data: vec![],
            call_type: CallType::DirectCall,
        });

        let mut second = OutputAccount::new(address);
        second.balance_delta = BigInt::from(-4);
        second.output_transfers.push(OutputTransfer {
            sender: Address::new([2; 32]),
            value: BigUint::from(4u32),
            data: b"x".to_vec(),
            call_type: CallType::DirectCall,
        });

        first.merge(second);
        assert_eq!(first.balance_delta, BigInt::from(6));
        assert_eq!(first.output_transfers.len(), 2);
        assert_eq!(first.output_transfers[1].data, b"x".to_vec());
    }
}
