//! Gas prices of the host-function table, grouped by API section.
//!
//! Every host call is charged its section entry before it performs any work;
//! operations touching variable-length data additionally pay the per-byte
//! rates of [`BaseOperationCost`].

use serde::{Deserialize, Serialize};

/// Per-byte rates for dynamic gas components.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct BaseOperationCost {
    /// Writing one byte into contract storage.
    pub store_per_byte: u64,
    /// Refund credited per byte removed from contract storage.
    pub release_per_byte: u64,
    /// Copying one byte between linear memory and the host.
    pub data_copy_per_byte: u64,
    /// Keeping one byte of a modified storage entry.
    pub persist_per_byte: u64,
    /// Preparing one byte of contract code for execution.
    pub compile_per_byte: u64,
    /// Fixed cost of entering a contract call.
    pub invoke_call: u64,
    /// Fixed cost of deploying a contract.
    pub invoke_create: u64,
    /// Fixed cost of upgrading a contract.
    pub invoke_upgrade: u64,
}

impl Default for BaseOperationCost {
    fn default() -> Self {
        BaseOperationCost {
            store_per_byte: 10,
            release_per_byte: 10,
            data_copy_per_byte: 1,
            persist_per_byte: 10,
            compile_per_byte: 1,
            invoke_call: 500,
            invoke_create: 1000,
            invoke_upgrade: 1000,
        }
    }
}

/// Costs of the environment API section.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[allow(missing_docs)]
pub struct EnvApiCost {
    pub get_sc_address: u64,
    pub get_caller: u64,
    pub get_call_value: u64,
    pub get_gas_left: u64,
    pub get_num_arguments: u64,
    pub get_argument: u64,
    pub get_function: u64,
    pub storage_store: u64,
    pub storage_load: u64,
    pub int64_storage_store: u64,
    pub int64_storage_load: u64,
    pub finish: u64,
    pub int64_finish: u64,
    pub signal_error: u64,
    pub write_log: u64,
    pub get_block_timestamp: u64,
    pub get_block_nonce: u64,
    pub get_block_round: u64,
    pub get_block_epoch: u64,
    pub get_block_hash: u64,
    pub get_external_balance: u64,
    pub transfer_value: u64,
    pub execute_on_dest_context: u64,
    pub execute_on_same_context: u64,
    pub create_contract: u64,
    pub async_call_step: u64,
    pub async_callback_gas_lock: u64,
}

impl Default for EnvApiCost {
    fn default() -> Self {
        EnvApiCost {
            get_sc_address: 100,
            get_caller: 100,
            get_call_value: 100,
            get_gas_left: 100,
            get_num_arguments: 100,
            get_argument: 100,
            get_function: 100,
            storage_store: 5000,
            storage_load: 1000,
            int64_storage_store: 5000,
            int64_storage_load: 1000,
            finish: 100,
            int64_finish: 100,
            signal_error: 100,
            write_log: 1000,
            get_block_timestamp: 100,
            get_block_nonce: 100,
            get_block_round: 100,
            get_block_epoch: 100,
            get_block_hash: 1000,
            get_external_balance: 1000,
            transfer_value: 1000,
            execute_on_dest_context: 1000,
            execute_on_same_context: 1000,
            create_contract: 2000,
            async_call_step: 1000,
            async_callback_gas_lock: 4000,
        }
    }
}

/// Costs of the big-integer API section.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[allow(missing_docs)]
pub struct BigIntApiCost {
    pub big_int_new: u64,
    pub big_int_byte_length: u64,
    pub big_int_get_bytes: u64,
    pub big_int_set_bytes: u64,
    pub big_int_is_int64: u64,
    pub big_int_get_int64: u64,
    pub big_int_set_int64: u64,
    pub big_int_add: u64,
    pub big_int_sub: u64,
    pub big_int_mul: u64,
    pub big_int_t_div: u64,
    pub big_int_t_mod: u64,
    pub big_int_pow: u64,
    pub big_int_shift: u64,
    pub big_int_abs: u64,
    pub big_int_neg: u64,
    pub big_int_sign: u64,
    pub big_int_cmp: u64,
    pub big_int_finish: u64,
    pub big_int_storage_store: u64,
    pub big_int_storage_load: u64,
    pub big_int_get_argument: u64,
    pub big_int_get_call_value: u64,
    pub big_int_get_external_balance: u64,
}

impl Default for BigIntApiCost {
    fn default() -> Self {
        BigIntApiCost {
            big_int_new: 100,
            big_int_byte_length: 100,
            big_int_get_bytes: 100,
            big_int_set_bytes: 100,
            big_int_is_int64: 100,
            big_int_get_int64: 100,
            big_int_set_int64: 100,
            big_int_add: 100,
            big_int_sub: 100,
            big_int_mul: 1000,
            big_int_t_div: 1000,
            big_int_t_mod: 1000,
            big_int_pow: 2000,
            big_int_shift: 100,
            big_int_abs: 100,
            big_int_neg: 100,
            big_int_sign: 100,
            big_int_cmp: 100,
            big_int_finish: 100,
            big_int_storage_store: 5000,
            big_int_storage_load: 1000,
            big_int_get_argument: 100,
            big_int_get_call_value: 100,
            big_int_get_external_balance: 1000,
        }
    }
}

/// Costs of the Ethereum-compatibility API section.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[allow(missing_docs)]
pub struct EthApiCost {
    pub use_gas: u64,
    pub get_address: u64,
    pub get_external_balance: u64,
    pub get_block_hash: u64,
    pub get_call_data_size: u64,
    pub call_data_copy: u64,
    pub get_caller: u64,
    pub get_call_value: u64,
    pub storage_store: u64,
    pub storage_load: u64,
    pub get_gas_left: u64,
    pub get_block_timestamp: u64,
    pub get_block_number: u64,
    pub get_block_gas_limit: u64,
    pub get_tx_origin: u64,
    pub eth_finish: u64,
    pub revert: u64,
}

impl Default for EthApiCost {
    fn default() -> Self {
        EthApiCost {
            use_gas: 100,
            get_address: 100,
            get_external_balance: 1000,
            get_block_hash: 1000,
            get_call_data_size: 100,
            call_data_copy: 100,
            get_caller: 100,
            get_call_value: 100,
            storage_store: 5000,
            storage_load: 1000,
            get_gas_left: 100,
            get_block_timestamp: 100,
            get_block_number: 100,
            get_block_gas_limit: 100,
            get_tx_origin: 100,
            eth_finish: 100,
            revert: 100,
        }
    }
}

/// Costs of the cryptographic API section.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[allow(missing_docs)]
pub struct CryptoApiCost {
    pub sha256: u64,
    pub keccak256: u64,
    pub ripemd160: u64,
    pub verify_bls: u64,
    pub verify_ed25519: u64,
    pub verify_secp256k1: u64,
    /// Additional cost per byte hashed.
    pub hash_per_byte: u64,
    /// Additional cost per byte of a verified message.
    pub verify_per_byte: u64,
}

impl Default for CryptoApiCost {
    fn default() -> Self {
        CryptoApiCost {
            sha256: 1000,
            keccak256: 1000,
            ripemd160: 1000,
            verify_bls: 5000,
            verify_ed25519: 5000,
            verify_secp256k1: 5000,
            hash_per_byte: 1,
            verify_per_byte: 1,
        }
    }
}
