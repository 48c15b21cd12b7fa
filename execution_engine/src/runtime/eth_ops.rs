//! The Ethereum-compatibility host functions, imported by contracts under
//! the `"ethereum"` module name.
//!
//! The subset mirrors the ewasm environment interface closely enough for
//! interop tooling: balances and call values cross as 16-byte little-endian
//! integers, storage works on fixed 32-byte cells, and call data is the
//! canonical `function@hexarg@…` rendering of the call input.

use num_traits::ToPrimitive;

use vela_types::{BlockchainHook, CryptoHook, HookError};

use crate::{config::GasSchedule, execution::ExecutionError};

use super::{Runtime, STORAGE_KEY_LENGTH};

/// Width of an ewasm value slot (u128, little endian).
const ETH_VALUE_LENGTH: usize = 16;

fn eth_value_bytes(value: u128) -> [u8; ETH_VALUE_LENGTH] {
    value.to_le_bytes()
}

impl<'a, B: BlockchainHook, C: CryptoHook> Runtime<'a, B, C> {
    /// The canonical transaction-data rendering of the current call.
    fn call_data(&self) -> Vec<u8> {
        let input = self.host.runtime.vm_input();
        let mut data = input.function.as_bytes().to_vec();
        for argument in &input.arguments {
            data.push(b'@');
            data.extend_from_slice(hex::encode(argument).as_bytes());
        }
        data
    }

    pub(crate) fn eth_use_gas(&mut self, amount: i64) -> Result<(), ExecutionError> {
        let base = self.schedule().eth_api_cost.use_gas;
        self.charge(base)?;
        let amount = u64::try_from(amount)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative gas amount".into()))?;
        self.charge(amount)
    }

    pub(crate) fn eth_get_address(&mut self, result_offset: i32) -> Result<(), ExecutionError> {
        let cost = self.schedule().eth_api_cost.get_address;
        self.charge(cost)?;
        let address = self.host.runtime.storage_address();
        self.mem_store(result_offset, address.as_bytes())
    }

    pub(crate) fn eth_get_external_balance(
        &mut self,
        address_offset: i32,
        result_offset: i32,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().eth_api_cost.get_external_balance;
        self.charge(cost)?;
        let address = self.load_address(address_offset)?;
        let balance = self.host.blockchain.get_balance(&address)?;
        // Balances beyond 128 bits saturate; deterministic, and far beyond
        // any minted supply.
        let narrowed = balance.to_u128().unwrap_or(u128::MAX);
        self.mem_store(result_offset, &eth_value_bytes(narrowed))
    }

    pub(crate) fn eth_get_block_hash(
        &mut self,
        number: i64,
        result_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let cost = self.schedule().eth_api_cost.get_block_hash;
        self.charge(cost)?;
        let number = match u64::try_from(number) {
            Ok(number) => number,
            Err(_) => return Ok(1),
        };
        match self.host.blockchain.get_blockhash(number) {
            Ok(hash) => {
                self.mem_store(result_offset, &hash)?;
                Ok(0)
            }
            Err(HookError::BlockNotFound) => Ok(1),
            Err(other) => Err(other.into()),
        }
    }

    pub(crate) fn eth_get_call_data_size(&mut self) -> Result<i32, ExecutionError> {
        let cost = self.schedule().eth_api_cost.get_call_data_size;
        self.charge(cost)?;
        Ok(self.call_data().len() as i32)
    }

    pub(crate) fn eth_call_data_copy(
        &mut self,
        result_offset: i32,
        data_offset: i32,
        length: i32,
    ) -> Result<(), ExecutionError> {
        let size = usize::try_from(length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().eth_api_cost.call_data_copy,
            size,
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;

        let call_data = self.call_data();
        let start = usize::try_from(data_offset)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data offset".into()))?;
        let end = start
            .checked_add(size)
            .filter(|end| *end <= call_data.len())
            .ok_or_else(|| {
                ExecutionError::ArgumentOutOfRange("call data slice out of bounds".into())
            })?;
        self.mem_store(result_offset, &call_data[start..end])
    }

    pub(crate) fn eth_get_caller(&mut self, result_offset: i32) -> Result<(), ExecutionError> {
        let cost = self.schedule().eth_api_cost.get_caller;
        self.charge(cost)?;
        let caller = self.host.runtime.vm_input().caller;
        self.mem_store(result_offset, caller.as_bytes())
    }

    pub(crate) fn eth_get_call_value(&mut self, result_offset: i32) -> Result<(), ExecutionError> {
        let cost = self.schedule().eth_api_cost.get_call_value;
        self.charge(cost)?;
        let value = self.host.runtime.vm_input().call_value.clone();
        let narrowed = value.to_u128().unwrap_or(u128::MAX);
        self.mem_store(result_offset, &eth_value_bytes(narrowed))
    }

    pub(crate) fn eth_storage_store(
        &mut self,
        key_offset: i32,
        value_offset: i32,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().eth_api_cost.storage_store;
        self.charge(cost)?;
        let key = self.load_storage_key(key_offset)?;
        let value = self.mem_load(value_offset, STORAGE_KEY_LENGTH as i32)?;
        // An all-zero cell is a deletion, so clears earn the release refund.
        let stored: &[u8] = if value.iter().all(|byte| *byte == 0) {
            &[]
        } else {
            &value
        };
        self.set_storage(&key, stored)?;
        Ok(())
    }

    pub(crate) fn eth_storage_load(
        &mut self,
        key_offset: i32,
        result_offset: i32,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().eth_api_cost.storage_load;
        self.charge(cost)?;
        let key = self.load_storage_key(key_offset)?;
        let address = self.host.runtime.storage_address();
        let value =
            self.host
                .storage
                .get_storage(self.host.blockchain.hook(), &address, &key)?;
        if value.len() > STORAGE_KEY_LENGTH {
            return Err(ExecutionError::ArgumentOutOfRange(
                "stored value exceeds 32 bytes".into(),
            ));
        }
        let mut cell = [0u8; STORAGE_KEY_LENGTH];
        cell[STORAGE_KEY_LENGTH - value.len()..].copy_from_slice(&value);
        self.mem_store(result_offset, &cell)
    }

    pub(crate) fn eth_get_gas_left(&mut self) -> Result<i64, ExecutionError> {
        let cost = self.schedule().eth_api_cost.get_gas_left;
        self.charge(cost)?;
        Ok(self.host.metering.gas_left() as i64)
    }

    pub(crate) fn eth_get_block_timestamp(&mut self) -> Result<i64, ExecutionError> {
        let cost = self.schedule().eth_api_cost.get_block_timestamp;
        self.charge(cost)?;
        Ok(self.host.blockchain.last_time_stamp() as i64)
    }

    pub(crate) fn eth_get_block_number(&mut self) -> Result<i64, ExecutionError> {
        let cost = self.schedule().eth_api_cost.get_block_number;
        self.charge(cost)?;
        Ok(self.host.blockchain.last_nonce() as i64)
    }

    pub(crate) fn eth_get_block_gas_limit(&mut self) -> Result<i64, ExecutionError> {
        let cost = self.schedule().eth_api_cost.get_block_gas_limit;
        self.charge(cost)?;
        Ok(self.host.metering.block_gas_limit() as i64)
    }

    pub(crate) fn eth_get_tx_origin(&mut self, result_offset: i32) -> Result<(), ExecutionError> {
        let cost = self.schedule().eth_api_cost.get_tx_origin;
        self.charge(cost)?;
        // The engine tracks one transaction at a time; the frame's caller is
        // the closest notion of an origin the hook surface offers.
        let caller = self.host.runtime.vm_input().caller;
        self.mem_store(result_offset, caller.as_bytes())
    }

    pub(crate) fn eth_finish(
        &mut self,
        data_offset: i32,
        length: i32,
    ) -> Result<(), ExecutionError> {
        let size = usize::try_from(length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().eth_api_cost.eth_finish,
            size,
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;
        let data = self.mem_load(data_offset, length)?;
        self.host.output.finish(data);
        Ok(())
    }

    pub(crate) fn eth_revert(
        &mut self,
        data_offset: i32,
        length: i32,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().eth_api_cost.revert;
        self.charge(cost)?;
        let data = self.mem_load(data_offset, length)?;
        Err(ExecutionError::SignalError(
            String::from_utf8_lossy(&data).into_owned(),
        ))
    }
}
