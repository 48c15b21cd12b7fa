//! Host-function implementations.
//!
//! [`Runtime`] borrows the host for the duration of one `invoke_export` and
//! implements the wasmi externals interface. Every host function follows
//! the same contract: validate argument ranges against linear memory,
//! compute the gas cost including any dynamic component, charge it, and
//! only then perform the operation. Failures trap the instance with a typed
//! [`ExecutionError`]; host objects never cross the ABI boundary, only
//! handles, offsets, lengths and copied bytes do.

mod args;
mod big_int_ops;
mod eth_ops;
mod externals;

use num_bigint::BigUint;

use vela_types::{
    Address, BlockchainHook, CallType, CodeMetadata, ContractCallInput, ContractCreateInput,
    CryptoHook, HookError,
};

use crate::{
    config::GasSchedule,
    contexts::StorageStatus,
    execution::ExecutionError,
    host::VmHost,
};

/// Length in bytes of a storage key on the ABI.
pub(crate) const STORAGE_KEY_LENGTH: usize = 32;
/// Length in bytes of a call value on the ABI (big-endian).
pub(crate) const CALL_VALUE_LENGTH: usize = 32;

/// Borrow of the host that services one instance invocation.
pub(crate) struct Runtime<'a, B, C> {
    host: &'a mut VmHost<B, C>,
}

impl<'a, B: BlockchainHook, C: CryptoHook> Runtime<'a, B, C> {
    pub(crate) fn new(host: &'a mut VmHost<B, C>) -> Self {
        Runtime { host }
    }

    fn schedule(&self) -> &GasSchedule {
        self.host.metering.gas_schedule()
    }

    fn charge(&mut self, amount: u64) -> Result<(), ExecutionError> {
        self.host.metering.use_gas(amount)
    }

    fn mem_load(&self, offset: i32, length: i32) -> Result<Vec<u8>, ExecutionError> {
        self.host.runtime.mem_load(offset, length)
    }

    fn mem_store(&self, offset: i32, data: &[u8]) -> Result<(), ExecutionError> {
        self.host.runtime.mem_store(offset, data)
    }

    fn load_address(&self, offset: i32) -> Result<Address, ExecutionError> {
        let bytes = self.mem_load(offset, Address::zero().as_bytes().len() as i32)?;
        Address::try_from_slice(&bytes).ok_or(ExecutionError::MemoryBoundsExceeded)
    }

    fn load_call_value(&self, offset: i32) -> Result<BigUint, ExecutionError> {
        let bytes = self.mem_load(offset, CALL_VALUE_LENGTH as i32)?;
        Ok(BigUint::from_bytes_be(&bytes))
    }

    fn load_storage_key(&self, offset: i32) -> Result<Vec<u8>, ExecutionError> {
        self.mem_load(offset, STORAGE_KEY_LENGTH as i32)
    }

    /// The raw argument blobs of a nested call: `count` little-endian u32
    /// lengths at `lengths_offset`, data laid out back to back at
    /// `data_offset`.
    fn read_call_arguments(
        &self,
        count: i32,
        lengths_offset: i32,
        data_offset: i32,
    ) -> Result<Vec<Vec<u8>>, ExecutionError> {
        let count = usize::try_from(count)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative argument count".into()))?;
        let lengths_size = count
            .checked_mul(4)
            .and_then(|total| i32::try_from(total).ok())
            .ok_or_else(|| {
                ExecutionError::ArgumentOutOfRange("argument count too large".into())
            })?;
        let raw_lengths = self.mem_load(lengths_offset, lengths_size)?;

        let mut arguments = Vec::with_capacity(count);
        let mut cursor = data_offset;
        for chunk in raw_lengths.chunks_exact(4) {
            let length = u32::from_le_bytes(chunk.try_into().expect("chunk is 4 bytes"));
            let length = i32::try_from(length)
                .map_err(|_| ExecutionError::ArgumentOutOfRange("argument too long".into()))?;
            arguments.push(self.mem_load(cursor, length)?);
            cursor = cursor
                .checked_add(length)
                .ok_or(ExecutionError::MemoryBoundsExceeded)?;
        }
        Ok(arguments)
    }

    fn gas_limit_from_abi(raw: i64) -> Result<u64, ExecutionError> {
        u64::try_from(raw)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative gas limit".into()))
    }

    pub(crate) fn gas(&mut self, amount: u32) -> Result<(), ExecutionError> {
        // The injected opcode counter; priced by the cost table at
        // instrumentation time, charged verbatim here.
        self.host.metering.use_gas(amount.into())
    }

    pub(crate) fn get_sc_address(&mut self, result_offset: i32) -> Result<(), ExecutionError> {
        let cost = self.schedule().env_api_cost.get_sc_address;
        self.charge(cost)?;
        let address = self.host.runtime.storage_address();
        self.mem_store(result_offset, address.as_bytes())
    }

    pub(crate) fn get_caller(&mut self, result_offset: i32) -> Result<(), ExecutionError> {
        let cost = self.schedule().env_api_cost.get_caller;
        self.charge(cost)?;
        let caller = self.host.runtime.vm_input().caller;
        self.mem_store(result_offset, caller.as_bytes())
    }

    pub(crate) fn get_call_value(&mut self, result_offset: i32) -> Result<i32, ExecutionError> {
        let cost = self.schedule().env_api_cost.get_call_value;
        self.charge(cost)?;
        let value = self.host.runtime.vm_input().call_value.clone();
        let bytes = padded_call_value(&value)?;
        self.mem_store(result_offset, &bytes)?;
        Ok(bytes.len() as i32)
    }

    pub(crate) fn get_gas_left(&mut self) -> Result<i64, ExecutionError> {
        let cost = self.schedule().env_api_cost.get_gas_left;
        self.charge(cost)?;
        Ok(self.host.metering.gas_left() as i64)
    }

    pub(crate) fn get_num_arguments(&mut self) -> Result<i32, ExecutionError> {
        let cost = self.schedule().env_api_cost.get_num_arguments;
        self.charge(cost)?;
        Ok(self.host.runtime.num_arguments())
    }

    pub(crate) fn get_argument_length(&mut self, index: i32) -> Result<i32, ExecutionError> {
        let cost = self.schedule().env_api_cost.get_argument;
        self.charge(cost)?;
        Ok(self.host.runtime.argument(index)?.len() as i32)
    }

    pub(crate) fn get_argument(
        &mut self,
        index: i32,
        result_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let argument = self.host.runtime.argument(index)?.to_vec();
        let cost = GasSchedule::dynamic_cost(
            self.schedule().env_api_cost.get_argument,
            argument.len(),
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;
        self.mem_store(result_offset, &argument)?;
        Ok(argument.len() as i32)
    }

    pub(crate) fn int64_get_argument(&mut self, index: i32) -> Result<i64, ExecutionError> {
        let cost = self.schedule().env_api_cost.get_argument;
        self.charge(cost)?;
        let argument = self.host.runtime.argument(index)?;
        int64_from_be_bytes(argument)
    }

    pub(crate) fn get_function(&mut self, result_offset: i32) -> Result<i32, ExecutionError> {
        let function = self.host.runtime.vm_input().function.clone();
        let cost = GasSchedule::dynamic_cost(
            self.schedule().env_api_cost.get_function,
            function.len(),
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;
        self.mem_store(result_offset, function.as_bytes())?;
        Ok(function.len() as i32)
    }

    pub(crate) fn storage_store(
        &mut self,
        key_offset: i32,
        data_offset: i32,
        data_length: i32,
    ) -> Result<i32, ExecutionError> {
        let length = usize::try_from(data_length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().env_api_cost.storage_store,
            length,
            self.schedule().base_operation_cost.store_per_byte,
        );
        self.charge(cost)?;

        let key = self.load_storage_key(key_offset)?;
        let value = self.mem_load(data_offset, data_length)?;
        self.set_storage(&key, &value)
    }

    /// Shared write path of the storage host functions: classify, record,
    /// and credit the release refund on clears.
    fn set_storage(&mut self, key: &[u8], value: &[u8]) -> Result<i32, ExecutionError> {
        let address = self.host.runtime.storage_address();
        let (status, previous_len) = self.host.storage.set_storage(
            self.host.blockchain.hook(),
            &address,
            key,
            value,
        )?;
        if status == StorageStatus::Deleted {
            let refund = self
                .schedule()
                .base_operation_cost
                .release_per_byte
                .saturating_mul(previous_len as u64);
            self.host.output.add_gas_refund(refund);
        }
        Ok(storage_status_code(status))
    }

    pub(crate) fn storage_load(
        &mut self,
        key_offset: i32,
        result_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let base = self.schedule().env_api_cost.storage_load;
        self.charge(base)?;
        let key = self.load_storage_key(key_offset)?;
        let address = self.host.runtime.storage_address();
        let value =
            self.host
                .storage
                .get_storage(self.host.blockchain.hook(), &address, &key)?;
        let copy_cost = self
            .schedule()
            .base_operation_cost
            .data_copy_per_byte
            .saturating_mul(value.len() as u64);
        self.charge(copy_cost)?;
        self.mem_store(result_offset, &value)?;
        Ok(value.len() as i32)
    }

    pub(crate) fn storage_load_length(&mut self, key_offset: i32) -> Result<i32, ExecutionError> {
        let cost = self.schedule().env_api_cost.storage_load;
        self.charge(cost)?;
        let key = self.load_storage_key(key_offset)?;
        let address = self.host.runtime.storage_address();
        let value =
            self.host
                .storage
                .get_storage(self.host.blockchain.hook(), &address, &key)?;
        Ok(value.len() as i32)
    }

    pub(crate) fn int64_storage_store(
        &mut self,
        key_offset: i32,
        value: i64,
    ) -> Result<i32, ExecutionError> {
        let cost = self.schedule().env_api_cost.int64_storage_store;
        self.charge(cost)?;
        let key = self.load_storage_key(key_offset)?;
        let bytes = min_be_bytes(value as u64);
        self.set_storage(&key, &bytes)
    }

    pub(crate) fn int64_storage_load(&mut self, key_offset: i32) -> Result<i64, ExecutionError> {
        let cost = self.schedule().env_api_cost.int64_storage_load;
        self.charge(cost)?;
        let key = self.load_storage_key(key_offset)?;
        let address = self.host.runtime.storage_address();
        let value =
            self.host
                .storage
                .get_storage(self.host.blockchain.hook(), &address, &key)?;
        int64_from_be_bytes(&value)
    }

    pub(crate) fn finish(&mut self, data_offset: i32, length: i32) -> Result<(), ExecutionError> {
        let size = usize::try_from(length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().env_api_cost.finish,
            size,
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;
        let data = self.mem_load(data_offset, length)?;
        self.host.output.finish(data);
        Ok(())
    }

    pub(crate) fn int64_finish(&mut self, value: i64) -> Result<(), ExecutionError> {
        let cost = self.schedule().env_api_cost.int64_finish;
        self.charge(cost)?;
        self.host.output.finish(min_be_bytes(value as u64));
        Ok(())
    }

    pub(crate) fn signal_error(
        &mut self,
        message_offset: i32,
        message_length: i32,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().env_api_cost.signal_error;
        self.charge(cost)?;
        let message = self.mem_load(message_offset, message_length)?;
        Err(ExecutionError::SignalError(
            String::from_utf8_lossy(&message).into_owned(),
        ))
    }

    pub(crate) fn write_log(
        &mut self,
        data_offset: i32,
        data_length: i32,
        topic_offset: i32,
        num_topics: i32,
    ) -> Result<(), ExecutionError> {
        let topic_count = usize::try_from(num_topics)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative topic count".into()))?;
        let data_size = usize::try_from(data_length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().env_api_cost.write_log,
            data_size + topic_count * STORAGE_KEY_LENGTH,
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;

        let mut topics = Vec::with_capacity(topic_count);
        let mut cursor = topic_offset;
        for _ in 0..topic_count {
            topics.push(self.mem_load(cursor, STORAGE_KEY_LENGTH as i32)?);
            cursor = cursor
                .checked_add(STORAGE_KEY_LENGTH as i32)
                .ok_or(ExecutionError::MemoryBoundsExceeded)?;
        }
        let data = self.mem_load(data_offset, data_length)?;
        let address = self.host.runtime.storage_address();
        self.host.output.write_log(address, topics, data);
        Ok(())
    }

    pub(crate) fn get_block_timestamp(&mut self) -> Result<i64, ExecutionError> {
        let cost = self.schedule().env_api_cost.get_block_timestamp;
        self.charge(cost)?;
        Ok(self.host.blockchain.last_time_stamp() as i64)
    }

    pub(crate) fn get_block_nonce(&mut self) -> Result<i64, ExecutionError> {
        let cost = self.schedule().env_api_cost.get_block_nonce;
        self.charge(cost)?;
        Ok(self.host.blockchain.last_nonce() as i64)
    }

    pub(crate) fn get_block_round(&mut self) -> Result<i64, ExecutionError> {
        let cost = self.schedule().env_api_cost.get_block_round;
        self.charge(cost)?;
        Ok(self.host.blockchain.last_round() as i64)
    }

    pub(crate) fn get_block_epoch(&mut self) -> Result<i64, ExecutionError> {
        let cost = self.schedule().env_api_cost.get_block_epoch;
        self.charge(cost)?;
        Ok(self.host.blockchain.current_epoch() as i64)
    }

    pub(crate) fn get_block_hash(
        &mut self,
        nonce: i64,
        result_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let cost = self.schedule().env_api_cost.get_block_hash;
        self.charge(cost)?;
        let nonce = match u64::try_from(nonce) {
            Ok(nonce) => nonce,
            Err(_) => return Ok(1),
        };
        match self.host.blockchain.get_blockhash(nonce) {
            Ok(hash) => {
                self.mem_store(result_offset, &hash)?;
                Ok(0)
            }
            Err(HookError::BlockNotFound) => Ok(1),
            Err(other) => Err(other.into()),
        }
    }

    pub(crate) fn get_external_balance(
        &mut self,
        address_offset: i32,
        result_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let cost = self.schedule().env_api_cost.get_external_balance;
        self.charge(cost)?;
        let address = self.load_address(address_offset)?;
        let balance = self.host.blockchain.get_balance(&address)?;
        let bytes = balance.to_bytes_be();
        self.mem_store(result_offset, &bytes)?;
        Ok(bytes.len() as i32)
    }

    pub(crate) fn transfer_value(
        &mut self,
        dest_offset: i32,
        value_offset: i32,
        data_offset: i32,
        length: i32,
    ) -> Result<i32, ExecutionError> {
        let size = usize::try_from(length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().env_api_cost.transfer_value,
            size,
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;

        let destination = self.load_address(dest_offset)?;
        let value = self.load_call_value(value_offset)?;
        let data = self.mem_load(data_offset, length)?;
        let sender = self.host.runtime.storage_address();

        let needed: num_bigint::BigInt = value.clone().into();
        if self.host.effective_balance(&sender)? < needed {
            return Ok(1);
        }
        self.host
            .output
            .transfer(sender, destination, value, data, CallType::DirectCall);
        Ok(0)
    }

    pub(crate) fn execute_on_dest_context(
        &mut self,
        gas_limit: i64,
        address_offset: i32,
        value_offset: i32,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        lengths_offset: i32,
        data_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let cost = self.schedule().env_api_cost.execute_on_dest_context;
        self.charge(cost)?;
        let input = self.nested_call_input(
            gas_limit,
            address_offset,
            value_offset,
            function_offset,
            function_length,
            num_arguments,
            lengths_offset,
            data_offset,
        )?;
        let code = self.host.execute_on_dest_context(input)?;
        Ok(code.as_u64() as i32)
    }

    pub(crate) fn execute_on_same_context(
        &mut self,
        gas_limit: i64,
        address_offset: i32,
        value_offset: i32,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        lengths_offset: i32,
        data_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let cost = self.schedule().env_api_cost.execute_on_same_context;
        self.charge(cost)?;
        let input = self.nested_call_input(
            gas_limit,
            address_offset,
            value_offset,
            function_offset,
            function_length,
            num_arguments,
            lengths_offset,
            data_offset,
        )?;
        let code = self.host.execute_on_same_context(input)?;
        Ok(code.as_u64() as i32)
    }

    #[allow(clippy::too_many_arguments)]
    fn nested_call_input(
        &mut self,
        gas_limit: i64,
        address_offset: i32,
        value_offset: i32,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        lengths_offset: i32,
        data_offset: i32,
    ) -> Result<ContractCallInput, ExecutionError> {
        let recipient = self.load_address(address_offset)?;
        let call_value = self.load_call_value(value_offset)?;
        let function_bytes = self.mem_load(function_offset, function_length)?;
        let function = String::from_utf8_lossy(&function_bytes).into_owned();
        let arguments = self.read_call_arguments(num_arguments, lengths_offset, data_offset)?;
        let total_len: usize = arguments.iter().map(Vec::len).sum();
        let copy_cost = self
            .schedule()
            .base_operation_cost
            .data_copy_per_byte
            .saturating_mul(total_len as u64);
        self.charge(copy_cost)?;

        Ok(ContractCallInput {
            caller: self.host.runtime.storage_address(),
            recipient,
            call_value,
            function,
            arguments,
            gas_provided: Self::gas_limit_from_abi(gas_limit)?,
            gas_price: self.host.runtime.vm_input().gas_price,
            call_type: CallType::DirectCall,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn create_contract(
        &mut self,
        gas_limit: i64,
        value_offset: i32,
        code_offset: i32,
        code_length: i32,
        metadata_offset: i32,
        result_offset: i32,
        num_arguments: i32,
        lengths_offset: i32,
        data_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let code_size = usize::try_from(code_length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative code length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().env_api_cost.create_contract,
            code_size,
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;

        let call_value = self.load_call_value(value_offset)?;
        let contract_code = self.mem_load(code_offset, code_length)?;
        let metadata_bytes = self.mem_load(metadata_offset, CodeMetadata::LENGTH as i32)?;
        let arguments = self.read_call_arguments(num_arguments, lengths_offset, data_offset)?;

        let input = ContractCreateInput {
            caller: self.host.runtime.storage_address(),
            call_value,
            contract_code,
            code_metadata: CodeMetadata::from_bytes(&metadata_bytes),
            arguments,
            gas_provided: Self::gas_limit_from_abi(gas_limit)?,
            gas_price: self.host.runtime.vm_input().gas_price,
        };
        let (code, address) = self.host.execute_create_contract(input)?;
        if let Some(address) = address {
            self.mem_store(result_offset, address.as_bytes())?;
        }
        Ok(code.as_u64() as i32)
    }

    pub(crate) fn async_call(
        &mut self,
        dest_offset: i32,
        value_offset: i32,
        data_offset: i32,
        length: i32,
    ) -> Result<(), ExecutionError> {
        let size = usize::try_from(length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().env_api_cost.async_call_step,
            size,
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;

        let destination = self.load_address(dest_offset)?;
        let value = self.load_call_value(value_offset)?;
        let data = self.mem_load(data_offset, length)?;

        let gas_to_lock = self.schedule().env_api_cost.async_callback_gas_lock;
        self.host
            .metering
            .freeze_gas(gas_to_lock)
            .map_err(|_| ExecutionError::GasLimitExceededInAsync)?;
        let gas_limit = self.host.metering.gas_left();
        self.host.runtime.set_async_call_info(crate::contexts::AsyncCallInfo {
            destination,
            value,
            data,
            gas_limit,
        });
        // Cooperative suspension: stop the instance, report success upward.
        Err(ExecutionError::AsyncCallTriggered)
    }

    pub(crate) fn sha256(
        &mut self,
        data_offset: i32,
        length: i32,
        result_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let size = usize::try_from(length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().crypto_api_cost.sha256,
            size,
            self.schedule().crypto_api_cost.hash_per_byte,
        );
        self.charge(cost)?;
        let data = self.mem_load(data_offset, length)?;
        let digest = self.host.crypto.sha256(&data);
        self.mem_store(result_offset, &digest)?;
        Ok(0)
    }

    pub(crate) fn keccak256(
        &mut self,
        data_offset: i32,
        length: i32,
        result_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let size = usize::try_from(length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().crypto_api_cost.keccak256,
            size,
            self.schedule().crypto_api_cost.hash_per_byte,
        );
        self.charge(cost)?;
        let data = self.mem_load(data_offset, length)?;
        let digest = self.host.crypto.keccak256(&data);
        self.mem_store(result_offset, &digest)?;
        Ok(0)
    }

    pub(crate) fn ripemd160(
        &mut self,
        data_offset: i32,
        length: i32,
        result_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let size = usize::try_from(length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().crypto_api_cost.ripemd160,
            size,
            self.schedule().crypto_api_cost.hash_per_byte,
        );
        self.charge(cost)?;
        let data = self.mem_load(data_offset, length)?;
        let digest = self.host.crypto.ripemd160(&data);
        self.mem_store(result_offset, &digest)?;
        Ok(0)
    }

    pub(crate) fn verify_bls(
        &mut self,
        key_offset: i32,
        message_offset: i32,
        message_length: i32,
        signature_offset: i32,
    ) -> Result<i32, ExecutionError> {
        const BLS_KEY_LENGTH: i32 = 96;
        const BLS_SIGNATURE_LENGTH: i32 = 48;
        let size = usize::try_from(message_length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative message length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().crypto_api_cost.verify_bls,
            size,
            self.schedule().crypto_api_cost.verify_per_byte,
        );
        self.charge(cost)?;
        let key = self.mem_load(key_offset, BLS_KEY_LENGTH)?;
        let message = self.mem_load(message_offset, message_length)?;
        let signature = self.mem_load(signature_offset, BLS_SIGNATURE_LENGTH)?;
        Ok(verification_code(
            self.host.crypto.verify_bls(&key, &message, &signature),
        ))
    }

    pub(crate) fn verify_ed25519(
        &mut self,
        key_offset: i32,
        message_offset: i32,
        message_length: i32,
        signature_offset: i32,
    ) -> Result<i32, ExecutionError> {
        const ED25519_KEY_LENGTH: i32 = 32;
        const ED25519_SIGNATURE_LENGTH: i32 = 64;
        let size = usize::try_from(message_length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative message length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().crypto_api_cost.verify_ed25519,
            size,
            self.schedule().crypto_api_cost.verify_per_byte,
        );
        self.charge(cost)?;
        let key = self.mem_load(key_offset, ED25519_KEY_LENGTH)?;
        let message = self.mem_load(message_offset, message_length)?;
        let signature = self.mem_load(signature_offset, ED25519_SIGNATURE_LENGTH)?;
        Ok(verification_code(
            self.host.crypto.verify_ed25519(&key, &message, &signature),
        ))
    }

    pub(crate) fn verify_secp256k1(
        &mut self,
        key_offset: i32,
        key_length: i32,
        message_offset: i32,
        message_length: i32,
        signature_offset: i32,
    ) -> Result<i32, ExecutionError> {
        const SECP256K1_SIGNATURE_LENGTH: i32 = 64;
        let size = usize::try_from(message_length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative message length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().crypto_api_cost.verify_secp256k1,
            size,
            self.schedule().crypto_api_cost.verify_per_byte,
        );
        self.charge(cost)?;
        let key = self.mem_load(key_offset, key_length)?;
        let message = self.mem_load(message_offset, message_length)?;
        let signature = self.mem_load(signature_offset, SECP256K1_SIGNATURE_LENGTH)?;
        Ok(verification_code(self.host.crypto.verify_secp256k1(
            &key, &message, &signature,
        )))
    }
}

/// 0 on success, 1 on any verification or input failure.
fn verification_code(result: Result<(), vela_types::CryptoError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn storage_status_code(status: StorageStatus) -> i32 {
    match status {
        StorageStatus::Unchanged => 0,
        StorageStatus::Added => 1,
        StorageStatus::Modified => 2,
        StorageStatus::Deleted => 3,
    }
}

/// The call value padded to its fixed 32-byte big-endian ABI form.
fn padded_call_value(value: &BigUint) -> Result<Vec<u8>, ExecutionError> {
    let bytes = value.to_bytes_be();
    if bytes.len() > CALL_VALUE_LENGTH {
        return Err(ExecutionError::ArgumentOutOfRange(
            "call value exceeds 32 bytes".into(),
        ));
    }
    let mut padded = vec![0u8; CALL_VALUE_LENGTH - bytes.len()];
    padded.extend_from_slice(&bytes);
    Ok(padded)
}

/// Interprets up to eight big-endian bytes as an integer.
fn int64_from_be_bytes(bytes: &[u8]) -> Result<i64, ExecutionError> {
    if bytes.len() > 8 {
        return Err(ExecutionError::ArgumentOutOfRange(
            "value does not fit in 64 bits".into(),
        ));
    }
    let mut buffer = [0u8; 8];
    buffer[8 - bytes.len()..].copy_from_slice(bytes);
    Ok(u64::from_be_bytes(buffer) as i64)
}

/// Minimal big-endian rendering; zero becomes the empty string.
fn min_be_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first_nonzero = bytes.iter().position(|byte| *byte != 0);
    match first_nonzero {
        Some(index) => bytes[index..].to_vec(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_minimal_be_bytes() {
        assert_eq!(min_be_bytes(0), Vec::<u8>::new());
        assert_eq!(min_be_bytes(42), vec![42]);
        assert_eq!(min_be_bytes(0x0102), vec![1, 2]);
    }

    #[test]
    fn should_parse_int64_from_be_bytes() {
        assert_eq!(int64_from_be_bytes(&[]).unwrap(), 0);
        assert_eq!(int64_from_be_bytes(&[42]).unwrap(), 42);
        assert_eq!(int64_from_be_bytes(&[1, 0]).unwrap(), 256);
        assert!(int64_from_be_bytes(&[0; 9]).is_err());
    }

    #[test]
    fn should_pad_call_value_to_abi_width() {
        let padded = padded_call_value(&BigUint::from(99u32)).unwrap();
        assert_eq!(padded.len(), CALL_VALUE_LENGTH);
        assert_eq!(padded[CALL_VALUE_LENGTH - 1], 99);
    }
}
