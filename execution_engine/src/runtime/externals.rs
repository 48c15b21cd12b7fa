//! Dispatch of host calls from the interpreter into the [`Runtime`].
use std::convert::TryFrom;

use wasmi::{Externals, RuntimeArgs, RuntimeValue, Trap};

use vela_types::{BlockchainHook, CryptoHook};

use super::{args::Args, Runtime};
use crate::resolvers::function_index::FunctionIndex;

impl<'a, B, C> Externals for Runtime<'a, B, C>
where
    B: BlockchainHook,
    C: CryptoHook,
{
    fn invoke_index(
        &mut self,
        index: usize,
        args: RuntimeArgs,
    ) -> Result<Option<RuntimeValue>, Trap> {
        let func = FunctionIndex::try_from(index).expect("unknown function index");

        match func {
            FunctionIndex::GasFuncIndex => {
                let (amount,): (u32,) = Args::parse(args)?;
                self.gas(amount)?;
                Ok(None)
            }

            FunctionIndex::GetScAddressFuncIndex => {
                let (result_offset,) = Args::parse(args)?;
                self.get_sc_address(result_offset)?;
                Ok(None)
            }

            FunctionIndex::GetCallerFuncIndex => {
                let (result_offset,) = Args::parse(args)?;
                self.get_caller(result_offset)?;
                Ok(None)
            }

            FunctionIndex::GetCallValueFuncIndex => {
                let (result_offset,) = Args::parse(args)?;
                let length = self.get_call_value(result_offset)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::GetGasLeftFuncIndex => {
                let gas_left = self.get_gas_left()?;
                Ok(Some(RuntimeValue::I64(gas_left)))
            }

            FunctionIndex::GetNumArgumentsFuncIndex => {
                let count = self.get_num_arguments()?;
                Ok(Some(RuntimeValue::I32(count)))
            }

            FunctionIndex::GetArgumentLengthFuncIndex => {
                let (index,) = Args::parse(args)?;
                let length = self.get_argument_length(index)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::GetArgumentFuncIndex => {
                let (index, result_offset) = Args::parse(args)?;
                let length = self.get_argument(index, result_offset)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::Int64GetArgumentFuncIndex => {
                let (index,) = Args::parse(args)?;
                let value = self.int64_get_argument(index)?;
                Ok(Some(RuntimeValue::I64(value)))
            }

            FunctionIndex::GetFunctionFuncIndex => {
                let (result_offset,) = Args::parse(args)?;
                let length = self.get_function(result_offset)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::StorageStoreFuncIndex => {
                let (key_offset, data_offset, data_length) = Args::parse(args)?;
                let status = self.storage_store(key_offset, data_offset, data_length)?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::StorageLoadFuncIndex => {
                let (key_offset, result_offset) = Args::parse(args)?;
                let length = self.storage_load(key_offset, result_offset)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::StorageLoadLengthFuncIndex => {
                let (key_offset,) = Args::parse(args)?;
                let length = self.storage_load_length(key_offset)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::Int64StorageStoreFuncIndex => {
                let (key_offset, value): (i32, i64) = Args::parse(args)?;
                let status = self.int64_storage_store(key_offset, value)?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::Int64StorageLoadFuncIndex => {
                let (key_offset,) = Args::parse(args)?;
                let value = self.int64_storage_load(key_offset)?;
                Ok(Some(RuntimeValue::I64(value)))
            }

            FunctionIndex::FinishFuncIndex => {
                let (data_offset, length) = Args::parse(args)?;
                self.finish(data_offset, length)?;
                Ok(None)
            }

            FunctionIndex::Int64FinishFuncIndex => {
                let (value,): (i64,) = Args::parse(args)?;
                self.int64_finish(value)?;
                Ok(None)
            }

            FunctionIndex::SignalErrorFuncIndex => {
                let (message_offset, message_length) = Args::parse(args)?;
                self.signal_error(message_offset, message_length)?;
                Ok(None)
            }

            FunctionIndex::WriteLogFuncIndex => {
                let (data_offset, data_length, topic_offset, num_topics) = Args::parse(args)?;
                self.write_log(data_offset, data_length, topic_offset, num_topics)?;
                Ok(None)
            }

            FunctionIndex::GetBlockTimestampFuncIndex => {
                let timestamp = self.get_block_timestamp()?;
                Ok(Some(RuntimeValue::I64(timestamp)))
            }

            FunctionIndex::GetBlockNonceFuncIndex => {
                let nonce = self.get_block_nonce()?;
                Ok(Some(RuntimeValue::I64(nonce)))
            }

            FunctionIndex::GetBlockRoundFuncIndex => {
                let round = self.get_block_round()?;
                Ok(Some(RuntimeValue::I64(round)))
            }

            FunctionIndex::GetBlockEpochFuncIndex => {
                let epoch = self.get_block_epoch()?;
                Ok(Some(RuntimeValue::I64(epoch)))
            }

            FunctionIndex::GetBlockHashFuncIndex => {
                let (nonce, result_offset): (i64, i32) = Args::parse(args)?;
                let status = self.get_block_hash(nonce, result_offset)?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::GetExternalBalanceFuncIndex => {
                let (address_offset, result_offset) = Args::parse(args)?;
                let length = self.get_external_balance(address_offset, result_offset)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::TransferValueFuncIndex => {
                let (dest_offset, value_offset, data_offset, length) = Args::parse(args)?;
                let status = self.transfer_value(dest_offset, value_offset, data_offset, length)?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::ExecuteOnDestContextFuncIndex => {
                let (
                    gas_limit,
                    address_offset,
                    value_offset,
                    function_offset,
                    function_length,
                    num_arguments,
                    lengths_offset,
                    data_offset,
                ): (i64, i32, i32, i32, i32, i32, i32, i32) = Args::parse(args)?;
                let code = self.execute_on_dest_context(
                    gas_limit,
                    address_offset,
                    value_offset,
                    function_offset,
                    function_length,
                    num_arguments,
                    lengths_offset,
                    data_offset,
                )?;
                Ok(Some(RuntimeValue::I32(code)))
            }

            FunctionIndex::ExecuteOnSameContextFuncIndex => {
                let (
                    gas_limit,
                    address_offset,
                    value_offset,
                    function_offset,
                    function_length,
                    num_arguments,
                    lengths_offset,
                    data_offset,
                ): (i64, i32, i32, i32, i32, i32, i32, i32) = Args::parse(args)?;
                let code = self.execute_on_same_context(
                    gas_limit,
                    address_offset,
                    value_offset,
                    function_offset,
                    function_length,
                    num_arguments,
                    lengths_offset,
                    data_offset,
                )?;
                Ok(Some(RuntimeValue::I32(code)))
            }

            FunctionIndex::CreateContractFuncIndex => {
                let (
                    gas_limit,
                    value_offset,
                    code_offset,
                    code_length,
                    metadata_offset,
                    result_offset,
                    num_arguments,
                    lengths_offset,
                    data_offset,
                ): (i64, i32, i32, i32, i32, i32, i32, i32, i32) = Args::parse(args)?;
                let code = self.create_contract(
                    gas_limit,
                    value_offset,
                    code_offset,
                    code_length,
                    metadata_offset,
                    result_offset,
                    num_arguments,
                    lengths_offset,
                    data_offset,
                )?;
                Ok(Some(RuntimeValue::I32(code)))
            }

            FunctionIndex::AsyncCallFuncIndex => {
                let (dest_offset, value_offset, data_offset, length) = Args::parse(args)?;
                self.async_call(dest_offset, value_offset, data_offset, length)?;
                Ok(None)
            }

            FunctionIndex::BigIntNewFuncIndex => {
                let (initial,): (i64,) = Args::parse(args)?;
                let handle = self.big_int_new(initial)?;
                Ok(Some(RuntimeValue::I32(handle)))
            }

            FunctionIndex::BigIntUnsignedByteLengthFuncIndex => {
                let (handle,) = Args::parse(args)?;
                let length = self.big_int_unsigned_byte_length(handle)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::BigIntSignedByteLengthFuncIndex => {
                let (handle,) = Args::parse(args)?;
                let length = self.big_int_signed_byte_length(handle)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::BigIntGetUnsignedBytesFuncIndex => {
                let (handle, result_offset) = Args::parse(args)?;
                let length = self.big_int_get_unsigned_bytes(handle, result_offset)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::BigIntGetSignedBytesFuncIndex => {
                let (handle, result_offset) = Args::parse(args)?;
                let length = self.big_int_get_signed_bytes(handle, result_offset)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::BigIntSetUnsignedBytesFuncIndex => {
                let (handle, data_offset, length) = Args::parse(args)?;
                self.big_int_set_unsigned_bytes(handle, data_offset, length)?;
                Ok(None)
            }

            FunctionIndex::BigIntSetSignedBytesFuncIndex => {
                let (handle, data_offset, length) = Args::parse(args)?;
                self.big_int_set_signed_bytes(handle, data_offset, length)?;
                Ok(None)
            }

            FunctionIndex::BigIntIsInt64FuncIndex => {
                let (handle,) = Args::parse(args)?;
                let fits = self.big_int_is_int64(handle)?;
                Ok(Some(RuntimeValue::I32(fits)))
            }

            FunctionIndex::BigIntGetInt64FuncIndex => {
                let (handle,) = Args::parse(args)?;
                let value = self.big_int_get_int64(handle)?;
                Ok(Some(RuntimeValue::I64(value)))
            }

            FunctionIndex::BigIntSetInt64FuncIndex => {
                let (handle, value): (i32, i64) = Args::parse(args)?;
                self.big_int_set_int64(handle, value)?;
                Ok(None)
            }

            FunctionIndex::BigIntAddFuncIndex => {
                let (dest, op1, op2) = Args::parse(args)?;
                self.big_int_add(dest, op1, op2)?;
                Ok(None)
            }

            FunctionIndex::BigIntSubFuncIndex => {
                let (dest, op1, op2) = Args::parse(args)?;
                self.big_int_sub(dest, op1, op2)?;
                Ok(None)
            }

            FunctionIndex::BigIntMulFuncIndex => {
                let (dest, op1, op2) = Args::parse(args)?;
                self.big_int_mul(dest, op1, op2)?;
                Ok(None)
            }

            FunctionIndex::BigIntTDivFuncIndex => {
                let (dest, op1, op2) = Args::parse(args)?;
                self.big_int_t_div(dest, op1, op2)?;
                Ok(None)
            }

            FunctionIndex::BigIntTModFuncIndex => {
                let (dest, op1, op2) = Args::parse(args)?;
                self.big_int_t_mod(dest, op1, op2)?;
                Ok(None)
            }

            FunctionIndex::BigIntPowFuncIndex => {
                let (dest, op1, op2) = Args::parse(args)?;
                self.big_int_pow(dest, op1, op2)?;
                Ok(None)
            }

            FunctionIndex::BigIntShlFuncIndex => {
                let (dest, op, bits) = Args::parse(args)?;
                self.big_int_shl(dest, op, bits)?;
                Ok(None)
            }

            FunctionIndex::BigIntShrFuncIndex => {
                let (dest, op, bits) = Args::parse(args)?;
                self.big_int_shr(dest, op, bits)?;
                Ok(None)
            }

            FunctionIndex::BigIntAbsFuncIndex => {
                let (dest, op) = Args::parse(args)?;
                self.big_int_abs(dest, op)?;
                Ok(None)
            }

            FunctionIndex::BigIntNegFuncIndex => {
                let (dest, op) = Args::parse(args)?;
                self.big_int_neg(dest, op)?;
                Ok(None)
            }

            FunctionIndex::BigIntSignFuncIndex => {
                let (op,) = Args::parse(args)?;
                let sign = self.big_int_sign(op)?;
                Ok(Some(RuntimeValue::I32(sign)))
            }

            FunctionIndex::BigIntCmpFuncIndex => {
                let (op1, op2) = Args::parse(args)?;
                let ordering = self.big_int_cmp(op1, op2)?;
                Ok(Some(RuntimeValue::I32(ordering)))
            }

            FunctionIndex::BigIntFinishUnsignedFuncIndex => {
                let (handle,) = Args::parse(args)?;
                self.big_int_finish_unsigned(handle)?;
                Ok(None)
            }

            FunctionIndex::BigIntFinishSignedFuncIndex => {
                let (handle,) = Args::parse(args)?;
                self.big_int_finish_signed(handle)?;
                Ok(None)
            }

            FunctionIndex::BigIntStorageStoreUnsignedFuncIndex => {
                let (key_offset, handle) = Args::parse(args)?;
                let status = self.big_int_storage_store_unsigned(key_offset, handle)?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::BigIntStorageLoadUnsignedFuncIndex => {
                let (key_offset, handle) = Args::parse(args)?;
                let length = self.big_int_storage_load_unsigned(key_offset, handle)?;
                Ok(Some(RuntimeValue::I32(length)))
            }

            FunctionIndex::BigIntGetUnsignedArgumentFuncIndex => {
                let (index, handle) = Args::parse(args)?;
                self.big_int_get_unsigned_argument(index, handle)?;
                Ok(None)
            }

            FunctionIndex::BigIntGetSignedArgumentFuncIndex => {
                let (index, handle) = Args::parse(args)?;
                self.big_int_get_signed_argument(index, handle)?;
                Ok(None)
            }

            FunctionIndex::BigIntGetCallValueFuncIndex => {
                let (handle,) = Args::parse(args)?;
                self.big_int_get_call_value(handle)?;
                Ok(None)
            }

            FunctionIndex::BigIntGetExternalBalanceFuncIndex => {
                let (address_offset, handle) = Args::parse(args)?;
                self.big_int_get_external_balance(address_offset, handle)?;
                Ok(None)
            }

            FunctionIndex::Sha256FuncIndex => {
                let (data_offset, length, result_offset) = Args::parse(args)?;
                let status = self.sha256(data_offset, length, result_offset)?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::Keccak256FuncIndex => {
                let (data_offset, length, result_offset) = Args::parse(args)?;
                let status = self.keccak256(data_offset, length, result_offset)?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::Ripemd160FuncIndex => {
                let (data_offset, length, result_offset) = Args::parse(args)?;
                let status = self.ripemd160(data_offset, length, result_offset)?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::VerifyBlsFuncIndex => {
                let (key_offset, message_offset, message_length, signature_offset) =
                    Args::parse(args)?;
                let status =
                    self.verify_bls(key_offset, message_offset, message_length, signature_offset)?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::VerifyEd25519FuncIndex => {
                let (key_offset, message_offset, message_length, signature_offset) =
                    Args::parse(args)?;
                let status = self.verify_ed25519(
                    key_offset,
                    message_offset,
                    message_length,
                    signature_offset,
                )?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::VerifySecp256k1FuncIndex => {
                let (key_offset, key_length, message_offset, message_length, signature_offset) =
                    Args::parse(args)?;
                let status = self.verify_secp256k1(
                    key_offset,
                    key_length,
                    message_offset,
                    message_length,
                    signature_offset,
                )?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::EthUseGasFuncIndex => {
                let (amount,): (i64,) = Args::parse(args)?;
                self.eth_use_gas(amount)?;
                Ok(None)
            }

            FunctionIndex::EthGetAddressFuncIndex => {
                let (result_offset,) = Args::parse(args)?;
                self.eth_get_address(result_offset)?;
                Ok(None)
            }

            FunctionIndex::EthGetExternalBalanceFuncIndex => {
                let (address_offset, result_offset) = Args::parse(args)?;
                self.eth_get_external_balance(address_offset, result_offset)?;
                Ok(None)
            }

            FunctionIndex::EthGetBlockHashFuncIndex => {
                let (number, result_offset): (i64, i32) = Args::parse(args)?;
                let status = self.eth_get_block_hash(number, result_offset)?;
                Ok(Some(RuntimeValue::I32(status)))
            }

            FunctionIndex::EthGetCallDataSizeFuncIndex => {
                let size = self.eth_get_call_data_size()?;
                Ok(Some(RuntimeValue::I32(size)))
            }

            FunctionIndex::EthCallDataCopyFuncIndex => {
                let (result_offset, data_offset, length) = Args::parse(args)?;
                self.eth_call_data_copy(result_offset, data_offset, length)?;
                Ok(None)
            }

            FunctionIndex::EthGetCallerFuncIndex => {
                let (result_offset,) = Args::parse(args)?;
                self.eth_get_caller(result_offset)?;
                Ok(None)
            }

            FunctionIndex::EthGetCallValueFuncIndex => {
                let (result_offset,) = Args::parse(args)?;
                self.eth_get_call_value(result_offset)?;
                Ok(None)
            }

            FunctionIndex::EthStorageStoreFuncIndex => {
                let (key_offset, value_offset) = Args::parse(args)?;
                self.eth_storage_store(key_offset, value_offset)?;
                Ok(None)
            }

            FunctionIndex::EthStorageLoadFuncIndex => {
                let (key_offset, result_offset) = Args::parse(args)?;
                self.eth_storage_load(key_offset, result_offset)?;
                Ok(None)
            }

            FunctionIndex::EthGetGasLeftFuncIndex => {
                let gas_left = self.eth_get_gas_left()?;
                Ok(Some(RuntimeValue::I64(gas_left)))
            }

            FunctionIndex::EthGetBlockTimestampFuncIndex => {
                let timestamp = self.eth_get_block_timestamp()?;
                Ok(Some(RuntimeValue::I64(timestamp)))
            }

            FunctionIndex::EthGetBlockNumberFuncIndex => {
                let number = self.eth_get_block_number()?;
                Ok(Some(RuntimeValue::I64(number)))
            }

            FunctionIndex::EthGetBlockGasLimitFuncIndex => {
                let limit = self.eth_get_block_gas_limit()?;
                Ok(Some(RuntimeValue::I64(limit)))
            }

            FunctionIndex::EthGetTxOriginFuncIndex => {
                let (result_offset,) = Args::parse(args)?;
                self.eth_get_tx_origin(result_offset)?;
                Ok(None)
            }

            FunctionIndex::EthFinishFuncIndex => {
                let (data_offset, length) = Args::parse(args)?;
                self.eth_finish(data_offset, length)?;
                Ok(None)
            }

            FunctionIndex::EthRevertFuncIndex => {
                let (data_offset, length) = Args::parse(args)?;
                self.eth_revert(data_offset, length)?;
                Ok(None)
            }
        }
    }
}
