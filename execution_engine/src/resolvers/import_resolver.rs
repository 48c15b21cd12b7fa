//! Name-to-index resolution of the host-function table.
//!
//! Contracts import the environment, big-int and crypto groups from the
//! `"env"` module and the Ethereum-compatibility group from `"ethereum"`.
//! Memory is always imported from `"env"."memory"` (the preprocessor
//! externalizes it), so the host controls allocation and page limits.

use std::cell::RefCell;

use wasmi::{
    memory_units::Pages, Error as InterpreterError, FuncInstance, FuncRef, MemoryDescriptor,
    MemoryInstance, MemoryRef, ModuleImportResolver, Signature, ValueType,
};

use super::{error::ResolverError, function_index::FunctionIndex, memory_resolver::MemoryResolver};

pub(crate) struct RuntimeModuleImportResolver {
    memory: RefCell<Option<MemoryRef>>,
    max_memory: u32,
}

impl RuntimeModuleImportResolver {
    pub(crate) fn new(max_memory: u32) -> Self {
        Self {
            memory: RefCell::new(None),
            max_memory,
        }
    }
}

impl MemoryResolver for RuntimeModuleImportResolver {
    fn memory_ref(&self) -> Result<MemoryRef, ResolverError> {
        self.memory
            .borrow()
            .as_ref()
            .map(Clone::clone)
            .ok_or(ResolverError::NoImportedMemory)
    }
}

impl ModuleImportResolver for RuntimeModuleImportResolver {
    fn resolve_func(
        &self,
        field_name: &str,
        _signature: &Signature,
    ) -> Result<FuncRef, InterpreterError> {
        let func_ref = match field_name {
            "gas" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], None),
                FunctionIndex::GasFuncIndex.into(),
            ),
            "getSCAddress" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], None),
                FunctionIndex::GetScAddressFuncIndex.into(),
            ),
            "getCaller" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], None),
                FunctionIndex::GetCallerFuncIndex.into(),
            ),
            "getCallValue" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], Some(ValueType::I32)),
                FunctionIndex::GetCallValueFuncIndex.into(),
            ),
            "getGasLeft" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 0][..], Some(ValueType::I64)),
                FunctionIndex::GetGasLeftFuncIndex.into(),
            ),
            "getNumArguments" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 0][..], Some(ValueType::I32)),
                FunctionIndex::GetNumArgumentsFuncIndex.into(),
            ),
            "getArgumentLength" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], Some(ValueType::I32)),
                FunctionIndex::GetArgumentLengthFuncIndex.into(),
            ),
            "getArgument" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], Some(ValueType::I32)),
                FunctionIndex::GetArgumentFuncIndex.into(),
            ),
            "int64getArgument" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], Some(ValueType::I64)),
                FunctionIndex::Int64GetArgumentFuncIndex.into(),
            ),
            "getFunction" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], Some(ValueType::I32)),
                FunctionIndex::GetFunctionFuncIndex.into(),
            ),
            "storageStore" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], Some(ValueType::I32)),
                FunctionIndex::StorageStoreFuncIndex.into(),
            ),
            "storageLoad" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], Some(ValueType::I32)),
                FunctionIndex::StorageLoadFuncIndex.into(),
            ),
            "storageLoadLength" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], Some(ValueType::I32)),
                FunctionIndex::StorageLoadLengthFuncIndex.into(),
            ),
            "int64storageStore" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32, ValueType::I64][..], Some(ValueType::I32)),
                FunctionIndex::Int64StorageStoreFuncIndex.into(),
            ),
            "int64storageLoad" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], Some(ValueType::I64)),
                FunctionIndex::Int64StorageLoadFuncIndex.into(),
            ),
            "finish" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::FinishFuncIndex.into(),
            ),
            "int64finish" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I64; 1][..], None),
                FunctionIndex::Int64FinishFuncIndex.into(),
            ),
            "signalError" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::SignalErrorFuncIndex.into(),
            ),
            "writeLog" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 4][..], None),
                FunctionIndex::WriteLogFuncIndex.into(),
            ),
            "getBlockTimestamp" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 0][..], Some(ValueType::I64)),
                FunctionIndex::GetBlockTimestampFuncIndex.into(),
            ),
            "getBlockNonce" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 0][..], Some(ValueType::I64)),
                FunctionIndex::GetBlockNonceFuncIndex.into(),
            ),
            "getBlockRound" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 0][..], Some(ValueType::I64)),
                FunctionIndex::GetBlockRoundFuncIndex.into(),
            ),
            "getBlockEpoch" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 0][..], Some(ValueType::I64)),
                FunctionIndex::GetBlockEpochFuncIndex.into(),
            ),
            "getBlockHash" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I64, ValueType::I32][..], Some(ValueType::I32)),
                FunctionIndex::GetBlockHashFuncIndex.into(),
            ),
            "getExternalBalance" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], Some(ValueType::I32)),
                FunctionIndex::GetExternalBalanceFuncIndex.into(),
            ),
            "transferValue" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 4][..], Some(ValueType::I32)),
                FunctionIndex::TransferValueFuncIndex.into(),
            ),
            "executeOnDestContext" => FuncInstance::alloc_host(
                Signature::new(
                    &[
                        ValueType::I64,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                    ][..],
                    Some(ValueType::I32),
                ),
                FunctionIndex::ExecuteOnDestContextFuncIndex.into(),
            ),
            "executeOnSameContext" => FuncInstance::alloc_host(
                Signature::new(
                    &[
                        ValueType::I64,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                    ][..],
                    Some(ValueType::I32),
                ),
                FunctionIndex::ExecuteOnSameContextFuncIndex.into(),
            ),
            "createContract" => FuncInstance::alloc_host(
                Signature::new(
                    &[
                        ValueType::I64,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                        ValueType::I32,
                    ][..],
                    Some(ValueType::I32),
                ),
                FunctionIndex::CreateContractFuncIndex.into(),
            ),
            "asyncCall" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 4][..], None),
                FunctionIndex::AsyncCallFuncIndex.into(),
            ),
            "bigIntNew" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I64; 1][..], Some(ValueType::I32)),
                FunctionIndex::BigIntNewFuncIndex.into(),
            ),
            "bigIntUnsignedByteLength" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], Some(ValueType::I32)),
                FunctionIndex::BigIntUnsignedByteLengthFuncIndex.into(),
            ),
            "bigIntSignedByteLength" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], Some(ValueType::I32)),
                FunctionIndex::BigIntSignedByteLengthFuncIndex.into(),
            ),
            "bigIntGetUnsignedBytes" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], Some(ValueType::I32)),
                FunctionIndex::BigIntGetUnsignedBytesFuncIndex.into(),
            ),
            "bigIntGetSignedBytes" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], Some(ValueType::I32)),
                FunctionIndex::BigIntGetSignedBytesFuncIndex.into(),
            ),
            "bigIntSetUnsignedBytes" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], None),
                FunctionIndex::BigIntSetUnsignedBytesFuncIndex.into(),
            ),
            "bigIntSetSignedBytes" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], None),
                FunctionIndex::BigIntSetSignedBytesFuncIndex.into(),
            ),
            "bigIntIsInt64" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], Some(ValueType::I32)),
                FunctionIndex::BigIntIsInt64FuncIndex.into(),
            ),
            "bigIntGetInt64" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], Some(ValueType::I64)),
                FunctionIndex::BigIntGetInt64FuncIndex.into(),
            ),
            "bigIntSetInt64" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32, ValueType::I64][..], None),
                FunctionIndex::BigIntSetInt64FuncIndex.into(),
            ),
            "bigIntAdd" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], None),
                FunctionIndex::BigIntAddFuncIndex.into(),
            ),
            "bigIntSub" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], None),
                FunctionIndex::BigIntSubFuncIndex.into(),
            ),
            "bigIntMul" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], None),
                FunctionIndex::BigIntMulFuncIndex.into(),
            ),
            "bigIntTDiv" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], None),
                FunctionIndex::BigIntTDivFuncIndex.into(),
            ),
            "bigIntTMod" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], None),
                FunctionIndex::BigIntTModFuncIndex.into(),
            ),
            "bigIntPow" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], None),
                FunctionIndex::BigIntPowFuncIndex.into(),
            ),
            "bigIntShl" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], None),
                FunctionIndex::BigIntShlFuncIndex.into(),
            ),
            "bigIntShr" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], None),
                FunctionIndex::BigIntShrFuncIndex.into(),
            ),
            "bigIntAbs" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::BigIntAbsFuncIndex.into(),
            ),
            "bigIntNeg" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::BigIntNegFuncIndex.into(),
            ),
            "bigIntSign" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], Some(ValueType::I32)),
                FunctionIndex::BigIntSignFuncIndex.into(),
            ),
            "bigIntCmp" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], Some(ValueType::I32)),
                FunctionIndex::BigIntCmpFuncIndex.into(),
            ),
            "bigIntFinishUnsigned" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], None),
                FunctionIndex::BigIntFinishUnsignedFuncIndex.into(),
            ),
            "bigIntFinishSigned" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], None),
                FunctionIndex::BigIntFinishSignedFuncIndex.into(),
            ),
            "bigIntStorageStoreUnsigned" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], Some(ValueType::I32)),
                FunctionIndex::BigIntStorageStoreUnsignedFuncIndex.into(),
            ),
            "bigIntStorageLoadUnsigned" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], Some(ValueType::I32)),
                FunctionIndex::BigIntStorageLoadUnsignedFuncIndex.into(),
            ),
            "bigIntGetUnsignedArgument" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::BigIntGetUnsignedArgumentFuncIndex.into(),
            ),
            "bigIntGetSignedArgument" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::BigIntGetSignedArgumentFuncIndex.into(),
            ),
            "bigIntGetCallValue" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], None),
                FunctionIndex::BigIntGetCallValueFuncIndex.into(),
            ),
            "bigIntGetExternalBalance" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::BigIntGetExternalBalanceFuncIndex.into(),
            ),
            "sha256" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], Some(ValueType::I32)),
                FunctionIndex::Sha256FuncIndex.into(),
            ),
            "keccak256" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], Some(ValueType::I32)),
                FunctionIndex::Keccak256FuncIndex.into(),
            ),
            "ripemd160" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], Some(ValueType::I32)),
                FunctionIndex::Ripemd160FuncIndex.into(),
            ),
            "verifyBLS" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 4][..], Some(ValueType::I32)),
                FunctionIndex::VerifyBlsFuncIndex.into(),
            ),
            "verifyEd25519" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 4][..], Some(ValueType::I32)),
                FunctionIndex::VerifyEd25519FuncIndex.into(),
            ),
            "verifySecp256k1" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 5][..], Some(ValueType::I32)),
                FunctionIndex::VerifySecp256k1FuncIndex.into(),
            ),
            _ => {
                return Err(InterpreterError::Function(format!(
                    "host module doesn't export function with name {}",
                    field_name
                )));
            }
        };
        Ok(func_ref)
    }

    fn resolve_memory(
        &self,
        field_name: &str,
        descriptor: &MemoryDescriptor,
    ) -> Result<MemoryRef, InterpreterError> {
        if field_name == "memory" {
            match &mut *self.memory.borrow_mut() {
                Some(_) => {
                    // Even though most wat -> wasm compilers don't allow multiple memory entries,
                    // we should make sure we won't accidentally allocate twice.
                    Err(InterpreterError::Instantiation(
                        "Memory is already instantiated".into(),
                    ))
                }
                memory_ref @ None => {
                    // Any memory entry in the wasm file without max specified is changed into an
                    // entry with hardcoded max value. This way `maximum` below is never
                    // unspecified, but for safety reasons we'll still default it.
                    let descriptor_max = descriptor.maximum().unwrap_or(self.max_memory);
                    // Checks if wasm's memory entry has too much initial memory or non-default max
                    // memory pages exceeds the limit.
                    if descriptor.initial() > descriptor_max || descriptor_max > self.max_memory {
                        return Err(InterpreterError::Instantiation(
                            "Module requested too much memory".into(),
                        ));
                    }
                    // Note: each "page" is 64 KiB
                    let mem = MemoryInstance::alloc(
                        Pages(descriptor.initial() as usize),
                        descriptor.maximum().map(|x| Pages(x as usize)),
                    )?;
                    *memory_ref = Some(mem.clone());
                    Ok(mem)
                }
            }
        } else {
            Err(InterpreterError::Instantiation(
                "Memory imported under unknown name".to_owned(),
            ))
        }
    }
}

/// Resolver for the `"ethereum"` import module, the EVM-compatibility
/// subset.
pub(crate) struct EthereumModuleImportResolver;

impl ModuleImportResolver for EthereumModuleImportResolver {
    fn resolve_func(
        &self,
        field_name: &str,
        _signature: &Signature,
    ) -> Result<FuncRef, InterpreterError> {
        let func_ref = match field_name {
            "useGas" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I64; 1][..], None),
                FunctionIndex::EthUseGasFuncIndex.into(),
            ),
            "getAddress" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], None),
                FunctionIndex::EthGetAddressFuncIndex.into(),
            ),
            "getExternalBalance" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::EthGetExternalBalanceFuncIndex.into(),
            ),
            "getBlockHash" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I64, ValueType::I32][..], Some(ValueType::I32)),
                FunctionIndex::EthGetBlockHashFuncIndex.into(),
            ),
            "getCallDataSize" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 0][..], Some(ValueType::I32)),
                FunctionIndex::EthGetCallDataSizeFuncIndex.into(),
            ),
            "callDataCopy" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 3][..], None),
                FunctionIndex::EthCallDataCopyFuncIndex.into(),
            ),
            "getCaller" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], None),
                FunctionIndex::EthGetCallerFuncIndex.into(),
            ),
            "getCallValue" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], None),
                FunctionIndex::EthGetCallValueFuncIndex.into(),
            ),
            "storageStore" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::EthStorageStoreFuncIndex.into(),
            ),
            "storageLoad" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::EthStorageLoadFuncIndex.into(),
            ),
            "getGasLeft" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 0][..], Some(ValueType::I64)),
                FunctionIndex::EthGetGasLeftFuncIndex.into(),
            ),
            "getBlockTimestamp" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 0][..], Some(ValueType::I64)),
                FunctionIndex::EthGetBlockTimestampFuncIndex.into(),
            ),
            "getBlockNumber" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 0][..], Some(ValueType::I64)),
                FunctionIndex::EthGetBlockNumberFuncIndex.into(),
            ),
            "getBlockGasLimit" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 0][..], Some(ValueType::I64)),
                FunctionIndex::EthGetBlockGasLimitFuncIndex.into(),
            ),
            "getTxOrigin" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 1][..], None),
                FunctionIndex::EthGetTxOriginFuncIndex.into(),
            ),
            "finish" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::EthFinishFuncIndex.into(),
            ),
            "revert" => FuncInstance::alloc_host(
                Signature::new(&[ValueType::I32; 2][..], None),
                FunctionIndex::EthRevertFuncIndex.into(),
            ),
            _ => {
                return Err(InterpreterError::Function(format!(
                    "ethereum module doesn't export function with name {}",
                    field_name
                )));
            }
        };
        Ok(func_ref)
    }
}
