//! Dense identifiers of the host functions exposed to contracts.
use std::convert::TryFrom;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

/// Enum representing unique IDs of the host functions of the current ABI
/// version. The wasmi resolver maps import names to these indices and the
/// externals dispatcher matches on them.
#[derive(Debug, PartialEq, Eq, FromPrimitive, ToPrimitive, Clone, Copy)]
#[repr(usize)]
pub(crate) enum FunctionIndex {
    GasFuncIndex,
    GetScAddressFuncIndex,
    GetCallerFuncIndex,
    GetCallValueFuncIndex,
    GetGasLeftFuncIndex,
    GetNumArgumentsFuncIndex,
    GetArgumentLengthFuncIndex,
    GetArgumentFuncIndex,
    Int64GetArgumentFuncIndex,
    GetFunctionFuncIndex,
    StorageStoreFuncIndex,
    StorageLoadFuncIndex,
    StorageLoadLengthFuncIndex,
    Int64StorageStoreFuncIndex,
    Int64StorageLoadFuncIndex,
    FinishFuncIndex,
    Int64FinishFuncIndex,
    SignalErrorFuncIndex,
    WriteLogFuncIndex,
    GetBlockTimestampFuncIndex,
    GetBlockNonceFuncIndex,
    GetBlockRoundFuncIndex,
    GetBlockEpochFuncIndex,
    GetBlockHashFuncIndex,
    GetExternalBalanceFuncIndex,
    TransferValueFuncIndex,
    ExecuteOnDestContextFuncIndex,
    ExecuteOnSameContextFuncIndex,
    CreateContractFuncIndex,
    AsyncCallFuncIndex,
    BigIntNewFuncIndex,
    BigIntUnsignedByteLengthFuncIndex,
    BigIntSignedByteLengthFuncIndex,
    BigIntGetUnsignedBytesFuncIndex,
    BigIntGetSignedBytesFuncIndex,
    BigIntSetUnsignedBytesFuncIndex,
    BigIntSetSignedBytesFuncIndex,
    BigIntIsInt64FuncIndex,
    BigIntGetInt64FuncIndex,
    BigIntSetInt64FuncIndex,
    BigIntAddFuncIndex,
    BigIntSubFuncIndex,
    BigIntMulFuncIndex,
    BigIntTDivFuncIndex,
    BigIntTModFuncIndex,
    BigIntPowFuncIndex,
    BigIntShlFuncIndex,
    BigIntShrFuncIndex,
    BigIntAbsFuncIndex,
    BigIntNegFuncIndex,
    BigIntSignFuncIndex,
    BigIntCmpFuncIndex,
    BigIntFinishUnsignedFuncIndex,
    BigIntFinishSignedFuncIndex,
    BigIntStorageStoreUnsignedFuncIndex,
    BigIntStorageLoadUnsignedFuncIndex,
    BigIntGetUnsignedArgumentFuncIndex,
    BigIntGetSignedArgumentFuncIndex,
    BigIntGetCallValueFuncIndex,
    BigIntGetExternalBalanceFuncIndex,
    Sha256FuncIndex,
    Keccak256FuncIndex,
    Ripemd160FuncIndex,
    VerifyBlsFuncIndex,
    VerifyEd25519FuncIndex,
    VerifySecp256k1FuncIndex,
    EthUseGasFuncIndex,
    EthGetAddressFuncIndex,
    EthGetExternalBalanceFuncIndex,
    EthGetBlockHashFuncIndex,
    EthGetCallDataSizeFuncIndex,
    EthCallDataCopyFuncIndex,
    EthGetCallerFuncIndex,
    EthGetCallValueFuncIndex,
    EthStorageStoreFuncIndex,
    EthStorageLoadFuncIndex,
    EthGetGasLeftFuncIndex,
    EthGetBlockTimestampFuncIndex,
    EthGetBlockNumberFuncIndex,
    EthGetBlockGasLimitFuncIndex,
    EthGetTxOriginFuncIndex,
    EthFinishFuncIndex,
    EthRevertFuncIndex,
}

impl From<FunctionIndex> for usize {
    fn from(index: FunctionIndex) -> usize {
        // NOTE: This can't fail as `FunctionIndex` is represented by usize,
        // so this serves mostly as a syntax sugar.
        index.to_usize().unwrap()
    }
}

impl TryFrom<usize> for FunctionIndex {
    type Error = &'static str;
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        FromPrimitive::from_usize(value).ok_or("invalid function index")
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::FunctionIndex;

    #[test]
    fn primitive_to_enum() {
        FunctionIndex::try_from(19).expect("unable to create enum from number");
    }

    #[test]
    fn enum_to_primitive() {
        let element = FunctionIndex::StorageStoreFuncIndex;
        let _primitive: usize = element.into();
    }

    #[test]
    fn invalid_index() {
        assert!(FunctionIndex::try_from(123_456_789usize).is_err());
    }
}
