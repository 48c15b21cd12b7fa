//! Capability traits the engine consumes.
//!
//! The engine never talks to the chain or to cryptographic primitives
//! directly; both arrive as injected implementations of these traits, which
//! is also how the scenario harness substitutes its in-memory world.

use num_bigint::BigUint;
use thiserror::Error;

use crate::Address;

/// Failure reported by a [`BlockchainHook`] implementation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HookError {
    /// The requested account does not exist.
    #[error("account not found")]
    AccountNotFound,
    /// The requested block is outside the hook's horizon.
    #[error("block not found")]
    BlockNotFound,
    /// Any other hook-side failure.
    #[error("blockchain hook error: {0}")]
    Other(String),
}

/// Read-only view of chain state, injected at VM construction.
///
/// Implementations must be pure within one transaction: repeated reads of
/// the same datum return the same answer.
pub trait BlockchainHook {
    /// Whether an account exists at `address`.
    fn account_exists(&self, address: &Address) -> Result<bool, HookError>;

    /// Current balance of `address`; zero for missing accounts.
    fn get_balance(&self, address: &Address) -> Result<BigUint, HookError>;

    /// Current nonce of `address`; zero for missing accounts.
    fn get_nonce(&self, address: &Address) -> Result<u64, HookError>;

    /// Baseline storage value under (`address`, `key`); empty when unset.
    fn get_storage_data(&self, address: &Address, key: &[u8]) -> Result<Vec<u8>, HookError>;

    /// Contract code deployed at `address`; empty for plain accounts.
    fn get_code(&self, address: &Address) -> Result<Vec<u8>, HookError>;

    /// Hash of the block at `nonce`.
    fn get_blockhash(&self, nonce: u64) -> Result<[u8; 32], HookError>;

    /// Timestamp of the last committed block.
    fn last_time_stamp(&self) -> u64;

    /// Nonce of the last committed block.
    fn last_nonce(&self) -> u64;

    /// Consensus round of the last committed block.
    fn last_round(&self) -> u64;

    /// The current epoch.
    fn current_epoch(&self) -> u64;

    /// Derives the address of a contract deployed by `creator` at
    /// `creator_nonce` for the VM identified by `vm_type`.
    fn new_address(
        &self,
        creator: &Address,
        creator_nonce: u64,
        vm_type: &[u8],
    ) -> Result<Address, HookError>;
}

/// Failure reported by a [`CryptoHook`] implementation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The signature did not verify.
    #[error("signature is invalid")]
    InvalidSignature,
    /// Key or signature bytes were malformed.
    #[error("malformed cryptographic input")]
    MalformedInput,
    /// The primitive is not provided by this hook.
    #[error("crypto primitive not implemented")]
    NotImplemented,
}

/// Cryptographic primitives, injected at VM construction.
pub trait CryptoHook {
    /// SHA-256 digest.
    fn sha256(&self, data: &[u8]) -> [u8; 32];

    /// Keccak-256 digest.
    fn keccak256(&self, data: &[u8]) -> [u8; 32];

    /// RIPEMD-160 digest.
    fn ripemd160(&self, data: &[u8]) -> [u8; 20];

    /// Verifies a BLS signature.
    fn verify_bls(&self, key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError>;

    /// Verifies an Ed25519 signature.
    fn verify_ed25519(
        &self,
        key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError>;

    /// Verifies a secp256k1 ECDSA signature.
    fn verify_secp256k1(
        &self,
        key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError>;
}
