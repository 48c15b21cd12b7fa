//! Default [`CryptoHook`] implementation.
//!
//! Chains with bespoke primitives inject their own hook; this one covers
//! the hash functions and the Ed25519/secp256k1 signature schemes. BLS
//! verification is reported as unimplemented, matching the capability set
//! the engine itself guarantees.

use ed25519_dalek::{Signature as Ed25519Signature, VerifyingKey as Ed25519VerifyingKey};
use k256::ecdsa::{
    signature::Verifier, Signature as Secp256k1Signature, VerifyingKey as Secp256k1VerifyingKey,
};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

use vela_types::{CryptoError, CryptoHook};

/// Hashing and signature verification backed by the RustCrypto crates.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCryptoHook;

impl CryptoHook for DefaultCryptoHook {
    fn sha256(&self, data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }

    fn keccak256(&self, data: &[u8]) -> [u8; 32] {
        Keccak256::digest(data).into()
    }

    fn ripemd160(&self, data: &[u8]) -> [u8; 20] {
        Ripemd160::digest(data).into()
    }

    fn verify_bls(
        &self,
        _key: &[u8],
        _message: &[u8],
        _signature: &[u8],
    ) -> Result<(), CryptoError> {
        Err(CryptoError::NotImplemented)
    }

    fn verify_ed25519(
        &self,
        key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        let key_bytes: &[u8; 32] = key
            .try_into()
            .map_err(|_| CryptoError::MalformedInput)?;
        let verifying_key =
            Ed25519VerifyingKey::from_bytes(key_bytes).map_err(|_| CryptoError::MalformedInput)?;
        let signature =
            Ed25519Signature::from_slice(signature).map_err(|_| CryptoError::MalformedInput)?;
        verifying_key
            .verify_strict(message, &signature)
            .map_err(|_| CryptoError::InvalidSignature)
    }

    fn verify_secp256k1(
        &self,
        key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        let verifying_key =
            Secp256k1VerifyingKey::from_sec1_bytes(key).map_err(|_| CryptoError::MalformedInput)?;
        let signature =
            Secp256k1Signature::from_slice(signature).map_err(|_| CryptoError::MalformedInput)?;
        verifying_key
            .verify(message, &signature)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_compute_known_sha256_digest() {
        let hook = DefaultCryptoHook;
        let digest = hook.sha256(b"abc");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn should_compute_known_keccak256_digest() {
        let hook = DefaultCryptoHook;
        let digest = hook.keccak256(b"");
        assert_eq!(
            hex::encode(digest),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn should_compute_known_ripemd160_digest() {
        let hook = DefaultCryptoHook;
        let digest = hook.ripemd160(b"abc");
        assert_eq!(hex::encode(digest), "8eb208f7e05d987a9b044a8e98c6b087f15a0bfc");
    }

    #[test]
    fn should_reject_malformed_ed25519_inputs() {
        let hook = DefaultCryptoHook;
        assert_eq!(
            hook.verify_ed25519(&[0; 3], b"msg", &[0; 64]),
            Err(CryptoError::MalformedInput)
        );
    }

    #[test]
    fn should_report_bls_as_unimplemented() {
        let hook = DefaultCryptoHook;
        assert_eq!(
            hook.verify_bls(&[0; 96], b"msg", &[0; 48]),
            Err(CryptoError::NotImplemented)
        );
    }
}
