//! Read-only facade over the injected blockchain hook.
//!
//! Repeated reads of account metadata within one transaction are served
//! from a cache so they stay consistent and cheap. Nothing here mutates
//! chain state; all writes go through the output context and are applied
//! by the embedder only after the whole transaction succeeds.

use std::collections::HashMap;

use num_bigint::BigUint;

use vela_types::{Address, BlockchainHook, HookError};

#[derive(Clone, Debug)]
struct CachedAccount {
    exists: bool,
    nonce: u64,
    balance: BigUint,
    code_len: usize,
}

/// Per-transaction cached view of accounts, code and block headers.
pub struct BlockchainContext<B> {
    hook: B,
    account_cache: HashMap<Address, CachedAccount>,
}

impl<B: BlockchainHook> BlockchainContext<B> {
    /// Wraps `hook` with an empty cache.
    pub fn new(hook: B) -> Self {
        BlockchainContext {
            hook,
            account_cache: HashMap::new(),
        }
    }

    /// Direct access to the underlying hook.
    pub fn hook(&self) -> &B {
        &self.hook
    }

    /// Clears the per-transaction cache.
    pub fn init_state(&mut self) {
        self.account_cache.clear();
    }

    fn cached(&mut self, address: &Address) -> Result<&CachedAccount, HookError> {
        if !self.account_cache.contains_key(address) {
            let exists = self.hook.account_exists(address)?;
            let entry = if exists {
                CachedAccount {
                    exists,
                    nonce: self.hook.get_nonce(address)?,
                    balance: self.hook.get_balance(address)?,
                    code_len: self.hook.get_code(address)?.len(),
                }
            } else {
                CachedAccount {
                    exists,
                    nonce: 0,
                    balance: BigUint::default(),
                    code_len: 0,
                }
            };
            self.account_cache.insert(*address, entry);
        }
        Ok(&self.account_cache[address])
    }

    /// Whether an account exists at `address`.
    pub fn account_exists(&mut self, address: &Address) -> Result<bool, HookError> {
        Ok(self.cached(address)?.exists)
    }

    /// The account's committed balance.
    pub fn get_balance(&mut self, address: &Address) -> Result<BigUint, HookError> {
        Ok(self.cached(address)?.balance.clone())
    }

    /// The account's committed nonce.
    pub fn get_nonce(&mut self, address: &Address) -> Result<u64, HookError> {
        Ok(self.cached(address)?.nonce)
    }

    /// Whether the account holds contract code.
    pub fn is_smart_contract(&mut self, address: &Address) -> Result<bool, HookError> {
        Ok(self.cached(address)?.code_len > 0)
    }

    /// The contract code at `address`. Code bytes are not cached; the
    /// compiled-module reuse happens a level up.
    pub fn get_code(&self, address: &Address) -> Result<Vec<u8>, HookError> {
        self.hook.get_code(address)
    }

    /// Hash of the block at `nonce`.
    pub fn get_blockhash(&self, nonce: u64) -> Result<[u8; 32], HookError> {
        self.hook.get_blockhash(nonce)
    }

    /// Timestamp of the last committed block.
    pub fn last_time_stamp(&self) -> u64 {
        self.hook.last_time_stamp()
    }

    /// Nonce of the last committed block.
    pub fn last_nonce(&self) -> u64 {
        self.hook.last_nonce()
    }

    /// Consensus round of the last committed block.
    pub fn last_round(&self) -> u64 {
        self.hook.last_round()
    }

    /// The current epoch.
    pub fn current_epoch(&self) -> u64 {
        self.hook.current_epoch()
    }

    /// Derives a fresh contract address for `creator`.
    pub fn new_address(&mut self, creator: &Address, vm_type: &[u8]) -> Result<Address, HookError> {
        let nonce = self.get_nonce(creator)?;
        self.hook.new_address(creator, nonce, vm_type)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct CountingHook {
        reads: Cell<u32>,
    }

    impl BlockchainHook for CountingHook {
        fn account_exists(&self, _address: &Address) -> Result<bool, HookError> {
            self.reads.set(self.reads.get() + 1);
            Ok(true)
        }
        fn get_balance(&self, _address: &Address) -> Result<BigUint, HookError> {
            Ok(BigUint::from(100u32))
        }
        fn get_nonce(&self, _address: &Address) -> Result<u64, HookError> {
            Ok(7)
        }
        fn get_storage_data(&self, _address: &Address, _key: &[u8]) -> Result<Vec<u8>, HookError> {
            Ok(Vec::new())
        }
        fn get_code(&self, _address: &Address) -> Result<Vec<u8>, HookError> {
            Ok(vec![0; 4])
        }
        fn get_blockhash(&self, _nonce: u64) -> Result<[u8; 32], HookError> {
            Ok([1; 32])
        }
        fn last_time_stamp(&self) -> u64 {
            0
        }
        fn last_nonce(&self) -> u64 {
            0
        }
        fn last_round(&self) -> u64 {
            0
        }
        fn current_epoch(&self) -> u64 {
            0
        }
        fn new_address(
            &self,
            creator: &Address,
            creator_nonce: u64,
            _vm_type: &[u8],
        ) -> Result<Address, HookError> {
            let mut bytes = creator.into_inner();
            bytes[0] = creator_nonce as u8;
            Ok(Address::new(bytes))
        }
    }

    #[test]
    fn should_cache_account_metadata() {
        let mut blockchain = BlockchainContext::new(CountingHook {
            reads: Cell::new(0),
        });
        let address = Address::new([9; 32]);

        assert!(blockchain.account_exists(&address).unwrap());
        assert_eq!(blockchain.get_nonce(&address).unwrap(), 7);
        assert!(blockchain.is_smart_contract(&address).unwrap());
        assert_eq!(blockchain.hook().reads.get(), 1);

        blockchain.init_state();
        blockchain.account_exists(&address).unwrap();
        assert_eq!(blockchain.hook().reads.get(), 2);
    }

    #[test]
    fn should_derive_address_from_creator_nonce() {
        let mut blockchain = BlockchainContext::new(CountingHook {
            reads: Cell::new(0),
        });
        let creator = Address::new([3; 32]);
        let derived = blockchain.new_address(&creator, &[5, 0]).unwrap();
        assert_eq!(derived.as_bytes()[0], 7);
    }
}
