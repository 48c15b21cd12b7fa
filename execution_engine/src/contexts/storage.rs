//! Per-account storage overlay.
//!
//! Reads consult the overlay first and fall back to the blockchain hook's
//! baseline; misses return empty bytes, never an error. Writes are
//! classified against the baseline so that per-write gas and clearing
//! refunds can be computed, and same-value writes are still recorded with
//! an "unchanged" tag.

use std::collections::BTreeMap;

use vela_types::{Address, BlockchainHook, HookError};

type AccountStorage = BTreeMap<Vec<u8>, Vec<u8>>;
type Overlay = BTreeMap<Address, AccountStorage>;

/// Classification of one storage write, driving its gas price.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StorageStatus {
    /// The write restated the current value.
    Unchanged,
    /// A previously empty slot was filled.
    Added,
    /// A non-empty slot received a different non-empty value.
    Modified,
    /// A non-empty slot was cleared; qualifies for the release refund.
    Deleted,
}

/// Key/value overlay on top of hook-provided baseline storage, with
/// push/pop snapshots.
#[derive(Debug, Default)]
pub struct StorageContext {
    overlay: Overlay,
    state_stack: Vec<Overlay>,
}

impl StorageContext {
    /// Creates an empty overlay.
    pub fn new() -> Self {
        StorageContext::default()
    }

    /// Drops all pending writes.
    pub fn init_state(&mut self) {
        self.overlay.clear();
    }

    /// Snapshots the overlay.
    pub fn push_state(&mut self) {
        self.state_stack.push(self.overlay.clone());
    }

    /// Restores the most recent snapshot.
    pub fn pop_set_active_state(&mut self) {
        if let Some(previous) = self.state_stack.pop() {
            self.overlay = previous;
        }
    }

    /// Drops the most recent snapshot, keeping the current overlay.
    pub fn pop_discard(&mut self) {
        self.state_stack.pop();
    }

    /// Empties the snapshot stack.
    pub fn clear_state_stack(&mut self) {
        self.state_stack.clear();
    }

    /// Reads the current value under (`address`, `key`), overlay first.
    pub fn get_storage<B: BlockchainHook + ?Sized>(
        &self,
        hook: &B,
        address: &Address,
        key: &[u8],
    ) -> Result<Vec<u8>, HookError> {
        if let Some(value) = self.overlay.get(address).and_then(|acct| acct.get(key)) {
            return Ok(value.clone());
        }
        match hook.get_storage_data(address, key) {
            Ok(value) => Ok(value),
            Err(HookError::AccountNotFound) => Ok(Vec::new()),
            Err(other) => Err(other),
        }
    }

    /// Records a write and classifies it against the previous value.
    ///
    /// Returns the classification together with the length of the value the
    /// write replaced, which feeds the release refund on clears.
    pub fn set_storage<B: BlockchainHook + ?Sized>(
        &mut self,
        hook: &B,
        address: &Address,
        key: &[u8],
        value: &[u8],
    ) -> Result<(StorageStatus, usize), HookError> {
        let previous = self.get_storage(hook, address, key)?;
        let status = if previous == value {
            StorageStatus::Unchanged
        } else if previous.is_empty() {
            StorageStatus::Added
        } else if value.is_empty() {
            StorageStatus::Deleted
        } else {
            StorageStatus::Modified
        };

        self.overlay
            .entry(*address)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok((status, previous.len()))
    }

    /// The pending writes of one account, in key order.
    pub fn account_updates(&self, address: &Address) -> Option<&AccountStorage> {
        self.overlay.get(address)
    }

    /// Iterates over all accounts with pending writes.
    pub fn iter_accounts(&self) -> impl Iterator<Item = (&Address, &AccountStorage)> {
        self.overlay.iter()
    }

    /// True when no writes are pending.
    pub fn is_empty(&self) -> bool {
        self.overlay.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;

    use super::*;

    struct BaselineHook;

    impl BlockchainHook for BaselineHook {
        fn account_exists(&self, _address: &Address) -> Result<bool, HookError> {
            Ok(true)
        }
        fn get_balance(&self, _address: &Address) -> Result<BigUint, HookError> {
            Ok(BigUint::default())
        }
        fn get_nonce(&self, _address: &Address) -> Result<u64, HookError> {
            Ok(0)
        }
        fn get_storage_data(&self, _address: &Address, key: &[u8]) -> Result<Vec<u8>, HookError> {
            if key == b"baseline" {
                Ok(b"old".to_vec())
            } else {
                Ok(Vec::new())
            }
        }
        fn get_code(&self, _address: &Address) -> Result<Vec<u8>, HookError> {
            Ok(Vec::new())
        }
        fn get_blockhash(&self, _nonce: u64) -> Result<[u8; 32], HookError> {
            Ok([0; 32])
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
            _creator: &Address,
            _creator_nonce: u64,
            _vm_type: &[u8],
        ) -> Result<Address, HookError> {
            Ok(Address::zero())
        }
    }

    #[test]
    fn should_read_empty_for_missing_keys() {
        let storage = StorageContext::new();
        let value = storage
            .get_storage(&BaselineHook, &Address::zero(), b"missing")
            .unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn should_classify_writes() {
        let mut storage = StorageContext::new();
        let hook = BaselineHook;
        let address = Address::zero();

        assert_eq!(
            storage.set_storage(&hook, &address, b"k", b"v").unwrap().0,
            StorageStatus::Added
        );
        assert_eq!(
            storage.set_storage(&hook, &address, b"k", b"v").unwrap().0,
            StorageStatus::Unchanged
        );
        assert_eq!(
            storage.set_storage(&hook, &address, b"k", b"w").unwrap().0,
            StorageStatus::Modified
        );
        assert_eq!(
            storage.set_storage(&hook, &address, b"k", b"").unwrap().0,
            StorageStatus::Deleted
        );
        assert_eq!(
            storage.set_storage(&hook, &address, b"baseline", b"").unwrap().0,
            StorageStatus::Deleted
        );
    }

    #[test]
    fn should_shadow_baseline_with_overlay() {
        let mut storage = StorageContext::new();
        let hook = BaselineHook;
        let address = Address::zero();

        assert_eq!(
            storage.get_storage(&hook, &address, b"baseline").unwrap(),
            b"old".to_vec()
        );
        storage.set_storage(&hook, &address, b"baseline", b"new").unwrap();
        assert_eq!(
            storage.get_storage(&hook, &address, b"baseline").unwrap(),
            b"new".to_vec()
        );
    }

    proptest::proptest! {
        #[test]
        fn push_random_writes_pop_is_identity(
            seed_writes in proptest::collection::vec(
                (proptest::collection::vec(0u8..=255, 1..8), proptest::collection::vec(0u8..=255, 0..8)),
                0..6,
            ),
            shadow_writes in proptest::collection::vec(
                (proptest::collection::vec(0u8..=255, 1..8), proptest::collection::vec(0u8..=255, 0..8)),
                1..6,
            ),
        ) {
            let mut storage = StorageContext::new();
            let hook = BaselineHook;
            let address = Address::zero();
            for (key, value) in &seed_writes {
                storage.set_storage(&hook, &address, key, value).unwrap();
            }
            let before: Vec<_> = seed_writes
                .iter()
                .map(|(key, _)| storage.get_storage(&hook, &address, key).unwrap())
                .collect();

            storage.push_state();
            for (key, value) in &shadow_writes {
                storage.set_storage(&hook, &address, key, value).unwrap();
            }
            storage.pop_set_active_state();

            let after: Vec<_> = seed_writes
                .iter()
                .map(|(key, _)| storage.get_storage(&hook, &address, key).unwrap())
                .collect();
            proptest::prop_assert_eq!(before, after);
        }
    }

    #[test]
    fn push_write_pop_is_identity() {
        let mut storage = StorageContext::new();
        let hook = BaselineHook;
        let address = Address::zero();
        storage.set_storage(&hook, &address, b"k", b"v").unwrap();

        storage.push_state();
        storage.set_storage(&hook, &address, b"k", b"other").unwrap();
        storage.set_storage(&hook, &address, b"k2", b"x").unwrap();
        storage.pop_set_active_state();

        assert_eq!(
            storage.get_storage(&hook, &address, b"k").unwrap(),
            b"v".to_vec()
        );
        assert!(storage.get_storage(&hook, &address, b"k2").unwrap().is_empty());
    }
}
