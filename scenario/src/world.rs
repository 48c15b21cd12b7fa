//! The in-memory mock world backing scenario execution.
//!
//! Implements [`BlockchainHook`] over a shared account map, mirrors the
//! address-derivation mocks of `setState` steps, and applies transaction
//! outputs back onto the map between steps.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use num_bigint::{BigInt, BigUint, Sign};

use vela_types::{Address, BlockchainHook, CodeMetadata, HookError, VmOutput};

/// One account of the mock world.
#[derive(Clone, Debug, Default)]
pub struct AccountState {
    /// Account nonce.
    pub nonce: u64,
    /// Account balance.
    pub balance: BigUint,
    /// Contract storage.
    pub storage: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Contract code; empty for plain accounts.
    pub code: Vec<u8>,
    /// Metadata of the deployed code.
    pub code_metadata: CodeMetadata,
    /// Contract owner.
    pub owner: Option<Address>,
    /// Pending asynchronous call data.
    pub async_call_data: Option<Vec<u8>>,
    /// ESDT balances, token identifier → amount.
    pub esdt: BTreeMap<Vec<u8>, BigUint>,
}

/// Block headers the hook reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockInfoState {
    /// Timestamp of the block.
    pub timestamp: u64,
    /// Nonce of the block.
    pub nonce: u64,
    /// Consensus round of the block.
    pub round: u64,
    /// Epoch of the block.
    pub epoch: u64,
}

#[derive(Debug, Default)]
struct WorldState {
    accounts: BTreeMap<Address, AccountState>,
    new_address_mocks: Vec<(Address, u64, Address)>,
    current_block: BlockInfoState,
    previous_block: BlockInfoState,
}

/// A cheaply clonable handle on the world; the execution host holds one
/// clone as its blockchain hook while the runner mutates through another.
#[derive(Clone, Debug, Default)]
pub struct MockWorld {
    state: Rc<RefCell<WorldState>>,
}

impl MockWorld {
    /// An empty world.
    pub fn new() -> Self {
        MockWorld::default()
    }

    /// Installs or replaces an account.
    pub fn set_account(&self, address: Address, account: AccountState) {
        self.state.borrow_mut().accounts.insert(address, account);
    }

    /// Reads a snapshot of one account.
    pub fn account(&self, address: &Address) -> Option<AccountState> {
        self.state.borrow().accounts.get(address).cloned()
    }

    /// All account addresses currently present.
    pub fn account_addresses(&self) -> Vec<Address> {
        self.state.borrow().accounts.keys().copied().collect()
    }

    /// Registers an address-derivation mock.
    pub fn register_new_address(&self, creator: Address, creator_nonce: u64, derived: Address) {
        self.state
            .borrow_mut()
            .new_address_mocks
            .push((creator, creator_nonce, derived));
    }

    /// Sets the current block header.
    pub fn set_current_block(&self, info: BlockInfoState) {
        self.state.borrow_mut().current_block = info;
    }

    /// Sets the previous block header.
    pub fn set_previous_block(&self, info: BlockInfoState) {
        self.state.borrow_mut().previous_block = info;
    }

    /// Bumps an account's nonce, as the node does for every processed
    /// transaction.
    pub fn increment_nonce(&self, address: &Address) {
        let mut state = self.state.borrow_mut();
        state.accounts.entry(*address).or_default().nonce += 1;
    }

    /// Moves value between two accounts directly, as a `transfer` step does.
    pub fn transfer(
        &self,
        from: &Address,
        to: &Address,
        value: &BigUint,
    ) -> Result<(), HookError> {
        let mut state = self.state.borrow_mut();
        {
            let sender = state
                .accounts
                .get_mut(from)
                .ok_or(HookError::AccountNotFound)?;
            if sender.balance < *value {
                return Err(HookError::Other("insufficient balance".into()));
            }
            sender.balance -= value.clone();
            sender.nonce += 1;
        }
        let receiver = state.accounts.entry(*to).or_default();
        receiver.balance += value.clone();
        Ok(())
    }

    /// Applies a successful transaction output onto the world, in the order
    /// the engine recorded it.
    pub fn apply_vm_output(&self, output: &VmOutput) {
        let mut state = self.state.borrow_mut();
        for (address, output_account) in &output.output_accounts {
            let account = state.accounts.entry(*address).or_default();
            account.nonce += output_account.nonce_delta;
            account.balance = apply_delta(&account.balance, &output_account.balance_delta);
            for (key, update) in &output_account.storage_updates {
                if update.value.is_empty() {
                    account.storage.remove(key);
                } else {
                    account.storage.insert(key.clone(), update.value.clone());
                }
            }
            if let Some(code) = &output_account.code {
                account.code = code.clone();
                account.code_metadata = output_account.code_metadata.unwrap_or_default();
            }
            if let Some(async_call_data) = &output_account.async_call_data {
                account.async_call_data = Some(async_call_data.clone());
            }
        }
        for deleted in &output.deleted_accounts {
            state.accounts.remove(deleted);
        }
    }
}

fn apply_delta(balance: &BigUint, delta: &BigInt) -> BigUint {
    let current: BigInt = balance.clone().into();
    let updated = current + delta;
    match updated.sign() {
        // The engine checks funds before recording transfers, so a negative
        // result here is a harness bug; clamp rather than wrap.
        Sign::Minus => BigUint::default(),
        _ => updated.magnitude().clone(),
    }
}

impl BlockchainHook for MockWorld {
    fn account_exists(&self, address: &Address) -> Result<bool, HookError> {
        Ok(self.state.borrow().accounts.contains_key(address))
    }

    fn get_balance(&self, address: &Address) -> Result<BigUint, HookError> {
        Ok(self
            .state
            .borrow()
            .accounts
            .get(address)
            .map(|account| account.balance.clone())
            .unwrap_or_default())
    }

    fn get_nonce(&self, address: &Address) -> Result<u64, HookError> {
        Ok(self
            .state
            .borrow()
            .accounts
            .get(address)
            .map(|account| account.nonce)
            .unwrap_or_default())
    }

    fn get_storage_data(&self, address: &Address, key: &[u8]) -> Result<Vec<u8>, HookError> {
        Ok(self
            .state
            .borrow()
            .accounts
            .get(address)
            .and_then(|account| account.storage.get(key).cloned())
            .unwrap_or_default())
    }

    fn get_code(&self, address: &Address) -> Result<Vec<u8>, HookError> {
        Ok(self
            .state
            .borrow()
            .accounts
            .get(address)
            .map(|account| account.code.clone())
            .unwrap_or_default())
    }

    fn get_blockhash(&self, nonce: u64) -> Result<[u8; 32], HookError> {
        // Deterministic placeholder hash: the block nonce in the last bytes.
        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&nonce.to_be_bytes());
        Ok(hash)
    }

    fn last_time_stamp(&self) -> u64 {
        self.state.borrow().current_block.timestamp
    }

    fn last_nonce(&self) -> u64 {
        self.state.borrow().current_block.nonce
    }

    fn last_round(&self) -> u64 {
        self.state.borrow().current_block.round
    }

    fn current_epoch(&self) -> u64 {
        self.state.borrow().current_block.epoch
    }

    fn new_address(
        &self,
        creator: &Address,
        creator_nonce: u64,
        _vm_type: &[u8],
    ) -> Result<Address, HookError> {
        let state = self.state.borrow();
        for (mock_creator, mock_nonce, derived) in &state.new_address_mocks {
            if mock_creator == creator && *mock_nonce == creator_nonce {
                return Ok(*derived);
            }
        }
        // Fallback derivation: creator prefix plus the nonce, deterministic
        // and collision-free within a test world.
        let mut bytes = creator.into_inner();
        bytes[24..].copy_from_slice(&creator_nonce.to_be_bytes());
        Ok(Address::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use vela_types::{OutputAccount, StorageUpdate};

    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    #[test]
    fn should_apply_output_accounts() {
        let world = MockWorld::new();
        world.set_account(
            addr(1),
            AccountState {
                balance: BigUint::from(100u32),
                ..AccountState::default()
            },
        );

        let mut output = VmOutput::default();
        let mut account = OutputAccount::new(addr(1));
        account.balance_delta = BigInt::from(-40);
        account.storage_updates.insert(
            b"k".to_vec(),
            StorageUpdate {
                key: b"k".to_vec(),
                value: b"v".to_vec(),
                written: true,
            },
        );
        output.output_accounts.insert(addr(1), account);
        world.apply_vm_output(&output);

        let updated = world.account(&addr(1)).unwrap();
        assert_eq!(updated.balance, BigUint::from(60u32));
        assert_eq!(updated.storage[&b"k".to_vec()], b"v".to_vec());
    }

    #[test]
    fn should_prefer_registered_new_address_mocks() {
        let world = MockWorld::new();
        world.register_new_address(addr(1), 7, addr(9));
        let derived = world.new_address(&addr(1), 7, &[5, 0]).unwrap();
        assert_eq!(derived, addr(9));
        let fallback = world.new_address(&addr(1), 8, &[5, 0]).unwrap();
        assert_ne!(fallback, addr(9));
    }

    #[test]
    fn should_refuse_overdrawn_transfer() {
        let world = MockWorld::new();
        world.set_account(
            addr(1),
            AccountState {
                balance: BigUint::from(10u32),
                ..AccountState::default()
            },
        );
        assert!(world
            .transfer(&addr(1), &addr(2), &BigUint::from(11u32))
            .is_err());
    }
}
