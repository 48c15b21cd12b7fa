//! The scenario step executor.
//!
//! Runs each step of a parsed scenario against a [`VmHost`] wired to the
//! [`MockWorld`], comparing engine outputs and post-state against the
//! scenario's expectations.

use std::path::Path;

use num_bigint::BigUint;
use tracing::debug;

use vela_execution_engine::{config::EngineConfig, DefaultCryptoHook, VmHost};
use vela_types::{
    Address, CallType, CodeMetadata, ContractCallInput, ContractCreateInput, VmOutput,
};

use crate::{
    error::ScenarioError,
    interpret::InterpreterContext,
    model::{Account, BlockInfo, BytesValue, CheckAccounts, CheckLogs, Scenario, Step, TxExpect},
    parse::Parser,
    world::{AccountState, BlockInfoState, MockWorld},
};

/// Executes scenarios against a fresh host and world.
pub struct ScenarioRunner {
    world: MockWorld,
    host: VmHost<MockWorld, DefaultCryptoHook>,
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        ScenarioRunner::new()
    }
}

impl ScenarioRunner {
    /// A runner with the default engine configuration.
    pub fn new() -> Self {
        ScenarioRunner::with_config(EngineConfig::default())
    }

    /// A runner with a custom engine configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let world = MockWorld::new();
        let host = VmHost::new(world.clone(), DefaultCryptoHook, config);
        ScenarioRunner { world, host }
    }

    /// The world backing this runner.
    pub fn world(&self) -> &MockWorld {
        &self.world
    }

    /// Mutable access to the host, for tests that drive it directly.
    pub fn host(&mut self) -> &mut VmHost<MockWorld, DefaultCryptoHook> {
        &mut self.host
    }

    /// Loads, parses and runs a scenario file; `file:` values resolve next
    /// to it.
    pub fn run_scenario_file(&mut self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let json: serde_json::Value = serde_json::from_str(&raw)?;
        let base_path = path.parent().unwrap_or_else(|| Path::new("."));
        let parser = Parser::new(InterpreterContext::new(base_path));
        let scenario = parser.parse_scenario(&json)?;
        self.run_scenario(&scenario)
    }

    /// Runs all steps of a parsed scenario.
    pub fn run_scenario(&mut self, scenario: &Scenario) -> Result<(), ScenarioError> {
        debug!(name = scenario.name.as_deref().unwrap_or(""), "running scenario");
        for step in &scenario.steps {
            self.run_step(step)?;
        }
        Ok(())
    }

    fn run_step(&mut self, step: &Step) -> Result<(), ScenarioError> {
        match step {
            Step::SetState {
                accounts,
                new_addresses,
                previous_block_info,
                current_block_info,
                ..
            } => {
                self.apply_set_state(
                    accounts,
                    new_addresses,
                    previous_block_info,
                    current_block_info,
                );
                Ok(())
            }
            Step::ScDeploy {
                tx_id, tx, expect, ..
            } => self.run_sc_deploy(tx_id, tx, expect.as_ref()),
            Step::ScCall {
                tx_id, tx, expect, ..
            } => self.run_sc_call(tx_id, tx, expect.as_ref()),
            Step::Transfer { tx_id, tx, .. } => {
                let from = to_address(&tx.from)?;
                let to = to_address(&tx.to)?;
                self.world
                    .transfer(&from, &to, &tx.value.value)
                    .map_err(|error| {
                        ScenarioError::check(format!("transfer {tx_id} failed: {error}"))
                    })
            }
            Step::CheckState { accounts, .. } => self.check_state(accounts),
        }
    }

    fn apply_set_state(
        &mut self,
        accounts: &[(BytesValue, Account)],
        new_addresses: &[crate::model::NewAddressMock],
        previous_block_info: &Option<BlockInfo>,
        current_block_info: &Option<BlockInfo>,
    ) {
        for (address_value, account) in accounts {
            let address = Address::try_from_slice(&address_value.value)
                .expect("account addresses are length-checked at parse time");
            let mut state = AccountState {
                nonce: account.nonce.value,
                balance: account.balance.value.clone(),
                code: account
                    .code
                    .as_ref()
                    .map(|code| code.value.clone())
                    .unwrap_or_default(),
                owner: account
                    .owner
                    .as_ref()
                    .and_then(|owner| Address::try_from_slice(&owner.value)),
                async_call_data: account
                    .async_call_data
                    .as_ref()
                    .map(|data| data.as_bytes().to_vec()),
                ..AccountState::default()
            };
            for (key, value) in &account.storage {
                if !value.value.is_empty() {
                    state.storage.insert(key.value.clone(), value.value.clone());
                }
            }
            for (token, amount) in &account.esdt {
                state.esdt.insert(token.value.clone(), amount.value.clone());
            }
            self.world.set_account(address, state);
        }

        for mock in new_addresses {
            if let (Some(creator), Some(derived)) = (
                Address::try_from_slice(&mock.creator_address.value),
                Address::try_from_slice(&mock.new_address.value),
            ) {
                self.world
                    .register_new_address(creator, mock.creator_nonce.value, derived);
            }
        }

        if let Some(info) = previous_block_info {
            self.world.set_previous_block(block_info_state(info));
        }
        if let Some(info) = current_block_info {
            self.world.set_current_block(block_info_state(info));
        }
    }

    fn run_sc_deploy(
        &mut self,
        tx_id: &str,
        tx: &crate::model::DeployTx,
        expect: Option<&TxExpect>,
    ) -> Result<(), ScenarioError> {
        let input = ContractCreateInput {
            caller: to_address(&tx.from)?,
            call_value: tx.value.value.clone(),
            contract_code: tx.contract_code.value.clone(),
            code_metadata: CodeMetadata {
                upgradeable: true,
                payable: true,
                readable: true,
            },
            arguments: tx.arguments.iter().map(|arg| arg.value.clone()).collect(),
            gas_provided: tx.gas_limit.value,
            gas_price: tx.gas_price.value,
        };
        let output = self.host.run_smart_contract_create(&input);
        self.world.increment_nonce(&input.caller);
        self.settle_tx(tx_id, &output, expect)
    }

    fn run_sc_call(
        &mut self,
        tx_id: &str,
        tx: &crate::model::CallTx,
        expect: Option<&TxExpect>,
    ) -> Result<(), ScenarioError> {
        let input = ContractCallInput {
            caller: to_address(&tx.from)?,
            recipient: to_address(&tx.to)?,
            call_value: tx.value.value.clone(),
            function: tx.function.clone(),
            arguments: tx.arguments.iter().map(|arg| arg.value.clone()).collect(),
            gas_provided: tx.gas_limit.value,
            gas_price: tx.gas_price.value,
            call_type: CallType::DirectCall,
        };
        let output = self.host.run_smart_contract_call(&input);
        self.world.increment_nonce(&input.caller);
        self.settle_tx(tx_id, &output, expect)
    }

    fn settle_tx(
        &mut self,
        tx_id: &str,
        output: &VmOutput,
        expect: Option<&TxExpect>,
    ) -> Result<(), ScenarioError> {
        if let Some(expect) = expect {
            check_tx_expect(tx_id, output, expect)?;
        }
        if !output.return_code.is_error() {
            self.world.apply_vm_output(output);
        }
        Ok(())
    }

    fn check_state(&self, expected: &CheckAccounts) -> Result<(), ScenarioError> {
        if !expected.other_accounts_allowed {
            for address in self.world.account_addresses() {
                let listed = expected
                    .accounts
                    .iter()
                    .any(|(expected_address, _)| expected_address.value == address.as_bytes());
                if !listed {
                    return Err(ScenarioError::check(format!(
                        "unexpected account address: {address}"
                    )));
                }
            }
        }

        for (address_value, check) in &expected.accounts {
            let address = to_address(address_value)?;
            let account = self.world.account(&address).ok_or_else(|| {
                ScenarioError::check(format!(
                    "account {} expected but not found after running test",
                    address_value.original
                ))
            })?;

            if !check.nonce.check(account.nonce) {
                return Err(ScenarioError::check(format!(
                    "bad account nonce. Account: {}. Have: {}",
                    address_value.original, account.nonce
                )));
            }
            if !check.balance.check(&account.balance) {
                return Err(ScenarioError::check(format!(
                    "bad account balance. Account: {}. Have: {}",
                    address_value.original, account.balance
                )));
            }
            if !check.code.check(&account.code) {
                return Err(ScenarioError::check(format!(
                    "bad account code. Account: {}",
                    address_value.original
                )));
            }
            let owner_bytes = account
                .owner
                .map(|owner| owner.as_bytes().to_vec())
                .unwrap_or_default();
            if !check.owner.check(&owner_bytes) {
                return Err(ScenarioError::check(format!(
                    "bad account owner. Account: {}",
                    address_value.original
                )));
            }
            let async_bytes = account.async_call_data.clone().unwrap_or_default();
            if !check.async_call_data.check(&async_bytes) {
                return Err(ScenarioError::check(format!(
                    "bad async call data. Account: {}",
                    address_value.original
                )));
            }

            if !check.ignore_storage {
                check_account_storage(address_value, check, &account)?;
            }
            if !check.ignore_esdt {
                check_account_esdt(address_value, check, &account)?;
            }
        }
        Ok(())
    }
}

fn check_account_storage(
    address: &BytesValue,
    check: &crate::model::CheckAccount,
    account: &AccountState,
) -> Result<(), ScenarioError> {
    use std::collections::BTreeMap;

    let mut expected: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
    for (key, value) in &check.storage {
        expected.insert(key.value.clone(), value.value.clone());
    }

    let mut all_keys: Vec<Vec<u8>> = expected.keys().cloned().collect();
    for key in account.storage.keys() {
        if !expected.contains_key(key) {
            all_keys.push(key.clone());
        }
    }

    let mut mismatches = String::new();
    for key in all_keys {
        let want = expected.get(&key).cloned().unwrap_or_default();
        let have = account.storage.get(&key).cloned().unwrap_or_default();
        if want != have {
            mismatches.push_str(&format!(
                "\n  for key 0x{}: Want: 0x{}. Have: 0x{}",
                hex::encode(&key),
                hex::encode(&want),
                hex::encode(&have)
            ));
        }
    }
    if !mismatches.is_empty() {
        return Err(ScenarioError::check(format!(
            "wrong account storage for account {}:{}",
            address.original, mismatches
        )));
    }
    Ok(())
}

fn check_account_esdt(
    address: &BytesValue,
    check: &crate::model::CheckAccount,
    account: &AccountState,
) -> Result<(), ScenarioError> {
    use std::collections::BTreeMap;

    let mut expected: BTreeMap<Vec<u8>, BigUint> = BTreeMap::new();
    for (token, amount) in &check.esdt {
        expected.insert(token.value.clone(), amount.value.clone());
    }
    let mut all_tokens: Vec<Vec<u8>> = expected.keys().cloned().collect();
    for token in account.esdt.keys() {
        if !expected.contains_key(token) {
            all_tokens.push(token.clone());
        }
    }
    for token in all_tokens {
        let want = expected.get(&token).cloned().unwrap_or_default();
        let have = account.esdt.get(&token).cloned().unwrap_or_default();
        if want != have {
            return Err(ScenarioError::check(format!(
                "bad esdt balance. Account: {}. Token: 0x{}. Want: {}. Have: {}",
                address.original,
                hex::encode(&token),
                want,
                have
            )));
        }
    }
    Ok(())
}

/// Compares one transaction output against its `expect` block.
pub fn check_tx_expect(
    tx_id: &str,
    output: &VmOutput,
    expect: &TxExpect,
) -> Result<(), ScenarioError> {
    if !expect.status.check(output.return_code.as_u64()) {
        return Err(ScenarioError::check(format!(
            "result code mismatch. Tx: {tx_id}. Have: {} ({})",
            output.return_code.as_u64(),
            output.return_message
        )));
    }

    if expect.out.len() != output.return_data.len() {
        return Err(ScenarioError::check(format!(
            "result length mismatch. Tx: {tx_id}. Want: {}. Have: {}",
            expect.out.len(),
            output.return_data.len()
        )));
    }
    for (index, (want, have)) in expect.out.iter().zip(&output.return_data).enumerate() {
        if !want.check(have) {
            return Err(ScenarioError::check(format!(
                "result mismatch. Tx: {tx_id}. Result #{index}. Have: 0x{}",
                hex::encode(have)
            )));
        }
    }

    if !expect.message.check(output.return_message.as_bytes()) {
        return Err(ScenarioError::check(format!(
            "result message mismatch. Tx: {tx_id}. Have: {}",
            output.return_message
        )));
    }

    if let CheckLogs::List(expected_logs) = &expect.logs {
        if expected_logs.len() != output.logs.len() {
            return Err(ScenarioError::check(format!(
                "log count mismatch. Tx: {tx_id}. Want: {}. Have: {}",
                expected_logs.len(),
                output.logs.len()
            )));
        }
        for (index, (want, have)) in expected_logs.iter().zip(&output.logs).enumerate() {
            let address_ok = want.address.value == have.address.as_bytes();
            let topics_ok = want.topics.len() == have.topics.len()
                && want
                    .topics
                    .iter()
                    .zip(&have.topics)
                    .all(|(w, h)| w.value == *h);
            let data_ok = want.data.value == have.data;
            if !address_ok || !topics_ok || !data_ok {
                return Err(ScenarioError::check(format!(
                    "log mismatch. Tx: {tx_id}. Log #{index}"
                )));
            }
        }
    }

    if !expect.gas.check(output.gas_remaining) {
        return Err(ScenarioError::check(format!(
            "gas remaining mismatch. Tx: {tx_id}. Have: {}",
            output.gas_remaining
        )));
    }
    if !expect.refund.check(&output.gas_refund) {
        return Err(ScenarioError::check(format!(
            "refund mismatch. Tx: {tx_id}. Have: {}",
            output.gas_refund
        )));
    }
    Ok(())
}

fn to_address(value: &BytesValue) -> Result<Address, ScenarioError> {
    Address::try_from_slice(&value.value).ok_or_else(|| {
        ScenarioError::parse(format!(
            "address is not 32 bytes in length: {}",
            value.original
        ))
    })
}

fn block_info_state(info: &BlockInfo) -> BlockInfoState {
    BlockInfoState {
        timestamp: info
            .block_timestamp
            .as_ref()
            .map(|v| v.value)
            .unwrap_or_default(),
        nonce: info.block_nonce.as_ref().map(|v| v.value).unwrap_or_default(),
        round: info.block_round.as_ref().map(|v| v.value).unwrap_or_default(),
        epoch: info.block_epoch.as_ref().map(|v| v.value).unwrap_or_default(),
    }
}
