//! Scenario JSON → object model.

use serde_json::{Map, Value};

use crate::{
    error::ScenarioError,
    interpret::InterpreterContext,
    model::{
        Account, BigUintValue, BlockInfo, BytesValue, CallTx, CheckAccount, CheckAccounts,
        CheckLog, CheckLogs, CheckValue, DeployTx, NewAddressMock, Scenario, Step, TransferTx,
        TxExpect, U64Value,
    },
};

/// Parses scenario JSON against an interpreter context.
pub struct Parser {
    context: InterpreterContext,
}

impl Parser {
    /// A parser resolving `file:` values against `context`.
    pub fn new(context: InterpreterContext) -> Self {
        Parser { context }
    }

    /// Parses a whole scenario document.
    pub fn parse_scenario(&self, json: &Value) -> Result<Scenario, ScenarioError> {
        let root = as_map(json, "scenario")?;
        let mut scenario = Scenario::default();
        for (key, value) in root {
            match key.as_str() {
                "name" => scenario.name = Some(as_string(value, "name")?),
                "comment" => scenario.comment = Some(as_string(value, "comment")?),
                // Tolerated metadata fields of the wider scenario format.
                "gasSchedule" | "checkGas" => {}
                "steps" => {
                    let steps = value
                        .as_array()
                        .ok_or_else(|| ScenarioError::parse("steps is not a list"))?;
                    for step in steps {
                        scenario.steps.push(self.parse_step(step)?);
                    }
                }
                other => {
                    return Err(ScenarioError::parse(format!(
                        "unknown scenario field: {other}"
                    )))
                }
            }
        }
        Ok(scenario)
    }

    fn parse_step(&self, json: &Value) -> Result<Step, ScenarioError> {
        let map = as_map(json, "step")?;
        let step_type = map
            .get("step")
            .and_then(Value::as_str)
            .ok_or_else(|| ScenarioError::parse("step object is missing its step type"))?;
        match step_type {
            "setState" => self.parse_set_state(map),
            "scDeploy" => self.parse_sc_deploy(map),
            "scCall" => self.parse_sc_call(map),
            "transfer" => self.parse_transfer(map),
            "checkState" => self.parse_check_state(map),
            other => Err(ScenarioError::parse(format!("unknown step type: {other}"))),
        }
    }

    fn parse_set_state(&self, map: &Map<String, Value>) -> Result<Step, ScenarioError> {
        let mut comment = None;
        let mut accounts = Vec::new();
        let mut new_addresses = Vec::new();
        let mut previous_block_info = None;
        let mut current_block_info = None;

        for (key, value) in map {
            match key.as_str() {
                "step" => {}
                "comment" => comment = Some(as_string(value, "comment")?),
                "accounts" => {
                    for (address_raw, account_raw) in as_map(value, "accounts")? {
                        let address = self.parse_account_address(address_raw)?;
                        accounts.push((address, self.parse_account(account_raw)?));
                    }
                }
                "newAddresses" => {
                    let list = value
                        .as_array()
                        .ok_or_else(|| ScenarioError::parse("newAddresses is not a list"))?;
                    for entry in list {
                        new_addresses.push(self.parse_new_address(entry)?);
                    }
                }
                "previousBlockInfo" => {
                    previous_block_info = Some(self.parse_block_info(value)?);
                }
                "currentBlockInfo" => {
                    current_block_info = Some(self.parse_block_info(value)?);
                }
                other => {
                    return Err(ScenarioError::parse(format!(
                        "unknown setState field: {other}"
                    )))
                }
            }
        }
        Ok(Step::SetState {
            comment,
            accounts,
            new_addresses,
            previous_block_info,
            current_block_info,
        })
    }

    fn parse_account_address(&self, raw: &str) -> Result<BytesValue, ScenarioError> {
        if raw.is_empty() {
            return Err(ScenarioError::parse("missing account address"));
        }
        let address = BytesValue::parse(raw, &self.context)?;
        if address.value.len() != 32 {
            return Err(ScenarioError::parse(format!(
                "account address is not 32 bytes in length: {raw}"
            )));
        }
        Ok(address)
    }

    fn parse_account(&self, json: &Value) -> Result<Account, ScenarioError> {
        let map = as_map(json, "account")?;
        let mut account = Account::default();
        for (key, value) in map {
            match key.as_str() {
                "comment" => account.comment = Some(as_string(value, "account comment")?),
                "shard" => account.shard = Some(self.u64_value(value, "shard")?),
                "nonce" => account.nonce = self.u64_value(value, "account nonce")?,
                "balance" => account.balance = self.big_uint_value(value, "account balance")?,
                "esdt" => {
                    for (token_raw, amount_raw) in as_map(value, "esdt")? {
                        let token = BytesValue::parse(token_raw, &self.context)?;
                        let amount = self.big_uint_value(amount_raw, "esdt balance")?;
                        account.esdt.push((token, amount));
                    }
                }
                "esdtRoles" => {
                    for (token_raw, roles_raw) in as_map(value, "esdtRoles")? {
                        let token = BytesValue::parse(token_raw, &self.context)?;
                        let roles = roles_raw
                            .as_array()
                            .ok_or_else(|| ScenarioError::parse("esdtRoles entry is not a list"))?
                            .iter()
                            .map(|role| as_string(role, "esdt role"))
                            .collect::<Result<Vec<_>, _>>()?;
                        account.esdt_roles.push((token, roles));
                    }
                }
                "esdtLastNonces" => {
                    for (token_raw, nonce_raw) in as_map(value, "esdtLastNonces")? {
                        let token = BytesValue::parse(token_raw, &self.context)?;
                        let nonce = self.u64_value(nonce_raw, "esdt last nonce")?;
                        account.esdt_last_nonces.push((token, nonce));
                    }
                }
                "storage" => {
                    for (key_raw, value_raw) in as_map(value, "account storage")? {
                        let storage_key = BytesValue::parse(key_raw, &self.context)?;
                        let storage_value = self.bytes_value(value_raw, "storage value")?;
                        account.storage.push((storage_key, storage_value));
                    }
                }
                "code" => account.code = Some(self.bytes_value(value, "account code")?),
                "owner" => account.owner = Some(self.bytes_value(value, "account owner")?),
                "asyncCallData" => {
                    account.async_call_data = Some(as_string(value, "asyncCallData")?)
                }
                other => {
                    return Err(ScenarioError::parse(format!(
                        "unknown account field: {other}"
                    )))
                }
            }
        }
        Ok(account)
    }

    fn parse_new_address(&self, json: &Value) -> Result<NewAddressMock, ScenarioError> {
        let map = as_map(json, "newAddress")?;
        let mut mock = NewAddressMock::default();
        for (key, value) in map {
            match key.as_str() {
                "creatorAddress" => {
                    mock.creator_address = self.bytes_value(value, "creatorAddress")?
                }
                "creatorNonce" => mock.creator_nonce = self.u64_value(value, "creatorNonce")?,
                "newAddress" => mock.new_address = self.bytes_value(value, "newAddress")?,
                other => {
                    return Err(ScenarioError::parse(format!(
                        "unknown newAddress field: {other}"
                    )))
                }
            }
        }
        Ok(mock)
    }

    fn parse_block_info(&self, json: &Value) -> Result<BlockInfo, ScenarioError> {
        let map = as_map(json, "blockInfo")?;
        let mut info = BlockInfo::default();
        for (key, value) in map {
            match key.as_str() {
                "blockTimestamp" => {
                    info.block_timestamp = Some(self.u64_value(value, "blockTimestamp")?)
                }
                "blockNonce" => info.block_nonce = Some(self.u64_value(value, "blockNonce")?),
                "blockRound" => info.block_round = Some(self.u64_value(value, "blockRound")?),
                "blockEpoch" => info.block_epoch = Some(self.u64_value(value, "blockEpoch")?),
                other => {
                    return Err(ScenarioError::parse(format!(
                        "unknown block info field: {other}"
                    )))
                }
            }
        }
        Ok(info)
    }

    fn parse_sc_deploy(&self, map: &Map<String, Value>) -> Result<Step, ScenarioError> {
        let mut tx_id = String::new();
        let mut comment = None;
        let mut tx = DeployTx::default();
        let mut expect = None;

        for (key, value) in map {
            match key.as_str() {
                "step" => {}
                "txId" | "id" => tx_id = as_string(value, "txId")?,
                "comment" => comment = Some(as_string(value, "comment")?),
                "tx" => {
                    let tx_map = as_map(value, "tx")?;
                    for (tx_key, tx_value) in tx_map {
                        match tx_key.as_str() {
                            "from" => tx.from = self.bytes_value(tx_value, "tx from")?,
                            "value" => tx.value = self.big_uint_value(tx_value, "tx value")?,
                            "contractCode" => {
                                tx.contract_code = self.bytes_value(tx_value, "contractCode")?
                            }
                            "arguments" => tx.arguments = self.parse_arguments(tx_value)?,
                            "gasLimit" => tx.gas_limit = self.u64_value(tx_value, "gasLimit")?,
                            "gasPrice" => tx.gas_price = self.u64_value(tx_value, "gasPrice")?,
                            other => {
                                return Err(ScenarioError::parse(format!(
                                    "unknown deploy tx field: {other}"
                                )))
                            }
                        }
                    }
                }
                "expect" => expect = Some(self.parse_expect(value)?),
                other => {
                    return Err(ScenarioError::parse(format!(
                        "unknown scDeploy field: {other}"
                    )))
                }
            }
        }
        Ok(Step::ScDeploy {
            tx_id,
            comment,
            tx,
            expect,
        })
    }

    fn parse_sc_call(&self, map: &Map<String, Value>) -> Result<Step, ScenarioError> {
        let mut tx_id = String::new();
        let mut comment = None;
        let mut tx = CallTx::default();
        let mut expect = None;

        for (key, value) in map {
            match key.as_str() {
                "step" => {}
                "txId" | "id" => tx_id = as_string(value, "txId")?,
                "comment" => comment = Some(as_string(value, "comment")?),
                "tx" => {
                    let tx_map = as_map(value, "tx")?;
                    for (tx_key, tx_value) in tx_map {
                        match tx_key.as_str() {
                            "from" => tx.from = self.bytes_value(tx_value, "tx from")?,
                            "to" => tx.to = self.bytes_value(tx_value, "tx to")?,
                            "value" => tx.value = self.big_uint_value(tx_value, "tx value")?,
                            "function" => tx.function = as_string(tx_value, "function")?,
                            "arguments" => tx.arguments = self.parse_arguments(tx_value)?,
                            "gasLimit" => tx.gas_limit = self.u64_value(tx_value, "gasLimit")?,
                            "gasPrice" => tx.gas_price = self.u64_value(tx_value, "gasPrice")?,
                            other => {
                                return Err(ScenarioError::parse(format!(
                                    "unknown call tx field: {other}"
                                )))
                            }
                        }
                    }
                }
                "expect" => expect = Some(self.parse_expect(value)?),
                other => {
                    return Err(ScenarioError::parse(format!(
                        "unknown scCall field: {other}"
                    )))
                }
            }
        }
        Ok(Step::ScCall {
            tx_id,
            comment,
            tx,
            expect,
        })
    }

    fn parse_transfer(&self, map: &Map<String, Value>) -> Result<Step, ScenarioError> {
        let mut tx_id = String::new();
        let mut comment = None;
        let mut tx = TransferTx::default();

        for (key, value) in map {
            match key.as_str() {
                "step" => {}
                "txId" | "id" => tx_id = as_string(value, "txId")?,
                "comment" => comment = Some(as_string(value, "comment")?),
                "tx" => {
                    let tx_map = as_map(value, "tx")?;
                    for (tx_key, tx_value) in tx_map {
                        match tx_key.as_str() {
                            "from" => tx.from = self.bytes_value(tx_value, "tx from")?,
                            "to" => tx.to = self.bytes_value(tx_value, "tx to")?,
                            "value" => tx.value = self.big_uint_value(tx_value, "tx value")?,
                            other => {
                                return Err(ScenarioError::parse(format!(
                                    "unknown transfer tx field: {other}"
                                )))
                            }
                        }
                    }
                }
                other => {
                    return Err(ScenarioError::parse(format!(
                        "unknown transfer field: {other}"
                    )))
                }
            }
        }
        Ok(Step::Transfer { tx_id, comment, tx })
    }

    fn parse_check_state(&self, map: &Map<String, Value>) -> Result<Step, ScenarioError> {
        let mut comment = None;
        let mut accounts = CheckAccounts::default();

        for (key, value) in map {
            match key.as_str() {
                "step" => {}
                "comment" => comment = Some(as_string(value, "comment")?),
                "accounts" => {
                    for (address_raw, account_raw) in as_map(value, "accounts")? {
                        if address_raw == "+" {
                            accounts.other_accounts_allowed = true;
                            continue;
                        }
                        let address = self.parse_account_address(address_raw)?;
                        accounts
                            .accounts
                            .push((address, self.parse_check_account(account_raw)?));
                    }
                }
                other => {
                    return Err(ScenarioError::parse(format!(
                        "unknown checkState field: {other}"
                    )))
                }
            }
        }
        Ok(Step::CheckState { comment, accounts })
    }

    fn parse_check_account(&self, json: &Value) -> Result<CheckAccount, ScenarioError> {
        let map = as_map(json, "check account")?;
        let mut account = CheckAccount::default();
        for (key, value) in map {
            match key.as_str() {
                "comment" => account.comment = Some(as_string(value, "comment")?),
                "nonce" => account.nonce = self.check_u64(value, "check nonce")?,
                "balance" => account.balance = self.check_big_uint(value, "check balance")?,
                "esdt" => {
                    if value.as_str() == Some("*") {
                        account.ignore_esdt = true;
                    } else {
                        for (token_raw, amount_raw) in as_map(value, "check esdt")? {
                            let token = BytesValue::parse(token_raw, &self.context)?;
                            let amount = self.big_uint_value(amount_raw, "check esdt balance")?;
                            account.esdt.push((token, amount));
                        }
                    }
                }
                "storage" => {
                    if value.as_str() == Some("*") {
                        account.ignore_storage = true;
                    } else {
                        for (key_raw, value_raw) in as_map(value, "check storage")? {
                            let storage_key = BytesValue::parse(key_raw, &self.context)?;
                            let storage_value = self.bytes_value(value_raw, "check storage value")?;
                            account.storage.push((storage_key, storage_value));
                        }
                    }
                }
                "code" => account.code = self.check_bytes(value, "check code")?,
                "owner" => account.owner = self.check_bytes(value, "check owner")?,
                "asyncCallData" => {
                    account.async_call_data = self.check_bytes(value, "check asyncCallData")?
                }
                other => {
                    return Err(ScenarioError::parse(format!(
                        "unknown check account field: {other}"
                    )))
                }
            }
        }
        Ok(account)
    }

    fn parse_expect(&self, json: &Value) -> Result<TxExpect, ScenarioError> {
        let map = as_map(json, "expect")?;
        let mut expect = TxExpect::default();
        for (key, value) in map {
            match key.as_str() {
                "out" => {
                    let list = value
                        .as_array()
                        .ok_or_else(|| ScenarioError::parse("expect.out is not a list"))?;
                    for entry in list {
                        let raw = scalar_to_string(entry, "expect.out entry")?;
                        expect
                            .out
                            .push(CheckValue::<BytesValue>::parse(&raw, &self.context)?);
                    }
                }
                "status" => expect.status = self.check_u64(value, "expect.status")?,
                "message" => expect.message = self.check_bytes(value, "expect.message")?,
                "logs" => {
                    if value.as_str() == Some("*") {
                        expect.logs = CheckLogs::Star;
                    } else {
                        let list = value
                            .as_array()
                            .ok_or_else(|| ScenarioError::parse("expect.logs is not a list"))?;
                        let mut logs = Vec::new();
                        for entry in list {
                            logs.push(self.parse_check_log(entry)?);
                        }
                        expect.logs = CheckLogs::List(logs);
                    }
                }
                "gas" => expect.gas = self.check_u64(value, "expect.gas")?,
                "refund" => expect.refund = self.check_big_uint(value, "expect.refund")?,
                other => {
                    return Err(ScenarioError::parse(format!(
                        "unknown expect field: {other}"
                    )))
                }
            }
        }
        Ok(expect)
    }

    fn parse_check_log(&self, json: &Value) -> Result<CheckLog, ScenarioError> {
        let map = as_map(json, "log")?;
        let mut log = CheckLog::default();
        for (key, value) in map {
            match key.as_str() {
                "address" => log.address = self.bytes_value(value, "log address")?,
                "topics" => {
                    let list = value
                        .as_array()
                        .ok_or_else(|| ScenarioError::parse("log topics is not a list"))?;
                    for topic in list {
                        log.topics.push(self.bytes_value(topic, "log topic")?);
                    }
                }
                "data" => log.data = self.bytes_value(value, "log data")?,
                other => {
                    return Err(ScenarioError::parse(format!("unknown log field: {other}")))
                }
            }
        }
        Ok(log)
    }

    fn parse_arguments(&self, json: &Value) -> Result<Vec<BytesValue>, ScenarioError> {
        let list = json
            .as_array()
            .ok_or_else(|| ScenarioError::parse("arguments is not a list"))?;
        list.iter()
            .map(|entry| self.bytes_value(entry, "argument"))
            .collect()
    }

    fn bytes_value(&self, json: &Value, what: &str) -> Result<BytesValue, ScenarioError> {
        let raw = scalar_to_string(json, what)?;
        BytesValue::parse(&raw, &self.context)
    }

    fn u64_value(&self, json: &Value, what: &str) -> Result<U64Value, ScenarioError> {
        let raw = scalar_to_string(json, what)?;
        U64Value::parse(&raw, &self.context)
    }

    fn big_uint_value(&self, json: &Value, what: &str) -> Result<BigUintValue, ScenarioError> {
        let raw = scalar_to_string(json, what)?;
        BigUintValue::parse(&raw, &self.context)
    }

    fn check_bytes(
        &self,
        json: &Value,
        what: &str,
    ) -> Result<CheckValue<BytesValue>, ScenarioError> {
        let raw = scalar_to_string(json, what)?;
        CheckValue::<BytesValue>::parse(&raw, &self.context)
    }

    fn check_u64(&self, json: &Value, what: &str) -> Result<CheckValue<U64Value>, ScenarioError> {
        let raw = scalar_to_string(json, what)?;
        CheckValue::<U64Value>::parse(&raw, &self.context)
    }

    fn check_big_uint(
        &self,
        json: &Value,
        what: &str,
    ) -> Result<CheckValue<BigUintValue>, ScenarioError> {
        let raw = scalar_to_string(json, what)?;
        CheckValue::<BigUintValue>::parse(&raw, &self.context)
    }
}

fn as_map<'a>(json: &'a Value, what: &str) -> Result<&'a Map<String, Value>, ScenarioError> {
    json.as_object()
        .ok_or_else(|| ScenarioError::parse(format!("{what} is not a JSON object")))
}

fn as_string(json: &Value, what: &str) -> Result<String, ScenarioError> {
    json.as_str()
        .map(str::to_owned)
        .ok_or_else(|| ScenarioError::parse(format!("{what} is not a string")))
}

/// Numeric fields accept plain JSON numbers as well as strings.
fn scalar_to_string(json: &Value, what: &str) -> Result<String, ScenarioError> {
    match json {
        Value::String(raw) => Ok(raw.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        _ => Err(ScenarioError::parse(format!(
            "{what} is neither a string nor a number"
        ))),
    }
}
