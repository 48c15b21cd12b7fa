//! Object model → scenario JSON, in the writer's canonical field order.
//!
//! Values are written back in their original notation, so a parse → write
//! round trip is semantically the identity.

use serde_json::{Map, Value};

use crate::model::{
    check_original, Account, BlockInfo, BytesValue, CheckAccount, CheckAccounts, CheckLog,
    CheckLogs, NewAddressMock, Scenario, Step, TxExpect,
};

/// Renders a scenario in canonical form.
pub fn scenario_to_json(scenario: &Scenario) -> Value {
    let mut root = Map::new();
    if let Some(name) = &scenario.name {
        root.insert("name".into(), Value::String(name.clone()));
    }
    if let Some(comment) = &scenario.comment {
        root.insert("comment".into(), Value::String(comment.clone()));
    }
    root.insert(
        "steps".into(),
        Value::Array(scenario.steps.iter().map(step_to_json).collect()),
    );
    Value::Object(root)
}

fn step_to_json(step: &Step) -> Value {
    match step {
        Step::SetState {
            comment,
            accounts,
            new_addresses,
            previous_block_info,
            current_block_info,
        } => {
            let mut map = Map::new();
            map.insert("step".into(), Value::String("setState".into()));
            if let Some(comment) = comment {
                map.insert("comment".into(), Value::String(comment.clone()));
            }
            if !accounts.is_empty() {
                map.insert("accounts".into(), accounts_to_json(accounts));
            }
            if !new_addresses.is_empty() {
                map.insert(
                    "newAddresses".into(),
                    Value::Array(new_addresses.iter().map(new_address_to_json).collect()),
                );
            }
            if let Some(info) = previous_block_info {
                map.insert("previousBlockInfo".into(), block_info_to_json(info));
            }
            if let Some(info) = current_block_info {
                map.insert("currentBlockInfo".into(), block_info_to_json(info));
            }
            Value::Object(map)
        }
        Step::ScDeploy {
            tx_id,
            comment,
            tx,
            expect,
        } => {
            let mut map = Map::new();
            map.insert("step".into(), Value::String("scDeploy".into()));
            map.insert("txId".into(), Value::String(tx_id.clone()));
            if let Some(comment) = comment {
                map.insert("comment".into(), Value::String(comment.clone()));
            }
            let mut tx_map = Map::new();
            tx_map.insert("from".into(), bytes_to_json(&tx.from));
            tx_map.insert("value".into(), Value::String(tx.value.original.clone()));
            tx_map.insert("contractCode".into(), bytes_to_json(&tx.contract_code));
            tx_map.insert(
                "arguments".into(),
                Value::Array(tx.arguments.iter().map(bytes_to_json).collect()),
            );
            tx_map.insert(
                "gasLimit".into(),
                Value::String(tx.gas_limit.original.clone()),
            );
            tx_map.insert(
                "gasPrice".into(),
                Value::String(tx.gas_price.original.clone()),
            );
            map.insert("tx".into(), Value::Object(tx_map));
            if let Some(expect) = expect {
                map.insert("expect".into(), expect_to_json(expect));
            }
            Value::Object(map)
        }
        Step::ScCall {
            tx_id,
            comment,
            tx,
            expect,
        } => {
            let mut map = Map::new();
            map.insert("step".into(), Value::String("scCall".into()));
            map.insert("txId".into(), Value::String(tx_id.clone()));
            if let Some(comment) = comment {
                map.insert("comment".into(), Value::String(comment.clone()));
            }
            let mut tx_map = Map::new();
            tx_map.insert("from".into(), bytes_to_json(&tx.from));
            tx_map.insert("to".into(), bytes_to_json(&tx.to));
            tx_map.insert("value".into(), Value::String(tx.value.original.clone()));
            tx_map.insert("function".into(), Value::String(tx.function.clone()));
            tx_map.insert(
                "arguments".into(),
                Value::Array(tx.arguments.iter().map(bytes_to_json).collect()),
            );
            tx_map.insert(
                "gasLimit".into(),
                Value::String(tx.gas_limit.original.clone()),
            );
            tx_map.insert(
                "gasPrice".into(),
                Value::String(tx.gas_price.original.clone()),
            );
            map.insert("tx".into(), Value::Object(tx_map));
            if let Some(expect) = expect {
                map.insert("expect".into(), expect_to_json(expect));
            }
            Value::Object(map)
        }
        Step::Transfer { tx_id, comment, tx } => {
            let mut map = Map::new();
            map.insert("step".into(), Value::String("transfer".into()));
            map.insert("txId".into(), Value::String(tx_id.clone()));
            if let Some(comment) = comment {
                map.insert("comment".into(), Value::String(comment.clone()));
            }
            let mut tx_map = Map::new();
            tx_map.insert("from".into(), bytes_to_json(&tx.from));
            tx_map.insert("to".into(), bytes_to_json(&tx.to));
            tx_map.insert("value".into(), Value::String(tx.value.original.clone()));
            map.insert("tx".into(), Value::Object(tx_map));
            Value::Object(map)
        }
        Step::CheckState { comment, accounts } => {
            let mut map = Map::new();
            map.insert("step".into(), Value::String("checkState".into()));
            if let Some(comment) = comment {
                map.insert("comment".into(), Value::String(comment.clone()));
            }
            map.insert("accounts".into(), check_accounts_to_json(accounts));
            Value::Object(map)
        }
    }
}

fn accounts_to_json(accounts: &[(BytesValue, Account)]) -> Value {
    let mut map = Map::new();
    for (address, account) in accounts {
        map.insert(address.original.clone(), account_to_json(account));
    }
    Value::Object(map)
}

fn account_to_json(account: &Account) -> Value {
    let mut map = Map::new();
    if let Some(comment) = &account.comment {
        map.insert("comment".into(), Value::String(comment.clone()));
    }
    if let Some(shard) = &account.shard {
        map.insert("shard".into(), Value::String(shard.original.clone()));
    }
    map.insert("nonce".into(), Value::String(account.nonce.original.clone()));
    map.insert(
        "balance".into(),
        Value::String(account.balance.original.clone()),
    );
    if !account.esdt.is_empty() {
        let mut esdt = Map::new();
        for (token, amount) in &account.esdt {
            esdt.insert(
                token.original.clone(),
                Value::String(amount.original.clone()),
            );
        }
        map.insert("esdt".into(), Value::Object(esdt));
    }
    if !account.esdt_roles.is_empty() {
        let mut roles_map = Map::new();
        for (token, roles) in &account.esdt_roles {
            roles_map.insert(
                token.original.clone(),
                Value::Array(roles.iter().cloned().map(Value::String).collect()),
            );
        }
        map.insert("esdtRoles".into(), Value::Object(roles_map));
    }
    if !account.esdt_last_nonces.is_empty() {
        let mut nonces = Map::new();
        for (token, nonce) in &account.esdt_last_nonces {
            nonces.insert(
                token.original.clone(),
                Value::String(nonce.original.clone()),
            );
        }
        map.insert("esdtLastNonces".into(), Value::Object(nonces));
    }
    let mut storage = Map::new();
    for (key, value) in &account.storage {
        storage.insert(key.original.clone(), bytes_to_json(value));
    }
    map.insert("storage".into(), Value::Object(storage));
    map.insert(
        "code".into(),
        match &account.code {
            Some(code) => bytes_to_json(code),
            None => Value::String(String::new()),
        },
    );
    if let Some(owner) = &account.owner {
        map.insert("owner".into(), bytes_to_json(owner));
    }
    if let Some(async_call_data) = &account.async_call_data {
        map.insert(
            "asyncCallData".into(),
            Value::String(async_call_data.clone()),
        );
    }
    Value::Object(map)
}

fn check_accounts_to_json(accounts: &CheckAccounts) -> Value {
    let mut map = Map::new();
    for (address, account) in &accounts.accounts {
        map.insert(address.original.clone(), check_account_to_json(account));
    }
    if accounts.other_accounts_allowed {
        map.insert("+".into(), Value::String(String::new()));
    }
    Value::Object(map)
}

fn check_account_to_json(account: &CheckAccount) -> Value {
    let mut map = Map::new();
    if let Some(comment) = &account.comment {
        map.insert("comment".into(), Value::String(comment.clone()));
    }
    if !account.nonce.is_star() {
        map.insert(
            "nonce".into(),
            Value::String(check_original(&account.nonce, |v| v.original.clone())),
        );
    }
    if !account.balance.is_star() {
        map.insert(
            "balance".into(),
            Value::String(check_original(&account.balance, |v| v.original.clone())),
        );
    }
    if account.ignore_esdt {
        map.insert("esdt".into(), Value::String("*".into()));
    } else if !account.esdt.is_empty() {
        let mut esdt = Map::new();
        for (token, amount) in &account.esdt {
            esdt.insert(
                token.original.clone(),
                Value::String(amount.original.clone()),
            );
        }
        map.insert("esdt".into(), Value::Object(esdt));
    }
    if account.ignore_storage {
        map.insert("storage".into(), Value::String("*".into()));
    } else {
        let mut storage = Map::new();
        for (key, value) in &account.storage {
            storage.insert(key.original.clone(), bytes_to_json(value));
        }
        map.insert("storage".into(), Value::Object(storage));
    }
    if !account.code.is_star() {
        map.insert(
            "code".into(),
            Value::String(check_original(&account.code, |v| v.original.clone())),
        );
    }
    if !account.owner.is_star() {
        map.insert(
            "owner".into(),
            Value::String(check_original(&account.owner, |v| v.original.clone())),
        );
    }
    if !account.async_call_data.is_star() {
        map.insert(
            "asyncCallData".into(),
            Value::String(check_original(&account.async_call_data, |v| {
                v.original.clone()
            })),
        );
    }
    Value::Object(map)
}

fn new_address_to_json(mock: &NewAddressMock) -> Value {
    let mut map = Map::new();
    map.insert("creatorAddress".into(), bytes_to_json(&mock.creator_address));
    map.insert(
        "creatorNonce".into(),
        Value::String(mock.creator_nonce.original.clone()),
    );
    map.insert("newAddress".into(), bytes_to_json(&mock.new_address));
    Value::Object(map)
}

fn block_info_to_json(info: &BlockInfo) -> Value {
    let mut map = Map::new();
    if let Some(timestamp) = &info.block_timestamp {
        map.insert(
            "blockTimestamp".into(),
            Value::String(timestamp.original.clone()),
        );
    }
    if let Some(nonce) = &info.block_nonce {
        map.insert("blockNonce".into(), Value::String(nonce.original.clone()));
    }
    if let Some(round) = &info.block_round {
        map.insert("blockRound".into(), Value::String(round.original.clone()));
    }
    if let Some(epoch) = &info.block_epoch {
        map.insert("blockEpoch".into(), Value::String(epoch.original.clone()));
    }
    Value::Object(map)
}

fn expect_to_json(expect: &TxExpect) -> Value {
    let mut map = Map::new();
    map.insert(
        "out".into(),
        Value::Array(
            expect
                .out
                .iter()
                .map(|entry| Value::String(check_original(entry, |v| v.original.clone())))
                .collect(),
        ),
    );
    map.insert(
        "status".into(),
        Value::String(check_original(&expect.status, |v| v.original.clone())),
    );
    if !expect.message.is_star() {
        map.insert(
            "message".into(),
            Value::String(check_original(&expect.message, |v| v.original.clone())),
        );
    }
    match &expect.logs {
        CheckLogs::Star => {
            map.insert("logs".into(), Value::String("*".into()));
        }
        CheckLogs::List(logs) => {
            map.insert(
                "logs".into(),
                Value::Array(logs.iter().map(check_log_to_json).collect()),
            );
        }
    }
    map.insert(
        "gas".into(),
        Value::String(check_original(&expect.gas, |v| v.original.clone())),
    );
    map.insert(
        "refund".into(),
        Value::String(check_original(&expect.refund, |v| v.original.clone())),
    );
    Value::Object(map)
}

fn check_log_to_json(log: &CheckLog) -> Value {
    let mut map = Map::new();
    map.insert("address".into(), bytes_to_json(&log.address));
    map.insert(
        "topics".into(),
        Value::Array(log.topics.iter().map(bytes_to_json).collect()),
    );
    map.insert("data".into(), bytes_to_json(&log.data));
    Value::Object(map)
}

fn bytes_to_json(bytes: &BytesValue) -> Value {
    Value::String(bytes.original.clone())
}
