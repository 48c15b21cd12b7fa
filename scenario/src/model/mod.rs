//! The scenario object model.
//!
//! A scenario is an ordered list of steps: seed the world (`setState`),
//! run transactions (`scDeploy`, `scCall`, `transfer`) and compare the
//! world against expectations (`checkState`). Byte values keep their
//! original notation so scenarios survive a parse/write round trip.

mod value;

pub use value::{check_original, BigUintValue, BytesValue, CheckValue, U64Value};

/// One account in a `setState` step.
#[derive(Clone, Debug, Default)]
pub struct Account {
    /// Free-form annotation, preserved on write.
    pub comment: Option<String>,
    /// Shard the account lives in; informational.
    pub shard: Option<U64Value>,
    /// Account nonce.
    pub nonce: U64Value,
    /// Account balance.
    pub balance: BigUintValue,
    /// ESDT token balances, token identifier → amount.
    pub esdt: Vec<(BytesValue, BigUintValue)>,
    /// ESDT roles per token identifier.
    pub esdt_roles: Vec<(BytesValue, Vec<String>)>,
    /// Last issued ESDT nonces per token identifier.
    pub esdt_last_nonces: Vec<(BytesValue, U64Value)>,
    /// Storage entries, in file order.
    pub storage: Vec<(BytesValue, BytesValue)>,
    /// Contract code, when the account is a contract.
    pub code: Option<BytesValue>,
    /// Owner of the contract account.
    pub owner: Option<BytesValue>,
    /// Pending asynchronous call data.
    pub async_call_data: Option<String>,
}

/// One account in a `checkState` step.
#[derive(Clone, Debug, Default)]
pub struct CheckAccount {
    /// Free-form annotation, preserved on write.
    pub comment: Option<String>,
    /// Expected nonce.
    pub nonce: CheckValue<U64Value>,
    /// Expected balance.
    pub balance: CheckValue<BigUintValue>,
    /// Ignore all ESDT state of this account.
    pub ignore_esdt: bool,
    /// Expected ESDT balances.
    pub esdt: Vec<(BytesValue, BigUintValue)>,
    /// Ignore all storage of this account.
    pub ignore_storage: bool,
    /// Expected storage entries; unlisted keys must be empty.
    pub storage: Vec<(BytesValue, BytesValue)>,
    /// Expected code.
    pub code: CheckValue<BytesValue>,
    /// Expected owner.
    pub owner: CheckValue<BytesValue>,
    /// Expected pending asynchronous call data.
    pub async_call_data: CheckValue<BytesValue>,
}

/// The account set of a `checkState` step.
#[derive(Clone, Debug, Default)]
pub struct CheckAccounts {
    /// Address → expectations, in file order.
    pub accounts: Vec<(BytesValue, CheckAccount)>,
    /// The `"+"` marker: accounts not listed here are tolerated.
    pub other_accounts_allowed: bool,
}

/// A mocked address-derivation entry of a `setState` step.
#[derive(Clone, Debug, Default)]
pub struct NewAddressMock {
    /// The deploying account.
    pub creator_address: BytesValue,
    /// The creator nonce the mock fires at.
    pub creator_nonce: U64Value,
    /// The address the hook returns.
    pub new_address: BytesValue,
}

/// Block header fields injected into the world.
#[derive(Clone, Debug, Default)]
pub struct BlockInfo {
    /// Block timestamp.
    pub block_timestamp: Option<U64Value>,
    /// Block nonce.
    pub block_nonce: Option<U64Value>,
    /// Consensus round.
    pub block_round: Option<U64Value>,
    /// Epoch.
    pub block_epoch: Option<U64Value>,
}

/// A deployment transaction.
#[derive(Clone, Debug, Default)]
pub struct DeployTx {
    /// Deploying account.
    pub from: BytesValue,
    /// Value endowed to the new contract.
    pub value: BigUintValue,
    /// The contract module to deploy.
    pub contract_code: BytesValue,
    /// Arguments to `init`.
    pub arguments: Vec<BytesValue>,
    /// Gas provided.
    pub gas_limit: U64Value,
    /// Gas price.
    pub gas_price: U64Value,
}

/// A contract call transaction.
#[derive(Clone, Debug, Default)]
pub struct CallTx {
    /// Calling account.
    pub from: BytesValue,
    /// Callee contract.
    pub to: BytesValue,
    /// Value transferred with the call.
    pub value: BigUintValue,
    /// Function to execute.
    pub function: String,
    /// Call arguments.
    pub arguments: Vec<BytesValue>,
    /// Gas provided.
    pub gas_limit: U64Value,
    /// Gas price.
    pub gas_price: U64Value,
}

/// A plain value transfer.
#[derive(Clone, Debug, Default)]
pub struct TransferTx {
    /// Sender.
    pub from: BytesValue,
    /// Receiver.
    pub to: BytesValue,
    /// Amount.
    pub value: BigUintValue,
}

/// Expected logs of a transaction.
#[derive(Clone, Debug, Default)]
pub struct CheckLog {
    /// Emitting address.
    pub address: BytesValue,
    /// Expected topics.
    pub topics: Vec<BytesValue>,
    /// Expected data.
    pub data: BytesValue,
}

/// The expected logs: either ignored or an exact ordered list.
#[derive(Clone, Debug)]
pub enum CheckLogs {
    /// Accept any logs.
    Star,
    /// Require exactly these logs, in order.
    List(Vec<CheckLog>),
}

impl Default for CheckLogs {
    fn default() -> Self {
        CheckLogs::Star
    }
}

/// The `expect` block of a transaction step.
#[derive(Clone, Debug, Default)]
pub struct TxExpect {
    /// Expected return data chunks.
    pub out: Vec<CheckValue<BytesValue>>,
    /// Expected return code.
    pub status: CheckValue<U64Value>,
    /// Expected return message.
    pub message: CheckValue<BytesValue>,
    /// Expected logs.
    pub logs: CheckLogs,
    /// Expected gas remaining.
    pub gas: CheckValue<U64Value>,
    /// Expected storage-release refund.
    pub refund: CheckValue<BigUintValue>,
}

/// One scenario step.
#[derive(Clone, Debug)]
pub enum Step {
    /// Seed or amend the world state.
    SetState {
        /// Free-form annotation.
        comment: Option<String>,
        /// Accounts to install.
        accounts: Vec<(BytesValue, Account)>,
        /// Address-derivation mocks.
        new_addresses: Vec<NewAddressMock>,
        /// Header of the previous block.
        previous_block_info: Option<BlockInfo>,
        /// Header of the current block.
        current_block_info: Option<BlockInfo>,
    },
    /// Deploy a contract.
    ScDeploy {
        /// Transaction identifier, used in error reports.
        tx_id: String,
        /// Free-form annotation.
        comment: Option<String>,
        /// The deployment.
        tx: DeployTx,
        /// Expected outcome.
        expect: Option<TxExpect>,
    },
    /// Call a contract.
    ScCall {
        /// Transaction identifier, used in error reports.
        tx_id: String,
        /// Free-form annotation.
        comment: Option<String>,
        /// The call.
        tx: CallTx,
        /// Expected outcome.
        expect: Option<TxExpect>,
    },
    /// Move value between accounts without running code.
    Transfer {
        /// Transaction identifier.
        tx_id: String,
        /// Free-form annotation.
        comment: Option<String>,
        /// The transfer.
        tx: TransferTx,
    },
    /// Compare the world against expectations.
    CheckState {
        /// Free-form annotation.
        comment: Option<String>,
        /// The expected accounts.
        accounts: CheckAccounts,
    },
}

/// A whole scenario file.
#[derive(Clone, Debug, Default)]
pub struct Scenario {
    /// Scenario name.
    pub name: Option<String>,
    /// Free-form annotation.
    pub comment: Option<String>,
    /// The ordered steps.
    pub steps: Vec<Step>,
}
