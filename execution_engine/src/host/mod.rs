//! The VM host: every context composed into one engine.
//!
//! A host is constructed once per embedder thread and reused across
//! transactions. Each transaction re-initializes the contexts, runs the
//! requested create/call/upgrade, and collates a [`VmOutput`]. Nested
//! contract calls push snapshots of every mutable context and either commit
//! or roll back atomically, so a failed child never leaks state into its
//! parent.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, warn};
use wasmi::{ExternVal, ImportsBuilder, ModuleInstance};

use vela_types::{
    Address, BlockchainHook, CallType, ContractCallInput, ContractCreateInput, CryptoHook,
    ReturnCode, StorageUpdate, VmInput, VmOutput, INIT_FUNCTION_NAME, UPGRADE_FUNCTION_NAME,
};

use crate::{
    config::EngineConfig,
    contexts::{
        BigIntContext, BlockchainContext, FrameStatus, MeteringContext, OutputContext,
        RuntimeContext, StorageContext, WasmInstance,
    },
    execution::ExecutionError,
    resolvers::{
        import_resolver::{EthereumModuleImportResolver, RuntimeModuleImportResolver},
        memory_resolver::MemoryResolver,
    },
    runtime::Runtime,
    wasm_prep,
};

/// The execution host for one VM instance.
///
/// `B` is the injected blockchain capability and `C` the cryptographic one.
pub struct VmHost<B, C> {
    pub(crate) config: EngineConfig,
    pub(crate) crypto: C,
    pub(crate) blockchain: BlockchainContext<B>,
    pub(crate) runtime: RuntimeContext,
    pub(crate) metering: MeteringContext,
    pub(crate) output: OutputContext,
    pub(crate) storage: StorageContext,
    pub(crate) big_int: BigIntContext,
}

impl<B: BlockchainHook, C: CryptoHook> VmHost<B, C> {
    /// Creates a new host bound to the given hooks and configuration.
    pub fn new(blockchain_hook: B, crypto_hook: C, config: EngineConfig) -> Self {
        let gas_schedule = Arc::new(config.gas_schedule);
        let block_gas_limit = config.block_gas_limit;
        VmHost {
            config,
            crypto: crypto_hook,
            blockchain: BlockchainContext::new(blockchain_hook),
            runtime: RuntimeContext::new(),
            metering: MeteringContext::new(gas_schedule, block_gas_limit),
            output: OutputContext::new(),
            storage: StorageContext::new(),
            big_int: BigIntContext::new(),
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Re-initializes every context for a new transaction.
    pub fn init_state(&mut self) {
        self.big_int.init_state();
        self.output.init_state();
        self.runtime.init_state();
        self.storage.init_state();
        self.blockchain.init_state();
    }

    /// Snapshots every mutable context before a nested call.
    pub fn push_state(&mut self) {
        self.big_int.push_state();
        self.runtime.push_state();
        self.metering.push_state();
        self.output.push_state();
        self.storage.push_state();
    }

    /// Restores every mutable context after a failed nested call. The order
    /// matches [`push_state`](Self::push_state) exactly.
    pub fn pop_state(&mut self) {
        self.big_int.pop_set_active_state();
        self.runtime.pop_set_active_state();
        self.metering.pop_set_active_state();
        self.output.pop_set_active_state();
        self.storage.pop_set_active_state();
    }

    /// Empties every snapshot stack plus the instance stack; used only once
    /// an outer operation has been fully resolved.
    pub fn clear_state_stack(&mut self) {
        self.big_int.clear_state_stack();
        self.runtime.clear_state_stack();
        self.runtime.clear_instance_stack();
        self.metering.clear_state_stack();
        self.output.clear_state_stack();
        self.storage.clear_state_stack();
    }

    /// Deploys a contract. Any fault, expected or not, becomes an error
    /// output; this method does not panic.
    pub fn run_smart_contract_create(&mut self, input: &ContractCreateInput) -> VmOutput {
        self.guarded("create", |host| host.do_run_smart_contract_create(input))
    }

    /// Calls a contract, routing the reserved upgrade function name to the
    /// upgrade path. Any fault becomes an error output; this method does not
    /// panic.
    pub fn run_smart_contract_call(&mut self, input: &ContractCallInput) -> VmOutput {
        if input.function == UPGRADE_FUNCTION_NAME {
            self.guarded("upgrade", |host| host.do_run_smart_contract_upgrade(input))
        } else {
            self.guarded("call", |host| host.do_run_smart_contract_call(input))
        }
    }

    /// The single outer guard of the trap-to-error bridge: typed errors
    /// become error outputs, and a panic escaping a host callback or the
    /// interpreter becomes `ExecutionFailed` with zero gas remaining.
    fn guarded<F>(&mut self, operation: &'static str, run: F) -> VmOutput
    where
        F: FnOnce(&mut Self) -> Result<VmOutput, ExecutionError>,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| run(self))) {
            Ok(Ok(output)) => output,
            Ok(Err(execution_error)) => self.error_output(execution_error),
            Err(_) => {
                error!(operation, "unexpected engine fault");
                self.init_state();
                self.clear_state_stack();
                VmOutput::from_error(
                    ReturnCode::ExecutionFailed,
                    format!("{}: unexpected engine fault", operation),
                )
            }
        }
    }

    fn error_output(&mut self, execution_error: ExecutionError) -> VmOutput {
        let return_code = execution_error.return_code();
        warn!(error = %execution_error, code = ?return_code, "contract execution failed");
        self.clear_state_stack();
        VmOutput::from_error(return_code, execution_error.to_string())
    }

    fn do_run_smart_contract_create(
        &mut self,
        input: &ContractCreateInput,
    ) -> Result<VmOutput, ExecutionError> {
        debug!(caller = %input.caller, gas = input.gas_provided, "run contract create");
        self.init_state();
        self.metering.init_for_call(input.gas_provided)?;
        let base = self
            .metering
            .gas_schedule()
            .base_operation_cost
            .invoke_create;
        self.metering
            .deduct_initial_gas(base, input.contract_code.len())?;

        let address = self
            .blockchain
            .new_address(&input.caller, &self.config.vm_type)?;
        if self.blockchain.account_exists(&address)? {
            return Err(ExecutionError::AccountCollision(address));
        }
        self.check_funds(&input.caller, &input.call_value)?;

        self.output
            .transfer_value_only(input.caller, address, input.call_value.clone());
        self.output
            .deploy_code(address, input.contract_code.clone(), input.code_metadata);

        self.runtime.init_from_input(VmInput {
            caller: input.caller,
            recipient: address,
            call_value: input.call_value.clone(),
            function: INIT_FUNCTION_NAME.to_string(),
            arguments: input.arguments.clone(),
            gas_provided: input.gas_provided,
            gas_price: input.gas_price,
            call_type: CallType::DirectCall,
        });
        self.execute_current_frame(&input.contract_code)?;
        Ok(self.success_output())
    }

    fn do_run_smart_contract_call(
        &mut self,
        input: &ContractCallInput,
    ) -> Result<VmOutput, ExecutionError> {
        debug!(
            recipient = %input.recipient,
            function = %input.function,
            gas = input.gas_provided,
            "run contract call"
        );
        self.init_state();
        self.metering.init_for_call(input.gas_provided)?;

        let code = self.contract_code(&input.recipient)?;
        let base = self.metering.gas_schedule().base_operation_cost.invoke_call;
        self.metering.deduct_initial_gas(base, code.len())?;
        self.check_funds(&input.caller, &input.call_value)?;
        if input.call_value > num_bigint::BigUint::default() {
            self.output.transfer_value_only(
                input.caller,
                input.recipient,
                input.call_value.clone(),
            );
        }

        self.runtime.init_from_input(VmInput::from(input));
        self.execute_current_frame(&code)?;
        Ok(self.success_output())
    }

    fn do_run_smart_contract_upgrade(
        &mut self,
        input: &ContractCallInput,
    ) -> Result<VmOutput, ExecutionError> {
        debug!(recipient = %input.recipient, "run contract upgrade");
        self.init_state();
        self.metering.init_for_call(input.gas_provided)?;

        if !self.blockchain.account_exists(&input.recipient)? {
            return Err(ExecutionError::ContractNotFound(input.recipient));
        }
        let mut arguments = input.arguments.iter();
        let new_code = arguments
            .next()
            .cloned()
            .ok_or_else(|| ExecutionError::ArgumentOutOfRange("missing upgrade code".into()))?;
        let metadata = arguments
            .next()
            .map(|bytes| vela_types::CodeMetadata::from_bytes(bytes))
            .ok_or_else(|| {
                ExecutionError::ArgumentOutOfRange("missing upgrade code metadata".into())
            })?;
        let init_arguments: Vec<Vec<u8>> = arguments.cloned().collect();

        let base = self
            .metering
            .gas_schedule()
            .base_operation_cost
            .invoke_upgrade;
        self.metering.deduct_initial_gas(base, new_code.len())?;
        self.check_funds(&input.caller, &input.call_value)?;

        self.output
            .deploy_code(input.recipient, new_code.clone(), metadata);
        self.runtime.init_from_input(VmInput {
            caller: input.caller,
            recipient: input.recipient,
            call_value: input.call_value.clone(),
            function: INIT_FUNCTION_NAME.to_string(),
            arguments: init_arguments,
            gas_provided: input.gas_provided,
            gas_price: input.gas_price,
            call_type: input.call_type,
        });
        self.execute_current_frame(&new_code)?;
        Ok(self.success_output())
    }

    /// Executes a nested call in an isolated child frame: fresh output and
    /// big-int state, shared storage overlay. On success the child's output
    /// is merged into the parent; on failure the parent is restored verbatim
    /// and the child's status is surfaced as the returned code.
    ///
    /// An `Err` from this method is a failure of the *parent* frame (it
    /// could not pay for the call) and traps the parent.
    pub(crate) fn execute_on_dest_context(
        &mut self,
        input: ContractCallInput,
    ) -> Result<ReturnCode, ExecutionError> {
        if self.runtime.call_depth() >= self.config.max_call_depth {
            return Ok(ReturnCode::CallStackOverFlow);
        }
        self.metering.use_gas(input.gas_provided)?;
        if self.check_funds(&input.caller, &input.call_value).is_err() {
            return Ok(ReturnCode::OutOfFunds);
        }

        self.push_state();
        self.big_int.init_state();
        self.output.init_state();
        self.runtime.init_from_input(VmInput::from(&input));
        self.runtime.push_instance();

        let result = self.run_nested_frame(&input, /* same_context: */ false);
        self.runtime.pop_instance();

        match result {
            Ok(()) => {
                self.commit_nested_frame(/* same_context: */ false);
                Ok(ReturnCode::Ok)
            }
            Err(execution_error) => {
                debug!(error = %execution_error, "nested call failed, rolling back");
                self.pop_state();
                Ok(execution_error.return_code())
            }
        }
    }

    /// Executes a nested call whose code runs against the *parent's* account
    /// context: storage and output effects land on the caller, committing in
    /// place on success. Unlike the isolated variant, a failed same-context
    /// child aborts the parent: its error propagates after the rollback.
    pub(crate) fn execute_on_same_context(
        &mut self,
        input: ContractCallInput,
    ) -> Result<ReturnCode, ExecutionError> {
        if self.runtime.call_depth() >= self.config.max_call_depth {
            return Ok(ReturnCode::CallStackOverFlow);
        }
        self.metering.use_gas(input.gas_provided)?;
        if self.check_funds(&input.caller, &input.call_value).is_err() {
            return Ok(ReturnCode::OutOfFunds);
        }

        let parent_storage_address = self.runtime.storage_address();
        self.push_state();
        self.big_int.init_state();
        self.runtime.init_from_input(VmInput::from(&input));
        self.runtime.set_storage_address(parent_storage_address);
        self.runtime.push_instance();

        let result = self.run_nested_frame(&input, /* same_context: */ true);
        self.runtime.pop_instance();

        match result {
            Ok(()) => {
                self.commit_nested_frame(/* same_context: */ true);
                Ok(ReturnCode::Ok)
            }
            Err(execution_error) => {
                debug!(error = %execution_error, "same-context call failed, rolling back");
                self.pop_state();
                Err(execution_error)
            }
        }
    }

    /// Deploys a contract from inside a running frame. Returns the derived
    /// address on success, the failure code otherwise.
    pub(crate) fn execute_create_contract(
        &mut self,
        input: ContractCreateInput,
    ) -> Result<(ReturnCode, Option<Address>), ExecutionError> {
        if self.runtime.call_depth() >= self.config.max_call_depth {
            return Ok((ReturnCode::CallStackOverFlow, None));
        }
        self.metering.use_gas(input.gas_provided)?;

        let address = self
            .blockchain
            .new_address(&input.caller, &self.config.vm_type)?;
        if self.blockchain.account_exists(&address)? {
            return Ok((ReturnCode::AccountCollision, None));
        }
        if self.check_funds(&input.caller, &input.call_value).is_err() {
            return Ok((ReturnCode::OutOfFunds, None));
        }

        self.push_state();
        self.big_int.init_state();
        self.output.init_state();
        self.runtime.init_from_input(VmInput {
            caller: input.caller,
            recipient: address,
            call_value: input.call_value.clone(),
            function: INIT_FUNCTION_NAME.to_string(),
            arguments: input.arguments.clone(),
            gas_provided: input.gas_provided,
            gas_price: input.gas_price,
            call_type: CallType::DirectCall,
        });
        self.runtime.push_instance();

        let result = (|| {
            self.metering.init_for_call(input.gas_provided)?;
            let base = self
                .metering
                .gas_schedule()
                .base_operation_cost
                .invoke_create;
            self.metering
                .deduct_initial_gas(base, input.contract_code.len())?;
            self.output
                .transfer_value_only(input.caller, address, input.call_value.clone());
            self.output
                .deploy_code(address, input.contract_code.clone(), input.code_metadata);
            self.execute_current_frame(&input.contract_code)
        })();
        self.runtime.pop_instance();

        match result {
            Ok(()) => {
                self.commit_nested_frame(/* same_context: */ false);
                Ok((ReturnCode::Ok, Some(address)))
            }
            Err(execution_error) => {
                debug!(error = %execution_error, "nested create failed, rolling back");
                self.pop_state();
                Ok((execution_error.return_code(), None))
            }
        }
    }

    /// Shared body of the nested-call variants: meter the child, fetch its
    /// code and run it.
    fn run_nested_frame(
        &mut self,
        input: &ContractCallInput,
        same_context: bool,
    ) -> Result<(), ExecutionError> {
        self.metering.init_for_call(input.gas_provided)?;
        let code = self.contract_code(&input.recipient)?;
        let base = self.metering.gas_schedule().base_operation_cost.invoke_call;
        self.metering.deduct_initial_gas(base, code.len())?;
        if input.call_value > num_bigint::BigUint::default() {
            let recipient = if same_context {
                self.runtime.storage_address()
            } else {
                input.recipient
            };
            self.output
                .transfer_value_only(input.caller, recipient, input.call_value.clone());
        }
        self.execute_current_frame(&code)
    }

    /// Commits a successful child frame into the parent. The child's gas
    /// leftover flows back to the parent's counter; the big-int arena and
    /// the call input always return to the parent's.
    fn commit_nested_frame(&mut self, same_context: bool) {
        self.metering.unfreeze_gas();
        let child_gas_left = self.metering.gas_left();
        self.finalize_async();

        self.big_int.pop_set_active_state();
        self.runtime.pop_set_active_state();
        self.metering.pop_set_active_state();
        if same_context {
            // The child accumulated directly into the parent's output.
            self.output.pop_discard();
        } else {
            let child_output = self.output.take_vm_output(child_gas_left);
            self.output.pop_set_active_state();
            self.output.merge_after_nested_call(child_output);
        }
        self.storage.pop_discard();
        self.metering.refund_gas(child_gas_left);
    }

    /// Preprocesses, instantiates and invokes the current frame's function.
    fn execute_current_frame(&mut self, code: &[u8]) -> Result<(), ExecutionError> {
        let module = wasm_prep::preprocess(&self.config, code)?;
        let instance = self.instantiate(module)?;
        self.runtime.set_instance(instance);
        self.invoke_function()
    }

    fn instantiate(
        &self,
        module: parity_wasm::elements::Module,
    ) -> Result<WasmInstance, ExecutionError> {
        let wasmi_module = wasmi::Module::from_parity_wasm_module(module)
            .map_err(|error| ExecutionError::InvalidModule(error.to_string()))?;
        let resolver = RuntimeModuleImportResolver::new(self.config.wasm_config.max_memory);
        let eth_resolver = EthereumModuleImportResolver;
        let mut imports = ImportsBuilder::new();
        imports.push_resolver("env", &resolver);
        imports.push_resolver("ethereum", &eth_resolver);
        let not_started_module = ModuleInstance::new(&wasmi_module, &imports)
            .map_err(|error| ExecutionError::InvalidModule(error.to_string()))?;
        if not_started_module.has_start() {
            return Err(ExecutionError::UnsupportedWasmStart);
        }
        let instance = not_started_module.not_started_instance().clone();
        let memory = resolver.memory_ref()?;
        Ok(WasmInstance {
            module: instance,
            memory,
        })
    }

    fn invoke_function(&mut self) -> Result<(), ExecutionError> {
        let function_name = self.runtime.vm_input().function.clone();
        let module = match self.runtime.instance() {
            Some(instance) => instance.module.clone(),
            None => return Err(ExecutionError::Interpreter("no instantiated module".into())),
        };

        match module.export_by_name(&function_name) {
            Some(ExternVal::Func(func_ref)) => {
                let signature = func_ref.signature();
                if !signature.params().is_empty() || signature.return_type().is_some() {
                    return Err(ExecutionError::FunctionWrongSignature(function_name));
                }
            }
            _ => return Err(ExecutionError::FunctionNotFound(function_name)),
        }

        self.runtime.set_status(FrameStatus::Running);
        let invoke_result = {
            let mut externals = Runtime::new(self);
            module.invoke_export(&function_name, &[], &mut externals)
        };

        match invoke_result {
            Ok(_) => {
                self.runtime.set_status(FrameStatus::Returned);
                Ok(())
            }
            Err(wasmi_error) => {
                let execution_error = ExecutionError::from(wasmi_error);
                if let ExecutionError::AsyncCallTriggered = execution_error {
                    // Cooperative suspension, not a failure.
                    self.runtime.set_status(FrameStatus::BreakpointAsync);
                    return Ok(());
                }
                let status = match execution_error {
                    ExecutionError::SignalError(_) => FrameStatus::UserError,
                    ExecutionError::GasLimit => FrameStatus::OutOfGas,
                    _ => FrameStatus::Trapped,
                };
                self.runtime.set_status(status);
                Err(execution_error)
            }
        }
    }

    /// Collates the transaction's output after a successful top-level frame.
    fn success_output(&mut self) -> VmOutput {
        self.finalize_async();
        self.materialize_storage_updates();
        self.metering.unfreeze_gas();
        let gas_remaining = self.metering.gas_left();
        let output = self.output.take_vm_output(gas_remaining);
        self.clear_state_stack();
        output
    }

    /// Persists a pending asynchronous continuation into the output.
    fn finalize_async(&mut self) {
        if let Some(info) = self.runtime.take_async_call_info() {
            let from = self.runtime.storage_address();
            self.output.transfer(
                from,
                info.destination,
                info.value.clone(),
                info.data.clone(),
                CallType::AsynchronousCall,
            );
            self.output.set_async_call_data(info.destination, info.data);
            self.runtime.set_status(FrameStatus::BreakpointAsync);
        }
    }

    /// Copies the storage overlay into the output accounts, tagging writes
    /// that restate the hook baseline as unchanged.
    fn materialize_storage_updates(&mut self) {
        let hook = self.blockchain.hook();
        let mut materialized: Vec<(Address, StorageUpdate)> = Vec::new();
        for (address, updates) in self.storage.iter_accounts() {
            for (key, value) in updates {
                let baseline = hook
                    .get_storage_data(address, key)
                    .unwrap_or_default();
                materialized.push((
                    *address,
                    StorageUpdate {
                        key: key.clone(),
                        value: value.clone(),
                        written: *value != baseline,
                    },
                ));
            }
        }
        for (address, update) in materialized {
            self.output
                .account_mut(&address)
                .storage_updates
                .insert(update.key.clone(), update);
        }
    }

    /// Fetches the callee's code, failing when the account holds none.
    fn contract_code(&mut self, address: &Address) -> Result<Vec<u8>, ExecutionError> {
        if !self.blockchain.account_exists(address)? {
            return Err(ExecutionError::ContractNotFound(*address));
        }
        let code = self.blockchain.get_code(address)?;
        if code.is_empty() {
            return Err(ExecutionError::ContractNotFound(*address));
        }
        Ok(code)
    }

    /// The committed balance of `address` plus the transaction's pending
    /// delta.
    pub(crate) fn effective_balance(
        &mut self,
        address: &Address,
    ) -> Result<num_bigint::BigInt, ExecutionError> {
        let committed: num_bigint::BigInt = self.blockchain.get_balance(address)?.into();
        Ok(committed + self.output.balance_delta(address))
    }

    /// Checks that `address` can afford to send `value`, counting pending
    /// balance deltas of the running transaction.
    fn check_funds(
        &mut self,
        address: &Address,
        value: &num_bigint::BigUint,
    ) -> Result<(), ExecutionError> {
        if value == &num_bigint::BigUint::default() {
            return Ok(());
        }
        if self.effective_balance(address)? < num_bigint::BigInt::from(value.clone()) {
            return Err(ExecutionError::OutOfFunds);
        }
        Ok(())
    }
}
