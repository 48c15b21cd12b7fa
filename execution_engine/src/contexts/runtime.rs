//! The runtime context: the live Wasm instance, the current call input and
//! the instance stack that supports nested contract calls.

use num_bigint::BigUint;
use wasmi::{MemoryRef, ModuleRef};

use vela_types::{Address, VmInput};

use crate::execution::ExecutionError;

/// Progression of one contract frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// The frame exists but its module is not yet instantiated.
    Created,
    /// The module was instantiated successfully.
    Instantiated,
    /// The exported function is executing.
    Running,
    /// The function returned normally.
    Returned,
    /// The contract signalled an error.
    UserError,
    /// The instance trapped.
    Trapped,
    /// The frame ran out of gas.
    OutOfGas,
    /// The frame suspended itself for an asynchronous continuation.
    BreakpointAsync,
}

/// A pending asynchronous call, persisted in the output when the frame
/// suspends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsyncCallInfo {
    /// Destination contract of the continuation.
    pub destination: Address,
    /// Value to transfer with the continuation.
    pub value: BigUint,
    /// Serialized call payload.
    pub data: Vec<u8>,
    /// Gas reserved for the continuation.
    pub gas_limit: u64,
}

/// The instantiated module together with its imported memory.
#[derive(Clone)]
pub struct WasmInstance {
    /// The wasmi module instance.
    pub module: ModuleRef,
    /// The linear memory the host allocated for it.
    pub memory: MemoryRef,
}

#[derive(Clone)]
struct RuntimeSnapshot {
    vm_input: VmInput,
    storage_address: Address,
    status: FrameStatus,
    async_call_info: Option<AsyncCallInfo>,
}

/// Owns the active Wasm instance, the current call input and the
/// argument/return marshalling state of the running frame.
pub struct RuntimeContext {
    vm_input: VmInput,
    /// The account whose storage and output the frame acts upon. Equals the
    /// callee except in same-context execution, where the child code runs
    /// against its caller's account.
    storage_address: Address,
    status: FrameStatus,
    async_call_info: Option<AsyncCallInfo>,
    instance: Option<WasmInstance>,
    instance_stack: Vec<Option<WasmInstance>>,
    state_stack: Vec<RuntimeSnapshot>,
}

impl Default for RuntimeContext {
    fn default() -> Self {
        RuntimeContext::new()
    }
}

impl RuntimeContext {
    /// Creates an empty runtime context.
    pub fn new() -> Self {
        RuntimeContext {
            vm_input: VmInput::default(),
            storage_address: Address::zero(),
            status: FrameStatus::Created,
            async_call_info: None,
            instance: None,
            instance_stack: Vec::new(),
            state_stack: Vec::new(),
        }
    }

    /// Resets the per-transaction pieces; stacks are cleared separately by
    /// [`clear_state_stack`](Self::clear_state_stack).
    pub fn init_state(&mut self) {
        self.vm_input = VmInput::default();
        self.storage_address = Address::zero();
        self.status = FrameStatus::Created;
        self.async_call_info = None;
        self.instance = None;
    }

    /// Installs the input of a fresh frame.
    pub fn init_from_input(&mut self, input: VmInput) {
        self.storage_address = input.recipient;
        self.vm_input = input;
        self.status = FrameStatus::Created;
        self.async_call_info = None;
    }

    /// The current frame's input.
    pub fn vm_input(&self) -> &VmInput {
        &self.vm_input
    }

    /// The account whose storage and balance the frame acts upon.
    pub fn storage_address(&self) -> Address {
        self.storage_address
    }

    /// Redirects storage and output effects to `address`; used by
    /// same-context execution.
    pub fn set_storage_address(&mut self, address: Address) {
        self.storage_address = address;
    }

    /// The current frame status.
    pub fn status(&self) -> FrameStatus {
        self.status
    }

    /// Advances the frame status.
    pub fn set_status(&mut self, status: FrameStatus) {
        self.status = status;
    }

    /// Stores the continuation of a pending asynchronous call.
    pub fn set_async_call_info(&mut self, info: AsyncCallInfo) {
        self.async_call_info = Some(info);
    }

    /// Removes and returns the pending asynchronous call, if any.
    pub fn take_async_call_info(&mut self) -> Option<AsyncCallInfo> {
        self.async_call_info.take()
    }

    /// Number of arguments of the current call.
    pub fn num_arguments(&self) -> i32 {
        self.vm_input.arguments.len() as i32
    }

    /// Returns argument `index`, failing when it is out of range.
    pub fn argument(&self, index: i32) -> Result<&[u8], ExecutionError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.vm_input.arguments.get(i))
            .map(|argument| argument.as_slice())
            .ok_or_else(|| {
                ExecutionError::ArgumentOutOfRange(format!("argument index {} out of range", index))
            })
    }

    /// Installs the instance of a freshly instantiated module.
    pub fn set_instance(&mut self, instance: WasmInstance) {
        self.instance = Some(instance);
        self.status = FrameStatus::Instantiated;
    }

    /// The running instance, if any.
    pub fn instance(&self) -> Option<&WasmInstance> {
        self.instance.as_ref()
    }

    /// Saves the current instance before a nested call replaces it.
    pub fn push_instance(&mut self) {
        self.instance_stack.push(self.instance.take());
    }

    /// Restores the parent frame's instance.
    pub fn pop_instance(&mut self) {
        if let Some(previous) = self.instance_stack.pop() {
            self.instance = previous;
        }
    }

    /// Depth of the nested-call stack.
    pub fn call_depth(&self) -> u32 {
        self.instance_stack.len() as u32
    }

    /// Drops every saved instance; used at transaction end.
    pub fn clear_instance_stack(&mut self) {
        self.instance_stack.clear();
        self.instance = None;
    }

    /// Snapshots the frame-local pieces of the runtime state.
    pub fn push_state(&mut self) {
        self.state_stack.push(RuntimeSnapshot {
            vm_input: self.vm_input.clone(),
            storage_address: self.storage_address,
            status: self.status,
            async_call_info: self.async_call_info.clone(),
        });
    }

    /// Restores the most recent snapshot.
    pub fn pop_set_active_state(&mut self) {
        if let Some(previous) = self.state_stack.pop() {
            self.vm_input = previous.vm_input;
            self.storage_address = previous.storage_address;
            self.status = previous.status;
            self.async_call_info = previous.async_call_info;
        }
    }

    /// Drops the most recent snapshot.
    pub fn pop_discard(&mut self) {
        self.state_stack.pop();
    }

    /// Empties the snapshot stack.
    pub fn clear_state_stack(&mut self) {
        self.state_stack.clear();
    }

    fn memory(&self) -> Result<&MemoryRef, ExecutionError> {
        self.instance
            .as_ref()
            .map(|instance| &instance.memory)
            .ok_or_else(|| ExecutionError::Interpreter("no running instance".into()))
    }

    /// Copies `length` bytes out of the instance's linear memory.
    pub fn mem_load(&self, offset: i32, length: i32) -> Result<Vec<u8>, ExecutionError> {
        let offset =
            u32::try_from(offset).map_err(|_| ExecutionError::MemoryBoundsExceeded)?;
        let length =
            usize::try_from(length).map_err(|_| ExecutionError::MemoryBoundsExceeded)?;
        self.memory()?
            .get(offset, length)
            .map_err(|_| ExecutionError::MemoryBoundsExceeded)
    }

    /// Copies `data` into the instance's linear memory at `offset`.
    pub fn mem_store(&self, offset: i32, data: &[u8]) -> Result<(), ExecutionError> {
        let offset =
            u32::try_from(offset).map_err(|_| ExecutionError::MemoryBoundsExceeded)?;
        self.memory()?
            .set(offset, data)
            .map_err(|_| ExecutionError::MemoryBoundsExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with_args(arguments: Vec<Vec<u8>>) -> VmInput {
        VmInput {
            arguments,
            ..VmInput::default()
        }
    }

    #[test]
    fn should_reject_out_of_range_arguments() {
        let mut runtime = RuntimeContext::new();
        runtime.init_from_input(input_with_args(vec![b"a".to_vec()]));
        assert!(runtime.argument(0).is_ok());
        assert!(matches!(
            runtime.argument(1),
            Err(ExecutionError::ArgumentOutOfRange(_))
        ));
        assert!(matches!(
            runtime.argument(-1),
            Err(ExecutionError::ArgumentOutOfRange(_))
        ));
    }

    #[test]
    fn should_restore_input_on_pop() {
        let mut runtime = RuntimeContext::new();
        runtime.init_from_input(VmInput {
            function: "parent".into(),
            ..VmInput::default()
        });

        runtime.push_state();
        runtime.init_from_input(VmInput {
            function: "child".into(),
            ..VmInput::default()
        });
        assert_eq!(runtime.vm_input().function, "child");
        runtime.pop_set_active_state();
        assert_eq!(runtime.vm_input().function, "parent");
    }

    #[test]
    fn instance_stack_depth_tracks_nesting() {
        let mut runtime = RuntimeContext::new();
        assert_eq!(runtime.call_depth(), 0);
        runtime.push_instance();
        runtime.push_instance();
        assert_eq!(runtime.call_depth(), 2);
        runtime.pop_instance();
        assert_eq!(runtime.call_depth(), 1);
        runtime.clear_instance_stack();
        assert_eq!(runtime.call_depth(), 0);
    }

    #[test]
    fn mem_access_without_instance_fails() {
        let runtime = RuntimeContext::new();
        assert!(runtime.mem_load(0, 4).is_err());
        assert!(runtime.mem_store(0, b"data").is_err());
    }
}
