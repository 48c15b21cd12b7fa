//! Accumulation of the transaction's observable product.
//!
//! Return data, logs, balance and nonce deltas, created accounts and
//! transfers all land here in program order. `push_state` records the whole
//! accumulated output; `pop_set_active_state` restores it verbatim after a
//! failed nested call, while a successful isolated child is folded back in
//! with [`OutputContext::merge_after_nested_call`].

use num_bigint::{BigInt, BigUint};

use vela_types::{
    Address, CallType, CodeMetadata, LogEntry, OutputAccount, OutputTransfer, ReturnCode, VmOutput,
};

/// Accumulates one transaction's output.
#[derive(Debug, Default)]
pub struct OutputContext {
    output: VmOutput,
    state_stack: Vec<VmOutput>,
}

impl OutputContext {
    /// Creates an empty output accumulator.
    pub fn new() -> Self {
        OutputContext::default()
    }

    /// Drops all accumulated output.
    pub fn init_state(&mut self) {
        self.output = VmOutput::default();
    }

    /// Snapshots the accumulated output.
    pub fn push_state(&mut self) {
        self.state_stack.push(self.output.clone());
    }

    /// Restores the most recent snapshot verbatim.
    pub fn pop_set_active_state(&mut self) {
        if let Some(previous) = self.state_stack.pop() {
            self.output = previous;
        }
    }

    /// Drops the most recent snapshot, keeping the accumulated output.
    pub fn pop_discard(&mut self) {
        self.state_stack.pop();
    }

    /// Empties the snapshot stack.
    pub fn clear_state_stack(&mut self) {
        self.state_stack.clear();
    }

    /// Returns the change-set for `address`, creating it on first touch.
    pub fn account_mut(&mut self, address: &Address) -> &mut OutputAccount {
        self.output
            .output_accounts
            .entry(*address)
            .or_insert_with(|| OutputAccount::new(*address))
    }

    /// Appends one return-data chunk.
    pub fn finish(&mut self, data: Vec<u8>) {
        self.output.return_data.push(data);
    }

    /// Appends one log entry.
    pub fn write_log(&mut self, address: Address, topics: Vec<Vec<u8>>, data: Vec<u8>) {
        self.output.logs.push(LogEntry {
            address,
            topics,
            data,
        });
    }

    /// Records a value transfer: sender is debited, receiver credited, and
    /// the transfer itself lands on the receiver in program order.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        value: BigUint,
        data: Vec<u8>,
        call_type: CallType,
    ) {
        let signed: BigInt = value.clone().into();
        self.account_mut(&from).balance_delta -= signed.clone();
        let receiver = self.account_mut(&to);
        receiver.balance_delta += signed;
        receiver.output_transfers.push(OutputTransfer {
            sender: from,
            value,
            data,
            call_type,
        });
    }

    /// Records a value transfer with no payload.
    pub fn transfer_value_only(&mut self, from: Address, to: Address, value: BigUint) {
        self.transfer(from, to, value, Vec::new(), CallType::DirectCall);
    }

    /// The pending balance change of `address`, zero when untouched.
    pub fn balance_delta(&self, address: &Address) -> BigInt {
        self.output
            .output_accounts
            .get(address)
            .map(|account| account.balance_delta.clone())
            .unwrap_or_default()
    }

    /// Registers a newly deployed account with its code.
    pub fn deploy_code(&mut self, address: Address, code: Vec<u8>, metadata: CodeMetadata) {
        let account = self.account_mut(&address);
        account.code = Some(code);
        account.code_metadata = Some(metadata);
    }

    /// Attaches the continuation descriptor of a suspended asynchronous call
    /// to its destination account.
    pub fn set_async_call_data(&mut self, address: Address, data: Vec<u8>) {
        self.account_mut(&address).async_call_data = Some(data);
    }

    /// Marks an account deleted.
    pub fn self_destruct(&mut self, address: Address) {
        self.output.deleted_accounts.push(address);
    }

    /// Sets the final status of the transaction.
    pub fn set_return_code(&mut self, code: ReturnCode, message: impl Into<String>) {
        self.output.return_code = code;
        self.output.return_message = message.into();
    }

    /// Credits the storage-release refund accumulator.
    pub fn add_gas_refund(&mut self, amount: u64) {
        self.output.gas_refund += BigUint::from(amount);
    }

    /// Number of return-data chunks accumulated so far; used to carve out a
    /// nested call's own chunks.
    pub fn return_data_len(&self) -> usize {
        self.output.return_data.len()
    }

    /// Read access to the return data accumulated so far.
    pub fn return_data(&self) -> &[Vec<u8>] {
        &self.output.return_data
    }

    /// Folds a successful isolated child frame's output into the parent,
    /// preserving program order.
    pub fn merge_after_nested_call(&mut self, child: VmOutput) {
        for (address, account) in child.output_accounts {
            self.account_mut(&address).merge(account);
        }
        self.output.return_data.extend(child.return_data);
        self.output.logs.extend(child.logs);
        self.output.deleted_accounts.extend(child.deleted_accounts);
        self.output.gas_refund += child.gas_refund;
    }

    /// Takes the accumulated output, stamping the final gas figures.
    pub fn take_vm_output(&mut self, gas_remaining: u64) -> VmOutput {
        let mut output = std::mem::take(&mut self.output);
        output.gas_remaining = gas_remaining;
        output
    }

    /// Read access to the accumulated output.
    pub fn vm_output(&self) -> &VmOutput {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    #[test]
    fn should_preserve_insertion_order_of_return_data_and_logs() {
        let mut output = OutputContext::new();
        output.finish(b"one".to_vec());
        output.finish(b"two".to_vec());
        output.write_log(addr(1), vec![b"t".to_vec()], b"first".to_vec());
        output.write_log(addr(1), vec![], b"second".to_vec());

        let result = output.take_vm_output(0);
        assert_eq!(result.return_data, vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(result.logs[0].data, b"first".to_vec());
        assert_eq!(result.logs[1].data, b"second".to_vec());
    }

    #[test]
    fn should_balance_transfers() {
        let mut output = OutputContext::new();
        output.transfer_value_only(addr(1), addr(2), BigUint::from(42u32));

        assert_eq!(output.balance_delta(&addr(1)), BigInt::from(-42));
        assert_eq!(output.balance_delta(&addr(2)), BigInt::from(42));
        let result = output.take_vm_output(0);
        assert_eq!(result.output_accounts[&addr(2)].output_transfers.len(), 1);
    }

    #[test]
    fn push_mutate_pop_is_identity() {
        let mut output = OutputContext::new();
        output.finish(b"kept".to_vec());

        output.push_state();
        output.finish(b"dropped".to_vec());
        output.write_log(addr(3), vec![], b"dropped".to_vec());
        output.transfer_value_only(addr(1), addr(2), BigUint::from(9u32));
        output.pop_set_active_state();

        let result = output.take_vm_output(0);
        assert_eq!(result.return_data, vec![b"kept".to_vec()]);
        assert!(result.logs.is_empty());
        assert!(result.output_accounts.is_empty());
    }

    proptest::proptest! {
        #[test]
        fn push_random_ops_pop_is_identity(
            chunks in proptest::collection::vec(proptest::collection::vec(0u8..=255, 0..6), 0..5),
            shadow_chunks in proptest::collection::vec(proptest::collection::vec(0u8..=255, 0..6), 1..5),
        ) {
            let mut output = OutputContext::new();
            for chunk in &chunks {
                output.finish(chunk.clone());
            }
            let before = output.vm_output().clone();

            output.push_state();
            for chunk in &shadow_chunks {
                output.finish(chunk.clone());
                output.write_log(addr(9), vec![chunk.clone()], chunk.clone());
                output.transfer_value_only(addr(1), addr(2), BigUint::from(1u32));
            }
            output.pop_set_active_state();

            proptest::prop_assert_eq!(&before, output.vm_output());
        }
    }

    #[test]
    fn should_merge_child_output_in_order() {
        let mut parent = OutputContext::new();
        parent.finish(b"parent".to_vec());
        parent.account_mut(&addr(1)).nonce_delta = 1;

        let mut child = OutputContext::new();
        child.finish(b"child".to_vec());
        child.account_mut(&addr(1)).nonce_delta = 2;
        child.write_log(addr(1), vec![], b"log".to_vec());
        let child_output = child.take_vm_output(0);

        parent.merge_after_nested_call(child_output);
        let result = parent.take_vm_output(0);
        assert_eq!(
            result.return_data,
            vec![b"parent".to_vec(), b"child".to_vec()]
        );
        assert_eq!(result.output_accounts[&addr(1)].nonce_delta, 3);
        assert_eq!(result.logs.len(), 1);
    }
}
