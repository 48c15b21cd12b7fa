//! Per-frame gas accounting.
//!
//! Every host callback charges gas *before* performing work; the injected
//! opcode counter routes through here as well. The parent's counter is
//! snapshotted around nested calls and restored whatever the child's
//! outcome; successful children hand back their leftover via
//! [`MeteringContext::refund_gas`].

use std::sync::Arc;

use tracing::debug;

use crate::{config::GasSchedule, execution::ExecutionError};

#[derive(Clone, Copy, Debug, Default)]
struct MeteringState {
    gas_provided: u64,
    gas_left: u64,
    gas_locked: u64,
}

/// Holds remaining gas for the current frame, the block gas limit and the
/// cost schedule.
#[derive(Debug)]
pub struct MeteringContext {
    gas_schedule: Arc<GasSchedule>,
    block_gas_limit: u64,
    state: MeteringState,
    state_stack: Vec<MeteringState>,
}

impl MeteringContext {
    /// Creates a metering context bound to `gas_schedule`.
    pub fn new(gas_schedule: Arc<GasSchedule>, block_gas_limit: u64) -> Self {
        MeteringContext {
            gas_schedule,
            block_gas_limit,
            state: MeteringState::default(),
            state_stack: Vec::new(),
        }
    }

    /// The immutable cost schedule.
    pub fn gas_schedule(&self) -> &GasSchedule {
        &self.gas_schedule
    }

    /// The maximum gas a single transaction may use.
    pub fn block_gas_limit(&self) -> u64 {
        self.block_gas_limit
    }

    /// Resets the counter for a new frame.
    ///
    /// Fails with [`ExecutionError::NotEnoughGas`] when more gas is provided
    /// than the block allows.
    pub fn init_for_call(&mut self, gas_provided: u64) -> Result<(), ExecutionError> {
        if gas_provided > self.block_gas_limit {
            return Err(ExecutionError::NotEnoughGas);
        }
        self.state = MeteringState {
            gas_provided,
            gas_left: gas_provided,
            gas_locked: 0,
        };
        Ok(())
    }

    /// Snapshots the counter.
    pub fn push_state(&mut self) {
        self.state_stack.push(self.state);
    }

    /// Restores the most recent snapshot.
    pub fn pop_set_active_state(&mut self) {
        if let Some(previous) = self.state_stack.pop() {
            self.state = previous;
        }
    }

    /// Drops the most recent snapshot, keeping the current counter.
    pub fn pop_discard(&mut self) {
        self.state_stack.pop();
    }

    /// Empties the snapshot stack.
    pub fn clear_state_stack(&mut self) {
        self.state_stack.clear();
    }

    /// Charges `amount` gas, failing with [`ExecutionError::GasLimit`] when
    /// the frame's remaining gas does not cover it. On failure the remaining
    /// gas drops to zero: an out-of-gas frame consumes everything.
    pub fn use_gas(&mut self, amount: u64) -> Result<(), ExecutionError> {
        match self.state.gas_left.checked_sub(amount) {
            Some(left) => {
                self.state.gas_left = left;
                Ok(())
            }
            None => {
                debug!(amount, gas_left = self.state.gas_left, "gas exhausted");
                self.state.gas_left = 0;
                Err(ExecutionError::GasLimit)
            }
        }
    }

    /// Reserves `amount` gas, unavailable to the current frame but returned
    /// by [`unfreeze_gas`](Self::unfreeze_gas) on successful completion.
    pub fn freeze_gas(&mut self, amount: u64) -> Result<(), ExecutionError> {
        self.use_gas(amount)?;
        self.state.gas_locked += amount;
        Ok(())
    }

    /// Returns all frozen gas to the frame.
    pub fn unfreeze_gas(&mut self) {
        self.state.gas_left += std::mem::take(&mut self.state.gas_locked);
    }

    /// The gas currently frozen for a pending asynchronous callback.
    pub fn gas_locked(&self) -> u64 {
        self.state.gas_locked
    }

    /// Credits gas back to the frame, e.g. a nested call's leftover.
    pub fn refund_gas(&mut self, amount: u64) {
        self.state.gas_left = self.state.gas_left.saturating_add(amount);
    }

    /// Gas still available to the frame.
    pub fn gas_left(&self) -> u64 {
        self.state.gas_left
    }

    /// Gas consumed by the frame so far, frozen gas included.
    pub fn gas_used(&self) -> u64 {
        self.state
            .gas_provided
            .saturating_sub(self.state.gas_left)
            .saturating_sub(self.state.gas_locked)
    }

    /// The difference between the gas provided to a nested call and what it
    /// returned.
    pub fn gas_used_by_child(&self, gas_provided: u64, gas_returned: u64) -> u64 {
        gas_provided.saturating_sub(gas_returned)
    }

    /// Charges the up-front cost of running `code_len` bytes of contract
    /// code: the invocation base plus the per-byte preparation rate.
    pub fn deduct_initial_gas(&mut self, base: u64, code_len: usize) -> Result<(), ExecutionError> {
        let cost = GasSchedule::dynamic_cost(
            base,
            code_len,
            self.gas_schedule.base_operation_cost.compile_per_byte,
        );
        self.use_gas(cost).map_err(|_| ExecutionError::NotEnoughGas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with(gas: u64) -> MeteringContext {
        let mut metering = MeteringContext::new(Arc::new(GasSchedule::default()), 1_000_000_000);
        metering.init_for_call(gas).unwrap();
        metering
    }

    #[test]
    fn should_charge_and_report_remaining() {
        let mut metering = context_with(1000);
        metering.use_gas(300).unwrap();
        assert_eq!(metering.gas_left(), 700);
        assert_eq!(metering.gas_used(), 300);
    }

    #[test]
    fn should_fail_and_zero_out_on_exhaustion() {
        let mut metering = context_with(100);
        assert_eq!(metering.use_gas(101), Err(ExecutionError::GasLimit));
        assert_eq!(metering.gas_left(), 0);
    }

    #[test]
    fn should_return_frozen_gas_on_unfreeze() {
        let mut metering = context_with(1000);
        metering.freeze_gas(400).unwrap();
        assert_eq!(metering.gas_left(), 600);
        assert_eq!(metering.gas_locked(), 400);
        assert_eq!(metering.gas_used(), 0);
        metering.unfreeze_gas();
        assert_eq!(metering.gas_left(), 1000);
    }

    #[test]
    fn should_reject_gas_beyond_block_limit() {
        let mut metering = MeteringContext::new(Arc::new(GasSchedule::default()), 500);
        assert_eq!(
            metering.init_for_call(501),
            Err(ExecutionError::NotEnoughGas)
        );
    }

    #[test]
    fn should_restore_parent_counter_on_pop() {
        let mut metering = context_with(1000);
        metering.use_gas(100).unwrap();
        metering.push_state();
        metering.init_for_call(400).unwrap();
        metering.use_gas(400).unwrap();
        metering.pop_set_active_state();
        assert_eq!(metering.gas_left(), 900);
    }

    #[test]
    fn gas_used_plus_remaining_equals_provided() {
        let mut metering = context_with(10_000);
        metering.use_gas(123).unwrap();
        metering.use_gas(4567).unwrap();
        assert_eq!(metering.gas_used() + metering.gas_left(), 10_000);
    }
}
