//! The big-integer arena.
//!
//! Contracts never hold arbitrary-precision values directly; they hold dense
//! non-negative handles into this arena. Handles are only valid within the
//! frame that created them and are never reindexed while the frame lives.

use num_bigint::{BigInt, Sign};

/// Handle type exposed across the ABI boundary.
pub type BigIntHandle = i32;

/// A numbered arena of arbitrary-precision integers with a snapshot stack.
#[derive(Debug, Default)]
pub struct BigIntContext {
    values: Vec<BigInt>,
    state_stack: Vec<Vec<BigInt>>,
}

impl BigIntContext {
    /// Creates an empty arena.
    pub fn new() -> Self {
        BigIntContext::default()
    }

    /// Drops all values; handles from before this call are dead.
    pub fn init_state(&mut self) {
        self.values.clear();
    }

    /// Snapshots the whole arena.
    pub fn push_state(&mut self) {
        self.state_stack.push(self.values.clone());
    }

    /// Restores the most recent snapshot, invalidating every handle created
    /// since the matching [`push_state`](Self::push_state).
    pub fn pop_set_active_state(&mut self) {
        if let Some(previous) = self.state_stack.pop() {
            self.values = previous;
        }
    }

    /// Drops the most recent snapshot, keeping the current values.
    pub fn pop_discard(&mut self) {
        self.state_stack.pop();
    }

    /// Empties the snapshot stack.
    pub fn clear_state_stack(&mut self) {
        self.state_stack.clear();
    }

    /// Allocates a zero value and returns its handle.
    pub fn new_handle(&mut self) -> BigIntHandle {
        self.insert(BigInt::default())
    }

    /// Allocates `value` and returns its handle.
    pub fn insert(&mut self, value: BigInt) -> BigIntHandle {
        self.values.push(value);
        (self.values.len() - 1) as BigIntHandle
    }

    /// Reads the value behind `handle`; dangling handles read as zero, the
    /// way uninitialized storage reads as empty.
    pub fn value(&self, handle: BigIntHandle) -> BigInt {
        self.get(handle).cloned().unwrap_or_default()
    }

    fn get(&self, handle: BigIntHandle) -> Option<&BigInt> {
        usize::try_from(handle).ok().and_then(|i| self.values.get(i))
    }

    /// Replaces the value behind `handle`, allocating intermediate zero
    /// values if the handle was never issued.
    pub fn set_value(&mut self, handle: BigIntHandle, value: BigInt) {
        let index = match usize::try_from(handle) {
            Ok(index) => index,
            Err(_) => return,
        };
        if index >= self.values.len() {
            self.values.resize(index + 1, BigInt::default());
        }
        self.values[index] = value;
    }

    /// Big-endian unsigned bytes of the value; empty for zero.
    pub fn unsigned_bytes(&self, handle: BigIntHandle) -> Vec<u8> {
        let value = self.value(handle);
        let (_, bytes) = value.to_bytes_be();
        if value.sign() == Sign::NoSign {
            Vec::new()
        } else {
            bytes
        }
    }

    /// Two's-complement big-endian bytes of the value.
    pub fn signed_bytes(&self, handle: BigIntHandle) -> Vec<u8> {
        self.value(handle).to_signed_bytes_be()
    }

    /// Sets the value from big-endian unsigned bytes.
    pub fn set_unsigned_bytes(&mut self, handle: BigIntHandle, bytes: &[u8]) {
        self.set_value(handle, BigInt::from_bytes_be(Sign::Plus, bytes));
    }

    /// Sets the value from two's-complement big-endian bytes.
    pub fn set_signed_bytes(&mut self, handle: BigIntHandle, bytes: &[u8]) {
        self.set_value(handle, BigInt::from_signed_bytes_be(bytes));
    }

    /// Number of live values, used by snapshot tests.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the arena holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn should_issue_dense_handles() {
        let mut context = BigIntContext::new();
        assert_eq!(context.new_handle(), 0);
        assert_eq!(context.insert(BigInt::from(42)), 1);
        assert_eq!(context.insert(BigInt::from(-7)), 2);
        assert_eq!(context.value(1), BigInt::from(42));
    }

    #[test]
    fn should_read_dangling_handles_as_zero() {
        let context = BigIntContext::new();
        assert_eq!(context.value(99), BigInt::default());
        assert_eq!(context.value(-1), BigInt::default());
    }

    #[test]
    fn should_restore_snapshot_on_pop() {
        let mut context = BigIntContext::new();
        let handle = context.insert(BigInt::from(7));

        context.push_state();
        context.set_value(handle, BigInt::from(9));
        context.insert(BigInt::from(100));
        context.pop_set_active_state();

        assert_eq!(context.value(handle), BigInt::from(7));
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn should_keep_mutations_on_discard() {
        let mut context = BigIntContext::new();
        let handle = context.insert(BigInt::from(7));

        context.push_state();
        context.set_value(handle, BigInt::from(9));
        context.pop_discard();

        assert_eq!(context.value(handle), BigInt::from(9));
    }

    proptest! {
        #[test]
        fn push_ops_pop_is_identity(values in proptest::collection::vec(-1000i64..1000, 0..8)) {
            let mut context = BigIntContext::new();
            for value in &values {
                context.insert(BigInt::from(*value));
            }
            let before: Vec<_> = (0..context.len() as i32).map(|h| context.value(h)).collect();

            context.push_state();
            context.new_handle();
            context.set_value(0, BigInt::from(123456));
            context.pop_set_active_state();

            let after: Vec<_> = (0..context.len() as i32).map(|h| context.value(h)).collect();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn unsigned_bytes_round_trip(value in 0u64..u64::MAX) {
            let mut context = BigIntContext::new();
            let handle = context.insert(BigInt::from(value));
            let bytes = context.unsigned_bytes(handle);
            let other = context.new_handle();
            context.set_unsigned_bytes(other, &bytes);
            prop_assert_eq!(context.value(handle), context.value(other));
        }

        #[test]
        fn signed_bytes_round_trip(value in i64::MIN..i64::MAX) {
            let mut context = BigIntContext::new();
            let handle = context.insert(BigInt::from(value));
            let bytes = context.signed_bytes(handle);
            let other = context.new_handle();
            context.set_signed_bytes(other, &bytes);
            prop_assert_eq!(context.value(handle), context.value(other));
        }
    }
}
