//! Big-integer host functions.
//!
//! Contracts operate on dense handles; values never cross the ABI boundary
//! except as copied big-endian bytes.

use num_bigint::{BigInt, Sign};
use num_traits::{Pow, Signed, ToPrimitive, Zero};

use vela_types::{BlockchainHook, CryptoHook};

use crate::{
    config::GasSchedule,
    contexts::BigIntHandle,
    execution::ExecutionError,
};

use super::Runtime;

impl<'a, B: BlockchainHook, C: CryptoHook> Runtime<'a, B, C> {
    pub(crate) fn big_int_new(&mut self, initial: i64) -> Result<i32, ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_new;
        self.charge(cost)?;
        Ok(self.host.big_int.insert(BigInt::from(initial)))
    }

    pub(crate) fn big_int_unsigned_byte_length(
        &mut self,
        handle: BigIntHandle,
    ) -> Result<i32, ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_byte_length;
        self.charge(cost)?;
        Ok(self.host.big_int.unsigned_bytes(handle).len() as i32)
    }

    pub(crate) fn big_int_signed_byte_length(
        &mut self,
        handle: BigIntHandle,
    ) -> Result<i32, ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_byte_length;
        self.charge(cost)?;
        Ok(self.host.big_int.signed_bytes(handle).len() as i32)
    }

    pub(crate) fn big_int_get_unsigned_bytes(
        &mut self,
        handle: BigIntHandle,
        result_offset: i32,
    ) -> Result<i32, ExecutionError> {
        if self.host.big_int.value(handle).is_negative() {
            return Err(ExecutionError::ArgumentOutOfRange(
                "negative value where unsigned required".into(),
            ));
        }
        let bytes = self.host.big_int.unsigned_bytes(handle);
        let cost = GasSchedule::dynamic_cost(
            self.schedule().big_int_api_cost.big_int_get_bytes,
            bytes.len(),
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;
        self.mem_store(result_offset, &bytes)?;
        Ok(bytes.len() as i32)
    }

    pub(crate) fn big_int_get_signed_bytes(
        &mut self,
        handle: BigIntHandle,
        result_offset: i32,
    ) -> Result<i32, ExecutionError> {
        let bytes = self.host.big_int.signed_bytes(handle);
        let cost = GasSchedule::dynamic_cost(
            self.schedule().big_int_api_cost.big_int_get_bytes,
            bytes.len(),
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;
        self.mem_store(result_offset, &bytes)?;
        Ok(bytes.len() as i32)
    }

    pub(crate) fn big_int_set_unsigned_bytes(
        &mut self,
        handle: BigIntHandle,
        data_offset: i32,
        length: i32,
    ) -> Result<(), ExecutionError> {
        let size = usize::try_from(length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().big_int_api_cost.big_int_set_bytes,
            size,
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;
        let bytes = self.mem_load(data_offset, length)?;
        self.host.big_int.set_unsigned_bytes(handle, &bytes);
        Ok(())
    }

    pub(crate) fn big_int_set_signed_bytes(
        &mut self,
        handle: BigIntHandle,
        data_offset: i32,
        length: i32,
    ) -> Result<(), ExecutionError> {
        let size = usize::try_from(length)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative data length".into()))?;
        let cost = GasSchedule::dynamic_cost(
            self.schedule().big_int_api_cost.big_int_set_bytes,
            size,
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;
        let bytes = self.mem_load(data_offset, length)?;
        self.host.big_int.set_signed_bytes(handle, &bytes);
        Ok(())
    }

    pub(crate) fn big_int_is_int64(&mut self, handle: BigIntHandle) -> Result<i32, ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_is_int64;
        self.charge(cost)?;
        Ok(self.host.big_int.value(handle).to_i64().is_some() as i32)
    }

    pub(crate) fn big_int_get_int64(
        &mut self,
        handle: BigIntHandle,
    ) -> Result<i64, ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_get_int64;
        self.charge(cost)?;
        self.host
            .big_int
            .value(handle)
            .to_i64()
            .ok_or_else(|| {
                ExecutionError::ArgumentOutOfRange("value does not fit in 64 bits".into())
            })
    }

    pub(crate) fn big_int_set_int64(
        &mut self,
        handle: BigIntHandle,
        value: i64,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_set_int64;
        self.charge(cost)?;
        self.host.big_int.set_value(handle, BigInt::from(value));
        Ok(())
    }

    pub(crate) fn big_int_add(
        &mut self,
        dest: BigIntHandle,
        op1: BigIntHandle,
        op2: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_add;
        self.charge(cost)?;
        let result = self.host.big_int.value(op1) + self.host.big_int.value(op2);
        self.host.big_int.set_value(dest, result);
        Ok(())
    }

    pub(crate) fn big_int_sub(
        &mut self,
        dest: BigIntHandle,
        op1: BigIntHandle,
        op2: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_sub;
        self.charge(cost)?;
        let result = self.host.big_int.value(op1) - self.host.big_int.value(op2);
        self.host.big_int.set_value(dest, result);
        Ok(())
    }

    pub(crate) fn big_int_mul(
        &mut self,
        dest: BigIntHandle,
        op1: BigIntHandle,
        op2: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_mul;
        self.charge(cost)?;
        let result = self.host.big_int.value(op1) * self.host.big_int.value(op2);
        self.host.big_int.set_value(dest, result);
        Ok(())
    }

    pub(crate) fn big_int_t_div(
        &mut self,
        dest: BigIntHandle,
        op1: BigIntHandle,
        op2: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_t_div;
        self.charge(cost)?;
        let divisor = self.host.big_int.value(op2);
        if divisor.is_zero() {
            return Err(ExecutionError::ArgumentOutOfRange("division by zero".into()));
        }
        let result = self.host.big_int.value(op1) / divisor;
        self.host.big_int.set_value(dest, result);
        Ok(())
    }

    pub(crate) fn big_int_t_mod(
        &mut self,
        dest: BigIntHandle,
        op1: BigIntHandle,
        op2: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_t_mod;
        self.charge(cost)?;
        let divisor = self.host.big_int.value(op2);
        if divisor.is_zero() {
            return Err(ExecutionError::ArgumentOutOfRange("division by zero".into()));
        }
        let result = self.host.big_int.value(op1) % divisor;
        self.host.big_int.set_value(dest, result);
        Ok(())
    }

    pub(crate) fn big_int_pow(
        &mut self,
        dest: BigIntHandle,
        op1: BigIntHandle,
        op2: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_pow;
        self.charge(cost)?;
        let exponent = self
            .host
            .big_int
            .value(op2)
            .to_u32()
            .ok_or_else(|| ExecutionError::ArgumentOutOfRange("exponent out of range".into()))?;
        let result = Pow::pow(self.host.big_int.value(op1), exponent);
        self.host.big_int.set_value(dest, result);
        Ok(())
    }

    pub(crate) fn big_int_shl(
        &mut self,
        dest: BigIntHandle,
        op: BigIntHandle,
        bits: i32,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_shift;
        self.charge(cost)?;
        let bits = usize::try_from(bits)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative shift amount".into()))?;
        let result = self.host.big_int.value(op) << bits;
        self.host.big_int.set_value(dest, result);
        Ok(())
    }

    pub(crate) fn big_int_shr(
        &mut self,
        dest: BigIntHandle,
        op: BigIntHandle,
        bits: i32,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_shift;
        self.charge(cost)?;
        let bits = usize::try_from(bits)
            .map_err(|_| ExecutionError::ArgumentOutOfRange("negative shift amount".into()))?;
        let result = self.host.big_int.value(op) >> bits;
        self.host.big_int.set_value(dest, result);
        Ok(())
    }

    pub(crate) fn big_int_abs(
        &mut self,
        dest: BigIntHandle,
        op: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_abs;
        self.charge(cost)?;
        let result = self.host.big_int.value(op).abs();
        self.host.big_int.set_value(dest, result);
        Ok(())
    }

    pub(crate) fn big_int_neg(
        &mut self,
        dest: BigIntHandle,
        op: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_neg;
        self.charge(cost)?;
        let result = -self.host.big_int.value(op);
        self.host.big_int.set_value(dest, result);
        Ok(())
    }

    pub(crate) fn big_int_sign(&mut self, op: BigIntHandle) -> Result<i32, ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_sign;
        self.charge(cost)?;
        Ok(match self.host.big_int.value(op).sign() {
            Sign::Minus => -1,
            Sign::NoSign => 0,
            Sign::Plus => 1,
        })
    }

    pub(crate) fn big_int_cmp(
        &mut self,
        op1: BigIntHandle,
        op2: BigIntHandle,
    ) -> Result<i32, ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_cmp;
        self.charge(cost)?;
        Ok(match self.host.big_int.value(op1).cmp(&self.host.big_int.value(op2)) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        })
    }

    pub(crate) fn big_int_finish_unsigned(
        &mut self,
        handle: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        if self.host.big_int.value(handle).is_negative() {
            return Err(ExecutionError::ArgumentOutOfRange(
                "negative value where unsigned required".into(),
            ));
        }
        let bytes = self.host.big_int.unsigned_bytes(handle);
        let cost = GasSchedule::dynamic_cost(
            self.schedule().big_int_api_cost.big_int_finish,
            bytes.len(),
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;
        self.host.output.finish(bytes);
        Ok(())
    }

    pub(crate) fn big_int_finish_signed(
        &mut self,
        handle: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let bytes = self.host.big_int.signed_bytes(handle);
        let cost = GasSchedule::dynamic_cost(
            self.schedule().big_int_api_cost.big_int_finish,
            bytes.len(),
            self.schedule().base_operation_cost.data_copy_per_byte,
        );
        self.charge(cost)?;
        self.host.output.finish(bytes);
        Ok(())
    }

    pub(crate) fn big_int_storage_store_unsigned(
        &mut self,
        key_offset: i32,
        handle: BigIntHandle,
    ) -> Result<i32, ExecutionError> {
        if self.host.big_int.value(handle).is_negative() {
            return Err(ExecutionError::ArgumentOutOfRange(
                "negative value where unsigned required".into(),
            ));
        }
        let bytes = self.host.big_int.unsigned_bytes(handle);
        let cost = GasSchedule::dynamic_cost(
            self.schedule().big_int_api_cost.big_int_storage_store,
            bytes.len(),
            self.schedule().base_operation_cost.store_per_byte,
        );
        self.charge(cost)?;
        let key = self.load_storage_key(key_offset)?;
        self.set_storage(&key, &bytes)
    }

    pub(crate) fn big_int_storage_load_unsigned(
        &mut self,
        key_offset: i32,
        handle: BigIntHandle,
    ) -> Result<i32, ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_storage_load;
        self.charge(cost)?;
        let key = self.load_storage_key(key_offset)?;
        let address = self.host.runtime.storage_address();
        let bytes =
            self.host
                .storage
                .get_storage(self.host.blockchain.hook(), &address, &key)?;
        self.host.big_int.set_unsigned_bytes(handle, &bytes);
        Ok(bytes.len() as i32)
    }

    pub(crate) fn big_int_get_unsigned_argument(
        &mut self,
        index: i32,
        handle: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_get_argument;
        self.charge(cost)?;
        let argument = self.host.runtime.argument(index)?.to_vec();
        self.host.big_int.set_unsigned_bytes(handle, &argument);
        Ok(())
    }

    pub(crate) fn big_int_get_signed_argument(
        &mut self,
        index: i32,
        handle: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_get_argument;
        self.charge(cost)?;
        let argument = self.host.runtime.argument(index)?.to_vec();
        self.host.big_int.set_signed_bytes(handle, &argument);
        Ok(())
    }

    pub(crate) fn big_int_get_call_value(
        &mut self,
        handle: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self.schedule().big_int_api_cost.big_int_get_call_value;
        self.charge(cost)?;
        let value: BigInt = self.host.runtime.vm_input().call_value.clone().into();
        self.host.big_int.set_value(handle, value);
        Ok(())
    }

    pub(crate) fn big_int_get_external_balance(
        &mut self,
        address_offset: i32,
        handle: BigIntHandle,
    ) -> Result<(), ExecutionError> {
        let cost = self
            .schedule()
            .big_int_api_cost
            .big_int_get_external_balance;
        self.charge(cost)?;
        let address = self.load_address(address_offset)?;
        let balance: BigInt = self.host.blockchain.get_balance(&address)?.into();
        self.host.big_int.set_value(handle, balance);
        Ok(())
    }
}
