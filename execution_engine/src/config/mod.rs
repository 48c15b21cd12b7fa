//! Engine configuration: the gas schedule and the wasm limits.
//!
//! The schedule is loaded once at VM construction and is immutable for the
//! lifetime of the host; it can be deserialized from TOML or taken from the
//! built-in defaults.

mod host_costs;
mod opcode_costs;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use host_costs::{BaseOperationCost, BigIntApiCost, CryptoApiCost, EnvApiCost, EthApiCost};
pub use opcode_costs::OpcodeCosts;

/// Default maximum linear memory, in 64 KiB pages.
pub const DEFAULT_MAX_MEMORY_PAGES: u32 = 64;
/// Default maximum wasm operand-stack height enforced by instrumentation.
pub const DEFAULT_MAX_STACK_HEIGHT: u32 = 64 * 1024;
/// Default maximum depth of nested contract calls.
pub const DEFAULT_MAX_CALL_DEPTH: u32 = 10;

/// The complete two-level cost mapping: section → operation → gas.
#[derive(Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct GasSchedule {
    /// Per-byte dynamic rates and invocation base costs.
    pub base_operation_cost: BaseOperationCost,
    /// Environment API section.
    pub env_api_cost: EnvApiCost,
    /// Big-integer API section.
    pub big_int_api_cost: BigIntApiCost,
    /// Ethereum-compatibility API section.
    pub eth_api_cost: EthApiCost,
    /// Cryptographic API section.
    pub crypto_api_cost: CryptoApiCost,
    /// Wasm opcode multipliers fed to the injected gas counter.
    pub wasm_opcode_cost: OpcodeCosts,
}

/// Failure to load a gas schedule from its TOML form.
#[derive(Debug, Error)]
#[error("invalid gas schedule: {0}")]
pub struct GasScheduleError(#[from] toml::de::Error);

impl GasSchedule {
    /// Parses a schedule from its TOML representation.
    pub fn from_toml_str(raw: &str) -> Result<Self, GasScheduleError> {
        Ok(toml::from_str(raw)?)
    }

    /// Computes the dynamic cost `base + bytes * per_byte_rate`, saturating
    /// instead of wrapping so that absurd lengths exhaust gas rather than
    /// underpay.
    pub fn dynamic_cost(base: u64, bytes: usize, per_byte_rate: u64) -> u64 {
        base.saturating_add(per_byte_rate.saturating_mul(bytes as u64))
    }
}

/// Limits applied while preparing and instantiating contract code.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct WasmConfig {
    /// Maximum linear memory in 64 KiB pages.
    pub max_memory: u32,
    /// Maximum operand-stack height enforced by instrumentation.
    pub max_stack_height: u32,
}

impl Default for WasmConfig {
    fn default() -> Self {
        WasmConfig {
            max_memory: DEFAULT_MAX_MEMORY_PAGES,
            max_stack_height: DEFAULT_MAX_STACK_HEIGHT,
        }
    }
}

/// Everything the host needs to know at construction time.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EngineConfig {
    /// Identifier of this VM flavour, fed to address derivation.
    pub vm_type: Vec<u8>,
    /// Upper bound on gas per transaction.
    pub block_gas_limit: u64,
    /// The cost model.
    pub gas_schedule: GasSchedule,
    /// Wasm preparation limits.
    pub wasm_config: WasmConfig,
    /// Maximum depth of nested contract calls.
    pub max_call_depth: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            vm_type: vec![5, 0],
            block_gas_limit: 10_000_000_000,
            gas_schedule: GasSchedule::default(),
            wasm_config: WasmConfig::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl EngineConfig {
    pub(crate) fn opcode_rules(&self) -> pwasm_utils::rules::Set {
        self.gas_schedule.wasm_opcode_cost.to_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_load_default_schedule_from_toml_round_trip() {
        let schedule = GasSchedule::default();
        let raw = toml::to_string(&schedule).expect("should serialize");
        let reloaded = GasSchedule::from_toml_str(&raw).expect("should deserialize");
        assert_eq!(schedule, reloaded);
    }

    #[test]
    fn should_saturate_dynamic_cost() {
        assert_eq!(GasSchedule::dynamic_cost(100, 3, 2), 106);
        assert_eq!(
            GasSchedule::dynamic_cost(1, usize::MAX, u64::MAX),
            u64::MAX
        );
    }
}
