//! Preprocessing of contract Wasm modules.
//!
//! Code fetched through the blockchain hook is deserialized, validated
//! against the engine's limits, rewritten so that its memory is imported
//! from the host, instrumented with the gas counter that charges every
//! opcode against the schedule, and finally bounded in stack height.

use parity_wasm::elements::{self, Instruction, MemorySection, Module, Section, TableType};
use pwasm_utils::{self, stack_height};
use thiserror::Error;

use crate::config::EngineConfig;

const GAS_MODULE_NAME: &str = "env";
/// We only allow a maximum of 4k function pointers in a table section.
pub const DEFAULT_MAX_TABLE_SIZE: u32 = 4096;
/// Maximum number of elements that can appear as immediate value to the
/// br_table instruction.
pub const DEFAULT_BR_TABLE_MAX_SIZE: u32 = 256;

/// A limit violation found while validating a contract module.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WasmValidationError {
    /// Initial table size outside allowed bounds.
    #[error("initial table size {actual} exceeds allowed bound {max}")]
    InitialTableSizeExceeded {
        /// Allowed maximum table size.
        max: u32,
        /// Actual initial table size in the Wasm.
        actual: u32,
    },
    /// Maximum table size outside allowed bounds.
    #[error("maximum table size {actual} exceeds allowed bound {max}")]
    MaxTableSizeExceeded {
        /// Allowed maximum table size.
        max: u32,
        /// Actual maximum table size in the Wasm.
        actual: u32,
    },
    /// Number of the tables in a Wasm must be at most one.
    #[error("the number of tables must be at most one")]
    MoreThanOneTable,
    /// Length of a br_table exceeded the maximum allowed size.
    #[error("maximum br_table size exceeds allowed bounds (expected {max} but found {actual})")]
    BrTableSizeExceeded {
        /// Maximum allowed br_table length.
        max: u32,
        /// Actual size of the largest br_table in the code.
        actual: usize,
    },
}

/// An error emitted by the Wasm preprocessor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreprocessingError {
    /// Unable to deserialize Wasm bytes.
    #[error("deserialization error: {0}")]
    Deserialize(String),
    /// Found opcodes forbidden by gas rules.
    #[error("encountered operation forbidden by gas rules")]
    OperationForbiddenByGasRules,
    /// Stack limiter was unable to instrument the binary.
    #[error("stack limiter error")]
    StackLimiter,
    /// Wasm bytes are missing a memory section.
    #[error("memory section should exist")]
    MissingMemorySection,
    /// Wasm validation did not pass.
    #[error("invalid wasm: {0}")]
    InvalidWasm(#[from] WasmValidationError),
}

impl From<elements::Error> for PreprocessingError {
    fn from(error: elements::Error) -> Self {
        PreprocessingError::Deserialize(error.to_string())
    }
}

/// Checks if the given wasm module contains a non-empty memory section.
fn memory_section(module: &Module) -> Option<&MemorySection> {
    for section in module.sections() {
        if let Section::Memory(section) = section {
            return if section.entries().is_empty() {
                None
            } else {
                Some(section)
            };
        }
    }
    None
}

/// Ensures the table section has at most one table entry with normalized
/// initial and maximum values.
///
/// If a maximum value is not specified it is defaulted to 4k to prevent OOM.
fn ensure_table_size_limit(mut module: Module) -> Result<Module, WasmValidationError> {
    if let Some(sect) = module.table_section_mut() {
        // Table section is optional and there can be at most one.
        if sect.entries().len() > 1 {
            return Err(WasmValidationError::MoreThanOneTable);
        }

        if let Some(table_entry) = sect.entries_mut().iter_mut().next() {
            let initial = table_entry.limits().initial();
            if initial > DEFAULT_MAX_TABLE_SIZE {
                return Err(WasmValidationError::InitialTableSizeExceeded {
                    max: DEFAULT_MAX_TABLE_SIZE,
                    actual: initial,
                });
            }

            match table_entry.limits().maximum() {
                Some(max) if max > DEFAULT_MAX_TABLE_SIZE => {
                    return Err(WasmValidationError::MaxTableSizeExceeded {
                        max: DEFAULT_MAX_TABLE_SIZE,
                        actual: max,
                    })
                }
                Some(_) => {
                    // maximum within the limit
                }
                None => {
                    // rewrite wasm and provide a maximum limit for a table section
                    *table_entry = TableType::new(initial, Some(DEFAULT_MAX_TABLE_SIZE))
                }
            }
        }
    }

    Ok(module)
}

/// Ensure that any `br_table` instruction adheres to its immediate value limit.
fn ensure_br_table_size_limit(module: &Module) -> Result<(), WasmValidationError> {
    let code_section = if let Some(code_section) = module.code_section() {
        code_section
    } else {
        return Ok(());
    };
    for instr in code_section
        .bodies()
        .iter()
        .flat_map(|body| body.code().elements())
    {
        if let Instruction::BrTable(br_table_data) = instr {
            if br_table_data.table.len() > DEFAULT_BR_TABLE_MAX_SIZE as usize {
                return Err(WasmValidationError::BrTableSizeExceeded {
                    max: DEFAULT_BR_TABLE_MAX_SIZE,
                    actual: br_table_data.table.len(),
                });
            }
        }
    }
    Ok(())
}

/// Preprocesses Wasm bytes and returns a module ready for instantiation.
///
/// This process consists of a few steps:
/// - Validate that the given bytes contain a memory section, and check the
///   table limits.
/// - Externalize the memory so the host controls its allocation and bounds.
/// - Inject gas counters into the code, which makes it possible for the
///   executed Wasm to be charged for opcodes; this also validates opcodes
///   and ensures that there are no forbidden opcodes in use, such as
///   floating point opcodes.
/// - Ensure that the code has a maximum stack height.
pub fn preprocess(config: &EngineConfig, module_bytes: &[u8]) -> Result<Module, PreprocessingError> {
    let module = deserialize(module_bytes)?;

    if memory_section(&module).is_none() {
        // `pwasm_utils::externalize_mem` expects a non-empty memory section
        // to exist in the module, and panics otherwise.
        return Err(PreprocessingError::MissingMemorySection);
    }

    let module = ensure_table_size_limit(module)?;
    ensure_br_table_size_limit(&module)?;

    // `pwasm-utils` pins its own (older) `parity-wasm` version, so its module
    // type is not the same type as the one used elsewhere in this crate;
    // bridge the two via a serialize/deserialize round-trip.
    let module_bytes = elements::serialize(module).expect("should serialize");
    let utils_module = pwasm_utils::parity_wasm::deserialize_buffer::<
        pwasm_utils::parity_wasm::elements::Module,
    >(&module_bytes)
    .map_err(|error| PreprocessingError::Deserialize(error.to_string()))?;

    let utils_module = pwasm_utils::externalize_mem(utils_module, None, config.wasm_config.max_memory);
    let utils_module =
        pwasm_utils::inject_gas_counter(utils_module, &config.opcode_rules(), GAS_MODULE_NAME)
            .map_err(|_| PreprocessingError::OperationForbiddenByGasRules)?;
    let utils_module = stack_height::inject_limiter(utils_module, config.wasm_config.max_stack_height)
        .map_err(|_| PreprocessingError::StackLimiter)?;

    let module_bytes =
        pwasm_utils::parity_wasm::serialize(utils_module).expect("should serialize");
    let module = elements::deserialize_buffer(&module_bytes)?;
    Ok(module)
}

/// Returns a parity Module from the given bytes without making modifications
/// or checking limits.
pub fn deserialize(module_bytes: &[u8]) -> Result<Module, PreprocessingError> {
    parity_wasm::deserialize_buffer::<Module>(module_bytes).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use parity_wasm::builder;

    use super::*;

    #[test]
    fn should_reject_module_without_memory() {
        let module = builder::module().build();
        let module_bytes = parity_wasm::serialize(module).expect("should serialize");

        match preprocess(&EngineConfig::default(), &module_bytes).unwrap_err() {
            PreprocessingError::MissingMemorySection => (),
            error => panic!("expected MissingMemorySection, got {:?}", error),
        }
    }

    #[test]
    fn should_accept_minimal_module_with_memory() {
        let module = builder::module().memory().build().build();
        let module_bytes = parity_wasm::serialize(module).expect("should serialize");

        preprocess(&EngineConfig::default(), &module_bytes).expect("should preprocess");
    }

    #[test]
    fn should_reject_garbage_bytes() {
        match preprocess(&EngineConfig::default(), b"not wasm at all").unwrap_err() {
            PreprocessingError::Deserialize(_) => (),
            error => panic!("expected Deserialize, got {:?}", error),
        }
    }
}
