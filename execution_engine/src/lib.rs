//! The Vela execution engine: the host for WebAssembly smart contracts.
//!
//! The engine loads contract modules through an injected blockchain hook,
//! exposes the fixed environment-interface to them, charges gas for every
//! opcode and host call, and produces a deterministic [`vela_types::VmOutput`]
//! per transaction. Nested and re-entrant contract calls are supported
//! through a transactional snapshot stack across all mutable contexts.
//!
//! Construction is cheap and hooks are ordinary trait implementations, so a
//! test double world drops in directly:
//!
//! ```ignore
//! let mut host = VmHost::new(world, DefaultCryptoHook, EngineConfig::default());
//! let output = host.run_smart_contract_call(&input);
//! ```

#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/vela-execution-engine/0.1.0")]

pub mod config;
pub mod contexts;
mod crypto;
pub mod execution;
pub mod host;
pub(crate) mod resolvers;
pub(crate) mod runtime;
pub mod wasm_prep;

pub use crypto::DefaultCryptoHook;
pub use execution::ExecutionError;
pub use host::VmHost;
pub use resolvers::ResolverError;
