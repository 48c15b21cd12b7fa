//! JSON scenario harness for the Vela execution engine.
//!
//! Scenarios describe world state, transactions and expected post-state in
//! a JSON dialect with flexible value notation (`0x` hex, decimals, quoted
//! ASCII, `"*"` wildcards). This crate parses and writes that dialect,
//! provides the in-memory [`MockWorld`] standing in for a real chain, and
//! runs scenarios end to end through the engine.

#![warn(missing_docs)]

mod error;
pub mod interpret;
pub mod model;
pub mod parse;
mod runner;
pub mod world;
mod write;

pub use error::ScenarioError;
pub use parse::Parser;
pub use runner::{check_tx_expect, ScenarioRunner};
pub use world::{AccountState, BlockInfoState, MockWorld};
pub use write::scenario_to_json;

use model::Scenario;

/// Parses a scenario document from a JSON string; `file:` values resolve
/// against the current directory.
pub fn scenario_from_json_str(raw: &str) -> Result<Scenario, ScenarioError> {
    let json: serde_json::Value = serde_json::from_str(raw)?;
    let parser = Parser::new(interpret::InterpreterContext::default());
    parser.parse_scenario(&json)
}

/// Renders a scenario back to its canonical JSON string form.
pub fn scenario_to_json_string(scenario: &Scenario) -> String {
    serde_json::to_string_pretty(&scenario_to_json(scenario)).expect("scenario JSON is valid")
}
