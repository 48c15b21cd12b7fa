//! Scenario grammar tests: parse → write round trips and a pure-state
//! scenario driven through the runner.

use vela_scenario::{scenario_from_json_str, scenario_to_json, ScenarioRunner};

const ROUND_TRIP_SCENARIO: &str = r#"{
  "name": "transfer and check",
  "comment": "covers the value notation and the wildcard forms",
  "steps": [
    {
      "step": "setState",
      "accounts": {
        "address:alice": {
          "nonce": "0",
          "balance": "1,000,000",
          "esdt": {
            "str:TOK-123456": "500"
          },
          "storage": {
            "str:reserved": "0x01"
          },
          "code": ""
        },
        "address:vault": {
          "nonce": "0",
          "balance": "0",
          "storage": {},
          "code": "0x0061736d",
          "owner": "address:alice"
        }
      },
      "newAddresses": [
        {
          "creatorAddress": "address:alice",
          "creatorNonce": "0",
          "newAddress": "address:vault2"
        }
      ],
      "currentBlockInfo": {
        "blockTimestamp": "511",
        "blockNonce": "5",
        "blockRound": "7",
        "blockEpoch": "1"
      }
    },
    {
      "step": "scCall",
      "txId": "call-1",
      "tx": {
        "from": "address:alice",
        "to": "address:vault",
        "value": "10",
        "function": "store",
        "arguments": [
          "0x1234",
          "str:argument",
          "-5"
        ],
        "gasLimit": "500,000",
        "gasPrice": "1"
      },
      "expect": {
        "out": [
          "*",
          "0x2a"
        ],
        "status": "0",
        "message": "str:",
        "logs": "*",
        "gas": "*",
        "refund": "*"
      }
    },
    {
      "step": "checkState",
      "accounts": {
        "address:alice": {
          "nonce": "1",
          "storage": "*",
          "code": ""
        },
        "+": ""
      }
    }
  ]
}"#;

#[test]
fn scenario_round_trips_through_parse_and_write() {
    let scenario = scenario_from_json_str(ROUND_TRIP_SCENARIO).expect("scenario parses");
    let written = scenario_to_json(&scenario);
    let original: serde_json::Value = serde_json::from_str(ROUND_TRIP_SCENARIO).unwrap();
    assert_eq!(written, original);
}

#[test]
fn unknown_fields_are_rejected() {
    let raw = r#"{ "name": "bad", "steps": [ { "step": "setState", "bogus": 1 } ] }"#;
    assert!(scenario_from_json_str(raw).is_err());
}

#[test]
fn account_addresses_must_be_32_bytes() {
    let raw = r#"{
      "steps": [
        { "step": "setState", "accounts": { "0x0102": { "nonce": "0", "balance": "0" } } }
      ]
    }"#;
    let error = scenario_from_json_str(raw).unwrap_err();
    assert!(error.to_string().contains("32 bytes"));
}

const STATE_ONLY_SCENARIO: &str = r#"{
  "name": "plain transfer",
  "steps": [
    {
      "step": "setState",
      "accounts": {
        "address:alice": {
          "nonce": "0",
          "balance": "1000",
          "storage": {},
          "code": ""
        },
        "address:bob": {
          "nonce": "0",
          "balance": "0",
          "storage": {},
          "code": ""
        }
      }
    },
    {
      "step": "transfer",
      "txId": "t-1",
      "tx": {
        "from": "address:alice",
        "to": "address:bob",
        "value": "250"
      }
    },
    {
      "step": "checkState",
      "accounts": {
        "address:alice": {
          "nonce": "1",
          "balance": "750",
          "storage": "*",
          "code": ""
        },
        "address:bob": {
          "nonce": "0",
          "balance": "250",
          "storage": "*",
          "code": ""
        }
      }
    }
  ]
}"#;

#[test]
fn state_only_scenario_runs_end_to_end() {
    let scenario = scenario_from_json_str(STATE_ONLY_SCENARIO).expect("scenario parses");
    let mut runner = ScenarioRunner::new();
    runner.run_scenario(&scenario).expect("scenario passes");
}

#[test]
fn check_state_detects_wrong_balance() {
    let raw = STATE_ONLY_SCENARIO.replace("\"balance\": \"750\"", "\"balance\": \"751\"");
    let scenario = scenario_from_json_str(&raw).expect("scenario parses");
    let mut runner = ScenarioRunner::new();
    let error = runner.run_scenario(&scenario).unwrap_err();
    assert!(error.to_string().contains("bad account balance"));
}
