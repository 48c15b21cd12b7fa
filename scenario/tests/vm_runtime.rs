//! End-to-end execution tests driving the engine through the mock world.

mod common;

use common::*;
use num_bigint::BigUint;
use vela_execution_engine::{config::EngineConfig, DefaultCryptoHook, VmHost};
use vela_scenario::{AccountState, MockWorld};
use vela_types::{
    Address, CallType, CodeMetadata, ContractCallInput, ContractCreateInput, ReturnCode,
};

fn addr(byte: u8) -> Address {
    Address::new([byte; 32])
}

fn fresh_host() -> (MockWorld, VmHost<MockWorld, DefaultCryptoHook>) {
    let world = MockWorld::new();
    let host = VmHost::new(world.clone(), DefaultCryptoHook, EngineConfig::default());
    (world, host)
}

fn install_user(world: &MockWorld, address: Address, balance: u64) {
    world.set_account(
        address,
        AccountState {
            balance: BigUint::from(balance),
            ..AccountState::default()
        },
    );
}

fn install_contract(world: &MockWorld, address: Address, code: Vec<u8>) {
    world.set_account(
        address,
        AccountState {
            code,
            ..AccountState::default()
        },
    );
}

fn call_input(caller: Address, recipient: Address, function: &str, gas: u64) -> ContractCallInput {
    ContractCallInput {
        caller,
        recipient,
        call_value: BigUint::default(),
        function: function.to_string(),
        arguments: Vec::new(),
        gas_provided: gas,
        gas_price: 1,
        call_type: CallType::DirectCall,
    }
}

#[test]
fn create_with_noop_init_returns_empty() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    let deployed = addr(0xAA);
    install_user(&world, caller, 1_000);
    world.register_new_address(caller, 0, deployed);

    let output = host.run_smart_contract_create(&ContractCreateInput {
        caller,
        call_value: BigUint::default(),
        contract_code: empty_init_contract(),
        code_metadata: CodeMetadata::default(),
        arguments: Vec::new(),
        gas_provided: 100_000,
        gas_price: 1,
    });

    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);
    assert!(output.return_data.is_empty());
    let created = output.account(&deployed).expect("created account in output");
    assert!(created.code.is_some());
    assert!(output.gas_remaining > 0);
}

#[test]
fn create_collision_is_reported() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    install_user(&world, caller, 1_000);
    install_user(&world, addr(0xAA), 1); // derived address already taken
    world.register_new_address(caller, 0, addr(0xAA));

    let output = host.run_smart_contract_create(&ContractCreateInput {
        caller,
        call_value: BigUint::default(),
        contract_code: empty_init_contract(),
        code_metadata: CodeMetadata::default(),
        arguments: Vec::new(),
        gas_provided: 100_000,
        gas_price: 1,
    });

    assert_eq!(output.return_code, ReturnCode::AccountCollision);
    assert_eq!(output.gas_remaining, 0);
}

#[test]
fn signal_error_rolls_back_storage() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    let contract = addr(2);
    install_user(&world, caller, 1_000);
    install_contract(&world, contract, storage_then_error_contract());

    let output = host.run_smart_contract_call(&call_input(caller, contract, "run", 100_000));

    assert_eq!(output.return_code, ReturnCode::UserError);
    assert_eq!(output.return_message, "nope");
    assert!(output.output_accounts.is_empty());
    assert_eq!(output.gas_remaining, 0);
    // World untouched: the failed write never materialized.
    assert!(world.account(&contract).unwrap().storage.is_empty());
}

#[test]
fn endless_loop_exhausts_gas() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    let contract = addr(2);
    install_user(&world, caller, 1_000);
    install_contract(&world, contract, infinite_loop_contract());

    let output = host.run_smart_contract_call(&call_input(caller, contract, "run", 10_000));

    assert_eq!(output.return_code, ReturnCode::OutOfGas);
    assert_eq!(output.gas_remaining, 0);
    assert!(output.output_accounts.is_empty());
}

#[test]
fn missing_function_is_reported() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    let contract = addr(2);
    install_user(&world, caller, 1_000);
    install_contract(&world, contract, empty_init_contract());

    let output = host.run_smart_contract_call(&call_input(caller, contract, "nothing", 100_000));
    assert_eq!(output.return_code, ReturnCode::FunctionNotFound);
}

#[test]
fn nested_call_success_composes() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    let parent = addr(2);
    let child = addr(3);
    install_user(&world, caller, 1_000);
    install_contract(&world, parent, parent_contract(&child.into_inner()));
    install_contract(&world, child, child_contract());

    let output = host.run_smart_contract_call(&call_input(caller, parent, "callChild", 1_000_000));

    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);
    assert_eq!(output.return_data, vec![vec![42]]);
    world.apply_vm_output(&output);

    let parent_state = world.account(&parent).unwrap();
    assert_eq!(parent_state.storage[&key32(b"y")], b"2".to_vec());
    let child_state = world.account(&child).unwrap();
    assert_eq!(child_state.storage[&key32(b"x")], b"1".to_vec());
}

#[test]
fn nested_call_failure_is_isolated() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    let parent = addr(2);
    let child = addr(3);
    install_user(&world, caller, 1_000);
    install_contract(&world, parent, parent_contract(&child.into_inner()));
    install_contract(&world, child, child_contract());

    let output =
        host.run_smart_contract_call(&call_input(caller, parent, "callFailingChild", 1_000_000));

    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);
    assert!(output.return_data.is_empty());
    world.apply_vm_output(&output);

    let parent_state = world.account(&parent).unwrap();
    assert_eq!(parent_state.storage[&key32(b"y")], b"2".to_vec());
    // The child's return code surfaced to the parent contract.
    assert_eq!(
        parent_state.storage[&key32(b"child_result")],
        vec![ReturnCode::UserError.as_u64() as u8]
    );
    // The child's write did not survive.
    assert!(world.account(&child).unwrap().storage.is_empty());
}

#[test]
fn big_int_arena_is_restored_after_failed_child() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    let parent = addr(2);
    let child = addr(3);
    install_user(&world, caller, 1_000);
    install_contract(&world, parent, parent_contract(&child.into_inner()));
    install_contract(&world, child, child_contract());

    let output =
        host.run_smart_contract_call(&call_input(caller, parent, "bigIntSnapshot", 1_000_000));

    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);
    assert_eq!(output.return_data, vec![vec![7]]);
}

#[test]
fn memory_access_at_page_boundary() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    let contract = addr(2);
    install_user(&world, caller, 1_000);
    install_contract(&world, contract, memory_probe_contract());

    let in_bounds = host.run_smart_contract_call(&call_input(caller, contract, "inBounds", 200_000));
    assert_eq!(in_bounds.return_code, ReturnCode::Ok, "{}", in_bounds.return_message);
    assert_eq!(in_bounds.return_data.len(), 1);
    assert_eq!(in_bounds.return_data[0].len(), 4);

    let out_of_bounds =
        host.run_smart_contract_call(&call_input(caller, contract, "outOfBounds", 200_000));
    assert_eq!(out_of_bounds.return_code, ReturnCode::ExecutionFailed);
}

#[test]
fn reading_missing_key_yields_empty() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    let contract = addr(2);
    install_user(&world, caller, 1_000);
    install_contract(&world, contract, memory_probe_contract());

    let output = host.run_smart_contract_call(&call_input(caller, contract, "readMissing", 200_000));
    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);
    // Length zero renders as an empty return-data chunk.
    assert_eq!(output.return_data, vec![Vec::<u8>::new()]);
}

#[test]
fn clearing_a_slot_earns_the_release_refund() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    let contract = addr(2);
    install_user(&world, caller, 1_000);
    install_contract(&world, contract, memory_probe_contract());

    let write = host.run_smart_contract_call(&call_input(caller, contract, "writeValue", 200_000));
    assert_eq!(write.return_code, ReturnCode::Ok, "{}", write.return_message);
    world.apply_vm_output(&write);
    assert_eq!(
        world.account(&contract).unwrap().storage[&key32(b"bk")],
        b"vv".to_vec()
    );

    let clear = host.run_smart_contract_call(&call_input(caller, contract, "clearValue", 200_000));
    assert_eq!(clear.return_code, ReturnCode::Ok, "{}", clear.return_message);
    // Two bytes released at the default rate of 10 gas per byte.
    assert_eq!(clear.gas_refund, BigUint::from(20u32));
    world.apply_vm_output(&clear);
    assert!(world.account(&contract).unwrap().storage.is_empty());
}

#[test]
fn gas_accounting_is_conservative() {
    let (world, mut host) = fresh_host();
    let caller = addr(1);
    let deployed = addr(0xAA);
    install_user(&world, caller, 1_000);
    world.register_new_address(caller, 0, deployed);

    let gas_provided = 100_000;
    let output = host.run_smart_contract_create(&ContractCreateInput {
        caller,
        call_value: BigUint::default(),
        contract_code: empty_init_contract(),
        code_metadata: CodeMetadata::default(),
        arguments: Vec::new(),
        gas_provided,
        gas_price: 1,
    });

    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);
    assert!(output.gas_remaining < gas_provided);
    assert!(output.gas_remaining > 0);
}
