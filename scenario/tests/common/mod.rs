//! Test contracts assembled with the parity-wasm builder, so the suite
//! carries no binary fixtures.

use parity_wasm::builder;
use parity_wasm::elements::{BlockType, Instruction, Instructions, Local, ValueType};

/// One host import of a test contract.
pub struct HostImport {
    pub name: &'static str,
    pub params: Vec<ValueType>,
    pub ret: Option<ValueType>,
}

impl HostImport {
    fn new(name: &'static str, params: Vec<ValueType>, ret: Option<ValueType>) -> Self {
        HostImport { name, params, ret }
    }
}

/// Builds a contract module: the given `env` imports, one page of memory,
/// one data segment at offset zero, and `()->()` exported functions.
///
/// `Call` indices inside function bodies use the global function index
/// space: imports first, in declaration order, then the local functions.
pub fn build_contract(
    imports: &[HostImport],
    data: Vec<u8>,
    functions: Vec<(&str, Vec<Local>, Vec<Instruction>)>,
) -> Vec<u8> {
    let mut module = builder::module();
    for import in imports {
        let mut signature = builder::signature();
        for param in &import.params {
            signature = signature.with_param(*param);
        }
        if let Some(ret) = import.ret {
            signature = signature.with_result(ret);
        }
        let type_index = module.push_signature(signature.build_sig());
        module = module
            .import()
            .module("env")
            .field(import.name)
            .external()
            .func(type_index)
            .build();
    }

    module = module.memory().with_min(1).with_max(Some(1)).build();
    if !data.is_empty() {
        module = module
            .data()
            .offset(Instruction::I32Const(0))
            .value(data)
            .build();
    }

    let import_count = imports.len() as u32;
    for (index, (name, locals, instructions)) in functions.into_iter().enumerate() {
        module = module
            .function()
            .signature()
            .build()
            .body()
            .with_locals(locals)
            .with_instructions(Instructions::new(instructions))
            .build()
            .build();
        module = module
            .export()
            .field(name)
            .internal()
            .func(import_count + index as u32)
            .build();
    }

    parity_wasm::serialize(module.build()).expect("test module serializes")
}

/// A 32-byte storage key: `short` followed by zero padding.
pub fn key32(short: &[u8]) -> Vec<u8> {
    let mut key = short.to_vec();
    key.resize(32, 0);
    key
}

/// A contract whose `init` is a no-op.
pub fn empty_init_contract() -> Vec<u8> {
    build_contract(&[], Vec::new(), vec![("init", vec![], vec![Instruction::End])])
}

/// `run` stores `"k" -> "v"` and then signals the error `"nope"`.
pub fn storage_then_error_contract() -> Vec<u8> {
    let imports = [
        HostImport::new(
            "storageStore",
            vec![ValueType::I32, ValueType::I32, ValueType::I32],
            Some(ValueType::I32),
        ),
        HostImport::new("signalError", vec![ValueType::I32, ValueType::I32], None),
    ];
    // data: key at 0, value "v" at 32, message "nope" at 33.
    let mut data = key32(b"k");
    data.push(b'v');
    data.extend_from_slice(b"nope");
    build_contract(
        &imports,
        data,
        vec![
            ("init", vec![], vec![Instruction::End]),
            (
                "run",
                vec![],
                vec![
                    Instruction::I32Const(0),
                    Instruction::I32Const(32),
                    Instruction::I32Const(1),
                    Instruction::Call(0),
                    Instruction::Drop,
                    Instruction::I32Const(33),
                    Instruction::I32Const(4),
                    Instruction::Call(1),
                    Instruction::End,
                ],
            ),
        ],
    )
}

/// `run` loops forever; only gas exhaustion stops it.
pub fn infinite_loop_contract() -> Vec<u8> {
    build_contract(
        &[],
        Vec::new(),
        vec![
            ("init", vec![], vec![Instruction::End]),
            (
                "run",
                vec![],
                vec![
                    Instruction::Loop(BlockType::NoResult),
                    Instruction::Br(0),
                    Instruction::End,
                    Instruction::End,
                ],
            ),
        ],
    )
}

/// The child of the nested-call scenarios: `childFunction` stores
/// `"x" -> "1"` and returns 42; `childError` stores and then fails.
pub fn child_contract() -> Vec<u8> {
    let imports = [
        HostImport::new(
            "storageStore",
            vec![ValueType::I32, ValueType::I32, ValueType::I32],
            Some(ValueType::I32),
        ),
        HostImport::new("int64finish", vec![ValueType::I64], None),
        HostImport::new("signalError", vec![ValueType::I32, ValueType::I32], None),
    ];
    // data: key "x" at 0, value "1" at 32, message "childfail" at 33.
    let mut data = key32(b"x");
    data.push(b'1');
    data.extend_from_slice(b"childfail");
    build_contract(
        &imports,
        data,
        vec![
            ("init", vec![], vec![Instruction::End]),
            (
                "childFunction",
                vec![],
                vec![
                    Instruction::I32Const(0),
                    Instruction::I32Const(32),
                    Instruction::I32Const(1),
                    Instruction::Call(0),
                    Instruction::Drop,
                    Instruction::I64Const(42),
                    Instruction::Call(1),
                    Instruction::End,
                ],
            ),
            (
                "childError",
                vec![],
                vec![
                    Instruction::I32Const(0),
                    Instruction::I32Const(32),
                    Instruction::I32Const(1),
                    Instruction::Call(0),
                    Instruction::Drop,
                    Instruction::I32Const(33),
                    Instruction::I32Const(9),
                    Instruction::Call(2),
                    Instruction::End,
                ],
            ),
        ],
    )
}

// Data layout of the parent contract.
const CHILD_ADDRESS_OFFSET: i32 = 0;
const VALUE_OFFSET: i32 = 32;
const CHILD_FUNCTION_OFFSET: i32 = 64;
const CHILD_FUNCTION_LEN: i32 = 13;
const CHILD_ERROR_OFFSET: i32 = 77;
const CHILD_ERROR_LEN: i32 = 10;
const KEY_Y_OFFSET: i32 = 87;
const VALUE_Y_OFFSET: i32 = 119;
const KEY_RESULT_OFFSET: i32 = 120;

const CHILD_GAS: i64 = 400_000;

fn dest_call(function_offset: i32, function_len: i32) -> Vec<Instruction> {
    vec![
        Instruction::I64Const(CHILD_GAS),
        Instruction::I32Const(CHILD_ADDRESS_OFFSET),
        Instruction::I32Const(VALUE_OFFSET),
        Instruction::I32Const(function_offset),
        Instruction::I32Const(function_len),
        Instruction::I32Const(0),
        Instruction::I32Const(0),
        Instruction::I32Const(0),
        Instruction::Call(1),
    ]
}

/// The parent of the nested-call scenarios.
///
/// * `callChild` runs the child's happy path and stores `"y" -> "2"`.
/// * `callFailingChild` runs the failing child, records the child's return
///   code under `"child_result"`, then stores `"y" -> "2"`.
/// * `bigIntSnapshot` creates a big-int of 7, runs the failing child, and
///   returns the value behind the original handle.
pub fn parent_contract(child_address: &[u8; 32]) -> Vec<u8> {
    let imports = [
        HostImport::new(
            "storageStore",
            vec![ValueType::I32, ValueType::I32, ValueType::I32],
            Some(ValueType::I32),
        ),
        HostImport::new(
            "executeOnDestContext",
            vec![
                ValueType::I64,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
            ],
            Some(ValueType::I32),
        ),
        HostImport::new(
            "int64storageStore",
            vec![ValueType::I32, ValueType::I64],
            Some(ValueType::I32),
        ),
        HostImport::new("bigIntNew", vec![ValueType::I64], Some(ValueType::I32)),
        HostImport::new("bigIntGetInt64", vec![ValueType::I32], Some(ValueType::I64)),
        HostImport::new("int64finish", vec![ValueType::I64], None),
    ];

    let mut data = child_address.to_vec();
    data.extend_from_slice(&[0u8; 32]); // call value, zero
    data.extend_from_slice(b"childFunction");
    data.extend_from_slice(b"childError");
    data.extend_from_slice(&key32(b"y"));
    data.push(b'2');
    data.extend_from_slice(&key32(b"child_result"));

    let store_y = vec![
        Instruction::I32Const(KEY_Y_OFFSET),
        Instruction::I32Const(VALUE_Y_OFFSET),
        Instruction::I32Const(1),
        Instruction::Call(0),
        Instruction::Drop,
    ];

    let mut call_child = dest_call(CHILD_FUNCTION_OFFSET, CHILD_FUNCTION_LEN);
    call_child.push(Instruction::Drop);
    call_child.extend(store_y.clone());
    call_child.push(Instruction::End);

    let mut call_failing_child = dest_call(CHILD_ERROR_OFFSET, CHILD_ERROR_LEN);
    call_failing_child.extend(vec![
        Instruction::I64ExtendSI32,
        Instruction::SetLocal(0),
        Instruction::I32Const(KEY_RESULT_OFFSET),
        Instruction::GetLocal(0),
        Instruction::Call(2),
        Instruction::Drop,
    ]);
    call_failing_child.extend(store_y);
    call_failing_child.push(Instruction::End);

    let mut big_int_snapshot = vec![
        Instruction::I64Const(7),
        Instruction::Call(3),
        Instruction::SetLocal(0),
    ];
    big_int_snapshot.extend(dest_call(CHILD_ERROR_OFFSET, CHILD_ERROR_LEN));
    big_int_snapshot.extend(vec![
        Instruction::Drop,
        Instruction::GetLocal(0),
        Instruction::Call(4),
        Instruction::Call(5),
        Instruction::End,
    ]);

    build_contract(
        &imports,
        data,
        vec![
            ("init", vec![], vec![Instruction::End]),
            ("callChild", vec![], call_child),
            (
                "callFailingChild",
                vec![Local::new(1, ValueType::I64)],
                call_failing_child,
            ),
            (
                "bigIntSnapshot",
                vec![Local::new(1, ValueType::I32)],
                big_int_snapshot,
            ),
        ],
    )
}

/// Probes memory bounds and storage edge cases.
///
/// * `inBounds` returns the last four bytes of the single memory page.
/// * `outOfBounds` reads at exactly the page size and must trap.
/// * `readMissing` returns the length of a never-written key.
/// * `writeValue` / `clearValue` fill and clear the `"bk"` slot.
pub fn memory_probe_contract() -> Vec<u8> {
    const PAGE_SIZE: i32 = 65536;
    let imports = [
        HostImport::new("finish", vec![ValueType::I32, ValueType::I32], None),
        HostImport::new(
            "storageStore",
            vec![ValueType::I32, ValueType::I32, ValueType::I32],
            Some(ValueType::I32),
        ),
        HostImport::new("storageLoadLength", vec![ValueType::I32], Some(ValueType::I32)),
        HostImport::new("int64finish", vec![ValueType::I64], None),
    ];
    let mut data = key32(b"bk");
    data.extend_from_slice(b"vv");
    build_contract(
        &imports,
        data,
        vec![
            ("init", vec![], vec![Instruction::End]),
            (
                "inBounds",
                vec![],
                vec![
                    Instruction::I32Const(PAGE_SIZE - 4),
                    Instruction::I32Const(4),
                    Instruction::Call(0),
                    Instruction::End,
                ],
            ),
            (
                "outOfBounds",
                vec![],
                vec![
                    Instruction::I32Const(PAGE_SIZE),
                    Instruction::I32Const(4),
                    Instruction::Call(0),
                    Instruction::End,
                ],
            ),
            (
                "readMissing",
                vec![],
                vec![
                    Instruction::I32Const(0),
                    Instruction::Call(2),
                    Instruction::I64ExtendSI32,
                    Instruction::Call(3),
                    Instruction::End,
                ],
            ),
            (
                "writeValue",
                vec![],
                vec![
                    Instruction::I32Const(0),
                    Instruction::I32Const(32),
                    Instruction::I32Const(2),
                    Instruction::Call(1),
                    Instruction::Drop,
                    Instruction::End,
                ],
            ),
            (
                "clearValue",
                vec![],
                vec![
                    Instruction::I32Const(0),
                    Instruction::I32Const(32),
                    Instruction::I32Const(0),
                    Instruction::Call(1),
                    Instruction::Drop,
                    Instruction::End,
                ],
            ),
        ],
    )
}
