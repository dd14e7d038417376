//! Memoized decompilation of method bodies.

mod common;

use std::sync::Arc;
use std::thread;

use common::{branch, decompile, op};
use ildc_decompiler::{DecompiledBody, MethodBody, decompile_instructions};
use ildc_ir::instruction::Instruction;
use ildc_ir::name::NameTable;
use ildc_isa::Opcode;

fn sample() -> Vec<Instruction> {
    vec![
        op(0, Opcode::Ldarg0),
        branch(1, Opcode::BrtrueS, 4),
        op(2, Opcode::Nop),
        op(3, Opcode::Ret),
        op(4, Opcode::Try),
        op(5, Opcode::Nop),
        op(6, Opcode::Finally),
        op(7, Opcode::EndOfHandler),
        op(8, Opcode::Ret),
    ]
}

#[test]
fn empty_method_has_no_statements() {
    let body = decompile(&[]);
    assert!(body.statements().is_empty());
    assert!(body.groups.is_empty());
    assert!(body.diagnostics.is_empty());
    assert_eq!(body.blocks.len(), 1);
    assert_eq!(body, DecompiledBody::empty());
}

#[test]
fn empty_method_body_interns_nothing() {
    let names = Arc::new(NameTable::new());
    let method = MethodBody::new("empty", Vec::new(), Arc::clone(&names));
    assert!(method.statements().is_empty());
    assert!(names.is_empty());
}

#[test]
fn decompilation_is_deterministic() {
    let names = NameTable::new();
    let first = decompile_instructions(&sample(), &names);
    let second = decompile_instructions(&sample(), &names);
    assert_eq!(first, second);
}

#[test]
fn statements_are_computed_once() {
    let method = MethodBody::new("sample", sample(), Arc::new(NameTable::new()));
    assert!(!method.is_decompiled());

    let first = method.statements();
    assert!(method.is_decompiled());
    let second = method.statements();
    assert!(std::ptr::eq(first, second));
    assert!(!first.is_empty());
}

#[test]
fn concurrent_first_access_shares_one_result() {
    let method = MethodBody::new("sample", sample(), Arc::new(NameTable::new()));

    let addresses: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| method.decompiled() as *const DecompiledBody as usize))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(addresses.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn bodies_share_the_name_table() {
    let names = Arc::new(NameTable::new());
    let a = MethodBody::new("a", sample(), Arc::clone(&names));
    let b = MethodBody::new("b", sample(), Arc::clone(&names));

    let label_a = a.statements().iter().find_map(|s| s.label()).cloned();
    let label_b = b.statements().iter().find_map(|s| s.label()).cloned();
    let (label_a, label_b) = (label_a.unwrap(), label_b.unwrap());
    assert_eq!(label_a.as_str(), "IL_0004");
    assert!(label_a.ptr_eq(&label_b));
}

#[test]
fn accessors() {
    let method = MethodBody::new("sample", sample(), Arc::new(NameTable::new()));
    assert_eq!(method.name(), "sample");
    assert_eq!(method.instructions().len(), 9);
    assert_eq!(method.decompiled().root, method.decompiled().root);
}
