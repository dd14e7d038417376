//! Source rendering of decompiled bodies.

mod common;

use common::{branch, decompile, ldc, op};
use ildc_decompiler::{decode_listing, decompile_instructions, emit_body};
use ildc_ir::name::NameTable;
use ildc_isa::Opcode;

#[test]
fn indents_nested_bodies() {
    let program = [
        op(0, Opcode::Ldarg0),
        branch(1, Opcode::Brtrue, 3),
        op(2, Opcode::Ret),
        op(3, Opcode::Try),
        ldc(4, 1),
        op(5, Opcode::Stloc0),
        op(6, Opcode::Catch),
        op(7, Opcode::Rethrow),
        op(8, Opcode::EndOfHandler),
        op(9, Opcode::Ret),
    ];
    let text = emit_body(&decompile(&program));
    let expected = "\
if (A_0) goto IL_0003;
return;
IL_0003: ;
try {
    V_0 = 1;
} catch (object ex_0006) {
    throw;
}
return;
";
    assert_eq!(text, expected);
}

#[test]
fn parenthesizes_nested_arithmetic() {
    let program = [
        op(0, Opcode::Ldarg0),
        op(1, Opcode::Ldarg1),
        op(2, Opcode::Add),
        op(3, Opcode::Ldloc0),
        op(4, Opcode::MulOvf),
        op(5, Opcode::Ldarg2),
        op(6, Opcode::RemUn),
        op(7, Opcode::Ret),
    ];
    let text = emit_body(&decompile(&program));
    assert_eq!(text, "return checked((A_0 + A_1) * V_0) /*un*/% A_2;\n");
}

#[test]
fn renders_constants() {
    let text = "\
ldnull
pop
ldstr \"tab\\there\"
pop
ldc.i8 7
pop
ldc.r4 1
pop
ldc.i4.m1
ret
";
    let methods = decode_listing(text).unwrap();
    let body = decompile_instructions(&methods[0].instructions, &NameTable::new());
    assert_eq!(
        emit_body(&body),
        "null;\n\"tab\\there\";\n7L;\n1.0;\nreturn -1;\n"
    );
}

#[test]
fn empty_body_renders_nothing() {
    assert_eq!(emit_body(&decompile(&[])), "");
}
