#![allow(dead_code)]

use ildc_decompiler::{DecompiledBody, decompile_instructions, emit_body};
use ildc_ir::instruction::{Instruction, Operand};
use ildc_ir::name::NameTable;
use ildc_isa::Opcode;

/// Instruction without an operand.
pub fn op(offset: u32, opcode: Opcode) -> Instruction {
    Instruction::new(offset, opcode, None)
}

/// Branch instruction targeting `target`.
pub fn branch(offset: u32, opcode: Opcode, target: u32) -> Instruction {
    Instruction::new(offset, opcode, Some(Operand::Target(target)))
}

/// `ldc.i4` pushing `value`.
pub fn ldc(offset: u32, value: i32) -> Instruction {
    Instruction::new(offset, Opcode::LdcI4, Some(Operand::Int32(value)))
}

pub fn decompile(program: &[Instruction]) -> DecompiledBody {
    decompile_instructions(program, &NameTable::new())
}

/// Emitted source, one trimmed line per entry.
pub fn render(body: &DecompiledBody) -> Vec<String> {
    emit_body(body).lines().map(|l| l.trim().to_string()).collect()
}
