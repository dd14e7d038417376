use ildc_ir::expr::{BinOp, Constant, Expr, ExprKind};
use ildc_ir::instruction::{Instruction, Operand};
use ildc_isa::Opcode;
use thiserror::Error;

/// Evaluation stack of expression trees standing in for runtime values.
#[derive(Debug, Default, Clone)]
pub(crate) struct OperandStack {
    items: Vec<Expr>,
}

#[derive(Debug, Error)]
#[error("Stack underflow")]
pub(crate) struct StackUnderflowError;

impl OperandStack {
    pub(crate) fn push(&mut self, value: Expr) {
        self.items.push(value);
    }

    pub(crate) fn pop(&mut self) -> Result<Expr, StackUnderflowError> {
        self.items.pop().ok_or(StackUnderflowError)
    }

    /// Pop the two topmost values as `(deeper, top)`. Nothing is popped when
    /// fewer than two values are available.
    pub(crate) fn pop_pair(&mut self) -> Result<(Expr, Expr), StackUnderflowError> {
        if self.items.len() < 2 {
            return Err(StackUnderflowError);
        }
        let top = self.pop()?;
        let deeper = self.pop()?;
        Ok((deeper, top))
    }

    pub(crate) fn peek(&self) -> Option<&Expr> {
        self.items.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pop right then left and push `left op right`.
    pub(crate) fn push_binary(
        &mut self,
        op: BinOp,
        checked_overflow: bool,
        unsigned: bool,
    ) -> Result<(), StackUnderflowError> {
        let (left, right) = self.pop_pair()?;
        self.push(Expr::binary(op, left, right, checked_overflow, unsigned));
        Ok(())
    }
}

/// Operator and `(checked_overflow, unsigned)` flags for arithmetic opcodes.
pub(crate) fn arithmetic(opcode: Opcode) -> Option<(BinOp, bool, bool)> {
    let entry = match opcode {
        Opcode::Add => (BinOp::Add, false, false),
        Opcode::AddOvf => (BinOp::Add, true, false),
        Opcode::AddOvfUn => (BinOp::Add, true, true),
        Opcode::Sub => (BinOp::Sub, false, false),
        Opcode::SubOvf => (BinOp::Sub, true, false),
        Opcode::SubOvfUn => (BinOp::Sub, true, true),
        Opcode::Mul => (BinOp::Mul, false, false),
        Opcode::MulOvf => (BinOp::Mul, true, false),
        Opcode::MulOvfUn => (BinOp::Mul, true, true),
        Opcode::Div => (BinOp::Div, false, false),
        Opcode::DivUn => (BinOp::Div, false, true),
        Opcode::Rem => (BinOp::Rem, false, false),
        Opcode::RemUn => (BinOp::Rem, false, true),
        Opcode::And => (BinOp::BitAnd, false, false),
        Opcode::Or => (BinOp::BitOr, false, false),
        Opcode::Xor => (BinOp::BitXor, false, false),
        _ => return None,
    };
    Some(entry)
}

fn variable_operand(insn: &Instruction) -> Option<u16> {
    match insn.operand {
        Some(Operand::Variable(index)) => Some(index),
        _ => None,
    }
}

/// Expression pushed by a load opcode, or `None` if `insn` is not a load.
pub(crate) fn load(insn: &Instruction) -> Option<Expr> {
    let kind = match (insn.opcode, &insn.operand) {
        (Opcode::Ldnull, _) => ExprKind::Constant(Constant::Null),
        (Opcode::LdcI4M1, _) => ExprKind::Constant(Constant::Int32(-1)),
        (Opcode::LdcI40, _) => ExprKind::Constant(Constant::Int32(0)),
        (Opcode::LdcI41, _) => ExprKind::Constant(Constant::Int32(1)),
        (Opcode::LdcI42, _) => ExprKind::Constant(Constant::Int32(2)),
        (Opcode::LdcI43, _) => ExprKind::Constant(Constant::Int32(3)),
        (Opcode::LdcI44, _) => ExprKind::Constant(Constant::Int32(4)),
        (Opcode::LdcI45, _) => ExprKind::Constant(Constant::Int32(5)),
        (Opcode::LdcI46, _) => ExprKind::Constant(Constant::Int32(6)),
        (Opcode::LdcI47, _) => ExprKind::Constant(Constant::Int32(7)),
        (Opcode::LdcI48, _) => ExprKind::Constant(Constant::Int32(8)),
        (Opcode::LdcI4S | Opcode::LdcI4, Some(Operand::Int32(v))) => {
            ExprKind::Constant(Constant::Int32(*v))
        }
        (Opcode::LdcI8, Some(Operand::Int64(v))) => ExprKind::Constant(Constant::Int64(*v)),
        (Opcode::LdcR4 | Opcode::LdcR8, Some(Operand::Float(v))) => {
            ExprKind::Constant(Constant::Float(*v))
        }
        (Opcode::Ldstr, Some(Operand::String(s))) => ExprKind::Constant(Constant::String(s.clone())),
        (Opcode::Ldarg0, _) => ExprKind::Argument(0),
        (Opcode::Ldarg1, _) => ExprKind::Argument(1),
        (Opcode::Ldarg2, _) => ExprKind::Argument(2),
        (Opcode::Ldarg3, _) => ExprKind::Argument(3),
        (Opcode::LdargS | Opcode::Ldarg, _) => ExprKind::Argument(variable_operand(insn)?),
        (Opcode::Ldloc0, _) => ExprKind::Local(0),
        (Opcode::Ldloc1, _) => ExprKind::Local(1),
        (Opcode::Ldloc2, _) => ExprKind::Local(2),
        (Opcode::Ldloc3, _) => ExprKind::Local(3),
        (Opcode::LdlocS | Opcode::Ldloc, _) => ExprKind::Local(variable_operand(insn)?),
        _ => return None,
    };
    Some(Expr::new(kind, insn.location))
}

/// Variable written by a store opcode, or `None` if `insn` is not a store.
pub(crate) fn store_target(insn: &Instruction) -> Option<Expr> {
    let kind = match insn.opcode {
        Opcode::Stloc0 => ExprKind::Local(0),
        Opcode::Stloc1 => ExprKind::Local(1),
        Opcode::Stloc2 => ExprKind::Local(2),
        Opcode::Stloc3 => ExprKind::Local(3),
        Opcode::StlocS | Opcode::Stloc => ExprKind::Local(variable_operand(insn)?),
        Opcode::StargS | Opcode::Starg => ExprKind::Argument(variable_operand(insn)?),
        _ => return None,
    };
    Some(Expr::new(kind, insn.location))
}
