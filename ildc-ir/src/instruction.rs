use std::fmt;

use ildc_isa::Opcode;

/// Half-open IL byte span `[start, end)` a node was decompiled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub start: u32,
    pub end: u32,
}

impl SourceLocation {
    pub const fn new(start: u32, end: u32) -> Self {
        SourceLocation { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn span_to(&self, other: &SourceLocation) -> SourceLocation {
        SourceLocation {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04x}..IL_{:04x}", self.start, self.end)
    }
}

/// A decoded inline operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int32(i32),
    Int64(i64),
    Float(f64),
    String(String),
    /// Absolute byte offset of a branch target.
    Target(u32),
    /// Argument or local index.
    Variable(u16),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int32(v) => write!(f, "{v}"),
            Operand::Int64(v) => write!(f, "{v}"),
            Operand::Float(v) => write!(f, "{v:?}"),
            Operand::String(s) => write!(f, "{s:?}"),
            Operand::Target(offset) => write!(f, "IL_{offset:04x}"),
            Operand::Variable(index) => write!(f, "{index}"),
        }
    }
}

/// A single instruction of a method body.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Byte offset within the method's code; unique per method.
    pub offset: u32,
    pub opcode: Opcode,
    pub operand: Option<Operand>,
    pub location: SourceLocation,
}

impl Instruction {
    pub fn new(offset: u32, opcode: Opcode, operand: Option<Operand>) -> Self {
        Instruction {
            offset,
            opcode,
            operand,
            location: SourceLocation::new(offset, offset.saturating_add(1)),
        }
    }

    #[inline]
    pub fn is_branch(&self) -> bool {
        self.opcode.is_branch()
    }

    #[inline]
    pub fn is_start_of_handler(&self) -> bool {
        self.opcode.is_start_of_handler()
    }

    /// Target offset of a branch instruction.
    pub fn branch_target(&self) -> Option<u32> {
        match self.operand {
            Some(Operand::Target(offset)) => Some(offset),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04x}: {}", self.offset, self.opcode)?;
        if let Some(operand) = &self.operand {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_covers_both_ends() {
        let a = SourceLocation::new(4, 6);
        let b = SourceLocation::new(1, 2);
        assert_eq!(a.span_to(&b), SourceLocation::new(1, 6));
        assert_eq!(b.span_to(&a), a.span_to(&b));
    }

    #[test]
    fn display_uses_il_labels() {
        let insn = Instruction::new(10, Opcode::BrS, Some(Operand::Target(0x1f)));
        assert_eq!(insn.to_string(), "IL_000a: br.s IL_001f");
        assert_eq!(insn.branch_target(), Some(0x1f));
        assert_eq!(insn.location.to_string(), "IL_000a..IL_000b");
    }

    #[test]
    fn last_offset_does_not_wrap() {
        let insn = Instruction::new(u32::MAX, Opcode::Ret, None);
        assert_eq!(insn.location, SourceLocation::new(u32::MAX, u32::MAX));
    }
}
