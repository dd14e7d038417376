use std::fmt;
use std::str::FromStr;

bitflags::bitflags! {
    /// Control-flow properties of an opcode.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct OpcodeFlags: u16 {
        /// Transfers control to the instruction named by a `Target` operand.
        const BRANCH = 1 << 0;
        /// Branch that may fall through to the next instruction.
        const CONDITIONAL = 1 << 1;
        /// Conditional branch comparing two stack operands.
        const RELATIONAL = 1 << 2;
        /// Opens a try region.
        const TRY_START = 1 << 3;
        /// Opens a handler region (catch, filter or finally).
        const HANDLER_START = 1 << 4;
        /// Closes a filter or handler region.
        const REGION_END = 1 << 5;
        /// Ends a linear run without naming a successor.
        const TERMINATOR = 1 << 6;
        /// Region marker without a runtime encoding.
        const PSEUDO = 1 << 7;
    }
}

const NONE: OpcodeFlags = OpcodeFlags::empty();
const JMP: OpcodeFlags = OpcodeFlags::BRANCH;
const COND: OpcodeFlags = OpcodeFlags::BRANCH.union(OpcodeFlags::CONDITIONAL);
const REL: OpcodeFlags = COND.union(OpcodeFlags::RELATIONAL);
const TERM: OpcodeFlags = OpcodeFlags::TERMINATOR;
const TRY: OpcodeFlags = OpcodeFlags::TRY_START.union(OpcodeFlags::PSEUDO);
const HANDLER: OpcodeFlags = OpcodeFlags::HANDLER_START.union(OpcodeFlags::PSEUDO);
const END: OpcodeFlags = OpcodeFlags::REGION_END.union(OpcodeFlags::PSEUDO);

/// Kind of the single inline operand an opcode carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperandKind {
    None,
    Int32,
    Int64,
    Float,
    String,
    /// Byte offset of a branch target.
    Target,
    /// Argument or local variable index.
    Variable,
}

/// Static metadata for one opcode.
#[derive(Clone, Copy, Debug)]
pub struct OpcodeInfo {
    opcode: Opcode,
    mnemonic: &'static str,
    operand: OperandKind,
    flags: OpcodeFlags,
}

impl OpcodeInfo {
    #[inline]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    #[inline]
    pub fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    #[inline]
    pub fn operand_kind(&self) -> OperandKind {
        self.operand
    }

    #[inline]
    pub fn flags(&self) -> OpcodeFlags {
        self.flags
    }
}

macro_rules! opcodes {
    ($($variant:ident => $mnemonic:literal, $operand:ident, $flags:expr;)*) => {
        /// A CIL opcode or region pseudo-opcode.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Opcode {
            $($variant,)*
        }

        // Entries are in declaration order so `Opcode as usize` indexes the table.
        static OPCODE_TABLE: &[OpcodeInfo] = &[
            $(OpcodeInfo {
                opcode: Opcode::$variant,
                mnemonic: $mnemonic,
                operand: OperandKind::$operand,
                flags: $flags,
            },)*
        ];
    };
}

opcodes! {
    Nop => "nop", None, NONE;

    Ldarg0 => "ldarg.0", None, NONE;
    Ldarg1 => "ldarg.1", None, NONE;
    Ldarg2 => "ldarg.2", None, NONE;
    Ldarg3 => "ldarg.3", None, NONE;
    LdargS => "ldarg.s", Variable, NONE;
    Ldarg => "ldarg", Variable, NONE;
    StargS => "starg.s", Variable, NONE;
    Starg => "starg", Variable, NONE;

    Ldloc0 => "ldloc.0", None, NONE;
    Ldloc1 => "ldloc.1", None, NONE;
    Ldloc2 => "ldloc.2", None, NONE;
    Ldloc3 => "ldloc.3", None, NONE;
    LdlocS => "ldloc.s", Variable, NONE;
    Ldloc => "ldloc", Variable, NONE;
    Stloc0 => "stloc.0", None, NONE;
    Stloc1 => "stloc.1", None, NONE;
    Stloc2 => "stloc.2", None, NONE;
    Stloc3 => "stloc.3", None, NONE;
    StlocS => "stloc.s", Variable, NONE;
    Stloc => "stloc", Variable, NONE;

    Ldnull => "ldnull", None, NONE;
    LdcI4M1 => "ldc.i4.m1", None, NONE;
    LdcI40 => "ldc.i4.0", None, NONE;
    LdcI41 => "ldc.i4.1", None, NONE;
    LdcI42 => "ldc.i4.2", None, NONE;
    LdcI43 => "ldc.i4.3", None, NONE;
    LdcI44 => "ldc.i4.4", None, NONE;
    LdcI45 => "ldc.i4.5", None, NONE;
    LdcI46 => "ldc.i4.6", None, NONE;
    LdcI47 => "ldc.i4.7", None, NONE;
    LdcI48 => "ldc.i4.8", None, NONE;
    LdcI4S => "ldc.i4.s", Int32, NONE;
    LdcI4 => "ldc.i4", Int32, NONE;
    LdcI8 => "ldc.i8", Int64, NONE;
    LdcR4 => "ldc.r4", Float, NONE;
    LdcR8 => "ldc.r8", Float, NONE;
    Ldstr => "ldstr", String, NONE;
    Dup => "dup", None, NONE;
    Pop => "pop", None, NONE;

    Ret => "ret", None, TERM;
    Throw => "throw", None, TERM;
    Rethrow => "rethrow", None, TERM;
    Endfinally => "endfinally", None, TERM;

    Br => "br", Target, JMP;
    BrS => "br.s", Target, JMP;
    Leave => "leave", Target, JMP;
    LeaveS => "leave.s", Target, JMP;
    Brfalse => "brfalse", Target, COND;
    BrfalseS => "brfalse.s", Target, COND;
    Brtrue => "brtrue", Target, COND;
    BrtrueS => "brtrue.s", Target, COND;
    Beq => "beq", Target, REL;
    BeqS => "beq.s", Target, REL;
    Bge => "bge", Target, REL;
    BgeS => "bge.s", Target, REL;
    BgeUn => "bge.un", Target, REL;
    BgeUnS => "bge.un.s", Target, REL;
    Bgt => "bgt", Target, REL;
    BgtS => "bgt.s", Target, REL;
    BgtUn => "bgt.un", Target, REL;
    BgtUnS => "bgt.un.s", Target, REL;
    Ble => "ble", Target, REL;
    BleS => "ble.s", Target, REL;
    BleUn => "ble.un", Target, REL;
    BleUnS => "ble.un.s", Target, REL;
    Blt => "blt", Target, REL;
    BltS => "blt.s", Target, REL;
    BltUn => "blt.un", Target, REL;
    BltUnS => "blt.un.s", Target, REL;
    BneUn => "bne.un", Target, REL;
    BneUnS => "bne.un.s", Target, REL;

    Add => "add", None, NONE;
    AddOvf => "add.ovf", None, NONE;
    AddOvfUn => "add.ovf.un", None, NONE;
    Sub => "sub", None, NONE;
    SubOvf => "sub.ovf", None, NONE;
    SubOvfUn => "sub.ovf.un", None, NONE;
    Mul => "mul", None, NONE;
    MulOvf => "mul.ovf", None, NONE;
    MulOvfUn => "mul.ovf.un", None, NONE;
    Div => "div", None, NONE;
    DivUn => "div.un", None, NONE;
    Rem => "rem", None, NONE;
    RemUn => "rem.un", None, NONE;
    And => "and", None, NONE;
    Or => "or", None, NONE;
    Xor => "xor", None, NONE;

    Try => ".try", None, TRY;
    Catch => ".catch", None, HANDLER;
    Filter => ".filter", None, HANDLER;
    Finally => ".finally", None, HANDLER;
    EndOfFilter => ".endfilter", None, END;
    EndOfHandler => ".endhandler", None, END;
}

impl Opcode {
    /// Static metadata for this opcode.
    #[inline]
    pub fn info(self) -> &'static OpcodeInfo {
        &OPCODE_TABLE[self as usize]
    }

    #[inline]
    pub fn mnemonic(self) -> &'static str {
        self.info().mnemonic
    }

    #[inline]
    pub fn flags(self) -> OpcodeFlags {
        self.info().flags
    }

    #[inline]
    pub fn operand_kind(self) -> OperandKind {
        self.info().operand
    }

    #[inline]
    pub fn is_branch(self) -> bool {
        self.flags().contains(OpcodeFlags::BRANCH)
    }

    #[inline]
    pub fn is_conditional(self) -> bool {
        self.flags().contains(OpcodeFlags::CONDITIONAL)
    }

    #[inline]
    pub fn is_relational(self) -> bool {
        self.flags().contains(OpcodeFlags::RELATIONAL)
    }

    #[inline]
    pub fn is_start_of_handler(self) -> bool {
        self.flags().contains(OpcodeFlags::HANDLER_START)
    }

    /// Look up an opcode by its mnemonic (case-insensitive).
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        lookup(mnemonic).map(OpcodeInfo::opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Error from parsing an [`Opcode`] out of a mnemonic.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown mnemonic `{0}`")]
pub struct UnknownMnemonic(pub String);

impl FromStr for Opcode {
    type Err = UnknownMnemonic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::from_mnemonic(s).ok_or_else(|| UnknownMnemonic(s.to_string()))
    }
}

/// Find the table entry for a mnemonic (case-insensitive).
pub fn lookup(mnemonic: &str) -> Option<&'static OpcodeInfo> {
    OPCODE_TABLE
        .iter()
        .find(|info| info.mnemonic.eq_ignore_ascii_case(mnemonic))
}

/// Every opcode known to the decompiler, in declaration order.
pub fn opcode_table() -> &'static [OpcodeInfo] {
    OPCODE_TABLE
}

pub fn opcode_count() -> usize {
    OPCODE_TABLE.len()
}
