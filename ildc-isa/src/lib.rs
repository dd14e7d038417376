//! Opcode definitions for the CIL subset understood by the ildc decompiler.
//!
//! Besides real CIL opcodes the table carries six region pseudo-opcodes
//! (`.try`, `.catch`, `.filter`, `.finally`, `.endfilter`, `.endhandler`)
//! that mark structured exception regions inline in the instruction stream.
//!
//! ```
//! use ildc_isa::{Opcode, OpcodeFlags};
//!
//! let op: Opcode = "brtrue.s".parse().unwrap();
//! assert_eq!(op, Opcode::BrtrueS);
//! assert!(op.flags().contains(OpcodeFlags::CONDITIONAL));
//! ```

mod opcode;

pub use opcode::{
    Opcode, OpcodeFlags, OpcodeInfo, OperandKind, UnknownMnemonic, lookup, opcode_count,
    opcode_table,
};
