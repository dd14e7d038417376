//! Systematic opcode_table() coverage tests.
//!
//! Validates metadata consistency for every opcode in the table.

use ildc_isa::{Opcode, OpcodeFlags, OperandKind, lookup, opcode_count, opcode_table};

#[test]
fn opcode_count_matches_table() {
    assert!(opcode_count() > 0, "table should have at least one opcode");
    assert_eq!(opcode_count(), opcode_table().len());
}

#[test]
fn lookup_roundtrip_for_all_opcodes() {
    for info in opcode_table() {
        let found = lookup(info.mnemonic());
        assert!(
            found.is_some(),
            "lookup({}) returned None",
            info.mnemonic()
        );
        assert_eq!(
            found.unwrap().opcode(),
            info.opcode(),
            "lookup({}) opcode mismatch",
            info.mnemonic()
        );
        assert_eq!(info.opcode().info().mnemonic(), info.mnemonic());
    }
}

#[test]
fn mnemonics_are_unique() {
    let table = opcode_table();
    for (i, a) in table.iter().enumerate() {
        for b in &table[i + 1..] {
            assert_ne!(a.mnemonic(), b.mnemonic(), "duplicate mnemonic");
        }
    }
}

#[test]
fn mnemonics_are_lowercase_ascii() {
    for info in opcode_table() {
        let m = info.mnemonic();
        assert!(!m.is_empty());
        assert!(
            m.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.'),
            "mnemonic '{m}' has unexpected characters"
        );
    }
}

#[test]
fn branches_carry_target_operands() {
    for info in opcode_table() {
        let is_branch = info.flags().contains(OpcodeFlags::BRANCH);
        let has_target = info.operand_kind() == OperandKind::Target;
        assert_eq!(
            is_branch,
            has_target,
            "'{}': BRANCH flag and Target operand disagree",
            info.mnemonic()
        );
    }
}

#[test]
fn conditional_implies_branch_and_relational_implies_conditional() {
    for info in opcode_table() {
        let flags = info.flags();
        if flags.contains(OpcodeFlags::CONDITIONAL) {
            assert!(flags.contains(OpcodeFlags::BRANCH), "{}", info.mnemonic());
        }
        if flags.contains(OpcodeFlags::RELATIONAL) {
            assert!(flags.contains(OpcodeFlags::CONDITIONAL), "{}", info.mnemonic());
        }
    }
}

#[test]
fn region_markers_are_pseudo() {
    for info in opcode_table() {
        let flags = info.flags();
        let is_marker = flags.intersects(
            OpcodeFlags::TRY_START | OpcodeFlags::HANDLER_START | OpcodeFlags::REGION_END,
        );
        assert_eq!(
            is_marker,
            flags.contains(OpcodeFlags::PSEUDO),
            "'{}'",
            info.mnemonic()
        );
        if is_marker {
            assert!(info.mnemonic().starts_with('.'));
            assert_eq!(info.operand_kind(), OperandKind::None);
        }
    }
}

#[test]
fn handler_starts() {
    let handlers: Vec<Opcode> = opcode_table()
        .iter()
        .map(|info| info.opcode())
        .filter(|op| op.is_start_of_handler())
        .collect();
    assert_eq!(handlers, vec![Opcode::Catch, Opcode::Filter, Opcode::Finally]);
}

#[test]
fn brtrue_and_brfalse_are_not_relational() {
    for op in [
        Opcode::Brtrue,
        Opcode::BrtrueS,
        Opcode::Brfalse,
        Opcode::BrfalseS,
    ] {
        assert!(op.is_conditional());
        assert!(!op.is_relational());
    }
    assert!(Opcode::BneUnS.is_relational());
    assert!(!Opcode::Leave.is_conditional());
}

#[test]
fn parse_is_case_insensitive() {
    assert_eq!("ADD.OVF.UN".parse::<Opcode>(), Ok(Opcode::AddOvfUn));
    assert_eq!(".EndHandler".parse::<Opcode>(), Ok(Opcode::EndOfHandler));
    let err = "frobnicate".parse::<Opcode>().unwrap_err();
    assert_eq!(err.to_string(), "unknown mnemonic `frobnicate`");
}

#[test]
fn display_is_mnemonic() {
    assert_eq!(Opcode::LdcI4S.to_string(), "ldc.i4.s");
    assert_eq!(Opcode::Try.to_string(), ".try");
}
