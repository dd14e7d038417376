use std::collections::HashMap;

use ildc_ir::instruction::Instruction;
use ildc_ir::name::{Name, NameTable};
use ildc_isa::Opcode;

use crate::error::{DecompileError, Diagnostic, Diagnostics};

/// Where a branch target landed and the label synthesized for it.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchTargetInfo {
    pub target_instruction_index: usize,
    pub target_label: Name,
}

/// Result of the single forward analysis pass over a method.
#[derive(Debug, Default)]
pub struct ControlInfo {
    /// Branch target offset -> resolved target. Complete for every target
    /// that lands on an instruction boundary.
    pub branch_targets: HashMap<u32, BranchTargetInfo>,
    /// Index of a `.try` marker -> index of its handler-start marker.
    pub try_to_handler: HashMap<usize, usize>,
    /// Index of a handler-start marker -> index of its `.endhandler`.
    pub handler_end: HashMap<usize, usize>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Synthesized label text for a branch target offset.
pub fn label_text(offset: u32) -> String {
    format!("IL_{offset:04x}")
}

/// Find every branch target and pair each try region with its handler.
///
/// Try and handler markers are matched with stack discipline: a handler start
/// closes the innermost try that is still open.
pub fn analyze(instructions: &[Instruction], names: &NameTable) -> ControlInfo {
    let mut diagnostics = Diagnostics::default();

    // Targets are recorded unresolved first, then filled in when the walk
    // below reaches the instruction at that offset.
    let mut targets: HashMap<u32, Option<BranchTargetInfo>> = HashMap::new();
    for insn in instructions.iter().filter(|insn| insn.is_branch()) {
        match insn.branch_target() {
            Some(target) => {
                targets.entry(target).or_insert(None);
            }
            None => diagnostics.report(
                insn.location,
                DecompileError::MissingBranchTarget {
                    offset: insn.offset,
                },
            ),
        }
    }

    let mut try_to_handler = HashMap::new();
    let mut handler_end = HashMap::new();
    let mut try_stack: Vec<usize> = Vec::new();
    let mut handler_stack: Vec<usize> = Vec::new();

    for (index, insn) in instructions.iter().enumerate() {
        if let Some(slot) = targets.get_mut(&insn.offset) {
            *slot = Some(BranchTargetInfo {
                target_instruction_index: index,
                target_label: names.get_name_for(&label_text(insn.offset)),
            });
        }

        if insn.opcode == Opcode::Try {
            try_stack.push(index);
        } else if insn.is_start_of_handler() {
            match try_stack.pop() {
                Some(try_index) => {
                    try_to_handler.insert(try_index, index);
                }
                None => diagnostics.report(
                    insn.location,
                    DecompileError::UnmatchedHandler {
                        offset: insn.offset,
                    },
                ),
            }
            handler_stack.push(index);
        } else if insn.opcode == Opcode::EndOfHandler {
            match handler_stack.pop() {
                Some(handler_index) => {
                    handler_end.insert(handler_index, index);
                }
                None => log::debug!("stray .endhandler at IL_{:04x}", insn.offset),
            }
        }
    }

    for try_index in try_stack {
        let insn = &instructions[try_index];
        diagnostics.report(
            insn.location,
            DecompileError::UnclosedTryRegion {
                offset: insn.offset,
            },
        );
    }

    for insn in instructions.iter().filter(|insn| insn.is_branch()) {
        if let Some(target) = insn.branch_target() {
            if matches!(targets.get(&target), Some(None)) {
                diagnostics.report(
                    insn.location,
                    DecompileError::UnresolvedBranchTarget {
                        offset: insn.offset,
                        target,
                    },
                );
            }
        }
    }

    let branch_targets: HashMap<u32, BranchTargetInfo> = targets
        .into_iter()
        .filter_map(|(offset, info)| info.map(|info| (offset, info)))
        .collect();

    log::debug!(
        "analysis: {} branch target(s), {} try region(s)",
        branch_targets.len(),
        try_to_handler.len()
    );

    ControlInfo {
        branch_targets,
        try_to_handler,
        handler_end,
        diagnostics: diagnostics.into_vec(),
    }
}
