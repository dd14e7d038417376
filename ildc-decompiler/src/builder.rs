use std::collections::HashMap;
use std::collections::hash_map::Entry;

use ildc_ir::expr::{BinOp, Expr};
use ildc_ir::instruction::{Instruction, SourceLocation};
use ildc_ir::name::{Name, NameTable};
use ildc_ir::stmt::{BlockArena, BlockId, Stmt, StmtKind};
use ildc_isa::Opcode;

use crate::analysis::ControlInfo;
use crate::body::DecompiledBody;
use crate::error::{DecompileError, Diagnostics};
use crate::stack::{self, OperandStack};

/// How a walk over a linear run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Walk {
    /// Stopped at this instruction index: a merge point, a region end, or an
    /// instruction that ends the run. The caller decides where to resume.
    Stopped(usize),
    /// Ran off the end of the instruction list; no further work.
    Exhausted,
}

/// Handle to a statement stored in a [`BlockArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtRef {
    pub block: BlockId,
    pub index: usize,
}

/// The statements produced for one reachable basic run.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementGroup {
    /// Offset of the instruction that opened the group.
    pub offset: u32,
    /// Label of the run when it starts at a branch target.
    pub label: Option<Name>,
    pub statements: Vec<StmtRef>,
}

/// Recursive-descent walker turning instruction runs into statements.
///
/// Statements go both into the current block and into the current statement
/// group. Try and handler bodies get their own block, group and operand stack
/// (see `regions.rs`).
pub(crate) struct StatementBuilder<'a> {
    pub(crate) instructions: &'a [Instruction],
    pub(crate) control: ControlInfo,
    pub(crate) names: &'a NameTable,
    pub(crate) blocks: BlockArena,
    root: BlockId,
    pub(crate) current_block: BlockId,
    groups: Vec<StatementGroup>,
    group_by_offset: HashMap<u32, usize>,
    pub(crate) current_group: Option<usize>,
    pub(crate) stack: OperandStack,
    pub(crate) location: SourceLocation,
    pub(crate) diagnostics: Diagnostics,
}

impl<'a> StatementBuilder<'a> {
    pub(crate) fn new(
        instructions: &'a [Instruction],
        mut control: ControlInfo,
        names: &'a NameTable,
    ) -> Self {
        let location = match (instructions.first(), instructions.last()) {
            (Some(first), Some(last)) => first.location.span_to(&last.location),
            _ => SourceLocation::default(),
        };
        let mut blocks = BlockArena::new();
        let root = blocks.alloc(location);
        let diagnostics = Diagnostics::from_vec(std::mem::take(&mut control.diagnostics));
        StatementBuilder {
            instructions,
            control,
            names,
            blocks,
            root,
            current_block: root,
            groups: Vec::new(),
            group_by_offset: HashMap::new(),
            current_group: None,
            stack: OperandStack::default(),
            location,
            diagnostics,
        }
    }

    pub(crate) fn finish(self) -> DecompiledBody {
        DecompiledBody {
            blocks: self.blocks,
            root: self.root,
            groups: self.groups,
            diagnostics: self.diagnostics.into_vec(),
        }
    }

    pub(crate) fn add_statement(&mut self, statement: Stmt) {
        let block = &mut self.blocks[self.current_block];
        let index = block.statements.len();
        block.statements.push(statement);
        if let Some(group) = self.current_group {
            self.groups[group].statements.push(StmtRef {
                block: self.current_block,
                index,
            });
        }
    }

    /// Make a new group current. The group claims `offset` unless another
    /// group already owns it, in which case it stays anonymous.
    pub(crate) fn open_group(&mut self, offset: u32, label: Option<Name>) {
        let id = self.groups.len();
        self.groups.push(StatementGroup {
            offset,
            label: label.clone(),
            statements: Vec::new(),
        });
        if let Entry::Vacant(slot) = self.group_by_offset.entry(offset) {
            slot.insert(id);
        }
        self.current_group = Some(id);
        if let Some(label) = label {
            let location = self.location;
            self.add_statement(Stmt::labeled(label, Stmt::empty(location), location));
        }
    }

    pub(crate) fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Drop every group created since `first`, releasing the offsets they
    /// claimed.
    pub(crate) fn discard_groups_from(&mut self, first: usize) {
        self.groups.truncate(first);
        self.group_by_offset.retain(|_, id| *id < first);
        if self.current_group.is_some_and(|id| id >= first) {
            self.current_group = None;
        }
    }

    pub(crate) fn report_underflow(&mut self, insn: &Instruction) {
        self.diagnostics.report(
            insn.location,
            DecompileError::StackUnderflow {
                offset: insn.offset,
                opcode: insn.opcode,
            },
        );
    }

    /// Walk instructions from `start`, emitting statements until the run
    /// reaches an already-grouped offset, a region end, or a terminator.
    pub(crate) fn construct_statement_groups(&mut self, start: usize) -> Walk {
        let instructions = self.instructions;
        let mut index = start;
        while index < instructions.len() {
            let insn = &instructions[index];
            if self.group_by_offset.contains_key(&insn.offset) {
                log::trace!("IL_{:04x} already visited", insn.offset);
                return Walk::Stopped(index);
            }
            self.location = insn.location;

            let target_label = self
                .control
                .branch_targets
                .get(&insn.offset)
                .map(|info| info.target_label.clone());
            if target_label.is_some() || index == 0 {
                self.open_group(insn.offset, target_label);
            }

            if insn.is_branch() {
                match self.construct_branch(index, insn) {
                    Some(fallthrough) => {
                        index = fallthrough;
                        continue;
                    }
                    None => return Walk::Stopped(index),
                }
            }

            if let Some((op, checked_overflow, unsigned)) = stack::arithmetic(insn.opcode) {
                self.construct_binary(insn, op, checked_overflow, unsigned);
                index += 1;
                continue;
            }

            match insn.opcode {
                Opcode::EndOfFilter | Opcode::EndOfHandler => return Walk::Stopped(index),
                // Control cannot fall into a handler; reaching one ends the run.
                // A handler without a try region is skipped as a whole.
                op if op.is_start_of_handler() => {
                    let paired = self.control.try_to_handler.values().any(|&h| h == index);
                    match self.control.handler_end.get(&index) {
                        Some(&end) if !paired => {
                            index = end + 1;
                            continue;
                        }
                        _ => return Walk::Stopped(index),
                    }
                }
                Opcode::Pop => self.construct_expression_statement(insn),
                Opcode::Dup => match self.stack.peek().cloned() {
                    Some(top) => self.stack.push(top),
                    None => self.report_underflow(insn),
                },
                Opcode::Try => match self.construct_try_statement(index) {
                    Walk::Stopped(end) => {
                        index = end + 1;
                        continue;
                    }
                    Walk::Exhausted => return Walk::Exhausted,
                },
                Opcode::Ret => {
                    self.construct_return(insn);
                    return Walk::Stopped(index);
                }
                Opcode::Throw => {
                    match self.stack.pop() {
                        Ok(exception) => {
                            let location = insn.location.span_to(&exception.location);
                            self.add_statement(Stmt::new(StmtKind::Throw(Some(exception)), location));
                        }
                        Err(_) => self.report_underflow(insn),
                    }
                    return Walk::Stopped(index);
                }
                Opcode::Rethrow => {
                    self.add_statement(Stmt::new(StmtKind::Throw(None), insn.location));
                    return Walk::Stopped(index);
                }
                Opcode::Endfinally => return Walk::Stopped(index),
                _ => {
                    if let Some(value) = stack::load(insn) {
                        self.stack.push(value);
                    } else if let Some(target) = stack::store_target(insn) {
                        self.construct_store(insn, target);
                    }
                }
            }
            index += 1;
        }
        Walk::Exhausted
    }

    /// Emit a goto (guarded when a condition can be derived), explore the
    /// target, and return the fallthrough index if the goto was guarded.
    fn construct_branch(&mut self, index: usize, insn: &Instruction) -> Option<usize> {
        // Missing and unresolved targets were reported by the analyzer.
        let target = insn
            .branch_target()
            .and_then(|offset| self.control.branch_targets.get(&offset))?;
        let target_index = target.target_instruction_index;
        let location = self.location;
        let goto = Stmt::goto(target.target_label.clone(), location);

        let condition = if insn.opcode.is_conditional() {
            self.construct_branch_condition(insn)
        } else {
            None
        };
        let guarded = condition.is_some();
        let statement = match condition {
            Some(condition) => {
                Stmt::conditional(condition, goto, Stmt::empty(location), location)
            }
            None => goto,
        };
        self.add_statement(statement);

        // The target starts with the stack as it is at the branch; the
        // fallthrough path keeps its own copy.
        let saved_stack = self.stack.clone();
        let saved_group = self.current_group;
        self.construct_statement_groups(target_index);
        self.stack = saved_stack;
        self.current_group = saved_group;
        self.location = insn.location;

        guarded.then_some(index + 1)
    }

    /// Guard under which a conditional branch is taken, when it can be
    /// expressed. Comparison branches yield no guard, and neither does
    /// `brfalse` with a single operand on the stack.
    fn construct_branch_condition(&mut self, insn: &Instruction) -> Option<Expr> {
        let is_brtrue = matches!(insn.opcode, Opcode::Brtrue | Opcode::BrtrueS);
        match self.stack.len() {
            0 => {
                self.report_underflow(insn);
                None
            }
            1 => {
                let operand = self.stack.pop().ok()?;
                is_brtrue.then_some(operand)
            }
            _ => {
                let (deeper, top) = self.stack.pop_pair().ok()?;
                if insn.opcode.is_relational() {
                    return None;
                }
                // Both forms guard on the shallower operand here.
                self.stack.push(deeper);
                Some(top)
            }
        }
    }

    fn construct_binary(&mut self, insn: &Instruction, op: BinOp, checked_overflow: bool, unsigned: bool) {
        if self.stack.push_binary(op, checked_overflow, unsigned).is_err() {
            self.report_underflow(insn);
        }
    }

    fn construct_expression_statement(&mut self, insn: &Instruction) {
        match self.stack.pop() {
            Ok(operand) => {
                let location = operand.location.span_to(&insn.location);
                self.add_statement(Stmt::new(StmtKind::Expression(operand), location));
            }
            Err(_) => self.report_underflow(insn),
        }
    }

    fn construct_store(&mut self, insn: &Instruction, target: Expr) {
        match self.stack.pop() {
            Ok(value) => {
                let location = value.location.span_to(&insn.location);
                let assignment = Expr::assign(target, value, location);
                self.add_statement(Stmt::new(StmtKind::Expression(assignment), location));
            }
            Err(_) => self.report_underflow(insn),
        }
    }

    fn construct_return(&mut self, insn: &Instruction) {
        let value = self.stack.pop().ok();
        let location = value
            .as_ref()
            .map_or(insn.location, |v| v.location.span_to(&insn.location));
        self.add_statement(Stmt::new(StmtKind::Return(value), location));
    }
}
