//! Try/catch/filter/finally reconstruction.
//!
//! Each try body and handler body is walked into a fresh block with a fresh,
//! empty operand stack: the evaluation stack is empty on entry to a protected
//! region or handler.

use ildc_ir::stmt::{BlockId, CatchClause, Stmt, StmtKind, TryStatement};
use ildc_isa::Opcode;

use crate::builder::{StatementBuilder, Walk};
use crate::error::DecompileError;
use crate::stack::OperandStack;

impl StatementBuilder<'_> {
    /// Build the try statement whose `.try` marker is at `try_index` and
    /// append it to the current block.
    ///
    /// Returns the index of the last instruction of the whole region (the
    /// handler's `.endhandler`), so the caller resumes right after it.
    pub(crate) fn construct_try_statement(&mut self, try_index: usize) -> Walk {
        let instructions = self.instructions;
        let try_insn = &instructions[try_index];

        let first_group = self.group_count();
        let (try_body, try_end) = self.construct_region_body(try_index);

        let Some(&handler_index) = self.control.try_to_handler.get(&try_index) else {
            // Already reported by the analyzer; the region and its groups are
            // dropped.
            log::debug!("skipping try region at IL_{:04x}: no handler", try_insn.offset);
            self.discard_groups_from(first_group);
            return try_end;
        };
        let handler_insn = &instructions[handler_index];

        let (handler_body, handler_end) = self.construct_region_body(handler_index);
        let region_end = match self.control.handler_end.get(&handler_index) {
            Some(&end) => Walk::Stopped(end),
            None => handler_end,
        };

        let (catch_clauses, finally_body) = match handler_insn.opcode {
            Opcode::Catch => (vec![self.catch_all_clause(handler_index, handler_body)], None),
            // Filter expressions are not modeled.
            Opcode::Filter => (Vec::new(), None),
            Opcode::Finally => (Vec::new(), Some(handler_body)),
            opcode => {
                self.diagnostics.report(
                    handler_insn.location,
                    DecompileError::UnrecognizedHandler {
                        offset: handler_insn.offset,
                        opcode,
                    },
                );
                return region_end;
            }
        };

        let location = match region_end {
            Walk::Stopped(end) => try_insn.location.span_to(&instructions[end].location),
            Walk::Exhausted => try_insn.location.span_to(&handler_insn.location),
        };
        self.location = try_insn.location;
        self.add_statement(Stmt::new(
            StmtKind::TryCatchFinally(TryStatement {
                try_body,
                catch_clauses,
                finally_body,
            }),
            location,
        ));
        region_end
    }

    /// Walk the body following the region marker at `marker_index` into a new
    /// block, restoring the enclosing block and group afterwards.
    fn construct_region_body(&mut self, marker_index: usize) -> (BlockId, Walk) {
        let instructions = self.instructions;
        let marker = &instructions[marker_index];

        let saved_block = self.current_block;
        let saved_group = self.current_group;

        let block = self.blocks.alloc(marker.location);
        self.current_block = block;
        self.location = marker.location;
        self.open_group(marker.offset, None);

        if !self.stack.is_empty() {
            self.diagnostics.report(
                marker.location,
                DecompileError::NonEmptyStackAtRegionEntry {
                    offset: marker.offset,
                    depth: self.stack.len(),
                },
            );
        }
        self.stack = OperandStack::default();

        let walk = self.construct_statement_groups(marker_index + 1);
        if let Walk::Stopped(end) = walk {
            self.blocks[block].location = marker.location.span_to(&instructions[end].location);
        }

        // Whatever the region left on the stack does not survive leaving it.
        self.stack = OperandStack::default();
        self.current_block = saved_block;
        self.current_group = saved_group;
        (block, walk)
    }

    /// The single catch-everything clause synthesized for a `.catch` handler.
    fn catch_all_clause(&self, handler_index: usize, body: BlockId) -> CatchClause {
        let handler = &self.instructions[handler_index];
        CatchClause {
            exception_type: None,
            filter: None,
            name: self.names.get_name_for(&format!("ex_{:04x}", handler.offset)),
            body,
        }
    }
}
