use std::sync::{Arc, OnceLock};

use ildc_ir::instruction::{Instruction, SourceLocation};
use ildc_ir::name::NameTable;
use ildc_ir::stmt::{Block, BlockArena, BlockId, Stmt};

use crate::analysis;
use crate::builder::{StatementBuilder, StatementGroup, StmtRef};
use crate::error::Diagnostic;
use crate::structuring;

/// Statements decompiled from one method body.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompiledBody {
    /// Every block of the body; try and handler bodies are referenced by id.
    pub blocks: BlockArena,
    /// The method's top-level block.
    pub root: BlockId,
    /// Statement groups in address order. Every handle points into a block
    /// reachable from `root`; groups of a dropped try region are removed.
    pub groups: Vec<StatementGroup>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DecompiledBody {
    pub fn empty() -> Self {
        let mut blocks = BlockArena::new();
        let root = blocks.alloc(SourceLocation::default());
        DecompiledBody {
            blocks,
            root,
            groups: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// The method's ordered top-level statements.
    pub fn statements(&self) -> &[Stmt] {
        &self.blocks[self.root].statements
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    pub fn statement(&self, handle: StmtRef) -> Option<&Stmt> {
        self.blocks.get(handle.block)?.statements.get(handle.index)
    }
}

/// Decompile one method's instructions into statements.
///
/// Runs the branch/handler analysis, walks statement groups from the first
/// instruction and hands the result to the structuring pass. An empty
/// instruction list yields an empty body without running either.
pub fn decompile_instructions(instructions: &[Instruction], names: &NameTable) -> DecompiledBody {
    if instructions.is_empty() {
        return DecompiledBody::empty();
    }

    let control = analysis::analyze(instructions, names);
    let mut builder = StatementBuilder::new(instructions, control, names);
    builder.construct_statement_groups(0);
    let mut body = builder.finish();
    structuring::structure_groups(&mut body);

    log::debug!(
        "decompiled {} instruction(s) into {} statement(s), {} diagnostic(s)",
        instructions.len(),
        body.statements().len(),
        body.diagnostics.len()
    );
    body
}

/// A method body whose statements are decompiled on first access.
///
/// Concurrent first readers block until the single decompilation finishes;
/// every later read returns the cached body.
pub struct MethodBody {
    name: String,
    instructions: Vec<Instruction>,
    names: Arc<NameTable>,
    decompiled: OnceLock<DecompiledBody>,
}

impl MethodBody {
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>, names: Arc<NameTable>) -> Self {
        MethodBody {
            name: name.into(),
            instructions,
            names,
            decompiled: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn decompiled(&self) -> &DecompiledBody {
        self.decompiled.get_or_init(|| {
            log::debug!("decompiling `{}`", self.name);
            decompile_instructions(&self.instructions, &self.names)
        })
    }

    pub fn statements(&self) -> &[Stmt] {
        self.decompiled().statements()
    }

    pub fn is_decompiled(&self) -> bool {
        self.decompiled.get().is_some()
    }
}

impl std::fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodBody")
            .field("name", &self.name)
            .field("instructions", &self.instructions.len())
            .field("decompiled", &self.is_decompiled())
            .finish()
    }
}
