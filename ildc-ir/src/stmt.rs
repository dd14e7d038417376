use std::ops::{Index, IndexMut};

use crate::expr::Expr;
use crate::instruction::SourceLocation;
use crate::name::Name;

/// Statement node with the IL span it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `;`
    Empty,
    /// `label: body`
    Labeled { label: Name, body: Box<Stmt> },
    /// `goto label;`
    Goto { label: Name },
    /// `if (condition) then_branch else else_branch`
    Conditional {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Box<Stmt>,
    },
    /// Expression evaluated for its side effect: `expr;`
    Expression(Expr),
    /// `return expr;`
    Return(Option<Expr>),
    /// `throw expr;`, or a rethrow when the operand is absent.
    Throw(Option<Expr>),
    /// `try { } catch { } finally { }`
    TryCatchFinally(TryStatement),
}

/// Try statement whose bodies live in the [`BlockArena`].
#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    pub try_body: BlockId,
    pub catch_clauses: Vec<CatchClause>,
    pub finally_body: Option<BlockId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Caught exception type; `None` catches everything.
    pub exception_type: Option<Name>,
    pub filter: Option<Expr>,
    /// Name bound to the caught exception.
    pub name: Name,
    pub body: BlockId,
}

impl Stmt {
    pub fn new(kind: StmtKind, location: SourceLocation) -> Self {
        Stmt { kind, location }
    }

    pub fn empty(location: SourceLocation) -> Self {
        Stmt::new(StmtKind::Empty, location)
    }

    pub fn labeled(label: Name, body: Stmt, location: SourceLocation) -> Self {
        Stmt::new(
            StmtKind::Labeled {
                label,
                body: Box::new(body),
            },
            location,
        )
    }

    pub fn goto(label: Name, location: SourceLocation) -> Self {
        Stmt::new(StmtKind::Goto { label }, location)
    }

    pub fn conditional(condition: Expr, then_branch: Stmt, else_branch: Stmt, location: SourceLocation) -> Self {
        Stmt::new(
            StmtKind::Conditional {
                condition,
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            location,
        )
    }

    /// Label defined by this statement, if it is a labeled statement.
    pub fn label(&self) -> Option<&Name> {
        match &self.kind {
            StmtKind::Labeled { label, .. } => Some(label),
            _ => None,
        }
    }

    /// Label this statement may jump to, for bare and guarded gotos.
    pub fn goto_target(&self) -> Option<&Name> {
        match &self.kind {
            StmtKind::Goto { label } => Some(label),
            StmtKind::Conditional { then_branch, .. } => then_branch.goto_target(),
            _ => None,
        }
    }
}

/// Index of a block within a [`BlockArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

/// An ordered statement list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub location: SourceLocation,
}

/// Owns every block of a decompiled body; nested bodies refer to blocks by id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockArena {
    blocks: Vec<Block>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, location: SourceLocation) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block {
            statements: Vec::new(),
            location,
        });
        id
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (BlockId(i as u32), b))
    }
}

impl Index<BlockId> for BlockArena {
    type Output = Block;

    fn index(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }
}

impl IndexMut<BlockId> for BlockArena {
    fn index_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::NameTable;

    #[test]
    fn goto_target_sees_through_conditionals() {
        let names = NameTable::new();
        let loc = SourceLocation::new(0, 1);
        let label = names.get_name_for("IL_0004");
        let guard = Expr::new(crate::expr::ExprKind::Argument(0), loc);
        let stmt = Stmt::conditional(guard, Stmt::goto(label.clone(), loc), Stmt::empty(loc), loc);
        assert_eq!(stmt.goto_target(), Some(&label));
        assert_eq!(stmt.label(), None);
    }

    #[test]
    fn arena_allocates_sequential_ids() {
        let mut arena = BlockArena::new();
        let a = arena.alloc(SourceLocation::new(0, 4));
        let b = arena.alloc(SourceLocation::new(4, 8));
        assert_eq!((a, b), (BlockId(0), BlockId(1)));
        arena[b].statements.push(Stmt::empty(SourceLocation::new(4, 5)));
        assert_eq!(arena[b].statements.len(), 1);
        assert!(arena[a].statements.is_empty());
        assert!(arena.get(BlockId(2)).is_none());
    }
}
