//! Try/catch/filter/finally reconstruction.

mod common;

use common::{branch, decompile, ldc, op, render};
use ildc_decompiler::DecompileError;
use ildc_ir::stmt::StmtKind;
use ildc_isa::Opcode;

#[test]
fn empty_try_catch() {
    let program = [
        op(0, Opcode::Try),
        op(1, Opcode::Catch),
        op(2, Opcode::EndOfHandler),
        op(3, Opcode::Ret),
    ];
    let body = decompile(&program);
    let stmts = body.statements();
    assert_eq!(stmts.len(), 2, "{stmts:?}");

    let StmtKind::TryCatchFinally(try_stmt) = &stmts[0].kind else {
        panic!("expected try statement, got {:?}", stmts[0].kind);
    };
    assert!(body.block(try_stmt.try_body).statements.is_empty());
    assert_eq!(try_stmt.catch_clauses.len(), 1);
    let clause = &try_stmt.catch_clauses[0];
    assert!(clause.exception_type.is_none());
    assert!(clause.filter.is_none());
    assert_eq!(clause.name.as_str(), "ex_0001");
    assert!(body.block(clause.body).statements.is_empty());
    assert!(try_stmt.finally_body.is_none());

    // The walk resumed after `.endhandler`.
    assert!(matches!(stmts[1].kind, StmtKind::Return(None)));
    assert!(body.diagnostics.is_empty());
}

#[test]
fn try_finally_bodies() {
    let program = [
        op(0, Opcode::Try),
        ldc(1, 1),
        op(2, Opcode::Stloc0),
        op(3, Opcode::Finally),
        ldc(4, 2),
        op(5, Opcode::Stloc1),
        op(6, Opcode::Endfinally),
        op(7, Opcode::EndOfHandler),
        op(8, Opcode::Ret),
    ];
    let body = decompile(&program);
    assert_eq!(
        render(&body),
        [
            "try {",
            "V_0 = 1;",
            "} finally {",
            "V_1 = 2;",
            "}",
            "return;",
        ]
    );
    let StmtKind::TryCatchFinally(try_stmt) = &body.statements()[0].kind else {
        panic!("expected try statement");
    };
    assert!(try_stmt.catch_clauses.is_empty());
    assert!(try_stmt.finally_body.is_some());
}

#[test]
fn filter_handler_has_no_clauses() {
    let program = [
        op(0, Opcode::Try),
        op(1, Opcode::Nop),
        op(2, Opcode::Filter),
        ldc(3, 1),
        op(4, Opcode::EndOfFilter),
        op(5, Opcode::Pop),
        op(6, Opcode::EndOfHandler),
        op(7, Opcode::Ret),
    ];
    let body = decompile(&program);
    let stmts = body.statements();
    assert_eq!(stmts.len(), 2);
    let StmtKind::TryCatchFinally(try_stmt) = &stmts[0].kind else {
        panic!("expected try statement");
    };
    assert!(try_stmt.catch_clauses.is_empty());
    assert!(try_stmt.finally_body.is_none());
    assert!(matches!(stmts[1].kind, StmtKind::Return(None)));
}

#[test]
fn nested_regions_nest_blocks() {
    let program = [
        op(0, Opcode::Try),
        op(1, Opcode::Try),
        op(2, Opcode::Nop),
        op(3, Opcode::Finally),
        op(4, Opcode::Nop),
        op(5, Opcode::EndOfHandler),
        op(6, Opcode::Catch),
        op(7, Opcode::Nop),
        op(8, Opcode::EndOfHandler),
        op(9, Opcode::Ret),
    ];
    let body = decompile(&program);
    let stmts = body.statements();
    assert_eq!(stmts.len(), 2);

    let StmtKind::TryCatchFinally(outer) = &stmts[0].kind else {
        panic!("expected outer try");
    };
    assert_eq!(outer.catch_clauses.len(), 1);
    assert_eq!(outer.catch_clauses[0].name.as_str(), "ex_0006");

    let inner_stmts = &body.block(outer.try_body).statements;
    assert_eq!(inner_stmts.len(), 1);
    let StmtKind::TryCatchFinally(inner) = &inner_stmts[0].kind else {
        panic!("expected inner try, got {:?}", inner_stmts[0].kind);
    };
    assert!(inner.catch_clauses.is_empty());
    assert!(inner.finally_body.is_some());

    assert_eq!(
        render(&body),
        [
            "try {",
            "try {",
            "} finally {",
            "}",
            "} catch (object ex_0006) {",
            "}",
            "return;",
        ]
    );
}

#[test]
fn outer_stack_is_discarded_at_region_entry() {
    let program = [
        ldc(0, 1),
        op(1, Opcode::Try),
        op(2, Opcode::Pop),
        op(3, Opcode::Catch),
        op(4, Opcode::EndOfHandler),
        op(5, Opcode::Ret),
    ];
    let body = decompile(&program);
    let errors: Vec<_> = body.diagnostics.iter().map(|d| d.error.clone()).collect();
    assert_eq!(
        errors,
        [
            DecompileError::NonEmptyStackAtRegionEntry { offset: 1, depth: 1 },
            DecompileError::StackUnderflow {
                offset: 2,
                opcode: Opcode::Pop
            },
        ]
    );
    // The value pushed before the region does not reach the return.
    assert!(matches!(body.statements()[1].kind, StmtKind::Return(None)));
}

#[test]
fn try_without_handler_is_skipped() {
    let program = [
        op(0, Opcode::Nop),
        op(1, Opcode::Try),
        op(2, Opcode::Nop),
        op(3, Opcode::Ret),
    ];
    let body = decompile(&program);
    assert!(
        !body
            .statements()
            .iter()
            .any(|s| matches!(s.kind, StmtKind::TryCatchFinally(_)))
    );
    assert!(
        body.diagnostics
            .iter()
            .any(|d| d.error == DecompileError::UnclosedTryRegion { offset: 1 })
    );
    // Only the entry group survives; nothing refers into the dropped body.
    assert_eq!(body.groups.len(), 1);
    assert!(
        body.groups
            .iter()
            .flat_map(|g| &g.statements)
            .all(|h| h.block == body.root)
    );
}

#[test]
fn dropped_try_releases_its_labels() {
    let program = [
        op(0, Opcode::Nop),
        op(1, Opcode::Try),
        op(2, Opcode::Ldarg0),
        branch(3, Opcode::BrtrueS, 5),
        op(4, Opcode::Ret),
        op(5, Opcode::Ret),
    ];
    let body = decompile(&program);
    // The target is first reached inside the handlerless region, so it is
    // rebuilt at top level once the region is dropped.
    assert_eq!(render(&body), ["IL_0005: ;", "return;"]);
    assert_eq!(body.groups.iter().filter(|g| g.offset == 5).count(), 1);
    assert!(
        body.groups
            .iter()
            .flat_map(|g| &g.statements)
            .all(|h| h.block == body.root)
    );
}

#[test]
fn handler_without_try_is_skipped() {
    let program = [
        ldc(0, 1),
        op(1, Opcode::Pop),
        op(2, Opcode::Catch),
        ldc(3, 2),
        op(4, Opcode::Pop),
        op(5, Opcode::EndOfHandler),
        op(6, Opcode::Ret),
    ];
    let body = decompile(&program);
    assert_eq!(render(&body), ["1;", "return;"]);
    assert_eq!(
        body.diagnostics[0].error,
        DecompileError::UnmatchedHandler { offset: 2 }
    );
}

#[test]
fn region_groups_are_recorded() {
    let program = [
        op(0, Opcode::Try),
        ldc(1, 1),
        op(2, Opcode::Pop),
        op(3, Opcode::Catch),
        op(4, Opcode::EndOfHandler),
        op(5, Opcode::Ret),
    ];
    let body = decompile(&program);
    // Entry group, the try body's group and the handler's group.
    assert_eq!(body.groups.len(), 3);
    let try_group = body
        .groups
        .iter()
        .find(|g| g.offset == 0 && g.statements.iter().all(|h| h.block != body.root))
        .expect("try body group");
    let handle = try_group.statements[0];
    assert!(matches!(
        body.statement(handle).map(|s| &s.kind),
        Some(StmtKind::Expression(_))
    ));
}
