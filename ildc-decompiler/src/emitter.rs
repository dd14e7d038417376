use std::fmt::Write;

use ildc_ir::expr::{Constant, Expr, ExprKind};
use ildc_ir::stmt::{BlockId, Stmt, StmtKind};

use crate::body::DecompiledBody;

/// Render a decompiled body as C#-like source text.
pub fn emit_body(body: &DecompiledBody) -> String {
    let mut out = String::new();
    emit_block(&mut out, body, body.root, 0);
    out
}

fn emit_block(out: &mut String, body: &DecompiledBody, block: BlockId, indent: usize) {
    let Some(block) = body.blocks.get(block) else {
        return;
    };
    for stmt in &block.statements {
        emit_stmt(out, body, stmt, indent);
    }
}

fn indent_str(level: usize) -> String {
    "    ".repeat(level)
}

fn emit_stmt(out: &mut String, body: &DecompiledBody, stmt: &Stmt, indent: usize) {
    let pad = indent_str(indent);
    match &stmt.kind {
        StmtKind::Empty => {
            let _ = writeln!(out, "{pad};");
        }
        StmtKind::Labeled { label, body: inner } => {
            if matches!(inner.kind, StmtKind::Empty) {
                let _ = writeln!(out, "{pad}{label}: ;");
            } else {
                let _ = writeln!(out, "{pad}{label}:");
                emit_stmt(out, body, inner, indent);
            }
        }
        StmtKind::Goto { label } => {
            let _ = writeln!(out, "{pad}goto {label};");
        }
        StmtKind::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            let cond = emit_expr(condition);
            match (&then_branch.kind, &else_branch.kind) {
                (StmtKind::Goto { label }, StmtKind::Empty) => {
                    let _ = writeln!(out, "{pad}if ({cond}) goto {label};");
                }
                (_, else_kind) => {
                    let _ = writeln!(out, "{pad}if ({cond}) {{");
                    emit_stmt(out, body, then_branch, indent + 1);
                    if !matches!(else_kind, StmtKind::Empty) {
                        let _ = writeln!(out, "{pad}}} else {{");
                        emit_stmt(out, body, else_branch, indent + 1);
                    }
                    let _ = writeln!(out, "{pad}}}");
                }
            }
        }
        StmtKind::Expression(e) => {
            let _ = writeln!(out, "{pad}{};", emit_expr(e));
        }
        StmtKind::Return(None) => {
            let _ = writeln!(out, "{pad}return;");
        }
        StmtKind::Return(Some(e)) => {
            let _ = writeln!(out, "{pad}return {};", emit_expr(e));
        }
        StmtKind::Throw(None) => {
            let _ = writeln!(out, "{pad}throw;");
        }
        StmtKind::Throw(Some(e)) => {
            let _ = writeln!(out, "{pad}throw {};", emit_expr(e));
        }
        StmtKind::TryCatchFinally(try_stmt) => {
            let _ = writeln!(out, "{pad}try {{");
            emit_block(out, body, try_stmt.try_body, indent + 1);
            for clause in &try_stmt.catch_clauses {
                let ty = clause
                    .exception_type
                    .as_ref()
                    .map_or("object", |name| name.as_str());
                match &clause.filter {
                    Some(filter) => {
                        let _ = writeln!(
                            out,
                            "{pad}}} catch ({ty} {}) when ({}) {{",
                            clause.name,
                            emit_expr(filter)
                        );
                    }
                    None => {
                        let _ = writeln!(out, "{pad}}} catch ({ty} {}) {{", clause.name);
                    }
                }
                emit_block(out, body, clause.body, indent + 1);
            }
            if let Some(finally_body) = try_stmt.finally_body {
                let _ = writeln!(out, "{pad}}} finally {{");
                emit_block(out, body, finally_body, indent + 1);
            }
            let _ = writeln!(out, "{pad}}}");
        }
    }
}

fn emit_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Constant(Constant::Int32(v)) => format!("{v}"),
        ExprKind::Constant(Constant::Int64(v)) => format!("{v}L"),
        ExprKind::Constant(Constant::Float(v)) => format!("{v:?}"),
        ExprKind::Constant(Constant::String(s)) => format!("\"{}\"", escape_string(s)),
        ExprKind::Constant(Constant::Null) => "null".into(),
        ExprKind::Argument(index) => format!("A_{index}"),
        ExprKind::Local(index) => format!("V_{index}"),
        ExprKind::Binary {
            op,
            left,
            right,
            checked_overflow,
            unsigned,
        } => {
            let l = emit_expr_paren(left);
            let r = emit_expr_paren(right);
            let text = if *unsigned {
                format!("{l} /*un*/{op} {r}")
            } else {
                format!("{l} {op} {r}")
            };
            if *checked_overflow {
                format!("checked({text})")
            } else {
                text
            }
        }
        ExprKind::Assign { target, value } => {
            format!("{} = {}", emit_expr(target), emit_expr(value))
        }
    }
}

fn emit_expr_paren(expr: &Expr) -> String {
    let s = emit_expr(expr);
    match &expr.kind {
        // checked(...) already brackets itself
        ExprKind::Binary {
            checked_overflow: false,
            ..
        }
        | ExprKind::Assign { .. } => format!("({s})"),
        _ => s,
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
