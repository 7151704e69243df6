//! Renders the AST as nested prefix S-expressions, for debugging the parser.

use crate::ast::{Expr, ExprLiteral, ExprS, Program, Stmt, StmtS};

pub fn print_program(program: &Program) -> String {
    let mut output = String::new();
    for stmt in &program.stmts {
        output += &print_stmt(stmt);
        output.push('\n');
    }
    output
}

pub fn print_stmt((stmt, _): &StmtS) -> String {
    match stmt {
        Stmt::Block(block) => parenthesize("block", block.stmts.iter().map(print_stmt)),
        Stmt::Expr(expr) => parenthesize(";", [print_expr(&expr.value)]),
        Stmt::Func(func) => {
            let params = format!("({})", func.params.join(" "));
            let body = func.body.stmts.iter().map(print_stmt);
            parenthesize(&format!("func {}", func.name), std::iter::once(params).chain(body))
        }
        Stmt::If(if_) => {
            let mut parts = vec![print_expr(&if_.cond), print_stmt(&if_.then)];
            parts.extend(if_.else_.iter().map(print_stmt));
            parenthesize("if", parts)
        }
        Stmt::Print(print) => parenthesize("print", [print_expr(&print.value)]),
        Stmt::Return(return_) => parenthesize("return", return_.value.iter().map(print_expr)),
        Stmt::Var(var) => {
            parenthesize(&format!("var {}", var.name), var.value.iter().map(print_expr))
        }
        Stmt::While(while_) => {
            parenthesize("while", [print_expr(&while_.cond), print_stmt(&while_.body)])
        }
    }
}

pub fn print_expr((expr, _): &ExprS) -> String {
    match expr {
        Expr::Assign(assign) => {
            parenthesize(&format!("= {}", assign.name), [print_expr(&assign.value)])
        }
        Expr::Call(call) => parenthesize(
            "call",
            std::iter::once(print_expr(&call.callee)).chain(call.args.iter().map(print_expr)),
        ),
        Expr::Grouping(grouping) => parenthesize("group", [print_expr(&grouping.inner)]),
        Expr::Infix(infix) => {
            parenthesize(&infix.op.to_string(), [print_expr(&infix.lt), print_expr(&infix.rt)])
        }
        Expr::Literal(literal) => match literal {
            ExprLiteral::Nil => "nil".to_string(),
            ExprLiteral::Bool(bool) => bool.to_string(),
            ExprLiteral::Number(number) => number.to_string(),
            ExprLiteral::String(string) => string.clone(),
        },
        Expr::Logical(logical) => {
            parenthesize(&logical.op.to_string(), [print_expr(&logical.lt), print_expr(&logical.rt)])
        }
        Expr::Prefix(prefix) => parenthesize(&prefix.op.to_string(), [print_expr(&prefix.rt)]),
        Expr::Variable(var) => var.name.clone(),
    }
}

fn parenthesize(name: &str, parts: impl IntoIterator<Item = String>) -> String {
    let mut output = format!("({name}");
    for part in parts {
        output.push_str(&format!(" {part}"));
    }
    output.push(')');
    output
}
