use crate::env::Env;
use crate::object::{Callable, Clock, Function, Native, NativeFunction, Object};

use lox_common::error::{Error, IoError, Result, TypeError};
use lox_syntax::ast::{
    Expr, ExprLiteral, ExprS, OpInfix, OpLogical, OpPrefix, Program, Stmt, StmtS,
};

use std::io::Write;

/// How a statement finished, when it did not fail.
#[derive(Debug, PartialEq)]
pub(crate) enum Flow {
    Normal,
    /// A `return` is unwinding to the nearest function call.
    Return(Object),
}

/// Below this much remaining stack, evaluation continues on a new segment.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Evaluates programs against a global scope that persists across calls to
/// [`Interpreter::interpret`].
pub struct Interpreter<Stdout> {
    globals: Env,
    stdout: Stdout,
}

impl<Stdout: Write> Interpreter<Stdout> {
    pub fn new(stdout: Stdout) -> Self {
        let mut interpreter = Self { globals: Env::default(), stdout };
        interpreter.reset();
        interpreter
    }

    pub fn stdout(&self) -> &Stdout {
        &self.stdout
    }

    /// Discards every global and re-registers the built-in natives.
    pub fn reset(&mut self) {
        self.globals = Env::default();
        self.define_native(Clock);
    }

    pub fn define_native(&mut self, native: impl NativeFunction + 'static) {
        let native = Native::new(native);
        self.globals.define(native.name(), Object::Native(native.clone()));
    }

    /// Runs `program` to completion, stopping at the first runtime error.
    pub fn interpret(&mut self, program: &Program) -> Result<()> {
        let globals = self.globals.clone();
        for stmt in &program.stmts {
            if let Flow::Return(_) = self.run_stmt(&globals, stmt)? {
                // The parser rejects top-level returns; a hand-built tree
                // that has one just ends the program there.
                break;
            }
        }
        Ok(())
    }

    /// Runs `stmts` in `env` itself, stopping early on `return`.
    pub(crate) fn run_stmts(&mut self, env: &Env, stmts: &[StmtS]) -> Result<Flow> {
        for stmt in stmts {
            match self.run_stmt(env, stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn run_stmt(&mut self, env: &Env, stmt_s: &StmtS) -> Result<Flow> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.run_stmt_inner(env, stmt_s))
    }

    fn run_stmt_inner(&mut self, env: &Env, stmt_s: &StmtS) -> Result<Flow> {
        let (stmt, span) = stmt_s;
        match stmt {
            Stmt::Block(block) => {
                let env = Env::with_parent(env);
                self.run_stmts(&env, &block.stmts)
            }
            Stmt::Expr(expr) => {
                self.run_expr(env, &expr.value)?;
                Ok(Flow::Normal)
            }
            Stmt::Func(func) => {
                let function = Function::new(func, env);
                env.define(&func.name, Object::Function(function));
                Ok(Flow::Normal)
            }
            Stmt::If(if_) => {
                if self.run_expr(env, &if_.cond)?.bool() {
                    self.run_stmt(env, &if_.then)
                } else if let Some(else_) = &if_.else_ {
                    self.run_stmt(env, else_)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::Print(print) => {
                let value = self.run_expr(env, &print.value)?;
                writeln!(self.stdout, "{value}").map_err(|_| {
                    (
                        Error::IoError(IoError::WriteError { file: "stdout".to_string() }),
                        span.clone(),
                    )
                })?;
                Ok(Flow::Normal)
            }
            Stmt::Return(return_) => {
                let object = match &return_.value {
                    Some(value) => self.run_expr(env, value)?,
                    None => Object::Nil,
                };
                Ok(Flow::Return(object))
            }
            Stmt::Var(var) => {
                let value = match &var.value {
                    Some(value) => self.run_expr(env, value)?,
                    None => Object::Nil,
                };
                env.define(&var.name, value);
                Ok(Flow::Normal)
            }
            Stmt::While(while_) => {
                while self.run_expr(env, &while_.cond)?.bool() {
                    if let Flow::Return(object) = self.run_stmt(env, &while_.body)? {
                        return Ok(Flow::Return(object));
                    }
                }
                Ok(Flow::Normal)
            }
        }
    }

    fn run_expr(&mut self, env: &Env, expr_s: &ExprS) -> Result<Object> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.run_expr_inner(env, expr_s))
    }

    fn run_expr_inner(&mut self, env: &Env, expr_s: &ExprS) -> Result<Object> {
        let (expr, span) = expr_s;
        match expr {
            Expr::Assign(assign) => {
                let value = self.run_expr(env, &assign.value)?;
                env.assign(&assign.name, value.clone(), span)?;
                Ok(value)
            }
            Expr::Call(call) => {
                let callee = self.run_expr(env, &call.callee)?;
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.run_expr(env, arg))
                    .collect::<Result<Vec<_>>>()?;

                match &callee {
                    Object::Function(function) => function.call(self, args, &call.paren),
                    Object::Native(native) => native.call(self, args, &call.paren),
                    object => Err((
                        Error::TypeError(TypeError::NotCallable { type_: object.type_() }),
                        call.paren.clone(),
                    )),
                }
            }
            Expr::Grouping(grouping) => self.run_expr(env, &grouping.inner),
            Expr::Infix(infix) => {
                let lt = self.run_expr(env, &infix.lt)?;
                let rt = self.run_expr(env, &infix.rt)?;
                match (infix.op, &lt, &rt) {
                    (OpInfix::Add, Object::Number(a), Object::Number(b)) => Ok(Object::Number(a + b)),
                    (OpInfix::Add, Object::String(a), Object::String(b)) => {
                        Ok(Object::String(a.clone() + b))
                    }
                    (OpInfix::Add, _, _) => Err((
                        Error::TypeError(TypeError::OperandsNotNumbersOrStrings),
                        span.clone(),
                    )),
                    (OpInfix::Subtract, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Number(a - b))
                    }
                    (OpInfix::Multiply, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Number(a * b))
                    }
                    (OpInfix::Divide, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Number(a / b))
                    }
                    (OpInfix::Less, Object::Number(a), Object::Number(b)) => Ok(Object::Bool(a < b)),
                    (OpInfix::LessEqual, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Bool(a <= b))
                    }
                    (OpInfix::Greater, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Bool(a > b))
                    }
                    (OpInfix::GreaterEqual, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Bool(a >= b))
                    }
                    (OpInfix::Equal, a, b) => Ok(Object::Bool(a == b)),
                    (OpInfix::NotEqual, a, b) => Ok(Object::Bool(a != b)),
                    _ => Err((Error::TypeError(TypeError::OperandsNotNumbers), span.clone())),
                }
            }
            Expr::Literal(literal) => Ok(match literal {
                ExprLiteral::Nil => Object::Nil,
                ExprLiteral::Bool(bool) => Object::Bool(*bool),
                ExprLiteral::Number(number) => Object::Number(*number),
                ExprLiteral::String(string) => Object::String(string.clone()),
            }),
            Expr::Logical(logical) => {
                let lt = self.run_expr(env, &logical.lt)?;
                match logical.op {
                    OpLogical::And if !lt.bool() => Ok(lt),
                    OpLogical::Or if lt.bool() => Ok(lt),
                    _ => self.run_expr(env, &logical.rt),
                }
            }
            Expr::Prefix(prefix) => {
                let rt = self.run_expr(env, &prefix.rt)?;
                match (prefix.op, rt) {
                    (OpPrefix::Negate, Object::Number(number)) => Ok(Object::Number(-number)),
                    (OpPrefix::Negate, _) => {
                        Err((Error::TypeError(TypeError::OperandNotNumber), span.clone()))
                    }
                    (OpPrefix::Not, rt) => Ok(Object::Bool(!rt.bool())),
                }
            }
            Expr::Variable(var) => env.get(&var.name, span),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use lox_common::error::NameError;
    use lox_common::types::Span;
    use pretty_assertions::assert_eq;

    fn interpreter() -> Interpreter<Vec<u8>> {
        Interpreter::new(Vec::new())
    }

    fn printed(interpreter: &Interpreter<Vec<u8>>) -> String {
        String::from_utf8(interpreter.stdout().clone()).unwrap()
    }

    fn run(source: &str) -> (String, Result<()>) {
        let program = lox_syntax::parse(source).unwrap_or_else(|e| panic!("syntax errors: {e:?}"));
        let mut interpreter = interpreter();
        let result = interpreter.interpret(&program);
        (printed(&interpreter), result)
    }

    fn output(source: &str) -> String {
        let (output, result) = run(source);
        if let Err(e) = result {
            panic!("runtime error: {e:?}");
        }
        output
    }

    fn error(source: &str) -> (String, Error, Span) {
        let (output, result) = run(source);
        let (e, span) = result.expect_err("program ran without error");
        (output, e, span)
    }

    fn line(source: &str, span: &Span) -> usize {
        source[..span.start].matches('\n').count() + 1
    }

    #[test]
    fn arithmetic() {
        assert_eq!("14\n", output("print 2 + 3 * 4;"));
        assert_eq!("5\n", output("print 10 - 3 - 2;"));
        assert_eq!("20\n", output("print (2 + 3) * 4;"));
        assert_eq!("-3\n", output("print -(1.5) * 2;"));
        assert_eq!("0.5\n", output("print 1 / 2;"));
        assert_eq!("inf\n", output("print 1 / 0;"));
    }

    #[test]
    fn strings() {
        assert_eq!("foobar\n", output(r#"print "foo" + "bar";"#));
        assert_eq!("aab\n", output(r#"var a = "a"; print a + a + "b"; "#));
        assert_eq!("true\nfalse\n", output(r#"print "a" == "a"; print "a" == 1;"#));
    }

    #[test]
    fn truthiness_and_equality() {
        assert_eq!("false\nfalse\ntrue\n", output("print !0; print !\"\"; print !nil;"));
        assert_eq!("true\nfalse\ntrue\n", output("print nil == nil; print nil == false; print 1 != 2;"));
    }

    #[test]
    fn logical_short_circuits() {
        assert_eq!("false\n", output("print false and (1/0);"));
        assert_eq!("true\n", output("print true or (1/0);"));
        assert_eq!("false\ntrue\n", output("print false and undefined; print true or undefined;"));
        // Returns the deciding operand, not a boolean.
        assert_eq!("nil\n2\n", output("print nil and 1; print nil or 2;"));
    }

    #[test]
    fn type_errors() {
        let (_, e, _) = error("print -\"a\";");
        assert_eq!(Error::TypeError(TypeError::OperandNotNumber), e);
        let (_, e, _) = error("print 1 < \"a\";");
        assert_eq!(Error::TypeError(TypeError::OperandsNotNumbers), e);
        let (_, e, _) = error("print 1 + \"a\";");
        assert_eq!("Operands must be two numbers or two strings.", e.to_string());
    }

    #[test]
    fn undefined_variable() {
        let source = "var a = 1;\nprint a;\nprint b;\nprint 3;";
        let (output, e, span) = error(source);
        assert_eq!("1\n", output);
        assert_eq!(Error::NameError(NameError::NotDefined { name: "b".to_string() }), e);
        assert_eq!("Undefined variable 'b'.", e.to_string());
        assert_eq!(3, line(source, &span));
    }

    #[test]
    fn assignment_never_declares() {
        let (_, e, _) = error("x = 1;");
        assert_eq!(Error::NameError(NameError::NotDefined { name: "x".to_string() }), e);
    }

    #[test]
    fn block_shadowing_does_not_leak() {
        assert_eq!("2\n1\n", output("var x = 1; { var x = 2; print x; } print x;"));
        assert_eq!("2\n", output("var x = 1; { x = 2; } print x;"));
    }

    #[test]
    fn scope_restored_after_error_in_block() {
        let program = lox_syntax::parse("var x = 1; { var x = 2; y; }").unwrap();
        let mut interpreter = interpreter();
        assert!(interpreter.interpret(&program).is_err());

        let program = lox_syntax::parse("print x;").unwrap();
        interpreter.interpret(&program).unwrap();
        assert_eq!("1\n", printed(&interpreter));
    }

    #[test]
    fn control_flow() {
        assert_eq!("yes\n", output(r#"if (0) print "yes"; else print "no";"#));
        assert_eq!("no\n", output(r#"if (nil) print "yes"; else print "no";"#));
        assert_eq!("", output(r#"if (false) print "yes";"#));
        assert_eq!("0\n1\n2\n", output("var i = 0; while (i < 3) { print i; i = i + 1; }"));
    }

    #[test]
    fn for_loop_scope() {
        let (output, result) = run("for (var i = 0; i < 3; i = i + 1) print i;\nprint i;");
        assert_eq!("0\n1\n2\n", output);
        let (e, _) = result.unwrap_err();
        assert_eq!(Error::NameError(NameError::NotDefined { name: "i".to_string() }), e);
    }

    #[test]
    fn recursion() {
        let source = "func fact(n) { if (n <= 1) return 1; return n * fact(n - 1); }\nprint fact(5);\nprint fact(5) == 120;";
        assert_eq!("120\ntrue\n", output(source));
    }

    #[test]
    fn deep_recursion() {
        let source = "func depth(n) { if (n <= 0) return 0; return 1 + depth(n - 1); }\nprint depth(10000);";
        assert_eq!("10000\n", output(source));
    }

    #[test]
    fn arity_mismatch() {
        let source = "func fact(n) { return n; }\nfact(1, 2);";
        let (_, e, span) = error(source);
        assert_eq!(Error::TypeError(TypeError::ArityMismatch { exp_args: 1, got_args: 2 }), e);
        assert_eq!("Expected 1 arguments but got 2.", e.to_string());
        assert_eq!(2, line(source, &span));
    }

    #[test]
    fn not_callable() {
        let (_, e, _) = error("\"abc\"();");
        assert_eq!(Error::TypeError(TypeError::NotCallable { type_: "string".to_string() }), e);
    }

    #[test]
    fn callee_is_evaluated_before_arguments() {
        let source = r#"
            func f(a) { return a; }
            func callee() { print "callee"; return f; }
            func arg() { print "arg"; return 1; }
            callee()(arg());
        "#;
        assert_eq!("callee\narg\n", output(source));
    }

    #[test]
    fn closures_share_state() {
        let source = r#"
            var x = 1;
            func makeCounter() {
                func counter() { x = x + 1; return x; }
                return counter;
            }
            var c = makeCounter();
            print c();
            print c();
        "#;
        assert_eq!("2\n3\n", output(source));
    }

    #[test]
    fn closures_capture_defining_scope() {
        let source = r#"
            func makeCounter() {
                var count = 0;
                func counter() { count = count + 1; return count; }
                return counter;
            }
            var a = makeCounter();
            var b = makeCounter();
            print a();
            print a();
            print b();
        "#;
        assert_eq!("1\n2\n1\n", output(source));
    }

    #[test]
    fn scoping_is_lexical() {
        let source = r#"
            var a = "global";
            {
                func show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;
        // With linear lookup at call time, the block's later `a` is visible.
        assert_eq!("global\nblock\n", output(source));

        let source = r#"
            var a = "global";
            func show() { print a; }
            func caller() { var a = "caller"; show(); }
            caller();
        "#;
        assert_eq!("global\n", output(source));
    }

    #[test]
    fn return_unwinds_loops_and_blocks() {
        let source = r#"
            func find() {
                var i = 0;
                while (true) {
                    { if (i == 3) return i; }
                    i = i + 1;
                }
            }
            print find();
            func nothing() { return; }
            print nothing();
            func implicit() {}
            print implicit();
        "#;
        assert_eq!("3\nnil\nnil\n", output(source));
    }

    #[test]
    fn runtime_error_inside_function_is_not_a_return() {
        let source = "func f() { return undefined; }\nprint f();";
        let (output, e, _) = error(source);
        assert_eq!("", output);
        assert_eq!(Error::NameError(NameError::NotDefined { name: "undefined".to_string() }), e);
    }

    #[test]
    fn functions_print() {
        assert_eq!("<func f>\n<native func clock>\n", output("func f() {} print f; print clock;"));
        assert_eq!("true\n", output("print clock() > 0;"));
    }

    #[test]
    fn custom_native() {
        struct Twice;

        impl NativeFunction for Twice {
            fn name(&self) -> &str {
                "twice"
            }

            fn arity(&self) -> usize {
                1
            }

            fn call(&self, args: Vec<Object>) -> Result<Object, Error> {
                match &args[..] {
                    [Object::Number(n)] => Ok(Object::Number(n * 2.0)),
                    _ => Err(Error::TypeError(TypeError::OperandNotNumber)),
                }
            }
        }

        let program = lox_syntax::parse("print twice(21); twice(\"a\");").unwrap();
        let mut interpreter = interpreter();
        interpreter.define_native(Twice);
        let (e, _) = interpreter.interpret(&program).unwrap_err();

        assert_eq!(Error::TypeError(TypeError::OperandNotNumber), e);
        assert_eq!("42\n", printed(&interpreter));
    }

    #[test]
    fn globals_persist_until_reset() {
        let define = lox_syntax::parse("var counter = 0; func bump() { counter = counter + 1; return counter; }").unwrap();
        let program = lox_syntax::parse("print bump(); print bump();").unwrap();

        let mut interpreter = interpreter();
        interpreter.interpret(&define).unwrap();
        interpreter.interpret(&program).unwrap();
        interpreter.reset();
        interpreter.interpret(&define).unwrap();
        interpreter.interpret(&program).unwrap();

        // Identical output both times.
        assert_eq!("1\n2\n1\n2\n", printed(&interpreter));
    }

    #[test]
    fn reset_clears_globals() {
        let program = lox_syntax::parse("var a = 1;").unwrap();
        let mut interpreter = interpreter();
        interpreter.interpret(&program).unwrap();
        interpreter.reset();

        let program = lox_syntax::parse("print a;").unwrap();
        assert!(interpreter.interpret(&program).is_err());
        let program = lox_syntax::parse("print clock == clock;").unwrap();
        interpreter.interpret(&program).unwrap();
        assert_eq!("true\n", printed(&interpreter));
    }
}
