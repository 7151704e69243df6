use crate::ast::{
    Expr, ExprAssign, ExprCall, ExprGrouping, ExprInfix, ExprLiteral, ExprLogical, ExprPrefix,
    ExprS, ExprVariable, OpInfix, OpLogical, OpPrefix, Program, Stmt, StmtBlock, StmtExpr,
    StmtFunc, StmtIf, StmtPrint, StmtReturn, StmtS, StmtVar, StmtWhile,
};
use crate::token::{Literal, Token, TokenKind};

use lox_common::error::{Error, ErrorS, SyntaxError};
use lox_common::types::Span;

use std::rc::Rc;

/// Upper bound on arguments in a call and parameters in a declaration.
pub const MAX_ARGS: usize = 255;

type Result<T, E = ErrorS> = std::result::Result<T, E>;

/// Recursive-descent parser over a token stream ending in [`TokenKind::Eof`].
///
/// Errors inside a declaration abort that declaration only: the parser
/// records the error, skips to the next statement boundary and carries on,
/// so a single run reports as many errors as possible. Some errors (invalid
/// assignment targets, too many arguments, `return` at top level) are
/// recorded without unwinding at all.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ErrorS>,
    func_depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::Eof) {
            let (line, end) =
                tokens.last().map(|token| (token.line, token.span.end)).unwrap_or((1, 0));
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                literal: None,
                line,
                span: end..end,
            });
        }
        Self { tokens, current: 0, errors: Vec::new(), func_depth: 0 }
    }

    /// Parses every declaration up to end of input. The program holds each
    /// declaration that parsed cleanly, even when errors were reported.
    pub fn parse(mut self) -> (Program, Vec<ErrorS>) {
        let mut program = Program::default();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                program.stmts.push(stmt);
            }
        }
        (program, self.errors)
    }

    fn declaration(&mut self) -> Option<StmtS> {
        let result = if self.matches(TokenKind::Func) {
            self.func_declaration()
        } else if self.matches(TokenKind::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn func_declaration(&mut self) -> Result<StmtS> {
        let start = self.previous().span.start;
        let name = self.consume(TokenKind::Identifier, "function name")?.lexeme.clone();
        self.consume(TokenKind::LtParen, "'(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RtParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    let span = self.peek().span.clone();
                    self.report(SyntaxError::TooManyParameters { max: MAX_ARGS }, span);
                }
                params.push(self.consume(TokenKind::Identifier, "parameter name")?.lexeme.clone());
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RtParen, "')' after parameters")?;
        self.consume(TokenKind::LtBrace, "'{' before function body")?;

        self.func_depth += 1;
        let stmts = self.block();
        self.func_depth -= 1;

        let func = StmtFunc { name, params, body: StmtBlock { stmts: stmts? } };
        Ok((Stmt::Func(Rc::new(func)), self.span_from(start)))
    }

    fn var_declaration(&mut self) -> Result<StmtS> {
        let start = self.previous().span.start;
        let name = self.consume(TokenKind::Identifier, "variable name")?.lexeme.clone();
        let value = if self.matches(TokenKind::Equal) { Some(self.expression()?) } else { None };
        self.consume(TokenKind::Semicolon, "';' after variable declaration")?;
        Ok((Stmt::Var(StmtVar { name, value }), self.span_from(start)))
    }

    fn statement(&mut self) -> Result<StmtS> {
        if self.matches(TokenKind::For) {
            self.for_statement()
        } else if self.matches(TokenKind::If) {
            self.if_statement()
        } else if self.matches(TokenKind::Print) {
            self.print_statement()
        } else if self.matches(TokenKind::Return) {
            self.return_statement()
        } else if self.matches(TokenKind::While) {
            self.while_statement()
        } else if self.matches(TokenKind::LtBrace) {
            let start = self.previous().span.start;
            let stmts = self.block()?;
            Ok((Stmt::Block(StmtBlock { stmts }), self.span_from(start)))
        } else {
            self.expression_statement()
        }
    }

    /// There is no loop node for `for`. It becomes
    /// `{ init; while (cond) { body; incr; } }`, with `true` standing in for
    /// a missing condition. The loop shares a single scope across iterations.
    fn for_statement(&mut self) -> Result<StmtS> {
        let start = self.previous().span.start;
        self.consume(TokenKind::LtParen, "'(' after 'for'")?;

        let init = if self.matches(TokenKind::Semicolon) {
            None
        } else if self.matches(TokenKind::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let cond = if self.check(TokenKind::Semicolon) {
            let span = self.peek().span.clone();
            (Expr::Literal(ExprLiteral::Bool(true)), span)
        } else {
            self.expression()?
        };
        self.consume(TokenKind::Semicolon, "';' after loop condition")?;

        let incr = if self.check(TokenKind::RtParen) { None } else { Some(self.expression()?) };
        self.consume(TokenKind::RtParen, "')' after for clauses")?;

        let body = self.statement()?;
        let span = self.span_from(start);

        let mut body_stmts = vec![body];
        if let Some(incr) = incr {
            let incr_span = incr.1.clone();
            body_stmts.push((Stmt::Expr(StmtExpr { value: incr }), incr_span));
        }
        let body = (Stmt::Block(StmtBlock { stmts: body_stmts }), span.clone());
        let while_ = (Stmt::While(Box::new(StmtWhile { cond, body })), span.clone());

        let mut stmts = Vec::with_capacity(2);
        stmts.extend(init);
        stmts.push(while_);
        Ok((Stmt::Block(StmtBlock { stmts }), span))
    }

    fn if_statement(&mut self) -> Result<StmtS> {
        let start = self.previous().span.start;
        self.consume(TokenKind::LtParen, "'(' after 'if'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RtParen, "')' after if condition")?;

        let then = self.statement()?;
        let else_ = if self.matches(TokenKind::Else) { Some(self.statement()?) } else { None };
        Ok((Stmt::If(Box::new(StmtIf { cond, then, else_ })), self.span_from(start)))
    }

    fn print_statement(&mut self) -> Result<StmtS> {
        let start = self.previous().span.start;
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "';' after value")?;
        Ok((Stmt::Print(StmtPrint { value }), self.span_from(start)))
    }

    fn return_statement(&mut self) -> Result<StmtS> {
        let keyword = self.previous().span.clone();
        if self.func_depth == 0 {
            self.report(SyntaxError::ReturnOutsideFunction, keyword.clone());
        }
        let value = if self.check(TokenKind::Semicolon) { None } else { Some(self.expression()?) };
        self.consume(TokenKind::Semicolon, "';' after return value")?;
        Ok((Stmt::Return(StmtReturn { value }), self.span_from(keyword.start)))
    }

    fn while_statement(&mut self) -> Result<StmtS> {
        let start = self.previous().span.start;
        self.consume(TokenKind::LtParen, "'(' after 'while'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RtParen, "')' after condition")?;
        let body = self.statement()?;
        Ok((Stmt::While(Box::new(StmtWhile { cond, body })), self.span_from(start)))
    }

    fn expression_statement(&mut self) -> Result<StmtS> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "';' after expression")?;
        let span = self.span_from(value.1.start);
        Ok((Stmt::Expr(StmtExpr { value }), span))
    }

    /// Parses the declarations of a block whose `{` was already consumed.
    fn block(&mut self) -> Result<Vec<StmtS>> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RtBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }
        }
        self.consume(TokenKind::RtBrace, "'}' after block")?;
        Ok(stmts)
    }

    fn expression(&mut self) -> Result<ExprS> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<ExprS> {
        let expr = self.logic_or()?;
        if !self.matches(TokenKind::Equal) {
            return Ok(expr);
        }

        let equals = self.previous().span.clone();
        let value = self.assignment()?;
        match expr {
            (Expr::Variable(var), span) => {
                let span = span.start..value.1.end;
                Ok((Expr::Assign(Box::new(ExprAssign { name: var.name, value })), span))
            }
            expr => {
                self.report(SyntaxError::InvalidAssignmentTarget, equals);
                Ok(expr)
            }
        }
    }

    fn logic_or(&mut self) -> Result<ExprS> {
        self.logical(Self::logic_and, TokenKind::Or, OpLogical::Or)
    }

    fn logic_and(&mut self) -> Result<ExprS> {
        self.logical(Self::equality, TokenKind::And, OpLogical::And)
    }

    fn equality(&mut self) -> Result<ExprS> {
        self.infix(
            Self::comparison,
            &[(TokenKind::BangEqual, OpInfix::NotEqual), (TokenKind::EqualEqual, OpInfix::Equal)],
        )
    }

    fn comparison(&mut self) -> Result<ExprS> {
        self.infix(
            Self::term,
            &[
                (TokenKind::Greater, OpInfix::Greater),
                (TokenKind::GreaterEqual, OpInfix::GreaterEqual),
                (TokenKind::Less, OpInfix::Less),
                (TokenKind::LessEqual, OpInfix::LessEqual),
            ],
        )
    }

    fn term(&mut self) -> Result<ExprS> {
        self.infix(
            Self::factor,
            &[(TokenKind::Minus, OpInfix::Subtract), (TokenKind::Plus, OpInfix::Add)],
        )
    }

    fn factor(&mut self) -> Result<ExprS> {
        self.infix(
            Self::unary,
            &[(TokenKind::Slash, OpInfix::Divide), (TokenKind::Asterisk, OpInfix::Multiply)],
        )
    }

    /// One left-associative precedence level: `operand (op operand)*`, each
    /// iteration folding the result so far into the left child.
    fn infix(
        &mut self,
        operand: fn(&mut Self) -> Result<ExprS>,
        ops: &[(TokenKind, OpInfix)],
    ) -> Result<ExprS> {
        let mut lt = operand(self)?;
        while let Some(op) = self.match_op(ops) {
            let rt = operand(self)?;
            let span = lt.1.start..rt.1.end;
            lt = (Expr::Infix(Box::new(ExprInfix { lt, op, rt })), span);
        }
        Ok(lt)
    }

    fn logical(
        &mut self,
        operand: fn(&mut Self) -> Result<ExprS>,
        kind: TokenKind,
        op: OpLogical,
    ) -> Result<ExprS> {
        let mut lt = operand(self)?;
        while self.matches(kind) {
            let rt = operand(self)?;
            let span = lt.1.start..rt.1.end;
            lt = (Expr::Logical(Box::new(ExprLogical { lt, op, rt })), span);
        }
        Ok(lt)
    }

    fn unary(&mut self) -> Result<ExprS> {
        match self.match_op(&[(TokenKind::Bang, OpPrefix::Not), (TokenKind::Minus, OpPrefix::Negate)])
        {
            Some(op) => {
                let start = self.previous().span.start;
                let rt = self.unary()?;
                let span = start..rt.1.end;
                Ok((Expr::Prefix(Box::new(ExprPrefix { op, rt })), span))
            }
            None => self.call(),
        }
    }

    fn call(&mut self) -> Result<ExprS> {
        let mut expr = self.primary()?;
        while self.matches(TokenKind::LtParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: ExprS) -> Result<ExprS> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RtParen) {
            loop {
                if args.len() >= MAX_ARGS {
                    let span = self.peek().span.clone();
                    self.report(SyntaxError::TooManyArguments { max: MAX_ARGS }, span);
                }
                args.push(self.expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RtParen, "')' after arguments")?.span.clone();
        let span = callee.1.start..paren.end;
        Ok((Expr::Call(Box::new(ExprCall { callee, paren, args })), span))
    }

    fn primary(&mut self) -> Result<ExprS> {
        let token = self.peek();
        let kind = token.kind;
        let span = token.span.clone();
        let expr = match kind {
            TokenKind::False => Expr::Literal(ExprLiteral::Bool(false)),
            TokenKind::True => Expr::Literal(ExprLiteral::Bool(true)),
            TokenKind::Nil => Expr::Literal(ExprLiteral::Nil),
            TokenKind::Number | TokenKind::String => match &token.literal {
                Some(Literal::Number(number)) => Expr::Literal(ExprLiteral::Number(*number)),
                Some(Literal::String(string)) => Expr::Literal(ExprLiteral::String(string.clone())),
                None => return Err((Error::SyntaxError(SyntaxError::ExpectedExpression), span)),
            },
            TokenKind::Identifier => Expr::Variable(ExprVariable { name: token.lexeme.clone() }),
            TokenKind::LtParen => {
                self.advance();
                let inner = self.expression()?;
                let end = self.consume(TokenKind::RtParen, "')' after expression")?.span.end;
                return Ok((Expr::Grouping(Box::new(ExprGrouping { inner })), span.start..end));
            }
            _ => return Err((Error::SyntaxError(SyntaxError::ExpectedExpression), span)),
        };
        self.advance();
        Ok((expr, span))
    }

    /// Discards tokens until the next probable statement boundary: just past
    /// a `;`, or before a keyword that starts a declaration or statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon || self.peek().kind.starts_statement() {
                break;
            }
            self.advance();
        }
        tracing::debug!(line = self.peek().line, "parser resynchronized");
    }

    fn report(&mut self, e: SyntaxError, span: Span) {
        self.errors.push((Error::SyntaxError(e), span));
    }

    fn consume(&mut self, kind: TokenKind, expected: &'static str) -> Result<&Token> {
        if self.check(kind) {
            self.advance();
            Ok(self.previous())
        } else {
            Err((Error::SyntaxError(SyntaxError::Expected(expected)), self.peek().span.clone()))
        }
    }

    fn match_op<T: Copy>(&mut self, ops: &[(TokenKind, T)]) -> Option<T> {
        let (_, op) = ops.iter().find(|(kind, _)| self.check(*kind))?;
        self.advance();
        Some(*op)
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        let found = self.check(kind);
        if found {
            self.advance();
        }
        found
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn span_from(&self, start: usize) -> Span {
        start..self.previous().span.end
    }
}
