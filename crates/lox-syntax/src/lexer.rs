use crate::token::{Literal, Token, TokenKind};

use logos::Logos;
use lox_common::error::{Error, ErrorS, SyntaxError};

pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    /// A token logos already scanned but that has not been handed out yet.
    pending: Option<TokenKind>,
    line: usize,
    offset: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { inner: TokenKind::lexer(source), pending: None, line: 1, offset: 0 }
    }

    /// Line of the byte at `pos`. Positions must be visited in increasing order.
    fn line_at(&mut self, pos: usize) -> usize {
        let source = self.inner.source();
        self.line += source[self.offset..pos].matches('\n').count();
        self.offset = pos;
        self.line
    }

    fn token(&mut self, kind: TokenKind) -> Token {
        let span = self.inner.span();
        let lexeme = self.inner.slice().to_string();
        let literal = match kind {
            // The regex only accepts digits with an optional fraction, both
            // of which `f64` parses.
            TokenKind::Number => lexeme.parse().ok().map(Literal::Number),
            TokenKind::String => Some(Literal::String(lexeme[1..lexeme.len() - 1].to_string())),
            _ => None,
        };
        Token { kind, lexeme, literal, line: self.line_at(span.start), span }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, ErrorS>;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = match self.pending.take() {
            Some(kind) => kind,
            None => self.inner.next()?,
        };
        match kind {
            TokenKind::Error => Some(Err(self.error())),
            kind => Some(Ok(self.token(kind))),
        }
    }
}

impl<'a> Lexer<'a> {
    /// Reports the input under the cursor, which did not scan as a token.
    fn error(&mut self) -> ErrorS {
        let mut span = self.inner.span();

        // An unterminated string swallows the rest of the input.
        if self.inner.slice().starts_with('"') {
            self.inner.bump(self.inner.remainder().len());
            span.end = self.inner.span().end;
            return (Error::SyntaxError(SyntaxError::UnterminatedString), span);
        }

        // Merge adjacent unexpected characters into a single error. Anything
        // else stays under the cursor for the next call.
        while let Some(kind) = self.inner.next() {
            let span_new = self.inner.span();
            if kind == TokenKind::Error
                && span.end == span_new.start
                && !self.inner.slice().starts_with('"')
            {
                span.end = span_new.end;
            } else {
                self.pending = Some(kind);
                break;
            }
        }

        let token = self.inner.source()[span.start..span.end].to_string();
        (Error::SyntaxError(SyntaxError::UnexpectedInput { token }), span)
    }
}

/// Scans the whole source. The returned tokens always end with exactly one
/// [`TokenKind::Eof`]; inputs that fail to scan are reported and left out.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<ErrorS>) {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for result in &mut lexer {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    let end = source.len();
    let line = lexer.line_at(end);
    tokens.push(Token { kind: TokenKind::Eof, lexeme: String::new(), literal: None, line, span: end..end });
    (tokens, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).0.into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn lex_invalid_token() {
        let (tokens, errors) = tokenize("@# bar");
        assert_eq!(
            vec![(
                Error::SyntaxError(SyntaxError::UnexpectedInput { token: "@#".to_string() }),
                0..2,
            )],
            errors
        );
        assert_eq!(
            vec![TokenKind::Identifier, TokenKind::Eof],
            tokens.iter().map(|token| token.kind).collect::<Vec<_>>()
        );
        assert_eq!("bar", tokens[0].lexeme);
    }

    #[test]
    fn lex_separate_invalid_tokens() {
        let (tokens, errors) = tokenize("@ # print 1;");
        assert_eq!(
            vec![
                (Error::SyntaxError(SyntaxError::UnexpectedInput { token: "@".to_string() }), 0..1),
                (Error::SyntaxError(SyntaxError::UnexpectedInput { token: "#".to_string() }), 2..3),
            ],
            errors
        );
        assert_eq!(
            vec![TokenKind::Print, TokenKind::Number, TokenKind::Semicolon, TokenKind::Eof],
            tokens.iter().map(|token| token.kind).collect::<Vec<_>>()
        );
    }

    #[test]
    fn lex_unterminated_string_after_invalid_token() {
        let (tokens, errors) = tokenize("@ \"abc");
        assert_eq!(
            vec![
                (Error::SyntaxError(SyntaxError::UnexpectedInput { token: "@".to_string() }), 0..1),
                (Error::SyntaxError(SyntaxError::UnterminatedString), 2..6),
            ],
            errors
        );
        assert_eq!(vec![TokenKind::Eof], tokens.iter().map(|token| token.kind).collect::<Vec<_>>());
    }

    #[test]
    fn lex_unterminated_string() {
        let (tokens, errors) = tokenize("print \"\nfoo");
        assert_eq!(vec![(Error::SyntaxError(SyntaxError::UnterminatedString), 6..11)], errors);
        assert_eq!(vec![TokenKind::Print, TokenKind::Eof], tokens.iter().map(|t| t.kind).collect::<Vec<_>>());
    }

    #[test]
    fn lex_literals() {
        let (tokens, errors) = tokenize(r#"12.5 "hi there" name"#);
        assert!(errors.is_empty());
        assert_eq!(Some(Literal::Number(12.5)), tokens[0].literal);
        assert_eq!(Some(Literal::String("hi there".to_string())), tokens[1].literal);
        assert_eq!("\"hi there\"", tokens[1].lexeme);
        assert_eq!(None, tokens[2].literal);
    }

    #[test]
    fn lex_keywords_and_operators() {
        assert_eq!(
            vec![
                TokenKind::Func,
                TokenKind::Identifier,
                TokenKind::LtParen,
                TokenKind::RtParen,
                TokenKind::LtBrace,
                TokenKind::Return,
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::LessEqual,
                TokenKind::EqualEqual,
                TokenKind::Semicolon,
                TokenKind::RtBrace,
                TokenKind::Eof,
            ],
            kinds("func funcs() { return ! != <= ==; }")
        );
    }

    #[test]
    fn lex_lines() {
        let (tokens, _) = tokenize("var a;\n// comment\n\"multi\nline\"\nb");
        let lines = tokens.iter().map(|token| token.line).collect::<Vec<_>>();
        assert_eq!(vec![1, 1, 1, 3, 5, 5], lines);
    }
}
