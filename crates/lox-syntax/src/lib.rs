pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;

use crate::ast::Program;
use crate::lexer::tokenize;
use crate::parser::Parser;

use lox_common::error::{Error, ErrorS, SyntaxError};

/// Lexes and parses `source`. Any lexer or parser error fails the whole
/// parse; use [`Parser`] directly to keep the partial program.
pub fn parse(source: &str) -> Result<Program, Vec<ErrorS>> {
    let (tokens, mut errors) = tokenize(source);
    let (program, parser_errors) = Parser::new(tokens).parse();
    errors.extend(parser_errors);

    if errors.is_empty() {
        Ok(program)
    } else {
        errors.sort_by_key(|(_, span)| (span.start, span.end));
        Err(errors)
    }
}

/// Whether `source` could be a complete program, i.e. parsing did not run
/// out of input. Syntax errors elsewhere still count as complete so the REPL
/// hands them to the parser instead of waiting for more lines.
pub fn is_complete(source: &str) -> bool {
    let end = source.len();
    match parse(source) {
        Ok(_) => true,
        Err(errors) => !errors.iter().any(|(e, span)| {
            matches!(e, Error::SyntaxError(SyntaxError::UnterminatedString)) || span.start == end
        }),
    }
}
