use crate::types::Span;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use termcolor::WriteColor;
use thiserror::Error;

pub type ErrorS = (Error, Span);
pub type Result<T, E = ErrorS> = std::result::Result<T, E>;

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("{0}")]
    IoError(IoError),
    #[error("{0}")]
    NameError(NameError),
    #[error("{0}")]
    SyntaxError(SyntaxError),
    #[error("{0}")]
    TypeError(TypeError),
}

impl Error {
    /// The category shown as the diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::IoError(_) => "IOError",
            Error::NameError(_) => "NameError",
            Error::SyntaxError(_) => "SyntaxError",
            Error::TypeError(_) => "TypeError",
        }
    }

    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        Diagnostic::error()
            .with_code(self.code())
            .with_message(self.to_string())
            .with_labels(vec![Label::primary((), span.clone())])
    }
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum IoError {
    #[error("Unable to write to {file}.")]
    WriteError { file: String },
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum NameError {
    #[error("Undefined variable '{name}'.")]
    NotDefined { name: String },
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SyntaxError {
    /// A token the grammar required was missing, e.g. `Expect ';' after value.`
    #[error("Expect {0}.")]
    Expected(&'static str),
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,
    #[error("Can't return from top-level code.")]
    ReturnOutsideFunction,
    #[error("Can't have more than {max} arguments.")]
    TooManyArguments { max: usize },
    #[error("Can't have more than {max} parameters.")]
    TooManyParameters { max: usize },
    #[error("Unexpected character {token:?}.")]
    UnexpectedInput { token: String },
    #[error("Unterminated string.")]
    UnterminatedString,
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TypeError {
    #[error("Expected {exp_args} arguments but got {got_args}.")]
    ArityMismatch { exp_args: usize, got_args: usize },
    #[error("Can only call functions, not {type_}.")]
    NotCallable { type_: String },
    #[error("Operand must be a number.")]
    OperandNotNumber,
    #[error("Operands must be numbers.")]
    OperandsNotNumbers,
    #[error("Operands must be two numbers or two strings.")]
    OperandsNotNumbersOrStrings,
}

/// Renders every error as a diagnostic pointing into `source`, ordered by
/// position.
pub fn report_err(writer: &mut dyn WriteColor, name: &str, source: &str, errors: &[ErrorS]) {
    let mut errors = errors.iter().collect::<Vec<_>>();
    errors.sort_by_key(|(_, span)| (span.start, span.end));

    let file = SimpleFile::new(name, source);
    let config = term::Config::default();

    for (e, span) in errors {
        let diagnostic = e.as_diagnostic(span);
        if term::emit(writer, &config, &file, &diagnostic).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use termcolor::NoColor;

    #[test]
    fn messages() {
        let cases = [
            (
                Error::NameError(NameError::NotDefined { name: "foo".to_string() }),
                "Undefined variable 'foo'.",
            ),
            (Error::SyntaxError(SyntaxError::Expected("';' after value")), "Expect ';' after value."),
            (
                Error::TypeError(TypeError::ArityMismatch { exp_args: 2, got_args: 1 }),
                "Expected 2 arguments but got 1.",
            ),
            (
                Error::TypeError(TypeError::OperandsNotNumbersOrStrings),
                "Operands must be two numbers or two strings.",
            ),
        ];
        for (e, exp) in cases {
            assert_eq!(exp, e.to_string());
        }
    }

    #[test]
    fn report_shows_line_and_message() {
        let source = "var a = 1;\nprint b;\n";
        let errors = [(Error::NameError(NameError::NotDefined { name: "b".to_string() }), 17..18)];

        let mut writer = NoColor::new(Vec::new());
        report_err(&mut writer, "<script>", source, &errors);
        let output = String::from_utf8(writer.into_inner()).unwrap();

        assert!(output.contains("error[NameError]: Undefined variable 'b'."), "{output}");
        assert!(output.contains("<script>:2:7"), "{output}");
    }
}
