use anyhow::{Context, Result};
use lox_common::error::report_err;
use lox_interpreter::Interpreter;
use lox_syntax::lexer::Lexer;
use lox_syntax::token::TokenKind;
use nu_ansi_term::{Color, Style};
use reedline::{
    EditCommand, Emacs, FileBackedHistory, KeyCode, KeyModifiers, PromptEditMode,
    PromptHistorySearch, Reedline, ReedlineEvent, Signal, StyledText, ValidationResult,
};
use termcolor::{ColorChoice, StandardStream};

use std::borrow::Cow;
use std::io;

/// Reads one input at a time and runs it against a single interpreter, so
/// globals survive from one input to the next. Errors are reported and the
/// session carries on.
pub fn run() -> Result<()> {
    let mut editor = editor()?;
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    let mut interpreter = Interpreter::new(&mut stdout);

    loop {
        match editor.read_line(&Prompt).context("could not read from stdin")? {
            Signal::Success(line) => {
                let program = match lox_syntax::parse(&line) {
                    Ok(program) => program,
                    Err(errors) => {
                        report_err(&mut stderr, "<stdin>", &line, &errors);
                        continue;
                    }
                };
                if let Err(e) = interpreter.interpret(&program) {
                    tracing::debug!("runtime error in repl input");
                    report_err(&mut stderr, "<stdin>", &line, &[e]);
                }
            }
            Signal::CtrlC => eprintln!("CTRL-C"),
            Signal::CtrlD => break,
        }
    }
    Ok(())
}

fn editor() -> Result<Reedline> {
    let mut keybindings = reedline::default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::ALT,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );

    let data_dir = dirs::data_dir().context("could not find data directory")?;
    let history_path = data_dir.join("lox/history.txt");
    let history = Box::new(
        FileBackedHistory::with_file(10000, history_path.clone())
            .with_context(|| format!("could not open history file: {}", history_path.display()))?,
    );

    let editor = Reedline::create()
        .with_edit_mode(Box::new(Emacs::new(keybindings)))
        .with_highlighter(Box::new(Highlighter))
        .with_history(history)
        .with_validator(Box::new(Validator));
    Ok(editor)
}

const PLAIN: Color = Color::LightGray;

fn color(kind: TokenKind) -> Color {
    match kind {
        TokenKind::And
        | TokenKind::Class
        | TokenKind::Else
        | TokenKind::For
        | TokenKind::Func
        | TokenKind::If
        | TokenKind::Or
        | TokenKind::Print
        | TokenKind::Return
        | TokenKind::Super
        | TokenKind::This
        | TokenKind::Var
        | TokenKind::While => Color::LightPurple,
        TokenKind::False | TokenKind::Nil | TokenKind::Number | TokenKind::True => {
            Color::LightCyan
        }
        TokenKind::String => Color::LightGreen,
        TokenKind::Identifier => Color::LightRed,
        _ => PLAIN,
    }
}

/// Colors the line token by token using the real lexer.
struct Highlighter;

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _: usize) -> StyledText {
        let mut output = StyledText::new();
        let mut push = |fg: Color, text: &str| {
            if !text.is_empty() {
                output.push((Style::new().fg(fg), text.to_string()));
            }
        };

        let mut end = 0;
        for result in Lexer::new(line) {
            let (fg, span) = match result {
                Ok(token) => (color(token.kind), token.span),
                Err((_, span)) => (Color::Red, span),
            };
            // Whatever the lexer skipped: whitespace and comments.
            let gap = &line[end..span.start];
            push(if gap.trim_start().starts_with("//") { Color::DarkGray } else { PLAIN }, gap);
            push(fg, &line[span.clone()]);
            end = span.end;
        }
        let rest = &line[end..];
        push(if rest.trim_start().starts_with("//") { Color::DarkGray } else { PLAIN }, rest);

        output
    }
}

/// Keeps reading lines while the input is an unfinished program, e.g. an
/// open block.
struct Validator;

impl reedline::Validator for Validator {
    fn validate(&self, line: &str) -> ValidationResult {
        if lox_syntax::is_complete(line) {
            ValidationResult::Complete
        } else {
            ValidationResult::Incomplete
        }
    }
}

pub struct Prompt;

impl reedline::Prompt for Prompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Borrowed(">>> ")
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(&self, _: PromptHistorySearch) -> Cow<str> {
        Cow::Borrowed("")
    }
}
