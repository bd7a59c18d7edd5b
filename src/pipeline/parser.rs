//! Command-line tokenizer
//!
//! Splits a line into pipe-separated stage texts plus an optional trailing
//! shell command introduced by `!`:
//!
//! ```text
//! stage1 [args] ( '|' stageN [args] )* ( '!' shell-command )?
//! ```
//!
//! Words may contain `()`, `<`, `>`, `&`, `[` and `]`, so member paths and
//! comparisons survive intact. Quoted strings keep their quotes.

use crate::pipeline::error::{PipelineError, PipelineResult};
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Token {
    #[token("|")]
    Pipe,

    #[token("!")]
    Bang,

    #[regex(r#"[^ \t\r\n\f|!'"]+"#)]
    Word,

    #[regex(r#"'[^']*'"#)]
    #[regex(r#""[^"]*""#)]
    Quoted,
}

/// Result of parsing one command line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLine {
    /// Stage texts in pipeline order, each `name [args]`
    pub stages: Vec<String>,
    /// Command after `!`, if any
    pub shell_command: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Piece {
    Pipe,
    Bang,
    Word(String),
}

impl Piece {
    fn text(&self) -> &str {
        match self {
            Piece::Pipe => "|",
            Piece::Bang => "!",
            Piece::Word(w) => w,
        }
    }
}

/// Lex a line. Adjacent word and quote tokens with no whitespace between
/// them form a single word, so `name="a b"` stays one argument.
fn tokenize(line: &str) -> PipelineResult<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut last_end = None;
    let mut lexer = Token::lexer(line);

    while let Some(token) = lexer.next() {
        let span = lexer.span();
        let token = token.map_err(|_| {
            let what = match line[span.start..].chars().next() {
                Some('\'') | Some('"') => "unterminated quote",
                _ => "unexpected character",
            };
            PipelineError::Parse(format!("{} at column {}", what, span.start + 1))
        })?;

        match token {
            Token::Pipe => pieces.push(Piece::Pipe),
            Token::Bang => pieces.push(Piece::Bang),
            Token::Word | Token::Quoted => {
                let text = lexer.slice();
                match pieces.last_mut() {
                    Some(Piece::Word(prev)) if last_end == Some(span.start) => prev.push_str(text),
                    _ => pieces.push(Piece::Word(text.to_string())),
                }
            }
        }
        last_end = Some(span.end);
    }
    Ok(pieces)
}

/// Split a command line into stage texts and an optional shell command
pub fn parse_line(line: &str) -> PipelineResult<ParsedLine> {
    let pieces = tokenize(line)?;
    let mut parsed = ParsedLine::default();
    let mut current: Vec<&str> = Vec::new();

    for (i, piece) in pieces.iter().enumerate() {
        match piece {
            Piece::Pipe => {
                parsed.stages.push(current.join(" "));
                current.clear();
            }
            Piece::Bang => {
                parsed.stages.push(current.join(" "));
                let rest = &pieces[i + 1..];
                if rest.iter().any(|p| *p == Piece::Bang) {
                    return Err(PipelineError::MultipleShellEscapes);
                }
                let shell: Vec<&str> = rest.iter().map(Piece::text).collect();
                parsed.shell_command = Some(shell.join(" "));
                tracing::trace!(stages = ?parsed.stages, shell = ?parsed.shell_command, "parsed line");
                return Ok(parsed);
            }
            Piece::Word(word) => current.push(word),
        }
    }

    parsed.stages.push(current.join(" "));
    tracing::trace!(stages = ?parsed.stages, "parsed line");
    Ok(parsed)
}
