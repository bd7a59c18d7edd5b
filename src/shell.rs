//! Line-oriented read-eval-print loop
//!
//! Reads command lines from any [`BufRead`], runs each through the
//! session, and reports failures as `sdb: <error>` on a separate writer.
//! Blank lines are skipped; `exit` and `quit` end the loop.

use crate::pipeline::session::Session;
use std::io::{self, BufRead, Write};

pub struct Shell {
    session: Session,
    prompt: String,
}

/// How a loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShellSummary {
    pub commands: usize,
    pub failures: usize,
}

impl Shell {
    pub fn new(session: Session, prompt: impl Into<String>) -> Self {
        Self {
            session,
            prompt: prompt.into(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run a single line, reporting a failure to `errors`. Returns whether it succeeded.
    pub fn run_line<E: Write>(&self, line: &str, errors: &mut E) -> io::Result<bool> {
        match self.session.run(line) {
            Ok(()) => Ok(true),
            Err(e) if e.is_benign() => Ok(true),
            Err(e) => {
                tracing::debug!("command failed: {:?}", e);
                writeln!(errors, "sdb: {}", e)?;
                Ok(false)
            }
        }
    }

    /// Loop until end of input or `exit`
    pub fn run<R, P, E>(&self, input: R, prompt: &mut P, errors: &mut E) -> io::Result<ShellSummary>
    where
        R: BufRead,
        P: Write,
        E: Write,
    {
        let mut summary = ShellSummary::default();
        let mut lines = input.lines();
        loop {
            write!(prompt, "{}", self.prompt)?;
            prompt.flush()?;
            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if matches!(trimmed, "exit" | "quit") {
                break;
            }
            summary.commands += 1;
            if !self.run_line(trimmed, errors)? {
                summary.failures += 1;
            }
        }
        tracing::debug!(
            commands = summary.commands,
            failures = summary.failures,
            "shell loop finished"
        );
        Ok(summary)
    }
}
