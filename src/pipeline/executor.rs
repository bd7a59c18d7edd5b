//! Pipeline execution
//!
//! Stage `i` reads the lazily produced output of stages `0..i`. The chain is
//! built by folding over the stage list, so long pipelines do not recurse,
//! and every stage runs exactly once, on demand.

use crate::pipeline::builder::build_pipeline;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::parser::parse_line;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{self, ObjectStream, Stage};
use std::io::{BufWriter, Write};
use std::process::{Command, Stdio};

/// Compose `stages` over `input` into one lazy stream
pub fn execute<'a>(input: ObjectStream<'a>, stages: &'a [Box<dyn Stage>]) -> ObjectStream<'a> {
    stages.iter().fold(input, |upstream, stage| stage.call(upstream))
}

/// Drive a chain whose last stage only has side effects.
///
/// Every object is pulled, otherwise nothing upstream would run.
pub fn execute_terminal<'a>(
    input: ObjectStream<'a>,
    stages: &'a [Box<dyn Stage>],
) -> PipelineResult<()> {
    for item in execute(input, stages) {
        item?;
    }
    Ok(())
}

/// Parse, build and run one command line.
///
/// Output of a pipeable pipeline is printed one object per line. With a
/// `!` the session output goes to the shell command's stdin until the run
/// ends; the command is then awaited. A closed pipe ends the run quietly.
pub fn invoke(session: &Session, line: &str) -> PipelineResult<()> {
    let parsed = parse_line(line)?;
    let pipeline = build_pipeline(session, &parsed.stages)?;

    let run = || -> PipelineResult<()> {
        if pipeline.is_pipeable() {
            for obj in pipeline.execute(stage::empty()) {
                session.write_line(obj?)?;
            }
        } else {
            pipeline.execute_terminal(stage::empty())?;
        }
        session.flush()
    };

    let result = match parsed.shell_command {
        None => run(),
        Some(shell_command) => {
            tracing::debug!("piping output to `{}`", shell_command);
            let mut child = Command::new(session.shell())
                .arg("-c")
                .arg(&shell_command)
                .stdin(Stdio::piped())
                .spawn()
                .map_err(|e| {
                    PipelineError::Shell(format!("failed to run '{}': {}", shell_command, e))
                })?;
            let stdin = child
                .stdin
                .take()
                .ok_or_else(|| PipelineError::Shell("shell stdin unavailable".to_string()))?;

            let result = {
                let _guard = session.redirect(Box::new(BufWriter::new(stdin)));
                run()
            };
            // The guard dropped above closed the pipe, so the child sees EOF.
            let status = child.wait()?;
            if !status.success() {
                tracing::debug!("shell command exited with {}", status);
            }
            result
        }
    };

    match result {
        Err(e) if e.is_benign() => {
            tracing::debug!("output pipe closed early");
            Ok(())
        }
        other => other,
    }
}

/// Write every object of a stream to `out`, one per line
pub fn print_stream<W: Write>(stream: ObjectStream<'_>, out: &mut W) -> PipelineResult<usize> {
    let mut count = 0;
    for obj in stream {
        writeln!(out, "{}", obj?)?;
        count += 1;
    }
    Ok(count)
}
