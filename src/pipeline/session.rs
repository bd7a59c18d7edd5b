//! Interactive session state
//!
//! A [`Session`] ties a target [`Program`] to a [`Registry`] and an output
//! sink. Stages keep a clone of the session they were built in; clones are
//! cheap and share the sink, so redirecting output for a `!` escape affects
//! every stage of the running pipeline.

use crate::backend::{Object, Program};
use crate::pipeline::builder::{build_pipeline, Pipeline};
use crate::pipeline::error::PipelineResult;
use crate::pipeline::executor;
use crate::pipeline::registry::{self, Registry};
use crate::pipeline::stage;
use std::cell::RefCell;
use std::fmt::Display;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

/// Shell used for `!` escapes unless configured otherwise
pub const DEFAULT_SHELL: &str = "/bin/sh";

type Sink = Rc<RefCell<Box<dyn Write>>>;

#[derive(Clone)]
pub struct Session {
    program: Arc<Program>,
    registry: Arc<Registry>,
    output: Sink,
    shell: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("program", &self.program)
            .field("shell", &self.shell)
            .finish()
    }
}

impl Session {
    /// A session over `program` with the built-in commands, printing to stdout
    pub fn new(program: Arc<Program>) -> Self {
        Self::with_registry(program, registry::global())
    }

    pub fn with_registry(program: Arc<Program>, registry: Arc<Registry>) -> Self {
        Self {
            program,
            registry,
            output: Rc::new(RefCell::new(Box::new(std::io::stdout()))),
            shell: DEFAULT_SHELL.to_string(),
        }
    }

    /// Replace the output sink
    pub fn with_output(self, output: impl Write + 'static) -> Self {
        *self.output.borrow_mut() = Box::new(output);
        self
    }

    /// Program used to run `!` shell commands
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Write one line to the current output sink
    pub fn write_line(&self, line: impl Display) -> PipelineResult<()> {
        writeln!(self.output.borrow_mut(), "{}", line)?;
        Ok(())
    }

    pub fn flush(&self) -> PipelineResult<()> {
        self.output.borrow_mut().flush()?;
        Ok(())
    }

    /// Swap the output sink until the returned guard is dropped
    pub fn redirect(&self, output: Box<dyn Write>) -> OutputGuard {
        let previous = std::mem::replace(&mut *self.output.borrow_mut(), output);
        OutputGuard {
            sink: Rc::clone(&self.output),
            previous: Some(previous),
        }
    }

    /// Build a pipeline from stage texts such as `["avl", "cast spa_t *"]`
    pub fn build(&self, stages: &[&str]) -> PipelineResult<Pipeline> {
        let texts: Vec<String> = stages.iter().map(|s| s.to_string()).collect();
        build_pipeline(self, &texts)
    }

    /// Run a nested pipeline over `input` and collect its output
    pub fn eval(&self, input: Vec<Object>, stages: &[&str]) -> PipelineResult<Vec<Object>> {
        let pipeline = self.build(stages)?;
        pipeline.execute(stage::from_vec(input)).collect()
    }

    /// Parse, build and run one command line
    pub fn run(&self, line: &str) -> PipelineResult<()> {
        executor::invoke(self, line)
    }
}

/// Restores the previous output sink on drop
pub struct OutputGuard {
    sink: Sink,
    previous: Option<Box<dyn Write>>,
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            let mut redirected = std::mem::replace(&mut *self.sink.borrow_mut(), previous);
            let _ = redirected.flush();
        }
    }
}

/// An in-memory output sink whose contents stay readable after it is handed
/// to a session
#[derive(Clone, Default)]
pub struct OutputBuffer(Rc<RefCell<Vec<u8>>>);

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
