//! `echo` / `cc`: turn integers into `void *` objects

use super::unquote;
use crate::backend::{parse_int, Object, Program};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::registry::Registry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{ObjectStream, Stage};
use std::sync::Arc;

const HELP: &str = "syntax: echo [<address> ...]

Emits a 'void *' for every address given (0x, 0o, 0b or decimal), then
passes its input through unchanged.";

pub fn register(registry: &mut Registry) {
    registry.register_command(&["echo", "cc"], HELP, Echo::construct);
}

pub struct Echo {
    program: Arc<Program>,
    values: Vec<u64>,
}

impl Echo {
    pub fn construct(session: &Session, args: &str) -> PipelineResult<Box<dyn Stage>> {
        let values = args
            .split_whitespace()
            .map(|arg| {
                parse_int(unquote(arg)).ok_or_else(|| {
                    PipelineError::invalid_argument("echo", format!("'{}' is not an integer", arg))
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(Box::new(Self {
            program: Arc::clone(session.program()),
            values,
        }))
    }
}

impl Stage for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        let echoed = self
            .values
            .iter()
            .map(move |&v| Ok(Object::void_pointer(&self.program, v)));
        Box::new(echoed.chain(input))
    }
}
