//! `wc`: count the input objects

use crate::backend::Object;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::registry::Registry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{ObjectStream, Stage};

const HELP: &str = "syntax: wc

Counts the input objects and emits the total as an 'unsigned long'.";

pub fn register(registry: &mut Registry) {
    registry.register_command(&["wc"], HELP, Wc::construct);
}

pub struct Wc {
    session: Session,
}

impl Wc {
    pub fn construct(session: &Session, _args: &str) -> PipelineResult<Box<dyn Stage>> {
        Ok(Box::new(Self {
            session: session.clone(),
        }))
    }

    fn count(&self, input: ObjectStream<'_>) -> PipelineResult<Object> {
        let mut total = 0u64;
        for res in input {
            res?;
            total += 1;
        }
        let program = self.session.program();
        let type_id = program.resolve_type("unsigned long")?;
        Ok(Object::value(program, type_id, total))
    }
}

impl Stage for Wc {
    fn name(&self) -> &str {
        "wc"
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        Box::new(std::iter::once_with(move || self.count(input)))
    }
}
