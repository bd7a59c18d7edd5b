//! `cast` and `coerce`: change the type of objects in flight

use super::strip_quotes;
use crate::backend::TypeId;
use crate::pipeline::coerce::CoerceStage;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::registry::Registry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{ObjectStream, Stage};

const CAST_HELP: &str = "syntax: cast <type>

Reinterprets every input object as <type>, keeping its value or address.";

const COERCE_HELP: &str = "syntax: coerce [<pointer type>]

Converts every input object to the given pointer type (default 'void *'),
accepting the same type, 'void *', integers, and objects whose address has
that type.";

pub fn register(registry: &mut Registry) {
    registry.register_command(&["cast"], CAST_HELP, Cast::construct);
    registry.register_command(&["coerce"], COERCE_HELP, construct_coerce);
}

pub struct Cast {
    target: TypeId,
}

impl Cast {
    pub fn construct(session: &Session, args: &str) -> PipelineResult<Box<dyn Stage>> {
        let type_name = strip_quotes(args);
        if type_name.trim().is_empty() {
            return Err(PipelineError::invalid_argument("cast", "expected a type name"));
        }
        let target = session.program().resolve_type(&type_name)?;
        Ok(Box::new(Self { target }))
    }
}

impl Stage for Cast {
    fn name(&self) -> &str {
        "cast"
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        let target = self.target;
        Box::new(input.map(move |res| res.and_then(|obj| Ok(obj.cast(target)?))))
    }
}

fn construct_coerce(session: &Session, args: &str) -> PipelineResult<Box<dyn Stage>> {
    let type_name = strip_quotes(args);
    let type_name = match type_name.trim() {
        "" => "void *",
        name => name,
    };
    Ok(Box::new(CoerceStage::new(
        session.program(),
        type_name,
        "coerce",
    )?))
}
