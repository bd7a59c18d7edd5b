//! `member` and `array`: step into structures and arrays

use super::unquote;
use crate::backend::{parse_int, Object, TypeDef};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::registry::Registry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{self, ObjectStream, Stage};

const MEMBER_HELP: &str = "syntax: member <path> [<path> ...]

Replaces every input object with the member reached by each path in turn.
Paths use '.', '->' and '[n]', e.g. spa_root_vdev->vdev_child[0].";

const ARRAY_HELP: &str = "syntax: array [<count>]

Emits the elements of every input array, or <count> consecutive elements
starting at every input pointer.";

pub fn register(registry: &mut Registry) {
    registry.register_command(&["member"], MEMBER_HELP, Member::construct);
    registry.register_command(&["array"], ARRAY_HELP, Array::construct);
}

pub struct Member {
    paths: Vec<String>,
}

impl Member {
    pub fn construct(_session: &Session, args: &str) -> PipelineResult<Box<dyn Stage>> {
        Ok(Box::new(Self {
            paths: args
                .split_whitespace()
                .map(|p| unquote(p).to_string())
                .collect(),
        }))
    }
}

impl Stage for Member {
    fn name(&self) -> &str {
        "member"
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        Box::new(input.map(move |res| -> PipelineResult<Object> {
            let mut obj = res?;
            for path in &self.paths {
                obj = obj.member_path(path)?;
            }
            Ok(obj)
        }))
    }
}

pub struct Array {
    count: Option<u64>,
}

impl Array {
    pub fn construct(_session: &Session, args: &str) -> PipelineResult<Box<dyn Stage>> {
        let count = match args.trim() {
            "" => None,
            text => Some(parse_int(unquote(text)).ok_or_else(|| {
                PipelineError::invalid_argument("array", format!("'{}' is not a count", text))
            })?),
        };
        Ok(Box::new(Self { count }))
    }
}

impl Stage for Array {
    fn name(&self) -> &str {
        "array"
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        stage::dispatch_each(
            input,
            move |obj| {
                let count = match (obj.program().type_def(obj.type_id()), self.count) {
                    (Some(TypeDef::Array { count, .. }), Some(wanted)) => wanted.min(count),
                    (Some(TypeDef::Array { count, .. }), None) => count,
                    (Some(TypeDef::Pointer(_)), Some(wanted)) => wanted,
                    (Some(TypeDef::Pointer(_)), None) => {
                        return stage::fail(PipelineError::command(
                            "array",
                            format!("a count is required for input of type {}", obj.type_name()),
                        ))
                    }
                    _ => {
                        return stage::fail(PipelineError::TypeMismatch {
                            stage: "array".to_string(),
                            actual: obj.type_name(),
                        })
                    }
                };
                Box::new((0..count).map(move |i| obj.subscript(i).map_err(PipelineError::from)))
            },
            stage::empty,
        )
    }
}
