//! Automatic type coercion between stages
//!
//! The builder places a [`CoerceStage`] in front of every non-first stage
//! that declares an input type. Each object is adapted on its own:
//!
//! 1. already the target type: passed through
//! 2. `void *` to a pointer type: relabeled
//! 3. integer to a pointer type: relabeled as an address
//! 4. an lvalue whose address type is the target: replaced by its address
//!
//! Anything else fails the pipeline with a coercion error naming the
//! stage the object was headed for.

use crate::backend::{Object, Program, TypeId};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::stage::{ObjectStream, Stage};
use std::sync::Arc;

pub struct CoerceStage {
    program: Arc<Program>,
    target: TypeId,
    target_name: String,
    /// Stage the coerced objects feed, for error messages
    stage: String,
}

impl CoerceStage {
    /// Coerce to `type_name` on behalf of `stage`
    pub fn new(program: &Arc<Program>, type_name: &str, stage: &str) -> PipelineResult<Self> {
        let target = program.resolve_type(type_name)?;
        if !program.with_types(|types| types.is_pointer(target)) {
            return Err(PipelineError::invalid_argument(
                "coerce",
                format!(
                    "can only coerce to pointer types, not {}",
                    program.type_name(target)
                ),
            ));
        }
        Ok(Self {
            program: Arc::clone(program),
            target,
            target_name: program.type_name(target),
            stage: stage.to_string(),
        })
    }

    pub fn target(&self) -> TypeId {
        self.target
    }

    /// Adapt one object to the target type
    pub fn coerce(&self, obj: Object) -> PipelineResult<Object> {
        let source = obj.type_id();
        if source == self.target {
            return Ok(obj);
        }

        let (void_ptr, integer) = self.program.with_types(|types| {
            (types.is_void_pointer(source), types.is_integer(source))
        });
        if void_ptr || integer {
            tracing::trace!(from = %obj.type_name(), to = %self.target_name, "coerce by cast");
            return Ok(obj.cast(self.target)?);
        }

        if obj.is_reference() && self.program.pointer_to(source) == self.target {
            tracing::trace!(from = %obj.type_name(), to = %self.target_name, "coerce by address");
            return Ok(obj.address_of()?);
        }

        Err(PipelineError::Coercion {
            from: obj.type_name(),
            to: self.target_name.clone(),
            stage: self.stage.clone(),
        })
    }
}

impl Stage for CoerceStage {
    fn name(&self) -> &str {
        "coerce"
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        Box::new(input.map(move |res| res.and_then(|obj| self.coerce(obj))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SnapshotBuilder;

    fn program() -> Arc<Program> {
        let mut b = SnapshotBuilder::new();
        b.define_struct("node", 16, &[("next", "struct node *", 0), ("v", "int", 8)])
            .unwrap();
        b.typedef("node_t", "struct node").unwrap();
        b.symbol("root", "struct node", 0x1000).unwrap();
        b.symbol("count", "int", 0x2000).unwrap();
        b.write_u32(0x2000, 0x3000);
        b.write_u64(0x1000, 0);
        b.build()
    }

    #[test]
    fn test_passthrough_and_void_pointer() {
        let prog = program();
        let stage = CoerceStage::new(&prog, "struct node *", "walk").unwrap();

        let same = Object::value(&prog, stage.target(), 0x40);
        assert_eq!(stage.coerce(same).unwrap().value_u64().unwrap(), 0x40);

        let vp = Object::void_pointer(&prog, 0x1000);
        let out = stage.coerce(vp).unwrap();
        assert_eq!(out.type_id(), stage.target());
        assert_eq!(out.value_u64().unwrap(), 0x1000);
    }

    #[test]
    fn test_integer_becomes_address() {
        let prog = program();
        let stage = CoerceStage::new(&prog, "struct node *", "walk").unwrap();
        let count = prog.object("count").unwrap();
        let out = stage.coerce(count).unwrap();
        assert_eq!(out.type_name(), "struct node *");
        assert_eq!(out.value_u64().unwrap(), 0x3000);
    }

    #[test]
    fn test_lvalue_becomes_its_address() {
        let prog = program();
        let stage = CoerceStage::new(&prog, "struct node *", "walk").unwrap();
        let root = prog.object("root").unwrap();
        let out = stage.coerce(root).unwrap();
        assert_eq!(out.type_id(), stage.target());
        assert_eq!(out.value_u64().unwrap(), 0x1000);
    }

    #[test]
    fn test_mismatch_names_stage() {
        let prog = program();
        let stage = CoerceStage::new(&prog, "node_t *", "walk").unwrap();
        let node_ptr = prog.resolve_type("struct node *").unwrap();
        let err = stage
            .coerce(Object::value(&prog, node_ptr, 0x1000))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "can not coerce struct node * to node_t * for \"walk\" command"
        );
    }

    #[test]
    fn test_only_pointer_targets() {
        let prog = program();
        assert!(CoerceStage::new(&prog, "struct node", "x").is_err());
        assert!(CoerceStage::new(&prog, "struct nope *", "x").is_err());
    }
}
