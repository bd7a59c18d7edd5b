//! `list`: walk an intrusive `list_t`

use super::follow_next;
use crate::backend::Object;
use crate::error::{Result, SdbError};
use crate::pipeline::error::PipelineResult;
use crate::pipeline::registry::Registry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{self, ObjectStream};
use crate::pipeline::walker::Walker;

const HELP: &str = "syntax: list

Walks a 'list_t *', emitting a 'void *' for every element. The elements
embed their 'list_node_t' at the list's 'list_offset'.";

pub fn register(registry: &mut Registry) {
    registry.register_walker(&["list"], "list_t *", HELP, construct);
}

fn construct(_session: &Session, _args: &str) -> PipelineResult<Box<dyn Walker>> {
    Ok(Box::new(ListWalker))
}

pub struct ListWalker;

impl ListWalker {
    fn start(root: &Object) -> Result<(Object, u64, u64)> {
        let offset = root.member("list_offset")?.value_u64()?;
        let head = root.member("list_head")?;
        let stop = head
            .address()
            .ok_or_else(|| SdbError::InvalidOperation {
                operation: "walk",
                type_name: head.type_name(),
            })?;
        Ok((head.member("next")?, stop, offset))
    }
}

impl Walker for ListWalker {
    fn walk(&self, root: Object) -> ObjectStream<'static> {
        match Self::start(&root) {
            Ok((first, stop, offset)) => follow_next(first, stop, offset),
            Err(e) => stage::fail(e.into()),
        }
    }
}
