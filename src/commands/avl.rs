//! `avl`: in-order walk of an `avl_tree_t`

use crate::backend::{Object, Program, TypeId};
use crate::error::Result;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::registry::Registry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{self, ObjectStream};
use crate::pipeline::walker::Walker;
use std::sync::Arc;

const HELP: &str = "syntax: avl

Walks an 'avl_tree_t *' in order, emitting a 'void *' for every element.
The elements embed their 'avl_node_t' at the tree's 'avl_offset'.";

const LEFT: u64 = 0;
const RIGHT: u64 = 1;

pub fn register(registry: &mut Registry) {
    registry.register_walker(&["avl"], "avl_tree_t *", HELP, construct);
}

fn construct(_session: &Session, _args: &str) -> PipelineResult<Box<dyn Walker>> {
    Ok(Box::new(AvlWalker))
}

pub struct AvlWalker;

impl Walker for AvlWalker {
    fn walk(&self, root: Object) -> ObjectStream<'static> {
        match InOrder::new(&root) {
            Ok(iter) => Box::new(iter),
            Err(e) => stage::fail(e.into()),
        }
    }
}

/// Iterative in-order traversal holding the path to the next node
struct InOrder {
    program: Arc<Program>,
    node_type: TypeId,
    offset: u64,
    stack: Vec<u64>,
    current: u64,
    done: bool,
}

impl InOrder {
    fn new(tree: &Object) -> Result<Self> {
        let offset = tree.member("avl_offset")?.value_u64()?;
        let root = tree.member("avl_root")?;
        Ok(Self {
            program: Arc::clone(tree.program()),
            node_type: root.type_id(),
            offset,
            stack: Vec::new(),
            current: root.value_u64()?,
            done: false,
        })
    }

    fn child(&self, node: u64, which: u64) -> Result<u64> {
        Object::value(&self.program, self.node_type, node)
            .member("avl_child")?
            .subscript(which)?
            .value_u64()
    }

    fn advance(&mut self) -> Result<Option<u64>> {
        while self.current != 0 {
            self.stack.push(self.current);
            self.current = self.child(self.current, LEFT)?;
        }
        let Some(node) = self.stack.pop() else {
            return Ok(None);
        };
        self.current = self.child(node, RIGHT)?;
        Ok(Some(node))
    }
}

impl Iterator for InOrder {
    type Item = PipelineResult<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(node)) => Some(Ok(Object::void_pointer(
                &self.program,
                node.wrapping_sub(self.offset),
            ))),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}
