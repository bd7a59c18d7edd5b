//! Linux kernel list walkers: `linux_list` and `linux_hlist`

use super::{follow_next, parse_offset};
use crate::backend::Object;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::registry::Registry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{self, ObjectStream};
use crate::pipeline::walker::Walker;

const LIST_HELP: &str = "syntax: linux_list [<offset>]

Walks a circular 'struct list_head *', emitting a 'void *' for every
entry. <offset> is the position of the 'struct list_head' inside the
entry, so the emitted pointers address the entries themselves.";

const HLIST_HELP: &str = "syntax: linux_hlist [<offset>]

Walks a NULL-terminated 'struct hlist_head *', emitting a 'void *' for
every entry. <offset> is the position of the 'struct hlist_node' inside
the entry.";

pub fn register(registry: &mut Registry) {
    registry.register_walker(&["linux_list"], "struct list_head *", LIST_HELP, construct_list);
    registry.register_walker(
        &["linux_hlist"],
        "struct hlist_head *",
        HLIST_HELP,
        construct_hlist,
    );
}

fn construct_list(_session: &Session, args: &str) -> PipelineResult<Box<dyn Walker>> {
    Ok(Box::new(ListHeadWalker {
        offset: parse_offset("linux_list", args)?,
    }))
}

fn construct_hlist(_session: &Session, args: &str) -> PipelineResult<Box<dyn Walker>> {
    Ok(Box::new(HlistWalker {
        offset: parse_offset("linux_hlist", args)?,
    }))
}

pub struct ListHeadWalker {
    offset: u64,
}

impl Walker for ListHeadWalker {
    fn walk(&self, root: Object) -> ObjectStream<'static> {
        let start = root
            .value_u64()
            .and_then(|head| Ok((root.member("next")?, head)));
        match start {
            Ok((first, head)) => follow_next(first, head, self.offset),
            Err(e) => stage::fail(e.into()),
        }
    }
}

pub struct HlistWalker {
    offset: u64,
}

impl Walker for HlistWalker {
    fn walk(&self, root: Object) -> ObjectStream<'static> {
        match root.member("first") {
            Ok(first) => follow_next(first, 0, self.offset),
            Err(e) => stage::fail(e.into()),
        }
    }
}
