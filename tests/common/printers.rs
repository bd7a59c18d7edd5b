//! A plain pretty printer, registered without a locator

use sdb_rs::pipeline::stage::ObjectStream;
use sdb_rs::pipeline::{PipelineResult, PrettyPrinter, Registry, Session};

pub fn register(registry: &mut Registry) {
    registry.register_printer(
        &["pl", "print_list"],
        "list_t *",
        "syntax: pl\n\nPrints the head address and link offset of a list_t.",
        ListPrinter::construct,
    );
}

/// Prints `list_t *` objects as `list <address> offset <list_offset>`
pub struct ListPrinter {
    session: Session,
}

impl ListPrinter {
    fn construct(session: &Session, _args: &str) -> PipelineResult<Box<dyn PrettyPrinter>> {
        Ok(Box::new(Self {
            session: session.clone(),
        }))
    }
}

impl PrettyPrinter for ListPrinter {
    fn pretty_print(&self, objs: ObjectStream<'_>) -> PipelineResult<()> {
        for obj in objs {
            let obj = obj?;
            let offset = obj.member("list_offset")?.value_u64()?;
            self.session
                .write_line(format!("list {:#x} offset {}", obj.value_u64()?, offset))?;
        }
        Ok(())
    }
}
