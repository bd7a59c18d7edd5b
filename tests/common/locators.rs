//! Locators used to exercise type-directed dispatch
//!
//! Call counts are thread-local so that tests running in parallel do not
//! see each other's calls.

use sdb_rs::pipeline::stage::{self, ObjectStream};
use sdb_rs::pipeline::{
    InputHandler, Locator, PipelineError, PipelineResult, PrettyPrinter, Registry, Session,
};
use sdb_rs::Object;
use std::cell::Cell;

thread_local! {
    pub static NO_INPUT_CALLS: Cell<usize> = const { Cell::new(0) };
    pub static BY_ID_CALLS: Cell<usize> = const { Cell::new(0) };
    pub static BY_TASK_CALLS: Cell<usize> = const { Cell::new(0) };
}

pub fn reset_counts() {
    NO_INPUT_CALLS.with(|c| c.set(0));
    BY_ID_CALLS.with(|c| c.set(0));
    BY_TASK_CALLS.with(|c| c.set(0));
}

pub fn count(counter: &'static std::thread::LocalKey<Cell<usize>>) -> usize {
    counter.with(Cell::get)
}

fn bump(counter: &'static std::thread::LocalKey<Cell<usize>>) {
    counter.with(|c| c.set(c.get() + 1));
}

pub fn register(registry: &mut Registry) {
    registry.register_locator_printer::<FooLocator>();
    registry.register_locator::<PlainFooLocator>();
}

/// Finds `struct foo *` objects; prints them as `foo <id>`
pub struct FooLocator {
    session: Session,
}

impl FooLocator {
    fn all(&self) -> PipelineResult<Vec<Object>> {
        self.session
            .eval(Vec::new(), &["addr foo_list", "list", "cast struct foo *"])
    }

    fn by_id(&self, obj: Object) -> ObjectStream<'_> {
        bump(&BY_ID_CALLS);
        let found = obj.value_i64().map_err(PipelineError::from).and_then(|id| {
            let filter = format!("filter obj->id == {}", id);
            self.session.eval(self.all()?, &[filter.as_str()])
        });
        match found {
            Ok(objs) => stage::from_vec(objs),
            Err(e) => stage::fail(e),
        }
    }

    /// Never matches anything in the fixture; present to check handler order
    fn by_task(&self, _obj: Object) -> ObjectStream<'_> {
        bump(&BY_TASK_CALLS);
        stage::empty()
    }
}

impl Locator for FooLocator {
    const NAMES: &'static [&'static str] = &["foo"];
    const HELP: &'static str = "syntax: foo\n\nLocates struct foo objects.";
    const OUTPUT_TYPE: &'static str = "struct foo *";

    fn new(session: &Session, _args: &str) -> PipelineResult<Self> {
        Ok(Self {
            session: session.clone(),
        })
    }

    fn input_handlers(&self) -> Vec<InputHandler<Self>> {
        vec![
            InputHandler::new("int", Self::by_id),
            InputHandler::new("struct task *", Self::by_task),
            InputHandler::new("struct missing_type *", Self::by_task),
        ]
    }

    fn no_input(&self) -> ObjectStream<'_> {
        bump(&NO_INPUT_CALLS);
        match self.all() {
            Ok(objs) => stage::from_vec(objs),
            Err(e) => stage::fail(e),
        }
    }

    fn as_pretty_printer(&self) -> Option<&dyn PrettyPrinter> {
        Some(self)
    }
}

impl PrettyPrinter for FooLocator {
    fn pretty_print(&self, objs: ObjectStream<'_>) -> PipelineResult<()> {
        for obj in objs {
            let id = obj?.member("id")?.value_i64()?;
            self.session.write_line(format!("foo {}", id))?;
        }
        Ok(())
    }
}

/// Locates `struct foo *` with no handlers and no default output
pub struct PlainFooLocator;

impl Locator for PlainFooLocator {
    const NAMES: &'static [&'static str] = &["plain_foo"];
    const HELP: &'static str = "syntax: plain_foo";
    const OUTPUT_TYPE: &'static str = "struct foo *";

    fn new(_session: &Session, _args: &str) -> PipelineResult<Self> {
        Ok(Self)
    }
}
