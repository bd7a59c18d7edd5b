//! Locators
//!
//! A [`Locator`] finds objects of one output type. For every input object
//! it tries, in order:
//!
//! 1. its [`InputHandler`]s, in declaration order; the first whose type
//!    matches the object's runtime type handles the object alone
//! 2. passthrough, when the object already has the output type
//! 3. the registered walker for the object's type, casting every walked
//!    element to the output type
//!
//! With no input objects at all, [`Locator::no_input`] produces the output
//! instead. A locator that is also a [`PrettyPrinter`] prints its results
//! when it is the last stage of a pipeline.

use crate::backend::{Object, TypeId};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::pretty_printer::PrettyPrinter;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{self, ObjectStream, Stage};
use crate::pipeline::walker::{self, ResolvedWalkers};

/// Produces output objects from one input object
pub type Producer<L> = for<'x> fn(&'x L, Object) -> ObjectStream<'x>;

/// A producer for one accepted input type
pub struct InputHandler<L> {
    pub type_name: &'static str,
    pub produce: Producer<L>,
}

impl<L> InputHandler<L> {
    pub fn new(type_name: &'static str, produce: Producer<L>) -> Self {
        Self { type_name, produce }
    }
}

pub trait Locator: Sized + 'static {
    /// Command name followed by its aliases
    const NAMES: &'static [&'static str];
    const HELP: &'static str;
    /// Type of every object this locator yields
    const OUTPUT_TYPE: &'static str;

    fn new(session: &Session, args: &str) -> PipelineResult<Self>;

    /// Type-tagged producers, tried in this order
    fn input_handlers(&self) -> Vec<InputHandler<Self>> {
        Vec::new()
    }

    /// Output when the pipeline supplies no input objects
    fn no_input(&self) -> ObjectStream<'_> {
        stage::fail(PipelineError::RequiresInput {
            stage: Self::NAMES.first().copied().unwrap_or_default().to_string(),
        })
    }

    /// Set for locators that double as the printer of their output type
    fn as_pretty_printer(&self) -> Option<&dyn PrettyPrinter> {
        None
    }
}

/// Runs a [`Locator`] as a pipeline stage
pub struct LocatorStage<L: Locator> {
    session: Session,
    locator: L,
    output_type: TypeId,
    /// Handlers with their accepted type resolved once, at construction
    handlers: Vec<(TypeId, Producer<L>)>,
    /// Walkers for the fallback, resolved at construction like `walk` does
    walkers: ResolvedWalkers,
    last: bool,
}

impl<L: Locator> LocatorStage<L> {
    pub fn new(session: &Session, locator: L) -> PipelineResult<Self> {
        let program = session.program();
        let output_type = program.resolve_type(L::OUTPUT_TYPE)?;
        let mut handlers = Vec::new();
        for handler in locator.input_handlers() {
            match program.resolve_type(handler.type_name) {
                Ok(id) => handlers.push((id, handler.produce)),
                Err(_) => tracing::debug!(
                    "\"{}\": input type '{}' not present in target, handler skipped",
                    Self::command_name(),
                    handler.type_name
                ),
            }
        }
        Ok(Self {
            session: session.clone(),
            locator,
            output_type,
            handlers,
            walkers: walker::resolve_walkers(session),
            last: false,
        })
    }

    /// Registry constructor
    pub fn construct(session: &Session, args: &str) -> PipelineResult<Box<dyn Stage>> {
        let locator = L::new(session, args)?;
        Ok(Box::new(Self::new(session, locator)?))
    }

    fn command_name() -> &'static str {
        L::NAMES.first().copied().unwrap_or_default()
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    fn locate(&self, obj: Object) -> ObjectStream<'_> {
        let mut handled: Option<ObjectStream<'_>> = None;
        for &(type_id, produce) in &self.handlers {
            if obj.type_id() == type_id {
                tracing::trace!("\"{}\" handles {}", Self::command_name(), obj.type_name());
                handled = Some(produce(&self.locator, obj.clone()));
                break;
            }
        }
        if let Some(stream) = handled {
            return stream;
        }

        if obj.type_id() == self.output_type {
            return stage::once(obj);
        }

        match walker::walker_for(&self.session, &self.walkers, obj.type_id()) {
            Ok(Some(w)) => {
                let output_type = self.output_type;
                Box::new(w.walk(obj).map(move |res| {
                    res.and_then(|o| o.cast(output_type).map_err(PipelineError::from))
                }))
            }
            Ok(None) => stage::fail(PipelineError::TypeMismatch {
                stage: Self::command_name().to_string(),
                actual: obj.type_name(),
            }),
            Err(e) => stage::fail(e),
        }
    }

    fn located<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        stage::dispatch_each(input, move |obj| self.locate(obj), move || self.locator.no_input())
    }
}

impl<L: Locator> Stage for LocatorStage<L> {
    fn name(&self) -> &str {
        Self::command_name()
    }

    fn is_pipeable(&self) -> bool {
        !(self.last && self.locator.as_pretty_printer().is_some())
    }

    fn set_last(&mut self) {
        self.last = true;
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        let located = self.located(input);
        match self.locator.as_pretty_printer() {
            Some(printer) if self.last => stage::terminal(move || printer.pretty_print(located)),
            _ => located,
        }
    }
}
