//! Stage abstraction for the pipeline.
//!
//! A stage consumes a lazy stream of objects and produces another one.
//! Nothing runs until the stream is pulled: composing stages only nests
//! iterators, and the executor drives the outermost one.
//!
//! Errors travel through the stream as `Err` items. Consumers stop at the
//! first error, which aborts the whole pipeline.

use crate::backend::Object;
use crate::pipeline::error::{PipelineError, PipelineResult};

/// A lazily evaluated sequence of objects
pub type ObjectStream<'a> = Box<dyn Iterator<Item = PipelineResult<Object>> + 'a>;

/// A named, registered unit of computation.
pub trait Stage {
    /// Canonical command name, used in error messages.
    fn name(&self) -> &str;

    /// Type the input must be coerced to before reaching this stage.
    fn input_type(&self) -> Option<&str> {
        None
    }

    /// Whether the stage yields objects. Non-pipeable stages only print.
    fn is_pipeable(&self) -> bool {
        true
    }

    /// Called by the builder on the final stage of a pipeline.
    fn set_last(&mut self) {}

    /// Wrap the upstream stream.
    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a>;
}

/// A stream with no objects
pub fn empty<'a>() -> ObjectStream<'a> {
    Box::new(std::iter::empty())
}

/// A stream holding a single object
pub fn once<'a>(obj: Object) -> ObjectStream<'a> {
    Box::new(std::iter::once(Ok(obj)))
}

/// A stream that fails immediately
pub fn fail<'a>(err: PipelineError) -> ObjectStream<'a> {
    Box::new(std::iter::once(Err(err)))
}

/// A stream over already materialized objects
pub fn from_vec<'a>(objs: Vec<Object>) -> ObjectStream<'a> {
    Box::new(objs.into_iter().map(Ok))
}

/// A stream that runs `f` when first pulled and yields nothing but its error.
///
/// Non-pipeable stages wrap their side effects in this so that they still
/// run only when the executor drives the chain.
pub fn terminal<'a, F>(f: F) -> ObjectStream<'a>
where
    F: FnOnce() -> PipelineResult<()> + 'a,
{
    Box::new(std::iter::once_with(f).filter_map(|res| res.err().map(Err)))
}

/// Map every upstream object to a sub-stream and flatten the results.
///
/// If the upstream yields no objects at all, `on_empty` provides the output
/// instead. It is called at most once. Upstream errors are forwarded.
pub fn dispatch_each<'a, F, G>(input: ObjectStream<'a>, per_object: F, on_empty: G) -> ObjectStream<'a>
where
    F: FnMut(Object) -> ObjectStream<'a> + 'a,
    G: FnOnce() -> ObjectStream<'a> + 'a,
{
    Box::new(DispatchEach {
        input,
        per_object,
        on_empty: Some(on_empty),
        current: None,
        seen_input: false,
        exhausted: false,
    })
}

struct DispatchEach<'a, F, G> {
    input: ObjectStream<'a>,
    per_object: F,
    on_empty: Option<G>,
    current: Option<ObjectStream<'a>>,
    seen_input: bool,
    exhausted: bool,
}

impl<'a, F, G> Iterator for DispatchEach<'a, F, G>
where
    F: FnMut(Object) -> ObjectStream<'a>,
    G: FnOnce() -> ObjectStream<'a>,
{
    type Item = PipelineResult<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = self.current.as_mut() {
                match current.next() {
                    Some(item) => return Some(item),
                    None => self.current = None,
                }
            }
            if self.exhausted {
                return None;
            }

            match self.input.next() {
                Some(Ok(obj)) => {
                    self.seen_input = true;
                    self.current = Some((self.per_object)(obj));
                }
                Some(Err(e)) => {
                    self.seen_input = true;
                    return Some(Err(e));
                }
                None => {
                    self.exhausted = true;
                    if !self.seen_input {
                        if let Some(on_empty) = self.on_empty.take() {
                            self.current = Some(on_empty());
                        }
                    }
                }
            }
        }
    }
}
