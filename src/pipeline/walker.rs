//! Structure walkers
//!
//! A [`Walker`] knows how to traverse one in-memory structure shape (a
//! linked list, an AVL tree, a hash chain) from its root object. Walkers are
//! registered per input type; the generic `walk` command looks up the
//! walker for each object's runtime type and delegates to it.

use crate::backend::{Object, TypeId};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::registry::WalkerEntry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{self, ObjectStream, Stage};

pub trait Walker {
    /// Every element reachable from `root`, in the structure's natural order
    fn walk(&self, root: Object) -> ObjectStream<'static>;
}

/// A walker used as a pipeline stage. Inputs must have the walker's type exactly.
pub struct WalkerStage {
    name: &'static str,
    input_type: &'static str,
    walker: Box<dyn Walker>,
}

impl WalkerStage {
    pub fn new(name: &'static str, input_type: &'static str, walker: Box<dyn Walker>) -> Self {
        Self {
            name,
            input_type,
            walker,
        }
    }
}

impl Stage for WalkerStage {
    fn name(&self) -> &str {
        self.name
    }

    fn input_type(&self) -> Option<&str> {
        Some(self.input_type)
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        let mut expected: Option<TypeId> = None;
        stage::dispatch_each(
            input,
            move |obj| {
                let want = match expected {
                    Some(id) => id,
                    None => match obj.program().resolve_type(self.input_type) {
                        Ok(id) => *expected.insert(id),
                        Err(e) => return stage::fail(e.into()),
                    },
                };
                if obj.type_id() != want {
                    return stage::fail(PipelineError::TypeMismatch {
                        stage: self.name.to_string(),
                        actual: obj.type_name(),
                    });
                }
                self.walker.walk(obj)
            },
            stage::empty,
        )
    }
}

/// Registered walkers whose input types exist in the session's target
/// Registered walkers whose input type exists in the target
pub(crate) type ResolvedWalkers = Vec<(TypeId, String, WalkerEntry)>;

pub(crate) fn resolve_walkers(session: &Session) -> ResolvedWalkers {
    session
        .registry()
        .walkers()
        .filter_map(|(type_name, entry)| match session.program().resolve_type(type_name) {
            Ok(id) => Some((id, type_name.to_string(), entry.clone())),
            Err(_) => {
                tracing::trace!("walker type '{}' not present in target", type_name);
                None
            }
        })
        .collect()
}

/// Construct the walker for a runtime type from an already resolved table
pub(crate) fn walker_for(
    session: &Session,
    walkers: &[(TypeId, String, WalkerEntry)],
    type_id: TypeId,
) -> PipelineResult<Option<Box<dyn Walker>>> {
    match walkers.iter().find(|(id, _, _)| *id == type_id) {
        Some((_, _, entry)) => Ok(Some((entry.constructor)(session, "")?)),
        None => Ok(None),
    }
}

/// The generic `walk` command
pub struct WalkStage {
    session: Session,
    walkers: ResolvedWalkers,
    last: bool,
}

impl WalkStage {
    pub fn new(session: &Session) -> Self {
        Self {
            session: session.clone(),
            walkers: resolve_walkers(session),
            last: false,
        }
    }

    pub fn construct(session: &Session, _args: &str) -> PipelineResult<Box<dyn Stage>> {
        Ok(Box::new(Self::new(session)))
    }

    fn list_walkers(&self) -> PipelineResult<()> {
        self.session.write_line("The following types have walkers:")?;
        self.session
            .write_line(format!("\t{:<20} {:<20}", "WALKER", "TYPE"))?;
        for (_, type_name, entry) in &self.walkers {
            self.session
                .write_line(format!("\t{:<20} {:<20}", entry.command, type_name))?;
        }
        Ok(())
    }

    fn walk_one(&self, obj: Object) -> ObjectStream<'static> {
        let found = self.walkers.iter().find(|(id, _, _)| *id == obj.type_id());
        match found {
            Some((_, _, entry)) => match (entry.constructor)(&self.session, "") {
                Ok(walker) => {
                    tracing::trace!("walking {} with \"{}\"", obj.type_name(), entry.command);
                    walker.walk(obj)
                }
                Err(e) => stage::fail(e),
            },
            None => {
                if let Err(e) = self.list_walkers() {
                    return stage::fail(e);
                }
                stage::fail(PipelineError::NoWalker {
                    actual: obj.type_name(),
                })
            }
        }
    }
}

impl Stage for WalkStage {
    fn name(&self) -> &str {
        "walk"
    }

    fn set_last(&mut self) {
        self.last = true;
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        stage::dispatch_each(
            input,
            move |obj| self.walk_one(obj),
            move || {
                // No input as the last stage: most likely also the first, so
                // show what can be walked.
                if self.last {
                    if let Err(e) = self.list_walkers() {
                        return stage::fail(e);
                    }
                }
                stage::empty()
            },
        )
    }
}
