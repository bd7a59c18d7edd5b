//! Pretty printers
//!
//! A [`PrettyPrinter`] renders objects of one type for humans. Printers are
//! registered per input type; the generic `pretty_print` command dispatches
//! on each object's runtime type.

use crate::backend::TypeId;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::registry::PrinterEntry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{self, ObjectStream, Stage};

pub trait PrettyPrinter {
    /// Print every object of the stream
    fn pretty_print(&self, objs: ObjectStream<'_>) -> PipelineResult<()>;
}

/// A printer used as a pipeline stage. Inputs must have the printer's type exactly.
pub struct PrinterStage {
    name: &'static str,
    input_type: &'static str,
    printer: Box<dyn PrettyPrinter>,
}

impl PrinterStage {
    pub fn new(
        name: &'static str,
        input_type: &'static str,
        printer: Box<dyn PrettyPrinter>,
    ) -> Self {
        Self {
            name,
            input_type,
            printer,
        }
    }
}

impl Stage for PrinterStage {
    fn name(&self) -> &str {
        self.name
    }

    fn input_type(&self) -> Option<&str> {
        Some(self.input_type)
    }

    fn is_pipeable(&self) -> bool {
        false
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        stage::terminal(move || {
            let mut expected: Option<TypeId> = None;
            for obj in input {
                let obj = obj?;
                let want = match expected {
                    Some(id) => id,
                    None => *expected.insert(obj.program().resolve_type(self.input_type)?),
                };
                if obj.type_id() != want {
                    return Err(PipelineError::TypeMismatch {
                        stage: self.name.to_string(),
                        actual: obj.type_name(),
                    });
                }
                self.printer.pretty_print(stage::once(obj))?;
            }
            Ok(())
        })
    }
}

fn resolve_printers(session: &Session) -> Vec<(TypeId, String, PrinterEntry)> {
    session
        .registry()
        .printers()
        .filter_map(|(type_name, entry)| match session.program().resolve_type(type_name) {
            Ok(id) => Some((id, type_name.to_string(), entry.clone())),
            Err(_) => {
                tracing::trace!("printer type '{}' not present in target", type_name);
                None
            }
        })
        .collect()
}

/// The generic `pretty_print` command
pub struct PrettyPrintStage {
    session: Session,
    printers: Vec<(TypeId, String, PrinterEntry)>,
    last: bool,
}

impl PrettyPrintStage {
    pub fn new(session: &Session) -> Self {
        Self {
            session: session.clone(),
            printers: resolve_printers(session),
            last: false,
        }
    }

    pub fn construct(session: &Session, _args: &str) -> PipelineResult<Box<dyn Stage>> {
        Ok(Box::new(Self::new(session)))
    }

    fn list_printers(&self) -> PipelineResult<()> {
        self.session
            .write_line("The following types have pretty-printers:")?;
        self.session
            .write_line(format!("\t{:<20} {:<20}", "PRINTER", "TYPE"))?;
        for (_, type_name, entry) in &self.printers {
            self.session
                .write_line(format!("\t{:<20} {:<20}", entry.command, type_name))?;
        }
        Ok(())
    }

    fn print_all(&self, input: ObjectStream<'_>) -> PipelineResult<()> {
        let mut has_input = false;
        for obj in input {
            let obj = obj?;
            has_input = true;
            let entry = self
                .printers
                .iter()
                .find(|(id, _, _)| *id == obj.type_id())
                .map(|(_, _, entry)| entry);
            match entry {
                Some(entry) => {
                    let printer = (entry.constructor)(&self.session, "")?;
                    printer.pretty_print(stage::once(obj))?;
                }
                None => {
                    return Err(PipelineError::NoPrinter {
                        actual: obj.type_name(),
                    })
                }
            }
        }
        if !has_input && self.last {
            self.list_printers()?;
        }
        Ok(())
    }
}

impl Stage for PrettyPrintStage {
    fn name(&self) -> &str {
        "pretty_print"
    }

    fn is_pipeable(&self) -> bool {
        false
    }

    fn set_last(&mut self) {
        self.last = true;
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        stage::terminal(move || self.print_all(input))
    }
}
