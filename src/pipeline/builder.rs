//! Pipeline construction
//!
//! Turns parsed stage texts into constructed stages. Each text is split
//! into a command name and its argument string; the name is looked up in
//! the session's registry. Any unknown name fails the whole build, so a
//! pipeline either runs completely or not at all.

use crate::pipeline::coerce::CoerceStage;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::executor;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{ObjectStream, Stage};

/// An ordered, one-shot list of constructed stages
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|s| s.name()))
            .finish()
    }
}

impl Pipeline {
    pub fn stages(&self) -> &[Box<dyn Stage>] {
        &self.stages
    }

    /// Stage names in execution order, inserted coercions included
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Whether the final stage yields objects
    pub fn is_pipeable(&self) -> bool {
        self.stages.last().map(|s| s.is_pipeable()).unwrap_or(false)
    }

    /// Compose the stages over `input`. Nothing runs until the result is pulled.
    pub fn execute<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        executor::execute(input, &self.stages)
    }

    /// Drive the whole chain for its side effects
    pub fn execute_terminal<'a>(&'a self, input: ObjectStream<'a>) -> PipelineResult<()> {
        executor::execute_terminal(input, &self.stages)
    }
}

/// Split `name args...` into the command name and its verbatim argument text
fn split_command(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.find(char::is_whitespace) {
        Some(pos) => (&text[..pos], text[pos..].trim_start()),
        None => (text, ""),
    }
}

/// Build a pipeline from stage texts
pub fn build_pipeline(session: &Session, texts: &[String]) -> PipelineResult<Pipeline> {
    let mut stages: Vec<Box<dyn Stage>> = Vec::with_capacity(texts.len() * 2);

    for (position, text) in texts.iter().enumerate() {
        let (name, args) = split_command(text);
        if name.is_empty() {
            return Err(PipelineError::EmptyCommand);
        }
        let entry = session
            .registry()
            .command(name)
            .ok_or_else(|| PipelineError::UnknownCommand(name.to_string()))?;

        let stage = entry.construct(session, args)?;
        if position > 0 {
            if let Some(input_type) = stage.input_type() {
                tracing::debug!(
                    "inserting coercion to '{}' before \"{}\"",
                    input_type,
                    stage.name()
                );
                stages.push(Box::new(CoerceStage::new(
                    session.program(),
                    input_type,
                    stage.name(),
                )?));
            }
        }
        stages.push(stage);
    }

    match stages.last_mut() {
        Some(last) => last.set_last(),
        None => return Err(PipelineError::EmptyCommand),
    }

    tracing::debug!(stages = ?stages.iter().map(|s| s.name()).collect::<Vec<_>>(), "pipeline built");
    Ok(Pipeline { stages })
}
