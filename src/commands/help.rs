//! `help`: describe registered commands

use crate::pipeline::error::PipelineResult;
use crate::pipeline::registry::Registry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{self, ObjectStream, Stage};

const HELP: &str = "syntax: help <command> [<command> ...]

Prints the description of each named command. Without arguments, lists
every registered command.";

pub fn register(registry: &mut Registry) {
    registry.register_command(&["help"], HELP, Help::construct);
}

pub struct Help {
    session: Session,
    topics: Vec<String>,
}

impl Help {
    pub fn construct(session: &Session, args: &str) -> PipelineResult<Box<dyn Stage>> {
        Ok(Box::new(Self {
            session: session.clone(),
            topics: args.split_whitespace().map(str::to_string).collect(),
        }))
    }

    fn print(&self) -> PipelineResult<()> {
        let registry = self.session.registry();
        if self.topics.is_empty() {
            self.session.write_line(HELP.lines().next().unwrap_or(HELP))?;
            self.session.write_line("")?;
            self.session.write_line("Available commands:")?;
            for name in registry.command_names() {
                self.session.write_line(format!("\t{}", name))?;
            }
            return Ok(());
        }
        for topic in &self.topics {
            match registry.command(topic) {
                Some(entry) => {
                    self.session.write_line(entry.name)?;
                    for line in entry.help.lines() {
                        self.session.write_line(format!("    {}", line))?;
                    }
                }
                None => self
                    .session
                    .write_line(format!("command {} doesn't exist", topic))?,
            }
        }
        Ok(())
    }
}

impl Stage for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn is_pipeable(&self) -> bool {
        false
    }

    fn call<'a>(&'a self, _input: ObjectStream<'a>) -> ObjectStream<'a> {
        stage::terminal(move || self.print())
    }
}
