//! Command, walker and pretty-printer registry
//!
//! Three tables, all keyed by string:
//! - command name (every alias) → stage constructor
//! - walker input type name → walker constructor
//! - printer input type name → pretty-printer constructor
//!
//! Registering a key twice replaces the earlier binding. The replacement is
//! logged at `warn` level.
//!
//! The process-wide registry is built once, on first use, from
//! [`crate::commands::register_builtins`]. Sessions hold an `Arc` to a
//! registry, so tests can use their own instead.

use crate::pipeline::error::PipelineResult;
use crate::pipeline::locator::{Locator, LocatorStage};
use crate::pipeline::pretty_printer::{PrettyPrinter, PrinterStage};
use crate::pipeline::session::Session;
use crate::pipeline::stage::Stage;
use crate::pipeline::walker::{Walker, WalkerStage};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a stage from its argument text
pub type StageConstructor = fn(&Session, &str) -> PipelineResult<Box<dyn Stage>>;
/// Builds a walker from its argument text
pub type WalkerConstructor = fn(&Session, &str) -> PipelineResult<Box<dyn Walker>>;
/// Builds a pretty printer from its argument text
pub type PrinterConstructor = fn(&Session, &str) -> PipelineResult<Box<dyn PrettyPrinter>>;

/// How a command turns into a stage
#[derive(Clone, Copy)]
pub enum Constructor {
    Stage(StageConstructor),
    Walker {
        input_type: &'static str,
        constructor: WalkerConstructor,
    },
    Printer {
        input_type: &'static str,
        constructor: PrinterConstructor,
    },
}

/// A registered command
#[derive(Clone)]
pub struct CommandEntry {
    /// Canonical name (first alias)
    pub name: &'static str,
    pub help: &'static str,
    pub constructor: Constructor,
}

impl CommandEntry {
    /// Construct the stage for one pipeline position
    pub fn construct(&self, session: &Session, args: &str) -> PipelineResult<Box<dyn Stage>> {
        match self.constructor {
            Constructor::Stage(f) => f(session, args),
            Constructor::Walker {
                input_type,
                constructor,
            } => Ok(Box::new(WalkerStage::new(
                self.name,
                input_type,
                constructor(session, args)?,
            ))),
            Constructor::Printer {
                input_type,
                constructor,
            } => Ok(Box::new(PrinterStage::new(
                self.name,
                input_type,
                constructor(session, args)?,
            ))),
        }
    }
}

/// A registered walker, keyed by its input type name
#[derive(Clone)]
pub struct WalkerEntry {
    pub command: &'static str,
    pub constructor: WalkerConstructor,
}

/// A registered pretty printer, keyed by its input type name
#[derive(Clone)]
pub struct PrinterEntry {
    pub command: &'static str,
    pub constructor: PrinterConstructor,
}

#[derive(Default, Clone)]
pub struct Registry {
    commands: BTreeMap<String, CommandEntry>,
    walkers: BTreeMap<String, WalkerEntry>,
    printers: BTreeMap<String, PrinterEntry>,
}

static GLOBAL: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::with_builtins()));

/// The process-wide registry holding every built-in command
pub fn global() -> Arc<Registry> {
    Arc::clone(&GLOBAL)
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry populated with the built-in commands
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::commands::register_builtins(&mut registry);
        tracing::debug!(
            commands = registry.commands.len(),
            walkers = registry.walkers.len(),
            printers = registry.printers.len(),
            "registry populated"
        );
        registry
    }

    fn insert_command(&mut self, alias: &str, entry: CommandEntry) {
        if let Some(previous) = self.commands.insert(alias.to_string(), entry) {
            tracing::warn!(
                "command \"{}\" re-registered, replacing \"{}\"",
                alias,
                previous.name
            );
        }
    }

    /// Register a plain stage under every name in `names`
    pub fn register_command(
        &mut self,
        names: &[&'static str],
        help: &'static str,
        constructor: StageConstructor,
    ) {
        self.register(names, help, Constructor::Stage(constructor));
    }

    fn register(&mut self, names: &[&'static str], help: &'static str, constructor: Constructor) {
        let Some(&name) = names.first() else {
            return;
        };
        let entry = CommandEntry {
            name,
            help,
            constructor,
        };
        for alias in names {
            self.insert_command(alias, entry.clone());
        }
    }

    /// Register a walker both as a command and as the handler for `input_type`
    pub fn register_walker(
        &mut self,
        names: &[&'static str],
        input_type: &'static str,
        help: &'static str,
        constructor: WalkerConstructor,
    ) {
        self.register(
            names,
            help,
            Constructor::Walker {
                input_type,
                constructor,
            },
        );
        if let Some(&command) = names.first() {
            let entry = WalkerEntry {
                command,
                constructor,
            };
            if let Some(previous) = self.walkers.insert(input_type.to_string(), entry) {
                tracing::warn!(
                    "walker for '{}' re-registered, replacing \"{}\"",
                    input_type,
                    previous.command
                );
            }
        }
    }

    /// Register a pretty printer both as a command and as the handler for `input_type`
    pub fn register_printer(
        &mut self,
        names: &[&'static str],
        input_type: &'static str,
        help: &'static str,
        constructor: PrinterConstructor,
    ) {
        self.register(
            names,
            help,
            Constructor::Printer {
                input_type,
                constructor,
            },
        );
        if let Some(&command) = names.first() {
            self.insert_printer(input_type, command, constructor);
        }
    }

    fn insert_printer(
        &mut self,
        input_type: &'static str,
        command: &'static str,
        constructor: PrinterConstructor,
    ) {
        let entry = PrinterEntry {
            command,
            constructor,
        };
        if let Some(previous) = self.printers.insert(input_type.to_string(), entry) {
            tracing::warn!(
                "pretty printer for '{}' re-registered, replacing \"{}\"",
                input_type,
                previous.command
            );
        }
    }

    /// Register a locator as a command
    pub fn register_locator<L: Locator>(&mut self) {
        self.register(
            L::NAMES,
            L::HELP,
            Constructor::Stage(LocatorStage::<L>::construct),
        );
    }

    /// Register a locator that also pretty-prints its output type.
    ///
    /// The command builds a [`LocatorStage`]; generic pretty printing of
    /// `L::OUTPUT_TYPE` objects goes to the same type.
    pub fn register_locator_printer<L: Locator + PrettyPrinter>(&mut self) {
        self.register_locator::<L>();
        if let Some(&command) = L::NAMES.first() {
            self.insert_printer(L::OUTPUT_TYPE, command, construct_locator_printer::<L>);
        }
    }

    pub fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    /// All command names, aliases included, sorted
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Walker table, sorted by input type name
    pub fn walkers(&self) -> impl Iterator<Item = (&str, &WalkerEntry)> {
        self.walkers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Printer table, sorted by input type name
    pub fn printers(&self) -> impl Iterator<Item = (&str, &PrinterEntry)> {
        self.printers.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn construct_locator_printer<L: Locator + PrettyPrinter>(
    session: &Session,
    args: &str,
) -> PipelineResult<Box<dyn PrettyPrinter>> {
    Ok(Box::new(L::new(session, args)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::ObjectStream;

    struct Nop;

    impl Stage for Nop {
        fn name(&self) -> &str {
            "nop"
        }

        fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
            input
        }
    }

    struct Other;

    impl Stage for Other {
        fn name(&self) -> &str {
            "other"
        }

        fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
            input
        }
    }

    fn nop(_: &Session, _: &str) -> PipelineResult<Box<dyn Stage>> {
        Ok(Box::new(Nop))
    }

    fn other(_: &Session, _: &str) -> PipelineResult<Box<dyn Stage>> {
        Ok(Box::new(Other))
    }

    #[test]
    fn test_aliases_share_an_entry() {
        let mut registry = Registry::new();
        registry.register_command(&["nop", "n"], "does nothing", nop);
        assert_eq!(registry.command("n").unwrap().name, "nop");
        assert_eq!(registry.command("nop").unwrap().help, "does nothing");
        assert_eq!(registry.command_names().collect::<Vec<_>>(), vec!["n", "nop"]);
        assert!(registry.command("missing").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = Registry::new();
        registry.register_command(&["x"], "first", nop);
        registry.register_command(&["x"], "second", other);
        assert_eq!(registry.command("x").unwrap().help, "second");
        assert_eq!(registry.command("x").unwrap().name, "x");
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = global();
        for name in ["echo", "cc", "walk", "pp", "pretty_print", "cast", "coerce", "member"] {
            assert!(registry.command(name).is_some(), "missing {}", name);
        }
        let walker_types: Vec<&str> = registry.walkers().map(|(t, _)| t).collect();
        assert!(walker_types.contains(&"list_t *"));
        assert!(walker_types.contains(&"avl_tree_t *"));
        assert!(walker_types.contains(&"struct list_head *"));
        assert!(walker_types.contains(&"struct hlist_head *"));
    }
}
