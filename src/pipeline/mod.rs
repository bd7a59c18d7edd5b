//! Stage-based object pipelines.
//!
//! A command line is parsed into stage texts, each text is resolved to a
//! constructed stage through the registry, and the stages are composed into
//! one lazily pulled stream of typed objects.
//!
//! # Architecture
//!
//! ```text
//! "echo 0x10 | list | cast spa_t * ! less"
//!        │
//!   [parser] ──► ["echo 0x10", "list", "cast spa_t *"] + shell "less"
//!        │
//!   [builder] ──► echo ─► coerce(list_t *) ─► list ─► cast
//!        │
//!   [executor] pulls from cast, which pulls from list, ...
//! ```
//!
//! # Design
//!
//! - **Lazy streams**: every stage maps an `ObjectStream` to another; nothing
//!   runs until the executor pulls.
//! - **Fail-fast**: errors travel as `Err` items and abort the whole run.
//! - **Coercion insertion**: stages with a declared input type get a
//!   coercion stage in front of them unless they come first.
//! - **Registry dispatch**: walkers and pretty printers are found by the
//!   runtime type of each object; locators add type-tagged producers on top.

pub mod builder;
pub mod coerce;
pub mod error;
pub mod executor;
pub mod locator;
pub mod parser;
pub mod pretty_printer;
pub mod registry;
pub mod session;
pub mod stage;
pub mod walker;

pub use builder::{build_pipeline, Pipeline};
pub use coerce::CoerceStage;
pub use error::{PipelineError, PipelineResult};
pub use executor::{execute, execute_terminal, invoke};
pub use locator::{InputHandler, Locator, LocatorStage, Producer};
pub use parser::{parse_line, ParsedLine};
pub use pretty_printer::{PrettyPrintStage, PrettyPrinter, PrinterStage};
pub use registry::{Registry, StageConstructor};
pub use session::{OutputBuffer, Session};
pub use stage::{ObjectStream, Stage};
pub use walker::{WalkStage, Walker, WalkerStage};
