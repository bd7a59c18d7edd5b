//! # sdb-rs: pipeline-driven introspection shell
//!
//! Commands are chained with `|` into lazy pipelines over typed objects read
//! from a target program. A trailing `!` hands the printed output to a
//! system shell command.
//!
//! ## Architecture
//!
//! - **Backend**: type table, memory and objects of the inspected target,
//!   loaded from TOML/JSON snapshots
//! - **Pipeline**: parser, registry, builder with coercion insertion, and the
//!   lazy executor; walker, locator and pretty-printer dispatch
//! - **Commands**: the built-in stages, registered into the global registry
//! - **Shell**: the read-eval-print loop used by the `sdb` binary
//!
//! ## Example
//!
//! ```no_run
//! use sdb_rs::{backend::load_snapshot, pipeline::Session};
//!
//! let program = load_snapshot("core.toml")?;
//! let session = Session::new(program);
//! session.run("addr spa_namespace_avl | avl | cast spa_t * | member spa_name ! head")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backend;
pub mod commands;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod shell;

// Re-export commonly used types
pub use backend::{Object, Program};
pub use config::ShellConfig;
pub use error::{Result, SdbError};
pub use pipeline::{PipelineError, PipelineResult, Registry, Session};
pub use shell::Shell;
