//! Debug backend for the pipeline engine
//!
//! Everything the engine needs from a target lives here: resolving type
//! names, comparing type descriptors, walking members, taking addresses,
//! casting and reading values out of memory.
//!
//! # Components
//!
//! - [`TypeTable`] - Index-based type descriptors with interned pointer types
//! - [`MemorySource`] - Raw memory access, with [`SnapshotMemory`] as the in-memory image
//! - [`Program`] - Types, symbols and memory of one target, shared behind an `Arc`
//! - [`Object`] - The typed value or reference that flows through pipelines
//! - [`SnapshotSpec`] / [`SnapshotBuilder`] - Building a [`Program`] from a file or from code
//!
//! # Example
//!
//! ```ignore
//! use sdb_rs::backend::load_snapshot;
//!
//! let program = load_snapshot("spa.toml")?;
//! let root = program.object("spa_namespace_avl")?.address_of()?;
//! println!("{}", root);
//! ```

pub mod memory;
pub mod object;
pub mod program;
pub mod snapshot;
pub mod type_table;

pub use memory::{MemorySource, SnapshotMemory};
pub use object::{parse_int, Object};
pub use program::{Program, Symbol};
pub use snapshot::{load_snapshot, SnapshotBuilder, SnapshotSpec};
pub use type_table::{MemberDef, PrimitiveDef, StructDef, TypeDef, TypeId, TypeTable};
