//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod locators;
pub mod printers;

use sdb_rs::backend::Program;
use sdb_rs::pipeline::{OutputBuffer, Registry, Session};
use std::sync::Arc;

/// A session over the fixture target with the built-in commands
pub fn fixture_session() -> (Session, OutputBuffer) {
    session_with(builders::fixture_program(), Registry::with_builtins())
}

/// A session over the fixture target whose registry also holds the test locators
pub fn locator_session() -> (Session, OutputBuffer) {
    let mut registry = Registry::with_builtins();
    locators::register(&mut registry);
    session_with(builders::fixture_program(), registry)
}

/// Like [`locator_session`], plus a plain printer for `list_t *`
pub fn printer_session() -> (Session, OutputBuffer) {
    let mut registry = Registry::with_builtins();
    locators::register(&mut registry);
    printers::register(&mut registry);
    session_with(builders::fixture_program(), registry)
}

pub fn session_with(program: Arc<Program>, registry: Registry) -> (Session, OutputBuffer) {
    let out = OutputBuffer::new();
    let session = Session::with_registry(program, Arc::new(registry)).with_output(out.clone());
    (session, out)
}

/// Display strings of a collected pipeline result
pub fn rendered(objs: &[sdb_rs::Object]) -> Vec<String> {
    objs.iter().map(ToString::to_string).collect()
}
