//! Error handling for the sdb-rs backend and configuration layers
//!
//! Pipeline failures have their own taxonomy in [`crate::pipeline::error`];
//! this module covers everything underneath it: type resolution, symbol
//! lookup, memory access and config/snapshot loading.

use thiserror::Error;

/// Main error type for target and configuration operations
#[derive(Error, Debug)]
pub enum SdbError {
    /// A type name could not be resolved against the target's type table
    #[error("could not find type '{0}'")]
    UnknownType(String),

    /// A global/static symbol is not present in the target
    #[error("could not find symbol '{0}'")]
    UnknownSymbol(String),

    /// Member lookup on a structure failed
    #[error("{type_name} has no member '{member}'")]
    NoMember { type_name: String, member: String },

    /// An operation is not meaningful for the object's type
    #[error("cannot {operation} object of type {type_name}")]
    InvalidOperation {
        operation: &'static str,
        type_name: String,
    },

    /// Errors related to memory access
    #[error("memory access error at address 0x{address:x}: {message}")]
    MemoryAccess { address: u64, message: String },

    /// Errors related to configuration loading/saving
    #[error("configuration error: {0}")]
    Config(String),

    /// Errors related to snapshot file contents
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SdbError>,
    },
}

impl SdbError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SdbError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<toml::de::Error> for SdbError {
    fn from(err: toml::de::Error) -> Self {
        SdbError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SdbError {
    fn from(err: serde_json::Error) -> Self {
        SdbError::Serialization(err.to_string())
    }
}

/// Result type alias for backend and config operations
pub type Result<T> = std::result::Result<T, SdbError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
