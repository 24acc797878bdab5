//! Placeholder translation, statement execution, and scrollable-cursor
//! emulation for SQL backends that only take named parameters and only
//! stream results forward.

pub mod connection;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod translation;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use connection::Connection;
pub use error::{BackendErrorKind, SqlBridgeError};
pub use statement::{CursorOrientation, Statement, StatementKind};
pub use translation::translate_placeholders;
pub use types::SqlValue;
