//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::connection::Connection;
pub use crate::error::{BackendErrorKind, SqlBridgeError};
pub use crate::executor::{MutationTransaction, QueryExecutor, RowStream};
pub use crate::results::{FetchShape, Row, ShapedRow};
pub use crate::statement::{CursorOrientation, Statement, StatementKind};
pub use crate::translation::{
    BindKey, Bindings, ParameterSyntax, Translation, translate_placeholders,
};
pub use crate::types::{BackendType, NamedTypes, NamedValues, ParamType, SqlValue};

#[cfg(feature = "test-utils")]
pub use crate::test_utils::{ExecutorCall, MockExecutor, rows_from};
