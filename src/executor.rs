// Executor module - the backend seam: read queries and mutation transactions

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::SqlBridgeError;
use crate::results::Row;
use crate::types::{NamedTypes, NamedValues};

/// A forward-only stream of rows from a read query.
pub type RowStream = BoxStream<'static, Result<Row, SqlBridgeError>>;

/// The backend boundary.
///
/// An implementation adapts one concrete SDK: it runs read queries as direct
/// streaming calls, runs mutations inside explicit transactions, and folds
/// the SDK's failures into kind-tagged [`SqlBridgeError::Backend`] values so
/// nothing above this trait depends on driver error types.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a read query with named parameters.
    ///
    /// # Errors
    ///
    /// Returns `SqlBridgeError::Backend` if the backend rejects or cannot run
    /// the query.
    async fn execute_read(
        &self,
        sql: &str,
        params: &NamedValues,
    ) -> Result<RowStream, SqlBridgeError>;

    /// Open a mutation transaction.
    ///
    /// Nothing executed through the returned handle is durable until its
    /// `commit` returns Ok. A handle dropped without commit must leave
    /// nothing committed; that is the implementor's responsibility.
    ///
    /// # Errors
    ///
    /// Returns `SqlBridgeError::Backend` if a transaction cannot be started.
    async fn begin_mutation(&self) -> Result<Box<dyn MutationTransaction>, SqlBridgeError>;
}

/// Handle for one open mutation transaction, consumed by commit or rollback.
#[async_trait]
pub trait MutationTransaction: Send {
    /// Execute a data-modifying statement inside this transaction and return
    /// the affected-row count the backend reports.
    ///
    /// # Errors
    ///
    /// Returns `SqlBridgeError::Backend` if the statement fails; the
    /// transaction is then expected to be rolled back by the caller.
    async fn execute_update(
        &mut self,
        sql: &str,
        params: &NamedValues,
        types: &NamedTypes,
    ) -> Result<u64, SqlBridgeError>;

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns `SqlBridgeError::Backend` if committing fails; nothing is
    /// durable in that case.
    async fn commit(self: Box<Self>) -> Result<(), SqlBridgeError>;

    /// Roll back the transaction.
    ///
    /// # Errors
    ///
    /// Returns `SqlBridgeError::Backend` if rolling back fails.
    async fn rollback(self: Box<Self>) -> Result<(), SqlBridgeError>;
}
