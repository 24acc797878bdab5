// Test utilities - scripted executor for exercising statements without a live backend

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures_util::stream;

use crate::error::SqlBridgeError;
use crate::executor::{MutationTransaction, QueryExecutor, RowStream};
use crate::results::Row;
use crate::types::{NamedTypes, NamedValues, SqlValue};

/// One observed backend interaction, journaled in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutorCall {
    Read {
        sql: String,
        params: NamedValues,
    },
    BeginMutation,
    Update {
        sql: String,
        params: NamedValues,
        types: NamedTypes,
    },
    Commit,
    Rollback,
}

enum ReadScript {
    Rows(Vec<Row>),
    Failure(SqlBridgeError),
    /// Some rows, then a stream error mid-drain.
    Interrupted(Vec<Row>, SqlBridgeError),
}

#[derive(Default)]
struct MockState {
    reads: VecDeque<ReadScript>,
    updates: VecDeque<Result<u64, SqlBridgeError>>,
    calls: Vec<ExecutorCall>,
}

/// A scripted [`QueryExecutor`]: read results and mutation outcomes are
/// queued ahead of time, and every interaction lands in a journal the test
/// can assert on. Unscripted reads return no rows; unscripted updates report
/// zero affected.
#[derive(Clone, Default)]
pub struct MockExecutor {
    state: Arc<Mutex<MockState>>,
}

impl MockExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one read result.
    pub fn script_rows(&self, rows: Vec<Row>) {
        self.lock().reads.push_back(ReadScript::Rows(rows));
    }

    /// Queue a read that fails at dispatch.
    pub fn script_read_failure(&self, err: SqlBridgeError) {
        self.lock().reads.push_back(ReadScript::Failure(err));
    }

    /// Queue a read whose stream yields `rows` and then breaks.
    pub fn script_interrupted_read(&self, rows: Vec<Row>, err: SqlBridgeError) {
        self.lock()
            .reads
            .push_back(ReadScript::Interrupted(rows, err));
    }

    /// Queue one mutation outcome: the affected-row count.
    pub fn script_affected(&self, count: u64) {
        self.lock().updates.push_back(Ok(count));
    }

    /// Queue a mutation that fails inside the transaction.
    pub fn script_update_failure(&self, err: SqlBridgeError) {
        self.lock().updates.push_back(Err(err));
    }

    /// Snapshot of the journal so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn execute_read(
        &self,
        sql: &str,
        params: &NamedValues,
    ) -> Result<RowStream, SqlBridgeError> {
        let script = {
            let mut state = self.lock();
            state.calls.push(ExecutorCall::Read {
                sql: sql.to_string(),
                params: params.clone(),
            });
            state.reads.pop_front()
        };
        match script {
            None => {
                let items: Vec<Result<Row, SqlBridgeError>> = Vec::new();
                Ok(Box::pin(stream::iter(items)))
            }
            Some(ReadScript::Rows(rows)) => {
                let items: Vec<Result<Row, SqlBridgeError>> = rows.into_iter().map(Ok).collect();
                Ok(Box::pin(stream::iter(items)))
            }
            Some(ReadScript::Failure(err)) => Err(err),
            Some(ReadScript::Interrupted(rows, err)) => {
                let mut items: Vec<Result<Row, SqlBridgeError>> =
                    rows.into_iter().map(Ok).collect();
                items.push(Err(err));
                Ok(Box::pin(stream::iter(items)))
            }
        }
    }

    async fn begin_mutation(&self) -> Result<Box<dyn MutationTransaction>, SqlBridgeError> {
        self.lock().calls.push(ExecutorCall::BeginMutation);
        Ok(Box::new(MockTransaction {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockTransaction {
    state: Arc<Mutex<MockState>>,
}

impl MockTransaction {
    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MutationTransaction for MockTransaction {
    async fn execute_update(
        &mut self,
        sql: &str,
        params: &NamedValues,
        types: &NamedTypes,
    ) -> Result<u64, SqlBridgeError> {
        let mut state = self.lock();
        state.calls.push(ExecutorCall::Update {
            sql: sql.to_string(),
            params: params.clone(),
            types: types.clone(),
        });
        state.updates.pop_front().unwrap_or(Ok(0))
    }

    async fn commit(self: Box<Self>) -> Result<(), SqlBridgeError> {
        self.lock().calls.push(ExecutorCall::Commit);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), SqlBridgeError> {
        self.lock().calls.push(ExecutorCall::Rollback);
        Ok(())
    }
}

/// Build rows sharing one column header.
#[must_use]
pub fn rows_from(columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Vec<Row> {
    let header: Arc<Vec<String>> = Arc::new(columns.iter().map(ToString::to_string).collect());
    rows.into_iter()
        .map(|values| Row::new(Arc::clone(&header), values))
        .collect()
}
