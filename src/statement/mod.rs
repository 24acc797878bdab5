// Statement module - lifecycle, read/mutation dispatch, cursor emulation

use std::sync::Arc;

use futures_util::TryStreamExt;

use crate::error::SqlBridgeError;
use crate::executor::{QueryExecutor, RowStream};
use crate::results::{FetchShape, Row, ShapedRow};
use crate::translation::{BindKey, Bindings, Translation, translate_placeholders};
use crate::types::{ParamType, SqlValue};

mod cursor;

pub use cursor::CursorOrientation;

use cursor::resolve_offset;

/// How a statement executes: mutations run inside a transaction and report
/// an affected-row count, reads run as direct streaming queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Mutation,
}

impl StatementKind {
    /// Classify by the leading keyword (case-insensitive, leading whitespace
    /// trimmed): INSERT, UPDATE, DELETE mutate, everything else reads. Only
    /// the statement text is inspected, never the parameters.
    #[must_use]
    pub fn classify(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or("");
        if keyword.eq_ignore_ascii_case("insert")
            || keyword.eq_ignore_ascii_case("update")
            || keyword.eq_ignore_ascii_case("delete")
        {
            StatementKind::Mutation
        } else {
            StatementKind::Read
        }
    }
}

/// Cursor state of one statement. `Buffered` is entered lazily the first
/// time a fetch needs random access and holds until re-execution.
enum CursorState {
    /// No read result attached: never executed, or executed as a mutation.
    Detached,
    /// Executed; rows still waiting in the backend stream.
    Streaming(RowStream),
    /// Fully materialized. `offset` is the cursor position, -1 = parked
    /// before the first row.
    Buffered { rows: Vec<Row>, offset: i64 },
}

/// A prepared statement: translated once at construction, bound zero or more
/// times, executed, then fetched through an emulated scrollable cursor.
///
/// A `Statement` owns its cursor state and bound values outright; it is not
/// meant to be shared between concurrent callers. Re-executing resets the
/// cursor, never the bindings.
pub struct Statement {
    backend: Arc<dyn QueryExecutor>,
    raw_sql: String,
    translation: Translation,
    kind: StatementKind,
    bindings: Bindings,
    state: CursorState,
    affected_rows: u64,
    fetch_shape: FetchShape,
}

impl Statement {
    /// Translate and classify a statement. Fails fast with no partial state.
    ///
    /// # Errors
    ///
    /// Returns `MixedParameters` if the SQL uses both `?` and named
    /// placeholders.
    pub fn new(
        backend: Arc<dyn QueryExecutor>,
        sql: impl Into<String>,
    ) -> Result<Self, SqlBridgeError> {
        let raw_sql = sql.into();
        let translation = translate_placeholders(&raw_sql)?;
        Ok(Self::from_translation(backend, raw_sql, translation))
    }

    pub(crate) fn from_translation(
        backend: Arc<dyn QueryExecutor>,
        raw_sql: String,
        translation: Translation,
    ) -> Self {
        let kind = StatementKind::classify(translation.sql());
        Self {
            backend,
            raw_sql,
            translation,
            kind,
            bindings: Bindings::new(),
            state: CursorState::Detached,
            affected_rows: 0,
            fetch_shape: FetchShape::Associative,
        }
    }

    /// The SQL text as the caller supplied it.
    #[must_use]
    pub fn raw_sql(&self) -> &str {
        &self.raw_sql
    }

    /// The SQL text after placeholder rewriting.
    #[must_use]
    pub fn translated_sql(&self) -> &str {
        self.translation.sql()
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    #[must_use]
    pub fn fetch_shape(&self) -> FetchShape {
        self.fetch_shape
    }

    /// Set the default shape for fetches without an explicit one. `Record`
    /// decays to `Associative` here; pass it per fetch to get full rows.
    pub fn set_fetch_shape(&mut self, shape: FetchShape) {
        self.fetch_shape = shape.normalize_default();
    }

    /// Store a value (and optionally a declared type) for later execution.
    ///
    /// Accepts 1-based positions and `:`/`@`-prefixed or bare names; see
    /// [`BindKey`]. Nothing is validated here: bind calls may come in any
    /// order, and the backend names are only fixed by translation, so all
    /// checking happens at execution.
    pub fn bind_value(&mut self, key: impl Into<BindKey>, value: SqlValue, ty: Option<ParamType>) {
        self.bindings.bind(key, value, ty);
    }

    /// Execute with the values accumulated by [`bind_value`](Self::bind_value).
    ///
    /// # Errors
    ///
    /// Returns `ParameterCountMismatch` if bound values do not cover the
    /// statement's `?` slots, or `Backend` errors from dispatch.
    pub async fn execute(&mut self) -> Result<(), SqlBridgeError> {
        self.run(None).await
    }

    /// Execute with explicit positional values, overriding any bound ones.
    ///
    /// # Errors
    ///
    /// Returns `ParameterCountMismatch` if the slice does not supply exactly
    /// one value per `?` slot, or `Backend` errors from dispatch.
    pub async fn execute_with(&mut self, params: &[SqlValue]) -> Result<(), SqlBridgeError> {
        self.run(Some(params)).await
    }

    async fn run(&mut self, explicit: Option<&[SqlValue]>) -> Result<(), SqlBridgeError> {
        let (values, types) = match self.translation.reconcile(&self.bindings, explicit) {
            Ok(reconciled) => reconciled,
            Err(err) => {
                tracing::error!(
                    "parameter reconciliation failed for {:?}: {}",
                    self.raw_sql,
                    err
                );
                return Err(err);
            }
        };

        // Any prior result is gone the moment we dispatch again.
        self.state = CursorState::Detached;

        match self.kind {
            StatementKind::Read => {
                let stream = self
                    .backend
                    .execute_read(self.translation.sql(), &values)
                    .await?;
                self.state = CursorState::Streaming(stream);
                Ok(())
            }
            StatementKind::Mutation => {
                let mut tx = self.backend.begin_mutation().await?;
                let affected = match tx
                    .execute_update(self.translation.sql(), &values, &types)
                    .await
                {
                    Ok(count) => count,
                    Err(err) => {
                        tracing::error!(
                            "mutation failed for {:?}, rolling back: {}",
                            self.raw_sql,
                            err
                        );
                        if let Err(rollback_err) = tx.rollback().await {
                            tracing::error!(
                                "rollback failed for {:?}: {}",
                                self.raw_sql,
                                rollback_err
                            );
                        }
                        return Err(err);
                    }
                };
                if let Err(err) = tx.commit().await {
                    tracing::error!("commit failed for {:?}: {}", self.raw_sql, err);
                    return Err(err);
                }
                // Only a committed count is ever reported.
                self.affected_rows = affected;
                Ok(())
            }
        }
    }

    /// Rows this statement touched or returned.
    ///
    /// Mutations report the committed affected count without further backend
    /// I/O. Reads materialize the stream (once) and report the buffered
    /// length. A statement with no result reports 0.
    ///
    /// # Errors
    ///
    /// Returns `Backend` errors surfaced while draining the row stream.
    pub async fn row_count(&mut self) -> Result<u64, SqlBridgeError> {
        match self.kind {
            StatementKind::Mutation => Ok(self.affected_rows),
            StatementKind::Read => {
                if matches!(self.state, CursorState::Detached) {
                    return Ok(0);
                }
                self.materialize().await?;
                match &self.state {
                    CursorState::Buffered { rows, .. } => Ok(rows.len() as u64),
                    _ => Ok(0),
                }
            }
        }
    }

    /// Fetch the next row in the statement's default shape.
    ///
    /// # Errors
    ///
    /// Returns `Backend` errors surfaced while draining the row stream.
    pub async fn fetch(&mut self) -> Result<Option<ShapedRow>, SqlBridgeError> {
        self.fetch_with(None, CursorOrientation::Next).await
    }

    /// Scrollable-cursor fetch over a backend that only streams forward.
    ///
    /// The first fetch after execution drains the stream into a buffer with
    /// the cursor parked before the first row; every fetch then resolves
    /// `orientation` against the buffer. `Ok(None)` is the end-of-set
    /// sentinel and also what a statement with no attached result returns;
    /// neither is an error. After end-of-set the cursor is parked before the
    /// first row again, so a following `Next` starts over at row 0.
    ///
    /// # Errors
    ///
    /// Returns `Backend` errors surfaced while draining the row stream.
    pub async fn fetch_with(
        &mut self,
        shape: Option<FetchShape>,
        orientation: CursorOrientation,
    ) -> Result<Option<ShapedRow>, SqlBridgeError> {
        if matches!(self.state, CursorState::Detached) {
            return Ok(None);
        }
        self.materialize().await?;
        let shape = shape.unwrap_or(self.fetch_shape);
        let CursorState::Buffered { rows, offset } = &mut self.state else {
            return Ok(None);
        };
        let last = rows.len() as i64 - 1;
        let landed = resolve_offset(orientation, *offset, last);
        *offset = landed;
        if landed < 0 {
            return Ok(None);
        }
        Ok(rows
            .get(landed as usize)
            .map(|row| ShapedRow::from_row(row, shape)))
    }

    /// Fetch every row in the statement's default shape.
    ///
    /// # Errors
    ///
    /// Returns `Backend` errors surfaced while draining the row stream.
    pub async fn fetch_all(&mut self) -> Result<Option<Vec<ShapedRow>>, SqlBridgeError> {
        self.fetch_all_with(None).await
    }

    /// Fetch every row at once.
    ///
    /// The first call drains the stream; later calls reshape the cached
    /// buffer with no further backend I/O. The cursor offset is not moved.
    /// `Ok(None)` means no read result is attached: "never executed a read"
    /// and "executed and got zero rows" are distinct outcomes, and the
    /// latter is `Ok(Some(vec![]))`.
    ///
    /// # Errors
    ///
    /// Returns `Backend` errors surfaced while draining the row stream.
    pub async fn fetch_all_with(
        &mut self,
        shape: Option<FetchShape>,
    ) -> Result<Option<Vec<ShapedRow>>, SqlBridgeError> {
        if matches!(self.state, CursorState::Detached) {
            return Ok(None);
        }
        self.materialize().await?;
        let shape = shape.unwrap_or(self.fetch_shape);
        match &self.state {
            CursorState::Buffered { rows, .. } => Ok(Some(
                rows.iter()
                    .map(|row| ShapedRow::from_row(row, shape))
                    .collect(),
            )),
            _ => Ok(None),
        }
    }

    /// Value at `index` of the next row, via a zero-indexed `Next` fetch.
    /// `Ok(None)` at end-of-set or when the column index is out of range.
    ///
    /// # Errors
    ///
    /// Returns `Backend` errors surfaced while draining the row stream.
    pub async fn fetch_column(&mut self, index: usize) -> Result<Option<SqlValue>, SqlBridgeError> {
        let row = self
            .fetch_with(Some(FetchShape::Indexed), CursorOrientation::Next)
            .await?;
        Ok(row.and_then(|row| row.get_by_index(index).cloned()))
    }

    /// Buffered rows for straight iteration, materializing on first use.
    /// `Ok(None)` when no read result is attached.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` for mutation statements, or `Backend` errors
    /// surfaced while draining the row stream.
    pub async fn rows(&mut self) -> Result<Option<&[Row]>, SqlBridgeError> {
        if self.kind == StatementKind::Mutation {
            return Err(SqlBridgeError::Unsupported(
                "row iteration requires a read statement".into(),
            ));
        }
        if matches!(self.state, CursorState::Detached) {
            return Ok(None);
        }
        self.materialize().await?;
        match &self.state {
            CursorState::Buffered { rows, .. } => Ok(Some(rows.as_slice())),
            _ => Ok(None),
        }
    }

    /// Drain the backend stream into the cursor buffer. Idempotent; only the
    /// first call after execution performs I/O.
    async fn materialize(&mut self) -> Result<(), SqlBridgeError> {
        if !matches!(self.state, CursorState::Streaming(_)) {
            return Ok(());
        }
        // A drain error leaves the statement with no usable result.
        let state = std::mem::replace(&mut self.state, CursorState::Detached);
        let CursorState::Streaming(mut stream) = state else {
            return Ok(());
        };
        let mut rows = Vec::new();
        while let Some(row) = stream.try_next().await? {
            rows.push(row);
        }
        self.state = CursorState::Buffered { rows, offset: -1 };
        Ok(())
    }
}
