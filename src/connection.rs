// Connection module - statement factory, one-shot helpers, DML builders, transactions

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;

use crate::error::{BackendErrorKind, SqlBridgeError};
use crate::executor::{MutationTransaction, QueryExecutor};
use crate::statement::Statement;
use crate::translation::{Translation, translate_placeholders};
use crate::types::{NamedValues, ParamType, SqlValue};

/// A lightweight handle over a backend: hands out [`Statement`]s, runs
/// one-shot queries and DML, and scopes multi-statement transactions.
///
/// Cloning is cheap and clones share the backend and the translation cache.
/// Statements themselves are never shared; each `prepare` returns a fresh one
/// with its own cursor.
#[derive(Clone)]
pub struct Connection {
    backend: Arc<dyn QueryExecutor>,
    translations: Arc<Mutex<HashMap<String, Translation>>>,
}

impl Connection {
    #[must_use]
    pub fn new(backend: Arc<dyn QueryExecutor>) -> Self {
        Self {
            backend,
            translations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Prepare a statement, reusing the cached translation for SQL text seen
    /// before. Only the translation is cached; bindings and cursor state are
    /// per statement.
    ///
    /// # Errors
    ///
    /// Returns `MixedParameters` if the SQL uses both `?` and named
    /// placeholders.
    pub fn prepare(&self, sql: &str) -> Result<Statement, SqlBridgeError> {
        let cached = {
            let cache = self
                .translations
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            cache.get(sql).cloned()
        };
        let translation = match cached {
            Some(translation) => translation,
            None => {
                let translation = translate_placeholders(sql)?;
                let mut cache = self
                    .translations
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                cache.insert(sql.to_string(), translation.clone());
                translation
            }
        };
        Ok(Statement::from_translation(
            Arc::clone(&self.backend),
            sql.to_string(),
            translation,
        ))
    }

    /// Prepare and execute in one call; the returned statement is ready to
    /// fetch. Placeholder-free SQL only; for parameterized statements use
    /// [`prepare`](Self::prepare) plus bind.
    ///
    /// # Errors
    ///
    /// Translation and execution errors propagate unchanged.
    pub async fn query(&self, sql: &str) -> Result<Statement, SqlBridgeError> {
        let mut statement = self.prepare(sql)?;
        statement.execute().await?;
        Ok(statement)
    }

    /// Run a parameterless data-modifying statement and report the affected
    /// count.
    ///
    /// # Errors
    ///
    /// Translation and execution errors propagate unchanged.
    pub async fn exec(&self, sql: &str) -> Result<u64, SqlBridgeError> {
        let mut statement = self.prepare(sql)?;
        statement.execute().await?;
        statement.row_count().await
    }

    /// Insert one row. Values become `@v_<column>` parameters.
    ///
    /// # Errors
    ///
    /// Execution errors propagate unchanged.
    pub async fn insert(&self, table: &str, values: &NamedValues) -> Result<u64, SqlBridgeError> {
        let columns: Vec<&str> = values.keys().map(String::as_str).collect();
        let placeholders: Vec<String> = columns.iter().map(|col| format!("@v_{col}")).collect();
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        let mut statement = self.prepare(&sql)?;
        bind_values(&mut statement, values);
        statement.execute().await?;
        statement.row_count().await
    }

    /// Update rows matching `criteria`. Values become `@v_<column>`
    /// parameters and criteria `@w_<column>`, so a column may appear in both.
    /// A null criterion compares with `IS NULL`.
    ///
    /// # Errors
    ///
    /// Returns a `BadRequest`-kind backend error when `criteria` is empty;
    /// execution errors propagate unchanged.
    pub async fn update(
        &self,
        table: &str,
        values: &NamedValues,
        criteria: &NamedValues,
    ) -> Result<u64, SqlBridgeError> {
        if criteria.is_empty() {
            return Err(SqlBridgeError::backend(
                BackendErrorKind::BadRequest,
                format!("update of {table} requires at least one criterion"),
            ));
        }
        let assignments: Vec<String> = values
            .keys()
            .map(|col| format!("{col} = @v_{col}"))
            .collect();
        let sql = format!(
            "UPDATE {table} SET {} WHERE {}",
            assignments.join(", "),
            where_clause(criteria)
        );
        let mut statement = self.prepare(&sql)?;
        bind_values(&mut statement, values);
        bind_criteria(&mut statement, criteria);
        statement.execute().await?;
        statement.row_count().await
    }

    /// Delete rows matching `criteria`; same `@w_<column>` and `IS NULL`
    /// conventions as [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Returns a `BadRequest`-kind backend error when `criteria` is empty;
    /// execution errors propagate unchanged.
    pub async fn delete(&self, table: &str, criteria: &NamedValues) -> Result<u64, SqlBridgeError> {
        if criteria.is_empty() {
            return Err(SqlBridgeError::backend(
                BackendErrorKind::BadRequest,
                format!("delete from {table} requires at least one criterion"),
            ));
        }
        let sql = format!("DELETE FROM {table} WHERE {}", where_clause(criteria));
        let mut statement = self.prepare(&sql)?;
        bind_criteria(&mut statement, criteria);
        statement.execute().await?;
        statement.row_count().await
    }

    /// Run `work` inside one mutation transaction: committed when the
    /// closure returns Ok, rolled back when it returns Err. The closure's
    /// value is handed back after the commit succeeds.
    ///
    /// # Errors
    ///
    /// The closure's error propagates after rollback; begin and commit
    /// failures propagate as backend errors.
    pub async fn transactional<T, F>(&self, work: F) -> Result<T, SqlBridgeError>
    where
        T: Send,
        F: for<'t> FnOnce(
                &'t mut Box<dyn MutationTransaction>,
            ) -> BoxFuture<'t, Result<T, SqlBridgeError>>
            + Send,
    {
        let mut tx = self.backend.begin_mutation().await?;
        match work(&mut tx).await {
            Ok(value) => {
                if let Err(err) = tx.commit().await {
                    tracing::error!("transaction commit failed: {}", err);
                    return Err(err);
                }
                Ok(value)
            }
            Err(err) => {
                tracing::error!("transaction failed, rolling back: {}", err);
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("transaction rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    /// Auto-generated key retrieval has no backend equivalent here.
    ///
    /// # Errors
    ///
    /// Always returns `Unsupported`.
    pub fn last_insert_id(&self) -> Result<i64, SqlBridgeError> {
        Err(SqlBridgeError::Unsupported(
            "the backend does not expose generated keys".into(),
        ))
    }
}

fn bind_values(statement: &mut Statement, values: &NamedValues) {
    for (column, value) in values {
        statement.bind_value(
            format!("v_{column}"),
            value.clone(),
            Some(ParamType::of(value)),
        );
    }
}

fn bind_criteria(statement: &mut Statement, criteria: &NamedValues) {
    for (column, value) in criteria {
        if value == &SqlValue::Null {
            // Rendered as IS NULL, no parameter to bind.
            continue;
        }
        statement.bind_value(
            format!("w_{column}"),
            value.clone(),
            Some(ParamType::of(value)),
        );
    }
}

fn where_clause(criteria: &NamedValues) -> String {
    let conditions: Vec<String> = criteria
        .iter()
        .map(|(col, value)| {
            if value == &SqlValue::Null {
                format!("{col} IS NULL")
            } else {
                format!("{col} = @w_{col}")
            }
        })
        .collect();
    conditions.join(" AND ")
}
