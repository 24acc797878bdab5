use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SqlBridgeError;
use crate::types::{BackendType, NamedTypes, NamedValues, SqlValue};

mod bindings;
mod scanner;

pub use bindings::{BindKey, Bindings};

use scanner::{
    State, is_block_comment_end, is_block_comment_start, is_ident_start, is_line_comment_start,
    scan_ident,
};

/// Which placeholder syntax a statement uses. A single statement may use
/// exactly one of these; mixing is rejected at translation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSyntax {
    /// No placeholders at all.
    None,
    /// `:name` or `@name` placeholders.
    Named,
    /// `?` placeholders.
    Positional,
}

/// Outcome of rewriting one statement's placeholders into backend named
/// parameters. Built once per distinct SQL text and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    sql: String,
    positional_count: usize,
    syntax: ParameterSyntax,
}

impl Translation {
    /// The rewritten statement text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of `?` slots found outside literals and comments.
    #[must_use]
    pub fn positional_count(&self) -> usize {
        self.positional_count
    }

    #[must_use]
    pub fn syntax(&self) -> ParameterSyntax {
        self.syntax
    }

    /// Reconcile bound and explicit values into the named map the backend
    /// expects.
    ///
    /// A non-empty `explicit` slice replaces the bound positional values
    /// wholesale (declared positional types still join by slot). Otherwise
    /// positional statements draw from 1-based positional bindings, and a
    /// statement without `?` slots passes its named bindings through
    /// unchanged, provided no positional value was bound to it.
    ///
    /// # Errors
    ///
    /// Returns `ParameterCountMismatch` when the positional source does not
    /// supply exactly one value per `?` slot. The error carries the statement
    /// with generated names rewritten back to `?`.
    pub fn reconcile(
        &self,
        bindings: &Bindings,
        explicit: Option<&[SqlValue]>,
    ) -> Result<(NamedValues, NamedTypes), SqlBridgeError> {
        if let Some(values) = explicit.filter(|values| !values.is_empty()) {
            return self.positional_from_slice(values, bindings);
        }
        if self.positional_count == 0 && bindings.positional_values.is_empty() {
            return Ok(Self::named_passthrough(bindings));
        }
        self.positional_from_bindings(bindings)
    }

    fn named_passthrough(bindings: &Bindings) -> (NamedValues, NamedTypes) {
        let values = bindings.named_values.clone();
        let types = bindings
            .named_types
            .iter()
            .map(|(name, &ty)| (name.clone(), BackendType::from(ty)))
            .collect();
        (values, types)
    }

    fn positional_from_slice(
        &self,
        values: &[SqlValue],
        bindings: &Bindings,
    ) -> Result<(NamedValues, NamedTypes), SqlBridgeError> {
        if values.len() != self.positional_count {
            return Err(self.count_mismatch(values.len()));
        }
        let mut named = NamedValues::new();
        let mut types = NamedTypes::new();
        for (slot, value) in values.iter().enumerate() {
            let name = format!("param{}", slot + 1);
            if let Some(&ty) = bindings.positional_types.get(&(slot + 1)) {
                types.insert(name.clone(), BackendType::from(ty));
            }
            named.insert(name, value.clone());
        }
        Ok((named, types))
    }

    fn positional_from_bindings(
        &self,
        bindings: &Bindings,
    ) -> Result<(NamedValues, NamedTypes), SqlBridgeError> {
        let supplied = bindings.positional_values.len();
        if supplied != self.positional_count {
            return Err(self.count_mismatch(supplied));
        }
        let mut named = NamedValues::new();
        let mut types = NamedTypes::new();
        for slot in 1..=self.positional_count {
            let value = bindings
                .positional_values
                .get(&slot)
                .ok_or_else(|| self.count_mismatch(supplied))?;
            let name = format!("param{slot}");
            if let Some(&ty) = bindings.positional_types.get(&slot) {
                types.insert(name.clone(), BackendType::from(ty));
            }
            named.insert(name, value.clone());
        }
        Ok((named, types))
    }

    fn count_mismatch(&self, actual: usize) -> SqlBridgeError {
        SqlBridgeError::ParameterCountMismatch {
            sql: detranslate(&self.sql).into_owned(),
            expected: self.positional_count,
            actual,
        }
    }
}

/// Rewrite classic placeholders into backend named parameters.
///
/// `?` becomes `@paramN` (1-based), `:name` becomes `@name`, and `@name`
/// passes through untouched. The scan is lexical: placeholder-like characters
/// inside string literals, backtick-quoted identifiers, `--`/`#` line
/// comments, and nested `/* */` block comments are never rewritten. SQL
/// containing none of `:`, `@`, `?` skips the scan entirely.
///
/// ```rust
/// use sql_bridge::translation::translate_placeholders;
///
/// let t = translate_placeholders("SELECT * FROM albums WHERE id = ? AND title = ?")?;
/// assert_eq!(t.sql(), "SELECT * FROM albums WHERE id = @param1 AND title = @param2");
/// assert_eq!(t.positional_count(), 2);
/// # Ok::<(), sql_bridge::SqlBridgeError>(())
/// ```
///
/// # Errors
///
/// Returns `MixedParameters` when a statement uses both `?` and named
/// placeholders outside literals and comments.
pub fn translate_placeholders(sql: &str) -> Result<Translation, SqlBridgeError> {
    if sql.trim().is_empty() || !sql.contains([':', '?', '@']) {
        return Ok(Translation {
            sql: sql.to_string(),
            positional_count: 0,
            syntax: ParameterSyntax::None,
        });
    }

    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    // Input is copied into `out` up to this index; spans between replacements
    // are flushed whole so multibyte text survives untouched.
    let mut flushed = 0usize;
    let mut state = State::Normal;
    let mut idx = 0usize;
    let mut positional_count = 0usize;
    let mut has_named = false;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'`' => state = State::BacktickQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'?' => {
                    positional_count += 1;
                    let buf = out.get_or_insert_with(String::new);
                    buf.push_str(&sql[flushed..idx]);
                    buf.push_str(&format!("@param{positional_count}"));
                    flushed = idx + 1;
                }
                // A `::` cast, not a parameter.
                b':' if bytes.get(idx + 1) == Some(&b':') => idx += 1,
                b':' if is_ident_start(bytes, idx + 1) => {
                    has_named = true;
                    let end = scan_ident(bytes, idx + 1);
                    let buf = out.get_or_insert_with(String::new);
                    buf.push_str(&sql[flushed..idx]);
                    buf.push('@');
                    buf.push_str(&sql[idx + 1..end]);
                    flushed = end;
                    idx = end - 1;
                }
                b'@' if is_ident_start(bytes, idx + 1) => {
                    has_named = true;
                    idx = scan_ident(bytes, idx + 1) - 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\\' {
                    idx += 1;
                } else if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'\\' {
                    idx += 1;
                } else if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::BacktickQuoted => {
                if b == b'`' {
                    if bytes.get(idx + 1) == Some(&b'`') {
                        idx += 1; // skip escaped backtick
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    if positional_count > 0 && has_named {
        return Err(SqlBridgeError::MixedParameters {
            sql: sql.to_string(),
        });
    }

    let translated = match out {
        Some(mut buf) => {
            buf.push_str(&sql[flushed..]);
            buf
        }
        None => sql.to_string(),
    };
    let syntax = if positional_count > 0 {
        ParameterSyntax::Positional
    } else if has_named {
        ParameterSyntax::Named
    } else {
        ParameterSyntax::None
    };

    Ok(Translation {
        sql: translated,
        positional_count,
        syntax,
    })
}

static GENERATED_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@param[0-9]+").expect("static pattern compiles"));

/// Rewrite generated `@paramN` names back to `?` for error messages.
pub(crate) fn detranslate(sql: &str) -> Cow<'_, str> {
    GENERATED_PARAM.replace_all(sql, "?")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_positional_placeholders() {
        let t = translate_placeholders("SELECT * FROM t WHERE a = ? AND b = ?").unwrap();
        assert_eq!(t.sql(), "SELECT * FROM t WHERE a = @param1 AND b = @param2");
        assert_eq!(t.positional_count(), 2);
        assert_eq!(t.syntax(), ParameterSyntax::Positional);
    }

    #[test]
    fn rewrites_named_and_passes_native_through() {
        let t = translate_placeholders("UPDATE t SET a = :model WHERE b = @model").unwrap();
        assert_eq!(t.sql(), "UPDATE t SET a = @model WHERE b = @model");
        assert_eq!(t.positional_count(), 0);
        assert_eq!(t.syntax(), ParameterSyntax::Named);
    }

    #[test]
    fn placeholder_free_sql_is_unchanged() {
        let sql = "SELECT 1 FROM t";
        let t = translate_placeholders(sql).unwrap();
        assert_eq!(t.sql(), sql);
        assert_eq!(t.syntax(), ParameterSyntax::None);

        let t = translate_placeholders("   ").unwrap();
        assert_eq!(t.sql(), "   ");
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select '?', \":x\" -- :y\n/* ? */ from t where a = ?";
        let t = translate_placeholders(sql).unwrap();
        assert_eq!(
            t.sql(),
            "select '?', \":x\" -- :y\n/* ? */ from t where a = @param1"
        );
        assert_eq!(t.positional_count(), 1);
    }

    #[test]
    fn skips_backtick_identifiers_and_hash_comments() {
        let sql = "select `odd?col` from t # trailing ?\nwhere a = ?";
        let t = translate_placeholders(sql).unwrap();
        assert_eq!(
            t.sql(),
            "select `odd?col` from t # trailing ?\nwhere a = @param1"
        );
    }

    #[test]
    fn honors_quote_escapes() {
        let t = translate_placeholders("select 'it''s ?' , ? from t").unwrap();
        assert_eq!(t.sql(), "select 'it''s ?' , @param1 from t");

        let t = translate_placeholders("select 'it\\'s ?' , ? from t").unwrap();
        assert_eq!(t.sql(), "select 'it\\'s ?' , @param1 from t");
    }

    #[test]
    fn block_comments_nest() {
        let sql = "/* outer /* ? */ still */ select ?";
        let t = translate_placeholders(sql).unwrap();
        assert_eq!(t.sql(), "/* outer /* ? */ still */ select @param1");
        assert_eq!(t.positional_count(), 1);
    }

    #[test]
    fn double_colon_cast_is_not_a_parameter() {
        let t = translate_placeholders("select a::text from t where b = ?").unwrap();
        assert_eq!(t.sql(), "select a::text from t where b = @param1");
        assert_eq!(t.syntax(), ParameterSyntax::Positional);
    }

    #[test]
    fn mixing_syntaxes_is_rejected() {
        let sql = "SELECT * FROM t WHERE a = ? AND b = :b";
        let err = translate_placeholders(sql).unwrap_err();
        match err {
            SqlBridgeError::MixedParameters { sql: reported } => assert_eq!(reported, sql),
            other => panic!("expected MixedParameters, got {other:?}"),
        }
    }

    #[test]
    fn translation_is_deterministic() {
        let sql = "SELECT * FROM t WHERE a = ? AND b = ?";
        let first = translate_placeholders(sql).unwrap();
        let second = translate_placeholders(sql).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn detranslate_restores_question_marks() {
        assert_eq!(
            detranslate("SELECT * FROM t WHERE a = @param1 AND b = @param12"),
            "SELECT * FROM t WHERE a = ? AND b = ?"
        );
        // Caller-named parameters are left alone.
        assert_eq!(detranslate("WHERE a = @model"), "WHERE a = @model");
    }
}
