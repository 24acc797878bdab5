use std::collections::BTreeMap;

use crate::types::{ParamType, SqlValue};

/// Key for a bind call: a 1-based positional slot or a parameter name.
///
/// Positional slots are **1-based**, matching the `@paramN` names generated
/// for `?` placeholders. Names may carry a leading `:` or `@`; it is stripped
/// so the stored key always matches the backend parameter name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BindKey {
    Position(usize),
    Name(String),
}

fn normalize_name(name: &str) -> &str {
    name.strip_prefix(':')
        .or_else(|| name.strip_prefix('@'))
        .unwrap_or(name)
}

impl From<usize> for BindKey {
    fn from(position: usize) -> Self {
        BindKey::Position(position)
    }
}

impl From<&str> for BindKey {
    fn from(name: &str) -> Self {
        BindKey::Name(normalize_name(name).to_string())
    }
}

impl From<String> for BindKey {
    fn from(name: String) -> Self {
        BindKey::from(name.as_str())
    }
}

/// Values and declared types accumulated by bind calls.
///
/// Binding never validates against the statement text; reconciliation at
/// execution time is where counts and names are checked.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub(crate) named_values: BTreeMap<String, SqlValue>,
    pub(crate) named_types: BTreeMap<String, ParamType>,
    pub(crate) positional_values: BTreeMap<usize, SqlValue>,
    pub(crate) positional_types: BTreeMap<usize, ParamType>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value (and optionally its declared type) under a key.
    /// Rebinding a key replaces the previous value.
    pub fn bind(&mut self, key: impl Into<BindKey>, value: SqlValue, ty: Option<ParamType>) {
        match key.into() {
            BindKey::Position(position) => {
                if let Some(ty) = ty {
                    self.positional_types.insert(position, ty);
                }
                self.positional_values.insert(position, value);
            }
            BindKey::Name(name) => {
                let name = normalize_name(&name).to_string();
                if let Some(ty) = ty {
                    self.named_types.insert(name.clone(), ty);
                }
                self.named_values.insert(name, value);
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named_values.is_empty() && self.positional_values.is_empty()
    }

    /// Drop every bound value and type.
    pub fn clear(&mut self) {
        self.named_values.clear();
        self.named_types.clear();
        self.positional_values.clear();
        self.positional_types.clear();
    }
}
