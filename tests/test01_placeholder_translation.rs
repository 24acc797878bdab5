use sql_bridge::prelude::*;

fn reconciled(
    sql: &str,
    bind: impl FnOnce(&mut Bindings),
    explicit: Option<&[SqlValue]>,
) -> Result<(NamedValues, NamedTypes), SqlBridgeError> {
    let translation = translate_placeholders(sql)?;
    let mut bindings = Bindings::new();
    bind(&mut bindings);
    translation.reconcile(&bindings, explicit)
}

#[test]
fn explicit_values_take_generated_names() -> Result<(), Box<dyn std::error::Error>> {
    let (values, types) = reconciled(
        "SELECT * FROM songs WHERE artist = ? AND rating > ?",
        |_| {},
        Some(&[SqlValue::Text("Nina".into()), SqlValue::Int(4)]),
    )?;
    assert_eq!(values.get("param1"), Some(&SqlValue::Text("Nina".into())));
    assert_eq!(values.get("param2"), Some(&SqlValue::Int(4)));
    assert!(types.is_empty());
    Ok(())
}

#[test]
fn count_mismatch_reports_the_original_placeholders() {
    let err = reconciled(
        "SELECT * FROM songs WHERE artist = ? AND rating > ?",
        |_| {},
        Some(&[SqlValue::Int(4)]),
    )
    .unwrap_err();
    match &err {
        SqlBridgeError::ParameterCountMismatch {
            sql,
            expected,
            actual,
        } => {
            // Generated names are rewritten back so the message shows the
            // statement as the caller wrote it.
            assert_eq!(sql, "SELECT * FROM songs WHERE artist = ? AND rating > ?");
            assert_eq!(*expected, 2);
            assert_eq!(*actual, 1);
        }
        other => panic!("expected ParameterCountMismatch, got {other:?}"),
    }
    assert!(err.to_string().contains("expects exactly 2 parameter(s)"));
    assert!(!err.to_string().contains("@param"));
}

#[test]
fn bound_positionals_are_one_based() -> Result<(), Box<dyn std::error::Error>> {
    let (values, _) = reconciled(
        "SELECT * FROM songs WHERE artist = ? AND rating > ?",
        |b| {
            b.bind(2, SqlValue::Int(4), None);
            b.bind(1, SqlValue::Text("Nina".into()), None);
        },
        None,
    )?;
    assert_eq!(values.get("param1"), Some(&SqlValue::Text("Nina".into())));
    assert_eq!(values.get("param2"), Some(&SqlValue::Int(4)));
    Ok(())
}

#[test]
fn missing_bound_slot_is_a_count_mismatch() {
    let err = reconciled(
        "SELECT * FROM songs WHERE artist = ? AND rating > ?",
        |b| b.bind(1, SqlValue::Text("Nina".into()), None),
        None,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SqlBridgeError::ParameterCountMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn empty_explicit_slice_falls_back_to_bound() -> Result<(), Box<dyn std::error::Error>> {
    let (values, _) = reconciled(
        "SELECT * FROM songs WHERE artist = ?",
        |b| b.bind(1, SqlValue::Text("Nina".into()), None),
        Some(&[]),
    )?;
    assert_eq!(values.get("param1"), Some(&SqlValue::Text("Nina".into())));
    Ok(())
}

#[test]
fn bind_then_execute_equivalence() -> Result<(), Box<dyn std::error::Error>> {
    let sql = "SELECT * FROM songs WHERE artist = ? AND rating > ?";
    let via_bindings = reconciled(
        sql,
        |b| {
            b.bind(1, SqlValue::Text("Nina".into()), None);
            b.bind(2, SqlValue::Int(4), None);
        },
        None,
    )?;
    let via_explicit = reconciled(
        sql,
        |_| {},
        Some(&[SqlValue::Text("Nina".into()), SqlValue::Int(4)]),
    )?;
    assert_eq!(via_bindings, via_explicit);
    Ok(())
}

#[test]
fn named_bindings_normalize_prefixes() -> Result<(), Box<dyn std::error::Error>> {
    let (values, types) = reconciled(
        "UPDATE songs SET title = :title WHERE id = @id",
        |b| {
            b.bind(":title", SqlValue::Text("Sinnerman".into()), None);
            b.bind("@id", SqlValue::Int(7), Some(ParamType::Int));
        },
        None,
    )?;
    assert_eq!(
        values.get("title"),
        Some(&SqlValue::Text("Sinnerman".into()))
    );
    assert_eq!(values.get("id"), Some(&SqlValue::Int(7)));
    assert_eq!(types.get("id"), Some(&BackendType::Int64));
    Ok(())
}

#[test]
fn explicit_values_on_a_named_statement_are_rejected() {
    let err = reconciled(
        "UPDATE songs SET title = :title",
        |_| {},
        Some(&[SqlValue::Text("Sinnerman".into())]),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SqlBridgeError::ParameterCountMismatch {
            expected: 0,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn stray_positional_binding_on_a_named_statement_is_rejected() {
    // Same misuse as above, arriving through bind instead of execute-time
    // values. The stray binding must surface, never silently drop.
    let err = reconciled(
        "UPDATE songs SET title = :title",
        |b| {
            b.bind(":title", SqlValue::Text("Sinnerman".into()), None);
            b.bind(1, SqlValue::Text("Sinnerman".into()), None);
        },
        None,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SqlBridgeError::ParameterCountMismatch {
            expected: 0,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn declared_positional_types_join_explicit_values_by_slot()
-> Result<(), Box<dyn std::error::Error>> {
    let (values, types) = reconciled(
        "SELECT * FROM songs WHERE rating > ?",
        |b| b.bind(1, SqlValue::Int(0), Some(ParamType::Int)),
        Some(&[SqlValue::Int(4)]),
    )?;
    // The explicit slice wins on values; the declared type still applies.
    assert_eq!(values.get("param1"), Some(&SqlValue::Int(4)));
    assert_eq!(types.get("param1"), Some(&BackendType::Int64));
    Ok(())
}

#[test]
fn mixing_positional_and_named_is_rejected() {
    let err = translate_placeholders("SELECT * FROM songs WHERE a = ? AND b = :b").unwrap_err();
    assert!(matches!(err, SqlBridgeError::MixedParameters { .. }));
    assert!(err.to_string().contains("cannot use both"));
}

#[test]
fn literals_and_comments_never_translate() -> Result<(), Box<dyn std::error::Error>> {
    let sql = "select '?', \":a\", `b?` -- :c\n/* ? /* @nested */ */ # ?\nfrom t where x = ?";
    let t = translate_placeholders(sql)?;
    assert_eq!(t.positional_count(), 1);
    assert!(t.sql().ends_with("x = @param1"));
    assert!(t.sql().starts_with("select '?', \":a\", `b?`"));
    Ok(())
}
