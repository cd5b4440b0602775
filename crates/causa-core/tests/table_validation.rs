use causa_core::{Column, Table};

#[test]
fn duplicate_names_are_rejected() {
    let err = Table::new(vec![
        Column::new("x", vec![1.0]),
        Column::new("x", vec![2.0]),
    ])
    .unwrap_err();
    assert_eq!(err.code(), "duplicate-column");
    assert!(err.is_fatal());
}

#[test]
fn non_finite_values_are_reported_with_location() {
    let table = Table::from_pairs([("a", vec![1.0, 2.0]), ("b", vec![0.5, f64::NAN])]).unwrap();
    let err = table.ensure_finite().unwrap_err();
    assert_eq!(err.code(), "non-finite-value");
    assert_eq!(err.info().context["column"], "b");
    assert_eq!(err.info().context["row"], "1");
    assert!(err.info().hint.is_some());
}

#[test]
fn with_column_appends_and_validates_length() {
    let table = Table::from_pairs([("a", vec![1.0, 2.0])]).unwrap();
    let extended = table.with_column(Column::new("w", vec![0.1, 0.2])).unwrap();
    assert_eq!(extended.names(), vec!["a", "w"]);
    assert_eq!(extended.n_cols(), 2);
    assert_eq!(table.n_cols(), 1);
    assert!(table.with_column(Column::new("z", vec![0.1])).is_err());
}

#[test]
fn require_names_the_missing_column() {
    let table = Table::from_pairs([("a", vec![1.0])]).unwrap();
    let err = table.require("outcome").unwrap_err();
    assert_eq!(err.info().context["column"], "outcome");
}
