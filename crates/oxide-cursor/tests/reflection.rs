mod common;

use common::{log_meta, log_setup_meta, TestDb};
use oxide_cursor::{ColumnMeta, ColumnType, SchemaReflector, TableMeta};

#[test]
fn test_live_schema_in_sync() {
    let db = TestDb::new();
    let mut session = db.session();
    let mut reflector = SchemaReflector::new(&mut session);

    let pk = reflector.read_primary_key("log_setup").unwrap();
    assert_eq!(pk.name(), "pk_log_setup");
    assert_eq!(pk.column_names(), &["grain_id", "table_name"]);
    assert!(pk.reflects(&log_setup_meta()));

    for model in [log_setup_meta(), log_meta()] {
        let drift = reflector.check(&model).unwrap();
        assert!(!drift.requires_migration(), "{drift:?}");
    }
}

#[test]
fn test_swapped_key_columns_need_migration() {
    let db = TestDb::new();
    let mut session = db.session();
    let swapped = TableMeta::builder("log_setup")
        .column(ColumnMeta::new("grain_id", ColumnType::Text).not_null())
        .column(ColumnMeta::new("table_name", ColumnType::Text).not_null())
        .column(ColumnMeta::new("i", ColumnType::Boolean))
        .column(ColumnMeta::new("m", ColumnType::Boolean))
        .column(ColumnMeta::new("d", ColumnType::Boolean))
        .primary_key(&["table_name", "grain_id"])
        .build()
        .unwrap();

    let drift = SchemaReflector::new(&mut session).check(&swapped).unwrap();
    assert!(!drift.pk_in_sync);
    assert!(drift.missing_columns.is_empty());
    assert!(drift.requires_migration());
}

#[test]
fn test_renamed_constraint_needs_migration() {
    let db = TestDb::new();
    let mut session = db.session();
    session
        .execute_script(
            "DROP TABLE log_setup;
             CREATE TABLE log_setup (
                 grain_id VARCHAR(30) NOT NULL,
                 table_name VARCHAR(30) NOT NULL,
                 i BOOLEAN,
                 m BOOLEAN,
                 d BOOLEAN,
                 CONSTRAINT \"pk_setup_renamed\" PRIMARY KEY (grain_id, table_name)
             );",
        )
        .unwrap();

    let mut reflector = SchemaReflector::new(&mut session);
    let pk = reflector.read_primary_key("log_setup").unwrap();
    assert_eq!(pk.name(), "pk_setup_renamed");
    assert_eq!(pk.column_names(), &["grain_id", "table_name"]);
    assert!(!pk.reflects(&log_setup_meta()));
    assert!(reflector.check(&log_setup_meta()).unwrap().requires_migration());
}

#[test]
fn test_column_changes_are_reported() {
    let db = TestDb::new();
    let mut session = db.session();
    let model = TableMeta::builder("log")
        .column(ColumnMeta::new("entryno", ColumnType::Integer).not_null())
        .column(ColumnMeta::new("userid", ColumnType::Text).not_null())
        .column(ColumnMeta::new("sessionid", ColumnType::Text))
        .primary_key(&["entryno"])
        .build()
        .unwrap();

    let drift = SchemaReflector::new(&mut session).check(&model).unwrap();
    assert!(drift.pk_in_sync);
    assert_eq!(drift.missing_columns, vec!["sessionid".to_string()]);
    assert_eq!(drift.mismatched_columns, vec!["userid".to_string()]);
    assert!(drift.columns_in_order);
}

#[test]
fn test_reordered_columns_are_reported() {
    let db = TestDb::new();
    let mut session = db.session();
    let model = TableMeta::builder("log")
        .column(ColumnMeta::new("entryno", ColumnType::Integer).not_null())
        .column(ColumnMeta::new("table_name", ColumnType::Text))
        .column(ColumnMeta::new("userid", ColumnType::Text))
        .primary_key(&["entryno"])
        .build()
        .unwrap();

    let drift = SchemaReflector::new(&mut session).check(&model).unwrap();
    assert!(!drift.columns_in_order);
    assert!(drift.requires_migration());
}

#[test]
fn test_missing_table() {
    let db = TestDb::new();
    let mut session = db.session();
    let mut reflector = SchemaReflector::new(&mut session);

    let pk = reflector.read_primary_key("nowhere").unwrap();
    assert!(pk.is_empty());
    assert_eq!(pk.name(), "");

    let model = TableMeta::builder("nowhere")
        .column(ColumnMeta::new("id", ColumnType::Integer))
        .primary_key(&["id"])
        .build()
        .unwrap();
    let drift = reflector.check(&model).unwrap();
    assert!(!drift.pk_in_sync);
    assert_eq!(drift.missing_columns, vec!["id".to_string()]);
}
