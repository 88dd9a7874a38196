#![allow(dead_code)]

use oxide_cursor::{
    ColumnMeta, ColumnType, Cursor, SessionConfig, SqlValue, SqliteSession, TableMeta,
};
use tempfile::TempDir;

pub const SCHEMA: &str = "
    CREATE TABLE log_setup (
        grain_id VARCHAR(30) NOT NULL,
        table_name VARCHAR(30) NOT NULL,
        i BOOLEAN,
        m BOOLEAN,
        d BOOLEAN,
        CONSTRAINT pk_log_setup PRIMARY KEY (grain_id, table_name)
    );
    CREATE TABLE log (
        entryno INTEGER NOT NULL CONSTRAINT pk_log PRIMARY KEY AUTOINCREMENT,
        userid VARCHAR(250),
        table_name VARCHAR(30),
        action_type VARCHAR(1),
        weight REAL
    );
";

/// A database file shared by every session opened from it.
pub struct TestDb {
    dir: TempDir,
    url: String,
}

impl TestDb {
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let url = format!("sqlite://{}", dir.path().join("cursor.db").display());
        let db = Self { dir, url };
        db.session()
            .execute_script(SCHEMA)
            .expect("Failed to create schema");
        db
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn session(&self) -> SqliteSession {
        SqliteSession::open(&SessionConfig::new(&self.url))
            .unwrap_or_else(|e| panic!("Failed to open {}: {e}", self.url))
    }

    pub fn log_setup(&self) -> Cursor<SqliteSession> {
        Cursor::new(self.session(), log_setup_meta()).expect("Failed to open cursor")
    }

    pub fn log(&self) -> Cursor<SqliteSession> {
        Cursor::new(self.session(), log_meta()).expect("Failed to open cursor")
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn log_setup_meta() -> TableMeta {
    TableMeta::builder("log_setup")
        .column(ColumnMeta::new("grain_id", ColumnType::Text).not_null())
        .column(ColumnMeta::new("table_name", ColumnType::Text).not_null())
        .column(ColumnMeta::new("i", ColumnType::Boolean))
        .column(ColumnMeta::new("m", ColumnType::Boolean))
        .column(ColumnMeta::new("d", ColumnType::Boolean))
        .primary_key(&["grain_id", "table_name"])
        .build()
        .expect("valid model")
}

pub fn log_meta() -> TableMeta {
    TableMeta::builder("log")
        .column(
            ColumnMeta::new("entryno", ColumnType::Integer)
                .not_null()
                .auto_increment(),
        )
        .column(ColumnMeta::new("userid", ColumnType::Text))
        .column(ColumnMeta::new("table_name", ColumnType::Text))
        .column(ColumnMeta::new("action_type", ColumnType::Text))
        .column(ColumnMeta::new("weight", ColumnType::Real))
        .primary_key(&["entryno"])
        .build()
        .expect("valid model")
}

pub fn add_setup(cursor: &mut Cursor<SqliteSession>, grain: &str, table: &str, flags: [bool; 3]) {
    cursor.clear().unwrap();
    cursor.set_value("grain_id", grain).unwrap();
    cursor.set_value("table_name", table).unwrap();
    cursor.set_value("i", flags[0]).unwrap();
    cursor.set_value("m", flags[1]).unwrap();
    cursor.set_value("d", flags[2]).unwrap();
    cursor.insert().unwrap();
}

pub fn add_log(cursor: &mut Cursor<SqliteSession>, userid: &str, action: &str) -> i64 {
    cursor.clear().unwrap();
    cursor.set_value("userid", userid).unwrap();
    cursor.set_value("table_name", "log_setup").unwrap();
    cursor.set_value("action_type", action).unwrap();
    cursor.insert().unwrap();
    match cursor.get_value("entryno").unwrap() {
        SqlValue::Int(n) => *n,
        other => panic!("Expected generated entryno, got {other:?}"),
    }
}

pub fn text(cursor: &Cursor<SqliteSession>, column: &str) -> String {
    match cursor.get_value(column).unwrap() {
        SqlValue::Text(s) => s.clone(),
        other => panic!("Expected text in {column}, got {other:?}"),
    }
}
