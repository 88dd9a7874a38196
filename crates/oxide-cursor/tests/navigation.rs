mod common;

use common::{add_setup, text, TestDb};
use oxide_cursor::{CursorError, CursorState, SqlValue};

fn seeded(db: &TestDb) -> oxide_cursor::Cursor<oxide_cursor::SqliteSession> {
    let mut c = db.log_setup();
    add_setup(&mut c, "b", "t1", [false, false, false]);
    add_setup(&mut c, "a", "t2", [true, false, false]);
    add_setup(&mut c, "a", "t1", [true, true, false]);
    c.clear().unwrap();
    c
}

fn key(c: &oxide_cursor::Cursor<oxide_cursor::SqliteSession>) -> (String, String) {
    (text(c, "grain_id"), text(c, "table_name"))
}

fn k(grain: &str, table: &str) -> (String, String) {
    (grain.to_string(), table.to_string())
}

#[test]
fn test_walks_compound_key_in_order() {
    let db = TestDb::new();
    let mut c = seeded(&db);

    c.first().unwrap();
    assert_eq!(key(&c), k("a", "t1"));
    c.navigate(">").unwrap();
    assert_eq!(key(&c), k("a", "t2"));
    c.navigate(">").unwrap();
    assert_eq!(key(&c), k("b", "t1"));

    assert!(!c.try_navigate(">").unwrap());
    assert_eq!(c.state(), CursorState::AfterLast);

    // The key of the last record is still the anchor.
    c.navigate("<").unwrap();
    assert_eq!(key(&c), k("a", "t2"));
}

#[test]
fn test_alphabet_never_fails_as_invalid() {
    let db = TestDb::new();
    let mut c = seeded(&db);
    for command in ["=", "<", ">", "+", "-", "=<>+-", "-+", "><", "+>>>"] {
        assert!(c.try_navigate(command).is_ok(), "{command}");
    }
}

#[test]
fn test_invalid_command_leaves_position() {
    let db = TestDb::new();
    let mut c = seeded(&db);
    c.first().unwrap();
    c.navigate(">").unwrap();
    assert_eq!(c.position().unwrap(), 2);

    for command in [">x", "a", "+ ", "*"] {
        let err = c.navigate(command).unwrap_err();
        assert!(
            matches!(err, CursorError::InvalidNavigationCommand(_)),
            "{command}: {err}"
        );
        assert_eq!(key(&c), k("a", "t2"));
        assert_eq!(c.state(), CursorState::OnRecord);
        assert_eq!(c.position().unwrap(), 2);
    }
}

#[test]
fn test_first_and_last_on_empty_filter() {
    let db = TestDb::new();
    let mut c = seeded(&db);
    c.set_filter("grain_id", "zzz").unwrap();

    assert!(matches!(c.first(), Err(CursorError::RecordNotFound)));
    assert!(matches!(c.last(), Err(CursorError::RecordNotFound)));
    assert!(!c.try_first().unwrap());
    assert!(!c.try_last().unwrap());
    assert_eq!(c.count().unwrap(), 0);
}

#[test]
fn test_empty_table() {
    let db = TestDb::new();
    let mut c = db.log_setup();
    assert!(matches!(c.first(), Err(CursorError::RecordNotFound)));
    assert_eq!(c.state(), CursorState::BeforeFirst);
    assert!(matches!(c.navigate(""), Err(CursorError::RecordNotFound)));
}

#[test]
fn test_refresh_under_filter() {
    let db = TestDb::new();
    let mut c = seeded(&db);
    c.first().unwrap();

    c.set_filter("table_name", "t2").unwrap();
    assert!(!c.try_navigate("=").unwrap());
    assert_eq!(c.state(), CursorState::Unknown);

    // A refresh miss falls through to the next primitive.
    c.navigate("=>").unwrap();
    assert_eq!(key(&c), k("a", "t2"));
    c.navigate("=").unwrap();
    assert_eq!(key(&c), k("a", "t2"));
}

#[test]
fn test_descending_order_breaks_ties_by_key() {
    let db = TestDb::new();
    let mut c = seeded(&db);
    c.order_by(&["table_name DESC"]).unwrap();

    c.first().unwrap();
    assert_eq!(key(&c), k("a", "t2"));
    c.navigate(">").unwrap();
    assert_eq!(key(&c), k("a", "t1"));
    c.navigate(">").unwrap();
    assert_eq!(key(&c), k("b", "t1"));
    // The first primitive that lands wins.
    c.navigate("<<").unwrap();
    assert_eq!(key(&c), k("a", "t1"));
    c.last().unwrap();
    assert_eq!(key(&c), k("b", "t1"));
}

#[test]
fn test_nullable_order_column() {
    let db = TestDb::new();
    let mut c = db.log_setup();
    add_setup(&mut c, "a", "t1", [true, false, false]);
    c.clear().unwrap();
    c.set_value("grain_id", "b").unwrap();
    c.set_value("table_name", "t1").unwrap();
    c.insert().unwrap();
    add_setup(&mut c, "c", "t1", [false, false, false]);

    // NULL sorts first in ascending order.
    c.order_by(&["i"]).unwrap();
    c.first().unwrap();
    assert_eq!(c.get_value("i").unwrap(), &SqlValue::Null);
    c.navigate(">").unwrap();
    assert_eq!(c.get_value("i").unwrap(), &SqlValue::Bool(false));
    c.navigate(">").unwrap();
    assert_eq!(c.get_value("i").unwrap(), &SqlValue::Bool(true));
    c.navigate("<").unwrap();
    c.navigate("<").unwrap();
    assert_eq!(key(&c), k("b", "t1"));
    assert!(!c.try_navigate("<").unwrap());
}

#[test]
fn test_get_by_compound_key_ignores_filters() {
    let db = TestDb::new();
    let mut c = seeded(&db);
    c.set_filter("grain_id", "b").unwrap();

    c.get(&[SqlValue::Text("a".into()), SqlValue::Text("t2".into())])
        .unwrap();
    assert_eq!(c.get_value("i").unwrap(), &SqlValue::Bool(true));
    assert_eq!(c.state(), CursorState::OnRecord);

    assert!(!c
        .try_get(&[SqlValue::Text("z".into()), SqlValue::Text("t2".into())])
        .unwrap());
    assert!(matches!(
        c.get(&[SqlValue::Text("a".into())]),
        Err(CursorError::KeyArity {
            expected: 2,
            found: 1
        })
    ));
}
