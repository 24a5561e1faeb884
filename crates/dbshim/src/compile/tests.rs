use super::*;
use crate::testing::StubConnection;

fn and(column: &str, op: &str, value: impl Into<Value>) -> Condition {
    Condition::predicate(Logic::And, column, op, value)
}

fn or(column: &str, op: &str, value: impl Into<Value>) -> Condition {
    Condition::predicate(Logic::Or, column, op, value)
}

#[test]
fn first_predicate_has_no_logic_keyword() {
    let conn = StubConnection::new();
    let sql = compile_conditions(&conn, &[or("age", ">", 18), and("active", "=", true)]).unwrap();
    assert_eq!(sql, r#""age" > 18 AND "active" = TRUE"#);
}

#[test]
fn group_renders_without_keyword_after_open() {
    let conn = StubConnection::new();
    let sql = compile_conditions(
        &conn,
        &[
            Condition::Open(Logic::And),
            and("a", "=", 1),
            or("b", "=", 2),
            Condition::Close,
        ],
    )
    .unwrap();
    assert_eq!(sql, r#"("a" = 1 OR "b" = 2)"#);
}

#[test]
fn nested_groups_keep_their_logic() {
    let conn = StubConnection::new();
    let sql = compile_conditions(
        &conn,
        &[
            and("status", "=", "active"),
            Condition::Open(Logic::Or),
            and("role", "=", "admin"),
            Condition::Open(Logic::And),
            and("a", "<", 1),
            or("b", ">", 2),
            Condition::Close,
            Condition::Close,
        ],
    )
    .unwrap();
    assert_eq!(
        sql,
        r#""status" = 'active' OR ("role" = 'admin' AND ("a" < 1 OR "b" > 2))"#
    );
}

#[test]
fn empty_list_compiles_to_nothing() {
    let conn = StubConnection::new();
    assert_eq!(compile_conditions(&conn, &[]).unwrap(), "");
}

#[test]
fn unbalanced_groups_are_rejected() {
    let conn = StubConnection::new();
    let err = compile_conditions(&conn, &[Condition::Open(Logic::And), and("a", "=", 1)])
        .unwrap_err();
    assert!(matches!(err, crate::DbError::Validation(_)));
}

#[test]
fn null_comparisons_use_is() {
    let conn = StubConnection::new();
    let sql = compile_conditions(
        &conn,
        &[
            and("deleted_at", "=", Value::Null),
            and("email", "!=", None::<String>),
            and("phone", "<>", Value::Null),
        ],
    )
    .unwrap();
    assert_eq!(
        sql,
        r#""deleted_at" IS NULL AND "email" IS NOT NULL AND "phone" IS NOT NULL"#
    );
}

#[test]
fn operators_are_normalized() {
    let conn = StubConnection::new();
    let sql = compile_conditions(&conn, &[and("name", " like ", "J%")]).unwrap();
    assert_eq!(sql, r#""name" LIKE 'J%'"#);
}

#[test]
fn between_and_in_lists() {
    let conn = StubConnection::new();
    let sql = compile_conditions(
        &conn,
        &[
            and("age", "between", vec![18, 65]),
            and("id", "IN", vec![1, 2, 3]),
            and("name", "not in", vec!["a", "b"]),
            and("team", "IN", Value::expr("(SELECT id FROM teams)")),
        ],
    )
    .unwrap();
    assert_eq!(
        sql,
        r#""age" BETWEEN 18 AND 65 AND "id" IN (1, 2, 3) AND "name" NOT IN ('a', 'b') AND "team" IN (SELECT id FROM teams)"#
    );
}

#[test]
fn between_needs_two_bounds() {
    let conn = StubConnection::new();
    for value in [Value::from(vec![1, 2, 3]), Value::from(vec![1]), Value::from(5)] {
        let err = compile_conditions(&conn, &[and("a", "not between", value)]).unwrap_err();
        assert!(matches!(err, crate::DbError::Validation(_)), "{err}");
    }
}

#[test]
fn empty_group_is_rejected() {
    let conn = StubConnection::new();
    let err = compile_conditions(
        &conn,
        &[
            Condition::Open(Logic::And),
            Condition::Close,
            or("a", "=", 1),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, crate::DbError::Validation(_)));
}

#[test]
fn values_are_escaped() {
    let conn = StubConnection::new();
    let sql = compile_conditions(&conn, &[and("name", "=", "O'Brien")]).unwrap();
    assert_eq!(sql, r#""name" = 'O''Brien'"#);
}

#[test]
fn join_with_one_pair_is_unwrapped() {
    let conn = StubConnection::new();
    let mut join = JoinSpec::new("t2", None);
    join.on("t1.a", "t2.a");
    assert_eq!(
        compile_join(&conn, &[join]).unwrap(),
        r#"JOIN "t2" ON "t1"."a" = "t2"."a""#
    );
}

#[test]
fn join_with_several_pairs_is_grouped() {
    let conn = StubConnection::new();
    let mut join = JoinSpec::new("t2", None);
    join.on("t1.a", "t2.a").on("t1.b", "t2.b");
    assert_eq!(
        compile_join(&conn, &[join]).unwrap(),
        r#"JOIN "t2" ON ("t1"."a" = "t2"."a" AND "t1"."b" = "t2"."b")"#
    );
}

#[test]
fn join_types_and_using() {
    let conn = StubConnection::new();
    let mut left = JoinSpec::new(("roles", "r"), Some("left"));
    left.on("u.role_id", "r.id");
    let mut using = JoinSpec::new("profiles", Some("INNER"));
    using.using(["user_id"]);
    assert_eq!(
        compile_join(&conn, &[left, using]).unwrap(),
        r#"LEFT JOIN "roles" AS "r" ON "u"."role_id" = "r"."id" INNER JOIN "profiles" USING ("user_id")"#
    );
}

#[test]
fn order_by_directions() {
    let conn = StubConnection::new();
    let pairs = vec![
        (Ident::from("name"), Some("asc".to_string())),
        (Ident::from("id"), None),
    ];
    assert_eq!(
        compile_order_by(&conn, &pairs).unwrap(),
        r#"ORDER BY "name" ASC, "id""#
    );
    assert_eq!(compile_order_by(&conn, &[]).unwrap(), "");
}

#[test]
fn group_by_and_set() {
    let conn = StubConnection::new();
    assert_eq!(
        compile_group_by(&conn, &["dept".into(), "u.role".into()]).unwrap(),
        r#"GROUP BY "dept", "u"."role""#
    );
    assert_eq!(compile_group_by(&conn, &[]).unwrap(), "");

    let set = vec![
        (Ident::from("name"), Value::from("x")),
        (Ident::from("updated_at"), Value::expr("NOW()")),
    ];
    assert_eq!(
        compile_set(&conn, &set).unwrap(),
        r#""name" = 'x', "updated_at" = NOW()"#
    );
}

#[test]
fn compile_is_deterministic() {
    let conn = StubConnection::new();
    let list = [and("a", "=", 1), or("b", "=", "two")];
    assert_eq!(
        compile_conditions(&conn, &list).unwrap(),
        compile_conditions(&conn, &list).unwrap()
    );
}
