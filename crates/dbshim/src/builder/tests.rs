use super::*;
use crate::DbError;
use crate::testing::StubConnection;

#[test]
fn test_simple_select() {
    let conn = StubConnection::new();
    let mut q = select_all();
    q.from("users");
    assert_eq!(q.compile(&conn).unwrap(), r#"SELECT * FROM "users""#);
}

#[test]
fn test_select_without_from() {
    let conn = StubConnection::new();
    let q = select([expr("1")]);
    assert_eq!(q.compile(&conn).unwrap(), "SELECT 1");
}

#[test]
fn test_select_where_order_limit() {
    let conn = StubConnection::new();
    let mut q = select(["id", "name"]);
    q.from("users")
        .where_("age", ">", 18)
        .order_by("name", Some("ASC"))
        .limit(10);
    assert_eq!(
        q.compile(&conn).unwrap(),
        r#"SELECT "id", "name" FROM "users" WHERE "age" > 18 ORDER BY "name" ASC LIMIT 10"#
    );
}

#[test]
fn test_where_group() {
    let conn = StubConnection::new();
    let mut q = select_all();
    q.from("t")
        .where_("active", "=", true)
        .and_where_open()
        .where_("a", "=", 1)
        .or_where("b", "=", 2)
        .where_close();
    assert_eq!(
        q.compile(&conn).unwrap(),
        r#"SELECT * FROM "t" WHERE "active" = TRUE AND ("a" = 1 OR "b" = 2)"#
    );
}

#[test]
fn test_group_only() {
    let conn = StubConnection::new();
    let mut q = delete("t");
    q.and_where_open()
        .where_("a", "=", 1)
        .or_where("b", "=", 2)
        .where_close();
    assert_eq!(
        q.compile(&conn).unwrap(),
        r#"DELETE FROM "t" WHERE ("a" = 1 OR "b" = 2)"#
    );
}

#[test]
fn test_or_group() {
    let conn = StubConnection::new();
    let mut q = select_all();
    q.from("t")
        .where_("a", "=", 1)
        .or_where_open()
        .where_("b", "=", 2)
        .where_("c", "=", 3)
        .or_where_close();
    assert_eq!(
        q.compile(&conn).unwrap(),
        r#"SELECT * FROM "t" WHERE "a" = 1 OR ("b" = 2 AND "c" = 3)"#
    );
}

#[test]
fn test_unclosed_group_fails() {
    let conn = StubConnection::new();
    let mut q = select_all();
    q.from("t").where_open().where_("a", "=", 1);
    assert!(matches!(q.compile(&conn), Err(DbError::Validation(_))));
}

#[test]
fn test_joins_act_on_last_join() {
    let conn = StubConnection::new();
    let mut q = select(["t1.id"]);
    q.from("t1")
        .join("t2", None)
        .on("t1.a", "t2.a")
        .on("t1.b", "t2.b")
        .join(("t3", "x"), Some("left"))
        .on("x.id", "t1.x_id");
    assert_eq!(
        q.compile(&conn).unwrap(),
        concat!(
            r#"SELECT "t1"."id" FROM "t1" "#,
            r#"JOIN "t2" ON ("t1"."a" = "t2"."a" AND "t1"."b" = "t2"."b") "#,
            r#"LEFT JOIN "t3" AS "x" ON "x"."id" = "t1"."x_id""#
        )
    );
}

#[test]
fn test_join_using() {
    let conn = StubConnection::new();
    let mut q = select_all();
    q.from("users").join("profiles", Some("INNER")).using(["user_id"]);
    assert_eq!(
        q.compile(&conn).unwrap(),
        r#"SELECT * FROM "users" INNER JOIN "profiles" USING ("user_id")"#
    );
}

#[test]
fn test_on_without_join_fails() {
    let conn = StubConnection::new();
    let mut q = select_all();
    q.from("t").on("a", "b");
    let err = q.compile(&conn).unwrap_err();
    assert!(err.to_string().contains("on() called before join()"));
}

#[test]
fn test_full_clause_order() {
    let conn = StubConnection::new();
    let mut q = select(["dept", "n"]);
    q.distinct(true)
        .from("emp")
        .where_("salary", ">", 1000)
        .group_by(["dept"])
        .having(expr("COUNT(*)"), ">", 5)
        .or_having("dept", "=", "ops")
        .order_by("dept", None)
        .limit(20)
        .offset(40);
    assert_eq!(
        q.compile(&conn).unwrap(),
        concat!(
            r#"SELECT DISTINCT "dept", "n" FROM "emp" WHERE "salary" > 1000 "#,
            r#"GROUP BY "dept" HAVING COUNT(*) > 5 OR "dept" = 'ops' "#,
            r#"ORDER BY "dept" LIMIT 20 OFFSET 40"#
        )
    );
}

#[test]
fn test_limit_and_offset_overwrite() {
    let conn = StubConnection::new();
    let mut q = select_all();
    q.from("t").limit(5).limit(10).offset(1).offset(2);
    assert_eq!(
        q.compile(&conn).unwrap(),
        r#"SELECT * FROM "t" LIMIT 10 OFFSET 2"#
    );
}

#[test]
fn test_select_as_and_multiple_from() {
    let conn = StubConnection::new();
    let mut q = select_all();
    q.select_as("u.name", "user_name").from(("users", "u")).from("roles");
    assert_eq!(
        q.compile(&conn).unwrap(),
        r#"SELECT "u"."name" AS "user_name" FROM "users" AS "u", "roles""#
    );
}

#[test]
fn test_insert_escapes_values() {
    let conn = StubConnection::new();
    let mut q = insert("users");
    q.values([("name", "O'Brien")]);
    assert_eq!(
        q.compile(&conn).unwrap(),
        r#"INSERT INTO "users" ("name") VALUES ('O''Brien')"#
    );
}

#[test]
fn test_insert_multiple_rows() {
    let conn = StubConnection::new();
    let mut q = insert("users");
    q.columns(["name", "age"])
        .row([Value::from("a"), Value::from(1)])
        .row([Value::from("b"), Value::Null]);
    assert_eq!(
        q.compile(&conn).unwrap(),
        r#"INSERT INTO "users" ("name", "age") VALUES ('a', 1), ('b', NULL)"#
    );
}

#[test]
fn test_insert_validation() {
    let conn = StubConnection::new();
    assert!(matches!(
        insert("users").compile(&conn),
        Err(DbError::Validation(_))
    ));

    let mut mismatch = insert("users");
    mismatch.columns(["a", "b"]).row([1]);
    assert!(mismatch.compile(&conn).is_err());

    let mut differing = insert("users");
    differing.values([("a", 1)]).values([("b", 2)]);
    assert!(differing.compile(&conn).is_err());
}

#[test]
fn test_update() {
    let conn = StubConnection::new();
    let mut q = update("users");
    q.set([("name", Value::from("x")), ("updated_at", expr("NOW()").into())])
        .value("visits", expr("visits + 1"))
        .where_("id", "=", 7);
    assert_eq!(
        q.compile(&conn).unwrap(),
        r#"UPDATE "users" SET "name" = 'x', "updated_at" = NOW(), "visits" = visits + 1 WHERE "id" = 7"#
    );
}

#[test]
fn test_update_requires_set() {
    let conn = StubConnection::new();
    let mut q = update("users");
    q.where_("id", "=", 1);
    assert!(matches!(q.compile(&conn), Err(DbError::Validation(_))));
}

#[test]
fn test_table_overwrites() {
    let conn = StubConnection::new();
    let mut q = delete("a");
    q.table("b");
    assert_eq!(q.compile(&conn).unwrap(), r#"DELETE FROM "b""#);
}

#[test]
fn test_table_prefix() {
    let conn = StubConnection::with_prefix("app_");
    let mut q = select(["users.id"]);
    q.from("users").join("roles", None).on("users.role_id", "roles.id");
    assert_eq!(
        q.compile(&conn).unwrap(),
        r#"SELECT "app_users"."id" FROM "app_users" JOIN "app_roles" ON "app_users"."role_id" = "app_roles"."id""#
    );
}

#[test]
fn test_compile_is_deterministic() {
    let conn = StubConnection::new();
    let mut q = select(["id"]);
    q.from("t").where_("name", "=", "x").or_where("id", "in", vec![1, 2]);
    let first = q.compile(&conn).unwrap();
    assert_eq!(first, q.compile(&conn).unwrap());
    assert_eq!(
        first,
        r#"SELECT "id" FROM "t" WHERE "name" = 'x' OR "id" IN (1, 2)"#
    );
}

#[test]
fn test_execute_and_to_query() {
    let conn = StubConnection::new();
    let mut q = insert("t");
    q.values([("a", 1)]);
    let out = q.execute(&conn).unwrap();
    assert_eq!(out.insert_id(), Some(1));
    assert_eq!(conn.last_sql().unwrap(), r#"INSERT INTO "t" ("a") VALUES (1)"#);

    let mut q = select_all();
    q.from("t").where_("id", "=", expr(":id"));
    let raw = q.to_query(&conn).unwrap().value("id", 5);
    assert_eq!(raw.kind(), QueryKind::Select);
    assert_eq!(
        raw.compile(&conn).unwrap(),
        r#"SELECT * FROM "t" WHERE "id" = 5"#
    );
}
