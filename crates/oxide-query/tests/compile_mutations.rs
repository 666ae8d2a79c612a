mod common;

use common::*;
use oxide_query::query::{member, object, param, value, Lambda, Query};
use oxide_query::{DatabaseEngine, Expr, SqlError, SqlValue};

/// Orders of adult users, joined as `{ order, user }`.
fn adult_orders() -> Query {
    Query::table::<Order>()
        .join(
            Query::table::<User>(),
            Lambda::new("o", member("o", "user_id")),
            Lambda::new("u", member("u", "id")),
            Lambda::with_params(
                &["o", "u"],
                object([("order", param("o")), ("user", param("u"))]),
            ),
        )
        .filter(Lambda::new("x", member("x", "user").field("age").gt(18)))
}

fn reset_total() -> Lambda {
    Lambda::new("x", object([("total", value(0))]))
}

// ===================================================================
// INSERT
// ===================================================================

#[test]
fn test_insert_injects_token_fields() {
    let query = Query::insert::<Order>(object([("user_id", value(1)), ("total", value(9.5))]));
    let command = canonical(&query);
    assert_eq!(
        command.sql,
        "INSERT INTO {INSERT#sales.orders} ([user_id], [amount], [row_version]) \
         VALUES ({__variable_1}, {__variable_2}, {__variable_3})"
    );
    assert_eq!(command.parameters.len(), 3);
    assert_eq!(command.parameters.get("__variable_3"), Some(&SqlValue::Int(1)));
}

#[test]
fn test_insert_keeps_assigned_token() {
    let query = Query::insert::<Order>(object([("user_id", value(1)), ("version", value(7))]));
    let command = canonical(&query);
    assert_eq!(
        command.sql,
        "INSERT INTO {INSERT#sales.orders} ([user_id], [row_version]) \
         VALUES ({__variable_1}, {__variable_2})"
    );
    assert_eq!(command.parameters.get("__variable_2"), Some(&SqlValue::Int(7)));
}

#[test]
fn test_insert_null_is_inlined() {
    let query = Query::insert::<User>(object([
        ("name", value("ann")),
        ("age", Expr::Constant(SqlValue::Null)),
    ]));
    assert_eq!(
        canonical(&query).sql,
        "INSERT INTO {INSERT#users} ([name], [age]) VALUES ({__variable_1}, NULL)"
    );
}

#[test]
fn test_insert_renders_per_engine() {
    let query = Query::insert::<User>(object([("name", value("ann"))]));
    assert_eq!(
        sql(&query, DatabaseEngine::Oracle),
        "INSERT INTO \"users\" (\"name\") VALUES (:__variable_1)"
    );
}

#[test]
fn error_insert_read_only_field() {
    let query = Query::insert::<User>(object([("created", value("2024-01-01"))]));
    let err = compile_err(&query);
    assert!(matches!(err, SqlError::Schema(_)), "{err:?}");
}

#[test]
fn error_insert_without_initializer() {
    let err = compile_err(&Query::insert::<User>(value(1)));
    assert!(matches!(err, SqlError::Schema(_)), "{err:?}");

    let empty: [(&str, Expr); 0] = [];
    let err = compile_err(&Query::insert::<User>(object(empty)));
    assert!(matches!(err, SqlError::Schema(_)), "{err:?}");
}

// ===================================================================
// UPDATE and DELETE on one table
// ===================================================================

#[test]
fn test_update_uses_bare_table() {
    let query = Query::table::<User>()
        .filter(Lambda::new("u", member("u", "id").eq(1)))
        .update(Lambda::new(
            "u",
            object([("name", value("bob")), ("age", member("u", "age").add(1))]),
        ));
    assert_eq!(
        canonical(&query).sql,
        "UPDATE {UPDATE#users} SET [name] = {__variable_2}, [age] = ([users].[age] + {__variable_3}) \
         WHERE [users].[id] = {__variable_1}"
    );
}

#[test]
fn test_update_injects_token_fields() {
    let query = Query::table::<Order>().update(reset_total());
    assert_eq!(
        canonical(&query).sql,
        "UPDATE {UPDATE#sales.orders} SET [amount] = {__variable_1}, [row_version] = {__variable_2}"
    );
}

#[test]
fn test_delete() {
    let query = Query::table::<User>()
        .filter(Lambda::new("u", member("u", "age").lt(13)))
        .delete();
    let command = canonical(&query);
    assert_eq!(
        command.sql,
        "DELETE FROM {DELETE#users} WHERE [users].[age] < {__variable_1}"
    );
    assert_eq!(
        sql(&query, DatabaseEngine::SqlServer),
        "DELETE FROM [users] WHERE [users].[age] < @__variable_1"
    );
}

#[test]
fn test_delete_everything() {
    let query = Query::table::<User>().delete();
    assert_eq!(canonical(&query).sql, "DELETE FROM {DELETE#users}");
}

#[test]
fn error_update_read_only_field() {
    let query = Query::table::<User>().update(Lambda::new("u", object([("created", value(1))])));
    let err = compile_err(&query);
    assert!(matches!(err, SqlError::Schema(_)), "{err:?}");
}

#[test]
fn error_delete_after_take() {
    let err = compile_err(&Query::table::<User>().take(10).delete());
    assert!(matches!(err, SqlError::Unsupported(_)), "{err:?}");
}

// ===================================================================
// Joined UPDATE and DELETE
// ===================================================================

#[test]
fn test_joined_delete_sqlserver() {
    let command = canonical_for(&adult_orders().delete(), DatabaseEngine::SqlServer);
    assert_eq!(
        command.sql,
        "DELETE [o] FROM {DELETE#sales.orders} [o] \
         INNER JOIN {JOIN#users} [u] ON [o].[user_id] = [u].[id] \
         WHERE [u].[age] > {__variable_1}"
    );
}

#[test]
fn test_joined_delete_mysql() {
    let command = canonical_for(&adult_orders().delete(), DatabaseEngine::MySql);
    assert!(command.sql.starts_with("DELETE [o] FROM {DELETE#sales.orders} [o] INNER JOIN "));
}

#[test]
fn test_joined_delete_postgres() {
    let command = canonical_for(&adult_orders().delete(), DatabaseEngine::Postgres);
    assert_eq!(
        command.sql,
        "DELETE FROM {DELETE#sales.orders} [o] USING {JOIN#users} [u] \
         WHERE [o].[user_id] = [u].[id] AND [u].[age] > {__variable_1}"
    );
}

#[test]
fn test_joined_update_sqlserver() {
    let command = canonical_for(&adult_orders().update(reset_total()), DatabaseEngine::SqlServer);
    assert_eq!(
        command.sql,
        "UPDATE [o] SET [o].[amount] = {__variable_2}, [o].[row_version] = {__variable_3} \
         FROM {UPDATE#sales.orders} [o] \
         INNER JOIN {JOIN#users} [u] ON [o].[user_id] = [u].[id] \
         WHERE [u].[age] > {__variable_1}"
    );
}

#[test]
fn test_joined_update_mysql() {
    let command = canonical_for(&adult_orders().update(reset_total()), DatabaseEngine::MySql);
    assert_eq!(
        command.sql,
        "UPDATE {UPDATE#sales.orders} [o] \
         INNER JOIN {JOIN#users} [u] ON [o].[user_id] = [u].[id] \
         SET [o].[amount] = {__variable_2}, [o].[row_version] = {__variable_3} \
         WHERE [u].[age] > {__variable_1}"
    );
}

#[test]
fn test_joined_update_postgres() {
    let command = canonical_for(&adult_orders().update(reset_total()), DatabaseEngine::Postgres);
    assert_eq!(
        command.sql,
        "UPDATE {UPDATE#sales.orders} [o] SET [amount] = {__variable_2}, [row_version] = {__variable_3} \
         FROM {JOIN#users} [u] WHERE [o].[user_id] = [u].[id] AND [u].[age] > {__variable_1}"
    );
}

#[test]
fn error_joined_delete_sqlite() {
    let err = compile_err_for(&adult_orders().delete(), DatabaseEngine::Sqlite);
    assert!(matches!(err, SqlError::Unsupported(_)), "{err:?}");
    let err = compile_err_for(&adult_orders().delete(), DatabaseEngine::Oracle);
    assert!(matches!(err, SqlError::Unsupported(_)), "{err:?}");
}

#[test]
fn error_left_join_delete_postgres() {
    let query = Query::table::<Order>()
        .left_join(
            Query::table::<User>(),
            Lambda::new("o", member("o", "user_id")),
            Lambda::new("u", member("u", "id")),
            Lambda::with_params(&["o", "u"], param("o")),
        )
        .delete();
    let err = compile_err_for(&query, DatabaseEngine::Postgres);
    assert!(matches!(err, SqlError::Unsupported(_)), "{err:?}");
}
