mod common;

use common::*;
use oxide_query::query::{member, object, param, Lambda, Query};
use oxide_query::{DatabaseEngine, SqlError};

fn users() -> Query {
    Query::table::<User>()
}

fn orders() -> Query {
    Query::table::<Order>()
}

/// `users JOIN orders ON u.id == o.user_id`, projected with `result`.
fn users_with_orders(result: Lambda) -> Query {
    users().join(
        orders(),
        Lambda::new("u", member("u", "id")),
        Lambda::new("o", member("o", "user_id")),
        result,
    )
}

fn name_and_total() -> Lambda {
    Lambda::with_params(
        &["u", "o"],
        object([("name", member("u", "name")), ("total", member("o", "total"))]),
    )
}

// ===================================================================
// Joins
// ===================================================================

#[test]
fn test_inner_join() {
    let command = canonical(&users_with_orders(name_and_total()));
    assert_eq!(
        command.sql,
        "SELECT [u].[name], [o].[amount] AS [total] FROM {SELECT#users} [u] \
         INNER JOIN {JOIN#sales.orders} [o] ON [u].[id] = [o].[user_id]"
    );
}

#[test]
fn test_left_join() {
    let query = users().left_join(
        orders(),
        Lambda::new("u", member("u", "id")),
        Lambda::new("o", member("o", "user_id")),
        name_and_total(),
    );
    assert!(canonical(&query)
        .sql
        .contains(" LEFT JOIN {JOIN#sales.orders} [o] ON [u].[id] = [o].[user_id]"));
}

#[test]
fn test_join_renders_per_engine() {
    let query = users_with_orders(name_and_total());
    assert_eq!(
        sql(&query, DatabaseEngine::MySql),
        "SELECT `u`.`name`, `o`.`amount` AS `total` FROM `users` `u` \
         INNER JOIN `sales`.`orders` `o` ON `u`.`id` = `o`.`user_id`"
    );
}

#[test]
fn test_composite_join_key() {
    let query = users().join(
        orders(),
        Lambda::new("u", object([("a", member("u", "id")), ("b", member("u", "age"))])),
        Lambda::new("o", object([("a", member("o", "user_id")), ("b", member("o", "id"))])),
        name_and_total(),
    );
    assert!(canonical(&query)
        .sql
        .ends_with("ON [u].[id] = [o].[user_id] AND [u].[age] = [o].[id]"));
}

#[test]
fn test_filter_over_joined_row() {
    let query = users_with_orders(Lambda::with_params(
        &["u", "o"],
        object([("user", param("u")), ("order", param("o"))]),
    ))
    .filter(Lambda::new("x", member("x", "order").field("total").gt(100)))
    .select(Lambda::new("x", member("x", "user").field("name")));
    assert_eq!(
        canonical(&query).sql,
        "SELECT [u].[name] FROM {SELECT#users} [u] \
         INNER JOIN {JOIN#sales.orders} [o] ON [u].[id] = [o].[user_id] \
         WHERE [o].[amount] > {__variable_1}"
    );
}

#[test]
fn test_join_with_derived_inner() {
    let big = orders().filter(Lambda::new("o", member("o", "total").gt(100)));
    let query = users().join(
        big,
        Lambda::new("u", member("u", "id")),
        Lambda::new("b", member("b", "user_id")),
        Lambda::with_params(&["u", "b"], object([("name", member("u", "name"))])),
    );
    let command = canonical(&query);
    assert!(command.sql.contains(
        "INNER JOIN (SELECT [o].[id], [o].[user_id], [o].[amount] AS [total], [o].[row_version] AS [version] \
         FROM {SELECT#sales.orders} [o] WHERE [o].[amount] > {__variable_1}) [b] ON [u].[id] = [b].[user_id]"
    ));
}

#[test]
fn error_joined_row_without_projection() {
    let query = users_with_orders(Lambda::with_params(
        &["u", "o"],
        object([("user", param("u")), ("order", param("o"))]),
    ));
    let err = compile_err(&query);
    assert!(matches!(err, SqlError::Unsupported(_)), "{err:?}");
}

#[test]
fn error_composite_key_size_mismatch() {
    let query = users().join(
        orders(),
        Lambda::new("u", object([("a", member("u", "id")), ("b", member("u", "age"))])),
        Lambda::new("o", object([("a", member("o", "user_id"))])),
        name_and_total(),
    );
    let err = compile_err(&query);
    assert!(matches!(err, SqlError::Syntax(_)), "{err:?}");
}

#[test]
fn error_join_result_needs_two_parameters() {
    let query = users_with_orders(Lambda::new("u", member("u", "name")));
    let err = compile_err(&query);
    assert!(matches!(err, SqlError::Syntax(_)), "{err:?}");
}

// ===================================================================
// Set operations
// ===================================================================

fn names(param: &str) -> Query {
    users().select(Lambda::new(param, member(param, "name")))
}

#[test]
fn test_union() {
    let command = canonical(&names("u").union(names("x")));
    assert_eq!(
        command.sql,
        "SELECT [u].[name] AS [value] FROM {SELECT#users} [u] \
         UNION SELECT [x].[name] AS [value] FROM {SELECT#users} [x]"
    );
}

#[test]
fn test_set_operator_keywords() {
    assert!(canonical(&names("u").concat(names("x"))).sql.contains(" UNION ALL "));
    assert!(canonical(&names("u").except(names("x"))).sql.contains(" EXCEPT "));
    assert!(canonical(&names("u").intersect(names("x"))).sql.contains(" INTERSECT "));
}

#[test]
fn test_paging_a_union_wraps_it() {
    let command = canonical(&names("u").union(names("x")).take(3));
    assert!(command.sql.starts_with(
        "SELECT [t].[value] FROM (SELECT [u].[name] AS [value] FROM {SELECT#users} [u] UNION "
    ));
    assert!(command.sql.ends_with("FROM {SELECT#users} [x]) [t] LIMIT 3"));
}

#[test]
fn test_paged_arm_is_wrapped() {
    let left = names("u").take(5);
    let command = canonical(&left.union(names("x")));
    assert!(command
        .sql
        .starts_with("SELECT [t].[value] FROM (SELECT [u].[name] AS [value] FROM {SELECT#users} [u] LIMIT 5)"));
    assert!(command.sql.contains("LIMIT 5) [t] UNION SELECT [x].[name] AS [value]"));
}

#[test]
fn error_set_operation_column_mismatch() {
    let err = compile_err(&names("u").union(users()));
    assert!(matches!(err, SqlError::Syntax(_)), "{err:?}");
}

#[test]
fn error_set_operation_after_terminal() {
    let err = compile_err(&names("u").union(names("x").first()));
    assert!(matches!(err, SqlError::Unsupported(_)), "{err:?}");
}
