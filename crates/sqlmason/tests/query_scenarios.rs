//! End-to-end statement building against a realistic schema, exercising the
//! public API only.

use sqlmason::{
    Aggregate, ColumnSpec, DataType, Dialect, FkAction, FkSpec, Logic, Op, Schema, SqlError,
    Table, Value,
};

// Built against MySQL types and migrated, so the same fixture serves both
// dialects (`datetime` has no direct SQL Server counterpart).
fn shop(dialect: Dialect) -> Schema {
    let mut schema = Schema::new(Dialect::MySql);

    let mut users = Table::new(Dialect::MySql, "users").unwrap();
    users
        .add_columns([
            (
                "id",
                ColumnSpec::new(DataType::Int).primary().auto_increment(),
            ),
            ("username", ColumnSpec::new(DataType::Varchar).size(50)),
            (
                "created-on",
                ColumnSpec::new(DataType::DateTime).default_value("now"),
            ),
        ])
        .unwrap();
    schema.add_table(users).unwrap();

    let mut orders = Table::new(Dialect::MySql, "orders").unwrap();
    orders
        .add_columns([
            (
                "id",
                ColumnSpec::new(DataType::Int).primary().auto_increment(),
            ),
            (
                "user-id",
                ColumnSpec::new(DataType::Int).references(
                    FkSpec::new("users", "id")
                        .name("fk-order-user")
                        .on_delete(FkAction::Cascade),
                ),
            ),
            ("total", ColumnSpec::new(DataType::Decimal).size(10).scale(2)),
        ])
        .unwrap();
    schema.add_table(orders).unwrap();

    let mut items = Table::new(Dialect::MySql, "items").unwrap();
    items
        .add_columns([
            (
                "id",
                ColumnSpec::new(DataType::Int).primary().auto_increment(),
            ),
            ("order-id", ColumnSpec::new(DataType::Int)),
            ("sku", ColumnSpec::new(DataType::Varchar).size(32)),
        ])
        .unwrap();
    schema.add_table(items).unwrap();

    if dialect == Dialect::MySql {
        schema
    } else {
        schema.to_dialect(dialect).unwrap()
    }
}

#[test]
fn foreign_key_added_directly_with_owning_key() {
    let schema = shop(Dialect::MySql);
    let orders = schema.table("orders").unwrap();
    let mut items = schema.table("items").unwrap().clone();
    items
        .add_foreign_key(
            orders,
            FkSpec::new("orders", "id")
                .owning("order-id")
                .name("fk-item-order")
                .on_delete(FkAction::Cascade),
        )
        .unwrap();
    let fk = items.foreign_key("fk-item-order").unwrap();
    assert_eq!(fk.links()[0].name, "order_id");
    assert_eq!(fk.links()[0].references, "id");
    assert_eq!(
        fk.constraint_sql(Dialect::MySql),
        "constraint `fk-item-order` foreign key (`order_id`) references `orders` (`id`) \
         on delete cascade"
    );
}

#[test]
fn mssql_fixture_carries_translated_types() {
    let schema = shop(Dialect::MsSql);
    let users = schema.table("users").unwrap();
    assert_eq!(
        users.col_by_key("created-on").unwrap().datatype(),
        DataType::DateTime2
    );
    assert_eq!(
        users.col_by_key("username").unwrap().datatype(),
        DataType::Varchar
    );
}

#[test]
fn chained_conditions_keep_insertion_order() {
    let mut qb = shop(Dialect::MySql).query();
    qb.table("users")
        .unwrap()
        .select_all()
        .unwrap()
        .where_("id", Op::Eq, 66)
        .unwrap()
        .where_("id", Op::Eq, 77)
        .unwrap();
    assert_eq!(
        qb.inline_sql(),
        "select * from `users` where `users`.`id` = 66 and `users`.`id` = 77"
    );
    assert_eq!(
        qb.sql(),
        "select * from `users` where `users`.`id` = ? and `users`.`id` = ?"
    );
}

#[test]
fn grouped_conditions_parenthesize_only_real_groups() {
    let mut qb = shop(Dialect::MySql).query();
    qb.table("users").unwrap().select_all().unwrap();
    qb.where_("id", Op::Gt, 10).unwrap();
    qb.where_group(Logic::And, |q| {
        q.where_("username", Op::Eq, "alice")?;
        q.or_where("username", Op::Eq, "bob")?;
        Ok(())
    })
    .unwrap();
    assert_eq!(
        qb.inline_sql(),
        "select * from `users` where `users`.`id` > 10 and \
         (`users`.`username` = 'alice' or `users`.`username` = 'bob')"
    );

    // A group holding a single condition is spliced in without parentheses.
    let mut flat = shop(Dialect::MySql).query();
    flat.table("users").unwrap().select_all().unwrap();
    flat.where_group(Logic::And, |q| {
        q.where_("id", Op::Eq, 1)?;
        Ok(())
    })
    .unwrap();
    flat.where_("username", Op::Ne, "eve").unwrap();
    assert_eq!(
        flat.inline_sql(),
        "select * from `users` where `users`.`id` = 1 and `users`.`username` != 'eve'"
    );
}

#[test]
fn literals_never_reach_statement_text() {
    let mut qb = shop(Dialect::MySql).query();
    qb.table("users")
        .unwrap()
        .select_all()
        .unwrap()
        .where_("username", Op::Eq, "O'Brien")
        .unwrap()
        .where_in("id", &[Value::Int(100), Value::Int(200)])
        .unwrap()
        .where_like("username", "O%")
        .unwrap();
    assert!(!qb.sql().contains("Brien"));
    assert!(!qb.sql().contains("100"));
    assert_eq!(qb.bindings().len(), 4);
    // Quotes are doubled in the display rendering.
    assert!(qb.inline_sql().contains("'O''Brien'"));
}

#[test]
fn pagination_forms_per_dialect() {
    let mut my = shop(Dialect::MySql).query();
    my.table("users")
        .unwrap()
        .select_all()
        .unwrap()
        .page(5, 40)
        .unwrap();
    assert_eq!(my.sql(), "select * from `users` limit 40 offset 160");

    let mut ms = shop(Dialect::MsSql).query();
    ms.table("users")
        .unwrap()
        .select_all()
        .unwrap()
        .page(5, 40)
        .unwrap();
    assert_eq!(
        ms.sql(),
        "select * from [users] order by (select null) offset 160 rows \
         fetch next 40 rows only"
    );

    // A bare limit on SQL Server renders as `top`.
    let mut top = shop(Dialect::MsSql).query();
    top.table("users")
        .unwrap()
        .select_all()
        .unwrap()
        .limit(3)
        .unwrap();
    assert_eq!(top.sql(), "select top 3 * from [users]");

    // With an explicit order the placeholder ordering guard is not needed.
    let mut ordered = shop(Dialect::MsSql).query();
    ordered
        .table("users")
        .unwrap()
        .select_all()
        .unwrap()
        .order_by("id", "asc")
        .unwrap()
        .page(2, 10)
        .unwrap();
    assert_eq!(
        ordered.sql(),
        "select * from [users] order by [users].[id] asc offset 10 rows \
         fetch next 10 rows only"
    );
}

#[test]
fn mssql_placeholders_are_numbered() {
    let mut qb = shop(Dialect::MsSql).query();
    qb.table("users")
        .unwrap()
        .select_all()
        .unwrap()
        .where_("id", Op::Gt, 5)
        .unwrap()
        .where_("username", Op::Eq, "alice")
        .unwrap();
    assert_eq!(
        qb.sql(),
        "select * from [users] where [users].[id] > @P1 and [users].[username] = @P2"
    );
    assert_eq!(
        qb.inline_sql(),
        "select * from [users] where [users].[id] > 5 and [users].[username] = 'alice'"
    );
}

#[test]
fn join_renders_as_derived_table() {
    let mut qb = shop(Dialect::MySql).query();
    qb.table("users")
        .unwrap()
        .select(&["username"])
        .unwrap()
        .where_("id", Op::Eq, 7)
        .unwrap()
        .left_join("orders")
        .unwrap()
        .on("id", "user-id")
        .unwrap()
        .select(&["total"])
        .unwrap();
    assert_eq!(
        qb.sql(),
        "select * from (select `users`.`username`, `orders`.`total` from `users` \
         left join `orders` on `users`.`id` = `orders`.`user_id`) as `T1` \
         where `users`.`id` = ?"
    );
    assert_eq!(qb.bindings().len(), 1);
    assert_eq!(qb.bindings()[0].value, Value::Int(7));
}

#[test]
fn second_join_wraps_the_first() {
    let mut qb = shop(Dialect::MySql).query();
    qb.table("users")
        .unwrap()
        .select_all()
        .unwrap()
        .left_join("orders")
        .unwrap()
        .on("id", "user-id")
        .unwrap()
        .left_join("items")
        .unwrap()
        .on("id-right", "order-id")
        .unwrap();
    assert_eq!(
        qb.sql(),
        "select * from (select * from \
         (select * from `users` left join `orders` on `users`.`id` = `orders`.`user_id`) as `T1` \
         left join `items` on `orders`.`id` = `items`.`order_id`) as `T2`"
    );
}

#[test]
fn join_namespace_renames_conflicting_keys() {
    let mut qb = shop(Dialect::MySql).query();
    qb.table("users")
        .unwrap()
        .select_all()
        .unwrap()
        .inner_join("orders")
        .unwrap()
        .on("id", "user-id")
        .unwrap();
    // Both sides declare 'id'; the right one is reachable as 'id-right'.
    qb.where_("id-right", Op::Gt, 0).unwrap();
    assert_eq!(
        qb.sql(),
        "select * from (select * from `users` inner join `orders` on \
         `users`.`id` = `orders`.`user_id`) as `T1` where `orders`.`id` > ?"
    );
    let err = qb.where_("no-such", Op::Eq, 1).unwrap_err();
    assert!(err.is_unknown());
}

#[test]
fn aggregates_and_grouping() {
    let mut qb = shop(Dialect::MySql).query();
    qb.table("orders")
        .unwrap()
        .select_col("user-id", None, None)
        .unwrap()
        .select_col("total", Some("spent"), Some(Aggregate::Sum))
        .unwrap()
        .group_by("user-id")
        .unwrap()
        .order_by("user-id", "desc")
        .unwrap();
    assert_eq!(
        qb.sql(),
        "select `orders`.`user_id`, sum(`orders`.`total`) as spent from `orders` \
         group by `orders`.`user_id` order by `orders`.`user_id` desc"
    );
}

#[test]
fn insert_update_delete_lifecycle() {
    let schema = shop(Dialect::MySql);
    let mut qb = schema.query();

    qb.table("users")
        .unwrap()
        .insert(&[("username", Value::from("alice"))])
        .unwrap();
    // 'created-on' has a declared default that is backfilled.
    assert_eq!(
        qb.sql(),
        "insert into `users` (`username`, `created_on`) values (?, ?)"
    );
    assert!(matches!(qb.bindings()[1].value, Value::DateTime(_)));

    qb.table("users")
        .unwrap()
        .update(&[("username", Value::from("bob"))])
        .unwrap()
        .where_("id", Op::Eq, 1)
        .unwrap();
    assert_eq!(
        qb.sql(),
        "update `users` set `username` = ? where `users`.`id` = ?"
    );

    qb.table("users")
        .unwrap()
        .delete()
        .unwrap()
        .where_("id", Op::Eq, 1)
        .unwrap();
    assert_eq!(qb.sql(), "delete from `users` where `users`.`id` = ?");
}

#[test]
fn multi_row_insert_binds_row_major() {
    let mut qb = shop(Dialect::MySql).query();
    qb.table("items")
        .unwrap()
        .insert_rows(
            &["order-id", "sku"],
            vec![
                vec![Value::Int(1), Value::from("A-1")],
                vec![Value::Int(1), Value::from("A-2")],
            ],
        )
        .unwrap();
    assert_eq!(
        qb.sql(),
        "insert into `items` (`order_id`, `sku`) values (?, ?), (?, ?)"
    );
    assert_eq!(qb.bindings()[2].value, Value::Int(1));
    assert_eq!(qb.bindings()[3].value, Value::Text("A-2".into()));
}

#[test]
fn now_keyword_resolves_when_bound() {
    let mut qb = shop(Dialect::MySql).query();
    qb.table("users")
        .unwrap()
        .select_all()
        .unwrap()
        .where_("created-on", Op::Lte, "now")
        .unwrap();
    assert!(matches!(qb.bindings()[0].value, Value::DateTime(_)));
    assert!(!qb.sql().contains("now"));
}

#[test]
fn schema_migration_carries_statements_across_dialects() {
    let my = shop(Dialect::MySql);
    let ms = my.to_dialect(Dialect::MsSql).unwrap();

    let mut qb = ms.query();
    qb.table("users")
        .unwrap()
        .select(&["username"])
        .unwrap()
        .where_("id", Op::Eq, 1)
        .unwrap();
    assert_eq!(
        qb.sql(),
        "select [users].[username] from [users] where [users].[id] = @P1"
    );

    // The migrated text column round-trips back to the MySQL type.
    let back = ms.to_dialect(Dialect::MySql).unwrap();
    assert_eq!(
        back.table("users")
            .unwrap()
            .col_by_key("username")
            .unwrap()
            .datatype(),
        DataType::Varchar
    );
}

#[test]
fn sequencing_is_enforced() {
    let schema = shop(Dialect::MySql);
    let mut qb = schema.query();

    // Conditions before a statement verb.
    qb.table("users").unwrap();
    assert!(qb.where_("id", Op::Eq, 1).unwrap_err().is_sequence());

    // Conditions after a statement that takes none.
    qb.insert(&[("username", Value::from("x"))]).unwrap();
    assert!(qb.where_("id", Op::Eq, 1).unwrap_err().is_sequence());

    // Pagination outside a select.
    qb.table("users").unwrap().delete().unwrap();
    assert!(qb.limit(10).unwrap_err().is_sequence());

    // Null comparisons are routed to the dedicated methods.
    qb.table("users").unwrap().select_all().unwrap();
    let err = qb.where_("username", Op::Eq, Value::Null).unwrap_err();
    assert!(matches!(err, SqlError::InvalidOperator { .. }));
}

#[test]
fn unknown_where_key_is_created_on_the_statement_only() {
    let schema = shop(Dialect::MySql);
    let mut qb = schema.query();
    qb.table("users")
        .unwrap()
        .select_all()
        .unwrap()
        .where_("score", Op::Gt, 2.5)
        .unwrap();
    assert_eq!(qb.sql(), "select * from `users` where `users`.`score` > ?");
    assert_eq!(qb.bindings()[0].column.datatype(), DataType::Decimal);
    // The schema itself is untouched.
    assert!(schema.table("users").unwrap().col_by_key("score").is_none());
}
