//! End-to-end execution against an in-memory SQLite database.

#![cfg(feature = "sqlite")]

use sqlqb::{
    create_sqlite_pool, qb, query, FromRow, GenericClient, InstrumentedClient, MonitorConfig,
    PoolConfig, QbError, QbResult, Row, StatsMonitor, Value, WriteResult,
};
use std::sync::Arc;

#[derive(Debug, PartialEq)]
struct Sale {
    region: String,
    amount: i64,
}

impl FromRow for Sale {
    fn from_row(row: &Row) -> QbResult<Self> {
        Ok(Self {
            region: row.try_get("region")?,
            amount: row.try_get("amount")?,
        })
    }
}

async fn setup() -> sqlx::SqlitePool {
    // one connection: every connection to `sqlite::memory:` is a separate database
    let pool = create_sqlite_pool("sqlite::memory:", &PoolConfig::new().max_connections(1))
        .await
        .unwrap();
    query(
        "CREATE TABLE sales (
            id INTEGER PRIMARY KEY,
            region TEXT NOT NULL,
            amount INTEGER NOT NULL,
            note TEXT
        )",
    )
    .execute(&pool)
    .await
    .unwrap();

    let rows = [
        ("north", 10),
        ("north", 20),
        ("south", 5),
        ("east", 7),
        ("east", 8),
        ("east", 9),
    ];
    let inserted = qb::table("sales")
        .insert_all(
            rows.iter()
                .map(|(region, amount)| vec![("region", Value::from(*region)), ("amount", Value::from(*amount))]),
        )
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(inserted, 6);
    pool
}

#[tokio::test]
async fn grouped_count_returns_number_of_groups() {
    let pool = setup().await;

    let (groups,): (i64,) = qb::table("sales")
        .group_by("region")
        .count()
        .fetch_one_as(&pool)
        .await
        .unwrap();
    assert_eq!(groups, 3);

    let (rows,): (i64,) = qb::table("sales").count().fetch_one_as(&pool).await.unwrap();
    assert_eq!(rows, 6);

    let (big_groups,): (i64,) = qb::table("sales")
        .group_by("region")
        .having_gt("SUM(amount)", 20)
        .count()
        .fetch_one_as(&pool)
        .await
        .unwrap();
    assert_eq!(big_groups, 2);
}

#[tokio::test]
async fn select_with_groups_and_in_lists() {
    let pool = setup().await;

    let sales: Vec<Sale> = qb::table("sales")
        .select_cols(&["region", "amount"])
        .where_in("region", ["north", "south"])
        .group_start()
        .gt("amount", 6)
        .or_eq("region", "south")
        .group_end()
        .where_in("id", Vec::<i64>::new())
        .order_asc("amount")
        .read()
        .fetch_all_as(&pool)
        .await
        .unwrap();

    assert_eq!(
        sales,
        vec![
            Sale { region: "south".into(), amount: 5 },
            Sale { region: "north".into(), amount: 10 },
            Sale { region: "north".into(), amount: 20 },
        ]
    );
}

#[tokio::test]
async fn subquery_membership() {
    let pool = setup().await;

    let inner = qb::table("sales").select("id").eq("region", "east").read();
    let rows = qb::table("sales")
        .select("amount")
        .where_in_query("id", &inner)
        .not_eq("amount", 8)
        .order_desc("amount")
        .read()
        .fetch_all(&pool)
        .await
        .unwrap();

    let amounts: Vec<i64> = rows.iter().map(|r| r.try_get("amount").unwrap()).collect();
    assert_eq!(amounts, vec![9, 7]);
}

#[tokio::test]
async fn union_keeps_parameter_order() {
    let pool = setup().await;

    let a = qb::table("sales").select("amount").eq("amount", 5).read();
    let b = qb::table("sales").select("amount").eq("amount", 20).read();
    let rows = a.union(&b).fetch_all(&pool).await.unwrap();

    let mut amounts: Vec<i64> = rows.iter().map(|r| r.try_get("amount").unwrap()).collect();
    amounts.sort_unstable();
    assert_eq!(amounts, vec![5, 20]);
}

#[tokio::test]
async fn update_replace_and_delete() {
    let pool = setup().await;

    let updated = qb::table("sales")
        .add("note", "checked")
        .increment("amount", 100)
        .eq("region", "east")
        .update()
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(updated, 3);

    let row = qb::table("sales")
        .select_cols(&["amount", "note"])
        .eq("id", 4)
        .read()
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.try_get::<i64>("amount").unwrap(), 107);
    assert_eq!(row.get("note"), Some(&Value::from("checked")));

    qb::table("sales")
        .add("id", 3)
        .add("region", "west")
        .add("amount", 1)
        .replace()
        .execute(&pool)
        .await
        .unwrap();
    let south = qb::table("sales").eq("region", "south").count();
    let (n,): (i64,) = south.fetch_one_as(&pool).await.unwrap();
    assert_eq!(n, 0);

    let deleted = qb::table("sales")
        .is_null("note")
        .delete()
        .exec(&pool)
        .await
        .unwrap();
    // north x2 and the replaced row
    assert_eq!(deleted.row_count(), 3);
}

#[tokio::test]
async fn exec_returns_rows_or_affected_counts() {
    let pool = setup().await;

    let rows = qb::table("sales").eq("region", "north").read().exec(&pool).await.unwrap();
    assert_eq!(rows.row_count(), 2);
    assert!(rows.one().is_none());

    let one = qb::table("sales").eq("amount", 5).read().exec(&pool).await.unwrap().one();
    assert_eq!(one.and_then(|r| r.get("region").cloned()), Some(Value::from("south")));

    let empty = qb::table("sales").insert_all(Vec::<Vec<(&str, i64)>>::new());
    assert_eq!(empty.exec(&pool).await.unwrap().row_count(), 0);
}

#[tokio::test]
async fn nulls_decode_and_strict_fetch() {
    let pool = setup().await;

    let row = query("SELECT note, amount FROM sales WHERE id = ?")
        .bind(1)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.get("note"), Some(&Value::Null));
    assert_eq!(row.try_get::<Option<String>>("note").unwrap(), None);

    let err = pool
        .query_one_strict(&qb::table("sales").eq("region", "east").read())
        .await
        .unwrap_err();
    assert!(matches!(err, sqlqb::QbError::TooManyRows { expected: 1, got: 3 }));

    let err = qb::table("sales").eq("id", 999).read().fetch_one(&pool).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn insert_reports_generated_id() {
    let pool = setup().await;

    let done = qb::table("sales")
        .add("region", "west")
        .add("amount", 3)
        .insert()
        .execute_write(&pool)
        .await
        .unwrap();
    assert_eq!(
        done,
        WriteResult {
            rows_affected: 1,
            last_insert_id: Some(7),
        }
    );

    let rows = qb::table("sales")
        .add("region", "west")
        .add("amount", 4)
        .insert()
        .exec(&pool)
        .await
        .unwrap();
    assert_eq!(rows.row_count(), 1);
    assert_eq!(rows.last_insert_id(), Some(8));
}

#[tokio::test]
async fn driver_errors_carry_the_statement() {
    let pool = setup().await;

    let err = qb::table("missing")
        .eq("id", 5)
        .read()
        .fetch_all(&pool)
        .await
        .unwrap_err();
    assert!(matches!(err, QbError::Statement { .. }));
    assert_eq!(err.sql(), Some("SELECT * FROM missing WHERE id = 5;"));
    assert!(err.to_string().contains("[SQL: SELECT * FROM missing WHERE id = 5;]"));

    let err = qb::table("sales")
        .add("nope", "x")
        .insert()
        .execute(&pool)
        .await
        .unwrap_err();
    assert_eq!(err.sql(), Some("INSERT INTO sales (nope) VALUES ('x');"));
}

#[tokio::test]
async fn instrumented_pool_counts_statements() {
    let pool = setup().await;
    let stats = Arc::new(StatsMonitor::new());
    let client = InstrumentedClient::new(pool)
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor_arc(stats.clone());

    qb::table("sales").read().fetch_all(&client).await.unwrap();
    qb::table("sales").add("region", "x").add("amount", 0).insert().execute(&client).await.unwrap();
    qb::table("sales").eq("region", "x").delete().execute(&client).await.unwrap();

    let snapshot = stats.stats();
    assert_eq!(snapshot.total_queries, 3);
    assert_eq!(snapshot.select_count, 1);
    assert_eq!(snapshot.insert_count, 1);
    assert_eq!(snapshot.delete_count, 1);
    assert_eq!(snapshot.failed_queries, 0);
}
