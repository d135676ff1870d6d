//! Executing built statements through the SQLite driver, with monitoring.
//!
//! Run with: cargo run --example sqlite_driver -p sqlqb

use sqlqb::{
    create_sqlite_pool, qb, query, FromRow, InstrumentedClient, MonitorConfig, PoolConfig,
    QbResult, Row, StatsMonitor, TracingSqlHook, Value,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
#[allow(dead_code)]
struct Product {
    id: i64,
    name: String,
    price: f64,
    tag: Option<String>,
}

impl FromRow for Product {
    fn from_row(row: &Row) -> QbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            tag: row.try_get("tag")?,
        })
    }
}

#[tokio::main]
async fn main() -> QbResult<()> {
    let pool = create_sqlite_pool("sqlite::memory:", &PoolConfig::new().max_connections(1)).await?;

    let stats = Arc::new(StatsMonitor::new());
    let db = InstrumentedClient::new(pool)
        .with_config(
            MonitorConfig::new()
                .with_query_timeout(Duration::from_secs(5))
                .with_slow_query_threshold(Duration::from_millis(50))
                .enable_monitoring(),
        )
        .with_monitor_arc(stats.clone())
        .add_hook(TracingSqlHook::new());

    query(
        "CREATE TABLE products (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            price REAL NOT NULL,
            tag TEXT
        )",
    )
    .execute(&db)
    .await?;

    let inserted = qb::table("products")
        .insert_all([
            vec![("name", Value::from("kettle")), ("price", Value::from(24.5)), ("tag", Value::from("kitchen"))],
            vec![("name", Value::from("lamp")), ("price", Value::from(12.0)), ("tag", Value::Null)],
            vec![("name", Value::from("mug")), ("price", Value::from(4.25)), ("tag", Value::from("kitchen"))],
        ])
        .execute(&db)
        .await?;
    println!("inserted {inserted} products");

    let kitchen: Vec<Product> = qb::table("products")
        .eq("tag", "kitchen")
        .order_asc("price")
        .read()
        .fetch_all_as(&db)
        .await?;
    println!("kitchen: {kitchen:?}");

    let (untagged,): (i64,) = qb::table("products")
        .eq("tag", None::<String>)
        .count()
        .fetch_one_as(&db)
        .await?;
    println!("untagged: {untagged}");

    let changed = qb::table("products")
        .add("tag", "sale")
        .lt("price", 15.0)
        .update()
        .execute(&db)
        .await?;
    println!("tagged {changed} products for sale");

    let mut cursor = qb::table("products").select_cols(&["name", "tag"]).read().exec(&db).await?;
    println!("{} rows:", cursor.row_count());
    for row in cursor.by_ref() {
        println!("  {}", row.to_json()?);
    }

    println!("{:#?}", stats.stats());
    Ok(())
}
