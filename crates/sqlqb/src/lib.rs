//! # sqlqb
//!
//! A fluent MySQL-style query builder for Rust.
//!
//! ## Features
//!
//! - **Placeholder aligned**: every rendered statement uses `?` placeholders whose
//!   left-to-right order matches its parameter list exactly
//! - **One builder, many statements**: the same [`QueryBuilder`] renders SELECT,
//!   COUNT, INSERT / INSERT IGNORE / REPLACE, batch inserts, UPDATE and DELETE
//! - **Nested groups**: `group_start` / `group_end` produce parenthesised AND/OR
//!   trees; unbalanced groups are auto-closed, empty ones vanish
//! - **Driver agnostic**: execution goes through [`GenericClient`], implemented
//!   for `sqlx` SQLite and MySQL pools
//! - **Query monitoring**: timing, hooks, timeouts and `tracing` output via
//!   [`InstrumentedClient`]
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use sqlqb::{params, qb};
//!
//! // SELECT
//! let users: Vec<User> = qb::table("users")
//!     .eq("status", "active")
//!     .where_raw("created_at > NOW() - INTERVAL ? DAY", params![7])
//!     .order_desc("created_at")
//!     .limit(10)
//!     .read()
//!     .fetch_all_as(&pool)
//!     .await?;
//!
//! // INSERT
//! qb::table("users")
//!     .add("username", "alice")
//!     .add("email", "alice@example.com")
//!     .insert()
//!     .execute(&pool)
//!     .await?;
//!
//! // UPDATE
//! qb::table("users")
//!     .add("status", "inactive")
//!     .eq("id", user_id)
//!     .update()
//!     .execute(&pool)
//!     .await?;
//!
//! // DELETE
//! qb::table("users")
//!     .eq("id", user_id)
//!     .delete()
//!     .execute(&pool)
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod monitor;
pub mod qb;
pub mod query;
pub mod row;
pub mod value;

#[cfg(any(feature = "sqlite", feature = "mysql"))]
pub mod pool;

pub use client::{GenericClient, Rows, WriteResult};
pub use config::{MonitorConfig, PoolConfig};
pub use error::{QbError, QbResult};
pub use monitor::{
    CompositeHook, CompositeMonitor, HookAction, InstrumentedClient, NoopMonitor, QueryContext,
    QueryHook, QueryMonitor, QueryResult, QueryStats, QueryType, StatsMonitor,
};
pub use query::{query, Query};
pub use row::{FromRow, Row};
pub use value::{FromValue, Value};

// Re-export the builder entry points
pub use qb::{table, Direction, JoinKind, Keyword, Operand, QueryBuilder};

#[cfg(feature = "tracing")]
pub use monitor::TracingSqlHook;

#[cfg(feature = "sqlite")]
pub use pool::create_sqlite_pool;

#[cfg(feature = "mysql")]
pub use pool::create_mysql_pool;

/// Build a `Vec<Value>` from heterogeneous values, for `where_raw` / `having`.
///
/// ```ignore
/// let q = sqlqb::qb::table("t").where_raw("a BETWEEN ? AND ?", sqlqb::params![1, 10]).read();
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}
