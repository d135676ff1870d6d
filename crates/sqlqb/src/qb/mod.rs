//! Fluent statement builder.
//!
//! One [`QueryBuilder`] accumulates the intent for a single statement; a
//! terminal method renders it into an immutable [`Query`](crate::Query) whose
//! `?` placeholders line up, left to right, with its parameter list.
//!
//! # Usage
//!
//! ```ignore
//! use sqlqb::{params, qb};
//!
//! // SELECT
//! let q = qb::table("users u")
//!     .select_cols(&["u.id", "u.name"])
//!     .left_join("teams t", "t.id = u.team_id")
//!     .eq("u.status", "active")
//!     .group_start()
//!     .gt("u.age", 18)
//!     .or_where_in("u.role", ["admin", "owner"])
//!     .group_end()
//!     .order_desc("u.created_at")
//!     .limit(20)
//!     .read();
//! // SELECT u.id, u.name FROM users u LEFT JOIN teams t ON t.id = u.team_id
//! //   WHERE u.status = ? AND (u.age > ? OR u.role IN (?,?)) ORDER BY u.created_at DESC LIMIT 20;
//!
//! // INSERT
//! let q = qb::table("users").add("name", "alice").add_raw("created_at", "NOW()").insert();
//!
//! // UPDATE
//! let q = qb::table("users").add("status", "inactive").increment("version", 1).eq("id", 7).update();
//!
//! // DELETE
//! let q = qb::table("sessions").lt("expires_at", now).delete();
//!
//! // Hand-written
//! let q = sqlqb::query("SELECT * FROM users WHERE id = ?").bind(7);
//! ```

mod auto;
mod builder;
mod delete;
mod insert;
mod param;
mod predicate;
mod select;
mod update;

pub use auto::{parse_auto_column, AutoColumn, Operand};
pub use builder::{Direction, JoinKind, QueryBuilder, SetField};
pub use param::ParamList;
pub use predicate::{Keyword, Predicate};

/// Create a builder over a table or FROM expression.
///
/// # Example
/// ```ignore
/// let q = sqlqb::qb::table("users").eq("id", 1).read();
/// ```
pub fn table(from: &str) -> QueryBuilder {
    QueryBuilder::new(from)
}

/// Build a compiled query from hand-written SQL using `?` placeholders.
pub fn query(sql: impl Into<String>) -> crate::Query {
    crate::query(sql)
}
