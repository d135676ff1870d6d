//! Compiled queries: statement text plus ordered parameters.

use crate::client::{GenericClient, Rows, WriteResult};
use crate::error::{QbError, QbResult};
use crate::row::{FromRow, Row};
use crate::value::Value;
use std::fmt;

/// An immutable compiled statement.
///
/// Non-empty statements are trimmed and end with exactly one `;`. The number
/// of `?` placeholders equals `params().len()` for everything a builder renders.
///
/// # Example
///
/// ```ignore
/// use sqlqb::query;
///
/// let user: User = query("SELECT * FROM users WHERE id = ?")
///     .bind(user_id)
///     .fetch_one_as(&pool)
///     .await?;
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    statement: String,
    params: Vec<Value>,
}

/// Create a new query with the given SQL
pub fn query(sql: impl Into<String>) -> Query {
    Query::new(sql, Vec::new())
}

impl Query {
    /// Build a query, normalizing the statement terminator.
    pub fn new(statement: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            statement: normalize(&statement.into()),
            params,
        }
    }

    /// The no-op query (empty statement, no params).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.statement.is_empty()
    }

    /// Bind a parameter to the next placeholder
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Statement text including the trailing `;`.
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Statement text without the trailing `;` (for embedding).
    pub fn statement_body(&self) -> &str {
        self.statement.strip_suffix(';').unwrap_or(&self.statement)
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.statement, self.params)
    }

    /// `<self> UNION <other>`, params concatenated in the same order.
    pub fn union(&self, other: &Query) -> Query {
        self.combine(other, "UNION")
    }

    /// `<self> UNION ALL <other>`.
    pub fn union_all(&self, other: &Query) -> Query {
        self.combine(other, "UNION ALL")
    }

    fn combine(&self, other: &Query, op: &str) -> Query {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let statement = format!("{} {op} {}", self.statement_body(), other.statement_body());
        let mut params = Vec::with_capacity(self.params.len() + other.params.len());
        params.extend_from_slice(&self.params);
        params.extend_from_slice(&other.params);
        Query::new(statement, params)
    }

    /// Statement with placeholders replaced by literal parameter values.
    ///
    /// For logs only; never execute the result.
    pub fn to_debug_sql(&self) -> String {
        let mut out = String::with_capacity(self.statement.len() + self.params.len() * 8);
        let mut values = self.params.iter();
        for ch in self.statement.chars() {
            match (ch, ch == '?') {
                (_, true) => match values.next() {
                    Some(v) => out.push_str(&v.to_string()),
                    None => out.push('?'),
                },
                (c, false) => out.push(c),
            }
        }
        out
    }

    // ==================== Execution ====================

    /// Execute the query and return all rows
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> QbResult<Vec<Row>> {
        conn.query(self).await
    }

    /// Execute the query and return all rows mapped to type T
    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> QbResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute the query and return the first row, failing when there is none
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> QbResult<Row> {
        self.fetch_opt(conn)
            .await?
            .ok_or_else(|| QbError::not_found("query returned no rows"))
    }

    /// Execute the query and return the first row mapped to type T
    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> QbResult<T> {
        let row = self.fetch_one(conn).await?;
        T::from_row(&row)
    }

    /// Execute the query and return at most one row
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> QbResult<Option<Row>> {
        let rows = self.fetch_all(conn).await?;
        Ok(rows.into_iter().next())
    }

    /// Execute the query and return at most one row mapped to type T
    pub async fn fetch_opt_as<T: FromRow>(&self, conn: &impl GenericClient) -> QbResult<Option<T>> {
        let row = self.fetch_opt(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute the query and return the number of affected rows
    pub async fn execute(&self, conn: &impl GenericClient) -> QbResult<u64> {
        conn.execute(self).await
    }

    /// Execute the query and return the affected count plus the generated id
    pub async fn execute_write(&self, conn: &impl GenericClient) -> QbResult<WriteResult> {
        conn.execute_write(self).await
    }

    /// Execute the query and return a cursor (rows for reads, affected count for writes)
    pub async fn exec(&self, conn: &impl GenericClient) -> QbResult<Rows> {
        conn.exec(self).await
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_debug_sql())
    }
}

fn normalize(statement: &str) -> String {
    let body = statement.trim().trim_end_matches([';', ' ', '\t', '\r', '\n']);
    if body.is_empty() {
        String::new()
    } else {
        format!("{body};")
    }
}
