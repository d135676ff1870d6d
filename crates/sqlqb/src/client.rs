//! Generic client trait for unified database access.

use crate::error::{QbError, QbResult};
use crate::monitor::QueryType;
use crate::query::Query;
use crate::row::Row;
use std::collections::VecDeque;

/// A trait that unifies database handles.
///
/// Drivers receive the compiled statement and its ordered parameters; the
/// builder never talks to a connection directly. Implemented for sqlx pools
/// behind the `sqlite` / `mysql` features, and by
/// [`InstrumentedClient`](crate::monitor::InstrumentedClient).
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(&self, query: &Query) -> impl std::future::Future<Output = QbResult<Vec<Row>>> + Send;

    /// Execute a query and return all rows, associating a tag for monitoring/observability.
    ///
    /// The default implementation ignores `tag` and calls [`GenericClient::query`].
    fn query_tagged(
        &self,
        tag: &str,
        query: &Query,
    ) -> impl std::future::Future<Output = QbResult<Vec<Row>>> + Send {
        let _ = tag;
        self.query(query)
    }

    /// Execute a query and require that it returns **exactly one** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`QbError::NotFound`]
    /// - 1 row: returns that row
    /// - multiple rows: returns [`QbError::TooManyRows`]
    fn query_one_strict(
        &self,
        query: &Query,
    ) -> impl std::future::Future<Output = QbResult<Row>> + Send {
        async move {
            let mut rows = self.query(query).await?;
            match rows.len() {
                0 => Err(QbError::not_found("Expected 1 row, got 0")),
                1 => rows.pop().ok_or_else(|| QbError::not_found("Expected 1 row, got 0")),
                got => Err(QbError::too_many_rows(1, got)),
            }
        }
    }

    /// Execute a statement and return the number of affected rows.
    fn execute(&self, query: &Query) -> impl std::future::Future<Output = QbResult<u64>> + Send;

    /// Execute a statement and return the number of affected rows, associating a tag for monitoring/observability.
    ///
    /// The default implementation ignores `tag` and calls [`GenericClient::execute`].
    fn execute_tagged(
        &self,
        tag: &str,
        query: &Query,
    ) -> impl std::future::Future<Output = QbResult<u64>> + Send {
        let _ = tag;
        self.execute(query)
    }

    /// Execute a statement and return the affected count plus the id it generated.
    ///
    /// The default implementation calls [`GenericClient::execute`] and reports no id.
    fn execute_write(
        &self,
        query: &Query,
    ) -> impl std::future::Future<Output = QbResult<WriteResult>> + Send {
        async move {
            let rows_affected = self.execute(query).await?;
            Ok(WriteResult {
                rows_affected,
                last_insert_id: None,
            })
        }
    }

    /// Run any statement and return a cursor over its outcome.
    ///
    /// Reads (`SELECT`, `SHOW`, ...) go through [`GenericClient::query`];
    /// everything else through [`GenericClient::execute`]. The empty query
    /// yields an empty cursor without touching the database.
    fn exec(&self, query: &Query) -> impl std::future::Future<Output = QbResult<Rows>> + Send {
        async move {
            if query.is_empty() {
                return Ok(Rows::default());
            }
            if QueryType::from_sql(query.statement()).returns_rows() {
                Ok(Rows::from_rows(self.query(query).await?))
            } else {
                Ok(Rows::written(self.execute_write(query).await?))
            }
        }
    }
}

impl<T: GenericClient> GenericClient for &T {
    fn query(&self, query: &Query) -> impl std::future::Future<Output = QbResult<Vec<Row>>> + Send {
        (**self).query(query)
    }

    fn query_tagged(
        &self,
        tag: &str,
        query: &Query,
    ) -> impl std::future::Future<Output = QbResult<Vec<Row>>> + Send {
        (**self).query_tagged(tag, query)
    }

    fn execute(&self, query: &Query) -> impl std::future::Future<Output = QbResult<u64>> + Send {
        (**self).execute(query)
    }

    fn execute_tagged(
        &self,
        tag: &str,
        query: &Query,
    ) -> impl std::future::Future<Output = QbResult<u64>> + Send {
        (**self).execute_tagged(tag, query)
    }

    fn execute_write(
        &self,
        query: &Query,
    ) -> impl std::future::Future<Output = QbResult<WriteResult>> + Send {
        (**self).execute_write(query)
    }
}

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteResult {
    pub rows_affected: u64,
    /// Id generated by the latest INSERT on the connection; `None` when the driver reports none.
    pub last_insert_id: Option<i64>,
}

// ==================== Result cursor ====================

/// Outcome of [`GenericClient::exec`].
///
/// Iterating yields the remaining rows in order. For write statements there
/// are no rows and [`Rows::row_count`] reports the affected count.
#[derive(Debug, Clone, Default)]
pub struct Rows {
    rows: VecDeque<Row>,
    row_count: u64,
    last_insert_id: Option<i64>,
}

impl Rows {
    /// Cursor over a fetched result set.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let row_count = rows.len() as u64;
        Self {
            rows: rows.into(),
            row_count,
            last_insert_id: None,
        }
    }

    /// Cursor for a write statement that touched `n` rows.
    pub fn affected(n: u64) -> Self {
        Self {
            rows: VecDeque::new(),
            row_count: n,
            last_insert_id: None,
        }
    }

    /// Cursor for a write statement, keeping the generated id.
    pub fn written(result: WriteResult) -> Self {
        Self {
            rows: VecDeque::new(),
            row_count: result.rows_affected,
            last_insert_id: result.last_insert_id,
        }
    }

    /// All remaining rows.
    pub fn all(self) -> Vec<Row> {
        self.rows.into()
    }

    /// The single remaining row, or `None` when there are zero or several.
    pub fn one(self) -> Option<Row> {
        if self.rows.len() == 1 {
            self.rows.into_iter().next()
        } else {
            None
        }
    }

    /// Rows returned by a read, or rows affected by a write.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Id generated by an INSERT, when the driver reported one.
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    /// Rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Iterator for Rows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.rows.len(), Some(self.rows.len()))
    }
}

// ==================== sqlx drivers ====================

/// Generates the value binding, row decoding and `GenericClient` impl for one
/// sqlx backend.
#[cfg(any(feature = "sqlite", feature = "mysql"))]
macro_rules! sqlx_client {
    ($module:ident, $db:ty, $pool:ty, $row:ty, $decode_native:ident, $insert_id:ident) => {
        mod $module {
            use super::{GenericClient, WriteResult};
            use crate::error::{QbError, QbResult};
            use crate::query::Query;
            use crate::row::Row;
            use crate::value::Value;
            use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
            use sqlx::{Column as _, Row as _, TypeInfo as _, ValueRef as _};
            use std::sync::Arc;

            type SqlxQuery<'q> =
                sqlx::query::Query<'q, $db, <$db as sqlx::Database>::Arguments<'q>>;

            fn bind_value<'q>(query: SqlxQuery<'q>, value: &'q Value) -> SqlxQuery<'q> {
                match value {
                    Value::Null => query.bind(None::<i64>),
                    Value::Bool(b) => query.bind(*b),
                    Value::Int(i) => query.bind(*i),
                    Value::Float(f) => query.bind(*f),
                    Value::Text(s) => query.bind(s.as_str()),
                    Value::Bytes(b) => query.bind(b.as_slice()),
                }
            }

            fn prepare(query: &Query) -> SqlxQuery<'_> {
                query
                    .params()
                    .iter()
                    .fold(sqlx::query::<$db>(query.statement_body()), bind_value)
            }

            fn decode_value(row: &$row, idx: usize) -> QbResult<Value> {
                let raw = row.try_get_raw(idx)?;
                if raw.is_null() {
                    return Ok(Value::Null);
                }
                let type_name = raw.type_info().name().to_owned();
                if let Some(v) = super::$decode_native(row, idx, &type_name)? {
                    return Ok(v);
                }
                if let Ok(v) = row.try_get::<i64, _>(idx) {
                    return Ok(Value::Int(v));
                }
                if let Ok(v) = row.try_get::<bool, _>(idx) {
                    return Ok(Value::Bool(v));
                }
                if let Ok(v) = row.try_get::<f64, _>(idx) {
                    return Ok(Value::Float(v));
                }
                if let Ok(v) = row.try_get::<String, _>(idx) {
                    return Ok(Value::Text(v));
                }
                if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
                    return Ok(Value::Bytes(v));
                }
                if let Ok(v) = row.try_get::<NaiveDateTime, _>(idx) {
                    return Ok(Value::from(v));
                }
                if let Ok(v) = row.try_get::<NaiveDate, _>(idx) {
                    return Ok(Value::from(v));
                }
                if let Ok(v) = row.try_get::<NaiveTime, _>(idx) {
                    return Ok(Value::from(v));
                }
                let column = &row.columns()[idx];
                Err(QbError::decode(
                    column.name(),
                    format!("unsupported column type {}", column.type_info().name()),
                ))
            }

            fn convert_rows(rows: &[$row]) -> QbResult<Vec<Row>> {
                let Some(first) = rows.first() else {
                    return Ok(Vec::new());
                };
                let columns: Arc<[String]> = first
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect();
                rows.iter()
                    .map(|row| {
                        let values = (0..columns.len())
                            .map(|idx| decode_value(row, idx))
                            .collect::<QbResult<Vec<_>>>()?;
                        Ok(Row::new(Arc::clone(&columns), values))
                    })
                    .collect()
            }

            impl GenericClient for $pool {
                async fn query(&self, query: &Query) -> QbResult<Vec<Row>> {
                    if query.is_empty() {
                        return Ok(Vec::new());
                    }
                    let rows = prepare(query)
                        .fetch_all(self)
                        .await
                        .map_err(|e| QbError::statement(e, query))?;
                    convert_rows(&rows)
                }

                async fn execute(&self, query: &Query) -> QbResult<u64> {
                    Ok(self.execute_write(query).await?.rows_affected)
                }

                async fn execute_write(&self, query: &Query) -> QbResult<WriteResult> {
                    if query.is_empty() {
                        return Ok(WriteResult::default());
                    }
                    let done = prepare(query)
                        .execute(self)
                        .await
                        .map_err(|e| QbError::statement(e, query))?;
                    Ok(WriteResult {
                        rows_affected: done.rows_affected(),
                        last_insert_id: super::$insert_id(&done),
                    })
                }
            }
        }
    };
}

/// MySQL column types without a lossless native decode; their text form is kept.
#[cfg_attr(not(feature = "mysql"), allow(dead_code))]
pub(crate) fn decodes_as_text(type_name: &str) -> bool {
    matches!(type_name, "DECIMAL" | "NUMERIC" | "JSON")
}

/// `INT UNSIGNED`, `BIGINT UNSIGNED`, ...
#[cfg_attr(not(feature = "mysql"), allow(dead_code))]
pub(crate) fn is_unsigned_int(type_name: &str) -> bool {
    type_name.ends_with(" UNSIGNED") && type_name.contains("INT")
}

// SQLite values carry their storage class, which the generic decode order covers.
#[cfg(feature = "sqlite")]
fn sqlite_decode_native(
    _row: &sqlx::sqlite::SqliteRow,
    _idx: usize,
    _type_name: &str,
) -> QbResult<Option<crate::value::Value>> {
    Ok(None)
}

#[cfg(feature = "sqlite")]
fn sqlite_insert_id(done: &sqlx::sqlite::SqliteQueryResult) -> Option<i64> {
    Some(done.last_insert_rowid()).filter(|id| *id != 0)
}

// Unsigned integers must be read before `bool`, which accepts any integer column.
#[cfg(feature = "mysql")]
fn mysql_decode_native(
    row: &sqlx::mysql::MySqlRow,
    idx: usize,
    type_name: &str,
) -> QbResult<Option<crate::value::Value>> {
    use crate::value::Value;
    use sqlx::Row as _;

    if decodes_as_text(type_name) {
        return Ok(Some(Value::Text(row.try_get_unchecked::<String, _>(idx)?)));
    }
    if is_unsigned_int(type_name) {
        return Ok(Some(Value::from(row.try_get::<u64, _>(idx)?)));
    }
    Ok(None)
}

#[cfg(feature = "mysql")]
fn mysql_insert_id(done: &sqlx::mysql::MySqlQueryResult) -> Option<i64> {
    i64::try_from(done.last_insert_id()).ok().filter(|id| *id != 0)
}

#[cfg(feature = "sqlite")]
sqlx_client!(
    sqlite,
    sqlx::Sqlite,
    sqlx::SqlitePool,
    sqlx::sqlite::SqliteRow,
    sqlite_decode_native,
    sqlite_insert_id
);

#[cfg(feature = "mysql")]
sqlx_client!(
    mysql,
    sqlx::MySql,
    sqlx::MySqlPool,
    sqlx::mysql::MySqlRow,
    mysql_decode_native,
    mysql_insert_id
);
