//! INSERT / INSERT IGNORE / REPLACE rendering, single-row and batch.

use crate::error::{QbError, QbResult};
use crate::qb::builder::{QueryBuilder, SetField};
use crate::qb::predicate::placeholders;
use crate::query::Query;
use crate::value::Value;

/// Statement verb for row-writing statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InsertMode {
    Insert,
    InsertIgnore,
    Replace,
}

impl InsertMode {
    fn as_sql(self) -> &'static str {
        match self {
            InsertMode::Insert => "INSERT INTO",
            InsertMode::InsertIgnore => "INSERT IGNORE INTO",
            InsertMode::Replace => "REPLACE INTO",
        }
    }
}

/// One batch row: column names in row order plus their values.
struct BatchRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl QueryBuilder {
    /// Render `INSERT INTO <from> (cols) VALUES (...)` from the write columns.
    ///
    /// Parameterized columns come first, then raw columns; only the former bind values.
    pub fn insert(&self) -> Query {
        self.build_insert(InsertMode::Insert)
    }

    /// `INSERT IGNORE` variant of [`insert`](Self::insert).
    pub fn insert_ignore(&self) -> Query {
        self.build_insert(InsertMode::InsertIgnore)
    }

    /// `REPLACE` variant of [`insert`](Self::insert).
    pub fn replace(&self) -> Query {
        self.build_insert(InsertMode::Replace)
    }

    /// Batch insert. Columns come from the first row, in that row's order; an
    /// empty input renders the empty query.
    ///
    /// Later rows are not checked against the first one (each row still gets
    /// one placeholder per value it carries). Use [`try_insert_all`](Self::try_insert_all)
    /// to reject mismatched rows.
    ///
    /// ```ignore
    /// let q = qb::table("points").insert_all([
    ///     vec![("x", 1), ("y", 2)],
    ///     vec![("x", 3), ("y", 4)],
    /// ]);
    /// // INSERT INTO points (x, y) VALUES (?,?),(?,?);  params [1, 2, 3, 4]
    /// ```
    pub fn insert_all<R, K, V>(&self, rows: impl IntoIterator<Item = R>) -> Query
    where
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.build_batch(InsertMode::Insert, collect_batch(rows))
    }

    /// `INSERT IGNORE` variant of [`insert_all`](Self::insert_all).
    pub fn insert_all_ignore<R, K, V>(&self, rows: impl IntoIterator<Item = R>) -> Query
    where
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.build_batch(InsertMode::InsertIgnore, collect_batch(rows))
    }

    /// `REPLACE` variant of [`insert_all`](Self::insert_all).
    pub fn replace_all<R, K, V>(&self, rows: impl IntoIterator<Item = R>) -> Query
    where
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.build_batch(InsertMode::Replace, collect_batch(rows))
    }

    /// Like [`insert_all`](Self::insert_all), but every row must carry exactly
    /// the first row's columns in the same order.
    pub fn try_insert_all<R, K, V>(&self, rows: impl IntoIterator<Item = R>) -> QbResult<Query>
    where
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let rows = collect_batch(rows);
        validate_batch(&rows)?;
        Ok(self.build_batch(InsertMode::Insert, rows))
    }

    /// Validated `INSERT IGNORE` batch.
    pub fn try_insert_all_ignore<R, K, V>(&self, rows: impl IntoIterator<Item = R>) -> QbResult<Query>
    where
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let rows = collect_batch(rows);
        validate_batch(&rows)?;
        Ok(self.build_batch(InsertMode::InsertIgnore, rows))
    }

    /// Validated `REPLACE` batch.
    pub fn try_replace_all<R, K, V>(&self, rows: impl IntoIterator<Item = R>) -> QbResult<Query>
    where
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let rows = collect_batch(rows);
        validate_batch(&rows)?;
        Ok(self.build_batch(InsertMode::Replace, rows))
    }

    fn build_insert(&self, mode: InsertMode) -> Query {
        let mut columns = Vec::with_capacity(self.fields.len());
        let mut exprs = Vec::with_capacity(self.fields.len());
        let mut params = Vec::new();

        for (column, field) in &self.fields {
            if let SetField::Value(v) = field {
                columns.push(column.as_str());
                exprs.push("?");
                params.push(v.clone());
            }
        }
        for (column, field) in &self.fields {
            if let SetField::Raw(sql) = field {
                columns.push(column.as_str());
                exprs.push(sql.as_str());
            }
        }

        let sql = format!(
            "{} {} ({}) VALUES ({})",
            mode.as_sql(),
            self.from,
            columns.join(", "),
            exprs.join(", ")
        );
        Query::new(sql, params)
    }

    fn build_batch(&self, mode: InsertMode, rows: Vec<BatchRow>) -> Query {
        let Some(first) = rows.first() else {
            return Query::empty();
        };
        if first.columns.is_empty() {
            return Query::empty();
        }

        let tuples = rows
            .iter()
            .map(|row| format!("({})", placeholders(row.values.len())))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "{} {} ({}) VALUES {tuples}",
            mode.as_sql(),
            self.from,
            first.columns.join(", ")
        );
        let params = rows.into_iter().flat_map(|row| row.values).collect();
        Query::new(sql, params)
    }
}

fn collect_batch<R, K, V>(rows: impl IntoIterator<Item = R>) -> Vec<BatchRow>
where
    R: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    rows.into_iter()
        .map(|row| {
            let (columns, values): (Vec<String>, Vec<Value>) = row.into_iter().map(|(k, v)| (k.into(), v.into())).unzip();
            BatchRow { columns, values }
        })
        .collect()
}

fn validate_batch(rows: &[BatchRow]) -> QbResult<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    for (idx, row) in rows.iter().enumerate().skip(1) {
        if row.columns != first.columns {
            return Err(QbError::validation(format!(
                "batch row {idx} has columns ({}), expected ({})",
                row.columns.join(", "),
                first.columns.join(", ")
            )));
        }
    }
    Ok(())
}
