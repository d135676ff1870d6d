//! Builder state and accumulation methods.
//!
//! Terminal methods live next to the statement they render
//! (`select.rs`, `insert.rs`, `update.rs`, `delete.rs`).

use crate::error::QbResult;
use crate::qb::auto::Operand;
use crate::qb::param::ParamList;
use crate::qb::predicate::{Keyword, Predicate};
use crate::query::Query;
use crate::value::Value;

/// JOIN flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Join {
    kind: JoinKind,
    table: String,
    on: String,
}

/// ORDER BY direction; `None` leaves the database default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    None,
    Asc,
    Desc,
}

/// Write-column value.
#[derive(Clone, Debug, PartialEq)]
pub enum SetField {
    /// Parameterized value
    Value(Value),
    /// Raw SQL expression
    Raw(String),
}

/// Fluent builder for one SELECT/INSERT/UPDATE/DELETE/REPLACE statement.
///
/// Accumulation methods consume and return the builder; terminal methods
/// (`read`, `count`, `insert`, `update`, `delete`, ...) borrow it and render a
/// [`Query`] without touching the accumulated state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuilder {
    /// Table or FROM expression
    pub(crate) from: String,
    pub(crate) select_cols: Vec<String>,
    pub(crate) distinct: bool,
    pub(crate) joins: Vec<Join>,
    pub(crate) where_pred: Predicate,
    pub(crate) group_by: Vec<String>,
    pub(crate) having_pred: Predicate,
    pub(crate) order_by: Vec<(String, Direction)>,
    /// 0 = no LIMIT
    pub(crate) limit: u64,
    pub(crate) offset: u64,
    /// INSERT/UPDATE columns in call order
    pub(crate) fields: Vec<(String, SetField)>,
}

impl QueryBuilder {
    /// Create a builder over a table or FROM expression (`"users u"`, a sub-query, ...).
    pub fn new(from: &str) -> Self {
        Self {
            from: from.to_string(),
            ..Self::default()
        }
    }

    /// The FROM expression.
    pub fn from_expr(&self) -> &str {
        &self.from
    }

    /// Number of `group_end`/`having_group_end` calls ignored because no group was open.
    pub fn unbalanced_group_ends(&self) -> usize {
        self.where_pred.ignored_closes() + self.having_pred.ignored_closes()
    }

    // ==================== SELECT columns ====================

    /// Append one SELECT column expression.
    pub fn select(mut self, col: &str) -> Self {
        self.select_cols.push(col.to_string());
        self
    }

    /// Append several SELECT column expressions.
    pub fn select_cols(mut self, cols: &[&str]) -> Self {
        self.select_cols.extend(cols.iter().map(|c| c.to_string()));
        self
    }

    /// Emit `SELECT DISTINCT`.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ==================== JOIN ====================

    /// Add INNER JOIN.
    pub fn inner_join(mut self, table: &str, on: &str) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Inner,
            table: table.to_string(),
            on: on.to_string(),
        });
        self
    }

    /// Alias for `inner_join`.
    pub fn join(self, table: &str, on: &str) -> Self {
        self.inner_join(table, on)
    }

    /// Add LEFT JOIN.
    pub fn left_join(mut self, table: &str, on: &str) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Left,
            table: table.to_string(),
            on: on.to_string(),
        });
        self
    }

    /// Add RIGHT JOIN.
    pub fn right_join(mut self, table: &str, on: &str) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Right,
            table: table.to_string(),
            on: on.to_string(),
        });
        self
    }

    // ==================== WHERE conditions ====================

    /// Add WHERE: column = value (`IS NULL` for a null value)
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::And, column, "=", value.into());
        self
    }

    /// OR column = value
    pub fn or_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::Or, column, "=", value.into());
        self
    }

    /// Add WHERE: column <> value (`IS NOT NULL` for a null value)
    pub fn not_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::And, column, "<>", value.into());
        self
    }

    /// OR column <> value
    pub fn or_not_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::Or, column, "<>", value.into());
        self
    }

    /// Add WHERE: column > value
    pub fn gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::And, column, ">", value.into());
        self
    }

    pub fn or_gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::Or, column, ">", value.into());
        self
    }

    /// Add WHERE: column < value
    pub fn lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::And, column, "<", value.into());
        self
    }

    pub fn or_lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::Or, column, "<", value.into());
        self
    }

    /// Add WHERE: column >= value
    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::And, column, ">=", value.into());
        self
    }

    pub fn or_gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::Or, column, ">=", value.into());
        self
    }

    /// Add WHERE: column <= value
    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::And, column, "<=", value.into());
        self
    }

    pub fn or_lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::Or, column, "<=", value.into());
        self
    }

    /// Add WHERE: column LIKE pattern
    pub fn like(mut self, column: &str, pattern: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::And, column, "LIKE", pattern.into());
        self
    }

    pub fn or_like(mut self, column: &str, pattern: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::Or, column, "LIKE", pattern.into());
        self
    }

    /// Add WHERE: column NOT LIKE pattern
    pub fn not_like(mut self, column: &str, pattern: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::And, column, "NOT LIKE", pattern.into());
        self
    }

    pub fn or_not_like(mut self, column: &str, pattern: impl Into<Value>) -> Self {
        self.where_pred.compare(Keyword::Or, column, "NOT LIKE", pattern.into());
        self
    }

    /// Add WHERE: column IS NULL
    pub fn is_null(mut self, column: &str) -> Self {
        self.where_pred.is_null(Keyword::And, column);
        self
    }

    pub fn or_is_null(mut self, column: &str) -> Self {
        self.where_pred.is_null(Keyword::Or, column);
        self
    }

    /// Add WHERE: column IS NOT NULL
    pub fn is_not_null(mut self, column: &str) -> Self {
        self.where_pred.is_not_null(Keyword::And, column);
        self
    }

    pub fn or_is_not_null(mut self, column: &str) -> Self {
        self.where_pred.is_not_null(Keyword::Or, column);
        self
    }

    /// Add a raw WHERE condition; `sql` carries one `?` per value.
    ///
    /// ```ignore
    /// qb::table("users").where_raw("score BETWEEN ? AND ?", params![10, 20]);
    /// ```
    pub fn where_raw(mut self, sql: &str, values: Vec<Value>) -> Self {
        self.where_pred.push(Keyword::And, sql, values);
        self
    }

    pub fn or_where_raw(mut self, sql: &str, values: Vec<Value>) -> Self {
        self.where_pred.push(Keyword::Or, sql, values);
        self
    }

    /// Add a condition from a `[AND|OR] <column> [<operator>]` spec, inferring
    /// `IN` / `IS NULL` forms from the operand.
    ///
    /// ```ignore
    /// let qb = qb::table("users")
    ///     .where_auto("status", "active")?
    ///     .where_auto("or id !=", vec![1, 2])?;
    /// ```
    pub fn where_auto(mut self, spec: &str, operand: impl Into<Operand>) -> QbResult<Self> {
        self.where_pred.auto(spec, operand.into())?;
        Ok(self)
    }

    /// Apply `where_auto` to each `(spec, operand)` pair, stopping at the first error.
    pub fn where_auto_list<K, O>(mut self, pairs: impl IntoIterator<Item = (K, O)>) -> QbResult<Self>
    where
        K: AsRef<str>,
        O: Into<Operand>,
    {
        for (spec, operand) in pairs {
            self.where_pred.auto(spec.as_ref(), operand.into())?;
        }
        Ok(self)
    }

    // ==================== IN predicates ====================

    /// Add WHERE: column IN (values...). An empty list adds nothing.
    pub fn where_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.where_pred.in_list(Keyword::And, column, false, collect_values(values));
        self
    }

    pub fn or_where_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.where_pred.in_list(Keyword::Or, column, false, collect_values(values));
        self
    }

    /// Add WHERE: column NOT IN (values...). An empty list adds nothing.
    pub fn where_not_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.where_pred.in_list(Keyword::And, column, true, collect_values(values));
        self
    }

    pub fn or_where_not_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.where_pred.in_list(Keyword::Or, column, true, collect_values(values));
        self
    }

    /// Add WHERE: (c1,c2) IN ((?,?),(?,?)) with values flattened row by row.
    pub fn where_in_tuples<R, V>(mut self, columns: &[&str], rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_pred.in_tuples(Keyword::And, columns, false, collect_rows(rows));
        self
    }

    pub fn or_where_in_tuples<R, V>(mut self, columns: &[&str], rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_pred.in_tuples(Keyword::Or, columns, false, collect_rows(rows));
        self
    }

    pub fn where_not_in_tuples<R, V>(mut self, columns: &[&str], rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_pred.in_tuples(Keyword::And, columns, true, collect_rows(rows));
        self
    }

    pub fn or_where_not_in_tuples<R, V>(mut self, columns: &[&str], rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_pred.in_tuples(Keyword::Or, columns, true, collect_rows(rows));
        self
    }

    /// Add WHERE: column IN (<sub-query>). The sub-query's params are spliced in place.
    pub fn where_in_query(mut self, column: &str, inner: &Query) -> Self {
        self.where_pred.in_query(Keyword::And, column, false, inner);
        self
    }

    pub fn or_where_in_query(mut self, column: &str, inner: &Query) -> Self {
        self.where_pred.in_query(Keyword::Or, column, false, inner);
        self
    }

    pub fn where_not_in_query(mut self, column: &str, inner: &Query) -> Self {
        self.where_pred.in_query(Keyword::And, column, true, inner);
        self
    }

    pub fn or_where_not_in_query(mut self, column: &str, inner: &Query) -> Self {
        self.where_pred.in_query(Keyword::Or, column, true, inner);
        self
    }

    /// Match rows whose `fields` combination appears in one of `rows`.
    ///
    /// Each row is a set of `(column, value)` pairs; values are picked in
    /// `fields` order and a missing field binds NULL.
    pub fn where_in_multiple<R, K, V>(self, fields: &[&str], rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.in_multiple(Keyword::And, fields, rows)
    }

    pub fn or_where_in_multiple<R, K, V>(self, fields: &[&str], rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.in_multiple(Keyword::Or, fields, rows)
    }

    fn in_multiple<R, K, V>(mut self, keyword: Keyword, fields: &[&str], rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut pairs: Vec<(K, Value)> = row.into_iter().map(|(k, v)| (k, v.into())).collect();
                fields
                    .iter()
                    .map(|field| {
                        pairs
                            .iter_mut()
                            .find(|(k, _)| k.as_ref() == *field)
                            .map_or(Value::Null, |(_, v)| std::mem::replace(v, Value::Null))
                    })
                    .collect()
            })
            .collect();
        self.where_pred.in_tuples(keyword, fields, false, rows);
        self
    }

    // ==================== Groups ====================

    /// Open a WHERE group `(`.
    pub fn group_start(mut self) -> Self {
        self.where_pred.group_start(Keyword::And);
        self
    }

    /// Open a WHERE group joined with OR.
    pub fn or_group_start(mut self) -> Self {
        self.where_pred.group_start(Keyword::Or);
        self
    }

    /// Close the innermost WHERE group. Ignored when no group is open.
    pub fn group_end(mut self) -> Self {
        self.where_pred.group_end();
        self
    }

    // ==================== GROUP BY / HAVING ====================

    /// Append a GROUP BY expression.
    pub fn group_by(mut self, col: &str) -> Self {
        self.group_by.push(col.to_string());
        self
    }

    pub fn group_by_cols(mut self, cols: &[&str]) -> Self {
        self.group_by.extend(cols.iter().map(|c| c.to_string()));
        self
    }

    /// Add a raw HAVING condition; `sql` carries one `?` per value.
    pub fn having(mut self, sql: &str, values: Vec<Value>) -> Self {
        self.having_pred.push(Keyword::And, sql, values);
        self
    }

    pub fn or_having(mut self, sql: &str, values: Vec<Value>) -> Self {
        self.having_pred.push(Keyword::Or, sql, values);
        self
    }

    /// Add HAVING condition: column = value
    pub fn having_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.having_pred.compare(Keyword::And, column, "=", value.into());
        self
    }

    /// Add HAVING condition: column > value
    pub fn having_gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.having_pred.compare(Keyword::And, column, ">", value.into());
        self
    }

    /// Add HAVING condition: column >= value
    pub fn having_gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.having_pred.compare(Keyword::And, column, ">=", value.into());
        self
    }

    /// Add HAVING condition: column < value
    pub fn having_lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.having_pred.compare(Keyword::And, column, "<", value.into());
        self
    }

    /// Add HAVING condition: column <= value
    pub fn having_lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.having_pred.compare(Keyword::And, column, "<=", value.into());
        self
    }

    pub fn having_group_start(mut self) -> Self {
        self.having_pred.group_start(Keyword::And);
        self
    }

    pub fn or_having_group_start(mut self) -> Self {
        self.having_pred.group_start(Keyword::Or);
        self
    }

    pub fn having_group_end(mut self) -> Self {
        self.having_pred.group_end();
        self
    }

    // ==================== Ordering & Pagination ====================

    /// Add ORDER BY expression (no direction).
    pub fn order_by(mut self, col: &str) -> Self {
        self.order_by.push((col.to_string(), Direction::None));
        self
    }

    pub fn order_by_cols(mut self, cols: &[&str]) -> Self {
        self.order_by
            .extend(cols.iter().map(|c| (c.to_string(), Direction::None)));
        self
    }

    /// Add ORDER BY column ASC.
    pub fn order_asc(mut self, col: &str) -> Self {
        self.order_by.push((col.to_string(), Direction::Asc));
        self
    }

    pub fn order_asc_cols(mut self, cols: &[&str]) -> Self {
        self.order_by
            .extend(cols.iter().map(|c| (c.to_string(), Direction::Asc)));
        self
    }

    /// Add ORDER BY column DESC.
    pub fn order_desc(mut self, col: &str) -> Self {
        self.order_by.push((col.to_string(), Direction::Desc));
        self
    }

    pub fn order_desc_cols(mut self, cols: &[&str]) -> Self {
        self.order_by
            .extend(cols.iter().map(|c| (c.to_string(), Direction::Desc)));
        self
    }

    /// Set LIMIT. `0` removes the clause (and with it any OFFSET).
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = n;
        self
    }

    /// Set OFFSET (only rendered together with a LIMIT).
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = n;
        self
    }

    pub fn limit_offset(self, limit: u64, offset: u64) -> Self {
        self.limit(limit).offset(offset)
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    pub fn paginate(mut self, page: u64, per_page: u64) -> Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.limit = size;
        self.offset = (p - 1).saturating_mul(size);
        self
    }

    // ==================== Write columns ====================

    /// Set a column value for INSERT/REPLACE/UPDATE.
    pub fn add(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.fields
            .push((column.to_string(), SetField::Value(value.into())));
        self
    }

    /// Set a column to a raw SQL expression.
    pub fn add_raw(mut self, column: &str, sql: &str) -> Self {
        self.fields
            .push((column.to_string(), SetField::Raw(sql.to_string())));
        self
    }

    /// `add` for each `(column, value)` pair, in order.
    pub fn add_list<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (column, value) in pairs {
            self = self.add(column.as_ref(), value);
        }
        self
    }

    /// `add_raw` for each `(column, sql)` pair, in order.
    pub fn add_list_raw<K, S>(mut self, pairs: impl IntoIterator<Item = (K, S)>) -> Self
    where
        K: AsRef<str>,
        S: AsRef<str>,
    {
        for (column, sql) in pairs {
            self = self.add_raw(column.as_ref(), sql.as_ref());
        }
        self
    }

    /// `column = column + n`
    pub fn increment(self, column: &str, n: i64) -> Self {
        let sql = format!("{column} + {n}");
        self.add_raw(column, &sql)
    }

    /// `column = column - n`
    pub fn decrement(self, column: &str, n: i64) -> Self {
        let sql = format!("{column} - {n}");
        self.add_raw(column, &sql)
    }

    // ==================== Render helpers ====================

    pub(crate) fn push_joins(&self, sql: &mut String) {
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.kind.as_sql());
            sql.push(' ');
            sql.push_str(&join.table);
            sql.push_str(" ON ");
            sql.push_str(&join.on);
        }
    }

    pub(crate) fn push_where(&self, sql: &mut String, params: &mut ParamList) {
        let where_sql = self.where_pred.render(params);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
    }

    pub(crate) fn push_group_by(&self, sql: &mut String) {
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
    }

    pub(crate) fn push_having(&self, sql: &mut String, params: &mut ParamList) {
        let having_sql = self.having_pred.render(params);
        if !having_sql.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&having_sql);
        }
    }

    pub(crate) fn push_order_by(&self, sql: &mut String) {
        if self.order_by.is_empty() {
            return;
        }
        let clauses: Vec<String> = self
            .order_by
            .iter()
            .map(|(col, dir)| match dir {
                Direction::None => col.clone(),
                Direction::Asc => format!("{col} ASC"),
                Direction::Desc => format!("{col} DESC"),
            })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&clauses.join(", "));
    }

    pub(crate) fn push_limit(&self, sql: &mut String) {
        if self.limit == 0 {
            return;
        }
        sql.push_str(&format!(" LIMIT {}", self.limit));
        if self.offset > 0 {
            sql.push_str(&format!(" OFFSET {}", self.offset));
        }
    }
}

fn collect_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Vec<Value> {
    values.into_iter().map(Into::into).collect()
}

fn collect_rows<R, V>(rows: impl IntoIterator<Item = R>) -> Vec<Vec<Value>>
where
    R: IntoIterator<Item = V>,
    V: Into<Value>,
{
    rows.into_iter().map(|row| collect_values(row)).collect()
}
