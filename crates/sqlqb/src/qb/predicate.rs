//! Boolean predicate accumulator for WHERE/HAVING clauses.
//!
//! Conditions are recorded as a flat sequence of nodes (leaves and group
//! boundaries). Nesting, the leading-keyword tie-break, empty-group elision and
//! auto-closing of open groups are all resolved at render time, so rendering
//! never mutates the accumulator.

use crate::qb::auto::{parse_auto_column, Operand};
use crate::qb::param::ParamList;
use crate::error::QbResult;
use crate::query::Query;
use crate::value::Value;

/// Logical connector requested for a predicate or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Keyword {
    #[default]
    And,
    Or,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::And => "AND",
            Keyword::Or => "OR",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Leaf {
        keyword: Keyword,
        sql: String,
        values: Vec<Value>,
    },
    Open(Keyword),
    Close,
}

/// Incrementally built boolean expression.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Predicate {
    nodes: Vec<Node>,
    depth: usize,
    ignored_closes: usize,
}

impl Predicate {
    /// Create an empty predicate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no leaf has been recorded (groups alone render nothing).
    pub fn is_empty(&self) -> bool {
        !self.nodes.iter().any(|n| matches!(n, Node::Leaf { .. }))
    }

    /// Number of groups currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of `group_end` calls that had no open group to close.
    pub fn ignored_closes(&self) -> usize {
        self.ignored_closes
    }

    /// Append a condition. `sql` must contain one `?` per entry of `values`.
    pub fn push(&mut self, keyword: Keyword, sql: impl Into<String>, values: Vec<Value>) {
        self.nodes.push(Node::Leaf {
            keyword,
            sql: sql.into(),
            values,
        });
    }

    /// `column <op> ?`, with `=` / `<>` against null becoming `IS [NOT] NULL`.
    pub fn compare(&mut self, keyword: Keyword, column: &str, op: &str, value: Value) {
        match (op, value.is_null()) {
            ("=", true) => self.is_null(keyword, column),
            ("<>", true) => self.is_not_null(keyword, column),
            (_, true) => self.push(keyword, format!("{column} {op} NULL"), Vec::new()),
            (_, false) => self.push(keyword, format!("{column} {op} ?"), vec![value]),
        }
    }

    pub fn is_null(&mut self, keyword: Keyword, column: &str) {
        self.push(keyword, format!("{column} IS NULL"), Vec::new());
    }

    pub fn is_not_null(&mut self, keyword: Keyword, column: &str) {
        self.push(keyword, format!("{column} IS NOT NULL"), Vec::new());
    }

    /// Inferred-operator condition, see [`crate::qb::auto`].
    pub fn auto(&mut self, spec: &str, operand: Operand) -> QbResult<()> {
        let col = parse_auto_column(spec)?;
        match operand {
            Operand::List(values) => match col.operator.as_str() {
                "=" => self.in_list(col.keyword, &col.column, false, values),
                "<>" => self.in_list(col.keyword, &col.column, true, values),
                op => self.in_list_with(col.keyword, &col.column, op, values),
            },
            Operand::Value(value) => self.compare(col.keyword, &col.column, &col.operator, value),
        }
        Ok(())
    }

    // ==================== IN predicates ====================

    /// `column [NOT] IN (?,?,...)`. An empty candidate list adds nothing.
    pub fn in_list(&mut self, keyword: Keyword, column: &str, negated: bool, values: Vec<Value>) {
        let op = if negated { "NOT IN" } else { "IN" };
        self.in_list_with(keyword, column, op, values);
    }

    fn in_list_with(&mut self, keyword: Keyword, column: &str, op: &str, values: Vec<Value>) {
        if values.is_empty() {
            skipped_empty_in(column);
            return;
        }
        let sql = format!("{column} {op} ({})", placeholders(values.len()));
        self.push(keyword, sql, values);
    }

    /// `(c1,c2) [NOT] IN ((?,?),(?,?))`, one tuple per row, each sized to its row.
    pub fn in_tuples(
        &mut self,
        keyword: Keyword,
        columns: &[&str],
        negated: bool,
        rows: Vec<Vec<Value>>,
    ) {
        let rows: Vec<Vec<Value>> = rows.into_iter().filter(|r| !r.is_empty()).collect();
        let target = format!("({})", columns.join(","));
        if columns.is_empty() || rows.is_empty() {
            skipped_empty_in(&target);
            return;
        }

        let tuples = rows
            .iter()
            .map(|row| format!("({})", placeholders(row.len())))
            .collect::<Vec<_>>()
            .join(",");
        let op = if negated { "NOT IN" } else { "IN" };
        let values = rows.into_iter().flatten().collect();
        self.push(keyword, format!("{target} {op} ({tuples})"), values);
    }

    /// `column [NOT] IN (<sub-query>)`. An empty sub-query adds nothing.
    pub fn in_query(&mut self, keyword: Keyword, column: &str, negated: bool, inner: &Query) {
        let body = inner.statement_body();
        if body.is_empty() {
            skipped_empty_in(column);
            return;
        }
        let op = if negated { "NOT IN" } else { "IN" };
        self.push(
            keyword,
            format!("{column} {op} ({body})"),
            inner.params().to_vec(),
        );
    }

    // ==================== Groups ====================

    /// Open a parenthesized level.
    pub fn group_start(&mut self, keyword: Keyword) {
        self.nodes.push(Node::Open(keyword));
        self.depth += 1;
    }

    /// Close the innermost open level; a no-op when nothing is open.
    pub fn group_end(&mut self) {
        if self.depth == 0 {
            self.ignored_closes += 1;
            #[cfg(feature = "tracing")]
            tracing::warn!(
                target: "sqlqb.qb",
                ignored = self.ignored_closes,
                "group_end called with no open group; ignored"
            );
            return;
        }
        self.nodes.push(Node::Close);
        self.depth -= 1;
    }

    // ==================== Rendering ====================

    /// Render the expression (without the `WHERE`/`HAVING` keyword), appending
    /// bound values to `params` in placeholder order.
    pub fn render(&self, params: &mut ParamList) -> String {
        let mut sql = String::new();
        let mut pos = 0;
        render_level(&self.nodes, &mut pos, &mut sql, params);
        sql
    }

    /// Render into a fresh parameter list.
    pub fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let sql = self.render(&mut params);
        (sql, params)
    }
}

/// Render nodes until the matching `Close` (or the end, which closes implicitly).
/// Returns whether anything was written at this level.
fn render_level(nodes: &[Node], pos: &mut usize, out: &mut String, params: &mut ParamList) -> bool {
    let mut wrote = false;
    while let Some(node) = nodes.get(*pos) {
        *pos += 1;
        match node {
            Node::Close => break,
            Node::Leaf {
                keyword,
                sql,
                values,
            } => {
                push_connector(out, *keyword, wrote);
                out.push_str(sql);
                params.extend(values.iter().cloned());
                wrote = true;
            }
            Node::Open(keyword) => {
                let mut inner = String::new();
                let mut inner_params = ParamList::new();
                if render_level(nodes, pos, &mut inner, &mut inner_params) {
                    push_connector(out, *keyword, wrote);
                    out.push('(');
                    out.push_str(&inner);
                    out.push(')');
                    params.extend(inner_params.into_vec());
                    wrote = true;
                }
            }
        }
    }
    wrote
}

fn push_connector(out: &mut String, keyword: Keyword, wrote: bool) {
    // the first item of a level never carries its keyword
    if wrote {
        out.push(' ');
        out.push_str(keyword.as_str());
        out.push(' ');
    }
}

/// `?,?,?` for `n` values.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn skipped_empty_in(target: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(target: "sqlqb.qb", column = target, "empty IN candidate set; predicate skipped");
}
