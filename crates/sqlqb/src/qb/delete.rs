//! DELETE rendering.

use crate::qb::builder::QueryBuilder;
use crate::qb::param::ParamList;
use crate::query::Query;

impl QueryBuilder {
    /// Render `DELETE FROM <from> [WHERE] [ORDER BY] [LIMIT]`.
    ///
    /// With joins the multi-table form is used and the deleted table is the
    /// alias (last token) of the FROM expression:
    /// `DELETE u FROM users u INNER JOIN ... WHERE ...`.
    pub fn delete(&self) -> Query {
        let mut params = ParamList::new();
        let mut sql = if self.joins.is_empty() {
            format!("DELETE FROM {}", self.from)
        } else {
            let alias = self.from.split_whitespace().last().unwrap_or_default();
            format!("DELETE {alias} FROM {}", self.from)
        };

        self.push_joins(&mut sql);
        self.push_where(&mut sql, &mut params);
        self.push_order_by(&mut sql);
        self.push_limit(&mut sql);

        Query::new(sql, params.into_vec())
    }
}
