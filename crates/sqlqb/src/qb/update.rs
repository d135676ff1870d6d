//! UPDATE rendering.

use crate::qb::builder::{QueryBuilder, SetField};
use crate::qb::param::ParamList;
use crate::query::Query;

impl QueryBuilder {
    /// Render `UPDATE <from> <joins> SET ... [WHERE ...]`.
    ///
    /// Parameterized assignments come first, then raw ones. Params are the
    /// write values followed by the WHERE values.
    ///
    /// Without write columns there is nothing to SET and the empty query is returned.
    pub fn update(&self) -> Query {
        self.build_update(false)
    }

    /// `UPDATE IGNORE` variant of [`update`](Self::update).
    pub fn update_ignore(&self) -> Query {
        self.build_update(true)
    }

    fn build_update(&self, ignore: bool) -> Query {
        if self.fields.is_empty() {
            return Query::empty();
        }
        let mut params = ParamList::new();
        let mut sql = String::from("UPDATE ");
        if ignore {
            sql.push_str("IGNORE ");
        }
        sql.push_str(&self.from);
        self.push_joins(&mut sql);

        let mut assignments = Vec::with_capacity(self.fields.len());
        for (column, field) in &self.fields {
            if let SetField::Value(v) = field {
                assignments.push(format!("{column} = ?"));
                params.push(v.clone());
            }
        }
        for (column, field) in &self.fields {
            if let SetField::Raw(expr) = field {
                assignments.push(format!("{column} = {expr}"));
            }
        }
        sql.push_str(" SET ");
        sql.push_str(&assignments.join(", "));

        self.push_where(&mut sql, &mut params);
        Query::new(sql, params.into_vec())
    }
}
