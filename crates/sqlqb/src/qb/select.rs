//! SELECT and COUNT rendering.

use crate::qb::builder::QueryBuilder;
use crate::qb::param::ParamList;
use crate::query::Query;

/// Alias of the derived table used to count grouped/distinct result rows.
const COUNT_ALIAS: &str = "qb_count";

impl QueryBuilder {
    /// Render `SELECT [DISTINCT] <cols|*> FROM ... [WHERE] [GROUP BY] [HAVING] [ORDER BY] [LIMIT [OFFSET]]`.
    ///
    /// Params are WHERE values followed by HAVING values.
    pub fn read(&self) -> Query {
        let (sql, params) = self.build_select(&self.select_list());
        Query::new(sql, params.into_vec())
    }

    /// Render a row-count query over the same FROM/JOIN/WHERE/GROUP BY/HAVING.
    ///
    /// Grouped or DISTINCT builders are wrapped as a derived table so the result
    /// is the number of groups (or distinct rows):
    /// `SELECT COUNT(*) AS sum FROM (<inner>) AS qb_count`.
    ///
    /// ORDER BY and LIMIT/OFFSET are kept, so a paginated builder past its
    /// first page counts no rows; call `.limit(0)` before counting.
    pub fn count(&self) -> Query {
        let inner_cols = if self.distinct {
            self.select_list()
        } else {
            "COUNT(*) AS sum".to_string()
        };
        let (inner, params) = self.build_select(&inner_cols);

        let sql = if self.group_by.is_empty() && !self.distinct {
            inner
        } else {
            format!("SELECT COUNT(*) AS sum FROM ({inner}) AS {COUNT_ALIAS}")
        };
        Query::new(sql, params.into_vec())
    }

    fn select_list(&self) -> String {
        let cols = if self.select_cols.is_empty() {
            "*".to_string()
        } else {
            self.select_cols.join(", ")
        };
        if self.distinct {
            format!("DISTINCT {cols}")
        } else {
            cols
        }
    }

    fn build_select(&self, projection: &str) -> (String, ParamList) {
        let mut params = ParamList::new();
        let mut sql = format!("SELECT {projection} FROM {}", self.from);

        self.push_joins(&mut sql);
        self.push_where(&mut sql, &mut params);
        self.push_group_by(&mut sql);
        self.push_having(&mut sql, &mut params);
        self.push_order_by(&mut sql);
        self.push_limit(&mut sql);

        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use crate::qb::table;
    use crate::value::Value;

    #[test]
    fn test_select_defaults_to_star() {
        let q = table("users").read();
        assert_eq!(q.statement(), "SELECT * FROM users;");
        assert!(q.params().is_empty());
    }

    #[test]
    fn test_select_full_pipeline() {
        let q = table("users u")
            .select_cols(&["u.id", "COUNT(o.id) AS orders"])
            .left_join("orders o", "o.user_id = u.id")
            .eq("u.active", true)
            .group_by("u.id")
            .having("COUNT(o.id) > ?", vec![Value::Int(2)])
            .order_desc("orders")
            .limit_offset(10, 20)
            .read();
        assert_eq!(
            q.statement(),
            "SELECT u.id, COUNT(o.id) AS orders FROM users u \
             LEFT JOIN orders o ON o.user_id = u.id \
             WHERE u.active = ? GROUP BY u.id HAVING COUNT(o.id) > ? \
             ORDER BY orders DESC LIMIT 10 OFFSET 20;"
        );
        assert_eq!(q.params(), &[Value::Bool(true), Value::Int(2)]);
    }

    #[test]
    fn test_limit_zero_drops_offset() {
        let q = table("t").limit(0).offset(5).read();
        assert_eq!(q.statement(), "SELECT * FROM t;");
    }

    #[test]
    fn test_count_plain() {
        let q = table("users").eq("active", 1).order_asc("id").count();
        assert_eq!(
            q.statement(),
            "SELECT COUNT(*) AS sum FROM users WHERE active = ? ORDER BY id ASC;"
        );
        assert_eq!(q.params(), &[Value::Int(1)]);
    }

    #[test]
    fn test_count_keeps_pagination() {
        let paged = table("t").paginate(3, 10);
        assert_eq!(
            paged.count().statement(),
            "SELECT COUNT(*) AS sum FROM t LIMIT 10 OFFSET 20;"
        );
        assert_eq!(
            paged.limit(0).count().statement(),
            "SELECT COUNT(*) AS sum FROM t;"
        );
    }

    #[test]
    fn test_count_grouped_is_wrapped() {
        let q = table("sales")
            .gt("amount", 0)
            .group_by("region")
            .having_gt("SUM(amount)", 100)
            .count();
        assert_eq!(
            q.statement(),
            "SELECT COUNT(*) AS sum FROM (SELECT COUNT(*) AS sum FROM sales \
             WHERE amount > ? GROUP BY region HAVING SUM(amount) > ?) AS qb_count;"
        );
        assert_eq!(q.params(), &[Value::Int(0), Value::Int(100)]);
    }

    #[test]
    fn test_count_distinct_is_wrapped() {
        let q = table("visits").select("user_id").distinct().count();
        assert_eq!(
            q.statement(),
            "SELECT COUNT(*) AS sum FROM (SELECT DISTINCT user_id FROM visits) AS qb_count;"
        );
    }

    #[test]
    fn test_read_is_repeatable() {
        let qb = table("t").group_start().eq("a", 1);
        let first = qb.read();
        let second = qb.read();
        assert_eq!(first, second);
        assert_eq!(first.statement(), "SELECT * FROM t WHERE (a = ?);");
    }
}
