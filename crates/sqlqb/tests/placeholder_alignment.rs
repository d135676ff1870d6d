//! Property tests: for any sequence of accumulation calls, every terminal
//! renders exactly one `?` per parameter, in call order.

use proptest::prelude::*;
use sqlqb::{params, qb, query, Query, QueryBuilder, Value};

#[derive(Debug, Clone)]
enum Op {
    Eq(usize, i64),
    OrGt(usize, i64),
    Like(usize, String),
    IsNull(usize),
    In(usize, Vec<i64>),
    OrNotIn(usize, Vec<i64>),
    Tuples(Vec<(i64, i64)>),
    Between(i64, i64),
    Subquery(i64),
    GroupStart,
    OrGroupStart,
    GroupEnd,
}

const COLUMNS: [&str; 4] = ["c0", "c1", "t.c2", "c3"];

fn op() -> impl Strategy<Value = Op> {
    let col = 0..COLUMNS.len();
    prop_oneof![
        (col.clone(), any::<i64>()).prop_map(|(c, v)| Op::Eq(c, v)),
        (col.clone(), any::<i64>()).prop_map(|(c, v)| Op::OrGt(c, v)),
        (col.clone(), "[a-z%_]{0,8}").prop_map(|(c, s)| Op::Like(c, s)),
        col.clone().prop_map(Op::IsNull),
        (col.clone(), prop::collection::vec(any::<i64>(), 0..5)).prop_map(|(c, v)| Op::In(c, v)),
        (col, prop::collection::vec(any::<i64>(), 0..5)).prop_map(|(c, v)| Op::OrNotIn(c, v)),
        prop::collection::vec((any::<i64>(), any::<i64>()), 0..4).prop_map(Op::Tuples),
        (any::<i64>(), any::<i64>()).prop_map(|(a, b)| Op::Between(a, b)),
        any::<i64>().prop_map(Op::Subquery),
        Just(Op::GroupStart),
        Just(Op::OrGroupStart),
        Just(Op::GroupEnd),
    ]
}

/// Apply `ops` and return the builder plus the WHERE values in call order.
fn build(ops: &[Op]) -> (QueryBuilder, Vec<Value>) {
    let mut qb = qb::table("t");
    let mut expected = Vec::new();
    for op in ops.iter().cloned() {
        qb = match op {
            Op::Eq(c, v) => {
                expected.push(Value::from(v));
                qb.eq(COLUMNS[c], v)
            }
            Op::OrGt(c, v) => {
                expected.push(Value::from(v));
                qb.or_gt(COLUMNS[c], v)
            }
            Op::Like(c, s) => {
                expected.push(Value::from(s.as_str()));
                qb.like(COLUMNS[c], s)
            }
            Op::IsNull(c) => qb.is_null(COLUMNS[c]),
            Op::In(c, vs) => {
                expected.extend(vs.iter().copied().map(Value::from));
                qb.where_in(COLUMNS[c], vs)
            }
            Op::OrNotIn(c, vs) => {
                expected.extend(vs.iter().copied().map(Value::from));
                qb.or_where_not_in(COLUMNS[c], vs)
            }
            Op::Tuples(rows) => {
                for (a, b) in &rows {
                    expected.push(Value::from(*a));
                    expected.push(Value::from(*b));
                }
                qb.where_in_tuples(&["c0", "c1"], rows.into_iter().map(|(a, b)| vec![a, b]))
            }
            Op::Between(a, b) => {
                expected.extend([Value::from(a), Value::from(b)]);
                qb.where_raw("c3 BETWEEN ? AND ?", params![a, b])
            }
            Op::Subquery(v) => {
                expected.push(Value::from(v));
                let inner: Query = query("SELECT id FROM s WHERE k = ?").bind(v);
                qb.where_in_query("c0", &inner)
            }
            Op::GroupStart => qb.group_start(),
            Op::OrGroupStart => qb.or_group_start(),
            Op::GroupEnd => qb.group_end(),
        };
    }
    (qb, expected)
}

fn placeholder_count(q: &Query) -> usize {
    q.statement().matches('?').count()
}

proptest! {
    #[test]
    fn prop_read_params_follow_call_order(ops in prop::collection::vec(op(), 0..24)) {
        let (qb, expected) = build(&ops);
        let q = qb.read();
        prop_assert_eq!(placeholder_count(&q), q.params().len());
        prop_assert_eq!(q.params(), expected.as_slice());
    }

    #[test]
    fn prop_every_terminal_is_aligned(
        ops in prop::collection::vec(op(), 0..24),
        write in any::<i64>(),
        grouped in any::<bool>(),
    ) {
        let (mut qb, expected) = build(&ops);
        qb = qb.add("c1", write).increment("c2", 1);
        if grouped {
            qb = qb.group_by("c0").having_gt("COUNT(*)", 1);
        }

        for q in [qb.read(), qb.count(), qb.delete(), qb.insert(), qb.replace()] {
            prop_assert_eq!(placeholder_count(&q), q.params().len());
        }

        let update = qb.update();
        prop_assert_eq!(placeholder_count(&update), update.params().len());
        prop_assert_eq!(&update.params()[0], &Value::from(write));
        prop_assert_eq!(&update.params()[1..], expected.as_slice());
    }

    #[test]
    fn prop_statements_have_single_terminator(ops in prop::collection::vec(op(), 0..12)) {
        let (qb, _) = build(&ops);
        let statement = qb.read().statement().to_string();
        prop_assert!(statement.ends_with(';'));
        prop_assert!(!statement.ends_with(";;"));
        prop_assert_eq!(statement.trim(), statement.as_str());
        prop_assert!(!statement.contains("()"));
        prop_assert!(!statement.contains("IN ()"));
    }

    #[test]
    fn prop_batch_insert_tuples_match_rows(
        rows in prop::collection::vec((any::<i64>(), "[a-z]{0,6}"), 1..8),
    ) {
        let q = qb::table("t").insert_all(
            rows.iter()
                .map(|(a, b)| vec![("a", Value::from(*a)), ("b", Value::from(b.as_str()))]),
        );
        prop_assert_eq!(placeholder_count(&q), rows.len() * 2);
        prop_assert_eq!(q.params().len(), rows.len() * 2);
        prop_assert_eq!(q.statement().matches("(?,?)").count(), rows.len());
    }
}
