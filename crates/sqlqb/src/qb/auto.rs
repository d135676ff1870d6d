//! Inferred-operator predicates.
//!
//! `where_auto("or age >=", 18)` reads a free-text column spec of the form
//! `[AND|OR] <column> [<operator>]` and infers the comparison from the spec and
//! the operand:
//!
//! | operand        | `=`            | `<>`               | other op        |
//! |----------------|----------------|--------------------|-----------------|
//! | scalar         | `col = ?`      | `col <> ?`         | `col op ?`      |
//! | `Value::Null`  | `col IS NULL`  | `col IS NOT NULL`  | `col op NULL`   |
//! | non-empty list | `col IN (..)`  | `col NOT IN (..)`  | `col op (..)`   |
//! | empty list     | omitted        | omitted            | omitted         |

use crate::error::{QbError, QbResult};
use crate::qb::predicate::Keyword;
use crate::value::Value;

/// Operators accepted after the column name (already upper-cased, `!=` folded to `<>`).
const OPERATORS: &[&str] = &[
    "=", "<>", "<", ">", "<=", ">=", "<=>", "LIKE", "NOT LIKE", "IN", "NOT IN", "IS", "IS NOT",
    "REGEXP", "NOT REGEXP",
];

/// A parsed `[AND|OR] <column> [<operator>]` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoColumn {
    pub keyword: Keyword,
    pub column: String,
    pub operator: String,
}

/// Parse an inferred-operator column spec.
///
/// Fails with [`QbError::InvalidPredicate`] when the text does not match the grammar.
pub fn parse_auto_column(spec: &str) -> QbResult<AutoColumn> {
    let text = spec.trim();
    if text.is_empty() {
        return Err(QbError::invalid_predicate("empty column spec"));
    }

    let (keyword, rest) = split_keyword(text);

    let column_len = rest
        .find(|c: char| !is_column_char(c))
        .unwrap_or(rest.len());
    let column = &rest[..column_len];
    if column.is_empty() || column.split('.').any(str::is_empty) {
        return Err(QbError::invalid_predicate(format!(
            "'{spec}': expected `[AND|OR] <column> [<operator>]`"
        )));
    }

    let operator = normalize_operator(&rest[column_len..]);
    if !OPERATORS.contains(&operator.as_str()) {
        return Err(QbError::invalid_predicate(format!(
            "'{spec}': unknown operator '{operator}'"
        )));
    }

    Ok(AutoColumn {
        keyword,
        column: column.to_string(),
        operator,
    })
}

fn is_column_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Split a leading `AND`/`OR` word off the spec. A lone `and` is a column name.
fn split_keyword(text: &str) -> (Keyword, &str) {
    let Some((first, rest)) = text.split_once(char::is_whitespace) else {
        return (Keyword::And, text);
    };
    let rest = rest.trim_start();
    if rest.is_empty() {
        return (Keyword::And, text);
    }
    if first.eq_ignore_ascii_case("and") {
        (Keyword::And, rest)
    } else if first.eq_ignore_ascii_case("or") {
        (Keyword::Or, rest)
    } else {
        (Keyword::And, text)
    }
}

fn normalize_operator(raw: &str) -> String {
    let op = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    match op.as_str() {
        "" => "=".to_string(),
        "!=" => "<>".to_string(),
        _ => op,
    }
}

/// Right-hand side of an inferred-operator predicate: one value or a candidate list.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    List(Vec<Value>),
}

macro_rules! impl_operand_from_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Operand {
                fn from(v: $t) -> Self {
                    Operand::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_operand_from_scalar!(
    Value,
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    &str,
    String,
    &String,
    chrono::NaiveDateTime,
    chrono::NaiveDate,
    chrono::NaiveTime,
    uuid::Uuid,
    serde_json::Value,
);

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Value(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(v: Vec<T>) -> Self {
        Operand::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Operand {
    fn from(v: &[T]) -> Self {
        Operand::List(v.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
    fn from(v: [T; N]) -> Self {
        Operand::List(v.into_iter().map(Into::into).collect())
    }
}
