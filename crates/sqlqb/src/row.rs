//! Decoded result rows and row mapping traits

use crate::error::{QbError, QbResult};
use crate::value::{FromValue, Value};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// One result row: column names (shared across a result set) and decoded values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the first column with this name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn get_idx(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Typed column access, returning `QbError::Decode` on a missing column or type mismatch
    pub fn try_get<T: FromValue>(&self, column: &str) -> QbResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| QbError::decode(column, "no such column"))?;
        T::from_value(value).map_err(|msg| QbError::decode(column, msg))
    }

    /// Typed positional access.
    pub fn try_get_idx<T: FromValue>(&self, idx: usize) -> QbResult<T> {
        let name = self
            .columns
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("#{idx}"));
        let value = self
            .values
            .get(idx)
            .ok_or_else(|| QbError::decode(&name, "column index out of range"))?;
        T::from_value(value).map_err(|msg| QbError::decode(name, msg))
    }

    /// The row as a JSON object keyed by column name.
    pub fn to_json(&self) -> QbResult<serde_json::Value> {
        let mut map = serde_json::Map::with_capacity(self.values.len());
        for (column, value) in self.columns.iter().zip(&self.values) {
            let json = serde_json::to_value(value)
                .map_err(|e| QbError::decode(column, e.to_string()))?;
            map.insert(column.clone(), json);
        }
        Ok(serde_json::Value::Object(map))
    }

    /// Map the row onto any `serde::Deserialize` type by column name.
    ///
    /// ```ignore
    /// #[derive(serde::Deserialize)]
    /// struct User { id: i64, name: String }
    ///
    /// let user: User = row.deserialize()?;
    /// ```
    pub fn deserialize<T: DeserializeOwned>(&self) -> QbResult<T> {
        serde_json::from_value(self.to_json()?)
            .map_err(|e| QbError::decode(std::any::type_name::<T>(), e.to_string()))
    }
}

/// Trait for converting a database row into a Rust type.
///
/// # Example
///
/// ```ignore
/// use sqlqb::{FromRow, QbResult, Row};
///
/// struct User {
///     id: i64,
///     username: String,
///     email: Option<String>,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> QbResult<Self> {
///         Ok(Self {
///             id: row.try_get("id")?,
///             username: row.try_get("username")?,
///             email: row.try_get("email")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> QbResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> QbResult<Self> {
        Ok(row.clone())
    }
}

macro_rules! impl_from_row_tuple {
    ($($idx:tt => $t:ident),+) => {
        impl<$($t: FromValue),+> FromRow for ($($t,)+) {
            fn from_row(row: &Row) -> QbResult<Self> {
                Ok(($(row.try_get_idx::<$t>($idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(0 => A);
impl_from_row_tuple!(0 => A, 1 => B);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D);
