//! Group key type for the TABULA Feature Engine
//!
//! A `GroupKey` identifies one group of rows: a single value when grouping
//! by one column, a composite of values when grouping by several. Keys carry
//! a canonical total order (groups iterate in ascending key order) and a
//! bit-level hash so that float-valued keys behave as map keys.

use crate::error::{CoreError, Result};
use crate::types::{Table, Value};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Key identifying a single group of rows
#[derive(Debug, Clone)]
pub enum GroupKey {
    /// Grouping by one column
    Single(Value),
    /// Grouping by several columns, one value per column
    Composite(Vec<Value>),
}

impl GroupKey {
    /// Build the key for `row` of `table` from the group-by column list
    ///
    /// A single column produces `Single`, several produce `Composite`.
    pub fn from_row(table: &Table, row: usize, group_by: &[String]) -> Result<Self> {
        let mut values = Vec::with_capacity(group_by.len());
        for col in group_by {
            let value = table
                .value(col, row)
                .ok_or_else(|| CoreError::ColumnNotFound(col.clone()))?;
            values.push(value.clone());
        }

        match values.len() {
            1 => Ok(GroupKey::Single(values.remove(0))),
            _ => Ok(GroupKey::Composite(values)),
        }
    }

    /// The key's values, in group-by column order
    pub fn values(&self) -> &[Value] {
        match self {
            GroupKey::Single(v) => std::slice::from_ref(v),
            GroupKey::Composite(vs) => vs,
        }
    }
}

/// Canonical ordering over values: variant rank first, then contents.
/// Numbers compare via `total_cmp` so NaN keys cannot poison the order.
fn cmp_value(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => cmp_values(x, y),
        // Objects have no meaningful key order; fall back to length
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn cmp_values(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match cmp_value(x, y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

fn hash_value<H: Hasher>(v: &Value, state: &mut H) {
    match v {
        Value::Null => 0u8.hash(state),
        Value::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::Number(n) => {
            2u8.hash(state);
            n.to_bits().hash(state);
        }
        Value::String(s) => {
            3u8.hash(state);
            s.hash(state);
        }
        Value::Array(items) => {
            4u8.hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(map) => {
            5u8.hash(state);
            map.len().hash(state);
        }
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_values(self.values(), other.values())
    }
}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in self.values() {
            hash_value(value, state);
        }
    }
}
