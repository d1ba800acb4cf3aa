//! Pure comparator evaluation.
//!
//! `evaluate` compares a fetched data-point value against a rule's
//! compare value. It never errors: an unsupported or type-mismatched
//! comparison yields `None`, which callers treat as an evaluation
//! failure, not as `false`.

use crate::domain::models::{Comparator, DataValue};

/// Compare `value` against `other` with `comparator`.
///
/// Supported pairings: (number, eq|gt|lt), (text, eq), (bool, eq).
/// Everything else, including any comparison across kinds, returns
/// `None`.
pub fn evaluate(value: &DataValue, comparator: Comparator, other: &DataValue) -> Option<bool> {
    if value.kind() != other.kind() {
        return None;
    }

    match (value, comparator, other) {
        (DataValue::Number(a), Comparator::Eq, DataValue::Number(b)) => Some(a == b),
        (DataValue::Number(a), Comparator::Gt, DataValue::Number(b)) => Some(a > b),
        (DataValue::Number(a), Comparator::Lt, DataValue::Number(b)) => Some(a < b),
        (DataValue::Text(a), Comparator::Eq, DataValue::Text(b)) => Some(a == b),
        (DataValue::Bool(a), Comparator::Eq, DataValue::Bool(b)) => Some(a == b),
        // gt/lt are numeric-only.
        _ => None,
    }
}
