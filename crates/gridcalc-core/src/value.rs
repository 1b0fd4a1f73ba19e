use serde::{Deserialize, Serialize};

/// The result of evaluating a cell.
///
/// `Undefined` is the propagation sink: any type-incompatible operation,
/// division by zero, reference cycle, missing cell or empty cell yields it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Undefined,
    Number(f64),
    Text(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// The contained number, if this is a `Number`. No coercion.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The contained text, if this is a `Text`. No coercion.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Decimal text for a number.
///
/// This is the single conversion used both when `+` concatenates a number
/// onto a string and when a number literal is printed, so the two surfaces
/// always agree and printed numbers reparse to the same value.
pub fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
