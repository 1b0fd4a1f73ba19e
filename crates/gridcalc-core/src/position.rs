use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::InvalidIdentifier;

/// Cell address: 1-indexed column and row.
///
/// Column 1 is `A`, column 26 is `Z`, column 27 is `AA` and so on
/// (bijective base-26, there is no zero digit). Components are signed so
/// that copy deltas can be applied with plain arithmetic; any `Position`
/// built through [`Position::parse`] or [`Position::new`] has both
/// components >= 1.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Position {
    pub column: i64,
    pub row: i64,
}

impl Position {
    pub const fn new(column: i64, row: i64) -> Self {
        Position { column, row }
    }

    /// Parse A1 notation (e.g. `"B7"`, `"aa100"`).
    ///
    /// The text must be a non-empty alphabetic run followed by a non-empty
    /// decimal row; letters are case-insensitive. Rows are 1-indexed, so
    /// `"A0"` is rejected.
    pub fn parse(text: &str) -> Result<Self, InvalidIdentifier> {
        let reject = || InvalidIdentifier(text.to_string());

        let split = text
            .char_indices()
            .find(|(_, c)| !c.is_ascii_alphabetic())
            .map(|(i, _)| i)
            .unwrap_or(text.len());

        let (letters, digits) = text.split_at(split);
        if letters.is_empty() || digits.is_empty() {
            return Err(reject());
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(reject());
        }

        let column = column_from_label(letters).ok_or_else(reject)?;
        let row: i64 = digits.parse().map_err(|_| reject())?;
        if row < 1 {
            return Err(reject());
        }

        Ok(Position { column, row })
    }

    /// The column part in A1 notation, recomputed from the column number.
    pub fn column_label(&self) -> String {
        column_to_label(self.column)
    }

    /// Full A1 text, e.g. `"B7"`.
    pub fn to_a1(&self) -> String {
        format!("{}{}", self.column_label(), self.row)
    }
}

impl Add<(i64, i64)> for Position {
    type Output = Position;

    fn add(self, (dc, dr): (i64, i64)) -> Position {
        Position {
            column: self.column + dc,
            row: self.row + dr,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_label(), self.row)
    }
}

impl FromStr for Position {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::parse(s)
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Convert a 1-indexed column number to its label (1 -> A, 26 -> Z, 27 -> AA).
pub fn column_to_label(column: i64) -> String {
    let mut label = String::new();
    let mut n = column;

    while n > 0 {
        let digit = ((n - 1) % 26) as u8;
        label.insert(0, char::from(b'A' + digit));
        n = (n - 1) / 26;
    }

    label
}

/// Convert a column label to its 1-indexed number (A -> 1, Z -> 26, AA -> 27).
pub fn column_from_label(label: &str) -> Option<i64> {
    if label.is_empty() {
        return None;
    }

    let mut column: i64 = 0;
    for c in label.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as i64) - ('A' as i64) + 1;
        column = column.checked_mul(26)?.checked_add(digit)?;
    }

    Some(column)
}
