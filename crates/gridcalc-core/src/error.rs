use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a piece of text does not name a cell.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invalid cell identifier: {0:?}")]
pub struct InvalidIdentifier(pub String);
