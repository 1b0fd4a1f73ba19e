pub mod error;
pub mod position;
pub mod value;

pub use error::InvalidIdentifier;
pub use position::{column_from_label, column_to_label, Position};
pub use value::{number_text, Value};
