pub mod builder;
pub mod cycle;
pub mod error;
pub mod eval;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod table;

pub use builder::{ExprBuilder, TreeBuilder};
pub use cycle::root_has_cycle;
pub use error::FormulaError;
pub use eval::Evaluator;
pub use expr::{BinaryOp, Expr, Root, UnaryOp};
pub use lexer::{Lexer, Token};
pub use parser::Parser;
pub use table::CellTable;

use gridcalc_core::Position;

/// A successfully compiled cell: the root to install plus the positions
/// its tree references, which the caller materializes as empty cells when
/// it commits the root to a table.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCell {
    pub root: Root,
    pub references: Vec<Position>,
}

/// Compile raw cell contents into an expression tree.
///
/// Text starting with `=` is lexed and parsed as a formula. Anything else
/// is a literal: the whole text as a number if it parses as one, a plain
/// text literal otherwise. Only formulas can fail.
pub fn compile(contents: &str) -> Result<CompiledCell, FormulaError> {
    if let Some(body) = contents.strip_prefix('=') {
        let tokens = Lexer::new(body).tokenize()?;
        let mut builder = TreeBuilder::new(true);
        Parser::new(tokens, &mut builder).parse()?;
        let (expr, references) = builder.finish()?;
        Ok(CompiledCell {
            root: Root::new(expr, true),
            references,
        })
    } else {
        let mut builder = TreeBuilder::new(false);
        match contents.parse::<f64>() {
            Ok(n) => builder.val_number(n),
            Err(_) => builder.val_string(contents.to_string()),
        }
        let (expr, references) = builder.finish()?;
        Ok(CompiledCell {
            root: Root::new(expr, false),
            references,
        })
    }
}
