use gridcalc_core::Position;

use crate::error::FormulaError;
use crate::expr::{BinaryOp, Expr, UnaryOp};

/// Event sink driven by the formula parser.
///
/// This trait is the only seam between the parser and the expression
/// model: values and operators arrive in postfix order and the sink must
/// hold exactly one operand when parsing ends. `val_range` and `func_call`
/// belong to the event surface so richer front ends can drive the same
/// sink, but ranges and functions are out of scope here and the events
/// default to no-ops.
pub trait ExprBuilder {
    fn val_number(&mut self, value: f64);
    fn val_string(&mut self, value: String);
    fn val_reference(&mut self, text: &str) -> Result<(), FormulaError>;
    fn val_range(&mut self, _text: &str) {}
    fn func_call(&mut self, _name: &str, _arg_count: usize) {}

    fn op_add(&mut self) -> Result<(), FormulaError>;
    fn op_sub(&mut self) -> Result<(), FormulaError>;
    fn op_mul(&mut self) -> Result<(), FormulaError>;
    fn op_div(&mut self) -> Result<(), FormulaError>;
    fn op_pow(&mut self) -> Result<(), FormulaError>;
    fn op_neg(&mut self) -> Result<(), FormulaError>;

    fn op_eq(&mut self) -> Result<(), FormulaError>;
    fn op_ne(&mut self) -> Result<(), FormulaError>;
    fn op_lt(&mut self) -> Result<(), FormulaError>;
    fn op_le(&mut self) -> Result<(), FormulaError>;
    fn op_gt(&mut self) -> Result<(), FormulaError>;
    fn op_ge(&mut self) -> Result<(), FormulaError>;
}

/// Builds an expression tree on an operand stack from parser events.
///
/// The builder never touches the cell table: referenced positions are
/// recorded and handed back from [`TreeBuilder::finish`], so the caller
/// can materialize them only once the whole parse has succeeded.
pub struct TreeBuilder {
    stack: Vec<Expr>,
    is_formula: bool,
    referenced: Vec<Position>,
}

impl TreeBuilder {
    /// `is_formula` is true when the cell contents began with `=`; string
    /// literals built from inside a formula print back out quoted.
    pub fn new(is_formula: bool) -> Self {
        TreeBuilder {
            stack: Vec::new(),
            is_formula,
            referenced: Vec::new(),
        }
    }

    fn pop(&mut self) -> Result<Expr, FormulaError> {
        self.stack.pop().ok_or(FormulaError::Malformed)
    }

    fn push_binary(&mut self, op: BinaryOp) -> Result<(), FormulaError> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.stack.push(Expr::binary(left, op, right));
        Ok(())
    }

    /// Take the finished tree and the positions it references.
    ///
    /// Exactly one operand must remain on the stack; anything else means
    /// the event stream was malformed.
    pub fn finish(mut self) -> Result<(Expr, Vec<Position>), FormulaError> {
        let expr = self.pop()?;
        if !self.stack.is_empty() {
            return Err(FormulaError::Malformed);
        }
        Ok((expr, self.referenced))
    }
}

impl ExprBuilder for TreeBuilder {
    fn val_number(&mut self, value: f64) {
        self.stack.push(Expr::number(value));
    }

    fn val_string(&mut self, value: String) {
        self.stack.push(Expr::text(value, self.is_formula));
    }

    fn val_reference(&mut self, text: &str) -> Result<(), FormulaError> {
        let (pos, abs_col, abs_row) = parse_reference(text)?;
        self.referenced.push(pos);
        self.stack.push(Expr::cell_ref(pos, abs_col, abs_row));
        Ok(())
    }

    fn op_add(&mut self) -> Result<(), FormulaError> {
        self.push_binary(BinaryOp::Add)
    }

    fn op_sub(&mut self) -> Result<(), FormulaError> {
        self.push_binary(BinaryOp::Sub)
    }

    fn op_mul(&mut self) -> Result<(), FormulaError> {
        self.push_binary(BinaryOp::Mul)
    }

    fn op_div(&mut self) -> Result<(), FormulaError> {
        self.push_binary(BinaryOp::Div)
    }

    fn op_pow(&mut self) -> Result<(), FormulaError> {
        self.push_binary(BinaryOp::Pow)
    }

    fn op_neg(&mut self) -> Result<(), FormulaError> {
        let operand = self.pop()?;
        self.stack.push(Expr::unary(UnaryOp::Neg, operand));
        Ok(())
    }

    fn op_eq(&mut self) -> Result<(), FormulaError> {
        self.push_binary(BinaryOp::Eq)
    }

    fn op_ne(&mut self) -> Result<(), FormulaError> {
        self.push_binary(BinaryOp::Ne)
    }

    fn op_lt(&mut self) -> Result<(), FormulaError> {
        self.push_binary(BinaryOp::Lt)
    }

    fn op_le(&mut self) -> Result<(), FormulaError> {
        self.push_binary(BinaryOp::Le)
    }

    fn op_gt(&mut self) -> Result<(), FormulaError> {
        self.push_binary(BinaryOp::Gt)
    }

    fn op_ge(&mut self) -> Result<(), FormulaError> {
        self.push_binary(BinaryOp::Ge)
    }
}

/// Parse `[$]column[$]row` reference text into a position plus the
/// absolute-component flags.
fn parse_reference(text: &str) -> Result<(Position, bool, bool), FormulaError> {
    let mut chars = text.chars().peekable();

    let abs_col = chars.peek() == Some(&'$');
    if abs_col {
        chars.next();
    }

    let mut column = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphabetic() {
            column.push(c);
            chars.next();
        } else {
            break;
        }
    }

    let abs_row = chars.peek() == Some(&'$');
    if abs_row {
        chars.next();
    }

    let row: String = chars.collect();
    if column.is_empty() || row.is_empty() || !row.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormulaError::InvalidReference(text.to_string()));
    }

    let pos = Position::parse(&format!("{}{}", column, row))?;
    Ok((pos, abs_col, abs_row))
}
