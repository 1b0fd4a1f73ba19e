use std::fmt;

use gridcalc_core::{number_text, Position};

/// Expression tree for cell contents.
///
/// One tagged variant per node kind; every composite owns its children.
/// A `CellRef` holds only the target position — it is resolved against a
/// [`CellTable`](crate::table::CellTable) at evaluation time, which keeps
/// trees freely clonable between tables.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// `quoted` records whether the literal came from inside a formula,
    /// which governs quoting when the cell is printed back out.
    Text { value: String, quoted: bool },
    /// Reference to another cell. An absolute component (printed with a
    /// leading `$`) keeps its axis fixed when the containing cell is
    /// copied; a relative one shifts with the copy.
    CellRef {
        pos: Position,
        abs_col: bool,
        abs_row: bool,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

/// Binary operators, arithmetic and relational
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Expr {
    pub fn number(n: f64) -> Self {
        Expr::Number(n)
    }

    pub fn text(value: impl Into<String>, quoted: bool) -> Self {
        Expr::Text {
            value: value.into(),
            quoted,
        }
    }

    pub fn cell_ref(pos: Position, abs_col: bool, abs_row: bool) -> Self {
        Expr::CellRef {
            pos,
            abs_col,
            abs_row,
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Shift relative reference components by `delta`.
    ///
    /// Applied to a tree after it has been copied to a new cell; absolute
    /// components stay pinned to their original axis.
    pub fn shift(&mut self, delta: (i64, i64)) {
        match self {
            Expr::Number(_) | Expr::Text { .. } => {}
            Expr::CellRef {
                pos,
                abs_col,
                abs_row,
            } => {
                let dc = if *abs_col { 0 } else { delta.0 };
                let dr = if *abs_row { 0 } else { delta.1 };
                *pos = *pos + (dc, dr);
            }
            Expr::Unary { operand, .. } => operand.shift(delta),
            Expr::Binary { left, right, .. } => {
                left.shift(delta);
                right.shift(delta);
            }
        }
    }

    /// Collect every cell position referenced by this tree.
    pub fn references(&self, out: &mut Vec<Position>) {
        match self {
            Expr::Number(_) | Expr::Text { .. } => {}
            Expr::CellRef { pos, .. } => out.push(*pos),
            Expr::Unary { operand, .. } => operand.references(out),
            Expr::Binary { left, right, .. } => {
                left.references(out);
                right.references(out);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", number_text(*n)),
            Expr::Text { value, quoted } => {
                if *quoted {
                    write!(f, "\"{}\"", value.replace('"', "\"\""))
                } else {
                    write!(f, "{}", value)
                }
            }
            Expr::CellRef {
                pos,
                abs_col,
                abs_row,
            } => write!(
                f,
                "{}{}{}{}",
                if *abs_col { "$" } else { "" },
                pos.column_label(),
                if *abs_row { "$" } else { "" },
                pos.row
            ),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => write!(f, "(-{})", operand),
            Expr::Binary { left, op, right } => write!(f, "({}{}{})", left, op, right),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Pow => write!(f, "^"),
            BinaryOp::Eq => write!(f, "="),
            BinaryOp::Ne => write!(f, "<>"),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Le => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::Ge => write!(f, ">="),
        }
    }
}

/// Top-of-tree wrapper held by every live cell.
///
/// A root with no child represents a cell that has been referenced but
/// never assigned: it evaluates to Undefined and prints as nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Root {
    pub expr: Option<Expr>,
    pub is_formula: bool,
}

impl Root {
    pub fn new(expr: Expr, is_formula: bool) -> Self {
        Root {
            expr: Some(expr),
            is_formula,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    pub fn shift(&mut self, delta: (i64, i64)) {
        if let Some(expr) = &mut self.expr {
            expr.shift(delta);
        }
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_formula {
            write!(f, "=")?;
        }
        if let Some(expr) = &self.expr {
            write!(f, "{}", expr)?;
        }
        Ok(())
    }
}
