use std::cmp::Ordering;

use gridcalc_core::{number_text, Value};

use crate::expr::{BinaryOp, Expr, Root, UnaryOp};
use crate::table::CellTable;

/// Evaluates expression trees against a cell table.
///
/// References are resolved by position lookup at the moment they are
/// evaluated. Callers are expected to run cycle detection first; the
/// evaluator itself assumes the dependency graph below the tree it is
/// given is acyclic.
pub struct Evaluator<'a> {
    table: &'a CellTable,
}

impl<'a> Evaluator<'a> {
    pub fn new(table: &'a CellTable) -> Self {
        Evaluator { table }
    }

    /// Evaluate a cell's root; an empty root is Undefined.
    pub fn evaluate_root(&self, root: &Root) -> Value {
        match &root.expr {
            Some(expr) => self.evaluate(expr),
            None => Value::Undefined,
        }
    }

    pub fn evaluate(&self, expr: &Expr) -> Value {
        match expr {
            Expr::Number(n) => Value::Number(*n),
            Expr::Text { value, .. } => Value::Text(value.clone()),
            Expr::CellRef { pos, .. } => match self.table.get(*pos) {
                Some(root) => self.evaluate_root(root),
                None => Value::Undefined,
            },
            Expr::Unary { op, operand } => self.eval_unary(*op, operand),
            Expr::Binary { left, op, right } => self.eval_binary(left, *op, right),
        }
    }

    fn eval_unary(&self, op: UnaryOp, operand: &Expr) -> Value {
        let value = self.evaluate(operand);
        match op {
            UnaryOp::Neg => match value {
                Value::Number(n) => Value::Number(-n),
                _ => Value::Undefined,
            },
        }
    }

    fn eval_binary(&self, left: &Expr, op: BinaryOp, right: &Expr) -> Value {
        let left = self.evaluate(left);
        let right = self.evaluate(right);

        match op {
            BinaryOp::Add => add(left, right),
            BinaryOp::Sub => numeric(left, right, |a, b| a - b),
            BinaryOp::Mul => numeric(left, right, |a, b| a * b),
            BinaryOp::Div => match (left, right) {
                (Value::Number(a), Value::Number(b)) if b != 0.0 => Value::Number(a / b),
                _ => Value::Undefined,
            },
            BinaryOp::Pow => numeric(left, right, f64::powf),
            BinaryOp::Eq => compare(left, right, |o| o == Ordering::Equal),
            BinaryOp::Ne => compare(left, right, |o| o != Ordering::Equal),
            BinaryOp::Lt => compare(left, right, |o| o == Ordering::Less),
            BinaryOp::Le => compare(left, right, |o| o != Ordering::Greater),
            BinaryOp::Gt => compare(left, right, |o| o == Ordering::Greater),
            BinaryOp::Ge => compare(left, right, |o| o != Ordering::Less),
        }
    }
}

/// `+` is the one overloaded operator: numeric addition, string
/// concatenation, and mixed number/string concatenation where the number
/// side is converted with [`number_text`].
fn add(left: Value, right: Value) -> Value {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
        (Value::Text(a), Value::Text(b)) => Value::Text(format!("{}{}", a, b)),
        (Value::Number(a), Value::Text(b)) => Value::Text(format!("{}{}", number_text(a), b)),
        (Value::Text(a), Value::Number(b)) => Value::Text(format!("{}{}", a, number_text(b))),
        _ => Value::Undefined,
    }
}

fn numeric(left: Value, right: Value, op: impl Fn(f64, f64) -> f64) -> Value {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Value::Number(op(a, b)),
        _ => Value::Undefined,
    }
}

/// Relational result: 1.0 when the ordering satisfies the operator,
/// 0.0 when it does not, Undefined for mixed or undefined operands.
/// Text compares byte-wise (case-sensitive).
fn compare(left: Value, right: Value, holds: impl Fn(Ordering) -> bool) -> Value {
    let ordering = match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        _ => None,
    };

    match ordering {
        Some(o) => Value::Number(if holds(o) { 1.0 } else { 0.0 }),
        None => Value::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use gridcalc_core::Position;

    /// Build a table from (position, contents) pairs and evaluate `probe`.
    fn eval_in(cells: &[(&str, &str)], probe: &str) -> Value {
        let mut table = CellTable::new();
        for (pos, contents) in cells {
            let compiled = compile(contents).unwrap();
            for target in &compiled.references {
                table.ensure(*target);
            }
            table.insert(Position::parse(pos).unwrap(), compiled.root);
        }

        let compiled = compile(probe).unwrap();
        let evaluator = Evaluator::new(&table);
        evaluator.evaluate_root(&compiled.root)
    }

    fn eval(probe: &str) -> Value {
        eval_in(&[], probe)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("=1 + 2"), Value::Number(3.0));
        assert_eq!(eval("=10 - 3"), Value::Number(7.0));
        assert_eq!(eval("=4 * 5"), Value::Number(20.0));
        assert_eq!(eval("=20 / 4"), Value::Number(5.0));
        assert_eq!(eval("=2 ^ 10"), Value::Number(1024.0));
        assert_eq!(eval("=-(3 + 4)"), Value::Number(-7.0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("=1 / 0"), Value::Undefined);
        assert_eq!(eval("=0 / 0"), Value::Undefined);
        assert_eq!(eval("=1 / (2 - 2)"), Value::Undefined);
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            eval("=\"foo\" + \"bar\""),
            Value::Text("foobar".to_string())
        );
        assert_eq!(eval("=\"n=\" + 2"), Value::Text("n=2".to_string()));
        assert_eq!(eval("=1.5 + \"x\""), Value::Text("1.5x".to_string()));
    }

    #[test]
    fn test_type_mismatches_are_undefined() {
        assert_eq!(eval("=\"a\" - 1"), Value::Undefined);
        assert_eq!(eval("=\"a\" * \"b\""), Value::Undefined);
        assert_eq!(eval("=2 ^ \"a\""), Value::Undefined);
        assert_eq!(eval("=-\"a\""), Value::Undefined);
        assert_eq!(eval("=\"a\" < 1"), Value::Undefined);
    }

    #[test]
    fn test_undefined_propagates() {
        // C9 exists nowhere, so it evaluates to Undefined
        assert_eq!(eval("=C9 + 1"), Value::Undefined);
        assert_eq!(eval("=1 + C9"), Value::Undefined);
        assert_eq!(eval("=\"a\" + C9"), Value::Undefined);
    }

    #[test]
    fn test_numeric_comparison() {
        assert_eq!(eval("=1 < 2"), Value::Number(1.0));
        assert_eq!(eval("=2 < 1"), Value::Number(0.0));
        assert_eq!(eval("=2 <= 2"), Value::Number(1.0));
        assert_eq!(eval("=2 >= 3"), Value::Number(0.0));
        assert_eq!(eval("=2 > 1"), Value::Number(1.0));
        assert_eq!(eval("=1 = 1"), Value::Number(1.0));
        assert_eq!(eval("=1 <> 1"), Value::Number(0.0));
    }

    #[test]
    fn test_text_comparison_is_byte_wise() {
        assert_eq!(eval("=\"abc\" < \"abd\""), Value::Number(1.0));
        assert_eq!(eval("=\"abc\" = \"abc\""), Value::Number(1.0));
        // Uppercase sorts before lowercase in byte order
        assert_eq!(eval("=\"Z\" < \"a\""), Value::Number(1.0));
        assert_eq!(eval("=\"b\" <= \"a\""), Value::Number(0.0));
    }

    #[test]
    fn test_pow_keeps_ieee_results() {
        assert_eq!(eval("=(-2) ^ 2"), Value::Number(4.0));
        match eval("=0 ^ -1") {
            Value::Number(n) => assert!(n.is_infinite()),
            other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn test_references_resolve_through_the_table() {
        assert_eq!(
            eval_in(&[("A1", "10"), ("A2", "=A1*2")], "=A1 + A2"),
            Value::Number(30.0)
        );
    }

    #[test]
    fn test_reference_chain() {
        let cells = [("A1", "7"), ("B1", "=A1"), ("C1", "=B1"), ("D1", "=C1")];
        assert_eq!(eval_in(&cells, "=D1"), Value::Number(7.0));
    }

    #[test]
    fn test_empty_and_missing_cells_are_undefined() {
        // B9 is materialized as an empty root by the reference in the probe
        assert_eq!(eval_in(&[("A1", "=B9")], "=A1"), Value::Undefined);
        assert_eq!(eval("=Q42"), Value::Undefined);
    }

    #[test]
    fn test_literal_cells() {
        assert_eq!(eval_in(&[("A1", "hello")], "=A1"), Value::Text("hello".to_string()));
        assert_eq!(eval_in(&[("A1", "3.5")], "=A1"), Value::Number(3.5));
    }

    #[test]
    fn test_evaluation_is_pure() {
        let mut table = CellTable::new();
        let compiled = compile("=A1+A1").unwrap();
        for target in &compiled.references {
            table.ensure(*target);
        }
        table.insert(Position::parse("B1").unwrap(), compiled.root);
        table.insert(
            Position::parse("A1").unwrap(),
            compile("21").unwrap().root,
        );

        let before = table.clone();
        let evaluator = Evaluator::new(&table);
        let root = table.get(Position::parse("B1").unwrap()).unwrap();
        let first = evaluator.evaluate_root(root);
        let second = evaluator.evaluate_root(root);

        assert_eq!(first, Value::Number(42.0));
        assert_eq!(first, second);
        assert_eq!(table, before);
    }
}
