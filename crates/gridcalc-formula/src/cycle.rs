use std::collections::HashSet;

use gridcalc_core::Position;

use crate::expr::{Expr, Root};
use crate::table::CellTable;

/// Check whether evaluating the cell at `start` would revisit a cell that
/// is already on the evaluation path.
///
/// The visiting set is the current DFS stack: a position is added when the
/// walk descends through a reference to it and removed again on a clean
/// ascent, so diamond-shaped dependency graphs are not reported as cycles.
/// `start` is seeded onto the stack, which catches self-references.
pub fn root_has_cycle(root: &Root, start: Position, table: &CellTable) -> bool {
    let mut visiting = HashSet::new();
    visiting.insert(start);

    root.expr
        .as_ref()
        .map_or(false, |expr| expr_has_cycle(expr, table, &mut visiting))
}

fn expr_has_cycle(expr: &Expr, table: &CellTable, visiting: &mut HashSet<Position>) -> bool {
    match expr {
        Expr::Number(_) | Expr::Text { .. } => false,
        Expr::Unary { operand, .. } => expr_has_cycle(operand, table, visiting),
        Expr::Binary { left, right, .. } => {
            expr_has_cycle(left, table, visiting) || expr_has_cycle(right, table, visiting)
        }
        Expr::CellRef { pos, .. } => {
            if !visiting.insert(*pos) {
                return true;
            }

            let found = table
                .get(*pos)
                .and_then(|root| root.expr.as_ref())
                .map_or(false, |child| expr_has_cycle(child, table, visiting));

            if !found {
                visiting.remove(pos);
            }
            found
        }
    }
}
