use std::fmt;

use gridcalc_core::{Position, Value};
use gridcalc_formula::{compile, root_has_cycle, CellTable, Evaluator, Root};

/// Capability bit: `get_value` returns Undefined instead of diverging when
/// cells form a reference cycle.
pub const CAP_CYCLIC_DEPS: u32 = 0x01;

/// A single spreadsheet: the cell table plus every operation on it.
///
/// Cloning a sheet is a deep copy; references inside the clone resolve
/// against the clone's own table, so the two sheets evolve independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    table: CellTable,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capability flags advertised by this engine.
    pub const fn capabilities() -> u32 {
        CAP_CYCLIC_DEPS
    }

    /// Set the contents of a cell from raw text.
    ///
    /// Contents are compiled into a temporary tree first; the table is
    /// only touched when compilation succeeds, so a rejected edit leaves
    /// the cell (and the rest of the sheet) exactly as it was. Returns
    /// false on rejection.
    pub fn set_cell(&mut self, pos: Position, contents: &str) -> bool {
        match compile(contents) {
            Ok(cell) => {
                for target in &cell.references {
                    self.table.ensure(*target);
                }
                self.table.insert(pos, cell.root);
                true
            }
            Err(err) => {
                tracing::debug!(cell = %pos, error = %err, "cell contents rejected");
                false
            }
        }
    }

    /// Evaluate a cell.
    ///
    /// Missing cells, empty cells and cells on (or depending on) a
    /// reference cycle are all Undefined. Evaluation never mutates the
    /// sheet.
    pub fn get_value(&self, pos: Position) -> Value {
        let root = match self.table.get(pos) {
            Some(root) => root,
            None => return Value::Undefined,
        };

        if root_has_cycle(root, pos, &self.table) {
            return Value::Undefined;
        }

        Evaluator::new(&self.table).evaluate_root(root)
    }

    /// Copy a `width` x `height` rectangle of cells from `src` to `dst`.
    ///
    /// Relative reference components in the copied trees shift by the copy
    /// delta; absolute components stay pinned. Empty source cells erase
    /// their destination. The source rectangle is snapshotted before
    /// anything is written, so overlapping rectangles behave as a
    /// simultaneous copy. Non-positive extents are a no-op.
    pub fn copy_rect(&mut self, dst: Position, src: Position, width: i64, height: i64) {
        if width < 1 || height < 1 {
            return;
        }
        let delta = (dst.column - src.column, dst.row - src.row);

        let mut snapshot = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let from = src + (x, y);
                let cell = self
                    .table
                    .get(from)
                    .and_then(|root| root.expr.clone().map(|expr| (expr, root.is_formula)));
                snapshot.push(((x, y), cell));
            }
        }

        for ((x, y), cell) in snapshot {
            let to = dst + (x, y);
            match cell {
                None => {
                    self.table.remove(to);
                }
                Some((mut expr, is_formula)) => {
                    expr.shift(delta);
                    self.table.materialize_targets(&expr);
                    self.table.insert(to, Root::new(expr, is_formula));
                }
            }
        }
    }

    /// The canonical source text of a cell, if it has contents.
    pub fn cell_text(&self, pos: Position) -> Option<String> {
        self.table
            .get(pos)
            .filter(|root| !root.is_empty())
            .map(|root| root.to_string())
    }

    /// Number of cells with contents (referenced-but-unassigned cells do
    /// not count).
    pub fn cell_count(&self) -> usize {
        self.table.iter().filter(|(_, root)| !root.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Bounding box of all cells with contents.
    pub fn used_range(&self) -> Option<(Position, Position)> {
        let mut bounds: Option<(Position, Position)> = None;

        for (pos, root) in self.table.iter() {
            if root.is_empty() {
                continue;
            }
            bounds = Some(match bounds {
                None => (*pos, *pos),
                Some((min, max)) => (
                    Position::new(min.column.min(pos.column), min.row.min(pos.row)),
                    Position::new(max.column.max(pos.column), max.row.max(pos.row)),
                ),
            });
        }

        bounds
    }

    pub(crate) fn table(&self) -> &CellTable {
        &self.table
    }
}

impl fmt::Display for Sheet {
    /// One `A1:contents` line per cell with contents, in table order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, root) in self.table.iter() {
            if root.is_empty() {
                continue;
            }
            writeln!(f, "{}:{}", pos, root)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(text: &str) -> Position {
        Position::parse(text).unwrap()
    }

    fn sheet_of(cells: &[(&str, &str)]) -> Sheet {
        let mut sheet = Sheet::new();
        for (at, contents) in cells {
            assert!(sheet.set_cell(pos(at), contents), "rejected {:?}", contents);
        }
        sheet
    }

    #[test]
    fn test_capabilities() {
        assert_eq!(Sheet::capabilities() & CAP_CYCLIC_DEPS, CAP_CYCLIC_DEPS);
    }

    #[test]
    fn test_literal_plus_formula() {
        let sheet = sheet_of(&[("A1", "10"), ("A2", "=A1+5")]);
        assert_eq!(sheet.get_value(pos("A2")), Value::Number(15.0));
    }

    #[test]
    fn test_cycle_yields_undefined_everywhere() {
        let sheet = sheet_of(&[("A1", "=A2"), ("A2", "=A1")]);
        assert_eq!(sheet.get_value(pos("A1")), Value::Undefined);
        assert_eq!(sheet.get_value(pos("A2")), Value::Undefined);
    }

    #[test]
    fn test_division_by_zero() {
        let sheet = sheet_of(&[("A1", "=1/0")]);
        assert_eq!(sheet.get_value(pos("A1")), Value::Undefined);
    }

    #[test]
    fn test_string_number_concatenation() {
        let sheet = sheet_of(&[("A1", "hello"), ("A2", "=A1+1")]);
        assert_eq!(sheet.get_value(pos("A2")), Value::Text("hello1".to_string()));
    }

    #[test]
    fn test_missing_and_empty_cells() {
        let sheet = sheet_of(&[("A1", "=B7")]);
        // B7 was materialized (empty) by the reference, C1 never existed
        assert_eq!(sheet.get_value(pos("A1")), Value::Undefined);
        assert_eq!(sheet.get_value(pos("B7")), Value::Undefined);
        assert_eq!(sheet.get_value(pos("C1")), Value::Undefined);
    }

    #[test]
    fn test_rejected_contents_leave_the_sheet_alone() {
        let mut sheet = sheet_of(&[("A1", "=1+2")]);
        let before = sheet.clone();

        assert!(!sheet.set_cell(pos("A1"), "=1+"));
        assert!(!sheet.set_cell(pos("B1"), "=(3"));
        assert!(!sheet.set_cell(pos("C1"), "=Z9+"));

        // No dangling roots at B1/C1, no stray target from the failed Z9 parse
        assert_eq!(sheet, before);
        assert_eq!(sheet.get_value(pos("A1")), Value::Number(3.0));
    }

    #[test]
    fn test_overwrite_cell() {
        let mut sheet = sheet_of(&[("A1", "1"), ("B1", "=A1*10")]);
        assert_eq!(sheet.get_value(pos("B1")), Value::Number(10.0));

        sheet.set_cell(pos("A1"), "5");
        assert_eq!(sheet.get_value(pos("B1")), Value::Number(50.0));

        sheet.set_cell(pos("B1"), "plain");
        assert_eq!(sheet.get_value(pos("B1")), Value::Text("plain".to_string()));
    }

    #[test]
    fn test_copy_rect_shifts_relative_references() {
        let mut sheet = sheet_of(&[("B2", "=A1")]);
        sheet.copy_rect(pos("C3"), pos("B2"), 1, 1);

        assert_eq!(sheet.cell_text(pos("C3")).unwrap(), "=B2");
        assert_eq!(sheet.get_value(pos("C3")), Value::Undefined);

        sheet.set_cell(pos("B2"), "7");
        assert_eq!(sheet.get_value(pos("C3")), Value::Number(7.0));
    }

    #[test]
    fn test_copy_rect_pins_absolute_references() {
        let mut sheet = sheet_of(&[("B2", "=$A$1+A2"), ("A1", "10"), ("A2", "3")]);
        assert_eq!(sheet.get_value(pos("B2")), Value::Number(13.0));

        sheet.copy_rect(pos("C3"), pos("B2"), 1, 1);
        assert_eq!(sheet.cell_text(pos("C3")).unwrap(), "=($A$1+B3)");
        // B3 is empty, so the sum is Undefined until it gets a value
        assert_eq!(sheet.get_value(pos("C3")), Value::Undefined);

        sheet.set_cell(pos("B3"), "4");
        assert_eq!(sheet.get_value(pos("C3")), Value::Number(14.0));
    }

    #[test]
    fn test_copy_rect_mixed_flags() {
        let mut sheet = sheet_of(&[("A1", "=$B1+B$1")]);
        sheet.copy_rect(pos("C4"), pos("A1"), 1, 1);
        // Column pinned on the first operand, row pinned on the second
        assert_eq!(sheet.cell_text(pos("C4")).unwrap(), "=($B4+D$1)");
    }

    #[test]
    fn test_copy_rect_empty_source_erases_destination() {
        let mut sheet = sheet_of(&[("A1", "1"), ("B1", "2"), ("A2", "3")]);
        // Source rectangle A5:B6 is entirely empty
        sheet.copy_rect(pos("A1"), pos("A5"), 2, 2);

        assert_eq!(sheet.get_value(pos("A1")), Value::Undefined);
        assert_eq!(sheet.get_value(pos("B1")), Value::Undefined);
        assert_eq!(sheet.get_value(pos("A2")), Value::Undefined);
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_copy_rect_overlapping_ranges() {
        // A1=1, B1=2, C1=3; copy A1:C1 one column right
        let mut sheet = sheet_of(&[("A1", "1"), ("B1", "2"), ("C1", "3")]);
        sheet.copy_rect(pos("B1"), pos("A1"), 3, 1);

        // The snapshot was taken before any write
        assert_eq!(sheet.get_value(pos("A1")), Value::Number(1.0));
        assert_eq!(sheet.get_value(pos("B1")), Value::Number(1.0));
        assert_eq!(sheet.get_value(pos("C1")), Value::Number(2.0));
        assert_eq!(sheet.get_value(pos("D1")), Value::Number(3.0));
    }

    #[test]
    fn test_copy_rect_overlapping_formulas() {
        let mut sheet = sheet_of(&[("A1", "1"), ("A2", "=A1+1"), ("A3", "=A2+1")]);
        // Copy A2:A3 down one row; A3's new tree must come from the old A2
        sheet.copy_rect(pos("A3"), pos("A2"), 1, 2);

        assert_eq!(sheet.cell_text(pos("A3")).unwrap(), "=(A2+1)");
        assert_eq!(sheet.cell_text(pos("A4")).unwrap(), "=(A3+1)");
        assert_eq!(sheet.get_value(pos("A4")), Value::Number(4.0));
    }

    #[test]
    fn test_copy_rect_multi_cell_block() {
        let mut sheet = sheet_of(&[
            ("A1", "1"),
            ("B1", "2"),
            ("A2", "=A1+B1"),
            ("B2", "=$A$1*10"),
        ]);
        sheet.copy_rect(pos("C3"), pos("A1"), 2, 2);

        assert_eq!(sheet.get_value(pos("C3")), Value::Number(1.0));
        assert_eq!(sheet.get_value(pos("D3")), Value::Number(2.0));
        assert_eq!(sheet.get_value(pos("C4")), Value::Number(3.0));
        assert_eq!(sheet.get_value(pos("D4")), Value::Number(10.0));
    }

    #[test]
    fn test_copy_rect_degenerate_extent() {
        let mut sheet = sheet_of(&[("A1", "1")]);
        let before = sheet.clone();
        sheet.copy_rect(pos("B1"), pos("A1"), 0, 5);
        sheet.copy_rect(pos("B1"), pos("A1"), 5, -1);
        assert_eq!(sheet, before);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = sheet_of(&[("A1", "2"), ("B1", "=A1*3")]);
        let copy = original.clone();

        let mut original = original;
        original.set_cell(pos("A1"), "100");

        assert_eq!(original.get_value(pos("B1")), Value::Number(300.0));
        assert_eq!(copy.get_value(pos("B1")), Value::Number(6.0));
    }

    #[test]
    fn test_get_value_has_no_side_effects() {
        let sheet = sheet_of(&[("A1", "1"), ("B1", "=A1+C7")]);
        let before = sheet.clone();

        let first = sheet.get_value(pos("B1"));
        let second = sheet.get_value(pos("B1"));

        assert_eq!(first, second);
        assert_eq!(sheet, before);
    }

    #[test]
    fn test_cell_text_and_counts() {
        let sheet = sheet_of(&[("A1", "10"), ("B2", "=A1+5"), ("C3", "note")]);

        assert_eq!(sheet.cell_text(pos("A1")).unwrap(), "10");
        assert_eq!(sheet.cell_text(pos("B2")).unwrap(), "=(A1+5)");
        assert_eq!(sheet.cell_text(pos("C3")).unwrap(), "note");
        assert_eq!(sheet.cell_text(pos("D4")), None);

        assert_eq!(sheet.cell_count(), 3);
        assert!(!sheet.is_empty());
        assert_eq!(sheet.used_range(), Some((pos("A1"), pos("C3"))));
    }

    #[test]
    fn test_display_dump() {
        let sheet = sheet_of(&[("B1", "=A1+1"), ("A1", "2")]);
        assert_eq!(sheet.to_string(), "A1:2\nB1:=(A1+1)\n");
    }
}
