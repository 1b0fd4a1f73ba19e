use std::collections::btree_map;
use std::collections::BTreeMap;

use gridcalc_core::Position;

use crate::expr::{Expr, Root};

/// Sparse cell storage: position -> owned root tree.
///
/// Keys are ordered column-major (the `Position` ordering), so iteration
/// and the persistence format are deterministic. References are resolved
/// against the table at evaluation time; [`CellTable::ensure`] keeps the
/// invariant that every position referenced by an installed tree has an
/// entry, possibly an empty root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellTable {
    cells: BTreeMap<Position, Root>,
}

impl CellTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: Position) -> Option<&Root> {
        self.cells.get(&pos)
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Root> {
        self.cells.get_mut(&pos)
    }

    /// Install a root at `pos`, replacing any previous contents.
    pub fn insert(&mut self, pos: Position, root: Root) {
        self.cells.insert(pos, root);
    }

    pub fn remove(&mut self, pos: Position) -> Option<Root> {
        self.cells.remove(&pos)
    }

    /// Materialize an empty root at `pos` if the cell does not exist yet.
    pub fn ensure(&mut self, pos: Position) -> &mut Root {
        self.cells.entry(pos).or_default()
    }

    /// Ensure an entry exists for every cell referenced by `expr`.
    pub fn materialize_targets(&mut self, expr: &Expr) {
        let mut targets = Vec::new();
        expr.references(&mut targets);
        for pos in targets {
            self.ensure(pos);
        }
    }

    /// Iterate cells in (column, row) order.
    pub fn iter(&self) -> btree_map::Iter<'_, Position, Root> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
