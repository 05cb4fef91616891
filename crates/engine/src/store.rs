use rustc_hash::FxHashMap;

use crate::cell::Cell;

/// A cell position: (row, column), both 0-based logical indices.
pub type CellKey = (usize, usize);

/// Sparse map from (row, column) to cell content. The single source of
/// truth for what the grid renders; a key absent from the map is an
/// empty cell.
#[derive(Debug, Clone, Default)]
pub struct CellStore {
    cells: FxHashMap<CellKey, Cell>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Replace the cell at (row, col). A `set` always supersedes prior
    /// content at that key.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells.insert((row, col), cell);
    }

    /// Remove the cell at (row, col); equivalent to setting it empty.
    pub fn clear(&mut self, row: usize, col: usize) -> Option<Cell> {
        self.cells.remove(&(row, col))
    }

    /// Apply raw user input at (row, col): blank input clears the cell,
    /// anything else replaces it.
    pub fn set_input(&mut self, row: usize, col: usize, input: &str) {
        match Cell::from_input(input) {
            Some(cell) => self.set(row, col, cell),
            None => {
                self.clear(row, col);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &Cell)> {
        self.cells.iter()
    }

    /// All populated cells in row-major order. Used when persisting a
    /// whole worksheet (tab switch, duplication) or exporting.
    pub fn snapshot(&self) -> Vec<(CellKey, Cell)> {
        let mut cells: Vec<_> = self
            .cells
            .iter()
            .map(|(key, cell)| (*key, cell.clone()))
            .collect();
        cells.sort_by_key(|(key, _)| *key);
        cells
    }

    /// (rows, cols) needed to fit every populated cell: maximum
    /// observed row/column + 1, or (0, 0) when empty. Occupied cells
    /// may exceed the spreadsheet's declared bounds, so the grid grows
    /// to whichever is larger.
    pub fn extent(&self) -> (usize, usize) {
        self.cells.keys().fold((0, 0), |(rows, cols), &(r, c)| {
            (rows.max(r + 1), cols.max(c + 1))
        })
    }

    /// Count of non-empty cells in a logical row.
    pub fn populated_in_row(&self, row: usize) -> usize {
        self.cells
            .iter()
            .filter(|(&(r, _), cell)| r == row && !cell.value.is_empty())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellValue, DataType};

    #[test]
    fn set_supersedes_prior_content() {
        let mut store = CellStore::new();
        store.set_input(1, 2, "first");
        store.set_input(1, 2, "99");

        assert_eq!(store.len(), 1);
        let cell = store.get(1, 2).unwrap();
        assert_eq!(cell.value, CellValue::Number(99.0));
        assert_eq!(cell.data_type, DataType::Number);
    }

    #[test]
    fn blank_input_clears() {
        let mut store = CellStore::new();
        store.set_input(0, 0, "x");
        store.set_input(0, 0, "   ");
        assert!(store.get(0, 0).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_is_row_major() {
        let mut store = CellStore::new();
        store.set_input(2, 0, "c");
        store.set_input(0, 1, "b");
        store.set_input(0, 0, "a");

        let keys: Vec<_> = store.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![(0, 0), (0, 1), (2, 0)]);
    }

    #[test]
    fn extent_tracks_max_observed_plus_one() {
        let mut store = CellStore::new();
        assert_eq!(store.extent(), (0, 0));
        store.set_input(4, 7, "x");
        store.set_input(9, 2, "y");
        assert_eq!(store.extent(), (10, 8));
    }

    #[test]
    fn populated_in_row_ignores_blank_text() {
        let mut store = CellStore::new();
        store.set_input(0, 0, "Name");
        store.set_input(0, 1, "Age");
        store.set(
            0,
            2,
            Cell::imported(CellValue::Text("  ".into()), None, DataType::Text),
        );
        store.set_input(1, 0, "Alice");

        assert_eq!(store.populated_in_row(0), 2);
        assert_eq!(store.populated_in_row(1), 1);
    }
}
