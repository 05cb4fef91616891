//! Header-row classification and display/logical row translation.
//!
//! Whether row 0 is a header is inferred from occupancy, and every
//! index translation between display rows (what the grid shows) and
//! logical rows (keys in the store) goes through `RowMapping`, so the
//! off-by-one lives in exactly one place.

use crate::cell::CellValue;
use crate::store::CellStore;

/// Translation between display rows and logical rows for one worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMapping {
    has_header: bool,
}

impl RowMapping {
    /// Classify row 0: it is a header when at least half of the
    /// declared columns are populated.
    pub fn detect(store: &CellStore, column_count: usize) -> Self {
        let populated = store.populated_in_row(0);
        RowMapping {
            has_header: column_count > 0 && (populated as f64) >= 0.5 * column_count as f64,
        }
    }

    pub fn with_header(has_header: bool) -> Self {
        RowMapping { has_header }
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Display row -> logical row in the store.
    pub fn to_logical(&self, display_row: usize) -> usize {
        if self.has_header {
            display_row + 1
        } else {
            display_row
        }
    }

    /// Logical row -> display row. `None` when the logical row is the
    /// header itself and therefore not a data row.
    pub fn to_display(&self, logical_row: usize) -> Option<usize> {
        if self.has_header {
            logical_row.checked_sub(1)
        } else {
            Some(logical_row)
        }
    }

    /// Number of data rows for a given logical row count.
    pub fn data_rows(&self, logical_rows: usize) -> usize {
        if self.has_header {
            logical_rows.saturating_sub(1)
        } else {
            logical_rows
        }
    }
}

/// Convert a column index to its spreadsheet letter (0 -> A, 25 -> Z,
/// 26 -> AA). Bijective base-26: subtract one before producing the
/// next digit so Z rolls over to AA.
pub fn column_label(col: usize) -> String {
    let mut label = String::new();
    let mut n = col;
    loop {
        label.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label
}

/// Display name for a column: the header cell's text when a header row
/// is present and the cell is non-blank, otherwise the generated
/// letter label.
pub fn column_display_name(store: &CellStore, mapping: RowMapping, col: usize) -> String {
    if mapping.has_header() {
        if let Some(cell) = store.get(0, col) {
            if let CellValue::Text(s) = &cell.value {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }
    column_label(col)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_row0(populated: usize) -> CellStore {
        let mut store = CellStore::new();
        for col in 0..populated {
            store.set_input(0, col, &format!("h{}", col));
        }
        store
    }

    #[test]
    fn header_detected_at_exactly_half_occupancy() {
        // ceil(5 / 2) = 3 populated cells is a header, 2 is not
        let mapping = RowMapping::detect(&store_with_row0(3), 5);
        assert!(mapping.has_header());
        let mapping = RowMapping::detect(&store_with_row0(2), 5);
        assert!(!mapping.has_header());
    }

    #[test]
    fn header_detected_at_half_for_even_width() {
        let mapping = RowMapping::detect(&store_with_row0(2), 4);
        assert!(mapping.has_header());
        let mapping = RowMapping::detect(&store_with_row0(1), 4);
        assert!(!mapping.has_header());
    }

    #[test]
    fn empty_store_has_no_header() {
        let mapping = RowMapping::detect(&CellStore::new(), 8);
        assert!(!mapping.has_header());
        let mapping = RowMapping::detect(&CellStore::new(), 0);
        assert!(!mapping.has_header());
    }

    #[test]
    fn row_translation_with_header() {
        let mapping = RowMapping::with_header(true);
        assert_eq!(mapping.to_logical(0), 1);
        assert_eq!(mapping.to_logical(5), 6);
        assert_eq!(mapping.to_display(1), Some(0));
        assert_eq!(mapping.to_display(0), None);
    }

    #[test]
    fn row_translation_without_header() {
        let mapping = RowMapping::with_header(false);
        assert_eq!(mapping.to_logical(3), 3);
        assert_eq!(mapping.to_display(3), Some(3));
    }

    #[test]
    fn translation_round_trips() {
        for has_header in [false, true] {
            let mapping = RowMapping::with_header(has_header);
            for display in 0..20 {
                assert_eq!(mapping.to_display(mapping.to_logical(display)), Some(display));
            }
        }
    }

    #[test]
    fn column_labels_are_bijective_base26() {
        assert_eq!(column_label(0), "A");
        assert_eq!(column_label(25), "Z");
        assert_eq!(column_label(26), "AA");
        assert_eq!(column_label(27), "AB");
        assert_eq!(column_label(701), "ZZ");
        assert_eq!(column_label(702), "AAA");
    }

    #[test]
    fn column_display_name_prefers_header_text() {
        let mut store = CellStore::new();
        store.set_input(0, 0, "Name");
        store.set_input(0, 1, "Age");
        let mapping = RowMapping::detect(&store, 3);
        assert!(mapping.has_header());

        assert_eq!(column_display_name(&store, mapping, 0), "Name");
        assert_eq!(column_display_name(&store, mapping, 1), "Age");
        // No header cell at column 2, fall back to the letter
        assert_eq!(column_display_name(&store, mapping, 2), "C");
    }

    #[test]
    fn column_display_name_without_header_uses_labels() {
        let store = store_with_row0(1);
        let mapping = RowMapping::detect(&store, 8);
        assert!(!mapping.has_header());
        assert_eq!(column_display_name(&store, mapping, 0), "A");
    }
}
