use std::fmt;

use crate::store::CellStore;

/// Opaque worksheet identifier, assigned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorksheetId(String);

impl WorksheetId {
    pub fn new(id: impl Into<String>) -> Self {
        WorksheetId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorksheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check if a worksheet name is valid (non-empty after trimming).
pub fn is_valid_worksheet_name(name: &str) -> bool {
    !name.trim().is_empty()
}

/// One named, independently addressable grid of cells; analogous to a
/// tab in the spreadsheet.
#[derive(Debug, Clone)]
pub struct Worksheet {
    pub id: WorksheetId,
    pub name: String,
    pub cells: CellStore,
}

impl Worksheet {
    pub fn new(id: WorksheetId, name: impl Into<String>) -> Self {
        Worksheet {
            id,
            name: name.into(),
            cells: CellStore::new(),
        }
    }

    /// Derived name for a duplicate of this worksheet.
    pub fn copy_name(&self) -> String {
        format!("{} (Copy)", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_invalid() {
        assert!(!is_valid_worksheet_name(""));
        assert!(!is_valid_worksheet_name("   "));
        assert!(is_valid_worksheet_name("Q3 Data"));
    }

    #[test]
    fn copy_name_appends_suffix() {
        let ws = Worksheet::new(WorksheetId::new("w1"), "Revenue");
        assert_eq!(ws.copy_name(), "Revenue (Copy)");
    }
}
