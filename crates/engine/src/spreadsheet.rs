use std::collections::BTreeMap;
use std::fmt;

use crate::worksheet::{is_valid_worksheet_name, Worksheet, WorksheetId};

/// Structural errors in worksheet operations. These are rejected
/// before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorksheetError {
    /// A spreadsheet always has at least one worksheet.
    LastWorksheet,
    /// No worksheet with the given id.
    UnknownWorksheet(WorksheetId),
    /// Rename to an empty/blank name.
    BlankName,
}

impl fmt::Display for WorksheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorksheetError::LastWorksheet => {
                write!(f, "Cannot delete the only worksheet in a spreadsheet")
            }
            WorksheetError::UnknownWorksheet(id) => write!(f, "Unknown worksheet: {}", id),
            WorksheetError::BlankName => write!(f, "Worksheet name cannot be blank"),
        }
    }
}

impl std::error::Error for WorksheetError {}

/// A spreadsheet: an ordered list of worksheets, exactly one of which
/// is active, plus declared grid bounds used for rendering.
#[derive(Debug, Clone)]
pub struct Spreadsheet {
    pub id: String,
    pub name: String,
    /// Declared bounds; occupied cells may exceed them.
    pub row_count: usize,
    pub column_count: usize,
    worksheets: Vec<Worksheet>,
    active: usize,
}

impl Spreadsheet {
    /// Create a spreadsheet with a single (active) worksheet.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        row_count: usize,
        column_count: usize,
        first: Worksheet,
    ) -> Self {
        Spreadsheet {
            id: id.into(),
            name: name.into(),
            row_count,
            column_count,
            worksheets: vec![first],
            active: 0,
        }
    }

    /// Build from an existing worksheet list. Fails when the list is
    /// empty; an out-of-range active index falls back to the first.
    pub fn from_worksheets(
        id: impl Into<String>,
        name: impl Into<String>,
        row_count: usize,
        column_count: usize,
        worksheets: Vec<Worksheet>,
        active: usize,
    ) -> Result<Self, WorksheetError> {
        if worksheets.is_empty() {
            return Err(WorksheetError::LastWorksheet);
        }
        let active = if active < worksheets.len() { active } else { 0 };
        Ok(Spreadsheet {
            id: id.into(),
            name: name.into(),
            row_count,
            column_count,
            worksheets,
            active,
        })
    }

    pub fn worksheet_count(&self) -> usize {
        self.worksheets.len()
    }

    pub fn worksheets(&self) -> &[Worksheet] {
        &self.worksheets
    }

    pub fn active_worksheet(&self) -> &Worksheet {
        &self.worksheets[self.active]
    }

    pub fn active_worksheet_mut(&mut self) -> &mut Worksheet {
        &mut self.worksheets[self.active]
    }

    pub fn active_id(&self) -> &WorksheetId {
        &self.worksheets[self.active].id
    }

    pub fn position(&self, id: &WorksheetId) -> Option<usize> {
        self.worksheets.iter().position(|w| &w.id == id)
    }

    pub fn worksheet(&self, id: &WorksheetId) -> Option<&Worksheet> {
        self.worksheets.iter().find(|w| &w.id == id)
    }

    pub fn worksheet_mut(&mut self, id: &WorksheetId) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|w| &w.id == id)
    }

    /// Make the given worksheet the active one. Exactly one worksheet
    /// is active after this returns Ok.
    pub fn set_active(&mut self, id: &WorksheetId) -> Result<(), WorksheetError> {
        let idx = self
            .position(id)
            .ok_or_else(|| WorksheetError::UnknownWorksheet(id.clone()))?;
        self.active = idx;
        Ok(())
    }

    /// Append a worksheet. It does not become active; callers activate
    /// explicitly.
    pub fn add_worksheet(&mut self, worksheet: Worksheet) {
        self.worksheets.push(worksheet);
    }

    pub fn rename_worksheet(
        &mut self,
        id: &WorksheetId,
        name: &str,
    ) -> Result<(), WorksheetError> {
        if !is_valid_worksheet_name(name) {
            return Err(WorksheetError::BlankName);
        }
        let ws = self
            .worksheet_mut(id)
            .ok_or_else(|| WorksheetError::UnknownWorksheet(id.clone()))?;
        ws.name = name.trim().to_string();
        Ok(())
    }

    /// Append a copy of the source worksheet under `new_id`, with a
    /// derived name and a snapshot of its cells. Pending edit state is
    /// never part of the worksheet itself, so only settled content is
    /// copied.
    pub fn duplicate_worksheet(
        &mut self,
        source: &WorksheetId,
        new_id: WorksheetId,
    ) -> Result<&Worksheet, WorksheetError> {
        let src = self
            .worksheet(source)
            .ok_or_else(|| WorksheetError::UnknownWorksheet(source.clone()))?;
        let copy = Worksheet {
            id: new_id,
            name: src.copy_name(),
            cells: src.cells.clone(),
        };
        self.worksheets.push(copy);
        let idx = self.worksheets.len() - 1;
        Ok(&self.worksheets[idx])
    }

    /// Delete a worksheet. Forbidden for the last one. If the deleted
    /// worksheet was active, activation falls to the first remaining.
    pub fn delete_worksheet(&mut self, id: &WorksheetId) -> Result<(), WorksheetError> {
        if self.worksheets.len() <= 1 {
            return Err(WorksheetError::LastWorksheet);
        }
        let idx = self
            .position(id)
            .ok_or_else(|| WorksheetError::UnknownWorksheet(id.clone()))?;
        self.worksheets.remove(idx);

        if self.active == idx {
            self.active = 0;
        } else if self.active > idx {
            self.active -= 1;
        }
        Ok(())
    }

    /// Full `{worksheet id: name}` map, for pushing tab metadata to
    /// the persistence layer after any name-set change.
    pub fn names(&self) -> BTreeMap<String, String> {
        self.worksheets
            .iter()
            .map(|w| (w.id.as_str().to_string(), w.name.clone()))
            .collect()
    }

    /// Grid dimensions to render for the active worksheet: declared
    /// bounds grown to fit the maximum occupied cell.
    pub fn grid_extent(&self) -> (usize, usize) {
        let (rows, cols) = self.active_worksheet().cells.extent();
        (self.row_count.max(rows), self.column_count.max(cols))
    }
}
