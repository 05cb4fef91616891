//! The remote persistence boundary.
//!
//! The engine only depends on this request/response contract, not on
//! any transport. `statgrid-api-client` provides the HTTP
//! implementation; tests use in-memory fakes.

use std::collections::BTreeMap;
use std::fmt;

use statgrid_protocol::{BulkUpdateRequest, CellPayload, WorksheetRecord};

/// Error type for remote persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// No auth credentials configured
    NotAuthenticated,
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// Server returned a validation error (4xx with message)
    Validation(String),
}

impl SyncError {
    /// True for 5xx responses. Rollback behavior is identical for all
    /// failure kinds; this only drives the user-facing message.
    pub fn is_server_error(&self) -> bool {
        matches!(self, SyncError::Http(code, _) if *code >= 500)
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NotAuthenticated => write!(f, "Not authenticated"),
            SyncError::Network(msg) => write!(f, "Network error: {}", msg),
            SyncError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            SyncError::Parse(msg) => write!(f, "Parse error: {}", msg),
            SyncError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

/// Remote persistence API for spreadsheet cells and worksheet
/// metadata.
pub trait SyncClient {
    /// List the worksheets of a spreadsheet, in tab order.
    fn list_worksheets(&self, spreadsheet_id: &str) -> Result<Vec<WorksheetRecord>, SyncError>;

    /// Fetch all populated cells of a worksheet.
    fn fetch_cells(&self, worksheet_id: &str) -> Result<Vec<CellPayload>, SyncError>;

    /// Persist a single cell.
    fn update_cell(&self, spreadsheet_id: &str, cell: &CellPayload) -> Result<(), SyncError>;

    /// Persist a batch of cells for one worksheet.
    fn bulk_update_cells(
        &self,
        spreadsheet_id: &str,
        request: &BulkUpdateRequest,
    ) -> Result<(), SyncError>;

    /// Create a worksheet and return its server-side record.
    fn create_worksheet(
        &self,
        spreadsheet_id: &str,
        name: &str,
    ) -> Result<WorksheetRecord, SyncError>;

    fn rename_worksheet(&self, worksheet_id: &str, name: &str) -> Result<(), SyncError>;

    fn set_active_worksheet(&self, worksheet_id: &str) -> Result<(), SyncError>;

    fn delete_worksheet(&self, worksheet_id: &str) -> Result<(), SyncError>;

    /// Push the full `{worksheet id: name}` map for a spreadsheet.
    fn update_worksheet_names(
        &self,
        spreadsheet_id: &str,
        names: &BTreeMap<String, String>,
    ) -> Result<(), SyncError>;
}
