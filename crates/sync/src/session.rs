//! Worksheet sync session: the single choke point between the grid
//! and the persistence API.
//!
//! A session owns the spreadsheet state, one `EditCoalescer` per
//! worksheet (each tab's pending state is independent), and the
//! `SyncClient` handle. All writers — user edits, reconciliation,
//! rollback — go through the store operations here, so the invariants
//! have one enforcement point. The rendering layer only reads
//! snapshots and issues edit intents.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use statgrid_engine::cell::Cell;
use statgrid_engine::header::RowMapping;
use statgrid_engine::spreadsheet::{Spreadsheet, WorksheetError};
use statgrid_engine::store::CellStore;
use statgrid_engine::worksheet::{is_valid_worksheet_name, Worksheet, WorksheetId};
use statgrid_protocol::BulkUpdateRequest;

use crate::client::{SyncClient, SyncError};
use crate::coalescer::{Completion, EditCoalescer, WORKBOOK_DEBOUNCE};
use crate::convert::{cell_from_payload, cell_to_payload};
use crate::events::{EventCallback, SessionEvent};

/// Error type for session operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Remote persistence failure.
    Sync(SyncError),
    /// Structural worksheet error, rejected before any network call.
    Worksheet(WorksheetError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Sync(e) => write!(f, "{}", e),
            SessionError::Worksheet(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<SyncError> for SessionError {
    fn from(e: SyncError) -> Self {
        SessionError::Sync(e)
    }
}

impl From<WorksheetError> for SessionError {
    fn from(e: WorksheetError) -> Self {
        SessionError::Worksheet(e)
    }
}

/// An editing session over one spreadsheet.
pub struct SyncSession<C: SyncClient> {
    client: C,
    spreadsheet: Spreadsheet,
    /// Per-worksheet pending edit state. Dropped with the worksheet.
    pending: FxHashMap<WorksheetId, EditCoalescer>,
    /// Worksheets whose cells have been fetched (or created locally).
    /// Once loaded, the local store is the source of truth; switching
    /// tabs does not refetch, so unsent edits survive A -> B -> A.
    loaded: FxHashSet<WorksheetId>,
    delay: Duration,
    callback: Option<EventCallback>,
}

impl<C: SyncClient> SyncSession<C> {
    /// Build a session over an already-populated spreadsheet.
    pub fn new(client: C, spreadsheet: Spreadsheet) -> Self {
        let loaded = spreadsheet
            .worksheets()
            .iter()
            .map(|w| w.id.clone())
            .collect();
        SyncSession {
            client,
            spreadsheet,
            pending: FxHashMap::default(),
            loaded,
            delay: WORKBOOK_DEBOUNCE,
            callback: None,
        }
    }

    /// Open a spreadsheet from the persistence API: list worksheets,
    /// then fetch cells for the active one.
    pub fn open(
        client: C,
        spreadsheet_id: &str,
        name: &str,
        row_count: usize,
        column_count: usize,
    ) -> Result<Self, SessionError> {
        let mut records = client.list_worksheets(spreadsheet_id)?;
        records.sort_by_key(|r| r.position);

        let active = records.iter().position(|r| r.is_active).unwrap_or(0);
        let worksheets = records
            .iter()
            .map(|r| Worksheet::new(WorksheetId::new(r.id.clone()), r.name.clone()))
            .collect();
        let spreadsheet = Spreadsheet::from_worksheets(
            spreadsheet_id,
            name,
            row_count,
            column_count,
            worksheets,
            active,
        )?;

        let mut session = SyncSession {
            client,
            spreadsheet,
            pending: FxHashMap::default(),
            loaded: FxHashSet::default(),
            delay: WORKBOOK_DEBOUNCE,
            callback: None,
        };
        let active_id = session.spreadsheet.active_id().clone();
        session.load_cells(&active_id)?;
        Ok(session)
    }

    /// Override the debounce window (the default is the
    /// multi-worksheet delay).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_event_callback(&mut self, callback: EventCallback) {
        self.callback = Some(callback);
    }

    pub fn spreadsheet(&self) -> &Spreadsheet {
        &self.spreadsheet
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Cells of the active worksheet — the only structure the
    /// rendering layer reads.
    pub fn active_cells(&self) -> &CellStore {
        &self.spreadsheet.active_worksheet().cells
    }

    /// Row translation for the active worksheet, re-derived from
    /// current occupancy.
    pub fn row_mapping(&self) -> RowMapping {
        RowMapping::detect(
            &self.spreadsheet.active_worksheet().cells,
            self.spreadsheet.column_count,
        )
    }

    /// True while any worksheet has a debouncing or in-flight write.
    pub fn has_unsaved_changes(&self) -> bool {
        self.pending.values().any(|c| c.has_pending())
    }

    /// Earliest pending debounce deadline across all worksheets, for
    /// host wakeup scheduling.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().filter_map(|c| c.next_deadline()).min()
    }

    // ── Editing ─────────────────────────────────────────────────────

    /// Apply raw input to a cell of the active worksheet (logical row
    /// index). The store is updated immediately for feedback; the
    /// remote write is debounced. Re-entering the displayed value is a
    /// no-op with no network effect.
    pub fn edit_cell(&mut self, row: usize, col: usize, input: &str, now: Instant) {
        let ws_id = self.spreadsheet.active_id().clone();
        let next = Cell::from_input(input);

        let ws = self.spreadsheet.active_worksheet_mut();
        let prior = ws.cells.get(row, col).cloned();
        if prior == next {
            return;
        }

        match &next {
            Some(cell) => ws.cells.set(row, col, cell.clone()),
            None => {
                ws.cells.clear(row, col);
            }
        }

        let delay = self.delay;
        self.pending
            .entry(ws_id.clone())
            .or_insert_with(|| EditCoalescer::new(delay))
            .record_edit((row, col), prior, now);

        self.emit(SessionEvent::CellsUpdated {
            worksheet_id: ws_id,
            cells: vec![(row, col)],
        });
    }

    /// Like `edit_cell`, but addressed by display row (header-aware).
    pub fn edit_display_cell(&mut self, display_row: usize, col: usize, input: &str, now: Instant) {
        let row = self.row_mapping().to_logical(display_row);
        self.edit_cell(row, col, input, now);
    }

    /// Fire due debounce windows and resolve their writes. Failures
    /// roll back the optimistic edit and surface as events; they never
    /// abort the rest of the batch.
    pub fn pump(&mut self, now: Instant) {
        let ids: Vec<WorksheetId> = self.pending.keys().cloned().collect();
        for id in ids {
            let due = match self.spreadsheet.worksheet(&id) {
                Some(ws) => match self.pending.get_mut(&id) {
                    Some(co) => co.take_due(now, &ws.cells),
                    None => continue,
                },
                None => {
                    // Worksheet torn down since the edit was recorded.
                    self.pending.remove(&id);
                    continue;
                }
            };

            for write in due {
                let payload = cell_to_payload(write.key, write.cell.as_ref(), Some(&id));
                let result = self.client.update_cell(&self.spreadsheet.id, &payload);
                let completion = match self.pending.get_mut(&id) {
                    Some(co) => co.complete(write.key, result.is_ok(), now),
                    None => Completion::Stale,
                };
                self.finish_write(&id, write.key, result, completion);
            }

            if let Some(co) = self.pending.get(&id) {
                if !co.has_pending() {
                    self.pending.remove(&id);
                }
            }
        }
    }

    fn finish_write(
        &mut self,
        id: &WorksheetId,
        key: (usize, usize),
        result: Result<(), SyncError>,
        completion: Completion,
    ) {
        match (result, completion) {
            (Ok(()), Completion::Settled) => {
                self.emit(SessionEvent::WriteSettled {
                    worksheet_id: id.clone(),
                    key,
                });
            }
            (Ok(()), Completion::Requeued) => {
                debug!("cell {:?} re-queued after acknowledged write", key);
            }
            (Err(e), Completion::RolledBack(baseline)) => {
                warn!("cell write {:?} failed: {}", key, e);
                if let Some(ws) = self.spreadsheet.worksheet_mut(id) {
                    match baseline {
                        Some(cell) => ws.cells.set(key.0, key.1, cell),
                        None => {
                            ws.cells.clear(key.0, key.1);
                        }
                    }
                }
                let server_error = e.is_server_error();
                self.emit(SessionEvent::CellsUpdated {
                    worksheet_id: id.clone(),
                    cells: vec![key],
                });
                self.emit(SessionEvent::WriteFailed {
                    worksheet_id: id.clone(),
                    key,
                    message: e.to_string(),
                    server_error,
                });
            }
            (Err(e), Completion::Requeued) => {
                // A newer edit is queued; keep it visible and let it
                // retry, but still surface the failure.
                warn!("cell write {:?} failed with newer edit queued: {}", key, e);
                let server_error = e.is_server_error();
                self.emit(SessionEvent::WriteFailed {
                    worksheet_id: id.clone(),
                    key,
                    message: e.to_string(),
                    server_error,
                });
            }
            (_, Completion::Stale) => {}
            (Ok(()), Completion::RolledBack(_)) | (Err(_), Completion::Settled) => {
                // complete() cannot produce these combinations
            }
        }
    }

    // ── Worksheet management ────────────────────────────────────────

    /// Switch tabs. The outgoing worksheet's displayed contents are
    /// flushed to the server first when it has pending edits, so
    /// switching never loses on-screen data; in-flight writes are not
    /// cancelled. On any remote failure the switch is abandoned and
    /// the current tab stays active.
    pub fn activate_worksheet(&mut self, id: &WorksheetId) -> Result<(), SessionError> {
        if self.spreadsheet.position(id).is_none() {
            return Err(WorksheetError::UnknownWorksheet(id.clone()).into());
        }
        if id == self.spreadsheet.active_id() {
            return Ok(());
        }

        let out_id = self.spreadsheet.active_id().clone();
        if self.worksheet_pending(&out_id) {
            let request = self.bulk_request(&out_id);
            self.client
                .bulk_update_cells(&self.spreadsheet.id, &request)?;
        }

        self.client.set_active_worksheet(id.as_str())?;
        self.spreadsheet.set_active(id)?;

        if !self.loaded.contains(id) {
            self.load_cells(id)?;
        }

        self.emit(SessionEvent::WorksheetsChanged);
        let cells: Vec<_> = self
            .spreadsheet
            .active_worksheet()
            .cells
            .snapshot()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        self.emit(SessionEvent::CellsUpdated {
            worksheet_id: id.clone(),
            cells,
        });
        Ok(())
    }

    /// Create a new, empty worksheet. It does not become active unless
    /// the caller activates it explicitly.
    pub fn create_worksheet(&mut self, name: &str) -> Result<WorksheetId, SessionError> {
        if !is_valid_worksheet_name(name) {
            return Err(WorksheetError::BlankName.into());
        }

        let record = self.client.create_worksheet(&self.spreadsheet.id, name.trim())?;
        let id = WorksheetId::new(record.id);
        self.spreadsheet
            .add_worksheet(Worksheet::new(id.clone(), record.name));
        self.loaded.insert(id.clone());

        self.push_names()?;
        self.emit(SessionEvent::WorksheetsChanged);
        Ok(id)
    }

    pub fn rename_worksheet(
        &mut self,
        id: &WorksheetId,
        name: &str,
    ) -> Result<(), SessionError> {
        if !is_valid_worksheet_name(name) {
            return Err(WorksheetError::BlankName.into());
        }
        if self.spreadsheet.position(id).is_none() {
            return Err(WorksheetError::UnknownWorksheet(id.clone()).into());
        }

        self.client.rename_worksheet(id.as_str(), name.trim())?;
        self.spreadsheet.rename_worksheet(id, name)?;

        self.push_names()?;
        self.emit(SessionEvent::WorksheetsChanged);
        Ok(())
    }

    /// Duplicate a worksheet: settled cells only, derived name. The
    /// copy's cells are bulk-uploaded so the server matches the local
    /// snapshot.
    pub fn duplicate_worksheet(
        &mut self,
        id: &WorksheetId,
    ) -> Result<WorksheetId, SessionError> {
        let copy_name = match self.spreadsheet.worksheet(id) {
            Some(ws) => ws.copy_name(),
            None => return Err(WorksheetError::UnknownWorksheet(id.clone()).into()),
        };

        let record = self
            .client
            .create_worksheet(&self.spreadsheet.id, &copy_name)?;
        let new_id = WorksheetId::new(record.id);
        self.spreadsheet.duplicate_worksheet(id, new_id.clone())?;
        self.loaded.insert(new_id.clone());

        let request = self.bulk_request(&new_id);
        if !request.cells.is_empty() {
            self.client
                .bulk_update_cells(&self.spreadsheet.id, &request)?;
        }

        self.push_names()?;
        self.emit(SessionEvent::WorksheetsChanged);
        Ok(new_id)
    }

    /// Delete a worksheet. Refused locally for the last one, before
    /// any network call. Pending edits for the deleted tab are
    /// dropped; if it was active, the first remaining worksheet takes
    /// over and the server is told.
    pub fn delete_worksheet(&mut self, id: &WorksheetId) -> Result<(), SessionError> {
        if self.spreadsheet.worksheet_count() <= 1 {
            return Err(WorksheetError::LastWorksheet.into());
        }
        if self.spreadsheet.position(id).is_none() {
            return Err(WorksheetError::UnknownWorksheet(id.clone()).into());
        }

        let was_active = id == self.spreadsheet.active_id();
        self.client.delete_worksheet(id.as_str())?;
        self.spreadsheet.delete_worksheet(id)?;
        self.pending.remove(id);
        self.loaded.remove(id);

        if was_active {
            self.client
                .set_active_worksheet(self.spreadsheet.active_id().as_str())?;
        }

        self.push_names()?;
        self.emit(SessionEvent::WorksheetsChanged);
        Ok(())
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn worksheet_pending(&self, id: &WorksheetId) -> bool {
        self.pending.get(id).map(|c| c.has_pending()).unwrap_or(false)
    }

    fn load_cells(&mut self, id: &WorksheetId) -> Result<(), SessionError> {
        let payloads = self.client.fetch_cells(id.as_str())?;
        if let Some(ws) = self.spreadsheet.worksheet_mut(id) {
            for payload in &payloads {
                if let Some(cell) = cell_from_payload(payload) {
                    ws.cells.set(payload.row_index, payload.column_index, cell);
                }
            }
        }
        self.loaded.insert(id.clone());
        Ok(())
    }

    fn bulk_request(&self, id: &WorksheetId) -> BulkUpdateRequest {
        let cells = match self.spreadsheet.worksheet(id) {
            Some(ws) => ws
                .cells
                .snapshot()
                .into_iter()
                .map(|(key, cell)| cell_to_payload(key, Some(&cell), Some(id)))
                .collect(),
            None => Vec::new(),
        };
        BulkUpdateRequest {
            worksheet_id: id.as_str().to_string(),
            cells,
        }
    }

    fn push_names(&mut self) -> Result<(), SessionError> {
        self.client
            .update_worksheet_names(&self.spreadsheet.id, &self.spreadsheet.names())?;
        Ok(())
    }

    fn emit(&mut self, event: SessionEvent) {
        if let Some(callback) = &mut self.callback {
            callback(event);
        }
    }
}
