//! Notifications emitted by a sync session.
//!
//! Parent views use these to keep their copy of the active worksheet's
//! cells in step and to show transient save/error notices. They are
//! also what the tests assert against.

use statgrid_engine::store::CellKey;
use statgrid_engine::worksheet::WorksheetId;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Cells changed, optimistically or by reconciliation/rollback.
    CellsUpdated {
        worksheet_id: WorksheetId,
        cells: Vec<CellKey>,
    },

    /// A remote write was acknowledged.
    WriteSettled {
        worksheet_id: WorksheetId,
        key: CellKey,
    },

    /// A remote write failed and the optimistic edit was handled
    /// (rolled back, or superseded by a queued newer edit).
    WriteFailed {
        worksheet_id: WorksheetId,
        key: CellKey,
        message: String,
        /// 5xx vs anything else; only affects the message shown.
        server_error: bool,
    },

    /// The worksheet set changed: create, rename, duplicate, delete,
    /// or activation.
    WorksheetsChanged,
}

/// Callback type for receiving session events.
pub type EventCallback = Box<dyn FnMut(SessionEvent)>;

/// Simple event collector for testing.
#[derive(Default)]
pub struct EventCollector {
    events: Vec<SessionEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter to only WriteFailed events.
    pub fn write_failures(&self) -> Vec<&SessionEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, SessionEvent::WriteFailed { .. }))
            .collect()
    }

    /// Filter to only WriteSettled events.
    pub fn write_settled(&self) -> Vec<&SessionEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, SessionEvent::WriteSettled { .. }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_filters_by_kind() {
        let mut collector = EventCollector::new();
        let id = WorksheetId::new("w1");

        collector.push(SessionEvent::CellsUpdated {
            worksheet_id: id.clone(),
            cells: vec![(0, 0)],
        });
        collector.push(SessionEvent::WriteSettled {
            worksheet_id: id.clone(),
            key: (0, 0),
        });
        collector.push(SessionEvent::WriteFailed {
            worksheet_id: id,
            key: (1, 1),
            message: "HTTP 500: boom".into(),
            server_error: true,
        });

        assert_eq!(collector.len(), 3);
        assert_eq!(collector.write_settled().len(), 1);
        assert_eq!(collector.write_failures().len(), 1);
    }
}
