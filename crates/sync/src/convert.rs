//! Conversions between engine cells and wire records.

use statgrid_engine::cell::{Cell, CellValue, DataType};
use statgrid_engine::store::CellKey;
use statgrid_engine::worksheet::WorksheetId;
use statgrid_protocol as wire;

pub fn value_to_wire(value: &CellValue) -> wire::CellScalar {
    match value {
        CellValue::Null => wire::CellScalar::Null,
        CellValue::Number(n) => wire::CellScalar::Number(*n),
        CellValue::Text(s) => wire::CellScalar::Text(s.clone()),
    }
}

pub fn value_from_wire(value: &wire::CellScalar) -> CellValue {
    match value {
        wire::CellScalar::Null => CellValue::Null,
        wire::CellScalar::Number(n) => CellValue::Number(*n),
        wire::CellScalar::Text(s) => CellValue::Text(s.clone()),
    }
}

pub fn data_type_to_wire(dt: DataType) -> wire::DataType {
    match dt {
        DataType::Text => wire::DataType::Text,
        DataType::Number => wire::DataType::Number,
        DataType::Date => wire::DataType::Date,
        DataType::Formula => wire::DataType::Formula,
    }
}

pub fn data_type_from_wire(dt: wire::DataType) -> DataType {
    match dt {
        wire::DataType::Text => DataType::Text,
        wire::DataType::Number => DataType::Number,
        wire::DataType::Date => DataType::Date,
        wire::DataType::Formula => DataType::Formula,
    }
}

/// Wire record for a cell at `key`. A cleared cell (`None`) is encoded
/// as a `null` value of type text, which the server treats as a
/// deletion.
pub fn cell_to_payload(
    key: CellKey,
    cell: Option<&Cell>,
    worksheet_id: Option<&WorksheetId>,
) -> wire::CellPayload {
    let (row, col) = key;
    match cell {
        Some(cell) => wire::CellPayload {
            row_index: row,
            column_index: col,
            value: value_to_wire(&cell.value),
            formula: cell.formula.clone(),
            data_type: data_type_to_wire(cell.data_type),
            worksheet_id: worksheet_id.map(|id| id.as_str().to_string()),
        },
        None => wire::CellPayload {
            row_index: row,
            column_index: col,
            value: wire::CellScalar::Null,
            formula: None,
            data_type: wire::DataType::Text,
            worksheet_id: worksheet_id.map(|id| id.as_str().to_string()),
        },
    }
}

/// Engine cell from a fetched record. `None` for records that encode
/// an empty cell, which never enter the store.
pub fn cell_from_payload(payload: &wire::CellPayload) -> Option<Cell> {
    let value = value_from_wire(&payload.value);
    if value == CellValue::Null && payload.formula.is_none() {
        return None;
    }
    Some(Cell::imported(
        value,
        payload.formula.clone(),
        data_type_from_wire(payload.data_type),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_for_formula_cell() {
        let cell = Cell::from_input("=A1+A2").unwrap();
        let payload = cell_to_payload((3, 1), Some(&cell), Some(&WorksheetId::new("w1")));

        assert_eq!(payload.row_index, 3);
        assert_eq!(payload.column_index, 1);
        assert_eq!(payload.formula.as_deref(), Some("=A1+A2"));
        assert_eq!(payload.data_type, wire::DataType::Formula);
        assert_eq!(payload.worksheet_id.as_deref(), Some("w1"));
    }

    #[test]
    fn cleared_cell_is_null_payload() {
        let payload = cell_to_payload((0, 0), None, None);
        assert_eq!(payload.value, wire::CellScalar::Null);
        assert!(payload.formula.is_none());
    }

    #[test]
    fn cleared_cell_serializes_as_null_value_on_the_wire() {
        let payload = cell_to_payload((4, 2), None, Some(&WorksheetId::new("w1")));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "row_index": 4,
                "column_index": 2,
                "value": null,
                "data_type": "text",
                "worksheet_id": "w1"
            })
        );
    }

    #[test]
    fn empty_record_does_not_become_a_cell() {
        let payload = cell_to_payload((0, 0), None, None);
        assert!(cell_from_payload(&payload).is_none());
    }

    #[test]
    fn fetched_cell_round_trips() {
        let cell = Cell::from_input("12.5").unwrap();
        let payload = cell_to_payload((1, 1), Some(&cell), None);
        let back = cell_from_payload(&payload).unwrap();
        assert_eq!(back, cell);
    }

    #[test]
    fn imported_date_type_is_preserved() {
        let payload = wire::CellPayload {
            row_index: 0,
            column_index: 0,
            value: wire::CellScalar::Text("2025-01-31".into()),
            formula: None,
            data_type: wire::DataType::Date,
            worksheet_id: None,
        };
        let cell = cell_from_payload(&payload).unwrap();
        assert_eq!(cell.data_type, DataType::Date);
    }
}
