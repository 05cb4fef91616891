//! Persistence API wire types — frozen JSON format.
//!
//! This crate defines the canonical request/response bodies exchanged
//! with the remote persistence API: worksheet metadata, cell records,
//! and the worksheet-management bodies. It deliberately has no
//! dependency on the engine crate; conversions between wire records
//! and engine cells live in `statgrid-sync`, so this crate can stay a
//! pure description of the contract.
//!
//! Field names are snake_case on the wire. Optional fields are omitted
//! when absent, never serialized as `null` — except `value`, where
//! JSON `null` is the encoding of an empty cell.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A cell value on the wire: JSON `null`, a number, or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellScalar {
    Null,
    Number(f64),
    Text(String),
}

impl Default for CellScalar {
    fn default() -> Self {
        CellScalar::Null
    }
}

/// Cell data type tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Text,
    Number,
    Date,
    Formula,
}

/// A single cell record: both the fetch response element and the
/// single-cell update body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellPayload {
    pub row_index: usize,
    pub column_index: usize,
    #[serde(default)]
    pub value: CellScalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worksheet_id: Option<String>,
}

/// Worksheet metadata as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetRecord {
    pub id: String,
    pub name: String,
    pub position: usize,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Bulk cell update for one worksheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    pub worksheet_id: String,
    pub cells: Vec<CellPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWorksheetRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameWorksheetRequest {
    pub worksheet_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetActiveWorksheetRequest {
    pub worksheet_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteWorksheetRequest {
    pub worksheet_id: String,
}

/// Full `{worksheet id: name}` map, pushed after any change to the
/// worksheet name set so server-side tab metadata stays in step.
/// BTreeMap keeps the serialized key order stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetNamesRequest {
    pub names: BTreeMap<String, String>,
}
