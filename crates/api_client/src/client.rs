//! Persistence API HTTP client.
//!
//! Blocking reqwest client implementing `SyncClient`. All cell and
//! worksheet traffic goes through here; the sync layer stays unaware
//! of HTTP.

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;

use statgrid_protocol::{
    BulkUpdateRequest, CellPayload, CreateWorksheetRequest, DeleteWorksheetRequest,
    RenameWorksheetRequest, SetActiveWorksheetRequest, WorksheetNamesRequest, WorksheetRecord,
};
use statgrid_sync::{SyncClient, SyncError};

use crate::auth::{load_auth, AuthCredentials};

/// Persistence API client (blocking).
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

impl ApiClient {
    /// Create a new client using saved auth credentials.
    pub fn from_saved_auth() -> Result<Self, SyncError> {
        let Some(creds) = load_auth() else {
            debug!("no saved auth credentials found");
            return Err(SyncError::NotAuthenticated);
        };
        Ok(Self::new(creds))
    }

    /// Create a new client with explicit credentials.
    pub fn new(creds: AuthCredentials) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("statgrid/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_base: creds.api_base,
            token: creds.token,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, SyncError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| SyncError::Network(e.to_string()))?;
        check_status(response)
    }

    fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::blocking::Response, SyncError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| SyncError::Network(e.to_string()))?;
        check_status(response)
    }

    fn delete_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::blocking::Response, SyncError> {
        let response = self
            .http
            .delete(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| SyncError::Network(e.to_string()))?;
        check_status(response)
    }
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, SyncError> {
    let status = response.status().as_u16();
    if !response.status().is_success() {
        let url = response.url().clone();
        let body = response.text().unwrap_or_default();
        warn!("request to {} failed with HTTP {}", url, status);
        if status == 422 || status == 400 {
            return Err(SyncError::Validation(body));
        }
        return Err(SyncError::Http(status, body));
    }
    Ok(response)
}

impl SyncClient for ApiClient {
    fn list_worksheets(&self, spreadsheet_id: &str) -> Result<Vec<WorksheetRecord>, SyncError> {
        let url = format!(
            "{}/api/spreadsheets/{}/worksheets",
            self.api_base, spreadsheet_id
        );
        let resp = self.get(&url)?;
        resp.json().map_err(|e| SyncError::Parse(e.to_string()))
    }

    fn fetch_cells(&self, worksheet_id: &str) -> Result<Vec<CellPayload>, SyncError> {
        let url = format!("{}/api/worksheets/{}/cells", self.api_base, worksheet_id);
        let resp = self.get(&url)?;
        resp.json().map_err(|e| SyncError::Parse(e.to_string()))
    }

    fn update_cell(&self, spreadsheet_id: &str, cell: &CellPayload) -> Result<(), SyncError> {
        let url = format!("{}/api/spreadsheets/{}/cells", self.api_base, spreadsheet_id);
        self.post_json(&url, cell)?;
        Ok(())
    }

    fn bulk_update_cells(
        &self,
        spreadsheet_id: &str,
        request: &BulkUpdateRequest,
    ) -> Result<(), SyncError> {
        let url = format!(
            "{}/api/spreadsheets/{}/cells/bulk",
            self.api_base, spreadsheet_id
        );
        self.post_json(&url, request)?;
        Ok(())
    }

    fn create_worksheet(
        &self,
        spreadsheet_id: &str,
        name: &str,
    ) -> Result<WorksheetRecord, SyncError> {
        let url = format!(
            "{}/api/spreadsheets/{}/worksheets",
            self.api_base, spreadsheet_id
        );
        let body = CreateWorksheetRequest {
            name: name.to_string(),
        };
        let resp = self.post_json(&url, &body)?;
        resp.json().map_err(|e| SyncError::Parse(e.to_string()))
    }

    fn rename_worksheet(&self, worksheet_id: &str, name: &str) -> Result<(), SyncError> {
        let url = format!("{}/api/worksheets/rename", self.api_base);
        let body = RenameWorksheetRequest {
            worksheet_id: worksheet_id.to_string(),
            name: name.to_string(),
        };
        self.post_json(&url, &body)?;
        Ok(())
    }

    fn set_active_worksheet(&self, worksheet_id: &str) -> Result<(), SyncError> {
        let url = format!("{}/api/worksheets/active", self.api_base);
        let body = SetActiveWorksheetRequest {
            worksheet_id: worksheet_id.to_string(),
        };
        self.post_json(&url, &body)?;
        Ok(())
    }

    fn delete_worksheet(&self, worksheet_id: &str) -> Result<(), SyncError> {
        let url = format!("{}/api/worksheets", self.api_base);
        let body = DeleteWorksheetRequest {
            worksheet_id: worksheet_id.to_string(),
        };
        self.delete_json(&url, &body)?;
        Ok(())
    }

    fn update_worksheet_names(
        &self,
        spreadsheet_id: &str,
        names: &BTreeMap<String, String>,
    ) -> Result<(), SyncError> {
        let url = format!(
            "{}/api/spreadsheets/{}/worksheet-names",
            self.api_base, spreadsheet_id
        );
        let body = WorksheetNamesRequest {
            names: names.clone(),
        };
        self.post_json(&url, &body)?;
        Ok(())
    }
}
