//! Persistence API client.
//!
//! Blocking reqwest client (no Tokio runtime required) implementing
//! the `SyncClient` boundary over the frozen JSON wire format, plus
//! local token storage shared with the desktop app.

pub mod auth;
pub mod client;

pub use auth::{auth_file_path, delete_auth, load_auth, save_auth, AuthCredentials};
pub use client::ApiClient;
