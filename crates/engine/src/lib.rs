pub mod cell;
pub mod header;
pub mod spreadsheet;
pub mod store;
pub mod worksheet;
