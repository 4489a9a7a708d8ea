//! External API integrations

pub mod sheets;

pub use sheets::{GoogleSheetsClient, SheetsApi};
