//! Archive-then-clear for the external sheets
//!
//! A snapshot of the live rows is copied to a uniquely named tab before the
//! live rows are cleared. The copy must run to completion first: if any
//! archive step fails, the live tab is left untouched. Archiving is decoupled
//! from the sync itself, so a committed batch is never lost to an archive
//! failure.

use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::external::SheetsApi;

const FULL_RANGE: &str = "Sheet1!A1:Z10000";
const DATA_RANGE: &str = "Sheet1!A2:Z10000";

/// Archive manager over an injected spreadsheet collaborator
pub struct ArchiveService<S: SheetsApi> {
    sheets: S,
}

impl<S: SheetsApi> ArchiveService<S> {
    /// Create a new ArchiveService instance
    pub fn new(sheets: S) -> Self {
        Self { sheets }
    }

    /// Copy the live rows to a new archive tab, then clear the data rows
    /// (header preserved). Returns the archive tab name, or `None` when the
    /// sheet held nothing beyond the header.
    pub async fn archive_and_clear(
        &self,
        spreadsheet_id: &str,
        label: Option<&str>,
    ) -> AppResult<Option<String>> {
        let rows = self.sheets.read(spreadsheet_id, FULL_RANGE).await?;
        if rows.len() <= 1 {
            return Ok(None);
        }

        let tab_name = archive_tab_name(label, Utc::now());

        self.sheets.create_tab(spreadsheet_id, &tab_name).await?;
        self.sheets
            .update(spreadsheet_id, &format!("{}!A1", tab_name), &rows)
            .await?;
        // Only now is it safe to drop the live rows
        self.sheets.clear(spreadsheet_id, DATA_RANGE).await?;

        tracing::info!(rows = rows.len() - 1, tab = %tab_name, "archived sheet rows");
        Ok(Some(tab_name))
    }

    /// List existing archive tabs, most recent first
    pub async fn list_archives(&self, spreadsheet_id: &str) -> AppResult<Vec<String>> {
        let mut tabs: Vec<String> = self
            .sheets
            .list_tab_names(spreadsheet_id)
            .await?
            .into_iter()
            .filter(|t| t.starts_with("Archive_") || t.ends_with("_Archive"))
            .collect();
        tabs.sort();
        tabs.reverse();
        Ok(tabs)
    }
}

/// Tab name for an archive: a caller-supplied label sanitized to
/// alphanumerics and suffixed `_Archive`, or a timestamped default.
fn archive_tab_name(label: Option<&str>, now: DateTime<Utc>) -> String {
    if let Some(label) = label {
        let clean: String = label.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if !clean.is_empty() {
            return format!("{}_Archive", clean);
        }
    }
    format!("Archive_{}", now.format("%Y-%m-%dT%H-%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn labels_are_sanitized_to_alphanumerics() {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 10, 15, 0).unwrap();
        assert_eq!(
            archive_tab_name(Some("Jan 2025 (final!)"), now),
            "Jan2025final_Archive"
        );
    }

    #[test]
    fn empty_labels_fall_back_to_timestamp() {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 10, 15, 0).unwrap();
        assert_eq!(archive_tab_name(None, now), "Archive_2025-01-31T10-15");
        assert_eq!(archive_tab_name(Some("!!!"), now), "Archive_2025-01-31T10-15");
    }
}
