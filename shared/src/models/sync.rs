//! Sync batch bookkeeping models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// External sheet categories a batch can ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncType {
    #[serde(rename = "consumption")]
    Consumption,
    #[serde(rename = "purchases")]
    Purchases,
    #[serde(rename = "corrections")]
    Corrections,
    #[serde(rename = "initialStock")]
    InitialStock,
}

impl SyncType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::Consumption => "consumption",
            SyncType::Purchases => "purchases",
            SyncType::Corrections => "corrections",
            SyncType::InitialStock => "initialStock",
        }
    }

    /// Accepts both the wire form and the kebab-case URL form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "consumption" => Some(SyncType::Consumption),
            "purchases" => Some(SyncType::Purchases),
            "corrections" => Some(SyncType::Corrections),
            "initialStock" | "initial-stock" => Some(SyncType::InitialStock),
            _ => None,
        }
    }
}

/// Final state of a batch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// The batch committed with zero validation or commit errors
    Completed,
    /// The batch had row errors or its commit rolled back
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Completed => "completed",
            SyncStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(SyncStatus::Completed),
            "failed" => Some(SyncStatus::Failed),
            _ => None,
        }
    }
}

/// Outcome of one sync batch, returned to the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Transactions created by the batch
    pub added: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// One append-only audit record per batch attempt.
///
/// Written on success and on rollback alike; never edited afterwards. There
/// is no foreign key into the transaction table: linkage is the shared
/// batch id string, so history survives even if transactions are purged.
#[derive(Debug, Clone, Serialize)]
pub struct SyncHistory {
    pub id: Uuid,
    pub sync_batch_id: String,
    pub sync_type: SyncType,
    pub sync_date: DateTime<Utc>,
    /// Rows successfully turned into transactions
    pub item_count: i32,
    pub status: SyncStatus,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: serde_json::Value,
    /// Initiating user, when the caller supplied one
    pub user_id: Option<Uuid>,
}
