//! Business logic services for the Artis inventory backend

pub mod archive;
pub mod history;
pub mod ledger;
pub mod sheet_sync;
pub mod templates;

pub use archive::ArchiveService;
pub use history::SyncHistoryService;
pub use ledger::LedgerService;
pub use sheet_sync::SheetSyncEngine;
pub use templates::TemplateService;
