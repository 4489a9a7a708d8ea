//! HTTP handlers for the Artis inventory backend

pub mod health;
pub mod history;
pub mod ledger;
pub mod sheets;

pub use health::*;
pub use history::*;
pub use ledger::*;
pub use sheets::*;
