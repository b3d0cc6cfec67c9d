//! Score persistence
//!
//! Each level set keeps one human-readable ledger file holding the set-wide
//! and per-level rank tables plus the level lock/completion flags.

pub mod ledger;

pub use ledger::{LedgerError, LoadReport, load, store};
