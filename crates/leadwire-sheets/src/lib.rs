//! # Leadwire Sheets
//!
//! Everything that touches Google: A1 range addressing, the OAuth2
//! credential lifecycle (device-flow bootstrap + proactive refresh), the
//! Sheets v4 values client, and the append-suffix snapshot differ.

pub mod auth;
pub mod client;
pub mod range;
pub mod watch;

pub use auth::TokenManager;
pub use client::{SheetSnapshot, SheetsClient};
pub use range::{CellRef, RangeAddress};
