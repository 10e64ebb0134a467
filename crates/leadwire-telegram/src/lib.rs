//! # Leadwire Telegram
//!
//! Typed Bot API client plus the update dedup cursor. Raw updates are
//! decoded into a tagged [`api::UpdateKind`] once, at this boundary; the
//! relay never inspects loose JSON.

pub mod api;
pub mod client;
pub mod cursor;

pub use api::{CallbackClick, InboundMessage, Update, UpdateKind};
pub use client::BotClient;
pub use cursor::UpdateCursor;
