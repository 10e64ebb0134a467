//! Telegram Bot API wire types.
//!
//! An [`Update`] may carry a message, a callback click, or something this
//! relay has no use for; [`Update::kind`] collapses that into a tagged
//! variant exactly once so downstream code never probes optional fields.

use serde::{Deserialize, Serialize};

/// Standard Bot API envelope.
#[derive(Debug, Deserialize)]
pub struct TgResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    #[serde(default)]
    pub date: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl User {
    /// Handle if the user has one, full name otherwise.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(u) => format!("@{u}"),
            None => match &self.last_name {
                Some(last) => format!("{} {last}", self.first_name),
                None => self.first_name.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

// ── Tagged decode ─────────────────────────────────────────────

/// What an update means to the relay.
#[derive(Debug, Clone)]
pub enum UpdateKind {
    Message(InboundMessage),
    CallbackClick(CallbackClick),
    /// Anything the relay does not handle (edits, media, joins, truncated
    /// callbacks). Dropped after a debug log.
    Unknown,
}

/// A plain text message. The relay only logs these.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub sender: Option<User>,
}

/// A button tap, with everything needed to act on it.
#[derive(Debug, Clone)]
pub struct CallbackClick {
    /// Id to pass to answerCallbackQuery.
    pub callback_id: String,
    /// Opaque payload the button was created with.
    pub data: String,
    /// Chat and message the button lives on.
    pub chat_id: i64,
    pub message_id: i64,
    /// Who tapped, ready for display.
    pub claimant: String,
}

impl Update {
    /// Decode once at the boundary.
    pub fn kind(&self) -> UpdateKind {
        if let Some(cb) = &self.callback_query {
            let (Some(data), Some(message)) = (&cb.data, &cb.message) else {
                return UpdateKind::Unknown;
            };
            return UpdateKind::CallbackClick(CallbackClick {
                callback_id: cb.id.clone(),
                data: data.clone(),
                chat_id: message.chat.id,
                message_id: message.message_id,
                claimant: cb.from.display_name(),
            });
        }
        if let Some(msg) = &self.message
            && let Some(text) = &msg.text
        {
            return UpdateKind::Message(InboundMessage {
                chat_id: msg.chat.id,
                text: text.clone(),
                sender: msg.from.clone(),
            });
        }
        UpdateKind::Unknown
    }
}

// ── Inline keyboards ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardMarkup {
    /// One button on its own row.
    pub fn single(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: text.into(),
                callback_data: callback_data.into(),
            }]],
        }
    }
}
