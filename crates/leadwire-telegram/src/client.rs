//! Bot API client: getUpdates/sendMessage/editMessageText/
//! answerCallbackQuery/getMe over the `{ok, result, description}` envelope.

use tracing::debug;

use leadwire_core::error::{LeadwireError, Result};

use crate::api::{InlineKeyboardMarkup, Message, TgResponse, Update, User};

/// Thin typed client for one bot token.
#[derive(Clone)]
pub struct BotClient {
    token: String,
    http: reqwest::Client,
}

impl BotClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            http: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }

    /// Fetch pending updates (short poll; the caller owns the cadence).
    /// `offset` acknowledges everything below it server-side; local dedup
    /// still guards against redelivery.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let mut query = vec![(
            "allowed_updates",
            "[\"message\",\"callback_query\"]".to_string(),
        )];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .http
            .get(self.api_url("getUpdates"))
            .query(&query)
            .send()
            .await
            .map_err(|e| LeadwireError::Telegram(format!("getUpdates failed: {e}")))?;

        let body: TgResponse<Vec<Update>> = response
            .json()
            .await
            .map_err(|e| LeadwireError::Malformed(format!("Invalid getUpdates response: {e}")))?;

        if !body.ok {
            return Err(LeadwireError::Telegram(format!(
                "getUpdates rejected: {}",
                body.description.unwrap_or_default()
            )));
        }
        let updates = body.result.unwrap_or_default();
        if !updates.is_empty() {
            debug!("📨 {} pending update(s)", updates.len());
        }
        Ok(updates)
    }

    /// Send a text message, optionally with an inline keyboard. Returns the
    /// new message id so a claim can edit it later.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<i64> {
        let body = send_body(chat_id, text, markup);
        let response = self
            .http
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| LeadwireError::Telegram(format!("sendMessage failed: {e}")))?;

        let body: TgResponse<Message> = response
            .json()
            .await
            .map_err(|e| LeadwireError::Malformed(format!("Invalid sendMessage response: {e}")))?;

        match body.result {
            Some(message) if body.ok => Ok(message.message_id),
            _ => Err(LeadwireError::Telegram(format!(
                "sendMessage to {chat_id} rejected: {}",
                body.description.unwrap_or_default()
            ))),
        }
    }

    /// Replace the text of an existing message. No reply_markup in the body
    /// means the inline keyboard is dropped too; a claimed lead loses its
    /// button this way.
    pub async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        let response = self
            .http
            .post(self.api_url("editMessageText"))
            .json(&body)
            .send()
            .await
            .map_err(|e| LeadwireError::Telegram(format!("editMessageText failed: {e}")))?;

        let body: TgResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| LeadwireError::Malformed(format!("Invalid edit response: {e}")))?;
        if !body.ok {
            return Err(LeadwireError::Telegram(format!(
                "editMessageText rejected: {}",
                body.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Acknowledge a button tap so the client stops its spinner.
    pub async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut body = serde_json::json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = serde_json::Value::String(text.to_string());
        }
        let response = self
            .http
            .post(self.api_url("answerCallbackQuery"))
            .json(&body)
            .send()
            .await
            .map_err(|e| LeadwireError::Telegram(format!("answerCallbackQuery failed: {e}")))?;

        let body: TgResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| LeadwireError::Malformed(format!("Invalid answer response: {e}")))?;
        if !body.ok {
            return Err(LeadwireError::Telegram(format!(
                "answerCallbackQuery rejected: {}",
                body.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Get bot info.
    pub async fn get_me(&self) -> Result<User> {
        let response = self
            .http
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| LeadwireError::Telegram(format!("getMe failed: {e}")))?;
        let body: TgResponse<User> = response
            .json()
            .await
            .map_err(|e| LeadwireError::Malformed(format!("Invalid getMe response: {e}")))?;
        body.result
            .ok_or_else(|| LeadwireError::Telegram("No bot info".into()))
    }
}

fn send_body(
    chat_id: &str,
    text: &str,
    markup: Option<&InlineKeyboardMarkup>,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "chat_id": chat_id,
        "text": text,
    });
    if let Some(markup) = markup {
        body["reply_markup"] = serde_json::to_value(markup).unwrap_or_default();
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_body_without_markup() {
        let body = send_body("-1002222", "New lead: Bob", None);
        assert_eq!(body["chat_id"], "-1002222");
        assert!(body.get("reply_markup").is_none());
    }

    #[test]
    fn test_send_body_with_markup() {
        let markup = InlineKeyboardMarkup::single("Я візьму", "take3");
        let body = send_body("-1002222", "New lead: Bob", Some(&markup));
        assert_eq!(
            body["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "take3"
        );
    }

    #[test]
    fn test_envelope_error_decode() {
        let body: TgResponse<Vec<Update>> = serde_json::from_value(serde_json::json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        }))
        .unwrap();
        assert!(!body.ok);
        assert_eq!(body.description.as_deref(), Some("Unauthorized"));
        assert!(body.result.is_none());
    }

    #[test]
    fn test_send_result_decode() {
        let body: TgResponse<Message> = serde_json::from_value(serde_json::json!({
            "ok": true,
            "result": {
                "message_id": 77,
                "chat": {"id": -1002222, "type": "supergroup"},
                "date": 1700000000
            }
        }))
        .unwrap();
        assert!(body.ok);
        assert_eq!(body.result.unwrap().message_id, 77);
    }
}
