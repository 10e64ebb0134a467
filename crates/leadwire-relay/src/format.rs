//! Lead message formatting and chat routing. Rows come in ragged (the API
//! drops trailing empty cells), so every position goes through [`cell`],
//! which treats short rows and blank cells the same.

use leadwire_core::config::RoutingConfig;

/// Label on the claim button.
pub const CLAIM_BUTTON_LABEL: &str = "Я візьму";
/// Toast shown to the winning claimant.
pub const CLAIM_ANSWER_TEXT: &str = "You took the lead";
/// Toast shown when the row is already gone.
pub const CLAIM_GONE_TEXT: &str = "Already taken";
/// Toast shown when the write-back failed and the tap should be repeated.
pub const CLAIM_RETRY_TEXT: &str = "Try again";

/// Cell at `idx`, or `None` when the row is too short or the cell is blank.
pub fn cell(row: &[String], idx: usize) -> Option<&str> {
    row.get(idx).map(String::as_str).filter(|s| !s.trim().is_empty())
}

/// Notification text for a freshly appended row.
pub fn lead_text(row: &[String], locality_index: usize) -> String {
    format!(
        "New lead: {}\nPhone: {}\nTelegram: {}\nLC: {}",
        cell(row, 0).unwrap_or("-"),
        cell(row, 1).unwrap_or("-"),
        cell(row, 2).unwrap_or("-"),
        cell(row, locality_index).unwrap_or("Невідомо"),
    )
}

/// The advertised text with the claimant appended, used for the edit.
pub fn claimed_text(advertised: &str, claimant: &str) -> String {
    format!("{advertised}\n\nManage by {claimant}")
}

/// What lands in the manager column: the handle without its @.
pub fn sheet_claimant(claimant: &str) -> &str {
    claimant.strip_prefix('@').unwrap_or(claimant)
}

/// Destination chat for a row: routing-table hit on the locality cell, or
/// the default chat.
pub fn route_chat<'a>(
    routing: &'a RoutingConfig,
    default_chat: &'a str,
    row: &[String],
    locality_index: usize,
) -> &'a str {
    cell(row, locality_index)
        .and_then(|locality| routing.chat_for(locality))
        .unwrap_or(default_chat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn routing() -> RoutingConfig {
        let mut cfg = RoutingConfig::default();
        cfg.chats.insert("Київ".into(), "@Kyiv_leads".into());
        cfg.chats.insert("Львів".into(), "@Lviv_leads".into());
        cfg
    }

    #[test]
    fn test_lead_text_full_row() {
        let text = lead_text(&row(&["Bob", "222", "@b", "Львів"]), 3);
        assert!(text.contains("Bob"));
        assert!(text.contains("222"));
        assert!(text.contains("Telegram: @b"));
        assert!(text.contains("LC: Львів"));
    }

    #[test]
    fn test_lead_text_short_row_uses_fallbacks() {
        let text = lead_text(&row(&["Bob", "222"]), 3);
        assert!(text.contains("Telegram: -"));
        assert!(text.contains("LC: Невідомо"));
    }

    #[test]
    fn test_route_chat_hit_and_fallback() {
        let routing = routing();
        assert_eq!(
            route_chat(&routing, "@default", &row(&["Bob", "222", "@b", "Львів"]), 3),
            "@Lviv_leads"
        );
        assert_eq!(
            route_chat(&routing, "@default", &row(&["Ann", "333", "@an", "Одеса"]), 3),
            "@default"
        );
        // row too short to carry a locality at all
        assert_eq!(route_chat(&routing, "@default", &row(&["Ann"]), 3), "@default");
    }

    #[test]
    fn test_claimed_text_appends_claimant() {
        let text = claimed_text("New lead: Bob\nPhone: 222", "@olena_k");
        assert!(text.starts_with("New lead: Bob"));
        assert!(text.ends_with("Manage by @olena_k"));
    }

    #[test]
    fn test_sheet_claimant_strips_handle() {
        assert_eq!(sheet_claimant("@olena_k"), "olena_k");
        assert_eq!(sheet_claimant("Taras"), "Taras");
    }
}
