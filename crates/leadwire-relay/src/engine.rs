//! The relay engine: two independent tokio loops over shared state.
//!
//! Inbound loop (fast): poll Telegram updates, dedup, resolve claim taps.
//! Detection loop (slow): refresh the credential when due, fetch the
//! watched range, notify appended rows, advance the baseline.
//!
//! Every tick body returns `Result`; the loop layer logs failures and keeps
//! ticking. Nothing short of process shutdown stops either loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use leadwire_core::config::LeadwireConfig;
use leadwire_core::error::{LeadwireError, Result};
use leadwire_sheets::range::{RangeAddress, parse_col};
use leadwire_sheets::watch;
use leadwire_sheets::{SheetsClient, TokenManager};
use leadwire_telegram::api::{CallbackClick, InlineKeyboardMarkup, UpdateKind};
use leadwire_telegram::{BotClient, UpdateCursor};

use crate::claims::{self, ClaimBook, PendingClaim};
use crate::format;

/// Owns both transports and all per-process state: the last snapshot, the
/// claim book, and the update cursor. Shared between the loops as one Arc.
pub struct RelayEngine {
    config: LeadwireConfig,
    bot: BotClient,
    sheets: SheetsClient,
    tokens: TokenManager,
    lead_range: RangeAddress,
    manager_col: u32,
    snapshot: Mutex<leadwire_sheets::SheetSnapshot>,
    claims: Mutex<ClaimBook>,
    cursor: Mutex<UpdateCursor>,
}

impl RelayEngine {
    pub fn new(
        config: LeadwireConfig,
        bot: BotClient,
        sheets: SheetsClient,
        tokens: TokenManager,
    ) -> Result<Self> {
        let lead_range = RangeAddress::from_corners(
            &config.sheet.name,
            &config.sheet.first_column,
            config.sheet.start_row,
            &config.sheet.last_column,
            config.sheet.last_row,
        )?;
        let manager_col = parse_col(&config.sheet.manager_column)?;
        Ok(Self {
            config,
            bot,
            sheets,
            tokens,
            lead_range,
            manager_col,
            snapshot: Mutex::new(Vec::new()),
            claims: Mutex::new(ClaimBook::new()),
            cursor: Mutex::new(UpdateCursor::new()),
        })
    }

    /// The range this engine watches.
    pub fn lead_range(&self) -> &RangeAddress {
        &self.lead_range
    }

    /// Fetch the baseline snapshot. Rows already in the sheet at startup
    /// count as seen; only appends after this point notify anyone.
    pub async fn seed(&self) -> Result<usize> {
        self.ensure_fresh_token().await?;
        let rows = self.sheets.values_get(&self.lead_range).await?;
        let count = rows.len();
        *self.snapshot.lock().await = rows;
        info!("🌱 Baseline: {count} row(s) in {}", self.lead_range);
        Ok(count)
    }

    /// Refresh the credential if it is due. A rejected refresh means the
    /// credential is dead; the tick is skipped and the operator has to run
    /// `leadwire login`.
    async fn ensure_fresh_token(&self) -> Result<()> {
        if !self.tokens.is_expired().await {
            return Ok(());
        }
        if self.tokens.refresh().await? {
            Ok(())
        } else {
            Err(LeadwireError::Auth(
                "Refresh rejected; run `leadwire login` to re-authorize".into(),
            ))
        }
    }

    // ── Inbound loop ──────────────────────────────────────────

    async fn inbound_tick(&self) -> Result<()> {
        let offset = self.cursor.lock().await.next_offset();
        let updates = self.bot.get_updates(offset).await?;

        for update in updates {
            if !self.cursor.lock().await.admit(update.update_id) {
                debug!("Update {} already handled, skipping", update.update_id);
                continue;
            }
            match update.kind() {
                UpdateKind::CallbackClick(click) => {
                    // one bad claim must not drop the rest of the batch
                    if let Err(e) = self.handle_click(&click).await {
                        warn!("⚠️ Claim via update {} failed: {e}", update.update_id);
                    }
                }
                UpdateKind::Message(msg) => {
                    debug!("💬 Message in chat {}: {}", msg.chat_id, msg.text);
                }
                UpdateKind::Unknown => {
                    debug!("Update {} has no handler, dropped", update.update_id);
                }
            }
        }
        Ok(())
    }

    /// One button tap. Removing the entry from the claim book decides the
    /// winner; the sheet write happens before the chat edit so a failed
    /// write leaves the button alive for a retry.
    async fn handle_click(&self, click: &CallbackClick) -> Result<()> {
        let Some(row) = claims::parse_token(&click.data) else {
            let _ = self.bot.answer_callback_query(&click.callback_id, None).await;
            return Err(LeadwireError::Malformed(format!(
                "Callback payload {:?} is not a claim token",
                click.data
            )));
        };

        let Some(pending) = self.claims.lock().await.take(row) else {
            // somebody was faster, or this row was never advertised
            self.bot
                .answer_callback_query(&click.callback_id, Some(format::CLAIM_GONE_TEXT))
                .await?;
            info!("Row {row} already claimed, tap by {} ignored", click.claimant);
            return Ok(());
        };

        info!("🤝 {} claims row {row}", click.claimant);

        if let Err(e) = self.write_claim(row, &click.claimant).await {
            // put the claim back so the button still works
            self.claims.lock().await.register(pending);
            let _ = self
                .bot
                .answer_callback_query(&click.callback_id, Some(format::CLAIM_RETRY_TEXT))
                .await;
            return Err(e);
        }

        // the sheet has the claimant now; the rest is cosmetic
        if let Err(e) = self
            .bot
            .answer_callback_query(&click.callback_id, Some(format::CLAIM_ANSWER_TEXT))
            .await
        {
            warn!("⚠️ answerCallbackQuery for row {row}: {e}");
        }
        let edited = format::claimed_text(&pending.text, &click.claimant);
        if let Err(e) = self
            .bot
            .edit_message_text(click.chat_id, click.message_id, &edited)
            .await
        {
            warn!("⚠️ Edit of message {} failed: {e}", click.message_id);
        }
        Ok(())
    }

    async fn write_claim(&self, row: u32, claimant: &str) -> Result<()> {
        self.ensure_fresh_token().await?;
        let cell = self.lead_range.cell(self.manager_col, row);
        self.sheets
            .write_cell(&cell, format::sheet_claimant(claimant))
            .await
    }

    // ── Detection loop ────────────────────────────────────────

    async fn detection_tick(&self) -> Result<()> {
        self.ensure_fresh_token().await?;
        let current = self.sheets.values_get(&self.lead_range).await?;

        let mut snapshot = self.snapshot.lock().await;
        let prev_len = snapshot.len();

        let appended = match watch::diff(&snapshot, &current) {
            Ok(appended) => appended,
            Err(e @ LeadwireError::Anomaly(_)) => {
                error!("🚨 {e}; adopting the current state, no notifications this tick");
                *snapshot = current;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut sent = 0usize;
        for (offset, row) in appended {
            let row_abs = watch::absolute_row(self.config.sheet.start_row, offset);
            let chat = format::route_chat(
                &self.config.routing,
                &self.config.telegram.default_chat,
                row,
                self.config.sheet.locality_index,
            );
            let text = format::lead_text(row, self.config.sheet.locality_index);
            let markup =
                InlineKeyboardMarkup::single(format::CLAIM_BUTTON_LABEL, claims::claim_token(row_abs));

            match self.bot.send_message(chat, &text, Some(&markup)).await {
                Ok(message_id) => {
                    self.claims.lock().await.register(PendingClaim {
                        row: row_abs,
                        chat_id: chat.to_string(),
                        message_id,
                        text,
                    });
                    info!("📬 Row {row_abs} → {chat}");
                    sent += 1;
                }
                Err(e) => {
                    // later rows stay queued so delivery keeps row order
                    warn!("⚠️ Row {row_abs} not sent, retrying next tick: {e}");
                    break;
                }
            }
        }

        // advance only past rows that actually went out
        *snapshot = watch::advance_baseline(current, prev_len, sent);
        Ok(())
    }
}

/// Run the inbound loop forever: poll updates, resolve claim taps. Callers
/// wrap this in `tokio::spawn`; a failed tick is logged (warn when transient,
/// error otherwise) and the loop keeps going.
pub async fn run_inbound_loop(engine: Arc<RelayEngine>) {
    let every = engine.config.telegram.poll_interval_secs.max(1);
    info!("📡 Inbound loop started (every {every}s)");
    let mut interval = tokio::time::interval(Duration::from_secs(every));
    loop {
        interval.tick().await;
        if let Err(e) = engine.inbound_tick().await {
            if e.is_transient() {
                warn!("⚠️ Inbound tick failed, retrying: {e}");
            } else {
                error!("🚨 Inbound tick failed: {e}");
            }
        }
    }
}

/// Run the detection loop forever: fetch the range, notify appended rows.
/// Same contract as [`run_inbound_loop`].
pub async fn run_detection_loop(engine: Arc<RelayEngine>) {
    let every = engine.config.sheet.poll_interval_secs.max(1);
    info!("👀 Detection loop started (every {every}s)");
    let mut interval = tokio::time::interval(Duration::from_secs(every));
    loop {
        interval.tick().await;
        if let Err(e) = engine.detection_tick().await {
            if e.is_transient() {
                warn!("⚠️ Detection tick failed, retrying: {e}");
            } else {
                error!("🚨 Detection tick failed: {e}");
            }
        }
    }
}
