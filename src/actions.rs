//! Mail actions: fetch a message body or open a message in Mail
//!
//! The single-identifier entry points (`get_email_body`, `open_email`,
//! `open_email_by_row_id`) validate their argument before anything runs and
//! then resolve through a one-candidate [`LookupContext`]. The lookup entry
//! points accept full evidence. All of them surface exactly one of: invalid
//! input, message not found, a Mail script error, or a dispatch failure.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::dispatch::{ResolutionOutcome, dispatch};
use crate::errors::{AppError, AppResult};
use crate::lookup::{LookupContext, RawEvidence};
use crate::runner::ScriptRunner;
use crate::script::{ActionMode, build_script, plan};

const FETCH_FAILED: &str = "Failed to fetch message via AppleScript";
const OPEN_FAILED: &str = "Failed to open message via AppleScript";

static ROW_ID_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$"));

/// Message actions bound to a script runner
#[derive(Debug, Clone)]
pub struct MailActions<R> {
    runner: R,
}

impl<R: ScriptRunner> MailActions<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Body of the message with the given row id
    ///
    /// # Errors
    ///
    /// `Invalid message ID` unless `row_id` is all digits; no script runs.
    pub async fn get_email_body(&self, row_id: &str) -> AppResult<String> {
        let ctx = row_id_context(row_id)?;
        self.resolve(&ctx, ActionMode::Body, FETCH_FAILED).await
    }

    /// Open the message with the given Message-ID header
    ///
    /// Enclosing angle brackets are stripped only when present at both ends.
    ///
    /// # Errors
    ///
    /// `Invalid document ID` for an empty identifier; no script runs.
    pub async fn open_email(&self, document_id: &str) -> AppResult<()> {
        if document_id.is_empty() {
            return Err(AppError::invalid("Invalid document ID"));
        }
        let ctx = LookupContext::for_message_id(strip_angle_brackets(document_id.trim()));
        self.resolve(&ctx, ActionMode::Open, OPEN_FAILED)
            .await
            .map(|_| ())
    }

    /// Open the message with the given row id
    ///
    /// # Errors
    ///
    /// `Invalid message ID` unless `row_id` is all digits; no script runs.
    pub async fn open_email_by_row_id(&self, row_id: &str) -> AppResult<()> {
        let ctx = row_id_context(row_id)?;
        self.resolve(&ctx, ActionMode::Open, OPEN_FAILED)
            .await
            .map(|_| ())
    }

    /// Body of the message best matching `evidence`
    pub async fn get_email_body_by_lookup(&self, evidence: &RawEvidence) -> AppResult<String> {
        let ctx = LookupContext::normalize(evidence);
        self.resolve(&ctx, ActionMode::Body, FETCH_FAILED).await
    }

    /// Open the message best matching `evidence`
    pub async fn open_email_by_lookup(&self, evidence: &RawEvidence) -> AppResult<()> {
        let ctx = LookupContext::normalize(evidence);
        self.resolve(&ctx, ActionMode::Open, OPEN_FAILED)
            .await
            .map(|_| ())
    }

    /// Build, dispatch, and relabel the outcome for the caller
    async fn resolve(
        &self,
        ctx: &LookupContext,
        mode: ActionMode,
        failure: &str,
    ) -> AppResult<String> {
        let tiers = plan(ctx)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        info!(%mode, %tiers, "resolving mail message");
        if ctx.is_empty() {
            debug!("no usable evidence; Mail will report not found");
        }

        let script = build_script(ctx, mode);
        match dispatch(&self.runner, &script).await {
            Ok(ResolutionOutcome::Found(text)) => Ok(text),
            Ok(ResolutionOutcome::NotFound) => Err(AppError::MessageNotFound),
            Ok(ResolutionOutcome::ScriptError { code, message }) => {
                Err(AppError::Script { code, message })
            }
            Err(err) => Err(AppError::Dispatch(format!("{failure}: {err}"))),
        }
    }
}

/// Strict ASCII all-digits row id check, then a one-candidate context
///
/// Zero or out-of-range ids pass the check but name no row; they normalize
/// away and the script reports the message as not found.
fn row_id_context(row_id: &str) -> AppResult<LookupContext> {
    let pattern = ROW_ID_PATTERN
        .as_ref()
        .map_err(|e| AppError::Internal(format!("invalid row id regex: {e}")))?;
    if !pattern.is_match(row_id) {
        return Err(AppError::invalid("Invalid message ID"));
    }
    Ok(LookupContext::for_row_id(row_id))
}

/// Strip `<...>` only when the value is wrapped at both ends
pub fn strip_angle_brackets(value: &str) -> &str {
    value
        .strip_prefix('<')
        .and_then(|v| v.strip_suffix('>'))
        .unwrap_or(value)
}

/// `message:` URL that Mail resolves to the message with this Message-ID
pub fn message_url(message_id: &str) -> String {
    format!(
        "message://%3c{}%3e",
        urlencoding::encode(strip_angle_brackets(message_id.trim()))
    )
}
