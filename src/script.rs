//! AppleScript generation for message resolution
//!
//! [`build_script`] turns a [`LookupContext`] and an [`ActionMode`] into one
//! self-contained script. Resolution is an ordered list of [`Strategy`]
//! tiers; each tier only runs while nothing has been found. Evidence enters
//! the script exclusively through variable assignments at the top, written
//! with [`AppleScriptLiteral`]. Everything else is static template text.

use std::fmt;

use crate::escape::AppleScriptLiteral;
use crate::lookup::LookupContext;

/// Output when no tier matched
pub const NOT_FOUND_SENTINEL: &str = "__FRUITMAIL_NOT_FOUND__";
/// Prefix of `<code>:<message>` when Mail raised an error mid-script
pub const SCRIPT_ERROR_PREFIX: &str = "__FRUITMAIL_SCRIPT_ERROR__:";
/// Output of a successful open
pub const OPEN_SUCCESS_TOKEN: &str = "OK";

/// What to do with the resolved message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMode {
    /// Return the message content
    Body,
    /// Open the message in Mail and bring Mail to the front
    Open,
}

impl fmt::Display for ActionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => f.write_str("body"),
            Self::Open => f.write_str("open"),
        }
    }
}

/// One resolution tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Exact Message-ID, verbatim then wrapped in angle brackets
    MessageId,
    /// Mail row id
    RowId,
    /// Subject equality or containment, optionally narrowed by sender
    Subject { exact: bool, with_sender: bool },
}

impl Strategy {
    /// The `set foundMsg to ...` statement a subject tier runs per mailbox
    fn subject_lookup(exact: bool, with_sender: bool) -> &'static str {
        match (exact, with_sender) {
            (true, true) => {
                "set foundMsg to first message of mailboxRef whose subject is targetSubject and sender contains targetSender"
            }
            (true, false) => {
                "set foundMsg to first message of mailboxRef whose subject is targetSubject"
            }
            (false, true) => {
                "set foundMsg to first message of mailboxRef whose subject contains targetSubject and sender contains targetSender"
            }
            (false, false) => {
                "set foundMsg to first message of mailboxRef whose subject contains targetSubject"
            }
        }
    }

    fn render(self, w: &mut ScriptWriter) {
        w.open("if foundMsg is missing value then");
        match self {
            Self::MessageId => {
                w.open("repeat with idRef in targetMessageIds");
                w.line("set candidateId to contents of idRef");
                w.open("repeat with mailboxRef in searchMailboxes");
                w.open("try");
                w.line("set foundMsg to first message of mailboxRef whose message id is candidateId");
                w.close("end try");
                w.open("if foundMsg is missing value then");
                w.open("try");
                w.line("set foundMsg to first message of mailboxRef whose message id is (\"<\" & candidateId & \">\")");
                w.close("end try");
                w.close("end if");
                w.line("if foundMsg is not missing value then exit repeat");
                w.close("end repeat");
                w.line("if foundMsg is not missing value then exit repeat");
                w.close("end repeat");
            }
            Self::RowId => {
                w.open("repeat with rowIdRef in targetRowIds");
                w.line("set candidateRowId to contents of rowIdRef");
                w.open("repeat with mailboxRef in searchMailboxes");
                w.open("try");
                w.line("set foundMsg to first message of mailboxRef whose id is candidateRowId");
                w.close("end try");
                w.line("if foundMsg is not missing value then exit repeat");
                w.close("end repeat");
                w.line("if foundMsg is not missing value then exit repeat");
                w.close("end repeat");
            }
            Self::Subject { exact, with_sender } => {
                w.open("repeat with mailboxRef in searchMailboxes");
                w.open("try");
                w.line(Self::subject_lookup(exact, with_sender));
                w.close("end try");
                w.line("if foundMsg is not missing value then exit repeat");
                w.close("end repeat");
            }
        }
        w.close("end if");
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageId => f.write_str("message-id"),
            Self::RowId => f.write_str("row-id"),
            Self::Subject { exact, with_sender } => write!(
                f,
                "subject-{}{}",
                if *exact { "is" } else { "contains" },
                if *with_sender { "+sender" } else { "" }
            ),
        }
    }
}

/// Resolution tiers for a context, in priority order
///
/// Tiers without evidence are left out; sender-aware subject tiers only
/// appear when a sender was supplied.
pub fn plan(ctx: &LookupContext) -> Vec<Strategy> {
    let mut tiers = Vec::new();
    if !ctx.message_id_candidates().is_empty() {
        tiers.push(Strategy::MessageId);
    }
    if !ctx.numeric_id_candidates().is_empty() {
        tiers.push(Strategy::RowId);
    }
    if !ctx.subject().is_empty() {
        let has_sender = !ctx.sender().is_empty();
        for (exact, with_sender) in [(true, true), (true, false), (false, true), (false, false)] {
            if with_sender && !has_sender {
                continue;
            }
            tiers.push(Strategy::Subject { exact, with_sender });
        }
    }
    tiers
}

/// Generated script text, ready for the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptText(String);

impl ScriptText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScriptText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the resolution + action script
pub fn build_script(ctx: &LookupContext, mode: ActionMode) -> ScriptText {
    let mut w = ScriptWriter::default();
    w.open("on run");

    w.assign(
        "targetMessageIds",
        &AppleScriptLiteral::string_list(ctx.message_id_candidates()),
    );
    w.assign(
        "targetRowIds",
        &AppleScriptLiteral::integer_list(ctx.numeric_id_candidates()),
    );
    w.assign(
        "mailboxHints",
        &AppleScriptLiteral::string_list(ctx.mailbox_hints()),
    );
    w.assign("targetSubject", &AppleScriptLiteral::string(ctx.subject()));
    w.assign("targetSender", &AppleScriptLiteral::string(ctx.sender()));
    w.assign("notFoundToken", &AppleScriptLiteral::string(NOT_FOUND_SENTINEL));
    w.assign(
        "scriptErrorToken",
        &AppleScriptLiteral::string(SCRIPT_ERROR_PREFIX),
    );
    w.assign("openedToken", &AppleScriptLiteral::string(OPEN_SUCCESS_TOKEN));

    w.open("tell application \"Mail\"");
    w.open("try");
    write_mailbox_scope(&mut w);

    w.line("set foundMsg to missing value");
    for tier in plan(ctx) {
        tier.render(&mut w);
    }
    w.line("if foundMsg is missing value then return notFoundToken");

    match mode {
        ActionMode::Body => w.line("return content of foundMsg"),
        ActionMode::Open => {
            w.line("open foundMsg");
            w.line("activate");
            w.line("return openedToken");
        }
    }

    w.dedent();
    w.open("on error errMsg number errNum");
    w.line("return scriptErrorToken & errNum & \":\" & errMsg");
    w.close("end try");
    w.close("end tell");
    w.close("end run");
    ScriptText(w.finish())
}

/// Collect every mailbox, then narrow to hinted ones when any match
///
/// Hint matching is case-sensitive in both directions. When nothing matches,
/// the full set is kept.
fn write_mailbox_scope(w: &mut ScriptWriter) {
    w.line("set allMailboxes to {}");
    w.open("repeat with accountRef in every account");
    w.line("set allMailboxes to allMailboxes & (every mailbox of accountRef)");
    w.close("end repeat");
    w.line("set allMailboxes to allMailboxes & (every mailbox)");
    w.line("set searchMailboxes to allMailboxes");
    w.open("if (count of mailboxHints) > 0 then");
    w.line("set hintedMailboxes to {}");
    w.open("repeat with mailboxRef in allMailboxes");
    w.line("set mailboxName to name of mailboxRef");
    w.open("repeat with hintRef in mailboxHints");
    w.line("set hintText to contents of hintRef");
    w.open("considering case");
    w.open("if mailboxName contains hintText or hintText contains mailboxName then");
    w.line("set end of hintedMailboxes to contents of mailboxRef");
    w.line("exit repeat");
    w.close("end if");
    w.close("end considering");
    w.close("end repeat");
    w.close("end repeat");
    w.line("if (count of hintedMailboxes) > 0 then set searchMailboxes to hintedMailboxes");
    w.close("end if");
}

/// Indenting line writer
///
/// Template text is `&'static str`; the only runtime values it accepts are
/// [`AppleScriptLiteral`]s.
#[derive(Default)]
struct ScriptWriter {
    buf: String,
    depth: usize,
}

impl ScriptWriter {
    fn line(&mut self, text: &'static str) {
        self.push(text);
    }

    fn open(&mut self, text: &'static str) {
        self.push(text);
        self.depth += 1;
    }

    fn close(&mut self, text: &'static str) {
        self.dedent();
        self.push(text);
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn assign(&mut self, name: &'static str, value: &AppleScriptLiteral) {
        self.indent();
        self.buf.push_str("set ");
        self.buf.push_str(name);
        self.buf.push_str(" to ");
        self.buf.push_str(value.as_str());
        self.buf.push('\n');
    }

    fn push(&mut self, text: &str) {
        self.indent();
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str("  ");
        }
    }

    fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ActionMode, NOT_FOUND_SENTINEL, SCRIPT_ERROR_PREFIX, Strategy, build_script, plan,
    };
    use crate::lookup::{LookupContext, RawEvidence, RawRowId};

    fn subject_only(subject: &str, sender: Option<&str>) -> LookupContext {
        LookupContext::normalize(&RawEvidence {
            subject: Some(subject.to_owned()),
            sender: sender.map(str::to_owned),
            ..RawEvidence::default()
        })
    }

    fn positions(script: &str, needles: &[&str]) -> Vec<usize> {
        needles
            .iter()
            .map(|n| script.find(n).unwrap_or_else(|| panic!("missing `{n}`")))
            .collect()
    }

    #[test]
    fn plan_orders_tiers_by_priority() {
        let ctx = LookupContext::normalize(&RawEvidence {
            numeric_id_candidates: vec![RawRowId::Number(9.into())],
            message_id_candidates: vec!["a@b".to_owned()],
            subject: Some("Invoice".to_owned()),
            sender: Some("billing@example.com".to_owned()),
            ..RawEvidence::default()
        });
        assert_eq!(
            plan(&ctx),
            vec![
                Strategy::MessageId,
                Strategy::RowId,
                Strategy::Subject { exact: true, with_sender: true },
                Strategy::Subject { exact: true, with_sender: false },
                Strategy::Subject { exact: false, with_sender: true },
                Strategy::Subject { exact: false, with_sender: false },
            ]
        );
    }

    #[test]
    fn plan_is_empty_without_evidence() {
        assert!(plan(&LookupContext::default()).is_empty());
        let hints_only = LookupContext::normalize(&RawEvidence {
            mailbox_hints: vec!["INBOX".to_owned()],
            sender: Some("x@y".to_owned()),
            ..RawEvidence::default()
        });
        assert!(plan(&hints_only).is_empty());
    }

    #[test]
    fn subject_only_script_skips_sender_tiers() {
        let script = build_script(&subject_only("Invoice", None), ActionMode::Body);
        let text = script.as_str();
        let order = positions(
            text,
            &[
                "whose subject is targetSubject\n",
                "whose subject contains targetSubject\n",
            ],
        );
        assert!(order[0] < order[1]);
        assert!(!text.contains("sender contains targetSender"));
        assert!(!text.contains("whose message id is"));
        assert!(!text.contains("whose id is"));
        assert!(text.contains("set targetSubject to \"Invoice\""));
    }

    #[test]
    fn subject_and_sender_script_has_four_tiers_in_order() {
        let script = build_script(
            &subject_only("[Rip] REMINDER", Some("someone@example.edu")),
            ActionMode::Open,
        );
        let order = positions(
            script.as_str(),
            &[
                "whose subject is targetSubject and sender contains targetSender",
                "whose subject is targetSubject\n",
                "whose subject contains targetSubject and sender contains targetSender",
                "whose subject contains targetSubject\n",
            ],
        );
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn message_id_tier_tries_verbatim_then_bracketed() {
        let script = build_script(&LookupContext::for_message_id("abc@host"), ActionMode::Open);
        let text = script.as_str();
        let order = positions(
            text,
            &[
                "repeat with accountRef in every account",
                "whose message id is candidateId\n",
                "whose message id is (\"<\" & candidateId & \">\")",
                "open foundMsg",
                "activate",
            ],
        );
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("set targetMessageIds to {\"abc@host\"}"));
    }

    #[test]
    fn message_id_tier_precedes_row_id_tier() {
        let ctx = LookupContext::normalize(&RawEvidence {
            numeric_id_candidates: vec![RawRowId::Number(77.into())],
            message_id_candidates: vec!["m@x".to_owned()],
            ..RawEvidence::default()
        });
        let script = build_script(&ctx, ActionMode::Body);
        let order = positions(
            script.as_str(),
            &["whose message id is candidateId", "whose id is candidateRowId"],
        );
        assert!(order[0] < order[1]);
        assert!(script.as_str().contains("set targetRowIds to {77}"));
    }

    #[test]
    fn body_and_open_modes_differ_only_in_action() {
        let ctx = LookupContext::for_row_id("5");
        let body = build_script(&ctx, ActionMode::Body);
        let open = build_script(&ctx, ActionMode::Open);
        assert!(body.as_str().contains("return content of foundMsg"));
        assert!(!body.as_str().contains("open foundMsg"));
        assert!(open.as_str().contains("open foundMsg"));
        assert!(open.as_str().contains("return openedToken"));
        assert!(!open.as_str().contains("return content of foundMsg"));
    }

    #[test]
    fn sentinels_and_error_handler_are_present() {
        let script = build_script(&LookupContext::for_row_id("1"), ActionMode::Body);
        let text = script.as_str();
        assert!(text.contains(&format!("set notFoundToken to \"{NOT_FOUND_SENTINEL}\"")));
        assert!(text.contains(&format!("set scriptErrorToken to \"{SCRIPT_ERROR_PREFIX}\"")));
        assert!(text.contains("on error errMsg number errNum"));
        assert!(text.contains("return scriptErrorToken & errNum & \":\" & errMsg"));
        assert!(text.trim_end().ends_with("end run"));
    }

    #[test]
    fn mailbox_hints_use_case_sensitive_two_way_match() {
        let ctx = LookupContext::normalize(&RawEvidence {
            message_id_candidates: vec!["id@x".to_owned()],
            mailbox_hints: vec!["Work/Projects".to_owned()],
            ..RawEvidence::default()
        });
        let text = build_script(&ctx, ActionMode::Body).to_string();
        assert!(text.contains("set mailboxHints to {\"Work/Projects\"}"));
        let order = positions(
            &text,
            &[
                "considering case",
                "if mailboxName contains hintText or hintText contains mailboxName then",
                "if (count of hintedMailboxes) > 0 then set searchMailboxes to hintedMailboxes",
            ],
        );
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn hostile_evidence_only_appears_escaped() {
        let hostile = "\" & (do shell script \"touch /tmp/pwned\") & \"";
        let ctx = subject_only(hostile, Some(hostile));
        let text = build_script(&ctx, ActionMode::Body).to_string();
        assert!(!text.contains(hostile));
        assert!(text.contains(
            "set targetSubject to \"\\\" & (do shell script \\\"touch /tmp/pwned\\\") & \\\"\""
        ));
    }

    #[test]
    fn strategy_labels_are_readable() {
        assert_eq!(Strategy::MessageId.to_string(), "message-id");
        assert_eq!(
            Strategy::Subject { exact: false, with_sender: true }.to_string(),
            "subject-contains+sender"
        );
    }
}
