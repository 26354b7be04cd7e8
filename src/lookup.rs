//! Lookup evidence normalization
//!
//! Callers hand over whatever identifying evidence they have for a message:
//! row ids (possibly as text), protocol Message-IDs, mailbox name hints, a
//! subject and a sender. [`LookupContext::normalize`] turns that into a
//! trimmed, deduplicated context. Malformed candidates are dropped rather
//! than rejected; an empty context is legal and just yields fewer tiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Largest float that still names exactly one integer
const MAX_EXACT_FLOAT_ID: f64 = 9_007_199_254_740_991.0;

/// A row id as supplied by a caller: a JSON number or a string of digits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawRowId {
    /// Numeric form; must be integral and positive to survive normalization
    Number(serde_json::Number),
    /// Text form; must trim to a positive integer
    Text(String),
}

impl RawRowId {
    /// Coerce to a positive integer, or `None` if the value is unusable
    ///
    /// Integers are taken exactly. Floats count only when integral and small
    /// enough that no neighbouring id rounds to the same value.
    fn coerce(&self) -> Option<u64> {
        match self {
            Self::Number(n) => {
                if let Some(id) = n.as_u64() {
                    return (id > 0).then_some(id);
                }
                let f = n.as_f64()?;
                if f.is_finite() && f.fract() == 0.0 && f >= 1.0 && f <= MAX_EXACT_FLOAT_ID {
                    Some(f as u64)
                } else {
                    None
                }
            }
            Self::Text(s) => {
                let s = s.trim();
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                s.parse::<u64>().ok().filter(|n| *n > 0)
            }
        }
    }
}

impl From<u64> for RawRowId {
    fn from(value: u64) -> Self {
        Self::Text(value.to_string())
    }
}

/// Raw, possibly malformed lookup evidence
///
/// Field names are snake_case like the other tool inputs; the camelCase
/// spellings are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawEvidence {
    /// Mail row identifiers
    #[serde(default, alias = "numericIdCandidates")]
    pub numeric_id_candidates: Vec<RawRowId>,
    /// Message-ID header values, with or without angle brackets
    #[serde(default, alias = "messageIdCandidates")]
    pub message_id_candidates: Vec<String>,
    /// Substrings of mailbox names to search first
    #[serde(default, alias = "mailboxHints")]
    pub mailbox_hints: Vec<String>,
    /// Subject line used by the heuristic tiers
    #[serde(default)]
    pub subject: Option<String>,
    /// Sender address used by the heuristic tiers
    #[serde(default)]
    pub sender: Option<String>,
}

/// Normalized evidence for one resolution attempt
///
/// Candidate lists keep first-occurrence order; the resolution tiers walk
/// them in that order. Only built through [`LookupContext::normalize`] and
/// its single-candidate shorthands, so every value here is already clean.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupContext {
    numeric_id_candidates: Vec<u64>,
    message_id_candidates: Vec<String>,
    mailbox_hints: Vec<String>,
    subject: String,
    sender: String,
}

impl LookupContext {
    /// Normalize raw evidence
    ///
    /// Pure function of its input; normalizing the evidence recovered from an
    /// already-normalized context yields the same context.
    pub fn normalize(raw: &RawEvidence) -> Self {
        let mut numeric_id_candidates = Vec::new();
        for id in raw.numeric_id_candidates.iter().filter_map(RawRowId::coerce) {
            if !numeric_id_candidates.contains(&id) {
                numeric_id_candidates.push(id);
            }
        }

        Self {
            numeric_id_candidates,
            message_id_candidates: clean_strings(&raw.message_id_candidates),
            mailbox_hints: clean_strings(&raw.mailbox_hints),
            subject: clean_text(raw.subject.as_deref()),
            sender: clean_text(raw.sender.as_deref()),
        }
    }

    /// Context carrying a single row id given as text
    ///
    /// A value that is not a positive integer leaves the context empty.
    pub fn for_row_id(row_id: &str) -> Self {
        Self::normalize(&RawEvidence {
            numeric_id_candidates: vec![RawRowId::Text(row_id.to_owned())],
            ..RawEvidence::default()
        })
    }

    /// Context carrying a single Message-ID
    pub fn for_message_id(message_id: &str) -> Self {
        Self::normalize(&RawEvidence {
            message_id_candidates: vec![message_id.to_owned()],
            ..RawEvidence::default()
        })
    }

    pub fn numeric_id_candidates(&self) -> &[u64] {
        &self.numeric_id_candidates
    }

    pub fn message_id_candidates(&self) -> &[String] {
        &self.message_id_candidates
    }

    pub fn mailbox_hints(&self) -> &[String] {
        &self.mailbox_hints
    }

    /// Trimmed subject; empty when absent
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Trimmed sender; empty when absent
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Whether no tier has any evidence to work with
    pub fn is_empty(&self) -> bool {
        self.numeric_id_candidates.is_empty()
            && self.message_id_candidates.is_empty()
            && self.subject.is_empty()
    }
}

impl From<LookupContext> for RawEvidence {
    fn from(ctx: LookupContext) -> Self {
        Self {
            numeric_id_candidates: ctx
                .numeric_id_candidates
                .into_iter()
                .map(RawRowId::from)
                .collect(),
            message_id_candidates: ctx.message_id_candidates,
            mailbox_hints: ctx.mailbox_hints,
            subject: Some(ctx.subject),
            sender: Some(ctx.sender),
        }
    }
}

/// Trim, drop empties, dedup by exact match keeping first occurrence
fn clean_strings(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_owned());
        }
    }
    out
}

fn clean_text(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use serde_json::Number;

    use super::{LookupContext, RawEvidence, RawRowId};

    #[test]
    fn trims_and_dedups_string_candidates() {
        let ctx = LookupContext::normalize(&RawEvidence {
            message_id_candidates: vec![
                " abc@example.com ".to_owned(),
                "".to_owned(),
                "abc@example.com".to_owned(),
                "<abc@example.com>".to_owned(),
            ],
            mailbox_hints: vec!["INBOX".to_owned(), "  ".to_owned(), "INBOX".to_owned()],
            subject: Some("  Invoice  ".to_owned()),
            sender: None,
            ..RawEvidence::default()
        });
        assert_eq!(
            ctx.message_id_candidates,
            vec!["abc@example.com", "<abc@example.com>"]
        );
        assert_eq!(ctx.mailbox_hints, vec!["INBOX"]);
        assert_eq!(ctx.subject, "Invoice");
        assert_eq!(ctx.sender, "");
    }

    #[test]
    fn drops_unusable_row_ids_silently() {
        let ctx = LookupContext::normalize(&RawEvidence {
            numeric_id_candidates: vec![
                RawRowId::Number(42.into()),
                RawRowId::Text(" 42 ".to_owned()),
                RawRowId::Number(0.into()),
                RawRowId::Number((-3).into()),
                RawRowId::Number(Number::from_f64(2.5).expect("finite")),
                RawRowId::Number(Number::from_f64(0.0).expect("finite")),
                RawRowId::Text("12abc".to_owned()),
                RawRowId::Text("-7".to_owned()),
                RawRowId::Text("0".to_owned()),
                RawRowId::Text("7".to_owned()),
            ],
            ..RawEvidence::default()
        });
        assert_eq!(ctx.numeric_id_candidates, vec![42, 7]);
    }

    #[test]
    fn empty_evidence_is_legal() {
        let ctx = LookupContext::normalize(&RawEvidence::default());
        assert!(ctx.is_empty());
        assert_eq!(ctx, LookupContext::default());
    }

    #[test]
    fn deserializes_mixed_row_id_forms() {
        let raw: RawEvidence = serde_json::from_value(serde_json::json!({
            "numericIdCandidates": [12, "13", "x", 14.0],
            "subject": "Hello"
        }))
        .expect("valid evidence");
        let ctx = LookupContext::normalize(&raw);
        assert_eq!(ctx.numeric_id_candidates(), &[12, 13, 14]);
        assert_eq!(ctx.subject(), "Hello");
    }

    #[test]
    fn accepts_snake_case_field_names() {
        let raw: RawEvidence = serde_json::from_value(serde_json::json!({
            "numeric_id_candidates": [5],
            "message_id_candidates": ["a@b"],
            "mailbox_hints": ["INBOX"]
        }))
        .expect("valid evidence");
        let ctx = LookupContext::normalize(&raw);
        assert_eq!(ctx.numeric_id_candidates(), &[5]);
        assert_eq!(ctx.message_id_candidates(), &["a@b".to_owned()]);
        assert_eq!(ctx.mailbox_hints(), &["INBOX".to_owned()]);
    }

    #[test]
    fn large_integer_row_ids_are_exact() {
        let raw: RawEvidence = serde_json::from_str(
            r#"{"numericIdCandidates": [9007199254740993, 18446744073709551615]}"#,
        )
        .expect("valid evidence");
        let ctx = LookupContext::normalize(&raw);
        assert_eq!(
            ctx.numeric_id_candidates(),
            &[9_007_199_254_740_993, u64::MAX]
        );
    }

    #[test]
    fn floats_beyond_exact_range_are_dropped() {
        let raw: RawEvidence = serde_json::from_str(
            r#"{"numericIdCandidates": [9007199254740993.0, 1e20, 9007199254740991.0]}"#,
        )
        .expect("valid evidence");
        let ctx = LookupContext::normalize(&raw);
        assert_eq!(ctx.numeric_id_candidates(), &[9_007_199_254_740_991]);
    }

    fn raw_row_id() -> impl Strategy<Value = RawRowId> {
        prop_oneof![
            (-5i64..100_000).prop_map(|n| RawRowId::Number(n.into())),
            any::<f64>()
                .prop_filter_map("finite", Number::from_f64)
                .prop_map(RawRowId::Number),
            "[ 0-9a-z-]{0,8}".prop_map(RawRowId::Text),
        ]
    }

    fn raw_evidence() -> impl Strategy<Value = RawEvidence> {
        (
            prop::collection::vec(raw_row_id(), 0..6),
            prop::collection::vec("[ <>a-z0-9@.]{0,12}", 0..6),
            prop::collection::vec("[ A-Za-z/]{0,10}", 0..4),
            prop::option::of("[ A-Za-z\"\\\\]{0,16}"),
            prop::option::of("[ a-z@.]{0,16}"),
        )
            .prop_map(
                |(numeric_id_candidates, message_id_candidates, mailbox_hints, subject, sender)| {
                    RawEvidence {
                        numeric_id_candidates,
                        message_id_candidates,
                        mailbox_hints,
                        subject,
                        sender,
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in raw_evidence()) {
            let once = LookupContext::normalize(&raw);
            let twice = LookupContext::normalize(&RawEvidence::from(once.clone()));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalized_candidates_are_trimmed_unique_and_positive(raw in raw_evidence()) {
            let ctx = LookupContext::normalize(&raw);
            prop_assert!(ctx.numeric_id_candidates.iter().all(|n| *n > 0));
            for list in [&ctx.message_id_candidates, &ctx.mailbox_hints] {
                for (i, value) in list.iter().enumerate() {
                    prop_assert!(!value.is_empty());
                    prop_assert_eq!(value.trim(), value.as_str());
                    prop_assert!(!list[..i].contains(value));
                }
            }
        }
    }
}
