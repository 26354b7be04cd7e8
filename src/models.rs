//! Tool input/output DTOs
//!
//! Types used by the MCP tool surface. Each one derives `JsonSchema` so the
//! tool schemas are generated from the Rust definitions.

use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata included in all tool responses
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Meta {
    /// Current UTC timestamp in RFC 3339 format with milliseconds
    pub now_utc: String,
    /// Tool execution duration in milliseconds
    pub duration_ms: u64,
}

impl Meta {
    pub fn now(duration_ms: u64) -> Self {
        Self {
            now_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            duration_ms,
        }
    }
}

/// Standard response envelope for all tools
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ToolEnvelope<T>
where
    T: JsonSchema,
{
    /// Human-readable summary of the operation outcome
    pub summary: String,
    /// Tool-specific data payload
    pub data: T,
    /// Execution metadata (timestamp, duration)
    pub meta: Meta,
}

/// Input: a Mail row id
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RowIdInput {
    /// Row id from the Mail envelope index (digits only)
    pub row_id: String,
}

/// Input: a Message-ID header value
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DocumentIdInput {
    /// Message-ID, with or without enclosing angle brackets
    pub document_id: String,
}

/// Message body returned by the body tools
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageBody {
    /// Plain-text content as reported by Mail
    pub body: String,
    /// Length of `body` in characters
    pub chars: usize,
}

impl MessageBody {
    pub fn new(body: String) -> Self {
        Self {
            chars: body.chars().count(),
            body,
        }
    }
}

/// Result of an open tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OpenResult {
    pub opened: bool,
    /// `message:` URL for the opened message, when its Message-ID is known
    pub message_url: Option<String>,
}

/// Result of `mail_locate_database`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseLocation {
    /// Absolute path of the `Envelope Index` database
    pub path: String,
}
