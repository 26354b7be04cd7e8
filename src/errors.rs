//! Application error model with MCP error mapping
//!
//! Every failure a caller can observe is one of a small set of kinds:
//! validation, message not found, in-script error reported by Mail, or a
//! dispatch failure where the script could not be run at all. Locator and
//! configuration failures get their own variants. Each variant maps to an
//! MCP `ErrorData` for the stdio tool surface.

use rmcp::model::ErrorData;
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    /// Caller-supplied identifier or setting failed a format check
    #[error("{0}")]
    InvalidInput(String),
    /// Resolution ladder exhausted without a match
    #[error("Message not found")]
    MessageNotFound,
    /// Mail raised an error while running a well-formed script
    #[error("Mail script error {code}: {message}")]
    Script { code: String, message: String },
    /// The script could not be run at all
    #[error("{0}")]
    Dispatch(String),
    /// A non-message resource (mail database, mail root) is missing
    #[error("{0}")]
    NotFound(String),
    /// Filesystem access was refused
    #[error("{0}")]
    PermissionDenied(String),
    /// Internal error (unexpected failure, external crate error)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Convenience constructor for `InvalidInput`
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Convert to MCP `ErrorData`
    ///
    /// # Mappings
    ///
    /// - `InvalidInput` → `invalid_params`
    /// - `MessageNotFound`, `NotFound` → `resource_not_found`
    /// - `PermissionDenied` → `invalid_request`
    /// - `Script`, `Dispatch`, `Internal` → `internal_error`
    pub fn to_error_data(&self) -> ErrorData {
        let msg = self.to_string();
        match self {
            Self::InvalidInput(_) => {
                ErrorData::invalid_params(msg, Some(json!({ "code": "invalid_input" })))
            }
            Self::MessageNotFound => {
                ErrorData::resource_not_found(msg, Some(json!({ "code": "message_not_found" })))
            }
            Self::Script { code, message } => ErrorData::internal_error(
                msg,
                Some(json!({
                    "code": "script_error",
                    "host_code": code,
                    "host_message": message,
                })),
            ),
            Self::Dispatch(_) => {
                ErrorData::internal_error(msg, Some(json!({ "code": "dispatch_failed" })))
            }
            Self::NotFound(_) => {
                ErrorData::resource_not_found(msg, Some(json!({ "code": "not_found" })))
            }
            Self::PermissionDenied(_) => {
                ErrorData::invalid_request(msg, Some(json!({ "code": "permission_denied" })))
            }
            Self::Internal(_) => {
                ErrorData::internal_error(msg, Some(json!({ "code": "internal" })))
            }
        }
    }
}

/// Type alias for fallible return values
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn caller_facing_messages_are_stable() {
        assert_eq!(AppError::MessageNotFound.to_string(), "Message not found");
        assert_eq!(
            AppError::invalid("Invalid message ID").to_string(),
            "Invalid message ID"
        );
        let err = AppError::Script {
            code: "-1743".to_owned(),
            message: "Not authorized to send Apple events to Mail.".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Mail script error -1743: Not authorized to send Apple events to Mail."
        );
    }

    #[test]
    fn script_error_data_carries_host_code() {
        let data = AppError::Script {
            code: "-600".to_owned(),
            message: "Application isn't running.".to_owned(),
        }
        .to_error_data();
        let extra = data.data.expect("structured data");
        assert_eq!(extra["code"], "script_error");
        assert_eq!(extra["host_code"], "-600");
    }
}
