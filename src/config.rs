//! Configuration loaded from environment variables
//!
//! `MAIL_DB` keeps its historical name; everything else lives under the
//! `FRUITMAIL_` prefix. Values are read once at startup and passed down
//! explicitly; nothing below `main` reads the environment.

use std::env;
use std::env::VarError;
use std::path::PathBuf;

use crate::errors::{AppError, AppResult};

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Explicit mail database path, bypassing discovery
    pub db_override: Option<PathBuf>,
    /// Root holding the `V<n>` mail data directories
    pub mail_root: PathBuf,
    /// Program that runs AppleScript
    pub osascript_program: String,
    /// Script runner timeout in milliseconds (`0` disables it)
    pub script_timeout_ms: u64,
    /// Whether the MCP surface may open messages in Mail
    pub open_enabled: bool,
}

impl AppConfig {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a variable is set to a malformed value, or if
    /// neither `FRUITMAIL_MAIL_ROOT` nor `HOME` is available.
    ///
    /// # Example Environment
    ///
    /// ```text
    /// MAIL_DB=/Users/me/Library/Mail/V10/MailData/Envelope Index
    /// FRUITMAIL_OSASCRIPT=/usr/bin/osascript
    /// FRUITMAIL_SCRIPT_TIMEOUT_MS=60000
    /// FRUITMAIL_OPEN_ENABLED=true
    /// ```
    pub fn load_from_env() -> AppResult<Self> {
        let mail_root = match optional_env("FRUITMAIL_MAIL_ROOT")? {
            Some(root) => PathBuf::from(root),
            None => {
                let home = optional_env("HOME")?.ok_or_else(|| {
                    AppError::invalid("HOME is not set; set FRUITMAIL_MAIL_ROOT explicitly")
                })?;
                PathBuf::from(home).join("Library").join("Mail")
            }
        };

        Ok(Self {
            db_override: optional_env("MAIL_DB")?.map(PathBuf::from),
            mail_root,
            osascript_program: optional_env("FRUITMAIL_OSASCRIPT")?
                .unwrap_or_else(|| "osascript".to_owned()),
            script_timeout_ms: parse_u64_env("FRUITMAIL_SCRIPT_TIMEOUT_MS", 120_000)?,
            open_enabled: parse_bool_env("FRUITMAIL_OPEN_ENABLED", false)?,
        })
    }
}

/// Read a variable, treating unset and blank the same
fn optional_env(key: &str) -> AppResult<Option<String>> {
    match env::var(key) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse a boolean environment variable with flexible values
///
/// Accepts: `1`, `true`, `yes`, `y`, `on` (truthy) or `0`, `false`, `no`,
/// `n`, `off` (falsy). Case-insensitive. Returns `default` if unset.
fn parse_bool_env(key: &str, default: bool) -> AppResult<bool> {
    match optional_env(key)? {
        Some(v) => parse_bool_value(&v).ok_or_else(|| {
            AppError::InvalidInput(format!("invalid boolean environment variable {key}: '{v}'"))
        }),
        None => Ok(default),
    }
}

fn parse_bool_value(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a `u64` environment variable with default fallback
fn parse_u64_env(key: &str, default: u64) -> AppResult<u64> {
    match optional_env(key)? {
        Some(v) => v.trim().parse::<u64>().map_err(|_| {
            AppError::InvalidInput(format!("invalid u64 environment variable {key}: '{v}'"))
        }),
        None => Ok(default),
    }
}
