//! AppleScript literal escaping
//!
//! This is the single place where caller-supplied text becomes script text.
//! [`AppleScriptLiteral`] can only be built by the constructors here, and the
//! script builder accepts nothing else at an evidence position.

use std::fmt;

/// A value already rendered as an AppleScript literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleScriptLiteral(String);

impl AppleScriptLiteral {
    /// Quoted string literal
    pub fn string(value: &str) -> Self {
        Self(format!("\"{}\"", escape_string(value)))
    }

    /// List of quoted string literals, e.g. `{"a", "b"}`
    pub fn string_list<S: AsRef<str>>(values: &[S]) -> Self {
        let items = values
            .iter()
            .map(|v| format!("\"{}\"", escape_string(v.as_ref())))
            .collect::<Vec<_>>();
        Self(format!("{{{}}}", items.join(", ")))
    }

    /// List of integer literals, e.g. `{12, 40}`
    ///
    /// Integers are typed, so they are written bare.
    pub fn integer_list(values: &[u64]) -> Self {
        let items = values.iter().map(u64::to_string).collect::<Vec<_>>();
        Self(format!("{{{}}}", items.join(", ")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppleScriptLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escape text for use between double quotes in AppleScript
///
/// Backslashes go first so the backslashes added for quotes are not doubled.
pub fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
