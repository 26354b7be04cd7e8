//! Script dispatch and output classification
//!
//! Sends a built script through a [`ScriptRunner`] and sorts the result into
//! found, not found, or an error raised inside the script. A runner that
//! could not run the script at all yields a [`DispatchError`], which is kept
//! apart from in-script errors.

use thiserror::Error;
use tracing::{debug, warn};

use crate::runner::{RunnerError, ScriptRunner};
use crate::script::{NOT_FOUND_SENTINEL, SCRIPT_ERROR_PREFIX, ScriptText};

/// Classified result of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Message content (body mode) or the success token (open mode)
    Found(String),
    NotFound,
    /// Mail raised an error; code and message are verbatim
    ScriptError { code: String, message: String },
}

/// The script could not be run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not run mail script: {0}")]
pub struct DispatchError(#[from] pub RunnerError);

/// Classify trimmed script output
pub fn classify(output: &str) -> ResolutionOutcome {
    let output = output.trim();
    if output == NOT_FOUND_SENTINEL {
        return ResolutionOutcome::NotFound;
    }
    if let Some(rest) = output.strip_prefix(SCRIPT_ERROR_PREFIX) {
        let (code, message) = rest.split_once(':').unwrap_or((rest, ""));
        return ResolutionOutcome::ScriptError {
            code: code.to_owned(),
            message: message.to_owned(),
        };
    }
    ResolutionOutcome::Found(output.to_owned())
}

/// Run `script` and classify what comes back
///
/// Some hosts report a sentinel return as a failed exit, so a runner failure
/// whose text carries the not-found sentinel still counts as not found.
pub async fn dispatch<R: ScriptRunner>(
    runner: &R,
    script: &ScriptText,
) -> Result<ResolutionOutcome, DispatchError> {
    debug!(script_bytes = script.as_str().len(), "dispatching mail script");
    match runner.run(script).await {
        Ok(output) => {
            let outcome = classify(&output);
            if let ResolutionOutcome::ScriptError { code, message } = &outcome {
                warn!(%code, %message, "mail script reported an error");
            }
            Ok(outcome)
        }
        Err(err) if err.to_string().contains(NOT_FOUND_SENTINEL) => {
            debug!("runner failure carried the not-found sentinel");
            Ok(ResolutionOutcome::NotFound)
        }
        Err(err) => {
            warn!(error = %err, "mail script dispatch failed");
            Err(DispatchError(err))
        }
    }
}
