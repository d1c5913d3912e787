//! Unified error types for Autopost

use thiserror::Error;

use crate::workflow::{GroupTarget, RunReport};

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Autopost
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Browser, context or page is gone
    #[error("Session closed: {0}")]
    SessionClosed(String),

    /// Timeout
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Landing or group page did not load
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// No qualifying composer overlay
    #[error("Composer not found: {0}")]
    ComposerNotFound(String),

    /// Every editor matcher came up empty
    #[error("Editor not found: {0}")]
    EditorNotFound(String),

    /// No file input accepted the media batch
    #[error("Media upload control not found: {0}")]
    MediaUploadControlNotFound(String),

    /// Every submit strategy failed
    #[error("Submit button not found: {0}")]
    SubmitButtonNotFound(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input file (cookies, content, media) could not be used
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new WebSocket error
    pub fn websocket<S: Into<String>>(msg: S) -> Self {
        Error::WebSocket(msg.into())
    }

    /// Create a new CDP error
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Create a new session closed error
    pub fn session_closed<S: Into<String>>(id: S) -> Self {
        Error::SessionClosed(id.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new navigation error
    pub fn navigation<S: Into<String>>(msg: S) -> Self {
        Error::Navigation(msg.into())
    }

    /// Create a new composer not found error
    pub fn composer_not_found<S: Into<String>>(msg: S) -> Self {
        Error::ComposerNotFound(msg.into())
    }

    /// Create a new editor not found error
    pub fn editor_not_found<S: Into<String>>(msg: S) -> Self {
        Error::EditorNotFound(msg.into())
    }

    /// Create a new media upload control not found error
    pub fn media_control_not_found<S: Into<String>>(msg: S) -> Self {
        Error::MediaUploadControlNotFound(msg.into())
    }

    /// Create a new submit button not found error
    pub fn submit_not_found<S: Into<String>>(msg: S) -> Self {
        Error::SubmitButtonNotFound(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Errors that must escape the per-group retry loop and stop the run.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Error::MediaUploadControlNotFound(_))
    }

    /// Errors the attempt boundary absorbs: the group is retried with a
    /// fresh session.
    pub fn is_group_retryable(&self) -> bool {
        !self.is_run_fatal()
    }
}

/// A run-fatal failure together with everything recorded before it.
#[derive(Error, Debug)]
#[error("run aborted{}: {source}", group_suffix(.group))]
pub struct RunAbort {
    /// Group being processed when the run stopped; `None` when the landing
    /// page never loaded
    pub group: Option<GroupTarget>,
    /// Records of every group attempted so far, including the aborted one
    pub report: RunReport,
    /// The escalated failure
    #[source]
    pub source: Error,
}

fn group_suffix(group: &Option<GroupTarget>) -> String {
    match group {
        Some(group) => format!(" while posting to group {}", group),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_control_failure_is_run_fatal() {
        let err = Error::media_control_not_found("no file input");
        assert!(err.is_run_fatal());
        assert!(!err.is_group_retryable());
    }

    #[test]
    fn test_resolution_failures_are_group_retryable() {
        let errors = [
            Error::navigation("timeout"),
            Error::composer_not_found("only messenger"),
            Error::editor_not_found("all matchers empty"),
            Error::submit_not_found("all strategies failed"),
            Error::cdp("target crashed"),
        ];

        for err in errors {
            assert!(err.is_group_retryable(), "{err} should be retryable");
            assert!(!err.is_run_fatal());
        }
    }

    #[test]
    fn test_run_abort_display_names_group() {
        let abort = RunAbort {
            group: Some(GroupTarget::from("12345")),
            report: RunReport::default(),
            source: Error::media_control_not_found("none"),
        };

        let message = abort.to_string();
        assert!(message.contains("12345"));
        assert!(message.contains("Media upload control not found"));
    }

    #[test]
    fn test_run_abort_without_group() {
        let abort = RunAbort {
            group: None,
            report: RunReport::default(),
            source: Error::navigation("landing page timed out"),
        };

        assert_eq!(
            abort.to_string(),
            "run aborted: Navigation failed: landing page timed out"
        );
    }
}
