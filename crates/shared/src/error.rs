use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Transport,
    Format,
    Application,
}

/// Failure taxonomy for every call that crosses the remote endpoint boundary.
///
/// The `Display` output is the text shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurveyError {
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Format(String),
    #[error("{0}")]
    Application(String),
}

impl SurveyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SurveyError::Configuration(_) => ErrorKind::Configuration,
            SurveyError::Transport(_) => ErrorKind::Transport,
            SurveyError::Format(_) => ErrorKind::Format,
            SurveyError::Application(_) => ErrorKind::Application,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SurveyError::Configuration(message)
            | SurveyError::Transport(message)
            | SurveyError::Format(message)
            | SurveyError::Application(message) => message,
        }
    }

    pub fn http_status(status: u16) -> Self {
        SurveyError::Transport(format!("HTTP error! status: {status}"))
    }
}

impl From<serde_json::Error> for SurveyError {
    fn from(value: serde_json::Error) -> Self {
        SurveyError::Format(format!("malformed response body: {value}"))
    }
}
