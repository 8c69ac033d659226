use std::fmt;

use shared::domain::FormField;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    #[error("prediction service rejected the request with status {status}")]
    Rejected { status: u16 },
    #[error("prediction service reported an error: {0}")]
    Service(String),
    #[error("prediction transport failure: {0}")]
    Transport(String),
    #[error("malformed prediction response: {0}")]
    MalformedResponse(String),
    #[error("prediction task did not complete: {0}")]
    Aborted(String),
}

impl From<reqwest::Error> for PredictionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PredictionError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            PredictionError::Rejected {
                status: status.as_u16(),
            }
        } else {
            PredictionError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("geolocation is not supported on this host")]
    Unsupported,
    #[error("geolocation permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("geolocation request timed out")]
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldIssueKind {
    Missing,
    NotNumeric,
    OutOfRange { min: i64, max: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: FormField,
    pub kind: FieldIssueKind,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FieldIssueKind::Missing => write!(f, "{} is required", self.field.label()),
            FieldIssueKind::NotNumeric => write!(f, "{} must be a number", self.field.label()),
            FieldIssueKind::OutOfRange { min, max } => {
                write!(f, "{} must be between {min} and {max}", self.field.label())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("form is incomplete: {}", describe_issues(.0))]
    Invalid(Vec<FieldIssue>),
}

pub(crate) fn describe_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
