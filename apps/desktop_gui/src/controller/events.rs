//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{GeolocationError, LocateCompletion, PredictionCompletion, PredictionError};

pub enum UiEvent {
    Info(String),
    PredictionSettled(PredictionCompletion),
    LocationSettled(LocateCompletion),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Permission,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Prediction,
    Geolocation,
    General,
}

/// Status-bar hint for a failed prediction; the alert itself always uses the fixed message.
pub fn classify_prediction_failure(err: &PredictionError, endpoint: &str) -> String {
    match err {
        PredictionError::Transport(_) => {
            format!("Prediction service unreachable at {endpoint}; check that the model server is running.")
        }
        PredictionError::Rejected { status } => {
            format!("Prediction service answered HTTP {status}.")
        }
        PredictionError::Service(message) => format!("Prediction service error: {message}"),
        PredictionError::MalformedResponse(_) => {
            "Prediction service returned an unreadable response.".to_string()
        }
        PredictionError::Aborted(_) => "Prediction was interrupted; retry.".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("401")
            || message_lower.contains("403")
            || message_lower.contains("permission")
            || message_lower.contains("denied")
        {
            UiErrorCategory::Permission
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("required")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("transport")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_geolocation(err: &GeolocationError) -> Self {
        Self::from_message(UiErrorContext::Geolocation, err.to_string())
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Permission => "Permission",
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
    }
}
