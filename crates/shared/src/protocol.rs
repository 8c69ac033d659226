use serde::{Deserialize, Serialize};

use crate::domain::{FormData, FormField};

/// Body POSTed to the prediction endpoint: every form field, verbatim, under its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PredictionRequest {
    pub form: FormData,
}

impl PredictionRequest {
    pub fn new(form: FormData) -> Self {
        Self { form }
    }

    pub fn value(&self, field: FormField) -> &str {
        self.form.get(field)
    }
}

/// FWI as returned by the service; some backends send it as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FwiReading {
    Number(f64),
    Text(String),
}

impl FwiReading {
    /// Finite numeric value, if the reading holds one.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            FwiReading::Number(value) => Some(*value),
            FwiReading::Text(text) => text.trim().parse::<f64>().ok(),
        };
        value.filter(|value| value.is_finite())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default, alias = "predicted_FWI", skip_serializing_if = "Option::is_none")]
    pub fwi: Option<FwiReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
