//! Form state: raw field values as the user typed them.

use shared::{
    domain::{format_degrees, parse_finite, Coordinate, FormData, FormField, InputKind},
    error::UnknownFieldError,
};
use tracing::debug;

use crate::error::{FieldIssue, FieldIssueKind};

#[derive(Debug, Clone, Default)]
pub struct FormState {
    data: FormData,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn snapshot(&self) -> FormData {
        self.data.clone()
    }

    pub fn get(&self, field: FormField) -> &str {
        self.data.get(field)
    }

    /// Stores `raw` verbatim. Returns whether the stored value changed.
    pub fn update(&mut self, field: FormField, raw: impl Into<String>) -> bool {
        let raw = raw.into();
        if self.data.get(field) == raw {
            return false;
        }
        self.data.set(field, raw);
        true
    }

    /// String-keyed variant of [`FormState::update`]; unknown names change nothing.
    pub fn update_by_name(
        &mut self,
        name: &str,
        raw: impl Into<String>,
    ) -> Result<bool, UnknownFieldError> {
        match name.parse::<FormField>() {
            Ok(field) => Ok(self.update(field, raw)),
            Err(err) => {
                debug!(field = name, "ignoring update for unknown form field");
                Err(err)
            }
        }
    }

    /// Replaces both coordinate fields in one write.
    pub fn set_coordinates(&mut self, coordinate: Coordinate) -> bool {
        let latitude = self.update(FormField::Latitude, format_degrees(coordinate.latitude));
        let longitude = self.update(FormField::Longitude, format_degrees(coordinate.longitude));
        latitude || longitude
    }

    pub fn latitude(&self) -> &str {
        self.get(FormField::Latitude)
    }

    pub fn longitude(&self) -> &str {
        self.get(FormField::Longitude)
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.data.coordinate()
    }

    pub fn fill_sample(&mut self) {
        for field in FormField::ALL.into_iter().filter(|field| field.is_required()) {
            self.update(field, field.sample_value());
        }
    }

    /// Input-layer checks run before a submission may leave the client.
    pub fn validate(&self) -> Vec<FieldIssue> {
        FormField::ALL
            .into_iter()
            .filter_map(|field| self.check_field(field).map(|kind| FieldIssue { field, kind }))
            .collect()
    }

    fn check_field(&self, field: FormField) -> Option<FieldIssueKind> {
        let raw = self.get(field);
        if raw.trim().is_empty() {
            return field.is_required().then_some(FieldIssueKind::Missing);
        }
        if field.input_kind() != InputKind::Numeric {
            return None;
        }
        let Some(value) = parse_finite(raw) else {
            return Some(FieldIssueKind::NotNumeric);
        };
        let range = field.accepted_range()?;
        if range.contains(&value) {
            None
        } else {
            Some(FieldIssueKind::OutOfRange {
                min: *range.start() as i64,
                max: *range.end() as i64,
            })
        }
    }
}
