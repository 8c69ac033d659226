use std::{fmt, ops::RangeInclusive, str::FromStr};

use serde::{
    ser::SerializeMap,
    Deserialize, Serialize, Serializer,
};

use crate::error::UnknownFieldError;

macro_rules! form_fields {
    ($($variant:ident => $key:literal, $label:literal, $sample:literal;)+) => {
        /// Input fields of the prediction form, in rendering and wire order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FormField {
            $($variant,)+
        }

        impl FormField {
            pub const ALL: [FormField; FormField::COUNT] = [$(FormField::$variant,)+];

            /// Key used in the JSON payload.
            pub fn key(self) -> &'static str {
                match self {
                    $(FormField::$variant => $key,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $(FormField::$variant => $label,)+
                }
            }

            /// Representative value used by "fill sample values"; empty for coordinates.
            pub fn sample_value(self) -> &'static str {
                match self {
                    $(FormField::$variant => $sample,)+
                }
            }
        }

        impl FromStr for FormField {
            type Err = UnknownFieldError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($key => Ok(FormField::$variant),)+
                    other => Err(UnknownFieldError::new(other)),
                }
            }
        }
    };
}

form_fields! {
    Day => "day", "Day", "15";
    Month => "month", "Month", "7";
    Year => "year", "Year", "2012";
    Temperature => "Temperature", "Temperature (°C)", "30";
    RelativeHumidity => "RH", "Relative Humidity (%)", "40";
    WindSpeed => "Ws", "Wind Speed (km/h)", "6";
    Rain => "Rain", "Rain (mm)", "0";
    Ffmc => "FFMC", "FFMC", "85";
    Dmc => "DMC", "DMC", "25";
    Dc => "DC", "DC", "60";
    Isi => "ISI", "ISI", "5";
    Bui => "BUI", "BUI", "30";
    Latitude => "latitude", "Latitude", "";
    Longitude => "longitude", "Longitude", "";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Numeric,
    Text,
}

impl FormField {
    pub const COUNT: usize = 14;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_coordinate(self) -> bool {
        matches!(self, FormField::Latitude | FormField::Longitude)
    }

    pub fn is_required(self) -> bool {
        !self.is_coordinate()
    }

    pub fn input_kind(self) -> InputKind {
        if self.is_coordinate() {
            InputKind::Text
        } else {
            InputKind::Numeric
        }
    }

    pub fn accepted_range(self) -> Option<RangeInclusive<f64>> {
        match self {
            FormField::Day => Some(1.0..=31.0),
            FormField::Month => Some(1.0..=12.0),
            FormField::Year => Some(1900.0..=2100.0),
            _ => None,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw form values keyed by [`FormField`]. Empty string means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    values: [String; FormField::COUNT],
}

impl FormData {
    pub fn get(&self, field: FormField) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    pub fn is_set(&self, field: FormField) -> bool {
        !self.get(field).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> + '_ {
        FormField::ALL
            .iter()
            .map(move |field| (*field, self.get(*field)))
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::parse(
            self.get(FormField::Latitude),
            self.get(FormField::Longitude),
        )
    }
}

impl Serialize for FormData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FormField::COUNT))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.key(), value)?;
        }
        map.end()
    }
}

/// Decimal-degree position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components must be present and parse to finite numbers.
    pub fn parse(latitude: &str, longitude: &str) -> Option<Self> {
        Some(Self::new(parse_finite(latitude)?, parse_finite(longitude)?))
    }
}

pub fn parse_finite(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Six fractional digits, the precision geolocation writes into the form.
pub fn format_degrees(value: f64) -> String {
    format!("{value:.6}")
}
