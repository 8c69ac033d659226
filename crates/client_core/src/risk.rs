//! Fire-danger banding of FWI values.

const MODERATE_FROM: f64 = 6.0;
const HIGH_FROM: f64 = 12.0;
const EXTREME_FROM: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::Low,
        RiskCategory::Moderate,
        RiskCategory::High,
        RiskCategory::Extreme,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::Low => "Low",
            RiskCategory::Moderate => "Moderate",
            RiskCategory::High => "High",
            RiskCategory::Extreme => "Extreme",
        }
    }

    pub fn color_hex(self) -> &'static str {
        match self {
            RiskCategory::Low => "#2ecc71",
            RiskCategory::Moderate => "#f1c40f",
            RiskCategory::High => "#e67e22",
            RiskCategory::Extreme => "#e74c3c",
        }
    }

    pub fn color_rgb(self) -> [u8; 3] {
        match self {
            RiskCategory::Low => [0x2e, 0xcc, 0x71],
            RiskCategory::Moderate => [0xf1, 0xc4, 0x0f],
            RiskCategory::High => [0xe6, 0x7e, 0x22],
            RiskCategory::Extreme => [0xe7, 0x4c, 0x3c],
        }
    }
}

/// Lower bounds are inclusive. NaN fails every comparison and lands in `Extreme`.
pub fn classify(value: f64) -> RiskCategory {
    if value < MODERATE_FROM {
        RiskCategory::Low
    } else if value < HIGH_FROM {
        RiskCategory::Moderate
    } else if value < EXTREME_FROM {
        RiskCategory::High
    } else {
        RiskCategory::Extreme
    }
}

/// Rounded FWI together with its band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    fwi: f64,
    risk: RiskCategory,
}

impl PredictionResult {
    /// Rounds to hundredths via the two-decimal rendering and classifies what is displayed.
    /// Non-finite input yields `None`.
    pub fn from_raw(raw: f64) -> Option<Self> {
        if !raw.is_finite() {
            return None;
        }
        let fwi = format!("{raw:.2}")
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())?;
        Some(Self {
            fwi,
            risk: classify(fwi),
        })
    }

    pub fn fwi(&self) -> f64 {
        self.fwi
    }

    pub fn risk(&self) -> RiskCategory {
        self.risk
    }

    pub fn display_value(&self) -> String {
        format!("{:.2}", self.fwi)
    }
}
