// src/core/brief.rs — Design brief: requirements and constraints for one run

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::infra::errors::DesignError;
use crate::util::json_text;

pub const DEFAULT_TITLE: &str = "GLUCOSE MONITORING SYSTEM";

pub const DEFAULT_ALERT_LATENCY: &str = "<10s";
pub const DEFAULT_MARD_TARGET: &str = "<=10%";
pub const DEFAULT_BLE_RELIABILITY: &str = ">=99%";

pub const DEFAULT_BLE_RANGE: &str = "≤5m";
pub const DEFAULT_AFE_SENSOR_COMPAT: &str = "AFE bias must match sensor output";
pub const DEFAULT_SAMPLING_STABILITY: &str = "±0.2 min max drift";
pub const DEFAULT_MCU_BLE_INTERFACE: &str = "{UART, SPI, I2C}";
pub const DEFAULT_BATTERY_FORM_FACTOR: &str = "Wearable patch form factor";

/// The brief written by `designloop brief`, matching [`DesignBrief::sample`].
pub const SAMPLE_BRIEF_TOML: &str = r#"# designloop brief: continuous glucose monitor patch
title = "GLUCOSE MONITORING SYSTEM"
max_iterations = 2

[requirements]
sampling_interval = "5 ± 0.2 min"
battery_life = ">=24h"
alert_thresholds = { low = 70, high = 180 }

[constraints]
adc_bits = [10, 12, 14, 16]
ble_range = "≤5m"
"#;

/// Glucose alert bounds, either numeric or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertThresholds {
    Bounds { low: f64, high: f64 },
    Text(String),
}

impl std::fmt::Display for AlertThresholds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertThresholds::Bounds { low, high } => write!(f, "<{low} / >{high} mg/dL"),
            AlertThresholds::Text(s) => f.write_str(s),
        }
    }
}

/// Allowed ADC resolutions, either a set of bit widths or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdcBits {
    Set(Vec<u32>),
    Text(String),
}

impl AdcBits {
    fn is_blank(&self) -> bool {
        match self {
            AdcBits::Set(bits) => bits.is_empty(),
            AdcBits::Text(s) => s.trim().is_empty(),
        }
    }
}

impl std::fmt::Display for AdcBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdcBits::Set(bits) => {
                let joined = bits
                    .iter()
                    .map(|b| b.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{{{joined}}}")
            }
            AdcBits::Text(s) => f.write_str(s),
        }
    }
}

/// Named performance targets. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_thresholds: Option<AlertThresholds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_life: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_latency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mard_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ble_reliability: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Requirements {
    pub fn alert_latency(&self) -> &str {
        or_default(&self.alert_latency, DEFAULT_ALERT_LATENCY)
    }

    pub fn mard_target(&self) -> &str {
        or_default(&self.mard_target, DEFAULT_MARD_TARGET)
    }

    pub fn ble_reliability(&self) -> &str {
        or_default(&self.ble_reliability, DEFAULT_BLE_RELIABILITY)
    }

    pub fn alert_thresholds_text(&self) -> String {
        self.alert_thresholds
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_default()
    }
}

/// Hard physical and interface limits. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adc_bits: Option<AdcBits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ble_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afe_sensor_compat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_stability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcu_ble_interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_form_factor: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Constraints {
    pub fn adc_bits_text(&self) -> String {
        self.adc_bits
            .as_ref()
            .map(|b| b.to_string())
            .unwrap_or_default()
    }

    pub fn ble_range(&self) -> &str {
        or_default(&self.ble_range, DEFAULT_BLE_RANGE)
    }

    pub fn afe_sensor_compat(&self) -> &str {
        or_default(&self.afe_sensor_compat, DEFAULT_AFE_SENSOR_COMPAT)
    }

    pub fn sampling_stability(&self) -> &str {
        or_default(&self.sampling_stability, DEFAULT_SAMPLING_STABILITY)
    }

    pub fn mcu_ble_interface(&self) -> &str {
        or_default(&self.mcu_ble_interface, DEFAULT_MCU_BLE_INTERFACE)
    }

    pub fn battery_form_factor(&self) -> &str {
        or_default(&self.battery_form_factor, DEFAULT_BATTERY_FORM_FACTOR)
    }
}

fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default)
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// A validated set of inputs for one exploration run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignBrief {
    pub title: String,
    pub requirements: Requirements,
    pub constraints: Constraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
}

/// On-disk shape, where either table may be missing.
#[derive(Debug, Deserialize)]
struct BriefFile {
    title: Option<String>,
    requirements: Option<Requirements>,
    constraints: Option<Constraints>,
    max_iterations: Option<u32>,
}

impl DesignBrief {
    /// Build and validate a brief. Absent tables or required fields are
    /// configuration faults.
    pub fn new(
        requirements: Option<Requirements>,
        constraints: Option<Constraints>,
    ) -> Result<Self, DesignError> {
        let requirements =
            requirements.ok_or_else(|| DesignError::MissingInput("requirements".into()))?;
        let constraints =
            constraints.ok_or_else(|| DesignError::MissingInput("constraints".into()))?;

        let brief = Self {
            title: DEFAULT_TITLE.to_string(),
            requirements,
            constraints,
            max_iterations: None,
        };
        brief.validate()?;
        Ok(brief)
    }

    /// Check that every field the prompts cannot do without is present.
    pub fn validate(&self) -> Result<(), DesignError> {
        let r = &self.requirements;
        let c = &self.constraints;
        let mut missing = Vec::new();

        if is_blank(&r.sampling_interval) {
            missing.push("sampling_interval".to_string());
        }
        if r.alert_thresholds.is_none() {
            missing.push("alert_thresholds".to_string());
        }
        if is_blank(&r.battery_life) {
            missing.push("battery_life".to_string());
        }
        if c.adc_bits.as_ref().map_or(true, AdcBits::is_blank) {
            missing.push("adc_bits".to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DesignError::MissingFields(missing))
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, DesignError> {
        let file: BriefFile =
            toml::from_str(text).map_err(|e| DesignError::InvalidBrief(e.to_string()))?;
        Self::from_file(file)
    }

    pub fn from_json_str(text: &str) -> Result<Self, DesignError> {
        let file: BriefFile =
            serde_json::from_str(text).map_err(|e| DesignError::InvalidBrief(e.to_string()))?;
        Self::from_file(file)
    }

    /// Load a brief from disk; `.json` files are JSON, anything else TOML.
    pub fn load(path: &Path) -> Result<Self, DesignError> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }

    fn from_file(file: BriefFile) -> Result<Self, DesignError> {
        let mut brief = Self::new(file.requirements, file.constraints)?;
        if let Some(title) = file.title.filter(|t| !t.trim().is_empty()) {
            brief.title = title;
        }
        brief.max_iterations = file.max_iterations;
        Ok(brief)
    }

    /// The continuous-glucose-monitor scenario.
    pub fn sample() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            requirements: Requirements {
                sampling_interval: Some("5 ± 0.2 min".into()),
                alert_thresholds: Some(AlertThresholds::Bounds {
                    low: 70.0,
                    high: 180.0,
                }),
                battery_life: Some(">=24h".into()),
                ..Default::default()
            },
            constraints: Constraints {
                adc_bits: Some(AdcBits::Set(vec![10, 12, 14, 16])),
                ble_range: Some("≤5m".into()),
                ..Default::default()
            },
            max_iterations: Some(2),
        }
    }

    /// Unknown requirement keys as `(key, text)` pairs, in key order.
    pub fn extra_requirements(&self) -> Vec<(String, String)> {
        extra_lines(&self.requirements.extra)
    }

    /// Unknown constraint keys as `(key, text)` pairs, in key order.
    pub fn extra_constraints(&self) -> Vec<(String, String)> {
        extra_lines(&self.constraints.extra)
    }
}

fn extra_lines(extra: &BTreeMap<String, Value>) -> Vec<(String, String)> {
    extra
        .iter()
        .map(|(k, v)| (k.clone(), json_text(v)))
        .filter(|(_, v)| !v.is_empty())
        .collect()
}
