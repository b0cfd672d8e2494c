use serde::Deserialize;

use crate::error::EngineError;
use crate::mapping::FieldMapping;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Tolerance bands for the comparison run.
///
/// The ratio band is asymmetric: under-performance and over-performance
/// carry different engineering risk, so the lower and upper margins are
/// configured separately. `warning_band` widens both margins by a
/// multiplier to distinguish marginal from clearly-wrong units; when
/// unset, anything outside the margins fails directly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThresholdConfig {
    /// Allowed under-performance for ratio metrics, percent.
    #[serde(default = "default_lower_margin")]
    pub lower_margin_pct: f64,
    /// Allowed over-performance for ratio metrics, percent.
    #[serde(default = "default_upper_margin")]
    pub upper_margin_pct: f64,
    /// Water-side pressure drop ceiling.
    #[serde(default = "default_wpd_ceiling")]
    pub wpd_ceiling: f64,
    /// Air-side pressure drop ceiling.
    #[serde(default = "default_apd_ceiling")]
    pub apd_ceiling: f64,
    /// Warning band as a multiple of the margins (must be >= 1).
    #[serde(default)]
    pub warning_band: Option<f64>,
}

fn default_lower_margin() -> f64 {
    15.0
}

fn default_upper_margin() -> f64 {
    25.0
}

fn default_wpd_ceiling() -> f64 {
    5.0
}

fn default_apd_ceiling() -> f64 {
    0.25
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            lower_margin_pct: default_lower_margin(),
            upper_margin_pct: default_upper_margin(),
            wpd_ceiling: default_wpd_ceiling(),
            apd_ceiling: default_apd_ceiling(),
            warning_band: None,
        }
    }
}

impl ThresholdConfig {
    /// Rejects malformed thresholds before any comparison runs.
    pub fn validate(&self) -> Result<(), EngineError> {
        let checks: [(&'static str, f64); 4] = [
            ("lower_margin_pct", self.lower_margin_pct),
            ("upper_margin_pct", self.upper_margin_pct),
            ("wpd_ceiling", self.wpd_ceiling),
            ("apd_ceiling", self.apd_ceiling),
        ];
        for (field, value) in checks {
            if !value.is_finite() {
                return Err(EngineError::InvalidThreshold {
                    field,
                    reason: format!("must be a finite number, got {value}"),
                });
            }
            if value < 0.0 {
                return Err(EngineError::InvalidThreshold {
                    field,
                    reason: format!("must not be negative, got {value}"),
                });
            }
        }
        if let Some(band) = self.warning_band {
            if !band.is_finite() || band < 1.0 {
                return Err(EngineError::InvalidThreshold {
                    field: "warning_band",
                    reason: format!("must be a finite multiplier >= 1, got {band}"),
                });
            }
        }
        Ok(())
    }

    /// Ceiling applied to a magnitude metric, by canonical name.
    pub fn ceiling_for(&self, metric: &str) -> Option<f64> {
        match metric {
            "WPD" => Some(self.wpd_ceiling),
            "APD" => Some(self.apd_ceiling),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Job config
// ---------------------------------------------------------------------------

/// One reconciliation job: the two source files, the confirmed mapping,
/// and the tolerance bands.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub mapping: FieldMapping,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Legacy engineering schedule export; canonical column names.
    pub primary: SourceConfig,
    /// Selection-tool output; columns reached through the mapping.
    pub secondary: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub file: String,
}

impl JobConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: JobConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.thresholds.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
