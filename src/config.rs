use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "kpi-dashboard.toml";

/// Alerting and recommendation cutoffs. Defaults are the values the
/// dashboard shipped with; every one of them can be overridden from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub scores: ScoreBands,
    pub energy: EnergyThresholds,
    pub cost: CostThresholds,
    pub stock: StockThresholds,
    pub recommendations: RecommendationThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreBands {
    pub excellent: f64,
    /// Lower edge of a good week on the dashboard. Week status does not use
    /// it: every week without alerts that misses the excellent band is good.
    pub good: f64,
    pub warning: f64,
    pub critical: f64,
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            excellent: 80.0,
            good: 60.0,
            warning: 70.0,
            critical: 50.0,
        }
    }
}

/// Weekly electricity consumption limits, in kWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyThresholds {
    pub consumption_warning_kwh: f64,
    pub consumption_critical_kwh: f64,
}

impl Default for EnergyThresholds {
    fn default() -> Self {
        Self {
            consumption_warning_kwh: 5000.0,
            consumption_critical_kwh: 8000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostThresholds {
    /// Share of the budget above which spend is flagged before it overruns.
    pub budget_warning_ratio: f64,
}

impl Default for CostThresholds {
    fn default() -> Self {
        Self {
            budget_warning_ratio: 0.9,
        }
    }
}

/// Weekly stock issue counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockThresholds {
    pub issues_warning: f64,
    pub issues_critical: f64,
}

impl Default for StockThresholds {
    fn default() -> Self {
        Self {
            issues_warning: 5.0,
            issues_critical: 10.0,
        }
    }
}

/// A recommendation fires once its category has strictly more events than this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    pub energy_events: usize,
    pub mixing_events: usize,
    pub budget_events: usize,
    pub stock_events: usize,
    pub logistics_events: usize,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            energy_events: 2,
            mixing_events: 1,
            budget_events: 0,
            stock_events: 1,
            logistics_events: 1,
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), String> {
        let scores = &self.scores;
        let bounds = [
            ("scores.excellent", scores.excellent),
            ("scores.good", scores.good),
            ("scores.warning", scores.warning),
            ("scores.critical", scores.critical),
            ("energy.consumption_warning_kwh", self.energy.consumption_warning_kwh),
            ("energy.consumption_critical_kwh", self.energy.consumption_critical_kwh),
            ("cost.budget_warning_ratio", self.cost.budget_warning_ratio),
            ("stock.issues_warning", self.stock.issues_warning),
            ("stock.issues_critical", self.stock.issues_critical),
        ];
        if let Some((name, value)) = bounds.iter().find(|(_, value)| !value.is_finite()) {
            return Err(format!("{name} must be a finite number, got {value}"));
        }
        if scores.critical > scores.warning {
            return Err(format!(
                "critical score band ({}) must not exceed warning band ({})",
                scores.critical, scores.warning
            ));
        }
        if scores.good > scores.excellent {
            return Err(format!(
                "good score band ({}) must not exceed excellent band ({})",
                scores.good, scores.excellent
            ));
        }
        if self.energy.consumption_warning_kwh > self.energy.consumption_critical_kwh {
            return Err("energy warning consumption must not exceed critical consumption".into());
        }
        if !(self.cost.budget_warning_ratio > 0.0 && self.cost.budget_warning_ratio <= 1.0) {
            return Err(format!(
                "budget_warning_ratio must be in (0, 1], got {}",
                self.cost.budget_warning_ratio
            ));
        }
        if self.stock.issues_warning > self.stock.issues_critical {
            return Err("stock warning count must not exceed critical count".into());
        }
        Ok(())
    }
}

pub fn parse_config(contents: &str) -> Result<ThresholdConfig, String> {
    let config = toml::from_str::<ThresholdConfig>(contents)
        .map_err(|e| format!("failed to parse threshold config: {e}"))?;
    config.validate()?;
    Ok(config)
}

/// An explicit path must load cleanly. Without one, `kpi-dashboard.toml` in
/// the working directory is tried and any problem falls back to defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ThresholdConfig> {
    if let Some(path) = path {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = parse_config(&contents).map_err(anyhow::Error::msg)?;
        tracing::debug!(path = %path.display(), "loaded threshold config");
        return Ok(config);
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    let contents = match std::fs::read_to_string(default_path) {
        Ok(contents) => contents,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("failed to read {DEFAULT_CONFIG_FILE}: {e}");
            }
            return Ok(ThresholdConfig::default());
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            tracing::debug!("loaded {DEFAULT_CONFIG_FILE}");
            Ok(config)
        }
        Err(e) => {
            tracing::warn!("{e}; using default thresholds");
            Ok(ThresholdConfig::default())
        }
    }
}
