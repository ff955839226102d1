use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Tracked indicators. The metadata methods are the single source of truth
/// for how each one is scored and which alert category it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiId {
    EnergyConsumption,
    MixingTime,
    FormulationCost,
    StockIssues,
    OrderFulfillment,
}

impl KpiId {
    pub const ALL: [KpiId; 5] = [
        KpiId::EnergyConsumption,
        KpiId::MixingTime,
        KpiId::FormulationCost,
        KpiId::StockIssues,
        KpiId::OrderFulfillment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KpiId::EnergyConsumption => "energy_consumption",
            KpiId::MixingTime => "mixing_time",
            KpiId::FormulationCost => "formulation_cost",
            KpiId::StockIssues => "stock_issues",
            KpiId::OrderFulfillment => "order_fulfillment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            KpiId::EnergyConsumption => "Consommation énergétique",
            KpiId::MixingTime => "Temps de mélange",
            KpiId::FormulationCost => "Coût par formulation",
            KpiId::StockIssues => "Problèmes de stock",
            KpiId::OrderFulfillment => "Commandes expédiées",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            KpiId::EnergyConsumption => "%",
            KpiId::MixingTime => "min",
            KpiId::FormulationCost => "cur.",
            KpiId::StockIssues => "issues",
            KpiId::OrderFulfillment => "orders",
        }
    }

    pub fn page(&self) -> Page {
        match self {
            KpiId::EnergyConsumption | KpiId::MixingTime => Page::Production,
            KpiId::FormulationCost | KpiId::StockIssues | KpiId::OrderFulfillment => {
                Page::Warehouse
            }
        }
    }

    pub fn rule(&self) -> ScoreRule {
        match self {
            KpiId::EnergyConsumption => ScoreRule::Direct,
            KpiId::MixingTime => ScoreRule::Reversed,
            KpiId::FormulationCost | KpiId::StockIssues => ScoreRule::Binary,
            KpiId::OrderFulfillment => ScoreRule::Proportional,
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            KpiId::EnergyConsumption => EventCategory::Energy,
            KpiId::MixingTime => EventCategory::MixingTime,
            KpiId::FormulationCost => EventCategory::Budget,
            KpiId::StockIssues => EventCategory::Stock,
            KpiId::OrderFulfillment => EventCategory::Logistics,
        }
    }
}

impl fmt::Display for KpiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown KPI `{0}`")]
pub struct ParseKpiError(pub String);

impl FromStr for KpiId {
    type Err = ParseKpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KpiId::ALL
            .into_iter()
            .find(|kpi| kpi.as_str() == s.trim())
            .ok_or_else(|| ParseKpiError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Production,
    Warehouse,
}

impl Page {
    pub fn kpis(&self) -> Vec<KpiId> {
        KpiId::ALL
            .into_iter()
            .filter(|kpi| kpi.page() == *self)
            .collect()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Page::Production => "Production",
            Page::Warehouse => "Entrepôt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown page `{0}`, expected production or warehouse")]
pub struct ParsePageError(pub String);

impl FromStr for Page {
    type Err = ParsePageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "production" => Ok(Page::Production),
            "warehouse" => Ok(Page::Warehouse),
            other => Err(ParsePageError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRule {
    /// Pass/fail against a budget or goal.
    Binary,
    /// Progress towards a target, higher is better.
    Proportional,
    /// Lower is better; overshooting the target costs points.
    Reversed,
    /// Value is already a 0-100 percentage.
    Direct,
}

/// A persisted observation. Aggregation only ever reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub id: Uuid,
    pub kpi: KpiId,
    pub date: NaiveDate,
    pub value: f64,
    pub target: f64,
    pub notes: Option<String>,
    pub data: Option<serde_json::Value>,
    pub recorded_at: DateTime<Utc>,
}

impl MetricEntry {
    pub fn energy_reading(&self) -> Option<EnergyReading> {
        self.data
            .as_ref()
            .and_then(|data| serde_json::from_value(data.clone()).ok())
    }
}

/// An entry that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub kpi: KpiId,
    pub date: NaiveDate,
    pub value: f64,
    pub target: f64,
    pub notes: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// Sub-statistics captured by the energy tracker form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyReading {
    pub electricity_kwh: f64,
    pub electricity_target_kwh: f64,
    pub water_m3: f64,
    pub water_target_m3: f64,
    pub cost: f64,
    pub budget: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    /// Lower ranks sort first.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Energy,
    MixingTime,
    Budget,
    Stock,
    Logistics,
}

impl EventCategory {
    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::Energy => "Énergie",
            EventCategory::MixingTime => "Temps de Mélange",
            EventCategory::Budget => "Gestion Budgétaire",
            EventCategory::Stock => "Gestion de Stock",
            EventCategory::Logistics => "Performance Logistique",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    LowPerformance,
    HighConsumption,
    BudgetOverrun,
    StockIssues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub severity: Severity,
    pub category: EventCategory,
    pub kpi: KpiId,
    pub title: String,
    pub description: String,
    pub iso_year: i32,
    pub week: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStatus {
    Excellent,
    Good,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekBucket {
    pub iso_year: i32,
    pub week: u32,
    pub entries: Vec<MetricEntry>,
    /// Mean score per KPI.
    pub score_averages: BTreeMap<KpiId, f64>,
    /// Mean raw value per KPI.
    pub value_averages: BTreeMap<KpiId, f64>,
    /// Consumption for energy, summed value for cost and stock issues.
    pub totals: BTreeMap<KpiId, f64>,
    pub events: Vec<DetectedEvent>,
    pub status: WeekStatus,
}

impl WeekBucket {
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    EnergyOptimization,
    ProcessOptimization,
    BudgetControl,
    StockManagement,
    LogisticsImprovement,
    MaintainPerformance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub entry_count: usize,
    pub kpi_averages: BTreeMap<KpiId, f64>,
    pub overall_percentage: u8,
    pub weeks: Vec<WeekBucket>,
    pub events: Vec<DetectedEvent>,
    pub excellent_weeks: usize,
    pub warning_weeks: usize,
    pub critical_weeks: usize,
    pub recommendations: Vec<Recommendation>,
}

/// Outcome of aggregating a month. An empty month is reported as such and
/// never as a zero score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MonthlyReport {
    NoData { year: i32, month: u32 },
    Summary(MonthlySummary),
}

#[derive(Debug, Clone)]
pub struct MonthlyTrend {
    pub month_start: NaiveDate,
    pub entry_count: i64,
    pub avg_value: f64,
    pub avg_target: f64,
}
