use crate::models::{EnergyReading, KpiId, MetricEntry, ScoreRule};

/// Score a KPI value against its target, budget or goal. Always in `[0, 100]`.
pub fn score(kpi: KpiId, value: f64, threshold: f64) -> u8 {
    score_with_rule(kpi.rule(), value, threshold)
}

pub fn score_with_rule(rule: ScoreRule, value: f64, threshold: f64) -> u8 {
    if !value.is_finite() || !threshold.is_finite() || threshold == 0.0 {
        return 0;
    }

    match rule {
        ScoreRule::Binary => binary_score(value, threshold),
        ScoreRule::Proportional => to_percent(value / threshold * 100.0),
        ScoreRule::Reversed => to_percent(100.0 - (value - threshold) / threshold * 100.0),
        ScoreRule::Direct => to_percent(value),
    }
}

pub fn entry_score(entry: &MetricEntry) -> u8 {
    score(entry.kpi, entry.value, entry.target)
}

pub fn binary_score(value: f64, threshold: f64) -> u8 {
    if threshold == 0.0 || !value.is_finite() {
        return 0;
    }
    if value <= threshold {
        100
    } else {
        0
    }
}

/// Mean of several sub-scores, rounded to the nearest integer.
pub fn composite_score(sub_scores: &[u8]) -> u8 {
    if sub_scores.is_empty() {
        return 0;
    }
    let total: u32 = sub_scores.iter().map(|score| u32::from(*score)).sum();
    to_percent(f64::from(total) / sub_scores.len() as f64)
}

/// Electricity, water and spend each pass or fail against their own limit.
pub fn energy_score(reading: &EnergyReading) -> u8 {
    composite_score(&[
        binary_score(reading.electricity_kwh, reading.electricity_target_kwh),
        binary_score(reading.water_m3, reading.water_target_m3),
        binary_score(reading.cost, reading.budget),
    ])
}

fn to_percent(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u8
}
