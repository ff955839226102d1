use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::config::ThresholdConfig;
use crate::models::{
    DetectedEvent, EventKind, KpiId, MetricEntry, MonthlyReport, MonthlySummary, ScoreRule,
    Severity, WeekBucket, WeekStatus,
};
use crate::recommend;
use crate::scoring;

/// ISO-8601 week key. January days can belong to the previous ISO year.
pub fn iso_week_key(date: NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}

/// First day of the month and first day of the following month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, end))
}

pub fn aggregate_month(
    entries: &[MetricEntry],
    year: i32,
    month: u32,
    config: &ThresholdConfig,
) -> MonthlyReport {
    let in_month: Vec<&MetricEntry> = entries
        .iter()
        .filter(|entry| entry.date.year() == year && entry.date.month() == month)
        .collect();

    if in_month.is_empty() {
        return MonthlyReport::NoData { year, month };
    }

    let mut weeks: Vec<WeekBucket> = group_by_week(&in_month)
        .into_iter()
        .map(|(key, entries)| build_week(key, entries, config))
        .collect();

    if let Some(event) = monthly_budget_event(&in_month, config) {
        let covered = weeks.iter().flat_map(|week| &week.events).any(|e| {
            e.kind == EventKind::BudgetOverrun && e.severity.rank() <= event.severity.rank()
        });
        let crossing_week = weeks
            .iter_mut()
            .find(|week| (week.iso_year, week.week) == (event.iso_year, event.week));
        if let (false, Some(week)) = (covered, crossing_week) {
            week.events.push(event);
            week.status = classify_week(&week.score_averages, &week.events, config);
        }
    }

    let mut events: Vec<DetectedEvent> = weeks
        .iter()
        .flat_map(|week| week.events.iter().cloned())
        .collect();
    sort_events(&mut events);

    let mut kpi_averages = kpi_averages(&in_month);
    if let Some((total, budget)) = monthly_cost(&in_month) {
        kpi_averages.insert(
            KpiId::FormulationCost,
            f64::from(scoring::score(KpiId::FormulationCost, total, budget)),
        );
    }
    let overall_percentage = overall_percentage(&kpi_averages);
    let recommendations = recommend::generate(&events, &config.recommendations);
    let count_status =
        |status: WeekStatus| weeks.iter().filter(|week| week.status == status).count();

    MonthlyReport::Summary(MonthlySummary {
        year,
        month,
        entry_count: in_month.len(),
        excellent_weeks: count_status(WeekStatus::Excellent),
        warning_weeks: count_status(WeekStatus::Warning),
        critical_weeks: count_status(WeekStatus::Critical),
        kpi_averages,
        overall_percentage,
        weeks,
        events,
        recommendations,
    })
}

/// Partition entries by ISO week, in week order.
pub fn group_by_week(entries: &[&MetricEntry]) -> BTreeMap<(i32, u32), Vec<MetricEntry>> {
    let mut groups: BTreeMap<(i32, u32), Vec<MetricEntry>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry(iso_week_key(entry.date))
            .or_default()
            .push((*entry).clone());
    }
    for group in groups.values_mut() {
        group.sort_by_key(|entry| entry.date);
    }
    groups
}

fn build_week(
    (iso_year, week): (i32, u32),
    entries: Vec<MetricEntry>,
    config: &ThresholdConfig,
) -> WeekBucket {
    let mut scores: BTreeMap<KpiId, Vec<f64>> = BTreeMap::new();
    let mut values: BTreeMap<KpiId, Vec<f64>> = BTreeMap::new();
    for entry in &entries {
        scores
            .entry(entry.kpi)
            .or_default()
            .push(f64::from(scoring::entry_score(entry)));
        values.entry(entry.kpi).or_default().push(entry.value);
    }

    let score_averages: BTreeMap<KpiId, f64> = scores
        .iter()
        .map(|(kpi, scores)| (*kpi, mean(scores)))
        .collect();
    let value_averages: BTreeMap<KpiId, f64> = values
        .iter()
        .map(|(kpi, values)| (*kpi, mean(values)))
        .collect();
    let totals = week_totals(&entries);

    let mut bucket = WeekBucket {
        iso_year,
        week,
        entries,
        score_averages,
        value_averages,
        totals,
        events: Vec::new(),
        status: WeekStatus::Good,
    };
    bucket.events = detect_events(&bucket, config);
    bucket.status = classify_week(&bucket.score_averages, &bucket.events, config);
    bucket
}

fn week_totals(entries: &[MetricEntry]) -> BTreeMap<KpiId, f64> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        let amount = match entry.kpi {
            KpiId::EnergyConsumption => match entry.energy_reading() {
                Some(reading) => reading.electricity_kwh,
                None => continue,
            },
            KpiId::FormulationCost | KpiId::StockIssues => entry.value,
            KpiId::MixingTime | KpiId::OrderFulfillment => continue,
        };
        *totals.entry(entry.kpi).or_insert(0.0) += amount;
    }
    totals
}

/// Run the threshold battery for one week. Each check emits at most one
/// event, the most severe one that applies.
pub fn detect_events(bucket: &WeekBucket, config: &ThresholdConfig) -> Vec<DetectedEvent> {
    let mut events = Vec::new();
    let event = |kind, severity, kpi: KpiId, title: String, description: String| {
        DetectedEvent {
            kind,
            severity,
            category: kpi.category(),
            kpi,
            title,
            description,
            iso_year: bucket.iso_year,
            week: bucket.week,
        }
    };

    // Binary KPIs are judged on their weekly totals below.
    for (kpi, average) in &bucket.score_averages {
        if kpi.rule() == ScoreRule::Binary {
            continue;
        }
        let severity = if *average < config.scores.critical {
            Severity::Critical
        } else if *average < config.scores.warning {
            Severity::Warning
        } else {
            continue;
        };
        events.push(event(
            EventKind::LowPerformance,
            severity,
            *kpi,
            format!("{} en dessous de l'objectif", kpi.label()),
            format!(
                "Score moyen de {:.0}% en semaine {} (seuil {:.0}%)",
                average,
                bucket.week,
                match severity {
                    Severity::Critical => config.scores.critical,
                    Severity::Warning => config.scores.warning,
                }
            ),
        ));
    }

    if let Some(consumption) = bucket.totals.get(&KpiId::EnergyConsumption) {
        let limits = &config.energy;
        let severity = if *consumption > limits.consumption_critical_kwh {
            Some(Severity::Critical)
        } else if *consumption > limits.consumption_warning_kwh {
            Some(Severity::Warning)
        } else {
            None
        };
        if let Some(severity) = severity {
            events.push(event(
                EventKind::HighConsumption,
                severity,
                KpiId::EnergyConsumption,
                "Consommation électrique élevée".to_string(),
                format!(
                    "{:.0} kWh consommés en semaine {}",
                    consumption, bucket.week
                ),
            ));
        }
    }

    if let Some(total_cost) = bucket.totals.get(&KpiId::FormulationCost) {
        let budget = bucket
            .entries
            .iter()
            .filter(|entry| entry.kpi == KpiId::FormulationCost)
            .map(|entry| entry.target)
            .fold(0.0_f64, f64::max);
        let severity = if *total_cost > budget {
            Some(Severity::Critical)
        } else if *total_cost > budget * config.cost.budget_warning_ratio {
            Some(Severity::Warning)
        } else {
            None
        };
        if let Some(severity) = severity {
            let title = match severity {
                Severity::Critical => "Dépassement budgétaire",
                Severity::Warning => "Budget presque atteint",
            };
            events.push(event(
                EventKind::BudgetOverrun,
                severity,
                KpiId::FormulationCost,
                title.to_string(),
                format!("Coût de {:.0} pour un budget de {:.0}", total_cost, budget),
            ));
        }
    }

    if let Some(issues) = bucket.totals.get(&KpiId::StockIssues) {
        let limits = &config.stock;
        let severity = if *issues > limits.issues_critical {
            Some(Severity::Critical)
        } else if *issues > limits.issues_warning {
            Some(Severity::Warning)
        } else {
            None
        };
        if let Some(severity) = severity {
            events.push(event(
                EventKind::StockIssues,
                severity,
                KpiId::StockIssues,
                "Problèmes de stock récurrents".to_string(),
                format!("{:.0} problèmes de stock en semaine {}", issues, bucket.week),
            ));
        }
    }

    events
}

/// Month-to-date spend and the month's budget, the largest cost target seen.
pub fn monthly_cost(entries: &[&MetricEntry]) -> Option<(f64, f64)> {
    let costs: Vec<&&MetricEntry> = entries
        .iter()
        .filter(|entry| entry.kpi == KpiId::FormulationCost)
        .collect();
    if costs.is_empty() {
        return None;
    }
    let total: f64 = costs.iter().map(|entry| entry.value).sum();
    let budget = costs.iter().map(|entry| entry.target).fold(0.0_f64, f64::max);
    Some((total, budget))
}

/// Weekly totals can each stay under budget while the month overruns it.
/// The event lands in the week where running spend first crossed the band.
pub fn monthly_budget_event(
    entries: &[&MetricEntry],
    config: &ThresholdConfig,
) -> Option<DetectedEvent> {
    let (total, budget) = monthly_cost(entries)?;
    let (severity, limit) = if total > budget {
        (Severity::Critical, budget)
    } else if total > budget * config.cost.budget_warning_ratio {
        (Severity::Warning, budget * config.cost.budget_warning_ratio)
    } else {
        return None;
    };

    let mut costs: Vec<&MetricEntry> = entries
        .iter()
        .copied()
        .filter(|entry| entry.kpi == KpiId::FormulationCost)
        .collect();
    costs.sort_by_key(|entry| entry.date);

    let mut running = 0.0;
    let crossing = costs.iter().find(|entry| {
        running += entry.value;
        running > limit
    })?;
    let (iso_year, week) = iso_week_key(crossing.date);

    let title = match severity {
        Severity::Critical => "Dépassement budgétaire mensuel",
        Severity::Warning => "Budget mensuel presque atteint",
    };
    Some(DetectedEvent {
        kind: EventKind::BudgetOverrun,
        severity,
        category: KpiId::FormulationCost.category(),
        kpi: KpiId::FormulationCost,
        title: title.to_string(),
        description: format!(
            "Coût mensuel de {:.0} pour un budget de {:.0}",
            total, budget
        ),
        iso_year,
        week,
    })
}

pub fn classify_week(
    score_averages: &BTreeMap<KpiId, f64>,
    events: &[DetectedEvent],
    config: &ThresholdConfig,
) -> WeekStatus {
    if events.iter().any(|e| e.severity == Severity::Critical) {
        return WeekStatus::Critical;
    }
    if events.iter().any(|e| e.severity == Severity::Warning) {
        return WeekStatus::Warning;
    }
    if !score_averages.is_empty()
        && score_averages
            .values()
            .all(|average| *average >= config.scores.excellent)
    {
        return WeekStatus::Excellent;
    }
    // Weeks under the good band are still reported as good.
    WeekStatus::Good
}

/// Critical before warning, then most recent week first.
pub fn sort_events(events: &mut [DetectedEvent]) {
    events.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| (b.iso_year, b.week).cmp(&(a.iso_year, a.week)))
    });
}

/// Mean entry score per KPI across the month.
pub fn kpi_averages(entries: &[&MetricEntry]) -> BTreeMap<KpiId, f64> {
    let mut scores: BTreeMap<KpiId, Vec<f64>> = BTreeMap::new();
    for entry in entries {
        scores
            .entry(entry.kpi)
            .or_default()
            .push(f64::from(scoring::entry_score(entry)));
    }
    scores
        .into_iter()
        .map(|(kpi, scores)| (kpi, mean(&scores)))
        .collect()
}

pub fn overall_percentage(kpi_averages: &BTreeMap<KpiId, f64>) -> u8 {
    if kpi_averages.is_empty() {
        return 0;
    }
    let averages: Vec<f64> = kpi_averages.values().copied().collect();
    mean(&averages).clamp(0.0, 100.0).round() as u8
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnergyReading, EventCategory};
    use chrono::Utc;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(kpi: KpiId, on: NaiveDate, value: f64, target: f64) -> MetricEntry {
        MetricEntry {
            id: Uuid::new_v4(),
            kpi,
            date: on,
            value,
            target,
            notes: None,
            data: None,
            recorded_at: Utc::now(),
        }
    }

    fn energy_entry(on: NaiveDate, value: f64, electricity_kwh: f64) -> MetricEntry {
        let reading = EnergyReading {
            electricity_kwh,
            electricity_target_kwh: 2000.0,
            water_m3: 30.0,
            water_target_m3: 35.0,
            cost: 9000.0,
            budget: 10_000.0,
        };
        MetricEntry {
            data: Some(serde_json::to_value(reading).unwrap()),
            ..entry(KpiId::EnergyConsumption, on, value, 100.0)
        }
    }

    fn summary(report: MonthlyReport) -> MonthlySummary {
        match report {
            MonthlyReport::Summary(summary) => summary,
            MonthlyReport::NoData { .. } => panic!("expected a summary"),
        }
    }

    #[test]
    fn iso_weeks_follow_thursday_rule() {
        assert_eq!(iso_week_key(date(2024, 3, 4)), (2024, 10));
        assert_eq!(iso_week_key(date(2024, 3, 10)), (2024, 10));
        assert_eq!(iso_week_key(date(2021, 1, 1)), (2020, 53));
        assert_eq!(iso_week_key(date(2024, 12, 30)), (2025, 1));
    }

    #[test]
    fn month_bounds_roll_over_december() {
        assert_eq!(
            month_bounds(2024, 12),
            Some((date(2024, 12, 1), date(2025, 1, 1)))
        );
        assert_eq!(month_bounds(2024, 13), None);
    }

    #[test]
    fn empty_month_reports_no_data() {
        let entries = vec![entry(KpiId::MixingTime, date(2024, 2, 20), 40.0, 50.0)];
        let report = aggregate_month(&entries, 2024, 3, &ThresholdConfig::default());
        assert_eq!(report, MonthlyReport::NoData { year: 2024, month: 3 });
    }

    #[test]
    fn weeks_partition_the_month() {
        let entries = vec![
            entry(KpiId::MixingTime, date(2024, 3, 1), 40.0, 50.0),
            entry(KpiId::MixingTime, date(2024, 3, 4), 45.0, 50.0),
            entry(KpiId::MixingTime, date(2024, 3, 6), 55.0, 50.0),
            entry(KpiId::OrderFulfillment, date(2024, 3, 13), 80.0, 100.0),
            entry(KpiId::MixingTime, date(2024, 3, 31), 50.0, 50.0),
            entry(KpiId::MixingTime, date(2024, 4, 1), 50.0, 50.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));

        let weeks: Vec<u32> = summary.weeks.iter().map(|w| w.week).collect();
        assert_eq!(weeks, vec![9, 10, 11, 13]);
        let counted: usize = summary.weeks.iter().map(|w| w.entry_count()).sum();
        assert_eq!(counted, 5);
        assert_eq!(summary.entry_count, 5);
    }

    #[test]
    fn january_days_in_previous_iso_year_sort_first() {
        let entries = vec![
            entry(KpiId::MixingTime, date(2021, 1, 4), 50.0, 50.0),
            entry(KpiId::MixingTime, date(2021, 1, 1), 50.0, 50.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2021,
            1,
            &ThresholdConfig::default(),
        ));
        let keys: Vec<(i32, u32)> = summary.weeks.iter().map(|w| (w.iso_year, w.week)).collect();
        assert_eq!(keys, vec![(2020, 53), (2021, 1)]);
    }

    #[test]
    fn overall_percentage_is_mean_of_kpi_averages() {
        let entries = vec![
            entry(KpiId::EnergyConsumption, date(2024, 3, 4), 80.0, 100.0),
            // 40% over the 10 minute target scores 60.
            entry(KpiId::MixingTime, date(2024, 3, 5), 14.0, 10.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));
        assert_eq!(summary.kpi_averages[&KpiId::EnergyConsumption], 80.0);
        assert_eq!(summary.kpi_averages[&KpiId::MixingTime], 60.0);
        assert_eq!(summary.overall_percentage, 70);
    }

    #[test]
    fn over_budget_cost_raises_critical_budget_event() {
        let entries = vec![entry(
            KpiId::FormulationCost,
            date(2024, 3, 28),
            160_000.0,
            150_000.0,
        )];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));
        assert_eq!(summary.kpi_averages[&KpiId::FormulationCost], 0.0);
        assert_eq!(summary.events.len(), 1);
        let event = &summary.events[0];
        assert_eq!(event.severity, Severity::Critical);
        assert_eq!(event.category, EventCategory::Budget);
        assert_eq!(event.category.label(), "Gestion Budgétaire");
        assert_eq!(summary.critical_weeks, 1);
    }

    #[test]
    fn spend_near_budget_is_a_warning() {
        let entries = vec![entry(
            KpiId::FormulationCost,
            date(2024, 3, 28),
            140_000.0,
            150_000.0,
        )];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));
        assert_eq!(summary.events[0].severity, Severity::Warning);
        assert_eq!(summary.warning_weeks, 1);
    }

    #[test]
    fn consumption_totals_use_energy_payload() {
        let entries = vec![
            energy_entry(date(2024, 3, 4), 100.0, 1800.0),
            energy_entry(date(2024, 3, 5), 100.0, 1800.0),
            energy_entry(date(2024, 3, 6), 100.0, 1800.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));
        let week = &summary.weeks[0];
        assert_eq!(week.totals[&KpiId::EnergyConsumption], 5400.0);
        assert_eq!(week.events.len(), 1);
        assert_eq!(week.events[0].kind, EventKind::HighConsumption);
        assert_eq!(week.status, WeekStatus::Warning);
    }

    #[test]
    fn configured_limits_replace_defaults() {
        let mut config = ThresholdConfig::default();
        config.energy.consumption_warning_kwh = 6000.0;
        let entries = vec![
            energy_entry(date(2024, 3, 4), 100.0, 1800.0),
            energy_entry(date(2024, 3, 5), 100.0, 1800.0),
            energy_entry(date(2024, 3, 6), 100.0, 1800.0),
        ];
        let summary = summary(aggregate_month(&entries, 2024, 3, &config));
        assert!(summary.events.is_empty());
        assert_eq!(summary.excellent_weeks, 1);
    }

    #[test]
    fn low_scores_map_to_bands() {
        let entries = vec![
            entry(KpiId::OrderFulfillment, date(2024, 3, 4), 65.0, 100.0),
            entry(KpiId::OrderFulfillment, date(2024, 3, 11), 40.0, 100.0),
            entry(KpiId::OrderFulfillment, date(2024, 3, 18), 90.0, 100.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));
        let statuses: Vec<WeekStatus> = summary.weeks.iter().map(|w| w.status).collect();
        assert_eq!(
            statuses,
            vec![WeekStatus::Warning, WeekStatus::Critical, WeekStatus::Excellent]
        );
    }

    #[test]
    fn events_sort_by_severity_then_latest_week() {
        let entries = vec![
            entry(KpiId::MixingTime, date(2024, 3, 4), 66.0, 50.0),
            entry(KpiId::MixingTime, date(2024, 3, 11), 80.0, 50.0),
            entry(KpiId::MixingTime, date(2024, 3, 18), 67.0, 50.0),
            entry(KpiId::MixingTime, date(2024, 3, 25), 90.0, 50.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));
        let order: Vec<(Severity, u32)> = summary
            .events
            .iter()
            .map(|e| (e.severity, e.week))
            .collect();
        assert_eq!(
            order,
            vec![
                (Severity::Critical, 13),
                (Severity::Critical, 11),
                (Severity::Warning, 12),
                (Severity::Warning, 10),
            ]
        );
    }

    #[test]
    fn spend_spread_across_weeks_still_overruns_month_budget() {
        let entries = vec![
            entry(KpiId::FormulationCost, date(2024, 3, 4), 40_000.0, 150_000.0),
            entry(KpiId::FormulationCost, date(2024, 3, 11), 40_000.0, 150_000.0),
            entry(KpiId::FormulationCost, date(2024, 3, 18), 40_000.0, 150_000.0),
            entry(KpiId::FormulationCost, date(2024, 3, 25), 40_000.0, 150_000.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));

        assert_eq!(summary.kpi_averages[&KpiId::FormulationCost], 0.0);
        assert_eq!(summary.overall_percentage, 0);
        assert_eq!(summary.events.len(), 1);
        let event = &summary.events[0];
        assert_eq!(event.kind, EventKind::BudgetOverrun);
        assert_eq!(event.severity, Severity::Critical);
        assert_eq!(event.category.label(), "Gestion Budgétaire");
        // Running spend passes 150 000 with the fourth purchase.
        assert_eq!(event.week, 13);
        assert_eq!(summary.critical_weeks, 1);
        assert_eq!(summary.excellent_weeks, 3);
        assert_eq!(
            summary.recommendations[0].kind,
            crate::models::RecommendationKind::BudgetControl
        );
    }

    #[test]
    fn month_nearing_budget_warns_in_crossing_week() {
        let entries = vec![
            entry(KpiId::FormulationCost, date(2024, 3, 4), 70_000.0, 150_000.0),
            entry(KpiId::FormulationCost, date(2024, 3, 12), 70_000.0, 150_000.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));
        assert_eq!(summary.kpi_averages[&KpiId::FormulationCost], 100.0);
        assert_eq!(summary.events.len(), 1);
        assert_eq!(summary.events[0].severity, Severity::Warning);
        assert_eq!(summary.events[0].week, 11);
        assert_eq!(summary.weeks[1].status, WeekStatus::Warning);
    }

    #[test]
    fn stock_issues_over_five_warn() {
        let entries = vec![
            entry(KpiId::StockIssues, date(2024, 3, 4), 3.0, 3.0),
            entry(KpiId::StockIssues, date(2024, 3, 6), 3.0, 3.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));
        let week = &summary.weeks[0];
        assert_eq!(week.totals[&KpiId::StockIssues], 6.0);
        assert_eq!(week.events.len(), 1);
        assert_eq!(week.events[0].kind, EventKind::StockIssues);
        assert_eq!(week.events[0].severity, Severity::Warning);
        assert_eq!(week.events[0].category, EventCategory::Stock);
        assert_eq!(week.status, WeekStatus::Warning);
    }

    #[test]
    fn stock_issues_over_ten_are_critical() {
        let entries = vec![
            entry(KpiId::StockIssues, date(2024, 3, 4), 4.0, 3.0),
            entry(KpiId::StockIssues, date(2024, 3, 5), 4.0, 3.0),
            entry(KpiId::StockIssues, date(2024, 3, 7), 3.0, 3.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));
        let week = &summary.weeks[0];
        assert_eq!(week.totals[&KpiId::StockIssues], 11.0);
        assert_eq!(week.events.len(), 1);
        assert_eq!(week.events[0].kind, EventKind::StockIssues);
        assert_eq!(week.events[0].severity, Severity::Critical);
        assert_eq!(week.events[0].category, EventCategory::Stock);
        assert_eq!(week.status, WeekStatus::Critical);
    }

    #[test]
    fn consumption_over_eight_thousand_is_critical() {
        let entries = vec![
            energy_entry(date(2024, 3, 4), 100.0, 2800.0),
            energy_entry(date(2024, 3, 5), 100.0, 2800.0),
            energy_entry(date(2024, 3, 6), 100.0, 2800.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));
        let week = &summary.weeks[0];
        assert_eq!(week.totals[&KpiId::EnergyConsumption], 8400.0);
        assert_eq!(week.events.len(), 1);
        assert_eq!(week.events[0].kind, EventKind::HighConsumption);
        assert_eq!(week.events[0].severity, Severity::Critical);
        assert_eq!(week.events[0].category, EventCategory::Energy);
        assert_eq!(week.status, WeekStatus::Critical);
    }

    #[test]
    fn weeks_below_good_band_are_still_good() {
        let mut averages = BTreeMap::new();
        averages.insert(KpiId::OrderFulfillment, 40.0);
        assert_eq!(
            classify_week(&averages, &[], &ThresholdConfig::default()),
            WeekStatus::Good
        );
    }

    #[test]
    fn good_week_when_not_all_kpis_excellent() {
        let entries = vec![
            entry(KpiId::EnergyConsumption, date(2024, 3, 4), 95.0, 100.0),
            entry(KpiId::OrderFulfillment, date(2024, 3, 5), 75.0, 100.0),
        ];
        let summary = summary(aggregate_month(
            &entries,
            2024,
            3,
            &ThresholdConfig::default(),
        ));
        assert_eq!(summary.weeks[0].status, WeekStatus::Good);
    }
}
