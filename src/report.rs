use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{
    MetricEntry, MonthlyReport, MonthlySummary, MonthlyTrend, Priority, Severity, WeekStatus,
};

fn status_label(status: WeekStatus) -> &'static str {
    match status {
        WeekStatus::Excellent => "excellent",
        WeekStatus::Good => "good",
        WeekStatus::Warning => "warning",
        WeekStatus::Critical => "critical",
    }
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

pub fn build_report(scope: &str, generated_on: NaiveDate, report: &MonthlyReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# KPI Monthly Report");

    let summary = match report {
        MonthlyReport::NoData { year, month } => {
            let _ = writeln!(
                output,
                "Generated for {} ({:04}-{:02}) on {}",
                scope, year, month, generated_on
            );
            let _ = writeln!(output);
            let _ = writeln!(output, "No data recorded for this month.");
            return output;
        }
        MonthlyReport::Summary(summary) => summary,
    };

    let _ = writeln!(
        output,
        "Generated for {} ({:04}-{:02}) on {}",
        scope, summary.year, summary.month, generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(
        output,
        "- Overall performance: {}% across {} entries",
        summary.overall_percentage, summary.entry_count
    );
    let _ = writeln!(
        output,
        "- Weeks: {} excellent, {} warning, {} critical (of {})",
        summary.excellent_weeks,
        summary.warning_weeks,
        summary.critical_weeks,
        summary.weeks.len()
    );
    for (kpi, average) in &summary.kpi_averages {
        let _ = writeln!(output, "- {}: {:.1}%", kpi.label(), average);
    }

    write_weeks(&mut output, summary);
    write_events(&mut output, summary);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");
    if summary.recommendations.is_empty() {
        let _ = writeln!(output, "No recommendations for this month.");
    } else {
        for recommendation in &summary.recommendations {
            let _ = writeln!(
                output,
                "- [{}] {}: {} ({})",
                priority_label(recommendation.priority),
                recommendation.title,
                recommendation.description,
                recommendation.impact
            );
        }
    }

    let mut noted: Vec<&MetricEntry> = summary
        .weeks
        .iter()
        .flat_map(|week| week.entries.iter())
        .filter(|entry| entry.notes.as_deref().is_some_and(|n| !n.trim().is_empty()))
        .collect();
    noted.sort_by(|a, b| b.date.cmp(&a.date));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Notes");

    if noted.is_empty() {
        let _ = writeln!(output, "No notes recorded for this month.");
    } else {
        for entry in noted.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} on {}: {}",
                entry.kpi.label(),
                entry.date,
                entry.notes.as_deref().unwrap_or_default()
            );
        }
    }

    output
}

fn write_weeks(output: &mut String, summary: &MonthlySummary) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Breakdown");
    for week in &summary.weeks {
        let averages: Vec<String> = week
            .score_averages
            .iter()
            .map(|(kpi, average)| format!("{} {:.0}%", kpi.as_str(), average))
            .collect();
        let _ = writeln!(
            output,
            "- Week {} ({}): {} entries, {} [{}]",
            week.week,
            week.iso_year,
            week.entry_count(),
            status_label(week.status),
            averages.join(", ")
        );
    }
}

fn write_events(output: &mut String, summary: &MonthlySummary) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## Alerts");
    if summary.events.is_empty() {
        let _ = writeln!(output, "No alerts raised this month.");
        return;
    }
    for event in &summary.events {
        let marker = match event.severity {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
        };
        let _ = writeln!(
            output,
            "- {} week {} [{}] {}: {}",
            marker,
            event.week,
            event.category.label(),
            event.title,
            event.description
        );
    }
}

pub fn render_json(report: &MonthlyReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

pub fn build_trend_lines(trends: &[MonthlyTrend]) -> Vec<String> {
    trends
        .iter()
        .map(|trend| {
            format!(
                "- {}: {} entries, avg {:.2} (target {:.2})",
                trend.month_start.format("%Y-%m"),
                trend.entry_count,
                trend.avg_value,
                trend.avg_target
            )
        })
        .collect()
}
