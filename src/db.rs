use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::aggregate;
use crate::models::{EnergyReading, KpiId, MetricEntry, MonthlyTrend, NewEntry};
use crate::scoring;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("csv import failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

const ENTRY_COLUMNS: &str =
    "id, kpi, entry_date, value, target, notes, data, recorded_at";

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Persist a draft entry and return its id.
pub async fn save_entry(pool: &PgPool, entry: &NewEntry) -> Result<Uuid> {
    let id = Uuid::new_v4();
    insert_entry(pool, id, entry, &format!("manual-{id}")).await?;
    tracing::info!(kpi = %entry.kpi, date = %entry.date, value = entry.value, "entry saved");
    Ok(id)
}

/// Returns false when the source key was already imported.
async fn insert_entry(pool: &PgPool, id: Uuid, entry: &NewEntry, source_key: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO kpi_dashboard.metric_entries
        (id, kpi, entry_date, value, target, notes, data, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(entry.kpi.as_str())
    .bind(entry.date)
    .bind(entry.value)
    .bind(entry.target)
    .bind(entry.notes.as_deref())
    .bind(entry.data.clone())
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Most recent entries first.
pub async fn fetch_history(pool: &PgPool, kpi: KpiId, limit: i64) -> Result<Vec<MetricEntry>> {
    let query = format!(
        "SELECT {ENTRY_COLUMNS} FROM kpi_dashboard.metric_entries \
         WHERE kpi = $1 \
         ORDER BY entry_date DESC, recorded_at DESC \
         LIMIT $2"
    );
    let rows = sqlx::query(&query)
        .bind(kpi.as_str())
        .bind(limit.max(1))
        .fetch_all(pool)
        .await?;

    rows.iter().map(entry_from_row).collect()
}

pub async fn fetch_latest(pool: &PgPool, kpi: KpiId) -> Result<Option<MetricEntry>> {
    let query = format!(
        "SELECT {ENTRY_COLUMNS} FROM kpi_dashboard.metric_entries \
         WHERE kpi = $1 \
         ORDER BY entry_date DESC, recorded_at DESC \
         LIMIT 1"
    );
    let row = sqlx::query(&query)
        .bind(kpi.as_str())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(entry_from_row).transpose()
}

/// Every entry for the given KPIs dated within the calendar month.
pub async fn fetch_month(
    pool: &PgPool,
    kpis: &[KpiId],
    year: i32,
    month: u32,
) -> Result<Vec<MetricEntry>> {
    let (start, end) = aggregate::month_bounds(year, month)
        .ok_or_else(|| PersistenceError::InvalidRecord(format!("invalid month {year}-{month}")))?;
    let names: Vec<String> = kpis.iter().map(|kpi| kpi.as_str().to_string()).collect();

    let query = format!(
        "SELECT {ENTRY_COLUMNS} FROM kpi_dashboard.metric_entries \
         WHERE kpi = ANY($1) AND entry_date >= $2 AND entry_date < $3 \
         ORDER BY entry_date, recorded_at"
    );
    let rows = sqlx::query(&query)
        .bind(names)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

    let entries: Vec<MetricEntry> = rows.iter().map(entry_from_row).collect::<Result<_>>()?;
    tracing::debug!(count = entries.len(), %start, "fetched month");
    Ok(entries)
}

/// Monthly averages since `since_date`, oldest month first.
pub async fn fetch_monthly_trends(
    pool: &PgPool,
    kpi: KpiId,
    since_date: NaiveDate,
) -> Result<Vec<MonthlyTrend>> {
    let rows = sqlx::query(
        r#"
        SELECT date_trunc('month', entry_date)::date AS month_start,
               COUNT(*) AS entry_count,
               AVG(value) AS avg_value,
               AVG(target) AS avg_target
        FROM kpi_dashboard.metric_entries
        WHERE kpi = $1 AND entry_date >= $2
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(kpi.as_str())
    .bind(since_date)
    .fetch_all(pool)
    .await?;

    let mut trends = Vec::with_capacity(rows.len());
    for row in rows {
        trends.push(MonthlyTrend {
            month_start: row.try_get("month_start")?,
            entry_count: row.try_get("entry_count")?,
            avg_value: row.try_get("avg_value")?,
            avg_target: row.try_get("avg_target")?,
        });
    }
    Ok(trends)
}

fn entry_from_row(row: &PgRow) -> Result<MetricEntry> {
    let kpi: String = row.try_get("kpi")?;
    let kpi = kpi
        .parse::<KpiId>()
        .map_err(|e| PersistenceError::InvalidRecord(e.to_string()))?;

    Ok(MetricEntry {
        id: row.try_get("id")?,
        kpi,
        date: row.try_get("entry_date")?,
        value: row.try_get("value")?,
        target: row.try_get("target")?,
        notes: row.try_get("notes")?,
        data: row.try_get("data")?,
        recorded_at: row.try_get("recorded_at")?,
    })
}

/// Load a month of sample production and warehouse entries.
pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let mut inserted = 0usize;

    for (index, entry) in seed_entries()?.iter().enumerate() {
        let source_key = format!("seed-{:03}", index + 1);
        if insert_entry(pool, Uuid::new_v4(), entry, &source_key).await? {
            inserted += 1;
        }
    }

    tracing::info!(inserted, "seed complete");
    Ok(inserted)
}

fn seed_entries() -> anyhow::Result<Vec<NewEntry>> {
    let day = |d: u32| {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .ok_or_else(|| anyhow::anyhow!("invalid seed date 2024-03-{d}"))
    };
    let simple = |kpi, date, value, target, notes: Option<&str>| NewEntry {
        kpi,
        date,
        value,
        target,
        notes: notes.map(str::to_string),
        data: None,
    };

    let mut entries = Vec::new();

    let readings = [
        (4, 1450.0, 30.0, 9200.0),
        (11, 1900.0, 38.0, 10400.0),
        (18, 2100.0, 41.0, 10900.0),
        (25, 1600.0, 33.0, 9800.0),
    ];
    for (d, electricity_kwh, water_m3, cost) in readings {
        let reading = EnergyReading {
            electricity_kwh,
            electricity_target_kwh: 1800.0,
            water_m3,
            water_target_m3: 35.0,
            cost,
            budget: 10000.0,
        };
        entries.push(NewEntry {
            kpi: KpiId::EnergyConsumption,
            date: day(d)?,
            value: f64::from(scoring::energy_score(&reading)),
            target: 100.0,
            notes: None,
            data: Some(serde_json::to_value(reading)?),
        });
    }

    let mixing = [(5, 44.0), (12, 58.0), (19, 71.0), (26, 49.0)];
    for (d, minutes) in mixing {
        let notes = (minutes > 60.0).then_some("mixer 2 under maintenance");
        entries.push(simple(KpiId::MixingTime, day(d)?, minutes, 50.0, notes));
    }

    entries.push(simple(
        KpiId::FormulationCost,
        day(29)?,
        160_000.0,
        150_000.0,
        Some("resin price increase"),
    ));

    let issues = [(6, 2.0), (13, 4.0), (14, 3.0), (20, 1.0)];
    for (d, count) in issues {
        entries.push(simple(KpiId::StockIssues, day(d)?, count, 3.0, None));
    }

    let shipped = [(7, 118.0), (14, 96.0), (21, 131.0), (28, 124.0)];
    for (d, orders) in shipped {
        entries.push(simple(KpiId::OrderFulfillment, day(d)?, orders, 120.0, None));
    }

    Ok(entries)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        kpi: String,
        entry_date: NaiveDate,
        value: f64,
        target: f64,
        notes: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let kpi = row.kpi.parse::<KpiId>().map_err(|e| {
            PersistenceError::InvalidRecord(format!("row {}: {e}", line + 1))
        })?;
        let entry = NewEntry {
            kpi,
            date: row.entry_date,
            value: row.value,
            target: row.target,
            notes: row.notes.filter(|n| !n.trim().is_empty()),
            data: None,
        };
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_entry(pool, Uuid::new_v4(), &entry, &source_key).await? {
            inserted += 1;
        } else {
            tracing::debug!(%source_key, "skipping already imported row");
        }
    }

    Ok(inserted)
}
