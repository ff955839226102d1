use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Datelike, Months, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod aggregate;
mod config;
mod db;
mod logging;
mod models;
mod recommend;
mod report;
mod scoring;

use models::{EnergyReading, KpiId, NewEntry, Page};

#[derive(Parser)]
#[command(name = "kpi-dashboard")]
#[command(about = "Production and warehouse KPI tracker with monthly reports", long_about = None)]
struct Cli {
    /// Threshold configuration file (TOML)
    #[arg(long, global = true, env = "KPI_DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a sample month of entries
    Seed,
    /// Import entries from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record a new KPI entry
    Record {
        #[arg(long)]
        kpi: KpiId,
        /// Measured value; computed from the readings for energy entries
        #[arg(long)]
        value: Option<f64>,
        /// Target, budget or goal
        #[arg(long)]
        target: Option<f64>,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
        #[command(flatten)]
        energy: EnergyArgs,
    },
    /// Show the latest entry for a KPI
    Latest {
        #[arg(long)]
        kpi: KpiId,
    },
    /// List recent entries for a KPI
    History {
        #[arg(long)]
        kpi: KpiId,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Score a value without saving it
    Score {
        #[arg(long)]
        kpi: KpiId,
        #[arg(long)]
        value: f64,
        #[arg(long)]
        target: f64,
    },
    /// Generate a monthly report
    Report {
        /// production or warehouse; all KPIs when omitted
        #[arg(long)]
        page: Option<Page>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        /// Write JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
    /// Show monthly averages for a KPI
    Trends {
        #[arg(long)]
        kpi: KpiId,
        #[arg(long, default_value_t = 6)]
        months: u32,
    },
}

#[derive(Args)]
struct EnergyArgs {
    #[arg(long)]
    electricity_kwh: Option<f64>,
    #[arg(long)]
    electricity_target_kwh: Option<f64>,
    #[arg(long)]
    water_m3: Option<f64>,
    #[arg(long)]
    water_target_m3: Option<f64>,
    #[arg(long)]
    cost: Option<f64>,
    #[arg(long)]
    budget: Option<f64>,
}

impl EnergyArgs {
    fn reading(&self) -> Option<EnergyReading> {
        Some(EnergyReading {
            electricity_kwh: self.electricity_kwh?,
            electricity_target_kwh: self.electricity_target_kwh?,
            water_m3: self.water_m3?,
            water_target_m3: self.water_target_m3?,
            cost: self.cost?,
            budget: self.budget?,
        })
    }
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn build_entry(
    kpi: KpiId,
    value: Option<f64>,
    target: Option<f64>,
    date: NaiveDate,
    notes: Option<String>,
    energy: &EnergyArgs,
) -> anyhow::Result<NewEntry> {
    if kpi == KpiId::EnergyConsumption {
        if let Some(reading) = energy.reading() {
            return Ok(NewEntry {
                kpi,
                date,
                value: f64::from(scoring::energy_score(&reading)),
                target: 100.0,
                notes,
                data: Some(serde_json::to_value(reading)?),
            });
        }
    }

    let Some(value) = value else {
        bail!("--value is required unless all energy readings are given");
    };
    let Some(target) = target else {
        bail!("--target is required for {kpi}");
    };

    Ok(NewEntry {
        kpi,
        date,
        value,
        target,
        notes,
        data: None,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let thresholds = config::load_config(cli.config.as_deref())?;
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            let inserted = db::seed(&pool).await?;
            println!("Seed data inserted ({inserted} entries).");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} entries from {}.", csv.display());
        }
        Commands::Record {
            kpi,
            value,
            target,
            date,
            notes,
            energy,
        } => {
            let entry = build_entry(kpi, value, target, date.unwrap_or(today), notes, &energy)?;
            let pool = connect().await?;
            let id = db::save_entry(&pool, &entry).await?;
            println!(
                "Recorded {} = {} on {} (score {}, id {id}).",
                kpi,
                entry.value,
                entry.date,
                scoring::score(kpi, entry.value, entry.target)
            );
        }
        Commands::Latest { kpi } => {
            let pool = connect().await?;
            match db::fetch_latest(&pool, kpi).await? {
                Some(entry) => println!(
                    "{} on {}: {} {} (target {}, score {})",
                    kpi.label(),
                    entry.date,
                    entry.value,
                    kpi.unit(),
                    entry.target,
                    scoring::entry_score(&entry)
                ),
                None => println!("No entries recorded for {kpi}."),
            }
        }
        Commands::History { kpi, limit } => {
            let pool = connect().await?;
            let entries = db::fetch_history(&pool, kpi, limit).await?;
            if entries.is_empty() {
                println!("No entries recorded for {kpi}.");
                return Ok(());
            }
            println!("Recent {} entries:", kpi.label());
            for entry in &entries {
                println!(
                    "- {}: {} {} (target {}, score {}){}",
                    entry.date,
                    entry.value,
                    kpi.unit(),
                    entry.target,
                    scoring::entry_score(entry),
                    entry
                        .notes
                        .as_deref()
                        .map(|n| format!(" - {n}"))
                        .unwrap_or_default()
                );
            }
        }
        Commands::Score { kpi, value, target } => {
            println!("{}", scoring::score(kpi, value, target));
        }
        Commands::Report {
            page,
            year,
            month,
            out,
            json,
        } => {
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            let (kpis, scope) = match page {
                Some(page) => (page.kpis(), page.label()),
                None => (KpiId::ALL.to_vec(), "all pages"),
            };

            let pool = connect().await?;
            let entries = db::fetch_month(&pool, &kpis, year, month).await?;
            let monthly = aggregate::aggregate_month(&entries, year, month, &thresholds);
            let rendered = if json {
                report::render_json(&monthly)?
            } else {
                report::build_report(scope, today, &monthly)
            };
            std::fs::write(&out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(year, month, entries = entries.len(), "report generated");
            println!("Report written to {}.", out.display());
        }
        Commands::Trends { kpi, months } => {
            let first_of_month = today.with_day(1).unwrap_or(today);
            let since = first_of_month
                .checked_sub_months(Months::new(months.saturating_sub(1)))
                .unwrap_or(first_of_month);
            let pool = connect().await?;
            let trends = db::fetch_monthly_trends(&pool, kpi, since).await?;
            if trends.is_empty() {
                println!("No entries for {kpi} since {since}.");
                return Ok(());
            }
            println!("{} by month ({}):", kpi.label(), kpi.unit());
            for line in report::build_trend_lines(&trends) {
                println!("{line}");
            }
        }
    }

    Ok(())
}
