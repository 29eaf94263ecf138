use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

mod alerts;
mod config;
mod db;
mod display;
mod filter;
mod kpi;
mod models;
mod predict;
mod report;
mod risk;

use config::AppConfig;
use filter::TierFilter;
use models::{ClassifiedCustomer, Tier};
use predict::{PollState, PredictClient, StatusPoller};

#[derive(Parser)]
#[command(name = "churn-insight")]
#[command(about = "Customer churn risk insight and alerting for partner success teams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Show KPI summary, top alerts, and highest-risk partners
    Dashboard,
    /// List partners, optionally filtered by tier and search query
    Partners {
        #[arg(long, value_enum, default_value = "all")]
        tier: TierFilter,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the alert feed
    Alerts {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export scored customers as CSV
    Export {
        #[arg(long, default_value = "churn_scores.csv")]
        out: PathBuf,
    },
    /// Trigger a prediction run and wait for completion
    Predict,
    /// Show the prediction service status
    Status,
    /// Score a CSV of customers via the prediction service
    BatchScore {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::InitDb => {
            let pool = open_pool(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
            pool.close().await;
        }
        Commands::Seed => {
            let pool = open_pool(&config).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
            pool.close().await;
        }
        Commands::Dashboard => {
            let pool = open_pool(&config).await?;
            let customers = load_classified(&pool).await?;
            print_dashboard(&customers);
            pool.close().await;
        }
        Commands::Partners { tier, search, limit } => {
            let pool = open_pool(&config).await?;
            let customers = load_classified(&pool).await?;
            let matched = filter::apply(&customers, tier, &search);

            if matched.is_empty() {
                println!("No partners match.");
            } else {
                println!("Partners ({} of {}):", matched.len().min(limit), matched.len());
                for row in display::partner_rows(&matched).iter().take(limit) {
                    println!(
                        "- {} ({}, {}) risk {:.1}% [{}], last login {}, {} MRR, usage {}",
                        row.name,
                        row.customer_id,
                        row.plan,
                        row.risk_score_percent,
                        row.status_tier,
                        row.last_login,
                        row.mrr,
                        row.usage_percent
                    );
                }
            }
            pool.close().await;
        }
        Commands::Alerts { limit } => {
            let pool = open_pool(&config).await?;
            let customers = load_classified(&pool).await?;
            let alerts = alerts::generate_alerts(&customers, Utc::now().date_naive());

            if alerts.is_empty() {
                println!("No active alerts.");
            } else {
                for alert in alerts.iter().take(limit) {
                    println!(
                        "- [{}] {}: {} ({}), {}",
                        alert.severity.as_str(),
                        alert.company,
                        alert.title,
                        alert.subtitle,
                        alert.last_seen
                    );
                }
            }
            pool.close().await;
        }
        Commands::Report { out } => {
            let pool = open_pool(&config).await?;
            let customers = load_classified(&pool).await?;
            let report = report::build_dashboard_report(&customers, Utc::now().date_naive());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
            pool.close().await;
        }
        Commands::Export { out } => {
            let pool = open_pool(&config).await?;
            let customers = load_classified(&pool).await?;
            let rows = report::scoring_rows(&customers);
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            report::write_scores_csv(file, &rows)?;
            println!("Exported {} customers to {}.", rows.len(), out.display());
            pool.close().await;
        }
        Commands::Predict => {
            let client = PredictClient::new(&config.predict_api_url, config.http_timeout)?;
            if !client.health().await {
                anyhow::bail!(
                    "prediction service is not available at {}; is it running?",
                    config.predict_api_url
                );
            }

            client.trigger().await?;
            println!("Prediction job started; waiting for completion (Ctrl-C to stop).");

            let cancel = predict::CancelToken::new();
            let signal_token = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    signal_token.cancel();
                }
            });

            let mut poller = StatusPoller::new(config.poll_interval, config.poll_max_attempts);
            match poller.run(&client, &cancel).await? {
                PollState::Completed(Some(summary)) => {
                    println!(
                        "Prediction completed: {} customers scored ({} champions, {} at risk, {} critical).",
                        summary.total_customers, summary.champions, summary.at_risk, summary.critical
                    );
                }
                PollState::Completed(None) => println!("Prediction completed."),
                PollState::Failed(error) => anyhow::bail!("prediction run failed: {error}"),
                state => anyhow::bail!("polling stopped in unexpected state {state:?}"),
            }
        }
        Commands::Status => {
            let client = PredictClient::new(&config.predict_api_url, config.http_timeout)?;
            let snapshot = client.status().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::BatchScore { csv, out } => {
            let bytes = std::fs::read(&csv)
                .with_context(|| format!("failed to read {}", csv.display()))?;
            let file_name = csv
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("upload.csv")
                .to_string();

            let client = PredictClient::new(&config.predict_api_url, config.http_timeout)?;
            let results = client.batch_score(&file_name, bytes).await?;

            println!("Scored {} customers:", results.len());
            for result in &results {
                println!(
                    "- {} ({}) {:.2}% {} predicted churn: {}",
                    result.customer_name,
                    result.customer_id,
                    result.churn_risk_score * 100.0,
                    result.status_classification,
                    if result.prediction { "Yes" } else { "No" }
                );
            }

            if let Some(out) = out {
                let file = std::fs::File::create(&out)
                    .with_context(|| format!("failed to create {}", out.display()))?;
                report::write_scores_csv(file, &results)?;
                println!("Results written to {}.", out.display());
            }
        }
    }

    Ok(())
}

async fn open_pool(config: &AppConfig) -> anyhow::Result<PgPool> {
    db::connect(config.require_database_url()?).await
}

async fn load_classified(pool: &PgPool) -> anyhow::Result<Vec<ClassifiedCustomer>> {
    let records = db::fetch_customers(pool).await?;
    Ok(risk::classify_all(&records, Utc::now().date_naive()))
}

fn print_dashboard(customers: &[ClassifiedCustomer]) {
    let today = Utc::now().date_naive();
    let summary = kpi::summarize(customers);
    let alerts = alerts::generate_alerts(customers, today);

    println!("Portfolio health:");
    println!(
        "- Champions: {} ({:.1}%)",
        summary.champions,
        summary.tier_share_percent(Tier::Champion)
    );
    println!(
        "- At-Risk: {} ({:.1}%)",
        summary.at_risk,
        summary.tier_share_percent(Tier::AtRisk)
    );
    println!(
        "- Critical: {} ({:.1}%)",
        summary.critical,
        summary.tier_share_percent(Tier::Critical)
    );
    println!("- Monthly revenue: {}", display::format_usd(summary.total_revenue));
    println!("- Revenue at risk: {}", display::format_usd(summary.revenue_at_risk));

    println!();
    if alerts.is_empty() {
        println!("No active alerts.");
    } else {
        println!("Active alerts:");
        for alert in alerts.iter().take(5) {
            println!(
                "- [{}] {}: {} ({})",
                alert.severity.as_str(),
                alert.company,
                alert.title,
                alert.subtitle
            );
        }
    }

    println!();
    println!("Highest risk partners:");
    for row in display::partner_rows(customers).iter().take(10) {
        println!(
            "- {} ({}, {}) risk {:.1}% [{}], last login {}, usage {}",
            row.name,
            row.customer_id,
            row.plan,
            row.risk_score_percent,
            row.status_tier,
            row.last_login,
            row.usage_percent
        );
    }
}
