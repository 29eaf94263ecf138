use std::fmt::Write;

use chrono::NaiveDate;

use crate::alerts;
use crate::display;
use crate::kpi;
use crate::models::{ClassifiedCustomer, Tier};
use crate::predict::ScoringResult;

pub fn build_dashboard_report(customers: &[ClassifiedCustomer], today: NaiveDate) -> String {
    let summary = kpi::summarize(customers);
    let alerts = alerts::generate_alerts(customers, today);
    let rows = display::partner_rows(customers);

    let mut output = String::new();

    let _ = writeln!(output, "# Customer Churn Dashboard");
    let _ = writeln!(
        output,
        "Generated on {} across {} customers",
        today, summary.total_customers
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Portfolio Health");
    let _ = writeln!(
        output,
        "- Champions: {} ({:.1}%)",
        summary.champions,
        summary.tier_share_percent(Tier::Champion)
    );
    let _ = writeln!(
        output,
        "- At-Risk: {} ({:.1}%)",
        summary.at_risk,
        summary.tier_share_percent(Tier::AtRisk)
    );
    let _ = writeln!(
        output,
        "- Critical: {} ({:.1}%)",
        summary.critical,
        summary.tier_share_percent(Tier::Critical)
    );
    let _ = writeln!(
        output,
        "- Monthly revenue: {}",
        display::format_usd(summary.total_revenue)
    );
    let _ = writeln!(
        output,
        "- Revenue at risk: {}",
        display::format_usd(summary.revenue_at_risk)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Active Alerts");

    if alerts.is_empty() {
        let _ = writeln!(output, "No active alerts.");
    } else {
        for alert in alerts.iter().take(10) {
            let _ = writeln!(
                output,
                "- [{}] {}: {} ({})",
                alert.severity.as_str(),
                alert.company,
                alert.title,
                alert.subtitle
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Partners");

    if rows.is_empty() {
        let _ = writeln!(output, "No partners on record.");
    } else {
        for row in rows.iter().take(10) {
            let _ = writeln!(
                output,
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

    output
}

pub fn scoring_rows(customers: &[ClassifiedCustomer]) -> Vec<ScoringResult> {
    customers
        .iter()
        .map(|customer| ScoringResult {
            customer_id: customer.record.customer_id.clone(),
            customer_name: customer.record.display_name().to_string(),
            churn_risk_score: customer.record.risk_score(),
            status_classification: customer.status_tier.to_string(),
            prediction: customer.record.prediction.unwrap_or(false),
        })
        .collect()
}

pub fn write_scores_csv<W: std::io::Write>(
    writer: W,
    results: &[ScoringResult],
) -> anyhow::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "Customer ID",
        "Customer Name",
        "Churn Risk Score",
        "Status",
        "Predicted Churn",
    ])?;

    for result in results {
        let score = format!("{:.2}%", result.churn_risk_score * 100.0);
        csv_writer.write_record([
            result.customer_id.as_str(),
            result.customer_name.as_str(),
            score.as_str(),
            result.status_classification.as_str(),
            if result.prediction { "Yes" } else { "No" },
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
