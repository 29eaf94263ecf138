use chrono::NaiveDate;

use crate::models::{ClassifiedCustomer, CustomerRecord, Tier};

pub fn classify_all(records: &[CustomerRecord], today: NaiveDate) -> Vec<ClassifiedCustomer> {
    records
        .iter()
        .cloned()
        .map(|record| classify(record, today))
        .collect()
}

pub fn classify(record: CustomerRecord, today: NaiveDate) -> ClassifiedCustomer {
    // Scores arrive in [0, 1]; out-of-range input passes through unclamped.
    let risk_score_percent = record.risk_score() * 100.0;
    let status_tier = resolve_tier(&record, risk_score_percent);
    let days_since_login = days_since_login(record.last_login_date, today);
    let usage_ratio = usage_ratio(record.monthly_active_users, record.user_count);

    ClassifiedCustomer {
        record,
        risk_score_percent,
        status_tier,
        days_since_login,
        usage_ratio,
    }
}

fn resolve_tier(record: &CustomerRecord, risk_score_percent: f64) -> Tier {
    if let Some(label) = record.status_classification.as_deref() {
        if !label.trim().is_empty() {
            match parse_tier_label(label) {
                Some(tier) => return tier,
                None => tracing::warn!(
                    customer_id = %record.customer_id,
                    label,
                    "unrecognized status classification, falling back to score"
                ),
            }
        }
    }
    tier_from_score(risk_score_percent)
}

// 50 and 75 belong to the upper tier.
pub fn tier_from_score(risk_score_percent: f64) -> Tier {
    if risk_score_percent >= 75.0 {
        Tier::Critical
    } else if risk_score_percent >= 50.0 {
        Tier::AtRisk
    } else {
        Tier::Champion
    }
}

pub fn parse_tier_label(label: &str) -> Option<Tier> {
    match label.trim() {
        "Champion" => Some(Tier::Champion),
        "At-Risk" => Some(Tier::AtRisk),
        "Critical" => Some(Tier::Critical),
        _ => None,
    }
}

pub fn days_since_login(last_login: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    last_login.map(|date| (today - date).num_days().max(0))
}

pub fn usage_ratio(active_users: Option<i32>, user_count: Option<i32>) -> Option<f64> {
    match (active_users, user_count) {
        (Some(active), Some(licensed)) if licensed > 0 => Some(active as f64 / licensed as f64),
        _ => None,
    }
}
