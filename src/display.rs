use crate::models::{ClassifiedCustomer, LoginRecency, PartnerRow, RiskLevel, UsageLevel};

pub fn risk_level(risk_score_percent: f64) -> RiskLevel {
    if risk_score_percent >= 75.0 {
        RiskLevel::High
    } else if risk_score_percent >= 50.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn usage_level(usage_ratio: Option<f64>) -> UsageLevel {
    match usage_ratio {
        None => UsageLevel::Unknown,
        Some(ratio) if ratio < 0.4 => UsageLevel::Low,
        Some(ratio) if ratio < 0.7 => UsageLevel::Medium,
        Some(_) => UsageLevel::High,
    }
}

// Never-logged-in counts as stale.
pub fn login_recency(days_since_login: Option<i64>) -> LoginRecency {
    match days_since_login {
        None => LoginRecency::Stale,
        Some(days) if days >= 30 => LoginRecency::Stale,
        Some(days) if days >= 14 => LoginRecency::Moderate,
        Some(_) => LoginRecency::Recent,
    }
}

pub fn last_login_label(days_since_login: Option<i64>) -> String {
    match days_since_login {
        None => "Never".to_string(),
        Some(days) => format!("{days} days"),
    }
}

pub fn usage_percent_label(usage_ratio: Option<f64>) -> String {
    format!("{}%", (usage_ratio.unwrap_or(0.0) * 100.0).round())
}

pub fn format_usd(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if whole < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn partner_rows(customers: &[ClassifiedCustomer]) -> Vec<PartnerRow> {
    customers.iter().map(partner_row).collect()
}

pub fn partner_row(customer: &ClassifiedCustomer) -> PartnerRow {
    let record = &customer.record;
    PartnerRow {
        customer_id: record.customer_id.clone(),
        name: record.display_name().to_string(),
        plan: record.plan().to_string(),
        risk_score_percent: customer.risk_score_percent,
        risk_level: risk_level(customer.risk_score_percent),
        status_tier: customer.status_tier,
        last_login: last_login_label(customer.days_since_login),
        login_recency: login_recency(customer.days_since_login),
        mrr: format_usd(record.fee()),
        usage_ratio: customer.usage_ratio_or_zero(),
        usage_level: usage_level(customer.usage_ratio),
        usage_percent: usage_percent_label(customer.usage_ratio),
    }
}
