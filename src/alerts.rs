use chrono::NaiveDate;

use crate::models::{Alert, AlertSeverity, ClassifiedCustomer, Tier};

/// One alert per At-Risk or Critical customer, sorted by risk score
/// descending. The sort is stable, so equal scores keep input order.
pub fn generate_alerts(customers: &[ClassifiedCustomer], today: NaiveDate) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for customer in customers {
        let severity = match customer.status_tier {
            Tier::Critical => AlertSeverity::Critical,
            Tier::AtRisk => AlertSeverity::Warning,
            Tier::Champion => continue,
        };
        alerts.push(build_alert(customer, severity, today));
    }

    alerts.sort_by(|a, b| {
        b.risk_score_percent
            .partial_cmp(&a.risk_score_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    alerts
}

fn build_alert(customer: &ClassifiedCustomer, severity: AlertSeverity, today: NaiveDate) -> Alert {
    let record = &customer.record;
    let percent = customer.risk_score_percent;

    let (suffix, title, subtitle) = match severity {
        AlertSeverity::Critical => (
            "critical",
            "High churn risk detected",
            format!(
                "Risk score: {percent:.1}% | Last login: {}",
                login_age(customer.days_since_login)
            ),
        ),
        AlertSeverity::Warning => (
            "warning",
            "Customer at risk of churning",
            format!(
                "Risk score: {percent:.1}% | Usage: {:.0}%",
                customer.usage_ratio_or_zero() * 100.0
            ),
        ),
    };

    Alert {
        id: format!("{}-{suffix}", record.customer_id),
        company: record.display_name().to_string(),
        severity,
        title: title.to_string(),
        subtitle,
        last_seen: relative_time(record.last_login_date, today),
        risk_score_percent: percent,
    }
}

fn login_age(days_since_login: Option<i64>) -> String {
    match days_since_login {
        None => "never".to_string(),
        Some(days) => format!("{days} days ago"),
    }
}

pub fn relative_time(date: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(date) = date else {
        return "Unknown".to_string();
    };
    match (today - date).num_days().max(0) {
        0 => "Today".to_string(),
        1 => "1 day ago".to_string(),
        days => format!("{days} days ago"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomerRecord;
    use crate::risk;

    fn customer(id: &str, risk_score: f64, classification: Option<&str>) -> ClassifiedCustomer {
        let record = CustomerRecord {
            customer_id: id.to_string(),
            customer_name: Some(format!("{id} Inc")),
            industry: None,
            account_manager: None,
            plan_type: None,
            subscription_status: None,
            subscription_start_date: None,
            subscription_end_date: None,
            monthly_fee: Some(300.0),
            user_count: Some(20),
            monthly_active_users: Some(9),
            feature_usage_score: None,
            retention_rate_6m: None,
            retention_rate_12m: None,
            last_login_date: NaiveDate::from_ymd_opt(2026, 1, 20),
            last_success_touch_date: None,
            churn_risk_score: Some(risk_score),
            status_classification: classification.map(str::to_string),
            prediction: None,
            notes: None,
        };
        risk::classify(record, today())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    #[test]
    fn champions_emit_no_alerts() {
        let customers = vec![
            customer("C1", 0.82, None),
            customer("C2", 0.61, None),
            customer("C3", 0.20, None),
        ];
        let alerts = generate_alerts(&customers, today());
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|alert| !alert.id.starts_with("C3")));
    }

    #[test]
    fn severity_follows_tier() {
        let customers = vec![customer("C1", 0.82, None), customer("C2", 0.61, None)];
        let alerts = generate_alerts(&customers, today());
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].id, "C1-critical");
        assert_eq!(alerts[0].title, "High churn risk detected");
        assert_eq!(alerts[1].severity, AlertSeverity::Warning);
        assert_eq!(alerts[1].id, "C2-warning");
        assert_eq!(alerts[1].title, "Customer at risk of churning");
    }

    #[test]
    fn subtitles_carry_score_and_context() {
        let customers = vec![customer("C1", 0.82, None), customer("C2", 0.61, None)];
        let alerts = generate_alerts(&customers, today());
        assert_eq!(alerts[0].subtitle, "Risk score: 82.0% | Last login: 12 days ago");
        assert_eq!(alerts[1].subtitle, "Risk score: 61.0% | Usage: 45%");
    }

    #[test]
    fn override_tier_generates_alert_despite_low_score() {
        let customers = vec![customer("C1", 0.30, Some("Critical"))];
        let alerts = generate_alerts(&customers, today());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert!((alerts[0].risk_score_percent - 30.0).abs() < 1e-9);
    }

    #[test]
    fn alerts_sort_descending_by_score() {
        let customers = vec![
            customer("C1", 0.61, None),
            customer("C2", 0.90, None),
            customer("C3", 0.75, None),
        ];
        let alerts = generate_alerts(&customers, today());
        let ids: Vec<&str> = alerts.iter().map(|alert| alert.id.as_str()).collect();
        assert_eq!(ids, vec!["C2-critical", "C3-critical", "C1-warning"]);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let customers = vec![
            customer("C1", 0.80, None),
            customer("C2", 0.80, None),
            customer("C3", 0.80, None),
        ];
        let alerts = generate_alerts(&customers, today());
        let ids: Vec<&str> = alerts.iter().map(|alert| alert.id.as_str()).collect();
        assert_eq!(ids, vec!["C1-critical", "C2-critical", "C3-critical"]);
    }

    #[test]
    fn relative_time_labels() {
        assert_eq!(relative_time(None, today()), "Unknown");
        assert_eq!(relative_time(NaiveDate::from_ymd_opt(2026, 2, 1), today()), "Today");
        assert_eq!(relative_time(NaiveDate::from_ymd_opt(2026, 1, 31), today()), "1 day ago");
        assert_eq!(relative_time(NaiveDate::from_ymd_opt(2026, 1, 20), today()), "12 days ago");
    }

    #[test]
    fn never_logged_in_critical_mentions_never() {
        let mut critical = customer("C1", 0.82, None);
        critical.record.last_login_date = None;
        critical.days_since_login = None;
        let alerts = generate_alerts(&[critical], today());
        assert_eq!(alerts[0].subtitle, "Risk score: 82.0% | Last login: never");
        assert_eq!(alerts[0].last_seen, "Unknown");
    }
}
