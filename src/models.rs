use std::fmt;

use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub industry: Option<String>,
    pub account_manager: Option<String>,
    pub plan_type: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_start_date: Option<NaiveDate>,
    pub subscription_end_date: Option<NaiveDate>,
    pub monthly_fee: Option<f64>,
    pub user_count: Option<i32>,
    pub monthly_active_users: Option<i32>,
    pub feature_usage_score: Option<f64>,
    pub retention_rate_6m: Option<f64>,
    pub retention_rate_12m: Option<f64>,
    pub last_login_date: Option<NaiveDate>,
    pub last_success_touch_date: Option<NaiveDate>,
    pub churn_risk_score: Option<f64>,
    pub status_classification: Option<String>,
    pub prediction: Option<bool>,
    pub notes: Option<String>,
}

impl CustomerRecord {
    pub fn display_name(&self) -> &str {
        self.customer_name.as_deref().unwrap_or("Unknown")
    }

    pub fn plan(&self) -> &str {
        self.plan_type.as_deref().unwrap_or("N/A")
    }

    pub fn fee(&self) -> f64 {
        self.monthly_fee.unwrap_or(0.0)
    }

    pub fn risk_score(&self) -> f64 {
        self.churn_risk_score.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Champion,
    AtRisk,
    Critical,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Champion => "Champion",
            Tier::AtRisk => "At-Risk",
            Tier::Critical => "Critical",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedCustomer {
    pub record: CustomerRecord,
    pub risk_score_percent: f64,
    pub status_tier: Tier,
    /// None means the customer never logged in.
    pub days_since_login: Option<i64>,
    /// None means the ratio is undefined (missing or zero license count).
    pub usage_ratio: Option<f64>,
}

impl ClassifiedCustomer {
    pub fn usage_ratio_or_zero(&self) -> f64 {
        self.usage_ratio.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Warning => "Warning",
            AlertSeverity::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: String,
    pub company: String,
    pub severity: AlertSeverity,
    pub title: String,
    pub subtitle: String,
    pub last_seen: String,
    pub risk_score_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiSummary {
    pub total_customers: usize,
    pub champions: usize,
    pub at_risk: usize,
    pub critical: usize,
    pub total_revenue: f64,
    pub revenue_at_risk: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Unknown,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRecency {
    Recent,
    Moderate,
    Stale,
}

#[derive(Debug, Clone)]
pub struct PartnerRow {
    pub customer_id: String,
    pub name: String,
    pub plan: String,
    pub risk_score_percent: f64,
    pub risk_level: RiskLevel,
    pub status_tier: Tier,
    pub last_login: String,
    pub login_recency: LoginRecency,
    pub mrr: String,
    pub usage_ratio: f64,
    pub usage_level: UsageLevel,
    pub usage_percent: String,
}
