use anyhow::Context;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::models::CustomerRecord;

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(pool)
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

struct SeedCustomer {
    customer_id: &'static str,
    customer_name: &'static str,
    industry: Option<&'static str>,
    account_manager: &'static str,
    plan_type: &'static str,
    monthly_fee: f64,
    user_count: Option<i32>,
    monthly_active_users: Option<i32>,
    last_login_date: Option<NaiveDate>,
    churn_risk_score: Option<f64>,
    status_classification: Option<&'static str>,
    prediction: Option<bool>,
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let customers = vec![
        SeedCustomer {
            customer_id: "CUST-001",
            customer_name: "Acme Robotics",
            industry: Some("Manufacturing"),
            account_manager: "Dana Cole",
            plan_type: "Pro",
            monthly_fee: 1250.0,
            user_count: Some(40),
            monthly_active_users: Some(12),
            last_login_date: NaiveDate::from_ymd_opt(2025, 12, 18),
            churn_risk_score: Some(0.82),
            status_classification: None,
            prediction: Some(true),
        },
        SeedCustomer {
            customer_id: "CUST-002",
            customer_name: "Beacon Health",
            industry: Some("Healthcare"),
            account_manager: "Priya Shah",
            plan_type: "Enterprise",
            monthly_fee: 4800.0,
            user_count: Some(220),
            monthly_active_users: Some(130),
            last_login_date: NaiveDate::from_ymd_opt(2026, 1, 28),
            churn_risk_score: Some(0.61),
            status_classification: None,
            prediction: Some(true),
        },
        SeedCustomer {
            customer_id: "CUST-003",
            customer_name: "Corvid Labs",
            industry: Some("Research"),
            account_manager: "Dana Cole",
            plan_type: "Basic",
            monthly_fee: 320.0,
            user_count: Some(15),
            monthly_active_users: Some(13),
            last_login_date: NaiveDate::from_ymd_opt(2026, 2, 1),
            churn_risk_score: Some(0.12),
            status_classification: Some("Champion"),
            prediction: Some(false),
        },
        // Low score but a support-desk escalation forced the tier.
        SeedCustomer {
            customer_id: "CUST-004",
            customer_name: "Drift Logistics",
            industry: None,
            account_manager: "Priya Shah",
            plan_type: "Pro",
            monthly_fee: 980.0,
            user_count: Some(60),
            monthly_active_users: Some(18),
            last_login_date: NaiveDate::from_ymd_opt(2026, 1, 15),
            churn_risk_score: Some(0.30),
            status_classification: Some("Critical"),
            prediction: Some(false),
        },
        SeedCustomer {
            customer_id: "CUST-005",
            customer_name: "Ember Analytics",
            industry: Some("Software"),
            account_manager: "Dana Cole",
            plan_type: "Trial",
            monthly_fee: 0.0,
            user_count: Some(5),
            monthly_active_users: None,
            last_login_date: None,
            churn_risk_score: Some(0.77),
            status_classification: None,
            prediction: Some(true),
        },
        SeedCustomer {
            customer_id: "CUST-006",
            customer_name: "Foray Media",
            industry: Some("Media"),
            account_manager: "Priya Shah",
            plan_type: "Basic",
            monthly_fee: 450.0,
            user_count: Some(0),
            monthly_active_users: Some(0),
            last_login_date: NaiveDate::from_ymd_opt(2026, 1, 30),
            churn_risk_score: None,
            status_classification: None,
            prediction: None,
        },
    ];

    for customer in customers {
        sqlx::query(
            r#"
            INSERT INTO churn_insight.customers
            (customer_id, customer_name, industry, account_manager, plan_type,
             monthly_fee, user_count, monthly_active_users, last_login_date,
             churn_risk_score, status_classification, prediction)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (customer_id) DO UPDATE
            SET customer_name = EXCLUDED.customer_name,
                churn_risk_score = EXCLUDED.churn_risk_score,
                status_classification = EXCLUDED.status_classification,
                prediction = EXCLUDED.prediction
            "#,
        )
        .bind(customer.customer_id)
        .bind(customer.customer_name)
        .bind(customer.industry)
        .bind(customer.account_manager)
        .bind(customer.plan_type)
        .bind(customer.monthly_fee)
        .bind(customer.user_count)
        .bind(customer.monthly_active_users)
        .bind(customer.last_login_date)
        .bind(customer.churn_risk_score)
        .bind(customer.status_classification)
        .bind(customer.prediction)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_customers(pool: &PgPool) -> anyhow::Result<Vec<CustomerRecord>> {
    let rows = sqlx::query(
        "SELECT customer_id, customer_name, industry, account_manager, plan_type, \
         subscription_status, subscription_start_date, subscription_end_date, \
         monthly_fee, user_count, monthly_active_users, feature_usage_score, \
         retention_rate_6m, retention_rate_12m, last_login_date, \
         last_success_touch_date, churn_risk_score, status_classification, \
         prediction, notes \
         FROM churn_insight.customers \
         ORDER BY churn_risk_score DESC NULLS LAST",
    )
    .fetch_all(pool)
    .await
    .context("failed to load customers")?;

    let mut customers = Vec::new();
    for row in rows {
        customers.push(CustomerRecord {
            customer_id: row.get("customer_id"),
            customer_name: row.get("customer_name"),
            industry: row.get("industry"),
            account_manager: row.get("account_manager"),
            plan_type: row.get("plan_type"),
            subscription_status: row.get("subscription_status"),
            subscription_start_date: row.get("subscription_start_date"),
            subscription_end_date: row.get("subscription_end_date"),
            monthly_fee: row.get("monthly_fee"),
            user_count: row.get("user_count"),
            monthly_active_users: row.get("monthly_active_users"),
            feature_usage_score: row.get("feature_usage_score"),
            retention_rate_6m: row.get("retention_rate_6m"),
            retention_rate_12m: row.get("retention_rate_12m"),
            last_login_date: row.get("last_login_date"),
            last_success_touch_date: row.get("last_success_touch_date"),
            churn_risk_score: row.get("churn_risk_score"),
            status_classification: row.get("status_classification"),
            prediction: row.get("prediction"),
            notes: row.get("notes"),
        });
    }

    tracing::debug!(count = customers.len(), "loaded customer snapshot");
    Ok(customers)
}
