use crate::models::{ClassifiedCustomer, KpiSummary, Tier};
use crate::risk;

/// Single pass over the classified snapshot. Tier counts and revenue at risk
/// use the score-derived tier, matching the observed dashboard behavior even
/// when a stored classification overrides the score elsewhere.
pub fn summarize(customers: &[ClassifiedCustomer]) -> KpiSummary {
    let mut summary = KpiSummary {
        total_customers: customers.len(),
        ..KpiSummary::default()
    };

    for customer in customers {
        match risk::tier_from_score(customer.risk_score_percent) {
            Tier::Champion => summary.champions += 1,
            Tier::AtRisk => summary.at_risk += 1,
            Tier::Critical => summary.critical += 1,
        }

        let fee = customer.record.fee();
        summary.total_revenue += fee;
        if customer.risk_score_percent >= 50.0 {
            summary.revenue_at_risk += fee;
        }
    }

    summary
}

impl KpiSummary {
    pub fn tier_share_percent(&self, tier: Tier) -> f64 {
        if self.total_customers == 0 {
            return 0.0;
        }
        let count = match tier {
            Tier::Champion => self.champions,
            Tier::AtRisk => self.at_risk,
            Tier::Critical => self.critical,
        };
        count as f64 * 100.0 / self.total_customers as f64
    }
}
