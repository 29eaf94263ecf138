use clap::ValueEnum;

use crate::models::{ClassifiedCustomer, CustomerRecord, Tier};
use crate::risk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TierFilter {
    All,
    Champions,
    AtRisk,
    Critical,
}

/// Tier filter then search, narrowing sequentially.
pub fn apply(customers: &[ClassifiedCustomer], tier: TierFilter, query: &str) -> Vec<ClassifiedCustomer> {
    search(&filter_by_tier(customers, tier), query)
}

/// Matches against the score-derived tier, not the stored classification
/// override. Both observed filtering paths work off the raw thresholds.
pub fn filter_by_tier(customers: &[ClassifiedCustomer], filter: TierFilter) -> Vec<ClassifiedCustomer> {
    if filter == TierFilter::All {
        return customers.to_vec();
    }
    customers
        .iter()
        .filter(|customer| matches_tier(customer, filter))
        .cloned()
        .collect()
}

fn matches_tier(customer: &ClassifiedCustomer, filter: TierFilter) -> bool {
    let tier = risk::tier_from_score(customer.risk_score_percent);
    matches!(
        (filter, tier),
        (TierFilter::Champions, Tier::Champion)
            | (TierFilter::AtRisk, Tier::AtRisk)
            | (TierFilter::Critical, Tier::Critical)
    )
}

/// Case-insensitive substring search over name, id, and industry. An empty
/// or whitespace-only query returns the input unchanged.
pub fn search(customers: &[ClassifiedCustomer], query: &str) -> Vec<ClassifiedCustomer> {
    let query = query.trim();
    if query.is_empty() {
        return customers.to_vec();
    }

    let needle = query.to_lowercase();
    customers
        .iter()
        .filter(|customer| matches_query(&customer.record, &needle))
        .cloned()
        .collect()
}

fn matches_query(record: &CustomerRecord, needle: &str) -> bool {
    record.customer_id.to_lowercase().contains(needle)
        || record
            .customer_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(needle))
        || record
            .industry
            .as_deref()
            .is_some_and(|industry| industry.to_lowercase().contains(needle))
}
