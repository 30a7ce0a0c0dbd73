use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Policy knobs for the issuance core. Everything here is a business-rule
/// default, not a technical constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default = "default_min_credit_limit")]
    pub min_credit_limit: Decimal,
    #[serde(default = "default_max_credit_limit")]
    pub max_credit_limit: Decimal,
    #[serde(default = "default_max_transaction_amount")]
    pub max_transaction_amount: Decimal,
    /// A rejection must carry an actionable reason; terse one-worders are
    /// refused. Policy choice, tune as needed.
    #[serde(default = "default_min_rejection_reason_chars")]
    pub min_rejection_reason_chars: usize,
    /// When set, freshly approved accounts are seeded with a handful of
    /// demonstration transactions through the regular posting path.
    #[serde(default)]
    pub demo_seed_transactions: bool,
    #[serde(default = "default_low_available_credit_floor")]
    pub low_available_credit_floor: Decimal,
    #[serde(default = "default_upgrade_limit_threshold")]
    pub upgrade_limit_threshold: Decimal,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            min_credit_limit: default_min_credit_limit(),
            max_credit_limit: default_max_credit_limit(),
            max_transaction_amount: default_max_transaction_amount(),
            min_rejection_reason_chars: default_min_rejection_reason_chars(),
            demo_seed_transactions: false,
            low_available_credit_floor: default_low_available_credit_floor(),
            upgrade_limit_threshold: default_upgrade_limit_threshold(),
        }
    }
}

fn default_min_credit_limit() -> Decimal {
    Decimal::from(10_000)
}

fn default_max_credit_limit() -> Decimal {
    Decimal::from(1_000_000)
}

fn default_max_transaction_amount() -> Decimal {
    Decimal::from(100_000)
}

fn default_min_rejection_reason_chars() -> usize {
    10
}

fn default_low_available_credit_floor() -> Decimal {
    Decimal::from(10_000)
}

fn default_upgrade_limit_threshold() -> Decimal {
    Decimal::from(100_000)
}
