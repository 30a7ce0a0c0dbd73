use rust_decimal::Decimal;
use tracing::warn;

use crate::config::CoreConfig;
use crate::context::Context;
use crate::domain::{
    AccountId, Error, Principal,
    traits::{AuditSink, NotificationSink, SpendingSnapshot, Store},
};

#[derive(Debug, Clone)]
pub struct InsightReport {
    pub utilization_pct: Decimal,
    pub insights: Vec<String>,
    /// True when the deterministic rules produced the lines because the
    /// external generator was absent or failed.
    pub fallback_used: bool,
}

/// Spending insights for one card. Prefers the external text generator
/// when one is configured; any failure degrades to the rule-based summary
/// instead of surfacing an error.
pub fn spending_insights<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
    account_id: AccountId,
) -> Result<InsightReport, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let applicant_id = principal.as_customer()?;
    let account = ctx.store.account(account_id)?.doc;
    if account.applicant_id != applicant_id {
        return Err(Error::authorization(
            "card does not belong to the acting customer",
        ));
    }

    let snapshot = SpendingSnapshot {
        credit_limit: account.credit_limit,
        current_balance: account.current_balance,
        available_credit: account.available_credit,
        by_category: ctx.store.spending_summary(applicant_id),
    };
    let utilization_pct = utilization(&snapshot);

    if let Some(generator) = &ctx.insights {
        match generator.generate(&snapshot) {
            Ok(insights) => {
                return Ok(InsightReport {
                    utilization_pct,
                    insights,
                    fallback_used: false,
                });
            }
            Err(error) => {
                warn!(%error, "insight generator failed, using fallback");
            }
        }
    }

    Ok(InsightReport {
        utilization_pct,
        insights: fallback_insights(&ctx.config, &snapshot),
        fallback_used: true,
    })
}

/// Deterministic utilization-band summary used whenever the external
/// generator is unavailable.
pub fn fallback_insights(config: &CoreConfig, snapshot: &SpendingSnapshot) -> Vec<String> {
    let utilization = utilization(snapshot);
    let mut insights = Vec::new();

    if utilization > Decimal::from(80) {
        insights.push(
            "High credit utilization detected. Consider paying down your balance to improve \
             your credit score."
                .to_string(),
        );
    } else if utilization > Decimal::from(50) {
        insights.push(
            "Moderate credit utilization. Consider reducing your balance for optimal credit \
             health."
                .to_string(),
        );
    } else {
        insights.push("Excellent credit utilization. Keep up the good work.".to_string());
    }

    if snapshot.available_credit < config.low_available_credit_floor {
        insights.push(
            "Low available credit. Monitor your spending to avoid over-limit fees.".to_string(),
        );
    }
    if snapshot.credit_limit <= config.upgrade_limit_threshold {
        insights.push(
            "Consider upgrading to a premium card with better rewards and benefits."
                .to_string(),
        );
    }

    insights.push(
        "Regular monitoring of your spending patterns can help optimize your financial health."
            .to_string(),
    );
    insights.push(
        "Set up automatic payments to avoid late fees and maintain good credit history."
            .to_string(),
    );
    insights
}

fn utilization(snapshot: &SpendingSnapshot) -> Decimal {
    if snapshot.credit_limit.is_zero() {
        return Decimal::ZERO;
    }
    snapshot.current_balance / snapshot.credit_limit * Decimal::from(100)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn snapshot(limit: Decimal, balance: Decimal) -> SpendingSnapshot {
        SpendingSnapshot {
            credit_limit: limit,
            current_balance: balance,
            available_credit: limit - balance,
            by_category: Vec::new(),
        }
    }

    #[test]
    fn high_utilization_warns() {
        let config = CoreConfig::default();
        let insights = fallback_insights(&config, &snapshot(dec!(100000), dec!(90000)));
        assert!(insights[0].starts_with("High credit utilization"));
        // 10,000 available sits exactly on the floor, not under it.
        assert!(!insights.iter().any(|i| i.starts_with("Low available credit")));
    }

    #[test]
    fn moderate_utilization_nudges() {
        let config = CoreConfig::default();
        let insights = fallback_insights(&config, &snapshot(dec!(100000), dec!(60000)));
        assert!(insights[0].starts_with("Moderate credit utilization"));
    }

    #[test]
    fn low_utilization_praises() {
        let config = CoreConfig::default();
        let insights = fallback_insights(&config, &snapshot(dec!(200000), dec!(10000)));
        assert!(insights[0].starts_with("Excellent credit utilization"));
        // A 200k limit is above the upgrade nudge threshold.
        assert!(!insights.iter().any(|i| i.starts_with("Consider upgrading")));
    }

    #[test]
    fn low_available_credit_adds_a_warning() {
        let config = CoreConfig::default();
        let insights = fallback_insights(&config, &snapshot(dec!(50000), dec!(45000)));
        assert!(insights.iter().any(|i| i.starts_with("Low available credit")));
        assert!(insights.iter().any(|i| i.starts_with("Consider upgrading")));
    }
}
