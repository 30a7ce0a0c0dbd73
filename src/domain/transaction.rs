use chrono::{DateTime, Utc};
use rand::{Rng, distributions::Alphanumeric};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, ApplicantId, Error, TransactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Payment,
    Refund,
    CashAdvance,
    Fee,
    Interest,
}

/// Which way a kind moves the account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceEffect {
    /// Raises the balance (consumes credit).
    Debit,
    /// Lowers the balance (restores credit).
    Credit,
}

impl TransactionKind {
    pub fn effect(self) -> BalanceEffect {
        match self {
            Self::Purchase | Self::CashAdvance | Self::Fee | Self::Interest => {
                BalanceEffect::Debit
            }
            Self::Payment | Self::Refund => BalanceEffect::Credit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Payment => "payment",
            Self::Refund => "refund",
            Self::CashAdvance => "cash_advance",
            Self::Fee => "fee",
            Self::Interest => "interest",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "purchase" => Ok(Self::Purchase),
            "payment" => Ok(Self::Payment),
            "refund" => Ok(Self::Refund),
            "cash_advance" => Ok(Self::CashAdvance),
            "fee" => Ok(Self::Fee),
            "interest" => Ok(Self::Interest),
            other => Err(Error::validation(format!(
                "unknown transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// System-unique transaction reference: `TXN` plus ten random
/// alphanumerics. The store rejects duplicates; callers regenerate on
/// collision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceCode(String);

impl ReferenceCode {
    pub fn generate() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(char::from)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self(format!("TXN{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReferenceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One posted movement against a ledger account. Immutable once written,
/// except for a single status transition to a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub applicant_id: ApplicantId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub merchant_name: String,
    pub merchant_category: String,
    pub description: String,
    pub status: TransactionStatus,
    pub reference: ReferenceCode,
    pub transacted_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Moves a pending transaction to a terminal status, stamping the
    /// settlement time on completion. Terminal transactions never move
    /// again.
    pub fn transition(
        &mut self,
        status: TransactionStatus,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        if self.status.is_terminal() {
            return Err(Error::conflict(format!(
                "transaction {} already settled as {:?}",
                self.reference, self.status
            )));
        }
        if status == TransactionStatus::Pending {
            return Err(Error::validation(
                "transaction status can only move to a terminal state",
            ));
        }
        self.status = status;
        if status == TransactionStatus::Completed {
            self.settled_at = Some(now);
        }
        Ok(())
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.reference,
            self.kind.as_str(),
            self.amount,
            self.merchant_name
        )
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn pending_transaction() -> Transaction {
        Transaction {
            id: TransactionId::new(),
            account_id: AccountId::new(),
            applicant_id: ApplicantId::new(),
            kind: TransactionKind::Purchase,
            amount: dec!(2500),
            merchant_name: "Bazaar Mart".to_string(),
            merchant_category: "Groceries".to_string(),
            description: "weekly shop".to_string(),
            status: TransactionStatus::Pending,
            reference: ReferenceCode::generate(),
            transacted_at: Utc::now(),
            settled_at: None,
        }
    }

    #[test]
    fn kinds_map_to_balance_effects() {
        use TransactionKind::*;
        for kind in [Purchase, CashAdvance, Fee, Interest] {
            assert_eq!(kind.effect(), BalanceEffect::Debit);
        }
        for kind in [Payment, Refund] {
            assert_eq!(kind.effect(), BalanceEffect::Credit);
        }
    }

    #[test]
    fn reference_codes_have_the_expected_shape() {
        let reference = ReferenceCode::generate();
        let code = reference.as_str();
        assert_eq!(code.len(), 13);
        assert!(code.starts_with("TXN"));
        assert!(code[3..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn status_moves_once_to_terminal() {
        let mut txn = pending_transaction();
        txn.transition(TransactionStatus::Completed, Utc::now())
            .unwrap();
        assert!(txn.settled_at.is_some());
        assert!(matches!(
            txn.transition(TransactionStatus::Cancelled, Utc::now()),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn status_cannot_return_to_pending() {
        let mut txn = pending_transaction();
        assert!(matches!(
            txn.transition(TransactionStatus::Pending, Utc::now()),
            Err(Error::Validation(_))
        ));
    }
}
