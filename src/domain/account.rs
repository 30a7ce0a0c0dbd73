use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, ApplicantId, Error};

/// 16-digit card number. Displays masked; the raw digits stay available for
/// storage and equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardNumber(String);

impl CardNumber {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let digits: String = (0..16).map(|_| rng.gen_range(0..=9).to_string()).collect();
        Self(digits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        format!("{} **** **** {}", &self.0[..4], &self.0[12..])
    }
}

impl std::fmt::Display for CardNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Validated 4-digit PIN. Only ever stored as a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        if raw.len() != 4 || !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::validation("PIN must be exactly 4 digits"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn generate_cvv() -> String {
    let mut rng = rand::thread_rng();
    (0..3).map(|_| rng.gen_range(0..=9).to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: CardNumber,
    pub holder_name: String,
    pub bank_name: String,
    pub card_type: String,
    /// MM/YY, five years out from issuance.
    pub expiry: String,
    pub cvv_digest: String,
}

impl CardDetails {
    pub fn issue(
        holder_name: String,
        bank_name: String,
        card_type: String,
        cvv_digest: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            number: CardNumber::generate(),
            holder_name,
            bank_name,
            card_type,
            expiry: (now + Duration::days(365 * 5)).format("%m/%y").to_string(),
            cvv_digest,
        }
    }
}

/// One issued card's balance state.
///
/// `available_credit == credit_limit - current_balance` is re-established
/// after every mutation, and the balance can neither go negative nor pass
/// the credit limit. The limit guard lives here as well as in the poster so
/// no future direct caller can push an account over its limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub id: AccountId,
    pub applicant_id: ApplicantId,
    pub card: CardDetails,
    pub credit_limit: Decimal,
    pub current_balance: Decimal,
    pub available_credit: Decimal,
    pub pin_digest: Option<String>,
    pub is_active: bool,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerAccount {
    pub fn issue(
        applicant_id: ApplicantId,
        card: CardDetails,
        credit_limit: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        if credit_limit <= Decimal::ZERO {
            return Err(Error::validation("credit limit must be positive"));
        }
        Ok(Self {
            id: AccountId::new(),
            applicant_id,
            card,
            credit_limit,
            current_balance: Decimal::ZERO,
            available_credit: credit_limit,
            pin_digest: None,
            is_active: true,
            opened_at: now,
            updated_at: now,
        })
    }

    /// Purchase / fee / interest / cash-advance path: raises the balance.
    pub fn debit(&mut self, amount: Decimal, now: DateTime<Utc>) -> Result<(), Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::validation("debit amount must be positive"));
        }
        if self.current_balance + amount > self.credit_limit {
            return Err(Error::validation(
                "transaction would exceed credit limit",
            ));
        }
        self.current_balance += amount;
        self.sync_available(now);
        Ok(())
    }

    /// Payment / refund path: lowers the balance, floored at zero. An
    /// overpayment caps out rather than producing a credit balance.
    pub fn credit(&mut self, amount: Decimal, now: DateTime<Utc>) -> Result<(), Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::validation("credit amount must be positive"));
        }
        self.current_balance = (self.current_balance - amount).max(Decimal::ZERO);
        self.sync_available(now);
        Ok(())
    }

    pub fn set_pin_digest(&mut self, digest: String, now: DateTime<Utc>) {
        self.pin_digest = Some(digest);
        self.updated_at = now;
    }

    /// Idempotent soft delete. Already-written transactions are unaffected.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        if self.is_active {
            self.is_active = false;
            self.updated_at = now;
        }
    }

    fn sync_available(&mut self, now: DateTime<Utc>) {
        self.available_credit = self.credit_limit - self.current_balance;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn account(limit: Decimal) -> LedgerAccount {
        let now = Utc::now();
        let card = CardDetails::issue(
            "Asha Rao".to_string(),
            "HDFC Bank".to_string(),
            "Rewards".to_string(),
            "digest".to_string(),
            now,
        );
        LedgerAccount::issue(ApplicantId::new(), card, limit, now).unwrap()
    }

    #[test]
    fn fresh_account_has_full_availability() {
        let account = account(dec!(100000));
        assert_eq!(account.current_balance, Decimal::ZERO);
        assert_eq!(account.available_credit, dec!(100000));
    }

    #[test]
    fn debit_and_credit_preserve_the_invariant() {
        let mut account = account(dec!(100000));

        account.debit(dec!(5000), Utc::now()).unwrap();
        assert_eq!(account.current_balance, dec!(5000));
        assert_eq!(account.available_credit, dec!(95000));

        account.credit(dec!(5000), Utc::now()).unwrap();
        assert_eq!(account.current_balance, Decimal::ZERO);
        assert_eq!(account.available_credit, dec!(100000));
    }

    #[test]
    fn overpayment_floors_at_zero() {
        let mut account = account(dec!(50000));
        account.debit(dec!(2000), Utc::now()).unwrap();
        account.credit(dec!(9999), Utc::now()).unwrap();

        assert_eq!(account.current_balance, Decimal::ZERO);
        assert_eq!(account.available_credit, dec!(50000));
    }

    #[test]
    fn debit_rejects_non_positive_amounts() {
        let mut account = account(dec!(50000));
        assert!(matches!(
            account.debit(Decimal::ZERO, Utc::now()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            account.debit(dec!(-10), Utc::now()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn debit_enforces_the_limit_at_the_account_layer() {
        let mut account = account(dec!(10000));
        account.debit(dec!(9000), Utc::now()).unwrap();
        assert!(matches!(
            account.debit(dec!(1001), Utc::now()),
            Err(Error::Validation(_))
        ));
        // An exact fill is allowed.
        account.debit(dec!(1000), Utc::now()).unwrap();
        assert_eq!(account.available_credit, Decimal::ZERO);
    }

    #[test]
    fn deactivate_is_idempotent() {
        let mut account = account(dec!(50000));
        account.deactivate(Utc::now());
        let stamped = account.updated_at;
        account.deactivate(Utc::now());
        assert!(!account.is_active);
        assert_eq!(account.updated_at, stamped);
    }

    #[test]
    fn card_number_masks_for_display() {
        let number = CardNumber::generate();
        let masked = number.masked();
        assert_eq!(masked.len(), 19);
        assert!(masked.contains("**** ****"));
        assert_eq!(&masked[..4], &number.as_str()[..4]);
    }

    #[test]
    fn pin_requires_four_digits() {
        assert!(Pin::parse("1234").is_ok());
        assert!(Pin::parse("123").is_err());
        assert!(Pin::parse("12a4").is_err());
        assert!(Pin::parse("12345").is_err());
    }
}
