use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccountId, Applicant, ApplicantId, ApplicationId, CardApplication, Error,
    LedgerAccount, Manager, ManagerId, Transaction, TransactionId,
    transaction::ReferenceCode,
};

/// A stored document plus its optimistic-concurrency version. Every update
/// must present the version it read; a mismatch means a concurrent writer
/// won and the operation reports `Error::Conflict` instead of silently
/// losing the update.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub version: u64,
    pub doc: T,
}

/// Skip/limit paging for listing queries, newest first.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
        }
    }
}

/// Per-category spending aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub total_amount: Decimal,
    pub transaction_count: u64,
    pub average_amount: Decimal,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IssuanceStats {
    pub total_applications: u64,
    pub pending_applications: u64,
    pub approved_applications: u64,
    pub rejected_applications: u64,
    pub active_applicants: u64,
    pub active_accounts: u64,
    pub total_transactions: u64,
}

/// Logical read/write contract of the backing document store.
///
/// Mutations are compare-and-set: the caller reads a `Versioned` document,
/// works on a copy, and writes it back with the version it read. This
/// replaces the two-state modified-count signal of a raw document store
/// with an explicit result per update.
pub trait Store {
    fn insert_applicant(&mut self, applicant: Applicant) -> Result<Versioned<Applicant>, Error>;
    fn applicant(&self, id: ApplicantId) -> Result<Versioned<Applicant>, Error>;
    fn update_applicant(
        &mut self,
        expected_version: u64,
        applicant: Applicant,
    ) -> Result<Versioned<Applicant>, Error>;

    fn insert_manager(&mut self, manager: Manager) -> Result<Versioned<Manager>, Error>;
    fn manager(&self, id: ManagerId) -> Result<Versioned<Manager>, Error>;

    fn insert_application(
        &mut self,
        application: CardApplication,
    ) -> Result<Versioned<CardApplication>, Error>;
    fn application(&self, id: ApplicationId) -> Result<Versioned<CardApplication>, Error>;
    fn update_application(
        &mut self,
        expected_version: u64,
        application: CardApplication,
    ) -> Result<Versioned<CardApplication>, Error>;
    fn pending_applications(&self) -> Vec<CardApplication>;
    fn applications_for(&self, applicant: ApplicantId) -> Vec<CardApplication>;

    fn insert_account(
        &mut self,
        account: LedgerAccount,
    ) -> Result<Versioned<LedgerAccount>, Error>;
    fn account(&self, id: AccountId) -> Result<Versioned<LedgerAccount>, Error>;
    fn update_account(
        &mut self,
        expected_version: u64,
        account: LedgerAccount,
    ) -> Result<Versioned<LedgerAccount>, Error>;
    /// Active accounts only; closed cards drop out of customer-facing lists.
    fn accounts_for(&self, applicant: ApplicantId) -> Vec<LedgerAccount>;
    fn active_account_for_bank(
        &self,
        applicant: ApplicantId,
        bank_name: &str,
    ) -> Option<LedgerAccount>;
    fn all_accounts(&self) -> Vec<LedgerAccount>;

    /// Rejects a duplicate reference code with `Error::Conflict`.
    fn insert_transaction(&mut self, transaction: Transaction) -> Result<(), Error>;
    fn transaction(&self, id: TransactionId) -> Result<Transaction, Error>;
    fn reference_in_use(&self, reference: &ReferenceCode) -> bool;
    fn transactions_for_account(&self, account: AccountId, page: Page) -> Vec<Transaction>;
    fn transactions_for_applicant(&self, applicant: ApplicantId, page: Page)
    -> Vec<Transaction>;
    fn spending_summary(&self, applicant: ApplicantId) -> Vec<CategorySummary>;
    fn statistics(&self) -> IssuanceStats;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApplicationApproved,
    ApplicationRejected,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient: ApplicantId,
    pub kind: NotificationKind,
    pub message: String,
}

/// Customer-facing event delivery. Fire and forget: a failing sink is
/// logged by the caller and never rolls back the workflow transition that
/// produced the event.
pub trait NotificationSink {
    fn notify(&self, notification: Notification) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub actor: crate::domain::Principal,
    pub action: &'static str,
    pub details: serde_json::Value,
    pub at: DateTime<Utc>,
}

/// Append-only audit trail. Same fire-and-forget contract as
/// [`NotificationSink`].
pub trait AuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), Error>;
}

/// Opaque hashing collaborator for secrets held at rest (PIN, CVV). The
/// core never stores or returns the cleartext.
pub trait SecretHasher {
    fn digest(&self, secret: &str) -> String;
}

/// Point-in-time view of one account's usage, fed to insight generation.
#[derive(Debug, Clone, Serialize)]
pub struct SpendingSnapshot {
    pub credit_limit: Decimal,
    pub current_balance: Decimal,
    pub available_credit: Decimal,
    pub by_category: Vec<CategorySummary>,
}

/// External free-text insight service. Optional; any failure falls back to
/// the deterministic rule-based summary.
pub trait InsightGenerator {
    fn generate(&self, snapshot: &SpendingSnapshot) -> Result<Vec<String>, Error>;
}

pub trait DeadLetterQueue {
    fn report(&self, error: &Error);
}
