use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use crate::domain::{
    AccountId, Applicant, ApplicantId, ApplicationId, CardApplication, Error, LedgerAccount,
    Manager, ManagerId, Transaction, TransactionId,
    traits::{CategorySummary, IssuanceStats, Page, Store, Versioned},
    transaction::ReferenceCode,
};

/// In-memory document store backing the demo binary and the tests.
///
/// Documents are wrapped in [`Versioned`] and every update is a
/// compare-and-set against the version the caller read, so two writers
/// racing on the same application or account cannot silently overwrite
/// each other. Transactions are append-only in insertion order.
#[derive(Default, Debug)]
pub struct MemoryStore {
    applicants: HashMap<ApplicantId, Versioned<Applicant>>,
    managers: HashMap<ManagerId, Versioned<Manager>>,
    applications: HashMap<ApplicationId, Versioned<CardApplication>>,
    accounts: HashMap<AccountId, Versioned<LedgerAccount>>,
    transactions: Vec<Transaction>,
    transaction_index: HashMap<TransactionId, usize>,
    references: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn insert_versioned<K: std::hash::Hash + Eq + Copy, T: Clone>(
    map: &mut HashMap<K, Versioned<T>>,
    key: K,
    doc: T,
    what: &str,
) -> Result<Versioned<T>, Error> {
    if map.contains_key(&key) {
        return Err(Error::internal(format!("duplicate {what} id on insert")));
    }
    let versioned = Versioned { version: 1, doc };
    map.insert(key, versioned.clone());
    Ok(versioned)
}

fn fetch_versioned<K: std::hash::Hash + Eq, T: Clone>(
    map: &HashMap<K, Versioned<T>>,
    key: &K,
    what: &str,
) -> Result<Versioned<T>, Error> {
    map.get(key)
        .cloned()
        .ok_or_else(|| Error::not_found(format!("{what} not found")))
}

fn cas_versioned<K: std::hash::Hash + Eq + Copy, T: Clone>(
    map: &mut HashMap<K, Versioned<T>>,
    key: K,
    expected_version: u64,
    doc: T,
    what: &str,
) -> Result<Versioned<T>, Error> {
    let slot = map
        .get_mut(&key)
        .ok_or_else(|| Error::not_found(format!("{what} not found")))?;
    if slot.version != expected_version {
        return Err(Error::conflict(format!(
            "{what} was modified concurrently"
        )));
    }
    slot.version += 1;
    slot.doc = doc;
    Ok(slot.clone())
}

impl Store for MemoryStore {
    fn insert_applicant(&mut self, applicant: Applicant) -> Result<Versioned<Applicant>, Error> {
        insert_versioned(&mut self.applicants, applicant.id, applicant, "applicant")
    }

    fn applicant(&self, id: ApplicantId) -> Result<Versioned<Applicant>, Error> {
        fetch_versioned(&self.applicants, &id, "applicant")
    }

    fn update_applicant(
        &mut self,
        expected_version: u64,
        applicant: Applicant,
    ) -> Result<Versioned<Applicant>, Error> {
        cas_versioned(
            &mut self.applicants,
            applicant.id,
            expected_version,
            applicant,
            "applicant",
        )
    }

    fn insert_manager(&mut self, manager: Manager) -> Result<Versioned<Manager>, Error> {
        insert_versioned(&mut self.managers, manager.id, manager, "manager")
    }

    fn manager(&self, id: ManagerId) -> Result<Versioned<Manager>, Error> {
        fetch_versioned(&self.managers, &id, "manager")
    }

    fn insert_application(
        &mut self,
        application: CardApplication,
    ) -> Result<Versioned<CardApplication>, Error> {
        insert_versioned(
            &mut self.applications,
            application.id,
            application,
            "application",
        )
    }

    fn application(&self, id: ApplicationId) -> Result<Versioned<CardApplication>, Error> {
        fetch_versioned(&self.applications, &id, "application")
    }

    fn update_application(
        &mut self,
        expected_version: u64,
        application: CardApplication,
    ) -> Result<Versioned<CardApplication>, Error> {
        cas_versioned(
            &mut self.applications,
            application.id,
            expected_version,
            application,
            "application",
        )
    }

    fn pending_applications(&self) -> Vec<CardApplication> {
        let mut pending: Vec<_> = self
            .applications
            .values()
            .filter(|v| v.doc.is_pending())
            .map(|v| v.doc.clone())
            .collect();
        pending.sort_by_key(|a| a.applied_at);
        pending
    }

    fn applications_for(&self, applicant: ApplicantId) -> Vec<CardApplication> {
        let mut applications: Vec<_> = self
            .applications
            .values()
            .filter(|v| v.doc.applicant_id == applicant)
            .map(|v| v.doc.clone())
            .collect();
        applications.sort_by_key(|a| a.applied_at);
        applications
    }

    fn insert_account(
        &mut self,
        account: LedgerAccount,
    ) -> Result<Versioned<LedgerAccount>, Error> {
        insert_versioned(&mut self.accounts, account.id, account, "account")
    }

    fn account(&self, id: AccountId) -> Result<Versioned<LedgerAccount>, Error> {
        fetch_versioned(&self.accounts, &id, "account")
    }

    fn update_account(
        &mut self,
        expected_version: u64,
        account: LedgerAccount,
    ) -> Result<Versioned<LedgerAccount>, Error> {
        cas_versioned(
            &mut self.accounts,
            account.id,
            expected_version,
            account,
            "account",
        )
    }

    fn accounts_for(&self, applicant: ApplicantId) -> Vec<LedgerAccount> {
        let mut accounts: Vec<_> = self
            .accounts
            .values()
            .filter(|v| v.doc.applicant_id == applicant && v.doc.is_active)
            .map(|v| v.doc.clone())
            .collect();
        accounts.sort_by_key(|a| a.opened_at);
        accounts
    }

    fn active_account_for_bank(
        &self,
        applicant: ApplicantId,
        bank_name: &str,
    ) -> Option<LedgerAccount> {
        self.accounts
            .values()
            .find(|v| {
                v.doc.applicant_id == applicant
                    && v.doc.is_active
                    && v.doc.card.bank_name == bank_name
            })
            .map(|v| v.doc.clone())
    }

    fn all_accounts(&self) -> Vec<LedgerAccount> {
        let mut accounts: Vec<_> = self.accounts.values().map(|v| v.doc.clone()).collect();
        accounts.sort_by(|a, b| {
            a.opened_at
                .cmp(&b.opened_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        accounts
    }

    fn insert_transaction(&mut self, transaction: Transaction) -> Result<(), Error> {
        if !self.references.insert(transaction.reference.as_str().to_string()) {
            return Err(Error::conflict(format!(
                "transaction reference {} already exists",
                transaction.reference
            )));
        }
        self.transaction_index
            .insert(transaction.id, self.transactions.len());
        self.transactions.push(transaction);
        Ok(())
    }

    fn transaction(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.transaction_index
            .get(&id)
            .map(|idx| self.transactions[*idx].clone())
            .ok_or_else(|| Error::not_found("transaction not found"))
    }

    fn reference_in_use(&self, reference: &ReferenceCode) -> bool {
        self.references.contains(reference.as_str())
    }

    fn transactions_for_account(&self, account: AccountId, page: Page) -> Vec<Transaction> {
        self.transactions
            .iter()
            .rev()
            .filter(|t| t.account_id == account)
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect()
    }

    fn transactions_for_applicant(
        &self,
        applicant: ApplicantId,
        page: Page,
    ) -> Vec<Transaction> {
        self.transactions
            .iter()
            .rev()
            .filter(|t| t.applicant_id == applicant)
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect()
    }

    fn spending_summary(&self, applicant: ApplicantId) -> Vec<CategorySummary> {
        let mut buckets: HashMap<&str, (Decimal, u64)> = HashMap::new();
        for txn in self.transactions.iter().filter(|t| t.applicant_id == applicant) {
            let bucket = buckets
                .entry(txn.merchant_category.as_str())
                .or_insert((Decimal::ZERO, 0));
            bucket.0 += txn.amount;
            bucket.1 += 1;
        }

        let mut summary: Vec<_> = buckets
            .into_iter()
            .map(|(category, (total, count))| CategorySummary {
                category: category.to_string(),
                total_amount: total,
                transaction_count: count,
                average_amount: total / Decimal::from(count),
            })
            .collect();
        summary.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then_with(|| a.category.cmp(&b.category))
        });
        summary
    }

    fn statistics(&self) -> IssuanceStats {
        use crate::domain::ApplicationStatus::*;
        let mut stats = IssuanceStats {
            total_applications: self.applications.len() as u64,
            active_applicants: self
                .applicants
                .values()
                .filter(|v| v.doc.is_active)
                .count() as u64,
            active_accounts: self.accounts.values().filter(|v| v.doc.is_active).count()
                as u64,
            total_transactions: self.transactions.len() as u64,
            ..Default::default()
        };
        for application in self.applications.values() {
            match application.doc.status() {
                Pending => stats.pending_applications += 1,
                Approved => stats.approved_applications += 1,
                Rejected => stats.rejected_applications += 1,
            }
        }
        stats
    }
}
