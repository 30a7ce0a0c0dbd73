use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, warn};

use crate::context::Context;
use crate::domain::{
    AccountId, Error, Page, Principal, Transaction, TransactionId, TransactionStatus,
    traits::{AuditSink, NotificationSink, Store},
    transaction::{BalanceEffect, ReferenceCode, TransactionKind},
};

#[derive(Debug, Clone)]
pub struct PostTransaction {
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub merchant_name: String,
    pub merchant_category: String,
    pub description: String,
}

/// Result of a posting, echoing the mutated balance fields.
#[derive(Debug, Clone)]
pub struct PostedTransaction {
    pub transaction: Transaction,
    pub new_balance: Decimal,
    pub available_credit: Decimal,
}

/// Applies one transaction against the owning account.
///
/// Validation order: ownership, card open, amount range, then the
/// kind-specific balance rule. Debit kinds must fit inside the credit
/// limit; payments may not exceed the outstanding balance (stricter than
/// the raw credit primitive, which merely floors at zero and still governs
/// refunds). The record is written `completed` and settled immediately;
/// there is no external settlement leg in this system.
pub fn post<S, N, A>(
    ctx: &mut Context<S, N, A>,
    principal: Principal,
    request: PostTransaction,
) -> Result<PostedTransaction, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let applicant_id = principal.as_customer()?;
    let current = ctx.store.account(request.account_id)?;
    let mut account = current.doc;

    if account.applicant_id != applicant_id {
        return Err(Error::authorization(
            "card does not belong to the acting customer",
        ));
    }
    if !account.is_active {
        return Err(Error::conflict("card is closed"));
    }
    if request.amount <= Decimal::ZERO || request.amount > ctx.config.max_transaction_amount {
        return Err(Error::validation(format!(
            "transaction amount must be positive and at most {}",
            ctx.config.max_transaction_amount
        )));
    }

    let now = Utc::now();
    match request.kind.effect() {
        BalanceEffect::Debit => {
            if account.current_balance + request.amount > account.credit_limit {
                return Err(Error::validation("transaction would exceed credit limit"));
            }
            account.debit(request.amount, now)?;
        }
        BalanceEffect::Credit => {
            if request.kind == TransactionKind::Payment
                && request.amount > account.current_balance
            {
                return Err(Error::validation(
                    "payment amount cannot exceed current balance",
                ));
            }
            account.credit(request.amount, now)?;
        }
    }

    let reference = unique_reference(&ctx.store);
    let transaction = Transaction {
        id: TransactionId::new(),
        account_id: account.id,
        applicant_id,
        kind: request.kind,
        amount: request.amount,
        merchant_name: request.merchant_name,
        merchant_category: request.merchant_category,
        description: request.description,
        status: TransactionStatus::Completed,
        reference,
        transacted_at: now,
        settled_at: Some(now),
    };

    let updated = ctx.store.update_account(current.version, account)?;
    ctx.store.insert_transaction(transaction.clone())?;

    info!(
        reference = %transaction.reference,
        kind = transaction.kind.as_str(),
        amount = %transaction.amount,
        balance = %updated.doc.current_balance,
        "transaction posted"
    );
    ctx.record_audit(
        principal,
        "transaction_posted",
        json!({
            "reference": transaction.reference.as_str(),
            "account_id": transaction.account_id.to_string(),
            "kind": transaction.kind.as_str(),
            "amount": transaction.amount.to_string(),
        }),
    );

    Ok(PostedTransaction {
        transaction,
        new_balance: updated.doc.current_balance,
        available_credit: updated.doc.available_credit,
    })
}

/// Bill payment against the outstanding balance.
pub fn pay_bill<S, N, A>(
    ctx: &mut Context<S, N, A>,
    principal: Principal,
    account_id: AccountId,
    amount: Decimal,
) -> Result<PostedTransaction, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    post(
        ctx,
        principal,
        PostTransaction {
            account_id,
            kind: TransactionKind::Payment,
            amount,
            merchant_name: "Credit Card Payment".to_string(),
            merchant_category: "Payment".to_string(),
            description: "Bill payment".to_string(),
        },
    )
}

/// Seeds a freshly issued account with demonstration activity through the
/// regular posting path, so ledger invariants keep holding. Individual
/// seed failures only log.
pub(crate) fn seed_demo_transactions<S, N, A>(ctx: &mut Context<S, N, A>, account_id: AccountId)
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let account = match ctx.store.account(account_id) {
        Ok(versioned) => versioned.doc,
        Err(error) => {
            warn!(%error, "demo seed skipped, account not readable");
            return;
        }
    };
    let owner = Principal::customer(account.applicant_id);

    let samples: [(TransactionKind, Decimal, &str, &str, &str); 5] = [
        (
            TransactionKind::Purchase,
            Decimal::from(2_500),
            "Neo Electronics",
            "Online Shopping",
            "Electronics purchase",
        ),
        (
            TransactionKind::Purchase,
            Decimal::from(800),
            "Swift Eats",
            "Food & Dining",
            "Food delivery",
        ),
        (
            TransactionKind::Purchase,
            Decimal::from(1_200),
            "City Rides",
            "Transportation",
            "Ride payment",
        ),
        (
            TransactionKind::Purchase,
            Decimal::from(4_500),
            "Vista Mart",
            "Groceries",
            "Grocery shopping",
        ),
        (
            TransactionKind::Payment,
            Decimal::from(5_000),
            "Credit Card Payment",
            "Payment",
            "Monthly bill payment",
        ),
    ];

    for (kind, amount, merchant, category, description) in samples {
        let result = post(
            ctx,
            owner,
            PostTransaction {
                account_id,
                kind,
                amount,
                merchant_name: merchant.to_string(),
                merchant_category: category.to_string(),
                description: description.to_string(),
            },
        );
        if let Err(error) = result {
            warn!(%error, merchant, "demo seed transaction skipped");
        }
    }
}

pub fn transactions_for_card<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
    account_id: AccountId,
    page: Page,
) -> Result<Vec<Transaction>, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let account = ctx.store.account(account_id)?.doc;
    if let Principal::Customer { id } = principal {
        if account.applicant_id != id {
            return Err(Error::authorization("not your card"));
        }
    }
    Ok(ctx.store.transactions_for_account(account_id, page))
}

pub fn transactions_for_self<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
    page: Page,
) -> Result<Vec<Transaction>, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let applicant_id = principal.as_customer()?;
    Ok(ctx.store.transactions_for_applicant(applicant_id, page))
}

pub fn transaction_detail<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
    transaction_id: TransactionId,
) -> Result<Transaction, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let transaction = ctx.store.transaction(transaction_id)?;
    if let Principal::Customer { id } = principal {
        if transaction.applicant_id != id {
            return Err(Error::authorization("not your transaction"));
        }
    }
    Ok(transaction)
}

fn unique_reference<S: Store>(store: &S) -> ReferenceCode {
    // Ten alphanumerics leave collisions vanishingly rare; regenerate if
    // one ever lands.
    loop {
        let reference = ReferenceCode::generate();
        if !store.reference_in_use(&reference) {
            return reference;
        }
    }
}
