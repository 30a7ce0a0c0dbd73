use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::context::Context;
use crate::domain::{
    AccountId, Error, LedgerAccount, Page, Pin, Principal, Transaction,
    traits::{AuditSink, NotificationSink, Store, Versioned},
};

/// Card detail with its latest activity.
#[derive(Debug, Clone)]
pub struct CardDetailView {
    pub account: LedgerAccount,
    pub recent_transactions: Vec<Transaction>,
}

/// Stores a new PIN for the card, digested through the external hashing
/// seam. The cleartext never reaches the store.
pub fn set_pin<S, N, A>(
    ctx: &mut Context<S, N, A>,
    principal: Principal,
    account_id: AccountId,
    pin: &str,
) -> Result<(), Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let pin = Pin::parse(pin)?;
    let current = owned_account(ctx, principal, account_id)?;

    let mut account = current.doc;
    let digest = ctx.hasher.digest(pin.as_str());
    account.set_pin_digest(digest, Utc::now());
    ctx.store.update_account(current.version, account)?;

    info!(account = %account_id, "card PIN updated");
    ctx.record_audit(
        principal,
        "pin_set",
        json!({ "account_id": account_id.to_string() }),
    );
    Ok(())
}

/// Soft-deletes the card. Idempotent; settled transactions stay on file.
pub fn close_card<S, N, A>(
    ctx: &mut Context<S, N, A>,
    principal: Principal,
    account_id: AccountId,
) -> Result<(), Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let current = owned_account(ctx, principal, account_id)?;

    let mut account = current.doc;
    account.deactivate(Utc::now());
    ctx.store.update_account(current.version, account)?;

    info!(account = %account_id, "card closed");
    ctx.record_audit(
        principal,
        "card_removed",
        json!({ "account_id": account_id.to_string() }),
    );
    Ok(())
}

/// Active cards of the acting customer.
pub fn cards_for_self<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
) -> Result<Vec<LedgerAccount>, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let applicant_id = principal.as_customer()?;
    Ok(ctx.store.accounts_for(applicant_id))
}

pub fn card_detail<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
    account_id: AccountId,
) -> Result<CardDetailView, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let account = owned_account(ctx, principal, account_id)?.doc;
    let recent_transactions = ctx.store.transactions_for_account(
        account_id,
        Page {
            limit: 5,
            offset: 0,
        },
    );
    Ok(CardDetailView {
        account,
        recent_transactions,
    })
}

fn owned_account<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
    account_id: AccountId,
) -> Result<Versioned<LedgerAccount>, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let applicant_id = principal.as_customer()?;
    let current = ctx.store.account(account_id)?;
    if current.doc.applicant_id != applicant_id {
        return Err(Error::authorization(
            "card does not belong to the acting customer",
        ));
    }
    Ok(current)
}
