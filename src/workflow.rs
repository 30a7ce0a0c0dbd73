use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use crate::context::Context;
use crate::domain::{
    AccountId, Applicant, ApplicationId, CardApplication, CardProduct, Employment, Error,
    LedgerAccount, Principal,
    account::{CardDetails, generate_cvv},
    score::CreditScore,
    traits::{AuditSink, IssuanceStats, Notification, NotificationKind, NotificationSink, Store},
};
use crate::poster;

#[derive(Debug, Clone)]
pub struct SubmitApplication {
    pub product: CardProduct,
    pub requested_limit: Decimal,
}

#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub application_id: ApplicationId,
    pub account_id: AccountId,
    pub approved_limit: Decimal,
}

/// A pending application joined with the applicant detail a manager needs
/// to resolve it.
#[derive(Debug, Clone)]
pub struct ApplicationReview {
    pub application: CardApplication,
    pub applicant_name: String,
    pub credit_score: CreditScore,
    pub annual_income: Decimal,
    pub years_of_experience: u8,
    pub employment: Employment,
}

/// Files a new card application in `pending` state.
pub fn submit<S, N, A>(
    ctx: &mut Context<S, N, A>,
    principal: Principal,
    request: SubmitApplication,
) -> Result<CardApplication, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let applicant_id = principal.as_customer()?;
    let applicant = ctx.store.applicant(applicant_id)?.doc;

    ensure_limit_in_range(ctx, request.requested_limit)?;

    if ctx
        .store
        .active_account_for_bank(applicant.id, &request.product.bank_name)
        .is_some()
    {
        return Err(Error::conflict(format!(
            "an active card from {} already exists for this applicant",
            request.product.bank_name
        )));
    }

    let application = CardApplication::submit(
        applicant.id,
        request.product,
        request.requested_limit,
        Utc::now(),
    );
    let stored = ctx.store.insert_application(application)?;

    info!(
        application = %stored.doc.id,
        applicant = %applicant.id,
        bank = %stored.doc.product.bank_name,
        "card application submitted"
    );
    ctx.record_audit(
        principal,
        "card_application",
        json!({
            "application_id": stored.doc.id.to_string(),
            "card_name": stored.doc.product.card_name,
            "bank_name": stored.doc.product.bank_name,
        }),
    );
    Ok(stored.doc)
}

/// Approves a pending application and issues the card: the account is
/// created with the resolved limit and a zero balance in the same logical
/// step as the status change.
pub fn approve<S, N, A>(
    ctx: &mut Context<S, N, A>,
    principal: Principal,
    application_id: ApplicationId,
    approved_limit: Option<Decimal>,
) -> Result<ApprovalOutcome, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let manager = resolver(ctx, principal)?;
    let current = ctx.store.application(application_id)?;

    let mut application = current.doc;
    let resolved_limit = approved_limit.unwrap_or(application.requested_limit);
    ensure_limit_in_range(ctx, resolved_limit)?;

    let now = Utc::now();
    application.approve(manager.id, resolved_limit, now)?;
    ctx.store.update_application(current.version, application.clone())?;

    let applicant = applicant_for(ctx, &application)?;

    let cvv = generate_cvv();
    let card = CardDetails::issue(
        applicant.full_name.clone(),
        application.product.bank_name.clone(),
        application.product.card_type.clone(),
        ctx.hasher.digest(&cvv),
        now,
    );
    let account = LedgerAccount::issue(applicant.id, card, resolved_limit, now)?;
    let stored_account = ctx.store.insert_account(account)?;

    if ctx.config.demo_seed_transactions {
        poster::seed_demo_transactions(ctx, stored_account.doc.id);
    }

    info!(
        application = %application.id,
        account = %stored_account.doc.id,
        limit = %resolved_limit,
        "application approved, card issued"
    );
    ctx.notify(Notification {
        recipient: applicant.id,
        kind: NotificationKind::ApplicationApproved,
        message: format!(
            "Your {} application has been approved! Credit limit: {resolved_limit}",
            application.product.card_name
        ),
    });
    ctx.record_audit(
        principal,
        "application_approved",
        json!({
            "application_id": application.id.to_string(),
            "account_id": stored_account.doc.id.to_string(),
            "approved_limit": resolved_limit.to_string(),
            "resolved_by": manager.full_name,
        }),
    );

    Ok(ApprovalOutcome {
        application_id: application.id,
        account_id: stored_account.doc.id,
        approved_limit: resolved_limit,
    })
}

/// Rejects a pending application with an actionable reason. No account is
/// created.
pub fn reject<S, N, A>(
    ctx: &mut Context<S, N, A>,
    principal: Principal,
    application_id: ApplicationId,
    reason: String,
) -> Result<(), Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let manager = resolver(ctx, principal)?;

    let reason = reason.trim().to_string();
    if reason.chars().count() < ctx.config.min_rejection_reason_chars {
        return Err(Error::validation(format!(
            "rejection reason must be at least {} characters",
            ctx.config.min_rejection_reason_chars
        )));
    }

    let current = ctx.store.application(application_id)?;
    let mut application = current.doc;
    application.reject(manager.id, reason.clone(), Utc::now())?;
    ctx.store.update_application(current.version, application.clone())?;

    let applicant = applicant_for(ctx, &application)?;

    info!(application = %application.id, "application rejected");
    ctx.notify(Notification {
        recipient: applicant.id,
        kind: NotificationKind::ApplicationRejected,
        message: format!(
            "Your {} application has been rejected. Reason: {reason}",
            application.product.card_name
        ),
    });
    ctx.record_audit(
        principal,
        "application_rejected",
        json!({
            "application_id": application.id.to_string(),
            "applicant_id": application.applicant_id.to_string(),
            "rejection_reason": reason,
            "resolved_by": manager.full_name,
        }),
    );
    Ok(())
}

/// Pending queue with applicant detail, oldest first.
pub fn pending_applications<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
) -> Result<Vec<ApplicationReview>, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    principal.as_manager()?;

    let mut reviews = Vec::new();
    for application in ctx.store.pending_applications() {
        let applicant = applicant_for(ctx, &application)?;
        reviews.push(ApplicationReview {
            applicant_name: applicant.full_name,
            credit_score: applicant.credit_score,
            annual_income: applicant.annual_income,
            years_of_experience: applicant.years_of_experience,
            employment: applicant.employment,
            application,
        });
    }
    Ok(reviews)
}

/// Single application detail. Managers see any; customers only their own.
pub fn application<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
    application_id: ApplicationId,
) -> Result<CardApplication, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let application = ctx.store.application(application_id)?.doc;
    if let Principal::Customer { id } = principal {
        if application.applicant_id != id {
            return Err(Error::authorization("not your application"));
        }
    }
    Ok(application)
}

pub fn applications_for_self<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
) -> Result<Vec<CardApplication>, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let applicant_id = principal.as_customer()?;
    Ok(ctx.store.applications_for(applicant_id))
}

pub fn statistics<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
) -> Result<IssuanceStats, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    principal.as_manager()?;
    Ok(ctx.store.statistics())
}

fn ensure_limit_in_range<S, N, A>(
    ctx: &Context<S, N, A>,
    limit: Decimal,
) -> Result<(), Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    if limit < ctx.config.min_credit_limit || limit > ctx.config.max_credit_limit {
        return Err(Error::validation(format!(
            "credit limit must be between {} and {}",
            ctx.config.min_credit_limit, ctx.config.max_credit_limit
        )));
    }
    Ok(())
}

/// Resolutions must come from a manager that is actually on file; the
/// identity provider is trusted for the role claim, not for existence.
fn resolver<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
) -> Result<crate::domain::Manager, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let manager_id = principal.as_manager()?;
    match ctx.store.manager(manager_id) {
        Ok(versioned) => Ok(versioned.doc),
        Err(Error::NotFound(_)) => Err(Error::Unauthenticated(
            "resolver is not a registered manager".to_string(),
        )),
        Err(other) => Err(other),
    }
}

/// An approved-or-resolved application whose applicant record has vanished
/// is a broken invariant, not a user error.
fn applicant_for<S, N, A>(
    ctx: &Context<S, N, A>,
    application: &CardApplication,
) -> Result<Applicant, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    match ctx.store.applicant(application.applicant_id) {
        Ok(versioned) => Ok(versioned.doc),
        Err(Error::NotFound(_)) => Err(Error::internal(format!(
            "applicant record missing for application {}",
            application.id
        ))),
        Err(other) => Err(other),
    }
}
