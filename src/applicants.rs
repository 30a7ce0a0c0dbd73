use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::context::Context;
use crate::domain::{
    Applicant, Error, Manager, NewApplicant, Principal, ProfileUpdate,
    score::CreditScore,
    traits::{AuditSink, NotificationSink, Store},
};

pub fn register_applicant<S, N, A>(
    ctx: &mut Context<S, N, A>,
    new: NewApplicant,
) -> Result<Applicant, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let applicant = Applicant::register(new, Utc::now())?;
    let stored = ctx.store.insert_applicant(applicant)?;

    info!(
        applicant = %stored.doc.id,
        score = %stored.doc.credit_score,
        "applicant registered"
    );
    ctx.record_audit(
        Principal::customer(stored.doc.id),
        "customer_registered",
        json!({ "credit_score": stored.doc.credit_score.value() }),
    );
    Ok(stored.doc)
}

pub fn register_manager<S, N, A>(
    ctx: &mut Context<S, N, A>,
    full_name: String,
) -> Result<Manager, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let manager = Manager::register(full_name, Utc::now())?;
    let stored = ctx.store.insert_manager(manager)?;
    info!(manager = %stored.doc.id, "manager registered");
    Ok(stored.doc)
}

/// Applies a typed profile update to the acting customer and recomputes
/// the credit score from the new attributes.
pub fn update_profile<S, N, A>(
    ctx: &mut Context<S, N, A>,
    principal: Principal,
    update: ProfileUpdate,
) -> Result<CreditScore, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let applicant_id = principal.as_customer()?;
    let current = ctx.store.applicant(applicant_id)?;

    let mut applicant = current.doc;
    let score = applicant.apply_update(update, Utc::now())?;
    ctx.store.update_applicant(current.version, applicant)?;

    info!(applicant = %applicant_id, score = %score, "profile updated");
    ctx.record_audit(
        principal,
        "profile_updated",
        json!({ "credit_score": score.value() }),
    );
    Ok(score)
}

/// Self view of the acting customer.
pub fn profile<S, N, A>(
    ctx: &Context<S, N, A>,
    principal: Principal,
) -> Result<Applicant, Error>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    let applicant_id = principal.as_customer()?;
    Ok(ctx.store.applicant(applicant_id)?.doc)
}
