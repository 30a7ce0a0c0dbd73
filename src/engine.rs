use std::collections::HashMap;

use futures::StreamExt;
use tracing::info;

use crate::context::Context;
use crate::domain::{
    AccountId, ApplicationId, Error, NewApplicant, Principal,
    traits::{AuditSink, DeadLetterQueue, NotificationSink, Store},
};
use crate::ingestion::{Operation, OperationStream};
use crate::workflow::SubmitApplication;
use crate::{applicants, cards, insights, poster, workflow};

/// Drives a stream of scripted operations through the service layer.
///
/// Failed operations go to the dead-letter queue and processing continues;
/// one bad row never aborts the run. Handles chosen in the script (actor
/// and application labels) are resolved here to the generated ids.
pub struct Engine<I, S, N, A, D>
where
    I: OperationStream,
    S: Store,
    N: NotificationSink,
    A: AuditSink,
    D: DeadLetterQueue,
{
    ops: I,
    ctx: Context<S, N, A>,
    dlq: D,
    actors: HashMap<String, Principal>,
    applications: HashMap<String, ApplicationId>,
}

impl<I, S, N, A, D> Engine<I, S, N, A, D>
where
    I: OperationStream,
    S: Store,
    N: NotificationSink,
    A: AuditSink,
    D: DeadLetterQueue,
{
    pub fn new(ops: I, ctx: Context<S, N, A>, dlq: D) -> Self {
        Self {
            ops,
            ctx,
            dlq,
            actors: HashMap::new(),
            applications: HashMap::new(),
        }
    }

    pub async fn process(&mut self) -> Result<(), Error> {
        let mut stream = self.ops.stream();

        while let Some(op) = stream.next().await {
            match op {
                Ok(op) => {
                    if let Err(e) = self.apply(op) {
                        self.dlq.report(&e);
                    }
                }
                Err(e) => self.dlq.report(&e),
            }
        }

        Ok(())
    }

    fn apply(&mut self, op: Operation) -> Result<(), Error> {
        match op {
            Operation::Register {
                handle,
                name,
                age,
                income,
                experience,
                employment,
                loan,
            } => {
                let applicant = applicants::register_applicant(
                    &mut self.ctx,
                    NewApplicant {
                        full_name: name,
                        age,
                        employment,
                        annual_income: income,
                        years_of_experience: experience,
                        existing_loan_amount: loan,
                    },
                )?;
                self.actors
                    .insert(handle, Principal::customer(applicant.id));
            }
            Operation::RegisterManager { handle, name } => {
                let manager = applicants::register_manager(&mut self.ctx, name)?;
                self.actors.insert(handle, Principal::manager(manager.id));
            }
            Operation::Submit {
                actor,
                label,
                bank,
                card,
                card_type,
                limit,
            } => {
                let principal = self.actor(&actor)?;
                let application = workflow::submit(
                    &mut self.ctx,
                    principal,
                    SubmitApplication {
                        product: crate::domain::CardProduct {
                            bank_name: bank,
                            card_name: card,
                            card_type,
                        },
                        requested_limit: limit,
                    },
                )?;
                if let Some(label) = label {
                    self.applications.insert(label, application.id);
                }
            }
            Operation::Approve {
                actor,
                application,
                limit,
            } => {
                let principal = self.actor(&actor)?;
                let application_id = self.application(&application)?;
                workflow::approve(&mut self.ctx, principal, application_id, limit)?;
            }
            Operation::Reject {
                actor,
                application,
                reason,
            } => {
                let principal = self.actor(&actor)?;
                let application_id = self.application(&application)?;
                workflow::reject(&mut self.ctx, principal, application_id, reason)?;
            }
            Operation::Purchase {
                actor,
                bank,
                amount,
                merchant,
                category,
            } => {
                let principal = self.actor(&actor)?;
                let account_id = self.account_for(principal, &bank)?;
                poster::post(
                    &mut self.ctx,
                    principal,
                    poster::PostTransaction {
                        account_id,
                        kind: crate::domain::TransactionKind::Purchase,
                        amount,
                        merchant_name: merchant,
                        merchant_category: category,
                        description: "Scripted purchase".to_string(),
                    },
                )?;
            }
            Operation::PayBill {
                actor,
                bank,
                amount,
            } => {
                let principal = self.actor(&actor)?;
                let account_id = self.account_for(principal, &bank)?;
                poster::pay_bill(&mut self.ctx, principal, account_id, amount)?;
            }
            Operation::SetPin { actor, bank, pin } => {
                let principal = self.actor(&actor)?;
                let account_id = self.account_for(principal, &bank)?;
                cards::set_pin(&mut self.ctx, principal, account_id, &pin)?;
            }
            Operation::CloseCard { actor, bank } => {
                let principal = self.actor(&actor)?;
                let account_id = self.account_for(principal, &bank)?;
                cards::close_card(&mut self.ctx, principal, account_id)?;
            }
            Operation::Insights { actor, bank } => {
                let principal = self.actor(&actor)?;
                let account_id = self.account_for(principal, &bank)?;
                let report = insights::spending_insights(&self.ctx, principal, account_id)?;
                info!(
                    utilization = %report.utilization_pct,
                    fallback = report.fallback_used,
                    "spending insights"
                );
                for line in &report.insights {
                    info!(insight = %line);
                }
            }
        }
        Ok(())
    }

    fn actor(&self, handle: &str) -> Result<Principal, Error> {
        self.actors.get(handle).copied().ok_or_else(|| {
            Error::Unauthenticated(format!("unknown actor handle '{handle}'"))
        })
    }

    fn application(&self, label: &str) -> Result<ApplicationId, Error> {
        self.applications
            .get(label)
            .copied()
            .ok_or_else(|| Error::not_found(format!("unknown application label '{label}'")))
    }

    fn account_for(&self, principal: Principal, bank: &str) -> Result<AccountId, Error> {
        let applicant_id = principal.as_customer()?;
        self.ctx
            .store
            .active_account_for_bank(applicant_id, bank)
            .map(|account| account.id)
            .ok_or_else(|| Error::not_found(format!("no active card from {bank}")))
    }

    /// Prints the account summary report.
    pub fn flush(&self) {
        println!("applicant,bank,card_type,credit_limit,current_balance,available_credit,active");
        for account in self.ctx.store.all_accounts() {
            let holder = self
                .ctx
                .store
                .applicant(account.applicant_id)
                .map(|v| v.doc.full_name)
                .unwrap_or_else(|_| "unknown".to_string());
            println!(
                "{},{},{},{:.2},{:.2},{:.2},{}",
                holder,
                account.card.bank_name,
                account.card.card_type,
                account.credit_limit,
                account.current_balance,
                account.available_credit,
                account.is_active
            );
        }
    }

    pub fn context(&self) -> &Context<S, N, A> {
        &self.ctx
    }
}
