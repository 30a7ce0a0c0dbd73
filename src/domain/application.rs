use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{ApplicantId, ApplicationId, Error, ManagerId};

/// The credit product being requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardProduct {
    pub bank_name: String,
    pub card_name: String,
    pub card_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Outcome of a manager resolution. Holding the approved limit and the
/// rejection reason in one enum keeps them mutually exclusive by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Approved {
        by: ManagerId,
        credit_limit: Decimal,
    },
    Rejected {
        by: ManagerId,
        reason: String,
    },
}

/// A card application. Created pending, resolved exactly once, never
/// deleted; resolved applications stay on file as the audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardApplication {
    pub id: ApplicationId,
    pub applicant_id: ApplicantId,
    pub product: CardProduct,
    pub requested_limit: Decimal,
    pub resolution: Option<Resolution>,
    pub applied_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl CardApplication {
    pub fn submit(
        applicant_id: ApplicantId,
        product: CardProduct,
        requested_limit: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApplicationId::new(),
            applicant_id,
            product,
            requested_limit,
            resolution: None,
            applied_at: now,
            processed_at: None,
        }
    }

    pub fn status(&self) -> ApplicationStatus {
        match self.resolution {
            None => ApplicationStatus::Pending,
            Some(Resolution::Approved { .. }) => ApplicationStatus::Approved,
            Some(Resolution::Rejected { .. }) => ApplicationStatus::Rejected,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.resolution.is_none()
    }

    pub fn approve(
        &mut self,
        by: ManagerId,
        credit_limit: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.ensure_pending()?;
        self.resolution = Some(Resolution::Approved { by, credit_limit });
        self.processed_at = Some(now);
        Ok(())
    }

    pub fn reject(
        &mut self,
        by: ManagerId,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.ensure_pending()?;
        self.resolution = Some(Resolution::Rejected { by, reason });
        self.processed_at = Some(now);
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), Error> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(Error::conflict(format!(
                "application {} is not pending",
                self.id
            )))
        }
    }

    pub fn approved_limit(&self) -> Option<Decimal> {
        match &self.resolution {
            Some(Resolution::Approved { credit_limit, .. }) => Some(*credit_limit),
            _ => None,
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.resolution {
            Some(Resolution::Rejected { reason, .. }) => Some(reason.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn pending_application() -> CardApplication {
        CardApplication::submit(
            ApplicantId::new(),
            CardProduct {
                bank_name: "HDFC Bank".to_string(),
                card_name: "Millennia".to_string(),
                card_type: "Rewards".to_string(),
            },
            dec!(100000),
            Utc::now(),
        )
    }

    #[test]
    fn submitted_applications_start_pending() {
        let application = pending_application();
        assert_eq!(application.status(), ApplicationStatus::Pending);
        assert!(application.processed_at.is_none());
        assert!(application.approved_limit().is_none());
        assert!(application.rejection_reason().is_none());
    }

    #[test]
    fn approve_is_terminal() {
        let mut application = pending_application();
        let manager = ManagerId::new();
        application
            .approve(manager, dec!(80000), Utc::now())
            .unwrap();

        assert_eq!(application.status(), ApplicationStatus::Approved);
        assert_eq!(application.approved_limit(), Some(dec!(80000)));
        assert!(application.processed_at.is_some());

        assert!(matches!(
            application.reject(manager, "income too low for limit".to_string(), Utc::now()),
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            application.approve(manager, dec!(90000), Utc::now()),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn reject_is_terminal() {
        let mut application = pending_application();
        let manager = ManagerId::new();
        application
            .reject(manager, "insufficient documented income".to_string(), Utc::now())
            .unwrap();

        assert_eq!(application.status(), ApplicationStatus::Rejected);
        assert_eq!(
            application.rejection_reason(),
            Some("insufficient documented income")
        );
        assert!(application.approved_limit().is_none());

        assert!(matches!(
            application.approve(manager, dec!(80000), Utc::now()),
            Err(Error::Conflict(_))
        ));
    }
}
