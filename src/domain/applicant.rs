use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{ApplicantId, Error, ManagerId, score::CreditScore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Employment {
    Salaried,
    SelfEmployed,
    Unemployed,
}

impl std::str::FromStr for Employment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "salaried" => Ok(Self::Salaried),
            "self_employed" => Ok(Self::SelfEmployed),
            "unemployed" => Ok(Self::Unemployed),
            other => Err(Error::validation(format!(
                "unknown employment category: {other}"
            ))),
        }
    }
}

/// A scored customer. Financial attributes feed the credit score, which is
/// recomputed on every profile change rather than trusted from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applicant {
    pub id: ApplicantId,
    pub full_name: String,
    pub age: u8,
    pub employment: Employment,
    pub annual_income: Decimal,
    pub years_of_experience: u8,
    pub existing_loan_amount: Decimal,
    pub credit_score: CreditScore,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplicant {
    pub full_name: String,
    pub age: u8,
    pub employment: Employment,
    pub annual_income: Decimal,
    pub years_of_experience: u8,
    pub existing_loan_amount: Decimal,
}

/// Field-by-field profile update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub age: Option<u8>,
    pub employment: Option<Employment>,
    pub annual_income: Option<Decimal>,
    pub years_of_experience: Option<u8>,
    pub existing_loan_amount: Option<Decimal>,
}

impl Applicant {
    pub fn register(new: NewApplicant, now: DateTime<Utc>) -> Result<Self, Error> {
        validate_profile(
            &new.full_name,
            new.age,
            &new.annual_income,
            new.years_of_experience,
            &new.existing_loan_amount,
        )?;

        let mut applicant = Self {
            id: ApplicantId::new(),
            full_name: new.full_name,
            age: new.age,
            employment: new.employment,
            annual_income: new.annual_income,
            years_of_experience: new.years_of_experience,
            existing_loan_amount: new.existing_loan_amount,
            credit_score: CreditScore::FLOOR,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        applicant.credit_score = CreditScore::compute(&applicant);
        Ok(applicant)
    }

    /// Applies a typed update and recomputes the score from the new
    /// attributes. Returns the refreshed score.
    pub fn apply_update(
        &mut self,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<CreditScore, Error> {
        if let Some(name) = update.full_name {
            self.full_name = name;
        }
        if let Some(age) = update.age {
            self.age = age;
        }
        if let Some(employment) = update.employment {
            self.employment = employment;
        }
        if let Some(income) = update.annual_income {
            self.annual_income = income;
        }
        if let Some(years) = update.years_of_experience {
            self.years_of_experience = years;
        }
        if let Some(loan) = update.existing_loan_amount {
            self.existing_loan_amount = loan;
        }

        validate_profile(
            &self.full_name,
            self.age,
            &self.annual_income,
            self.years_of_experience,
            &self.existing_loan_amount,
        )?;

        self.credit_score = CreditScore::compute(self);
        self.updated_at = now;
        Ok(self.credit_score)
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }
}

fn validate_profile(
    full_name: &str,
    age: u8,
    annual_income: &Decimal,
    years_of_experience: u8,
    existing_loan_amount: &Decimal,
) -> Result<(), Error> {
    if full_name.trim().is_empty() {
        return Err(Error::validation("full name is required"));
    }
    if !(18..=100).contains(&age) {
        return Err(Error::validation("age must be between 18 and 100"));
    }
    if annual_income.is_sign_negative() {
        return Err(Error::validation("annual income must not be negative"));
    }
    if years_of_experience > 50 {
        return Err(Error::validation(
            "years of experience must be at most 50",
        ));
    }
    if existing_loan_amount.is_sign_negative() {
        return Err(Error::validation(
            "existing loan amount must not be negative",
        ));
    }
    Ok(())
}

/// Authenticated caller, as supplied by the external identity provider.
/// The core trusts this input and only checks role and ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Principal {
    Customer { id: ApplicantId },
    Manager { id: ManagerId },
}

impl Principal {
    pub fn customer(id: ApplicantId) -> Self {
        Self::Customer { id }
    }

    pub fn manager(id: ManagerId) -> Self {
        Self::Manager { id }
    }

    pub fn as_customer(&self) -> Result<ApplicantId, Error> {
        match self {
            Self::Customer { id } => Ok(*id),
            Self::Manager { .. } => Err(Error::authorization(
                "this operation is reserved for customers",
            )),
        }
    }

    pub fn as_manager(&self) -> Result<ManagerId, Error> {
        match self {
            Self::Manager { id } => Ok(*id),
            Self::Customer { .. } => Err(Error::authorization(
                "this operation is reserved for managers",
            )),
        }
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer { id } => write!(f, "customer:{id}"),
            Self::Manager { id } => write!(f, "manager:{id}"),
        }
    }
}

/// Resolver of card applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manager {
    pub id: ManagerId,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl Manager {
    pub fn register(full_name: String, now: DateTime<Utc>) -> Result<Self, Error> {
        if full_name.trim().is_empty() {
            return Err(Error::validation("manager name is required"));
        }
        Ok(Self {
            id: ManagerId::new(),
            full_name,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn new_applicant() -> NewApplicant {
        NewApplicant {
            full_name: "Asha Rao".to_string(),
            age: 30,
            employment: Employment::Salaried,
            annual_income: dec!(600000),
            years_of_experience: 3,
            existing_loan_amount: Decimal::ZERO,
        }
    }

    #[test]
    fn register_computes_initial_score() {
        let applicant = Applicant::register(new_applicant(), Utc::now()).unwrap();
        assert_eq!(applicant.credit_score.value(), 650);
        assert!(applicant.is_active);
    }

    #[test]
    fn register_rejects_minors() {
        let mut new = new_applicant();
        new.age = 17;
        assert!(matches!(
            Applicant::register(new, Utc::now()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn update_recomputes_score() {
        let mut applicant = Applicant::register(new_applicant(), Utc::now()).unwrap();
        let score = applicant
            .apply_update(
                ProfileUpdate {
                    annual_income: Some(dec!(1200000)),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        // Income tier moves from +150 to +200.
        assert_eq!(score.value(), 700);
        assert_eq!(applicant.credit_score, score);
    }

    #[test]
    fn update_rejects_negative_income() {
        let mut applicant = Applicant::register(new_applicant(), Utc::now()).unwrap();
        let res = applicant.apply_update(
            ProfileUpdate {
                annual_income: Some(dec!(-1)),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(matches!(res, Err(Error::Validation(_))));
    }

    #[test]
    fn deactivation_is_a_soft_delete() {
        let mut applicant = Applicant::register(new_applicant(), Utc::now()).unwrap();
        applicant.deactivate(Utc::now());
        assert!(!applicant.is_active);
        // The record itself survives for audit purposes.
        assert_eq!(applicant.full_name, "Asha Rao");
    }

    #[test]
    fn employment_parses_snake_case() {
        assert_eq!(
            "self_employed".parse::<Employment>().unwrap(),
            Employment::SelfEmployed
        );
        assert!("retired".parse::<Employment>().is_err());
    }
}
