use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::domain::applicant::{Applicant, Employment};

/// Creditworthiness score in the 300..=900 band.
///
/// The computation is a simple additive point heuristic, not a regulatory
/// model. It is deterministic and always recomputable from the applicant's
/// current attributes, so the stored value is a cache, never the source of
/// truth.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CreditScore(u16);

impl CreditScore {
    pub const FLOOR: CreditScore = CreditScore(300);
    pub const CEILING: CreditScore = CreditScore(900);

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn compute(applicant: &Applicant) -> Self {
        let mut points: i64 = 300;

        points += income_points(&applicant.annual_income);
        points += experience_points(applicant.years_of_experience);
        points += employment_points(applicant.employment);
        points += age_points(applicant.age);
        points -= loan_penalty(&applicant.existing_loan_amount);

        Self::clamped(points)
    }

    fn clamped(points: i64) -> Self {
        let bounded = points.clamp(Self::FLOOR.0 as i64, Self::CEILING.0 as i64);
        CreditScore(bounded as u16)
    }
}

impl std::fmt::Display for CreditScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

fn income_points(annual_income: &Decimal) -> i64 {
    if *annual_income >= Decimal::from(1_000_000) {
        200
    } else if *annual_income >= Decimal::from(500_000) {
        150
    } else if *annual_income >= Decimal::from(300_000) {
        100
    } else {
        0
    }
}

fn experience_points(years: u8) -> i64 {
    match years {
        5.. => 100,
        2..=4 => 50,
        _ => 0,
    }
}

fn employment_points(employment: Employment) -> i64 {
    match employment {
        Employment::Salaried => 100,
        Employment::SelfEmployed => 50,
        Employment::Unemployed => 0,
    }
}

fn age_points(age: u8) -> i64 {
    match age {
        25..=35 => 50,
        36..=45 => 75,
        _ => 0,
    }
}

/// One point per 10,000 of outstanding loans, capped at 100. The fractional
/// remainder is truncated toward zero so the penalty stays monotone.
fn loan_penalty(existing_loan: &Decimal) -> i64 {
    if existing_loan.is_sign_negative() || existing_loan.is_zero() {
        return 0;
    }
    let penalty = (existing_loan / Decimal::from(10_000)).min(Decimal::from(100));
    penalty.trunc().to_i64().unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::applicant::NewApplicant;

    fn applicant_with(
        income: Decimal,
        years: u8,
        employment: Employment,
        age: u8,
        loan: Decimal,
    ) -> Applicant {
        Applicant::register(
            NewApplicant {
                full_name: "Test Subject".to_string(),
                age,
                employment,
                annual_income: income,
                years_of_experience: years,
                existing_loan_amount: loan,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn worked_example_scores_650() {
        // 300 base + 150 income + 50 experience + 100 salaried + 50 age band.
        let applicant =
            applicant_with(dec!(600000), 3, Employment::Salaried, 25, Decimal::ZERO);
        assert_eq!(CreditScore::compute(&applicant).value(), 650);
    }

    #[test]
    fn never_leaves_the_band() {
        let heavy_debt = applicant_with(
            Decimal::ZERO,
            0,
            Employment::Unemployed,
            60,
            dec!(5_000_000),
        );
        assert_eq!(CreditScore::compute(&heavy_debt), CreditScore::FLOOR);

        let best_case =
            applicant_with(dec!(2_000_000), 20, Employment::Salaried, 40, Decimal::ZERO);
        let score = CreditScore::compute(&best_case);
        assert!(score >= CreditScore::FLOOR && score <= CreditScore::CEILING);
    }

    #[test]
    fn monotone_in_income_tier() {
        let tiers = [dec!(100000), dec!(300000), dec!(500000), dec!(1000000)];
        let scores: Vec<u16> = tiers
            .iter()
            .map(|income| {
                CreditScore::compute(&applicant_with(
                    *income,
                    3,
                    Employment::Salaried,
                    30,
                    Decimal::ZERO,
                ))
                .value()
            })
            .collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
    }

    #[test]
    fn monotone_in_experience() {
        let scores: Vec<u16> = [0u8, 2, 5, 10]
            .iter()
            .map(|years| {
                CreditScore::compute(&applicant_with(
                    dec!(400000),
                    *years,
                    Employment::SelfEmployed,
                    30,
                    Decimal::ZERO,
                ))
                .value()
            })
            .collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
    }

    #[test]
    fn salaried_outranks_other_employment() {
        let score_for = |employment| {
            CreditScore::compute(&applicant_with(
                dec!(400000),
                3,
                employment,
                30,
                Decimal::ZERO,
            ))
            .value()
        };
        assert!(score_for(Employment::Salaried) > score_for(Employment::SelfEmployed));
        assert!(score_for(Employment::SelfEmployed) > score_for(Employment::Unemployed));
    }

    #[test]
    fn loan_penalty_caps_at_100() {
        let moderate =
            applicant_with(dec!(600000), 5, Employment::Salaried, 30, dec!(250_000));
        let crushing =
            applicant_with(dec!(600000), 5, Employment::Salaried, 30, dec!(9_000_000));
        // 300 + 150 + 100 + 100 + 50 = 700 gross.
        assert_eq!(CreditScore::compute(&moderate).value(), 675);
        assert_eq!(CreditScore::compute(&crushing).value(), 600);
    }

    #[test]
    fn fractional_penalty_truncates() {
        let applicant =
            applicant_with(dec!(600000), 5, Employment::Salaried, 30, dec!(15_000));
        // Penalty of 1.5 truncates to 1.
        assert_eq!(CreditScore::compute(&applicant).value(), 699);
    }
}
