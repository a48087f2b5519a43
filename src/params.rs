use std::{fmt, ops::RangeInclusive};

use serde::Serialize;

use crate::random::SharedRng;

pub const INIT_AMOUNT: RangeInclusive<u32> = 500..=100_000;
pub const MONTHLY_CONTRIBUTION: RangeInclusive<u32> = 50..=5_000;
/// Half-open: the upper bound is never produced.
pub const INTEREST_RATE: (f64, f64) = (0.1, 200.0);
pub const NUMBER_OF_YEARS: RangeInclusive<u32> = 1..=50;

/// Query parameters of one calculator request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcParams {
    pub init_amount: u32,
    pub monthly_contribution: u32,
    /// Already rendered with two fractional digits.
    pub interest_rate: String,
    pub number_of_years: u32,
}

impl CalcParams {
    pub fn generate<R: rand::Rng>(rng: &SharedRng<R>) -> Self {
        Self {
            init_amount: rng.random_int(*INIT_AMOUNT.start(), *INIT_AMOUNT.end()),
            monthly_contribution: rng
                .random_int(*MONTHLY_CONTRIBUTION.start(), *MONTHLY_CONTRIBUTION.end()),
            interest_rate: format!("{:.2}", rng.random_float(INTEREST_RATE.0, INTEREST_RATE.1)),
            number_of_years: rng.random_int(*NUMBER_OF_YEARS.start(), *NUMBER_OF_YEARS.end()),
        }
    }
}

impl fmt::Display for CalcParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "initAmount: {}, monthlyContribution: {}, interestRate: {}, numberOfYears: {}",
            self.init_amount, self.monthly_contribution, self.interest_rate, self.number_of_years
        )
    }
}
