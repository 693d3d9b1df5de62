use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyAnalyticsError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::RealtyAnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a fixed-rate amortisation schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    /// Full property price before the down payment
    pub principal: Money,
    /// Down payment as a percentage of the principal
    #[serde(default = "default_down_payment_pct")]
    pub down_payment_pct: Percent,
    /// Annual interest rate in percent (8.5 = 8.5%)
    pub annual_interest_rate_pct: Percent,
    /// Loan term in years
    pub term_years: u32,
}

fn default_down_payment_pct() -> Percent {
    dec!(20)
}

/// One year of the amortisation schedule. Figures are per-year, not
/// cumulative: principal_paid + interest_paid == total_paid for every row,
/// and the principal column sums to the loan amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyAmortization {
    pub year: u32,
    pub total_paid: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub remaining_balance: Money,
}

/// Full schedule for a fixed-rate loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageSchedule {
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub years: Vec<YearlyAmortization>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the EMI and year-by-year amortisation schedule for a fixed-rate
/// loan, wrapped in the standard output envelope.
pub fn amortize(
    input: &AmortizationInput,
) -> RealtyAnalyticsResult<ComputationOutput<MortgageSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_interest_rate_pct > dec!(15) {
        warnings.push(format!(
            "Interest rate {}% is above 15% — verify lender terms",
            input.annual_interest_rate_pct
        ));
    }

    let schedule = build_schedule(input)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-Rate Mortgage Amortisation (EMI)",
        input,
        warnings,
        elapsed,
        schedule,
    ))
}

/// Schedule construction without the envelope, for internal composition by
/// the buy-vs-rent and tax calculators.
pub(crate) fn build_schedule(
    input: &AmortizationInput,
) -> RealtyAnalyticsResult<MortgageSchedule> {
    if input.principal <= Decimal::ZERO {
        return Err(RealtyAnalyticsError::invalid_input(
            "principal",
            "Principal must be positive",
        ));
    }
    if input.down_payment_pct < Decimal::ZERO || input.down_payment_pct > dec!(100) {
        return Err(RealtyAnalyticsError::invalid_input(
            "down_payment_pct",
            "Down payment must be between 0 and 100 percent",
        ));
    }
    if input.term_years == 0 {
        return Err(RealtyAnalyticsError::invalid_input(
            "term_years",
            "Loan term must be at least 1 year",
        ));
    }

    let loan_amount = input.principal * (Decimal::ONE - input.down_payment_pct / dec!(100));
    let monthly_rate = input.annual_interest_rate_pct / dec!(1200);
    let total_months = input.term_years * 12;

    let monthly_payment = monthly_payment(loan_amount, monthly_rate, total_months);

    // Month-by-month simulation with yearly roll-up.
    let mut balance = loan_amount;
    let mut total_payment = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;
    let mut years = Vec::with_capacity(input.term_years as usize);

    for year in 1..=input.term_years {
        let mut year_interest = Decimal::ZERO;
        let mut year_principal = Decimal::ZERO;

        for _ in 0..12 {
            if balance.is_zero() {
                break;
            }
            let interest = balance * monthly_rate;
            let mut principal_part = monthly_payment - interest;
            // Rounding in the final period can push the balance below zero;
            // clamp the last principal slice to what is actually owed.
            if principal_part > balance {
                principal_part = balance;
            }
            balance -= principal_part;
            year_interest += interest;
            year_principal += principal_part;
        }

        let year_paid = year_interest + year_principal;
        total_payment += year_paid;
        total_interest += year_interest;

        years.push(YearlyAmortization {
            year,
            total_paid: year_paid,
            principal_paid: year_principal,
            interest_paid: year_interest,
            remaining_balance: balance,
        });
    }

    Ok(MortgageSchedule {
        loan_amount,
        monthly_payment,
        total_payment,
        total_interest,
        years,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Standard fixed-rate payment: P * r(1+r)^n / ((1+r)^n - 1).
/// Zero-rate loans amortise straight-line.
fn monthly_payment(loan_amount: Money, monthly_rate: Decimal, total_months: u32) -> Money {
    if loan_amount.is_zero() {
        return Decimal::ZERO;
    }
    if monthly_rate.is_zero() {
        return loan_amount / Decimal::from(total_months);
    }

    // (1 + r)^n via iterative multiplication
    let mut compound = Decimal::ONE;
    for _ in 0..total_months {
        compound *= Decimal::ONE + monthly_rate;
    }

    loan_amount * monthly_rate * compound / (compound - Decimal::ONE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
