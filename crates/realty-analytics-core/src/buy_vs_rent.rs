use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyAnalyticsError;
use crate::mortgage::{self, AmortizationInput};
use crate::types::{with_metadata, AreaSnapshot, ComputationOutput, Money, Percent};
use crate::RealtyAnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Financing and market assumptions for the comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyVsRentAssumptions {
    /// Horizons in years, compared in ascending order
    #[serde(default = "default_horizons")]
    pub horizons: Vec<u32>,
    #[serde(default = "default_down_payment_pct")]
    pub down_payment_pct: Percent,
    #[serde(default = "default_loan_interest_rate_pct")]
    pub loan_interest_rate_pct: Percent,
    #[serde(default = "default_loan_term_years")]
    pub loan_term_years: u32,
    #[serde(default = "default_rent_increase_pct")]
    pub annual_rent_increase_pct: Percent,
    /// Return assumed on the down payment if invested instead
    #[serde(default = "default_investment_return_pct")]
    pub investment_return_rate_pct: Percent,
}

fn default_horizons() -> Vec<u32> {
    vec![3, 5, 10, 15]
}

fn default_down_payment_pct() -> Percent {
    dec!(20)
}

fn default_loan_interest_rate_pct() -> Percent {
    dec!(7.5)
}

fn default_loan_term_years() -> u32 {
    20
}

fn default_rent_increase_pct() -> Percent {
    dec!(5)
}

fn default_investment_return_pct() -> Percent {
    dec!(8)
}

impl Default for BuyVsRentAssumptions {
    fn default() -> Self {
        BuyVsRentAssumptions {
            horizons: default_horizons(),
            down_payment_pct: default_down_payment_pct(),
            loan_interest_rate_pct: default_loan_interest_rate_pct(),
            loan_term_years: default_loan_term_years(),
            annual_rent_increase_pct: default_rent_increase_pct(),
            investment_return_rate_pct: default_investment_return_pct(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Rent,
}

/// First horizon at which buying pulls ahead of renting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakEven {
    Year(u32),
    BeyondHorizon,
}

/// Net-position comparison at one horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonComparison {
    pub years: u32,
    pub total_buying_cost: Money,
    pub equity_value: Money,
    pub total_rent_paid: Money,
    pub investment_value: Money,
    pub buy_advantage: Money,
    pub recommendation: Recommendation,
}

/// Full buy-vs-rent comparison for one area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyVsRentOutput {
    pub property_price: Money,
    pub monthly_rent: Money,
    pub annual_appreciation_pct: Percent,
    /// 0 when rent is zero
    pub price_to_rent_ratio: Decimal,
    pub horizons: Vec<HorizonComparison>,
    pub break_even: BreakEven,
    pub long_term_recommendation: Recommendation,
}

// Share of cumulative EMI treated as principal repayment when estimating
// equity. A deliberate model simplification kept for result parity; swapping
// in the exact schedule is a behaviour change, not a bug fix.
const PRINCIPAL_SHARE_OF_EMI: Decimal = dec!(0.7);

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare buying against renting-and-investing over the configured horizons.
/// Prices and appreciation come from the area snapshot; financing terms from
/// the assumptions.
pub fn compare(
    snapshot: &AreaSnapshot,
    monthly_rent: Money,
    assumptions: &BuyVsRentAssumptions,
) -> RealtyAnalyticsResult<ComputationOutput<BuyVsRentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if assumptions.horizons.is_empty() {
        return Err(RealtyAnalyticsError::invalid_input(
            "horizons",
            "At least one horizon year is required",
        ));
    }
    if assumptions.horizons.iter().any(|&y| y == 0) {
        return Err(RealtyAnalyticsError::invalid_input(
            "horizons",
            "Horizon years must be positive",
        ));
    }
    if monthly_rent < Decimal::ZERO {
        return Err(RealtyAnalyticsError::invalid_input(
            "monthly_rent",
            "Monthly rent must be non-negative",
        ));
    }

    let price = snapshot.current_avg_price;

    // One amortisation at the fixed loan term; the horizons only change how
    // long the EMI is assumed to run, not the loan itself.
    let schedule = mortgage::build_schedule(&AmortizationInput {
        principal: price,
        down_payment_pct: assumptions.down_payment_pct,
        annual_interest_rate_pct: assumptions.loan_interest_rate_pct,
        term_years: assumptions.loan_term_years,
    })?;
    let emi = schedule.monthly_payment;
    let loan_amount = schedule.loan_amount;
    let down_payment = price * (assumptions.down_payment_pct / dec!(100));

    let mut horizons = assumptions.horizons.clone();
    horizons.sort_unstable();

    if let Some(&max_horizon) = horizons.last() {
        if max_horizon > assumptions.loan_term_years {
            warnings.push(format!(
                "Horizon {max_horizon}y exceeds the {}y loan term; buying cost assumes the EMI keeps running",
                assumptions.loan_term_years
            ));
        }
    }

    let mut comparisons = Vec::with_capacity(horizons.len());
    let mut break_even = BreakEven::BeyondHorizon;

    for &years in &horizons {
        let total_buying_cost = down_payment + emi * dec!(12) * Decimal::from(years);

        let future_value = compound(price, snapshot.historical_growth_rate, years);

        // ~70% of cumulative EMI treated as principal repaid.
        let approx_principal_paid =
            Decimal::from(years) * dec!(12) * emi * PRINCIPAL_SHARE_OF_EMI;
        let equity_value = future_value - (loan_amount - approx_principal_paid);

        let mut total_rent_paid = Decimal::ZERO;
        let mut year_rent = monthly_rent * dec!(12);
        for _ in 0..years {
            total_rent_paid += year_rent;
            year_rent *= Decimal::ONE + assumptions.annual_rent_increase_pct / dec!(100);
        }

        let investment_value = compound(
            down_payment,
            assumptions.investment_return_rate_pct / dec!(100),
            years,
        );

        let buy_advantage =
            (equity_value - total_buying_cost) - (investment_value - total_rent_paid);

        let recommendation = if buy_advantage > Decimal::ZERO {
            Recommendation::Buy
        } else {
            Recommendation::Rent
        };

        if buy_advantage > Decimal::ZERO && break_even == BreakEven::BeyondHorizon {
            break_even = BreakEven::Year(years);
        }

        comparisons.push(HorizonComparison {
            years,
            total_buying_cost,
            equity_value,
            total_rent_paid,
            investment_value,
            buy_advantage,
            recommendation,
        });
    }

    let annual_rent = monthly_rent * dec!(12);
    let price_to_rent_ratio = if annual_rent.is_zero() {
        Decimal::ZERO
    } else {
        price / annual_rent
    };

    let long_term_recommendation = match break_even {
        BreakEven::Year(_) => Recommendation::Buy,
        BreakEven::BeyondHorizon => Recommendation::Rent,
    };

    let output = BuyVsRentOutput {
        property_price: price,
        monthly_rent,
        annual_appreciation_pct: snapshot.historical_growth_rate * dec!(100),
        price_to_rent_ratio,
        horizons: comparisons,
        break_even,
        long_term_recommendation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Buy vs Rent Comparison (multi-horizon net position)",
        &serde_json::json!({
            "city": snapshot.city,
            "area": snapshot.area,
            "monthly_rent": monthly_rent,
            "assumptions": assumptions,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// base * (1 + rate)^years with a fractional rate.
fn compound(base: Money, rate: Decimal, years: u32) -> Money {
    let mut value = base;
    for _ in 0..years {
        value *= Decimal::ONE + rate;
    }
    value
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
