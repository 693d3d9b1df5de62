use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyAnalyticsError;
use crate::mortgage::{self, AmortizationInput};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::RealtyAnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for the with-loan vs without-loan tax comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxOptimizationInput {
    pub property_price: Money,
    pub monthly_rent: Money,
    #[serde(default = "default_interest_rate_pct")]
    pub interest_rate_pct: Percent,
    /// Loan as a percentage of property value; must stay below 100 so the
    /// equity denominator is positive
    #[serde(default = "default_loan_pct")]
    pub loan_pct: Percent,
    #[serde(default = "default_loan_term_years")]
    pub loan_term_years: u32,
    #[serde(default = "default_tax_rate_pct")]
    pub tax_rate_pct: Percent,
    #[serde(default = "default_standard_deduction_pct")]
    pub standard_deduction_pct: Percent,
    #[serde(default = "default_property_tax_pct")]
    pub property_tax_pct: Percent,
    #[serde(default = "default_insurance_pct")]
    pub insurance_pct: Percent,
}

fn default_interest_rate_pct() -> Percent {
    dec!(8.5)
}

fn default_loan_pct() -> Percent {
    dec!(80)
}

fn default_loan_term_years() -> u32 {
    20
}

fn default_tax_rate_pct() -> Percent {
    dec!(30)
}

fn default_standard_deduction_pct() -> Percent {
    dec!(30)
}

fn default_property_tax_pct() -> Percent {
    dec!(1.5)
}

fn default_insurance_pct() -> Percent {
    dec!(0.5)
}

/// Taxable income, liability and leveraged-vs-unleveraged ROI under both
/// ownership structures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxComparison {
    pub property_price: Money,
    pub loan_amount: Money,
    pub emi: Money,
    /// Flat first-year interest: loan * rate. A deliberate simplification,
    /// not the amortised first-year figure.
    pub annual_interest: Money,
    pub annual_rent: Money,
    pub standard_deduction: Money,
    pub property_tax: Money,
    pub insurance: Money,
    pub taxable_income_without_loan: Money,
    pub taxable_income_with_loan: Money,
    pub tax_without_loan: Money,
    pub tax_with_loan: Money,
    pub tax_savings: Money,
    pub net_income_without_loan: Money,
    pub net_income_with_loan: Money,
    pub roi_without_loan_pct: Percent,
    /// Denominator is equity invested (price - loan), reflecting leveraged ROI
    pub roi_with_loan_pct: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare the tax position of a rental property held with and without loan
/// financing.
pub fn optimize(
    input: &TaxOptimizationInput,
) -> RealtyAnalyticsResult<ComputationOutput<TaxComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.property_price <= Decimal::ZERO {
        return Err(RealtyAnalyticsError::invalid_input(
            "property_price",
            "Property price must be positive",
        ));
    }
    if input.loan_pct < Decimal::ZERO || input.loan_pct >= dec!(100) {
        return Err(RealtyAnalyticsError::invalid_input(
            "loan_pct",
            "Loan percentage must be in [0, 100)",
        ));
    }
    if input.monthly_rent < Decimal::ZERO {
        return Err(RealtyAnalyticsError::invalid_input(
            "monthly_rent",
            "Monthly rent must be non-negative",
        ));
    }

    if input.loan_pct > dec!(90) {
        warnings.push(format!(
            "Loan percentage {}% is above 90% — high leverage",
            input.loan_pct
        ));
    }

    // The amortiser supplies the loan amount and EMI.
    let schedule = mortgage::build_schedule(&AmortizationInput {
        principal: input.property_price,
        down_payment_pct: dec!(100) - input.loan_pct,
        annual_interest_rate_pct: input.interest_rate_pct,
        term_years: input.loan_term_years,
    })?;
    let loan_amount = schedule.loan_amount;
    let emi = schedule.monthly_payment;

    // Flat first-year interest rather than the amortised figure.
    let annual_interest = loan_amount * input.interest_rate_pct / dec!(100);

    let annual_rent = input.monthly_rent * dec!(12);
    let standard_deduction = annual_rent * (input.standard_deduction_pct / dec!(100));
    let property_tax = input.property_price * (input.property_tax_pct / dec!(100));
    let insurance = input.property_price * (input.insurance_pct / dec!(100));

    let base_deductions = standard_deduction + property_tax + insurance;
    let taxable_income_without_loan = (annual_rent - base_deductions).max(Decimal::ZERO);
    let taxable_income_with_loan =
        (annual_rent - base_deductions - annual_interest).max(Decimal::ZERO);

    let tax_rate = input.tax_rate_pct / dec!(100);
    let tax_without_loan = taxable_income_without_loan * tax_rate;
    let tax_with_loan = taxable_income_with_loan * tax_rate;
    let tax_savings = tax_without_loan - tax_with_loan;

    let net_income_without_loan = annual_rent - base_deductions - tax_without_loan;
    let net_income_with_loan =
        annual_rent - base_deductions - annual_interest - tax_with_loan;

    let roi_without_loan_pct = net_income_without_loan / input.property_price * dec!(100);
    // Equity invested, not full price: loan_pct < 100 keeps this positive.
    let equity = input.property_price - loan_amount;
    let roi_with_loan_pct = net_income_with_loan / equity * dec!(100);

    let output = TaxComparison {
        property_price: input.property_price,
        loan_amount,
        emi,
        annual_interest,
        annual_rent,
        standard_deduction,
        property_tax,
        insurance,
        taxable_income_without_loan,
        taxable_income_with_loan,
        tax_without_loan,
        tax_with_loan,
        tax_savings,
        net_income_without_loan,
        net_income_with_loan,
        roi_without_loan_pct,
        roi_with_loan_pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rental Property Tax Optimisation (with-loan vs without-loan)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
