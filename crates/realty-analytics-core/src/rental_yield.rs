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

/// Input for rental yield analysis of a single property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalYieldInput {
    pub property_price: Money,
    pub monthly_rent: Money,
    /// Expected occupancy in percent
    #[serde(default = "default_occupancy_pct")]
    pub occupancy_rate_pct: Percent,
    /// Annual maintenance as a percentage of property value
    #[serde(default = "default_maintenance_pct")]
    pub maintenance_pct: Percent,
    /// Annual property tax as a percentage of property value
    #[serde(default = "default_property_tax_pct")]
    pub property_tax_pct: Percent,
    /// Assumed annual capital appreciation in percent
    #[serde(default = "default_appreciation_pct")]
    pub appreciation_rate_pct: Percent,
    /// Marginal tax bracket applied to rental income
    #[serde(default = "default_tax_rate_pct")]
    pub tax_rate_pct: Percent,
}

fn default_occupancy_pct() -> Percent {
    dec!(95)
}

fn default_maintenance_pct() -> Percent {
    dec!(1.0)
}

fn default_property_tax_pct() -> Percent {
    dec!(1.5)
}

fn default_appreciation_pct() -> Percent {
    dec!(5)
}

fn default_tax_rate_pct() -> Percent {
    dec!(30)
}

/// Rental yield profile for one property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalYieldProfile {
    pub property_price: Money,
    pub monthly_rent: Money,
    pub annual_rent: Money,
    /// Annual rent adjusted for expected occupancy
    pub effective_annual_rent: Money,
    /// Maintenance plus property tax
    pub annual_expenses: Money,
    pub net_annual_income: Money,
    pub gross_yield_pct: Percent,
    pub net_yield_pct: Percent,
    pub after_tax_yield_pct: Percent,
    /// Price divided by annual rent; 0 when rent is zero
    pub price_to_rent_ratio: Decimal,
    /// Property value compounded five years forward
    pub future_value_5yr: Money,
    pub potential_appreciation: Money,
    pub tax_amount: Money,
    pub occupancy_rate_pct: Percent,
}

// Standard deduction on rental income before tax.
const STANDARD_DEDUCTION: Decimal = dec!(0.30);

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyse rental yield for a property: gross, net and after-tax yields,
/// price-to-rent ratio and the five-year appreciation outlook.
pub fn analyze(
    input: &RentalYieldInput,
) -> RealtyAnalyticsResult<ComputationOutput<RentalYieldProfile>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let profile = build_profile(input)?;

    // Residential yields typically land between 2% and 5%; values outside
    // that band are valid but worth a second look at the inputs.
    if profile.gross_yield_pct < dec!(2) || profile.gross_yield_pct > dec!(5) {
        warnings.push(format!(
            "Gross yield {:.2}% is outside the typical 2-5% residential band",
            profile.gross_yield_pct
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rental Yield Analysis",
        input,
        warnings,
        elapsed,
        profile,
    ))
}

pub(crate) fn build_profile(
    input: &RentalYieldInput,
) -> RealtyAnalyticsResult<RentalYieldProfile> {
    if input.property_price <= Decimal::ZERO {
        return Err(RealtyAnalyticsError::invalid_input(
            "property_price",
            "Property price must be positive",
        ));
    }
    if input.monthly_rent < Decimal::ZERO {
        return Err(RealtyAnalyticsError::invalid_input(
            "monthly_rent",
            "Monthly rent must be non-negative",
        ));
    }
    if input.occupancy_rate_pct < Decimal::ZERO || input.occupancy_rate_pct > dec!(100) {
        return Err(RealtyAnalyticsError::invalid_input(
            "occupancy_rate_pct",
            "Occupancy must be between 0 and 100 percent",
        ));
    }

    let annual_rent = input.monthly_rent * dec!(12);
    let effective_annual_rent = annual_rent * (input.occupancy_rate_pct / dec!(100));

    let annual_maintenance = input.property_price * (input.maintenance_pct / dec!(100));
    let annual_property_tax = input.property_price * (input.property_tax_pct / dec!(100));
    let annual_expenses = annual_maintenance + annual_property_tax;

    let net_annual_income = effective_annual_rent - annual_expenses;
    let gross_yield_pct = annual_rent / input.property_price * dec!(100);
    let net_yield_pct = net_annual_income / input.property_price * dec!(100);

    // Zero rent is a legitimate degenerate state (vacant or owner-occupied);
    // the ratio gets a 0 sentinel rather than an error.
    let price_to_rent_ratio = if annual_rent.is_zero() {
        Decimal::ZERO
    } else {
        input.property_price / annual_rent
    };

    // Taxable income after the standard deduction; negative net income
    // carries through unchanged, mirroring the deterministic model.
    let taxable_income = net_annual_income * (Decimal::ONE - STANDARD_DEDUCTION);
    let tax_amount = taxable_income * (input.tax_rate_pct / dec!(100));
    let after_tax_yield_pct =
        (net_annual_income - tax_amount) / input.property_price * dec!(100);

    let mut future_value_5yr = input.property_price;
    for _ in 0..5 {
        future_value_5yr *= Decimal::ONE + input.appreciation_rate_pct / dec!(100);
    }

    Ok(RentalYieldProfile {
        property_price: input.property_price,
        monthly_rent: input.monthly_rent,
        annual_rent,
        effective_annual_rent,
        annual_expenses,
        net_annual_income,
        gross_yield_pct,
        net_yield_pct,
        after_tax_yield_pct,
        price_to_rent_ratio,
        future_value_5yr,
        potential_appreciation: future_value_5yr - input.property_price,
        tax_amount,
        occupancy_rate_pct: input.occupancy_rate_pct,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> RentalYieldInput {
        RentalYieldInput {
            property_price: dec!(7500000),
            monthly_rent: dec!(25000),
            occupancy_rate_pct: dec!(95),
            maintenance_pct: dec!(1.0),
            property_tax_pct: dec!(1.5),
            appreciation_rate_pct: dec!(5),
            tax_rate_pct: dec!(30),
        }
    }

    #[test]
    fn test_gross_yield() {
        let profile = build_profile(&sample_input()).unwrap();
        // 300,000 / 7,500,000 * 100 = 4%
        assert_eq!(profile.gross_yield_pct, dec!(4));
    }

    #[test]
    fn test_net_income_components() {
        let profile = build_profile(&sample_input()).unwrap();
        // effective rent = 300,000 * 0.95 = 285,000
        assert_eq!(profile.effective_annual_rent, dec!(285000));
        // expenses = 75,000 + 112,500 = 187,500
        assert_eq!(profile.annual_expenses, dec!(187500));
        assert_eq!(profile.net_annual_income, dec!(97500));
    }

    #[test]
    fn test_after_tax_yield() {
        let profile = build_profile(&sample_input()).unwrap();
        // taxable = 97,500 * 0.7 = 68,250; tax = 20,475
        assert_eq!(profile.tax_amount, dec!(20475.000));
        let expected = (dec!(97500) - dec!(20475)) / dec!(7500000) * dec!(100);
        assert_eq!(profile.after_tax_yield_pct, expected);
    }

    #[test]
    fn test_price_to_rent_ratio() {
        let profile = build_profile(&sample_input()).unwrap();
        assert_eq!(profile.price_to_rent_ratio, dec!(25));
    }

    #[test]
    fn test_zero_rent_sentinel() {
        let mut input = sample_input();
        input.monthly_rent = Decimal::ZERO;
        let profile = build_profile(&input).unwrap();
        assert_eq!(profile.price_to_rent_ratio, Decimal::ZERO);
        assert_eq!(profile.gross_yield_pct, Decimal::ZERO);
    }

    #[test]
    fn test_future_value_compounds() {
        let profile = build_profile(&sample_input()).unwrap();
        // 7.5M * 1.05^5 ~ 9,572,111
        assert!(
            (profile.future_value_5yr - dec!(9572111)).abs() < dec!(1),
            "future_value={}",
            profile.future_value_5yr
        );
        assert_eq!(
            profile.potential_appreciation,
            profile.future_value_5yr - dec!(7500000)
        );
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let mut input = sample_input();
        input.property_price = Decimal::ZERO;
        assert!(build_profile(&input).is_err());
    }

    #[test]
    fn test_occupancy_out_of_range_rejected() {
        let mut input = sample_input();
        input.occupancy_rate_pct = dec!(120);
        assert!(build_profile(&input).is_err());
    }

    #[test]
    fn test_atypical_yield_warns() {
        let mut input = sample_input();
        input.monthly_rent = dec!(100000); // 16% gross yield
        let output = analyze(&input).unwrap();
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("outside the typical")));
    }
}
