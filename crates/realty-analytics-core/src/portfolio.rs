use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::rental_yield::{self, RentalYieldInput};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::RealtyAnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One property held in a portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioProperty {
    pub city: String,
    #[serde(default = "default_property_type")]
    pub property_type: String,
    pub price: Money,
    pub monthly_rent: Money,
    #[serde(default = "default_occupancy_pct")]
    pub occupancy_rate_pct: Percent,
}

fn default_property_type() -> String {
    "Residential".to_string()
}

fn default_occupancy_pct() -> Percent {
    dec!(95)
}

/// Per-property yield figures carried into the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyAnalysis {
    pub city: String,
    pub property_type: String,
    pub price: Money,
    pub monthly_rent: Money,
    pub gross_yield_pct: Percent,
    pub net_yield_pct: Percent,
    pub net_annual_income: Money,
    pub price_to_rent_ratio: Decimal,
}

/// Portfolio roll-up: totals, value-weighted yield and composition by city
/// and property type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub property_count: usize,
    pub total_value: Money,
    pub total_monthly_income: Money,
    pub total_annual_income: Money,
    /// Net yield weighted by property value
    pub average_net_yield_pct: Percent,
    /// Share of total value held in each city, in percent
    pub city_distribution_pct: BTreeMap<String, Percent>,
    /// Share of total value held in each property type, in percent
    pub type_distribution_pct: BTreeMap<String, Percent>,
    pub properties: Vec<PropertyAnalysis>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Aggregate a property portfolio. An empty portfolio is a valid degenerate
/// state and produces a zeroed summary rather than an error.
pub fn analyze_portfolio(
    properties: &[PortfolioProperty],
) -> RealtyAnalyticsResult<ComputationOutput<PortfolioSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut analyses = Vec::with_capacity(properties.len());
    let mut total_value = Decimal::ZERO;
    let mut total_monthly_income = Decimal::ZERO;
    let mut total_net_income = Decimal::ZERO;
    let mut city_values: BTreeMap<String, Money> = BTreeMap::new();
    let mut type_values: BTreeMap<String, Money> = BTreeMap::new();

    for property in properties {
        let profile = rental_yield::build_profile(&RentalYieldInput {
            property_price: property.price,
            monthly_rent: property.monthly_rent,
            occupancy_rate_pct: property.occupancy_rate_pct,
            maintenance_pct: dec!(1.0),
            property_tax_pct: dec!(1.5),
            appreciation_rate_pct: dec!(5),
            tax_rate_pct: dec!(30),
        })?;

        if profile.net_annual_income < Decimal::ZERO {
            warnings.push(format!(
                "{} ({}): expenses exceed effective rent",
                property.city, property.property_type
            ));
        }

        total_value += property.price;
        total_monthly_income += property.monthly_rent;
        total_net_income += profile.net_annual_income;
        *city_values.entry(property.city.clone()).or_default() += property.price;
        *type_values
            .entry(property.property_type.clone())
            .or_default() += property.price;

        analyses.push(PropertyAnalysis {
            city: property.city.clone(),
            property_type: property.property_type.clone(),
            price: property.price,
            monthly_rent: property.monthly_rent,
            gross_yield_pct: profile.gross_yield_pct,
            net_yield_pct: profile.net_yield_pct,
            net_annual_income: profile.net_annual_income,
            price_to_rent_ratio: profile.price_to_rent_ratio,
        });
    }

    // Value weighting reduces to total net income over total value.
    let average_net_yield_pct = if total_value > Decimal::ZERO {
        total_net_income / total_value * dec!(100)
    } else {
        Decimal::ZERO
    };

    let to_distribution = |values: BTreeMap<String, Money>| -> BTreeMap<String, Percent> {
        values
            .into_iter()
            .map(|(key, value)| (key, value / total_value * dec!(100)))
            .collect()
    };
    let (city_distribution_pct, type_distribution_pct) = if total_value > Decimal::ZERO {
        (to_distribution(city_values), to_distribution(type_values))
    } else {
        (BTreeMap::new(), BTreeMap::new())
    };

    let summary = PortfolioSummary {
        property_count: properties.len(),
        total_value,
        total_monthly_income,
        total_annual_income: total_monthly_income * dec!(12),
        average_net_yield_pct,
        city_distribution_pct,
        type_distribution_pct,
        properties: analyses,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio Aggregation (value-weighted yield, composition)",
        &serde_json::json!({ "property_count": properties.len() }),
        warnings,
        elapsed,
        summary,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
