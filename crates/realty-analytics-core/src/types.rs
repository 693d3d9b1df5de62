use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Rates expressed in percent units (8.5 = 8.5%). Fields carrying these
/// values are suffixed `_pct`.
pub type Percent = Decimal;

/// Current market state of one city+area pair, supplied by the
/// data-collection collaborator. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaSnapshot {
    pub city: String,
    pub area: String,
    /// Average listing price per square foot
    pub current_price_per_sqft: Money,
    /// Average total property price in the area
    pub current_avg_price: Money,
    /// Annualised historical price growth as a fraction (0.08 = 8%)
    pub historical_growth_rate: Rate,
    /// Non-negative infrastructure development signal, unbounded scale
    pub infrastructure_impact_score: Decimal,
    /// Date the snapshot was collected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
