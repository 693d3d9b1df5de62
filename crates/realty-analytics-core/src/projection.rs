use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyAnalyticsError;
use crate::types::{with_metadata, AreaSnapshot, ComputationOutput, Money, Percent, Rate};
use crate::RealtyAnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// ROI projection for a single area. Value object: recomputed on demand and
/// never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiProjection {
    /// Projected annual price growth as a fraction
    pub projected_annual_growth: Rate,
    pub roi_3yr_percent: Percent,
    pub roi_5yr_percent: Percent,
    pub roi_10yr_percent: Percent,
    /// 1-10 heuristic combining price level and growth; higher = riskier
    pub risk_score: Decimal,
}

/// A projection tagged with its origin, used for cross-area ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaProjection {
    pub city: String,
    pub area: String,
    pub current_price_per_sqft: Money,
    pub projection: RoiProjection,
}

// Growth blend: 70% trailing growth, 10% of the normalised infrastructure
// signal. The remaining 20% is unmodelled headroom. Downstream consumers
// depend on these exact weights.
const GROWTH_WEIGHT: Decimal = dec!(0.7);
const INFRA_WEIGHT: Decimal = dec!(0.1);

const RISK_SCALE: Decimal = dec!(5);
const MIN_RISK: Decimal = dec!(1);
const MAX_RISK: Decimal = dec!(10);

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project ROI for a single area against the infrastructure maximum of its
/// comparison group. Pure function: identical inputs yield identical outputs.
pub fn project_area(
    snapshot: &AreaSnapshot,
    group_max_infra: Decimal,
) -> RealtyAnalyticsResult<RoiProjection> {
    if snapshot.current_price_per_sqft <= Decimal::ZERO {
        return Err(RealtyAnalyticsError::invalid_input(
            "current_price_per_sqft",
            "Price per square foot must be positive",
        ));
    }
    if snapshot.infrastructure_impact_score < Decimal::ZERO {
        return Err(RealtyAnalyticsError::invalid_input(
            "infrastructure_impact_score",
            "Infrastructure impact score must be non-negative",
        ));
    }

    // A group with no infrastructure signal at all is a legitimate degenerate
    // state: the normalised impact is 0, not an error.
    let normalized_impact = if group_max_infra > Decimal::ZERO {
        snapshot.infrastructure_impact_score / group_max_infra
    } else {
        Decimal::ZERO
    };

    let projected_annual_growth =
        snapshot.historical_growth_rate * GROWTH_WEIGHT + normalized_impact * INFRA_WEIGHT;

    let roi_3yr_percent = roi_percent(projected_annual_growth, 3);
    let roi_5yr_percent = roi_percent(projected_annual_growth, 5);
    let roi_10yr_percent = roi_percent(projected_annual_growth, 10);

    // Risk heuristic: expensive areas with weak trailing growth score riskier.
    let risk_denominator = snapshot.historical_growth_rate * dec!(10) + dec!(0.5);
    if risk_denominator <= Decimal::ZERO {
        return Err(RealtyAnalyticsError::invalid_input(
            "historical_growth_rate",
            "Growth rate makes the risk denominator non-positive",
        ));
    }
    let risk_raw = (snapshot.current_price_per_sqft / dec!(10000)) / risk_denominator;
    let risk_score = (risk_raw * RISK_SCALE).clamp(MIN_RISK, MAX_RISK);

    Ok(RoiProjection {
        projected_annual_growth,
        roi_3yr_percent,
        roi_5yr_percent,
        roi_10yr_percent,
        risk_score,
    })
}

/// Project ROI for a whole comparison group. The infrastructure maximum is
/// taken across the supplied snapshots, so the normalisation base is the
/// group itself.
pub fn project_group(
    snapshots: &[AreaSnapshot],
) -> RealtyAnalyticsResult<ComputationOutput<Vec<AreaProjection>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if snapshots.is_empty() {
        return Err(RealtyAnalyticsError::invalid_input(
            "snapshots",
            "At least one area snapshot is required",
        ));
    }

    let group_max_infra = snapshots
        .iter()
        .map(|s| s.infrastructure_impact_score)
        .fold(Decimal::ZERO, |a, b| a.max(b));

    if group_max_infra.is_zero() {
        warnings.push(
            "All infrastructure impact scores are zero; projections use trailing growth only"
                .into(),
        );
    }

    let mut projections = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        if snapshot.historical_growth_rate > dec!(0.25) {
            warnings.push(format!(
                "{}/{}: historical growth above 25% per year — verify source data",
                snapshot.city, snapshot.area
            ));
        }
        let projection = project_area(snapshot, group_max_infra)?;
        projections.push(AreaProjection {
            city: snapshot.city.clone(),
            area: snapshot.area.clone(),
            current_price_per_sqft: snapshot.current_price_per_sqft,
            projection,
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Area ROI Projection (trailing growth + infrastructure blend)",
        &serde_json::json!({
            "area_count": snapshots.len(),
            "group_max_infrastructure_score": group_max_infra,
            "growth_weight": GROWTH_WEIGHT,
            "infrastructure_weight": INFRA_WEIGHT,
        }),
        warnings,
        elapsed,
        projections,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// ((1 + g)^years - 1) * 100, compounded by iterative multiplication.
fn roi_percent(growth: Rate, years: u32) -> Percent {
    let mut factor = Decimal::ONE;
    for _ in 0..years {
        factor *= Decimal::ONE + growth;
    }
    (factor - Decimal::ONE) * dec!(100)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
