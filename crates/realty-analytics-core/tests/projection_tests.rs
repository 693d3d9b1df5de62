use pretty_assertions::assert_eq;
use realty_analytics_core::projection::{project_area, project_group};
use realty_analytics_core::stats::rank_top_areas;
use realty_analytics_core::types::AreaSnapshot;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn snapshot(
    city: &str,
    area: &str,
    price_per_sqft: Decimal,
    growth: Decimal,
    infra: Decimal,
) -> AreaSnapshot {
    AreaSnapshot {
        city: city.into(),
        area: area.into(),
        current_price_per_sqft: price_per_sqft,
        current_avg_price: price_per_sqft * dec!(1200),
        historical_growth_rate: growth,
        infrastructure_impact_score: infra,
        as_of: None,
    }
}

fn bangalore_group() -> Vec<AreaSnapshot> {
    vec![
        snapshot("Bangalore", "Whitefield", dec!(8000), dec!(0.10), dec!(4.0)),
        snapshot("Bangalore", "Indiranagar", dec!(14000), dec!(0.06), dec!(2.5)),
        snapshot("Bangalore", "Sarjapur", dec!(6500), dec!(0.12), dec!(3.0)),
        snapshot("Bangalore", "Hebbal", dec!(9000), dec!(0.08), dec!(0.0)),
    ]
}

// ===========================================================================
// Group projection
// ===========================================================================

#[test]
fn test_group_projects_every_area() {
    let output = project_group(&bangalore_group()).unwrap();
    assert_eq!(output.result.len(), 4);
    let areas: Vec<&str> = output.result.iter().map(|a| a.area.as_str()).collect();
    assert_eq!(areas, vec!["Whitefield", "Indiranagar", "Sarjapur", "Hebbal"]);
}

#[test]
fn test_group_normalisation_reference_values() {
    let output = project_group(&bangalore_group()).unwrap();

    // Whitefield holds the infrastructure max (4.0):
    // 0.10 * 0.7 + 1.0 * 0.1 = 0.17
    assert_eq!(
        output.result[0].projection.projected_annual_growth,
        dec!(0.17)
    );
    // Sarjapur: 0.12 * 0.7 + (3.0/4.0) * 0.1 = 0.084 + 0.075 = 0.159
    assert_eq!(
        output.result[2].projection.projected_annual_growth,
        dec!(0.159)
    );
    // Hebbal has no infrastructure signal: 0.08 * 0.7 = 0.056
    assert_eq!(
        output.result[3].projection.projected_annual_growth,
        dec!(0.056)
    );
}

#[test]
fn test_group_matches_single_area_calls() {
    let group = bangalore_group();
    let output = project_group(&group).unwrap();
    for (snapshot, projected) in group.iter().zip(output.result.iter()) {
        let direct = project_area(snapshot, dec!(4.0)).unwrap();
        assert_eq!(direct, projected.projection);
    }
}

#[test]
fn test_risk_scores_stay_in_band() {
    let output = project_group(&bangalore_group()).unwrap();
    for area in &output.result {
        assert!(area.projection.risk_score >= dec!(1));
        assert!(area.projection.risk_score <= dec!(10));
    }
}

#[test]
fn test_expensive_slow_area_scores_riskier() {
    let output = project_group(&bangalore_group()).unwrap();
    let whitefield = &output.result[0].projection;
    let indiranagar = &output.result[1].projection;
    // Indiranagar: pricier per sqft with weaker trailing growth.
    assert!(indiranagar.risk_score > whitefield.risk_score);
}

#[test]
fn test_single_area_group_normalises_to_itself() {
    let output = project_group(&bangalore_group()[..1]).unwrap();
    // Alone in the group, Whitefield's impact normalises to 1.0.
    assert_eq!(
        output.result[0].projection.projected_annual_growth,
        dec!(0.17)
    );
}

// ===========================================================================
// Projection into ranking
// ===========================================================================

#[test]
fn test_projection_feeds_ranking() {
    let projections = project_group(&bangalore_group()).unwrap().result;
    let ranked = rank_top_areas(&projections, 2).unwrap();

    assert_eq!(ranked.result.len(), 2);
    // Whitefield projects 0.17 growth, Sarjapur 0.159; both beat the rest.
    assert_eq!(ranked.result[0].area, "Whitefield");
    assert_eq!(ranked.result[1].area, "Sarjapur");
    assert!(
        ranked.result[0].projection.roi_5yr_percent
            >= ranked.result[1].projection.roi_5yr_percent
    );
}

#[test]
fn test_ranking_k_above_group_size_returns_all() {
    let projections = project_group(&bangalore_group()).unwrap().result;
    let ranked = rank_top_areas(&projections, 50).unwrap();
    assert_eq!(ranked.result.len(), 4);
}

// ===========================================================================
// Envelope
// ===========================================================================

#[test]
fn test_envelope_carries_metadata() {
    let output = project_group(&bangalore_group()).unwrap();
    assert_eq!(output.metadata.precision, "rust_decimal_128bit");
    assert!(!output.methodology.is_empty());
    assert!(output.assumptions.get("area_count").is_some());
}

#[test]
fn test_bad_snapshot_fails_whole_group() {
    let mut group = bangalore_group();
    group[2].current_price_per_sqft = Decimal::ZERO;
    assert!(project_group(&group).is_err());
}
