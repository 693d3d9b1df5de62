use std::cmp::Ordering;
use std::time::Instant;

use crate::error::RealtyAnalyticsError;
use crate::projection::AreaProjection;
use crate::types::{with_metadata, ComputationOutput};
use crate::RealtyAnalyticsResult;

#[cfg(feature = "simulation")]
use crate::monte_carlo::TrialOutcome;
#[cfg(feature = "simulation")]
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Percentiles
// ---------------------------------------------------------------------------

/// Percentile with linear interpolation between closest ranks, over an
/// already-sorted slice. Matches the numpy default.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

// ---------------------------------------------------------------------------
// Top-K selection
// ---------------------------------------------------------------------------

/// Stable top-k: sort by the comparator, keep the first `k`. Ties keep their
/// input order.
pub fn top_k<T: Clone, F>(items: &[T], k: usize, mut cmp: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut sorted: Vec<T> = items.to_vec();
    sorted.sort_by(|a, b| cmp(a, b));
    sorted.truncate(k);
    sorted
}

/// Rank areas for investment: highest 5-year ROI first, then lowest risk,
/// then area and city name so equal projections order deterministically.
pub fn rank_top_areas(
    projections: &[AreaProjection],
    k: usize,
) -> RealtyAnalyticsResult<ComputationOutput<Vec<AreaProjection>>> {
    let start = Instant::now();

    if projections.is_empty() {
        return Err(RealtyAnalyticsError::invalid_input(
            "projections",
            "At least one area projection is required",
        ));
    }
    if k == 0 {
        return Err(RealtyAnalyticsError::invalid_input(
            "k",
            "Ranking size must be at least 1",
        ));
    }

    let ranked = top_k(projections, k, |a, b| {
        b.projection
            .roi_5yr_percent
            .cmp(&a.projection.roi_5yr_percent)
            .then_with(|| a.projection.risk_score.cmp(&b.projection.risk_score))
            .then_with(|| a.area.cmp(&b.area))
            .then_with(|| a.city.cmp(&b.city))
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Top-K Area Ranking (5-year ROI, risk tie-break)",
        &serde_json::json!({
            "candidate_count": projections.len(),
            "k": k,
        }),
        Vec::new(),
        elapsed,
        ranked,
    ))
}

// ---------------------------------------------------------------------------
// Simulation sample statistics
// ---------------------------------------------------------------------------

/// Probability that the ROI meets or exceeds a threshold.
#[cfg(feature = "simulation")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdProbability {
    pub roi_threshold_pct: f64,
    pub probability_pct: f64,
}

/// Aggregate statistics over a Monte Carlo sample.
#[cfg(feature = "simulation")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStats {
    pub mean_roi_pct: f64,
    pub median_roi_pct: f64,
    pub p10_roi_pct: f64,
    pub p90_roi_pct: f64,
    /// 5th percentile of ROI. Sign is preserved: a negative value means the
    /// worst 5% of outcomes lose money.
    pub var_95_roi_pct: f64,
    /// Share of trials with ROI below zero
    pub loss_probability_pct: f64,
    pub roi_threshold_probabilities: Vec<ThresholdProbability>,
    pub mean_final_value: f64,
    pub median_final_value: f64,
    pub p10_final_value: f64,
    pub p90_final_value: f64,
    pub mean_annualized_return_pct: f64,
}

#[cfg(feature = "simulation")]
const ROI_THRESHOLDS_PCT: [f64; 3] = [20.0, 50.0, 100.0];

/// Summarise a simulation sample. Order-independent: any permutation of the
/// trials produces the same statistics.
#[cfg(feature = "simulation")]
pub fn summarize(trials: &[TrialOutcome]) -> RealtyAnalyticsResult<SimulationStats> {
    if trials.is_empty() {
        return Err(RealtyAnalyticsError::invalid_input(
            "trials",
            "At least one trial is required",
        ));
    }

    let n = trials.len() as f64;

    let mut rois: Vec<f64> = trials.iter().map(|t| t.roi).collect();
    rois.sort_by(|a, b| a.total_cmp(b));
    let mut values: Vec<f64> = trials.iter().map(|t| t.final_property_value).collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let mean_roi_pct = rois.iter().sum::<f64>() / n;
    let mean_final_value = values.iter().sum::<f64>() / n;
    let mean_annualized_return_pct =
        trials.iter().map(|t| t.annualized_return).sum::<f64>() / n;

    let loss_count = rois.iter().filter(|r| **r < 0.0).count();

    let roi_threshold_probabilities = ROI_THRESHOLDS_PCT
        .iter()
        .map(|threshold| {
            let hits = rois.iter().filter(|r| **r >= *threshold).count();
            ThresholdProbability {
                roi_threshold_pct: *threshold,
                probability_pct: hits as f64 / n * 100.0,
            }
        })
        .collect();

    Ok(SimulationStats {
        mean_roi_pct,
        median_roi_pct: percentile_sorted(&rois, 50.0),
        p10_roi_pct: percentile_sorted(&rois, 10.0),
        p90_roi_pct: percentile_sorted(&rois, 90.0),
        var_95_roi_pct: percentile_sorted(&rois, 5.0),
        loss_probability_pct: loss_count as f64 / n * 100.0,
        roi_threshold_probabilities,
        mean_final_value,
        median_final_value: percentile_sorted(&values, 50.0),
        p10_final_value: percentile_sorted(&values, 10.0),
        p90_final_value: percentile_sorted(&values, 90.0),
        mean_annualized_return_pct,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::RoiProjection;
    use rust_decimal_macros::dec;

    fn area(city: &str, name: &str, roi_5yr: rust_decimal::Decimal, risk: rust_decimal::Decimal) -> AreaProjection {
        AreaProjection {
            city: city.into(),
            area: name.into(),
            current_price_per_sqft: dec!(8000),
            projection: RoiProjection {
                projected_annual_growth: dec!(0.1),
                roi_3yr_percent: dec!(30),
                roi_5yr_percent: roi_5yr,
                roi_10yr_percent: dec!(150),
                risk_score: risk,
            },
        }
    }

    #[test]
    fn test_percentile_median_even_sample() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_sorted(&sorted, 50.0), 2.5);
    }

    #[test]
    fn test_percentile_interpolates() {
        // rank = 0.05 * 4 = 0.2 between 10 and 20
        let sorted = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert!((percentile_sorted(&sorted, 5.0) - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_endpoints() {
        let sorted = [10.0, 20.0, 30.0];
        assert_eq!(percentile_sorted(&sorted, 0.0), 10.0);
        assert_eq!(percentile_sorted(&sorted, 100.0), 30.0);
    }

    #[test]
    fn test_percentile_single_element() {
        assert_eq!(percentile_sorted(&[7.0], 90.0), 7.0);
    }

    #[test]
    fn test_top_k_truncates_and_sorts() {
        let items = [3, 1, 4, 1, 5, 9, 2, 6];
        let top = top_k(&items, 3, |a, b| b.cmp(a));
        assert_eq!(top, vec![9, 6, 5]);
    }

    #[test]
    fn test_top_k_larger_than_input() {
        let items = [2, 1];
        let top = top_k(&items, 10, |a, b| a.cmp(b));
        assert_eq!(top, vec![1, 2]);
    }

    #[test]
    fn test_rank_orders_by_roi_descending() {
        let areas = vec![
            area("Pune", "Baner", dec!(80), dec!(3)),
            area("Pune", "Aundh", dec!(120), dec!(5)),
            area("Pune", "Hinjewadi", dec!(100), dec!(2)),
        ];
        let output = rank_top_areas(&areas, 3).unwrap();
        let names: Vec<&str> = output.result.iter().map(|a| a.area.as_str()).collect();
        assert_eq!(names, vec!["Aundh", "Hinjewadi", "Baner"]);
    }

    #[test]
    fn test_rank_breaks_roi_ties_by_lower_risk() {
        let areas = vec![
            area("Pune", "Baner", dec!(100), dec!(6)),
            area("Pune", "Aundh", dec!(100), dec!(2)),
        ];
        let output = rank_top_areas(&areas, 2).unwrap();
        assert_eq!(output.result[0].area, "Aundh");
    }

    #[test]
    fn test_rank_truncates_to_k() {
        let areas = vec![
            area("Pune", "Baner", dec!(80), dec!(3)),
            area("Pune", "Aundh", dec!(120), dec!(5)),
        ];
        let output = rank_top_areas(&areas, 1).unwrap();
        assert_eq!(output.result.len(), 1);
        assert_eq!(output.result[0].area, "Aundh");
    }

    #[test]
    fn test_rank_rejects_empty_input() {
        assert!(rank_top_areas(&[], 3).is_err());
    }

    #[test]
    fn test_rank_rejects_zero_k() {
        let areas = vec![area("Pune", "Baner", dec!(80), dec!(3))];
        assert!(rank_top_areas(&areas, 0).is_err());
    }

    #[cfg(feature = "simulation")]
    mod simulation {
        use super::*;

        fn trial(roi: f64, final_value: f64) -> TrialOutcome {
            TrialOutcome {
                final_property_value: final_value,
                cumulative_cash_flow: 0.0,
                total_return: 0.0,
                roi,
                annualized_return: roi / 10.0,
            }
        }

        #[test]
        fn test_summary_basic_moments() {
            let trials: Vec<TrialOutcome> = (1..=5)
                .map(|i| trial(i as f64 * 10.0, i as f64 * 1_000_000.0))
                .collect();
            let stats = summarize(&trials).unwrap();
            assert_eq!(stats.mean_roi_pct, 30.0);
            assert_eq!(stats.median_roi_pct, 30.0);
            assert_eq!(stats.mean_final_value, 3_000_000.0);
        }

        #[test]
        fn test_percentile_ordering_invariant() {
            let trials: Vec<TrialOutcome> = (0..100)
                .map(|i| trial(i as f64, 1_000_000.0 + i as f64))
                .collect();
            let stats = summarize(&trials).unwrap();
            assert!(stats.p10_roi_pct <= stats.median_roi_pct);
            assert!(stats.median_roi_pct <= stats.p90_roi_pct);
            assert!(stats.var_95_roi_pct <= stats.p10_roi_pct);
        }

        #[test]
        fn test_var_preserves_sign_on_losing_sample() {
            let trials: Vec<TrialOutcome> =
                (0..20).map(|i| trial(-50.0 + i as f64, 500_000.0)).collect();
            let stats = summarize(&trials).unwrap();
            assert!(stats.var_95_roi_pct < 0.0);
        }

        #[test]
        fn test_loss_probability() {
            let mut trials: Vec<TrialOutcome> =
                (0..8).map(|_| trial(10.0, 1_000_000.0)).collect();
            trials.push(trial(-5.0, 900_000.0));
            trials.push(trial(-1.0, 950_000.0));
            let stats = summarize(&trials).unwrap();
            assert_eq!(stats.loss_probability_pct, 20.0);
        }

        #[test]
        fn test_threshold_probabilities_inclusive() {
            let trials = vec![trial(20.0, 1.0), trial(50.0, 1.0), trial(100.0, 1.0), trial(10.0, 1.0)];
            let stats = summarize(&trials).unwrap();
            // >= comparison: 20 counts at the 20 threshold.
            assert_eq!(stats.roi_threshold_probabilities[0].probability_pct, 75.0);
            assert_eq!(stats.roi_threshold_probabilities[1].probability_pct, 50.0);
            assert_eq!(stats.roi_threshold_probabilities[2].probability_pct, 25.0);
        }

        #[test]
        fn test_order_independence() {
            let forward: Vec<TrialOutcome> =
                (0..50).map(|i| trial(i as f64, i as f64 * 1000.0)).collect();
            let mut reversed = forward.clone();
            reversed.reverse();
            let a = summarize(&forward).unwrap();
            let b = summarize(&reversed).unwrap();
            assert_eq!(a.mean_roi_pct, b.mean_roi_pct);
            assert_eq!(a.var_95_roi_pct, b.var_95_roi_pct);
            assert_eq!(a.p90_final_value, b.p90_final_value);
        }

        #[test]
        fn test_empty_sample_rejected() {
            assert!(summarize(&[]).is_err());
        }
    }
}
