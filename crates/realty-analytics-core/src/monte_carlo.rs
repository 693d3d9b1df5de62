use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use std::time::Instant;

use crate::error::RealtyAnalyticsError;
use crate::types::{ComputationMetadata, ComputationOutput};
use crate::RealtyAnalyticsResult;

// ---------------------------------------------------------------------------
// Helper: build ComputationOutput without requiring Decimal
// ---------------------------------------------------------------------------

fn with_metadata_f64<T: Serialize>(
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
            precision: "ieee754_f64".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Configuration for a leveraged property purchase simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub property_price: f64,
    pub monthly_rent: f64,
    /// Time horizon in years
    #[serde(default = "default_years")]
    pub years: u32,
    /// Number of independent trials
    #[serde(default = "default_simulation_count")]
    pub simulation_count: u32,
    /// Mean annual appreciation rate (%)
    #[serde(default = "default_appreciation_mean")]
    pub appreciation_mean_pct: f64,
    #[serde(default = "default_appreciation_std")]
    pub appreciation_std_pct: f64,
    /// Mean occupancy rate (%)
    #[serde(default = "default_occupancy_mean")]
    pub occupancy_mean_pct: f64,
    #[serde(default = "default_occupancy_std")]
    pub occupancy_std_pct: f64,
    /// Mean annual rent increase rate (%)
    #[serde(default = "default_rent_increase_mean")]
    pub rent_increase_mean_pct: f64,
    #[serde(default = "default_rent_increase_std")]
    pub rent_increase_std_pct: f64,
    /// Loan interest rate (%)
    #[serde(default = "default_interest_rate")]
    pub interest_rate_pct: f64,
    /// Loan as a percentage of property value
    #[serde(default = "default_loan_percentage")]
    pub loan_percentage: f64,
    /// Optional seed for reproducibility
    pub seed: Option<u64>,
}

fn default_years() -> u32 {
    10
}

fn default_simulation_count() -> u32 {
    1000
}

fn default_appreciation_mean() -> f64 {
    5.0
}

fn default_appreciation_std() -> f64 {
    3.0
}

fn default_occupancy_mean() -> f64 {
    95.0
}

fn default_occupancy_std() -> f64 {
    5.0
}

fn default_rent_increase_mean() -> f64 {
    5.0
}

fn default_rent_increase_std() -> f64 {
    2.0
}

fn default_interest_rate() -> f64 {
    8.5
}

fn default_loan_percentage() -> f64 {
    80.0
}

/// Terminal state of one simulated trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub final_property_value: f64,
    pub cumulative_cash_flow: f64,
    pub total_return: f64,
    /// Return on the down payment, in percent
    pub roi: f64,
    pub annualized_return: f64,
}

/// Full simulation output: the raw sample plus the derived averages the
/// presentation layer charts year by year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    /// Down payment (initial equity at risk)
    pub initial_investment: f64,
    pub total_property_cost: f64,
    pub loan_amount: f64,
    pub monthly_mortgage: f64,
    pub years: u32,
    pub trials: Vec<TrialOutcome>,
    pub mean_yearly_property_values: Vec<f64>,
    pub mean_yearly_cash_flows: Vec<f64>,
}

// Fixed-rate carrying costs, as percentages of current property value.
const PROPERTY_TAX_RATE_PCT: f64 = 1.5;
const MAINTENANCE_RATE_PCT: f64 = 1.0;
// Financing is modelled as a 30-year mortgage regardless of horizon.
const MORTGAGE_TERM_YEARS: u32 = 30;

// ---------------------------------------------------------------------------
// Random draws
// ---------------------------------------------------------------------------

/// Normal draw that degenerates to the mean when the deviation is zero
/// (statrs rejects non-positive sigma, and the no-noise path must be exactly
/// deterministic).
struct Gaussian {
    mean: f64,
    dist: Option<Normal>,
}

impl Gaussian {
    fn new(field: &str, mean: f64, std_dev: f64) -> RealtyAnalyticsResult<Self> {
        if std_dev < 0.0 {
            return Err(RealtyAnalyticsError::invalid_input(
                field,
                "Standard deviation must be non-negative",
            ));
        }
        let dist = if std_dev == 0.0 {
            None
        } else {
            Some(
                Normal::new(mean, std_dev).map_err(|e| {
                    RealtyAnalyticsError::invalid_input(field, format!("Invalid Normal parameters: {e}"))
                })?,
            )
        };
        Ok(Gaussian { mean, dist })
    }

    fn draw(&self, rng: &mut StdRng) -> f64 {
        match &self.dist {
            Some(dist) => rng.sample(*dist),
            None => self.mean,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `simulation_count` independent yearly-stepped trajectories of a
/// leveraged property purchase under randomised appreciation, occupancy and
/// rent-growth assumptions.
///
/// Trials are independent; with a fixed `seed` the whole sample is
/// reproducible. Downstream statistics do not depend on trial order.
pub fn run_simulation(
    input: &SimulationInput,
) -> RealtyAnalyticsResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // Validation
    if input.property_price <= 0.0 {
        return Err(RealtyAnalyticsError::invalid_input(
            "property_price",
            "Property price must be positive",
        ));
    }
    if input.monthly_rent < 0.0 {
        return Err(RealtyAnalyticsError::invalid_input(
            "monthly_rent",
            "Monthly rent must be non-negative",
        ));
    }
    if input.years == 0 {
        return Err(RealtyAnalyticsError::invalid_input(
            "years",
            "Horizon must be at least 1 year",
        ));
    }
    if input.simulation_count == 0 {
        return Err(RealtyAnalyticsError::invalid_input(
            "simulation_count",
            "At least one trial is required",
        ));
    }
    if !(0.0..=100.0).contains(&input.loan_percentage) {
        return Err(RealtyAnalyticsError::invalid_input(
            "loan_percentage",
            "Loan percentage must be between 0 and 100",
        ));
    }

    if input.simulation_count < 100 {
        warnings.push(format!(
            "{} trials is a small sample; percentile estimates will be noisy",
            input.simulation_count
        ));
    }
    if input.occupancy_mean_pct < 50.0 {
        warnings.push(format!(
            "Mean occupancy {}% is below 50% — verify market assumptions",
            input.occupancy_mean_pct
        ));
    }

    let appreciation = Gaussian::new(
        "appreciation",
        input.appreciation_mean_pct,
        input.appreciation_std_pct,
    )?;
    let occupancy = Gaussian::new("occupancy", input.occupancy_mean_pct, input.occupancy_std_pct)?;
    let rent_increase = Gaussian::new(
        "rent_increase",
        input.rent_increase_mean_pct,
        input.rent_increase_std_pct,
    )?;

    let mut rng = match input.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let down_payment = input.property_price * (1.0 - input.loan_percentage / 100.0);
    let loan_amount = input.property_price * (input.loan_percentage / 100.0);
    let monthly_mortgage = monthly_mortgage_payment(loan_amount, input.interest_rate_pct);
    let annual_mortgage = monthly_mortgage * 12.0;

    let trial_count = input.simulation_count as usize;
    let years = input.years as usize;

    let mut trials = Vec::with_capacity(trial_count);
    let mut yearly_value_sums = vec![0.0_f64; years];
    let mut yearly_cash_flow_sums = vec![0.0_f64; years];

    for _ in 0..trial_count {
        let mut value = input.property_price;
        let mut rent = input.monthly_rent;
        let mut cash_flow = -down_payment;

        for year in 0..years {
            let appreciation_rate = appreciation.draw(&mut rng);
            let occupancy_rate = occupancy.draw(&mut rng).clamp(0.0, 100.0);
            let rent_increase_rate = rent_increase.draw(&mut rng);

            value *= 1.0 + appreciation_rate / 100.0;
            rent *= 1.0 + rent_increase_rate / 100.0;

            let annual_income = rent * 12.0 * (occupancy_rate / 100.0);
            let annual_property_tax = value * (PROPERTY_TAX_RATE_PCT / 100.0);
            let annual_maintenance = value * (MAINTENANCE_RATE_PCT / 100.0);

            let annual_cash_flow =
                annual_income - annual_property_tax - annual_maintenance - annual_mortgage;
            cash_flow += annual_cash_flow;

            yearly_value_sums[year] += value;
            yearly_cash_flow_sums[year] += annual_cash_flow;
        }

        let total_return = value + cash_flow - input.property_price;
        // Full leverage leaves no equity at risk; ROI gets a 0 sentinel
        // rather than a division by zero.
        let roi = if down_payment > 0.0 {
            total_return / down_payment * 100.0
        } else {
            0.0
        };
        let annualized_return = annualize(roi, input.years);

        trials.push(TrialOutcome {
            final_property_value: value,
            cumulative_cash_flow: cash_flow,
            total_return,
            roi,
            annualized_return,
        });
    }

    let n = trial_count as f64;
    let mean_yearly_property_values: Vec<f64> =
        yearly_value_sums.iter().map(|s| s / n).collect();
    let mean_yearly_cash_flows: Vec<f64> =
        yearly_cash_flow_sums.iter().map(|s| s / n).collect();

    let output = SimulationOutput {
        initial_investment: down_payment,
        total_property_cost: input.property_price,
        loan_amount,
        monthly_mortgage,
        years: input.years,
        trials,
        mean_yearly_property_values,
        mean_yearly_cash_flows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Monte Carlo Property Investment Simulation",
        &serde_json::json!({
            "years": input.years,
            "simulation_count": input.simulation_count,
            "appreciation": [input.appreciation_mean_pct, input.appreciation_std_pct],
            "occupancy": [input.occupancy_mean_pct, input.occupancy_std_pct],
            "rent_increase": [input.rent_increase_mean_pct, input.rent_increase_std_pct],
            "interest_rate_pct": input.interest_rate_pct,
            "loan_percentage": input.loan_percentage,
            "seed": input.seed,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fixed-rate payment on a 30-year mortgage; zero when unleveraged.
fn monthly_mortgage_payment(loan_amount: f64, interest_rate_pct: f64) -> f64 {
    if loan_amount <= 0.0 {
        return 0.0;
    }
    let n = (MORTGAGE_TERM_YEARS * 12) as f64;
    let r = interest_rate_pct / (12.0 * 100.0);
    if r == 0.0 {
        return loan_amount / n;
    }
    let compound = (1.0 + r).powf(n);
    loan_amount * r * compound / (compound - 1.0)
}

/// ((1 + roi/100)^(1/years) - 1) * 100, capped at total loss when the ROI
/// drops below -100% (a fractional power of a negative base is undefined).
fn annualize(roi_pct: f64, years: u32) -> f64 {
    let base = 1.0 + roi_pct / 100.0;
    if base <= 0.0 {
        return -100.0;
    }
    (base.powf(1.0 / years as f64) - 1.0) * 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
