//! Scenario Projector Module
//! Projects aggregate cost under percentage adjustments to cost and volume.

use serde::Serialize;

/// Project a base cost under independent cost and volume adjustments.
///
/// Pure arithmetic; keeping the adjustments inside a sane range is the
/// caller's concern.
pub fn project_cost(base_cost_total: f64, cost_adjust_pct: f64, volume_adjust_pct: f64) -> f64 {
    base_cost_total * (1.0 + cost_adjust_pct / 100.0) * (1.0 + volume_adjust_pct / 100.0)
}

/// Projected totals for one what-if request.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScenarioOutcome {
    pub base_cost_total: f64,
    pub projected_cost_total: f64,
    pub delta: f64,
    /// Delta relative to the base, 0 when the base itself is 0.
    pub delta_pct: f64,
}

impl ScenarioOutcome {
    /// Evaluate a scenario into report-ready totals.
    pub fn evaluate(base_cost_total: f64, cost_adjust_pct: f64, volume_adjust_pct: f64) -> Self {
        let projected_cost_total =
            project_cost(base_cost_total, cost_adjust_pct, volume_adjust_pct);
        let delta = projected_cost_total - base_cost_total;
        let delta_pct = if base_cost_total != 0.0 {
            delta / base_cost_total * 100.0
        } else {
            0.0
        };

        Self {
            base_cost_total,
            projected_cost_total,
            delta,
            delta_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_adjustments_compound() {
        let projected = project_cost(1000.0, 10.0, 20.0);
        assert!((projected - 1320.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_adjustments_return_base() {
        assert_eq!(project_cost(1234.5, 0.0, 0.0), 1234.5);
    }

    #[test]
    fn test_negative_adjustments_reduce_cost() {
        let projected = project_cost(1000.0, -10.0, 0.0);
        assert!((projected - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_outcome_carries_deltas() {
        let outcome = ScenarioOutcome::evaluate(1000.0, 10.0, 20.0);

        assert!((outcome.projected_cost_total - 1320.0).abs() < 1e-9);
        assert!((outcome.delta - 320.0).abs() < 1e-9);
        assert!((outcome.delta_pct - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_base_has_zero_delta_pct() {
        let outcome = ScenarioOutcome::evaluate(0.0, 50.0, 50.0);

        assert_eq!(outcome.projected_cost_total, 0.0);
        assert_eq!(outcome.delta_pct, 0.0);
    }
}
