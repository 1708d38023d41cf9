// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Monthly budget evaluation.
//!
//! A ceiling that is absent, zero or negative means "no ceiling": remaining
//! budget and utilization are then both reported as exactly zero. Overspend
//! shows up as utilization above 100%, never as a negative remainder.

use kompas_config::model::BudgetConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::money::{round_cents, Amount};

/// Utilization at which a warning is logged.
const WARN_FRACTION: f64 = 0.8;

/// Outcome of comparing a month's spend with the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub ceiling_eur: Option<f64>,
    pub remaining_eur: f64,
    pub utilization_pct: f64,
    pub over_budget: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetEvaluator {
    ceiling: Option<Amount>,
}

impl BudgetEvaluator {
    pub fn new(monthly_limit_eur: Option<f64>) -> Self {
        let ceiling = monthly_limit_eur
            .filter(|limit| limit.is_finite() && *limit > 0.0)
            .map(Amount::from_f64)
            .filter(|amount| *amount > Amount::ZERO);
        Self { ceiling }
    }

    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(config.ceiling())
    }

    pub fn ceiling_eur(&self) -> Option<f64> {
        self.ceiling.map(Amount::rounded)
    }

    /// `max(0, ceiling - spent)` rounded to cents; zero without a ceiling.
    pub fn remaining(&self, spent: Amount) -> f64 {
        match self.ceiling {
            Some(ceiling) => ceiling.saturating_sub(spent).rounded(),
            None => 0.0,
        }
    }

    /// Spend as a percentage of the ceiling; zero without a ceiling.
    pub fn utilization_pct(&self, spent: Amount) -> f64 {
        match self.ceiling {
            Some(ceiling) => round_cents(spent.to_f64() / ceiling.to_f64() * 100.0),
            None => 0.0,
        }
    }

    pub fn evaluate(&self, spent: Amount) -> BudgetStatus {
        let status = BudgetStatus {
            ceiling_eur: self.ceiling_eur(),
            remaining_eur: self.remaining(spent),
            utilization_pct: self.utilization_pct(spent),
            over_budget: self.ceiling.is_some_and(|ceiling| spent > ceiling),
        };

        if let Some(ceiling) = self.ceiling {
            if status.over_budget {
                warn!(
                    spent_eur = spent.rounded(),
                    ceiling_eur = ceiling.rounded(),
                    "monthly budget exceeded"
                );
            } else if spent.to_f64() >= ceiling.to_f64() * WARN_FRACTION {
                warn!(
                    spent_eur = spent.rounded(),
                    ceiling_eur = ceiling.rounded(),
                    "approaching monthly budget ceiling (80%+)"
                );
            }
        }

        status
    }
}

/// Remaining budget for a float spend against an optional ceiling.
pub fn remaining(spent_eur: f64, ceiling_eur: Option<f64>) -> f64 {
    BudgetEvaluator::new(ceiling_eur).remaining(Amount::from_f64(spent_eur))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn no_ceiling_means_zero() {
        assert_eq!(remaining(12.0, None), 0.0);
        assert_eq!(remaining(12.0, Some(0.0)), 0.0);
        assert_eq!(remaining(12.0, Some(-5.0)), 0.0);
        let evaluator = BudgetEvaluator::new(None);
        assert_eq!(evaluator.utilization_pct(Amount::from_f64(3.0)), 0.0);
        assert_eq!(evaluator.ceiling_eur(), None);
    }

    #[test]
    fn remaining_is_rounded_and_clamped() {
        assert_eq!(remaining(12.345, Some(50.0)), 37.66);
        assert_eq!(remaining(50.0, Some(50.0)), 0.0);
        assert_eq!(remaining(75.0, Some(50.0)), 0.0);
    }

    #[test]
    fn overspend_shows_in_utilization() {
        let status = BudgetEvaluator::new(Some(20.0)).evaluate(Amount::from_f64(30.0));
        assert_eq!(status.remaining_eur, 0.0);
        assert_eq!(status.utilization_pct, 150.0);
        assert!(status.over_budget);
    }

    #[test]
    fn from_config_ignores_non_positive_limit() {
        let config = BudgetConfig {
            monthly_limit_eur: Some(0.0),
        };
        assert_eq!(BudgetEvaluator::from_config(&config), BudgetEvaluator::default());
    }

    #[test]
    #[traced_test]
    fn warns_when_close_to_ceiling() {
        BudgetEvaluator::new(Some(10.0)).evaluate(Amount::from_f64(8.5));
        assert!(logs_contain("approaching monthly budget ceiling"));
    }

    #[test]
    #[traced_test]
    fn warns_when_exceeded() {
        BudgetEvaluator::new(Some(10.0)).evaluate(Amount::from_f64(10.01));
        assert!(logs_contain("monthly budget exceeded"));
    }
}
