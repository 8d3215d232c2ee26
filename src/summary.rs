use serde::Serialize;

use crate::classify::Verdict;
use crate::probe::ProbeOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Healthy,
    Degraded,
}

/// Reduction of one invocation's outcomes. Exists only for that invocation.
#[derive(Debug, Clone)]
pub struct HealthSummary {
    pub overall: OverallHealth,
    /// Input target order
    pub outcomes: Vec<ProbeOutcome>,
    pub healthy_count: usize,
    pub unhealthy_count: usize,
    pub errored_count: usize,
}

impl HealthSummary {
    /// Aggregate outcomes without reordering them.
    pub fn from_outcomes(outcomes: Vec<ProbeOutcome>) -> Self {
        let count = |verdict: Verdict| outcomes.iter().filter(|o| o.verdict == verdict).count();
        let healthy_count = count(Verdict::Healthy);
        let unhealthy_count = count(Verdict::Unhealthy);
        let errored_count = count(Verdict::Errored);

        let overall = if healthy_count == outcomes.len() {
            OverallHealth::Healthy
        } else {
            OverallHealth::Degraded
        };

        Self {
            overall,
            outcomes,
            healthy_count,
            unhealthy_count,
            errored_count,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall == OverallHealth::Healthy
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Short one-line description, e.g. `2/3 targets healthy (1 unhealthy, 0 errored)`
    pub fn headline(&self) -> String {
        format!(
            "{}/{} targets healthy ({} unhealthy, {} errored)",
            self.healthy_count,
            self.total(),
            self.unhealthy_count,
            self.errored_count
        )
    }
}
