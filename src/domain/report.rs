//! Report projections derived from the balance series.

use chrono::NaiveDate;

use super::balance;
use super::profile::Profile;
use super::race::Race;

/// Month-over-month totals and deltas for one month bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySummary {
    /// First day of the month.
    pub month: NaiveDate,
    pub actual_total: i64,
    pub combined_total: i64,
    pub actual_change: i64,
    pub combined_change: i64,
}

impl MonthlySummary {
    pub fn difference(&self) -> i64 {
        self.combined_total - self.actual_total
    }
}

/// Cumulative totals against the initial balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeSummary {
    pub initial_balance: i64,
    pub actual_total: i64,
    pub combined_total: i64,
}

impl CumulativeSummary {
    pub fn actual_change(&self) -> i64 {
        self.actual_total - self.initial_balance
    }

    pub fn combined_change(&self) -> i64 {
        self.combined_total - self.initial_balance
    }

    pub fn difference(&self) -> i64 {
        self.combined_total - self.actual_total
    }
}

/// Presentation-ready projection: monthly summaries ordered most recent
/// first, plus the cumulative summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportProjection {
    pub monthly: Vec<MonthlySummary>,
    pub cumulative: Option<CumulativeSummary>,
}

impl ReportProjection {
    /// Compute the projection. Without a profile both parts are empty;
    /// absence is not an error.
    pub fn compute(races: &[Race], profile: Option<&Profile>) -> Self {
        let Some(profile) = profile else {
            return ReportProjection {
                monthly: Vec::new(),
                cumulative: None,
            };
        };

        let monthly_points = balance::monthly_series(races, profile);
        let summary = balance::summarize(races, Some(profile), profile.initial_balance);
        let cumulative = CumulativeSummary {
            initial_balance: profile.initial_balance,
            actual_total: summary.final_actual,
            combined_total: summary.final_combined,
        };

        let mut monthly = Vec::with_capacity(monthly_points.len());
        let mut prev_actual = profile.initial_balance;
        let mut prev_combined = profile.initial_balance;
        for point in &monthly_points {
            monthly.push(MonthlySummary {
                month: point.date,
                actual_total: point.actual_balance,
                combined_total: point.combined_balance,
                actual_change: point.actual_balance - prev_actual,
                combined_change: point.combined_balance - prev_combined,
            });
            prev_actual = point.actual_balance;
            prev_combined = point.combined_balance;
        }
        monthly.sort_by(|a, b| b.month.cmp(&a.month));

        ReportProjection {
            monthly,
            cumulative: Some(cumulative),
        }
    }
}
