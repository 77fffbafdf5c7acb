//! Profile settings record.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::KeibalogError;
use super::rounding::RoundingRule;

/// How odds are entered for new tickets, stored as a raw `i16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OddsInputMode {
    Manual,
    OddsBased,
}

impl OddsInputMode {
    pub fn from_raw(raw: i16) -> Option<Self> {
        match raw {
            0 => Some(OddsInputMode::Manual),
            1 => Some(OddsInputMode::OddsBased),
            _ => None,
        }
    }

    pub fn raw(self) -> i16 {
        match self {
            OddsInputMode::Manual => 0,
            OddsInputMode::OddsBased => 1,
        }
    }
}

/// The single settings record. At most one profile is meaningful at a time;
/// its absence means no balance can be computed (callers get default or
/// empty output, never an error).
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    /// Starting balance for both the Actual and the combined scenario.
    pub initial_balance: i64,
    /// Day of month, 1 through 31.
    pub payday: Option<u32>,
    /// Informational only; not consumed by the aggregation engine.
    pub monthly_free_budget: i64,
    pub odds_mode: i16,
    pub rounding_rule: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(initial_balance: i64, now: DateTime<Utc>) -> Self {
        Profile {
            id: Uuid::new_v4(),
            initial_balance,
            payday: None,
            monthly_free_budget: 0,
            odds_mode: OddsInputMode::Manual.raw(),
            rounding_rule: RoundingRule::Nearest.raw(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Typed view of the rounding selector, falling back to `Nearest` for
    /// unknown raw values.
    pub fn rounding(&self) -> RoundingRule {
        RoundingRule::from_raw(self.rounding_rule).unwrap_or(RoundingRule::Nearest)
    }

    /// Typed view of the odds input mode, falling back to `Manual`.
    pub fn odds_input(&self) -> OddsInputMode {
        OddsInputMode::from_raw(self.odds_mode).unwrap_or(OddsInputMode::Manual)
    }

    pub fn validate(&self) -> Result<(), KeibalogError> {
        if self.initial_balance < 0 {
            return Err(KeibalogError::ProfileInvalid {
                field: "initial_balance".into(),
                reason: "must be zero or greater".into(),
            });
        }
        if self.monthly_free_budget < 0 {
            return Err(KeibalogError::ProfileInvalid {
                field: "monthly_free_budget".into(),
                reason: "must be zero or greater".into(),
            });
        }
        if let Some(payday) = self.payday {
            if !(1..=31).contains(&payday) {
                return Err(KeibalogError::ProfileInvalid {
                    field: "payday".into(),
                    reason: "must be between 1 and 31".into(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_profile() -> Profile {
        Profile::new(100_000, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn new_profile_defaults() {
        let p = sample_profile();
        assert_eq!(p.initial_balance, 100_000);
        assert_eq!(p.payday, None);
        assert_eq!(p.monthly_free_budget, 0);
        assert_eq!(p.rounding(), RoundingRule::Nearest);
        assert_eq!(p.odds_input(), OddsInputMode::Manual);
    }

    #[test]
    fn unknown_raw_selectors_fall_back() {
        let mut p = sample_profile();
        p.rounding_rule = 9;
        p.odds_mode = -3;
        assert_eq!(p.rounding(), RoundingRule::Nearest);
        assert_eq!(p.odds_input(), OddsInputMode::Manual);
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(sample_profile().validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_initial_balance() {
        let mut p = sample_profile();
        p.initial_balance = -1;
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_budget() {
        let mut p = sample_profile();
        p.monthly_free_budget = -500;
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_payday_bounds() {
        let mut p = sample_profile();
        p.payday = Some(1);
        assert!(p.validate().is_ok());
        p.payday = Some(31);
        assert!(p.validate().is_ok());
        p.payday = Some(0);
        assert!(p.validate().is_err());
        p.payday = Some(32);
        assert!(p.validate().is_err());
    }
}
