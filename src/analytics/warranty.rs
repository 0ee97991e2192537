//! Warranty status relative to a reference date

use chrono::NaiveDate;
use serde::Serialize;

/// Where an item's warranty stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WarrantyStatus {
    /// No expiry date recorded
    None,
    Active { days_left: i64 },
    /// Expires within the warning window (today included)
    ExpiringSoon { days_left: i64 },
    Expired { days_ago: i64 },
}

impl WarrantyStatus {
    /// Classify an expiry date
    pub fn classify(expires: Option<NaiveDate>, as_of: NaiveDate, warning_days: i64) -> Self {
        let Some(expires) = expires else {
            return WarrantyStatus::None;
        };

        let days_left = (expires - as_of).num_days();
        if days_left < 0 {
            WarrantyStatus::Expired {
                days_ago: -days_left,
            }
        } else if days_left <= warning_days.max(0) {
            WarrantyStatus::ExpiringSoon { days_left }
        } else {
            WarrantyStatus::Active { days_left }
        }
    }

    /// Worth surfacing in a dashboard
    pub fn needs_attention(&self) -> bool {
        matches!(self, WarrantyStatus::ExpiringSoon { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            WarrantyStatus::None => "none",
            WarrantyStatus::Active { .. } => "active",
            WarrantyStatus::ExpiringSoon { .. } => "expiring",
            WarrantyStatus::Expired { .. } => "expired",
        }
    }
}

impl std::fmt::Display for WarrantyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarrantyStatus::None => write!(f, "-"),
            WarrantyStatus::Active { days_left } => write!(f, "active ({}d left)", days_left),
            WarrantyStatus::ExpiringSoon { days_left: 0 } => write!(f, "expires today"),
            WarrantyStatus::ExpiringSoon { days_left } => {
                write!(f, "expiring in {}d", days_left)
            }
            WarrantyStatus::Expired { days_ago } => write!(f, "expired {}d ago", days_ago),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_boundaries() {
        let today = day(10);
        assert_eq!(
            WarrantyStatus::classify(Some(day(10)), today, 30),
            WarrantyStatus::ExpiringSoon { days_left: 0 }
        );
        assert_eq!(
            WarrantyStatus::classify(Some(day(9)), today, 30),
            WarrantyStatus::Expired { days_ago: 1 }
        );
        assert_eq!(
            WarrantyStatus::classify(Some(day(20)), today, 10),
            WarrantyStatus::ExpiringSoon { days_left: 10 }
        );
        assert_eq!(
            WarrantyStatus::classify(Some(day(21)), today, 10),
            WarrantyStatus::Active { days_left: 11 }
        );
    }

    #[test]
    fn test_no_date() {
        let status = WarrantyStatus::classify(None, day(1), 30);
        assert_eq!(status, WarrantyStatus::None);
        assert!(!status.needs_attention());
        assert_eq!(status.to_string(), "-");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            WarrantyStatus::ExpiringSoon { days_left: 0 }.to_string(),
            "expires today"
        );
        assert_eq!(
            WarrantyStatus::Expired { days_ago: 3 }.to_string(),
            "expired 3d ago"
        );
    }
}
