// --- File: crates/appointly_common/src/models.rs ---

// Data structures shared by the collaborator implementations and the
// scheduling crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An interval during which a calendar owner is unavailable.
///
/// Half-open: `[start, end)`. A slot that ends exactly at `start`, or starts
/// exactly at `end`, does not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Strict intersection test against `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        !(end <= self.start || start >= self.end)
    }
}

/// Who a caller is, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable user id (Firebase `uid`).
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// The two parties of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Role::Buyer),
            "seller" => Ok(Role::Seller),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 5, h, m, 0).unwrap()
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let busy = BusyInterval::new(at(10, 0), at(10, 30));
        assert!(!busy.overlaps(at(9, 30), at(10, 0)));
        assert!(!busy.overlaps(at(10, 30), at(11, 0)));
        assert!(busy.overlaps(at(10, 0), at(10, 30)));
        assert!(busy.overlaps(at(9, 45), at(10, 15)));
        assert!(busy.overlaps(at(9, 0), at(12, 0)));
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!("seller".parse::<Role>(), Ok(Role::Seller));
        assert_eq!(Role::Buyer.to_string(), "buyer");
        assert!("admin".parse::<Role>().is_err());
    }
}
