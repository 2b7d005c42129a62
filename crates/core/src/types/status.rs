//! Status and classification enums.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// `Waiting` is the implicit initial state. The vendor moves the order through
/// the remaining labels; `Ready` is terminal for everything in scope here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Waiting,
    Accept,
    Reject,
    UnderProcess,
    Ready,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Waiting,
        Self::Accept,
        Self::Reject,
        Self::UnderProcess,
        Self::Ready,
    ];

    /// Whether the vendor may move an order from `self` to `next`.
    ///
    /// Vendors currently relabel orders freely, so every pair is allowed.
    /// Tightening the lifecycle means editing this table only.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (
                Self::Waiting | Self::Accept | Self::Reject | Self::UnderProcess | Self::Ready,
                Self::Waiting | Self::Accept | Self::Reject | Self::UnderProcess | Self::Ready,
            ) => true,
        }
    }

    /// Wire label, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
            Self::UnderProcess => "UNDER_PROCESS",
            Self::Ready => "READY",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Who an offer applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferType {
    /// Created by a vendor, visible to the vendors it references.
    Vendor,
    /// Created by the platform, visible to every requester.
    Generic,
}

/// Kind of account behind a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Vendor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Vendor => write!(f, "vendor"),
        }
    }
}
