//! Order status state machine.
//!
//! ```text
//! pending --cancel--> cancelled
//! pending --(fulfilment, outside this system)--> completed
//! ```
//!
//! `cancelled` and `completed` are terminal.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, awaiting fulfilment.
    #[default]
    Pending,
    /// Fulfilled.
    Completed,
    /// Cancelled by the customer or an admin.
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the order's total counts towards revenue.
    #[must_use]
    pub const fn counts_as_revenue(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Status after a cancel request.
    ///
    /// Returns `None` when the order is already terminal, in which case the
    /// cancel is a no-op.
    #[must_use]
    pub const fn cancel(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Cancelled),
            Self::Completed | Self::Cancelled => None,
        }
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
