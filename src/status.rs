//! Order lifecycle states and the rules for moving between them
use crate::error::TransitionError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, minicbor::Encode, minicbor::Decode)]
pub enum OrderStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Processing,
    #[n(2)]
    Shipped,
    #[n(3)]
    Delivered,
    #[n(4)]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether `text` names one of the five order statuses.
    pub fn is_valid(text: &str) -> bool {
        text.parse::<OrderStatus>().is_ok()
    }

    /// Checks whether an order currently in `self` may move to `requested`.
    ///
    /// Any non-terminal status may move to any valid status, stages may be
    /// skipped and the same status may be re-applied. Only the terminal
    /// states are locked.
    pub fn validate_transition(self, requested: &str) -> Result<OrderStatus, TransitionError> {
        let next: OrderStatus = requested.parse()?;

        match self {
            OrderStatus::Cancelled => Err(TransitionError::FromCancelled),
            OrderStatus::Delivered => Err(TransitionError::FromDelivered),
            _ => Ok(next),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TransitionError::UnknownStatus(s.to_owned()))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
