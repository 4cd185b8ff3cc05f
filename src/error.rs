use crate::status::OrderStatus;
use crate::types::{OrderId, ProductId};

/// A requested quantity that exceeds what a product has on hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub product_id: ProductId,
    pub product_name: String,
    pub requested: u32,
    pub available: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum OrderError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),
    #[error("Product {0} is no longer available")]
    ProductInactive(ProductId),
    #[error("Insufficient stock for {} product(s)", .0.len())]
    InsufficientStock(Vec<Shortfall>),
    #[error("Stock for product {0} would overflow")]
    StockOverflow(ProductId),
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} is {status}; only pending orders can be cancelled")]
    InvalidState {
        order_id: OrderId,
        status: OrderStatus,
    },
    #[error("Invalid status transition: {0}")]
    InvalidTransition(#[from] TransitionError),
    #[error("Admin privileges required")]
    Forbidden,
    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Coarse tag for an [`OrderError`], stable enough for a transport layer to
/// map onto response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Internal,
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::Validation(_)
            | OrderError::InsufficientStock(_)
            | OrderError::InvalidTransition(_) => ErrorKind::Validation,
            OrderError::ProductNotFound(_) | OrderError::OrderNotFound(_) => ErrorKind::NotFound,
            OrderError::ProductInactive(_)
            | OrderError::StockOverflow(_)
            | OrderError::InvalidState { .. } => ErrorKind::Conflict,
            OrderError::Forbidden => ErrorKind::Forbidden,
            OrderError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// The shortfall list carried by an `InsufficientStock` error.
    pub fn shortfalls(&self) -> Option<&[Shortfall]> {
        match self {
            OrderError::InsufficientStock(shortfalls) => Some(shortfalls),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid status {0:?}: must be one of [pending, processing, shipped, delivered, cancelled]")]
    UnknownStatus(String),
    #[error("cannot change status of a cancelled order")]
    FromCancelled,
    #[error("cannot change status of a delivered order")]
    FromDelivered,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Sled(#[from] sled::Error),
    #[error("failed to decode row: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("failed to encode row: {0}")]
    Encode(String),
    #[error("index entry points at missing order {0}")]
    DanglingIndex(OrderId),
    #[error("malformed key of {0} bytes")]
    MalformedKey(usize),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("malformed id {input:?}: {reason}")]
    Malformed { input: String, reason: String },
    #[error("expected an id with prefix {expected:?}, found {found:?}")]
    WrongPrefix { expected: String, found: String },
    #[error("id payload must be 16 bytes, got {0}")]
    Length(usize),
    #[error("failed to encode id: {0}")]
    Encode(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid amount {0:?}: expected units with at most two decimal places")]
pub struct ParseMoneyError(pub String);

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: String, value: String },
    #[error("{0} must not be empty")]
    Empty(String),
    #[error("failed to load .env: {0}")]
    DotEnv(#[from] dotenvy::Error),
}
