//! Order placement, cancellation and status workflow for a storefront.
//!
//! [`workflow::OrderWorkflow`] writes, [`query::OrderQueryService`] reads,
//! both over a shared [`store::Store`].

pub mod auth;
pub mod config;
pub mod error;
pub mod ledger;
pub mod order;
pub mod product;
pub mod query;
pub mod status;
pub mod store;
pub mod types;
pub mod utils;
pub mod workflow;

pub use auth::{Principal, Role};
pub use error::{ErrorKind, OrderError, Shortfall, TransitionError};
pub use order::{Order, OrderDetails, OrderItem, OrderLine};
pub use product::{NewProduct, Product};
pub use query::{OrderQueryService, Page, PageRequest};
pub use status::OrderStatus;
pub use store::Store;
pub use types::{ItemId, Money, OrderId, ProductId, TimeStamp, UserId};
pub use workflow::OrderWorkflow;
