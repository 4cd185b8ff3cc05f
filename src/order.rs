//! Order rows, their items, and the eager-loaded read model
use crate::product::Product;
use crate::status::OrderStatus;
use crate::types::{ItemId, Money, OrderId, ProductId, TimeStamp, UserId};

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Order {
    #[n(0)]
    pub id: OrderId,
    #[n(1)]
    pub user_id: UserId,
    #[n(2)]
    pub status: OrderStatus,
    #[n(3)]
    pub total_amount: Money, // sum of item lines at creation, never edited
    #[n(4)]
    pub created_at: TimeStamp,
    #[n(5)]
    pub updated_at: TimeStamp,
}

impl Order {
    /// A fresh pending order with a zero total.
    pub fn new(user_id: UserId) -> Self {
        let now = TimeStamp::new();
        Self {
            id: OrderId::new(),
            user_id,
            status: OrderStatus::Pending,
            total_amount: Money::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct OrderItem {
    #[n(0)]
    pub id: ItemId,
    #[n(1)]
    pub order_id: OrderId,
    #[n(2)]
    pub product_id: ProductId,
    #[n(3)]
    pub quantity: u32,
    #[n(4)]
    pub price: Money, // unit price at time of order
}

impl OrderItem {
    /// Snapshots the product's current price.
    pub fn new(order_id: OrderId, product: &Product, quantity: u32) -> Self {
        Self {
            id: ItemId::new(),
            order_id,
            product_id: product.id,
            quantity,
            price: product.price,
        }
    }

    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDetails {
    pub item: OrderItem,
    pub product: Product,
}

/// An order together with its items and each item's product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<LineDetails>,
}

impl OrderDetails {
    /// Recomputes the total from the stored item lines.
    pub fn items_total(&self) -> Option<Money> {
        self.items
            .iter()
            .try_fold(Money::ZERO, |total, line| {
                total.checked_add(line.item.line_total()?)
            })
    }
}
