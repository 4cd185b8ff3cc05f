//! Catalog rows as the order workflow sees them
use crate::error::OrderError;
use crate::types::{Money, ProductId, TimeStamp};

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Product {
    #[n(0)]
    pub id: ProductId,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub description: String,
    #[n(3)]
    pub price: Money,
    #[n(4)]
    pub stock: u32, // only moved by the stock ledger
    #[n(5)]
    pub is_active: bool, // soft delete, rows are never removed
    #[n(6)]
    pub created_at: TimeStamp,
    #[n(7)]
    pub updated_at: TimeStamp,
}

// Used for constructing catalog entries before they are stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProduct {
    name: String,
    description: String,
    price: Money,
    stock: u32,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        Self {
            name: name.into(),
            price,
            ..Self::default()
        }
    }
    pub fn set_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
    pub fn set_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Checks the fields and assigns an id and timestamps.
    pub fn finalise(self) -> Result<Product, OrderError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(OrderError::Validation("product name is required".into()));
        }
        if self.price == Money::ZERO {
            return Err(OrderError::Validation(
                "product price must be greater than zero".into(),
            ));
        }

        let now = TimeStamp::new();
        Ok(Product {
            id: ProductId::new(),
            name: name.to_owned(),
            description: self.description,
            price: self.price,
            stock: self.stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}
