//! sled backed row storage.
//!
//! Each table lives in its own tree and every row is CBOR encoded:
//!
//! | tree          | key                | value         |
//! |---------------|--------------------|---------------|
//! | `products`    | product id         | [`Product`]   |
//! | `orders`      | order id           | [`Order`]     |
//! | `order_items` | order id ‖ item id | [`OrderItem`] |
//! | `user_orders` | user id ‖ order id | empty         |
//!
//! Ids are uuid7 bytes, so a prefix scan over `order_items` or `user_orders`
//! yields rows in creation order.
//!
//! Writes that must land together go through [`Store::transaction`], which
//! hands the closure a [`StoreTx`]. Returning an error from the closure rolls
//! back every write made through it. sled may run the closure more than once
//! when it detects a conflicting writer, so it must not touch outside state.
use crate::config::Config;
use crate::error::{OrderError, StoreError};
use crate::order::{LineDetails, Order, OrderDetails, OrderItem};
use crate::product::{NewProduct, Product};
use crate::types::{Money, OrderId, ProductId, TimeStamp, UserId};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::{Db, Transactional, Tree};
use std::sync::Arc;
use tracing::debug;

const PRODUCTS: &str = "products";
const ORDERS: &str = "orders";
const ORDER_ITEMS: &str = "order_items";
const USER_ORDERS: &str = "user_orders";

pub struct Store {
    instance: Arc<Db>,
    products: Tree,
    orders: Tree,
    order_items: Tree,
    user_orders: Tree,
}

impl Store {
    pub fn new(instance: Arc<Db>) -> Result<Self, StoreError> {
        Ok(Self {
            products: instance.open_tree(PRODUCTS)?,
            orders: instance.open_tree(ORDERS)?,
            order_items: instance.open_tree(ORDER_ITEMS)?,
            user_orders: instance.open_tree(USER_ORDERS)?,
            instance,
        })
    }

    pub fn open(config: &Config) -> Result<Self, StoreError> {
        let db = config.sled_config().open()?;
        debug!(path = %config.db_path.display(), "opened store");
        Self::new(Arc::new(db))
    }

    /// A store that lives only as long as this process.
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::new(Arc::new(db))
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.instance.flush()?;
        Ok(())
    }

    pub fn insert_product(&self, new: NewProduct) -> Result<Product, OrderError> {
        let product = new.finalise()?;
        self.products
            .insert(product.id.key(), encode(&product)?)
            .map_err(StoreError::from)?;
        debug!(product_id = %product.id, stock = product.stock, "product added");
        Ok(product)
    }

    pub fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.products
            .get(id.key())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Changes the catalog price. Existing orders keep the price they were
    /// placed at.
    pub fn reprice_product(&self, id: ProductId, price: Money) -> Result<Product, OrderError> {
        if price == Money::ZERO {
            return Err(OrderError::Validation(
                "product price must be greater than zero".into(),
            ));
        }
        self.update_product(id, |product| product.price = price)
    }

    pub fn set_product_active(&self, id: ProductId, active: bool) -> Result<Product, OrderError> {
        self.update_product(id, |product| product.is_active = active)
    }

    fn update_product<F>(&self, id: ProductId, change: F) -> Result<Product, OrderError>
    where
        F: Fn(&mut Product),
    {
        self.transaction(|tx| {
            let Some(mut product) = tx.product(id)? else {
                return abort(OrderError::ProductNotFound(id));
            };
            change(&mut product);
            product.updated_at = TimeStamp::new();
            tx.put_product(&product)?;
            Ok(product)
        })
    }

    pub fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.orders
            .get(id.key())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Items of an order in the sequence they were placed.
    pub fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        self.order_items
            .scan_prefix(id.key())
            .map(|entry| {
                let (_, bytes) = entry?;
                decode(&bytes)
            })
            .collect()
    }

    /// Loads the items of `order` and the product behind each item.
    pub fn order_details(&self, order: Order) -> Result<OrderDetails, OrderError> {
        let items = self.order_items(order.id)?;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .product(item.product_id)?
                .ok_or(OrderError::ProductNotFound(item.product_id))?;
            lines.push(LineDetails { item, product });
        }

        Ok(OrderDetails { order, items: lines })
    }

    pub fn count_user_orders(&self, user_id: UserId) -> Result<u64, StoreError> {
        let mut total = 0;
        for entry in self.user_orders.scan_prefix(user_id.key()) {
            entry?;
            total += 1;
        }
        Ok(total)
    }

    /// Order ids owned by `user_id`, newest first.
    pub fn user_order_ids(
        &self,
        user_id: UserId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<OrderId>, StoreError> {
        self.user_orders
            .scan_prefix(user_id.key())
            .rev()
            .skip(offset)
            .take(limit)
            .map(|entry| {
                let (key, _) = entry?;
                order_id_from_index_key(&key)
            })
            .collect()
    }

    /// Runs `f` in one transaction spanning every tree.
    pub fn transaction<A, F>(&self, f: F) -> Result<A, OrderError>
    where
        F: Fn(&StoreTx<'_>) -> ConflictableTransactionResult<A, OrderError>,
    {
        let trees = (
            &self.products,
            &self.orders,
            &self.order_items,
            &self.user_orders,
        );
        let result = trees.transaction(|(products, orders, order_items, user_orders)| {
            f(&StoreTx {
                products,
                orders,
                order_items,
                user_orders,
            })
        });

        match result {
            Ok(value) => Ok(value),
            Err(TransactionError::Abort(err)) => Err(err),
            Err(TransactionError::Storage(err)) => Err(StoreError::from(err).into()),
        }
    }
}

/// Row access inside a running transaction.
pub struct StoreTx<'a> {
    products: &'a TransactionalTree,
    orders: &'a TransactionalTree,
    order_items: &'a TransactionalTree,
    user_orders: &'a TransactionalTree,
}

impl StoreTx<'_> {
    pub fn product(&self, id: ProductId) -> ConflictableTransactionResult<Option<Product>, OrderError> {
        match self.products.get(id.key())? {
            Some(bytes) => decode_in_tx(&bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn put_product(&self, product: &Product) -> ConflictableTransactionResult<(), OrderError> {
        self.products
            .insert(product.id.key(), encode_in_tx(product)?)?;
        Ok(())
    }

    pub fn order(&self, id: OrderId) -> ConflictableTransactionResult<Option<Order>, OrderError> {
        match self.orders.get(id.key())? {
            Some(bytes) => decode_in_tx(&bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn put_order(&self, order: &Order) -> ConflictableTransactionResult<(), OrderError> {
        self.orders.insert(order.id.key(), encode_in_tx(order)?)?;
        Ok(())
    }

    pub fn put_item(&self, item: &OrderItem) -> ConflictableTransactionResult<(), OrderError> {
        let key = compound_key(item.order_id.as_bytes(), item.id.as_bytes());
        self.order_items.insert(key, encode_in_tx(item)?)?;
        Ok(())
    }

    /// Records `order` under its owner so it shows up in listings.
    pub fn index_order(&self, order: &Order) -> ConflictableTransactionResult<(), OrderError> {
        let key = compound_key(order.user_id.as_bytes(), order.id.as_bytes());
        self.user_orders.insert(key, Vec::<u8>::new())?;
        Ok(())
    }
}

/// Aborts the surrounding transaction with `err`.
pub fn abort<T>(err: impl Into<OrderError>) -> ConflictableTransactionResult<T, OrderError> {
    Err(ConflictableTransactionError::Abort(err.into()))
}

fn compound_key(head: &[u8; 16], tail: &[u8; 16]) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(head);
    key.extend_from_slice(tail);
    key
}

fn order_id_from_index_key(key: &[u8]) -> Result<OrderId, StoreError> {
    key.get(16..32)
        .and_then(|tail| <[u8; 16]>::try_from(tail).ok())
        .map(OrderId::from_bytes)
        .ok_or(StoreError::MalformedKey(key.len()))
}

fn encode<T: minicbor::Encode<()>>(row: &T) -> Result<Vec<u8>, StoreError> {
    minicbor::to_vec(row).map_err(|e| StoreError::Encode(e.to_string()))
}

fn decode<T>(bytes: &[u8]) -> Result<T, StoreError>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    Ok(minicbor::decode(bytes)?)
}

fn encode_in_tx<T: minicbor::Encode<()>>(
    row: &T,
) -> ConflictableTransactionResult<Vec<u8>, OrderError> {
    encode(row).map_err(|e| ConflictableTransactionError::Abort(e.into()))
}

fn decode_in_tx<T>(bytes: &[u8]) -> ConflictableTransactionResult<T, OrderError>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    decode(bytes).map_err(|e| ConflictableTransactionError::Abort(e.into()))
}
