//! Stock ledger: the only code that moves product stock counts.
//!
//! The availability check runs against committed rows before a transaction
//! opens and reports every short product at once. Decrements and restores run
//! inside the caller's transaction.
use crate::error::{OrderError, Shortfall};
use crate::order::OrderLine;
use crate::product::Product;
use crate::store::{abort, Store, StoreTx};
use crate::types::{ProductId, TimeStamp};
use sled::transaction::ConflictableTransactionResult;
use tracing::debug;

impl Shortfall {
    pub fn new(product: &Product, requested: u32) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            requested,
            available: product.stock,
        }
    }
}

/// Confirms every line can be served from current stock.
///
/// Lines for the same product are added up first, so a product listed twice
/// is judged on its combined quantity. A missing or deactivated product fails
/// immediately. Short products are collected and returned together as
/// `InsufficientStock`, in the order they first appear.
pub fn check_availability(store: &Store, lines: &[OrderLine]) -> Result<(), OrderError> {
    let mut shortfalls = Vec::new();

    for (product_id, requested) in requested_per_product(lines)? {
        let product = store
            .product(product_id)?
            .ok_or(OrderError::ProductNotFound(product_id))?;

        if !product.is_active {
            return Err(OrderError::ProductInactive(product.id));
        }
        if requested > product.stock {
            shortfalls.push(Shortfall::new(&product, requested));
        }
    }

    if shortfalls.is_empty() {
        Ok(())
    } else {
        Err(OrderError::InsufficientStock(shortfalls))
    }
}

fn requested_per_product(lines: &[OrderLine]) -> Result<Vec<(ProductId, u32)>, OrderError> {
    let mut totals: Vec<(ProductId, u32)> = Vec::with_capacity(lines.len());

    for line in lines {
        match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, total)) => {
                *total = total.checked_add(line.quantity).ok_or_else(|| {
                    OrderError::Validation(format!(
                        "combined quantity for product {} is too large",
                        line.product_id
                    ))
                })?;
            }
            None => totals.push((line.product_id, line.quantity)),
        }
    }
    Ok(totals)
}

/// Takes `quantity` units out of stock. Refuses to go below zero even though
/// callers are expected to have checked availability first.
pub fn decrement(
    tx: &StoreTx<'_>,
    product_id: ProductId,
    quantity: u32,
) -> ConflictableTransactionResult<Product, OrderError> {
    let Some(mut product) = tx.product(product_id)? else {
        return abort(OrderError::ProductNotFound(product_id));
    };
    let Some(remaining) = product.stock.checked_sub(quantity) else {
        return abort(OrderError::InsufficientStock(vec![Shortfall::new(
            &product, quantity,
        )]));
    };

    product.stock = remaining;
    product.updated_at = TimeStamp::new();
    tx.put_product(&product)?;

    debug!(%product_id, quantity, remaining, "stock decremented");
    Ok(product)
}

/// Puts `quantity` units back. Calling this twice for the same order item
/// restores twice.
pub fn restore(
    tx: &StoreTx<'_>,
    product_id: ProductId,
    quantity: u32,
) -> ConflictableTransactionResult<Product, OrderError> {
    let Some(mut product) = tx.product(product_id)? else {
        return abort(OrderError::ProductNotFound(product_id));
    };
    let Some(restored) = product.stock.checked_add(quantity) else {
        return abort(OrderError::StockOverflow(product_id));
    };

    product.stock = restored;
    product.updated_at = TimeStamp::new();
    tx.put_product(&product)?;

    debug!(%product_id, quantity, restored, "stock restored");
    Ok(product)
}
