//! Service layer API for order workflow operations
use crate::auth::Principal;
use crate::error::OrderError;
use crate::ledger;
use crate::order::{Order, OrderDetails, OrderItem, OrderLine};
use crate::status::OrderStatus;
use crate::store::{abort, Store};
use crate::types::{Money, OrderId, TimeStamp};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct OrderWorkflow {
    store: Arc<Store>,
}

impl OrderWorkflow {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Place a new order for the calling user.
    ///
    /// Stock for every product is checked up front so the caller hears about all
    /// short products at once. The order row, its items and the stock
    /// decrements are then written in one transaction; if anything fails
    /// nothing is kept.
    #[instrument(skip(self, principal, lines), fields(user_id = %principal.user_id(), lines = lines.len()))]
    pub fn create_order(
        &self,
        principal: &Principal,
        lines: &[OrderLine],
    ) -> Result<OrderDetails, OrderError> {
        validate_lines(lines)?;

        if let Err(err) = ledger::check_availability(&self.store, lines) {
            warn!(%err, "order rejected before write");
            return Err(err);
        }

        let user_id = principal.user_id();
        let order = self
            .store
            .transaction(|tx| {
                let mut order = Order::new(user_id);
                let mut total = Money::ZERO;

                for line in lines {
                    // re-read inside the transaction, the row may have moved since the check
                    let Some(product) = tx.product(line.product_id)? else {
                        return abort(OrderError::ProductNotFound(line.product_id));
                    };
                    if !product.is_active {
                        return abort(OrderError::ProductInactive(product.id));
                    }

                    let item = OrderItem::new(order.id, &product, line.quantity);
                    let Some(next_total) = item
                        .line_total()
                        .and_then(|line_total| total.checked_add(line_total))
                    else {
                        return abort(OrderError::Validation("order total is too large".into()));
                    };

                    tx.put_item(&item)?;
                    ledger::decrement(tx, product.id, line.quantity)?;
                    total = next_total;
                }

                order.total_amount = total;
                tx.put_order(&order)?;
                tx.index_order(&order)?;
                Ok(order)
            })
            .inspect_err(|err| warn!(%err, "order placement rolled back"))?;

        info!(order_id = %order.id, total = %order.total_amount, "order placed");
        self.store.order_details(order)
    }

    /// Cancel one of the caller's pending orders and put its stock back.
    #[instrument(skip(self, principal), fields(user_id = %principal.user_id()))]
    pub fn cancel_order(
        &self,
        principal: &Principal,
        order_id: OrderId,
    ) -> Result<OrderDetails, OrderError> {
        let order = self
            .store
            .order(order_id)?
            .filter(|order| order.is_owned_by(principal.user_id()))
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if order.status != OrderStatus::Pending {
            warn!(status = %order.status, "only pending orders can be cancelled");
            return Err(OrderError::InvalidState {
                order_id,
                status: order.status,
            });
        }

        // items never change after placement, so they can be read outside the transaction
        let items = self.store.order_items(order_id)?;

        let cancelled = self.store.transaction(|tx| {
            let Some(mut current) = tx.order(order_id)? else {
                return abort(OrderError::OrderNotFound(order_id));
            };
            // checked again so a concurrent cancel cannot restore the stock twice
            if current.status != OrderStatus::Pending {
                return abort(OrderError::InvalidState {
                    order_id,
                    status: current.status,
                });
            }

            current.status = OrderStatus::Cancelled;
            current.updated_at = TimeStamp::new();
            tx.put_order(&current)?;

            for item in &items {
                ledger::restore(tx, item.product_id, item.quantity)?;
            }
            Ok(current)
        })?;

        info!(%order_id, restored_lines = items.len(), "order cancelled");
        self.store.order_details(cancelled)
    }

    /// Move an order to `requested`. Admin only.
    #[instrument(skip(self, principal), fields(user_id = %principal.user_id()))]
    pub fn update_status(
        &self,
        principal: &Principal,
        order_id: OrderId,
        requested: &str,
    ) -> Result<OrderDetails, OrderError> {
        principal.require_admin()?;

        let updated = self
            .store
            .transaction(|tx| {
                let Some(mut order) = tx.order(order_id)? else {
                    return abort(OrderError::OrderNotFound(order_id));
                };
                let next = match order.status.validate_transition(requested) {
                    Ok(next) => next,
                    Err(err) => return abort(err),
                };

                order.status = next;
                order.updated_at = TimeStamp::new();
                tx.put_order(&order)?;
                Ok(order)
            })
            .inspect_err(|err| warn!(%err, "status change refused"))?;

        info!(status = %updated.status, "order status updated");
        self.store.order_details(updated)
    }
}

fn validate_lines(lines: &[OrderLine]) -> Result<(), OrderError> {
    if lines.is_empty() {
        return Err(OrderError::Validation(
            "an order needs at least one item".into(),
        ));
    }
    if let Some(line) = lines.iter().find(|line| line.quantity == 0) {
        return Err(OrderError::Validation(format!(
            "quantity for product {} must be greater than zero",
            line.product_id
        )));
    }
    Ok(())
}
