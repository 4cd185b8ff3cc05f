//! Read paths over orders
use crate::auth::Principal;
use crate::error::{OrderError, StoreError};
use crate::order::OrderDetails;
use crate::store::Store;
use crate::types::OrderId;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// A normalised page request. Out of range input never errors, it falls
/// back to the defaults or is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = u64::try_from(page)
            .ok()
            .filter(|page| *page >= 1)
            .unwrap_or(DEFAULT_PAGE);
        let page_size = u64::try_from(page_size)
            .ok()
            .filter(|size| *size >= 1)
            .map_or(DEFAULT_PAGE_SIZE, |size| size.min(MAX_PAGE_SIZE));

        Self { page, page_size }
    }

    /// Builds a request from raw query string values, e.g. `?page=2&page_size=20`.
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Self {
        let parse = |raw: Option<&str>, default: u64| {
            raw.and_then(|raw| raw.trim().parse::<i64>().ok())
                .unwrap_or(default as i64)
        };
        Self::new(
            parse(page, DEFAULT_PAGE),
            parse(page_size, DEFAULT_PAGE_SIZE),
        )
    }

    pub fn page(&self) -> u64 {
        self.page
    }
    pub fn page_size(&self) -> u64 {
        self.page_size
    }
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages: total_items.div_ceil(request.page_size),
        }
    }
}

pub struct OrderQueryService {
    store: Arc<Store>,
}

impl OrderQueryService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// One of the caller's orders with its items and products.
    #[instrument(skip(self, principal), fields(user_id = %principal.user_id()))]
    pub fn get_order(
        &self,
        principal: &Principal,
        order_id: OrderId,
    ) -> Result<OrderDetails, OrderError> {
        let order = self
            .store
            .order(order_id)?
            .filter(|order| order.is_owned_by(principal.user_id()))
            .ok_or(OrderError::OrderNotFound(order_id))?;

        self.store.order_details(order)
    }

    /// The caller's orders, newest first.
    #[instrument(skip(self, principal), fields(user_id = %principal.user_id()))]
    pub fn list_orders(
        &self,
        principal: &Principal,
        request: PageRequest,
    ) -> Result<Page<OrderDetails>, OrderError> {
        let user_id = principal.user_id();
        let total_items = self.store.count_user_orders(user_id)?;

        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(request.page_size()).unwrap_or(usize::MAX);
        let ids = self.store.user_order_ids(user_id, offset, limit)?;

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            let order = self.store.order(id)?.ok_or(StoreError::DanglingIndex(id))?;
            items.push(self.store.order_details(order)?);
        }

        debug!(returned = items.len(), total_items, "orders listed");
        Ok(Page::new(items, request, total_items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten() {
        let request = PageRequest::default();
        assert_eq!((request.page(), request.page_size()), (1, 10));
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn clamps_oversized_pages() {
        assert_eq!(PageRequest::new(1, 200).page_size(), MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(1, 100).page_size(), 100);
    }

    #[test]
    fn falls_back_on_zero_or_negative_input() {
        assert_eq!(PageRequest::new(0, 10).page(), 1);
        assert_eq!(PageRequest::new(-3, 10).page(), 1);
        assert_eq!(PageRequest::new(2, 0).page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageRequest::new(2, -5).page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn non_numeric_query_values_use_defaults() {
        assert_eq!(
            PageRequest::from_query(Some("two"), Some("lots")),
            PageRequest::default()
        );
        assert_eq!(PageRequest::from_query(None, None), PageRequest::default());

        let request = PageRequest::from_query(Some(" 3 "), Some("250"));
        assert_eq!((request.page(), request.page_size()), (3, 100));
        assert_eq!(request.offset(), 200);
    }

    #[test]
    fn total_pages_round_up() {
        let request = PageRequest::new(1, 10);
        assert_eq!(Page::<()>::new(vec![], request, 0).total_pages, 0);
        assert_eq!(Page::<()>::new(vec![], request, 10).total_pages, 1);
        assert_eq!(Page::<()>::new(vec![], request, 11).total_pages, 2);
    }
}
