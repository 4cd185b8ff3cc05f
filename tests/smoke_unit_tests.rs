//! Smoke screen unit tests for the ledger and the store.
//!
//! These exercise one component at a time against a throwaway database and
//! mostly cover the happy path plus the guard rails each component owns.

use shop_orders::error::{OrderError, Shortfall};
use shop_orders::ledger;
use shop_orders::{Money, NewProduct, OrderLine, Product, ProductId, Store};

fn store_with(products: &[(&str, u64, u32)]) -> (Store, Vec<Product>) {
    let store = Store::temporary().unwrap();
    let products = products
        .iter()
        .map(|(name, cents, stock)| {
            store
                .insert_product(NewProduct::new(*name, Money::from_minor(*cents)).set_stock(*stock))
                .unwrap()
        })
        .collect();
    (store, products)
}

fn stock(store: &Store, id: ProductId) -> u32 {
    store.product(id).unwrap().unwrap().stock
}

// LEDGER TESTS
#[cfg(test)]
mod ledger_tests {
    use super::*;

    #[test]
    fn availability_passes_when_everything_fits() {
        let (store, products) = store_with(&[("Fork", 200, 4), ("Knife", 250, 1)]);

        let lines = [
            OrderLine::new(products[0].id, 4),
            OrderLine::new(products[1].id, 1),
        ];
        assert!(ledger::check_availability(&store, &lines).is_ok());
    }

    #[test]
    fn availability_collects_every_shortfall() {
        let (store, products) = store_with(&[("Fork", 200, 1), ("Knife", 250, 0), ("Spoon", 180, 9)]);

        let lines = [
            OrderLine::new(products[0].id, 2),
            OrderLine::new(products[1].id, 1),
            OrderLine::new(products[2].id, 9),
        ];
        let err = ledger::check_availability(&store, &lines).unwrap_err();

        assert_eq!(
            err.shortfalls().unwrap(),
            &[
                Shortfall {
                    product_id: products[0].id,
                    product_name: "Fork".into(),
                    requested: 2,
                    available: 1,
                },
                Shortfall {
                    product_id: products[1].id,
                    product_name: "Knife".into(),
                    requested: 1,
                    available: 0,
                },
            ]
        );
    }

    #[test]
    fn availability_adds_up_repeated_products() {
        let (store, products) = store_with(&[("Fork", 200, 4), ("Knife", 250, 4)]);
        let (fork, knife) = (products[0].id, products[1].id);

        let fits = [OrderLine::new(fork, 2), OrderLine::new(fork, 2)];
        assert!(ledger::check_availability(&store, &fits).is_ok());

        let lines = [
            OrderLine::new(fork, 3),
            OrderLine::new(knife, 3),
            OrderLine::new(fork, 3),
            OrderLine::new(knife, 3),
        ];
        let err = ledger::check_availability(&store, &lines).unwrap_err();
        let short: Vec<_> = err
            .shortfalls()
            .unwrap()
            .iter()
            .map(|s| (s.product_id, s.requested, s.available))
            .collect();
        assert_eq!(short, vec![(fork, 6, 4), (knife, 6, 4)]);
    }

    #[test]
    fn availability_fails_on_unknown_or_inactive_products() {
        let (store, products) = store_with(&[("Fork", 200, 5)]);

        let missing = ProductId::new();
        assert!(matches!(
            ledger::check_availability(&store, &[OrderLine::new(missing, 1)]),
            Err(OrderError::ProductNotFound(id)) if id == missing
        ));

        store.set_product_active(products[0].id, false).unwrap();
        assert!(matches!(
            ledger::check_availability(&store, &[OrderLine::new(products[0].id, 1)]),
            Err(OrderError::ProductInactive(_))
        ));
    }

    #[test]
    fn decrement_and_restore_move_stock() {
        let (store, products) = store_with(&[("Fork", 200, 5)]);
        let id = products[0].id;

        let after = store
            .transaction(|tx| ledger::decrement(tx, id, 3))
            .unwrap();
        assert_eq!(after.stock, 2);
        assert_eq!(stock(&store, id), 2);

        store.transaction(|tx| ledger::restore(tx, id, 3)).unwrap();
        assert_eq!(stock(&store, id), 5);
    }

    #[test]
    fn decrement_never_goes_negative() {
        let (store, products) = store_with(&[("Fork", 200, 2)]);
        let id = products[0].id;

        let err = store
            .transaction(|tx| ledger::decrement(tx, id, 3))
            .unwrap_err();

        assert!(matches!(err, OrderError::InsufficientStock(ref s) if s.len() == 1));
        assert_eq!(stock(&store, id), 2);
    }

    #[test]
    fn restore_is_not_idempotent() {
        let (store, products) = store_with(&[("Fork", 200, 2)]);
        let id = products[0].id;

        store.transaction(|tx| ledger::restore(tx, id, 1)).unwrap();
        store.transaction(|tx| ledger::restore(tx, id, 1)).unwrap();

        assert_eq!(stock(&store, id), 4);
    }

    #[test]
    fn restore_refuses_to_overflow() {
        let (store, products) = store_with(&[("Fork", 200, u32::MAX)]);
        let id = products[0].id;

        let err = store
            .transaction(|tx| ledger::restore(tx, id, 1))
            .unwrap_err();
        assert!(matches!(err, OrderError::StockOverflow(_)));
        assert_eq!(stock(&store, id), u32::MAX);
    }
}

// STORE TESTS
#[cfg(test)]
mod store_tests {
    use super::*;

    #[test]
    fn products_survive_a_round_trip() {
        let (store, products) = store_with(&[("Plate", 1_050, 12)]);

        let loaded = store.product(products[0].id).unwrap().unwrap();
        assert_eq!(loaded, products[0]);
        assert!(store.product(ProductId::new()).unwrap().is_none());
    }

    #[test]
    fn reprice_and_deactivate_touch_only_their_field() {
        let (store, products) = store_with(&[("Plate", 1_050, 12)]);
        let id = products[0].id;

        let repriced = store.reprice_product(id, Money::from_minor(990)).unwrap();
        assert_eq!(repriced.price, Money::from_minor(990));
        assert_eq!(repriced.stock, 12);
        assert!(repriced.updated_at >= products[0].updated_at);

        let inactive = store.set_product_active(id, false).unwrap();
        assert!(!inactive.is_active);
        assert_eq!(inactive.price, Money::from_minor(990));
    }

    #[test]
    fn catalog_updates_validate_input() {
        let (store, products) = store_with(&[("Plate", 1_050, 12)]);

        assert!(matches!(
            store.reprice_product(products[0].id, Money::ZERO),
            Err(OrderError::Validation(_))
        ));
        assert!(matches!(
            store.set_product_active(ProductId::new(), false),
            Err(OrderError::ProductNotFound(_))
        ));
    }

    #[test]
    fn transaction_commits_every_write_or_none() {
        let (store, products) = store_with(&[("Plate", 1_050, 12), ("Bowl", 800, 3)]);
        let (plate, bowl) = (products[0].id, products[1].id);

        // the bowl decrement fails, so the plate decrement must not stick
        let err = store
            .transaction(|tx| {
                ledger::decrement(tx, plate, 5)?;
                ledger::decrement(tx, bowl, 4)
            })
            .unwrap_err();

        assert!(matches!(err, OrderError::InsufficientStock(_)));
        assert_eq!(stock(&store, plate), 12);
        assert_eq!(stock(&store, bowl), 3);
    }
}
