// Sale lifecycle through SaleService: totals stay derived on every path

#[path = "../helpers/mod.rs"]
mod helpers;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use helpers::*;
use tourdesk::core::AppError;
use tourdesk::modules::sales::models::{AttachAccessoryRequest, UpdateSaleRequest};
use tourdesk::modules::sales::services::TotalsEngine;

fn attach(accessory_id: i64, quantity: i32) -> AttachAccessoryRequest {
    AttachAccessoryRequest {
        accessory_id,
        quantity,
    }
}

/// The stored totals must equal a fresh recalculation over the stored lines
async fn assert_consistent(store: &MemorySaleStore, sale_id: i64) {
    let sale = store.raw_sale(sale_id).await.expect("sale stored");
    let lines = store.raw_lines(sale_id).await;
    let expected = TotalsEngine::recalculate(&sale.financials(), &lines);

    assert_eq!(sale.total_amount(), expected.total_amount, "stale total_amount");
    assert_eq!(
        sale.commission_amount(),
        expected.commission_amount,
        "stale commission_amount"
    );
}

#[tokio::test]
async fn test_accessory_round_trip_scenario() {
    let fx = fixture().await;

    let sale = fx
        .service
        .create_sale(COMPANY, SELLER, sale_request(dec!(100)))
        .await
        .unwrap();
    assert_eq!(sale.total_amount, "100.00");

    let sale = fx
        .service
        .attach_accessory(COMPANY, sale.id, attach(ACCESSORY_A, 2))
        .await
        .unwrap();
    assert_eq!(sale.total_amount, "120.00");
    assert_eq!(sale.accessories_total, "20.00");
    let first_line = sale.accessories[0].id;

    let sale = fx
        .service
        .attach_accessory(COMPANY, sale.id, attach(ACCESSORY_B, 1))
        .await
        .unwrap();
    assert_eq!(sale.total_amount, "125.00");
    assert_eq!(sale.accessories.len(), 2);

    let sale = fx
        .service
        .detach_accessory(COMPANY, sale.id, first_line)
        .await
        .unwrap();
    // 125.00 less the 2 × 10.00 line
    assert_eq!(sale.total_amount, "105.00");
    assert_eq!(sale.accessories.len(), 1);

    let sale = fx
        .service
        .update_sale(
            COMPANY,
            sale.id,
            UpdateSaleRequest {
                commission_percentage: Some(Some(dec!(10))),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(sale.total_amount, "105.00");
    assert_eq!(sale.commission_amount, "10.50");
}

#[tokio::test]
async fn test_commission_percentage_can_be_cleared() {
    let fx = fixture().await;

    let mut request = sale_request(dec!(200.00));
    request.commission_percentage = Some(dec!(5));
    let sale = fx.service.create_sale(COMPANY, SELLER, request).await.unwrap();
    assert_eq!(sale.commission_amount, "10.00");

    let sale = fx
        .service
        .update_sale(
            COMPANY,
            sale.id,
            UpdateSaleRequest {
                commission_percentage: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(sale.commission_percentage.is_none());
    assert_eq!(sale.commission_amount, "0.00");
    assert_consistent(&fx.store, sale.id).await;
}

#[tokio::test]
async fn test_every_mutation_path_recalculates() {
    let fx = fixture().await;
    let store = &fx.store;

    let mut request = sale_request(dec!(200.00));
    request.commission_percentage = Some(dec!(7.5));
    let sale = fx.service.create_sale(COMPANY, SELLER, request).await.unwrap();
    let id = sale.id;
    assert_consistent(store, id).await;

    fx.service
        .attach_accessory(COMPANY, id, attach(ACCESSORY_A, 3))
        .await
        .unwrap();
    assert_consistent(store, id).await;

    let sale = fx
        .service
        .attach_accessory(COMPANY, id, attach(ACCESSORY_B, 2))
        .await
        .unwrap();
    assert_consistent(store, id).await;
    let line_b = sale
        .accessories
        .iter()
        .find(|l| l.accessory_id == ACCESSORY_B)
        .map(|l| l.id)
        .unwrap();

    let edits = vec![
        UpdateSaleRequest {
            subtotal: Some(dec!(180.00)),
            ..Default::default()
        },
        UpdateSaleRequest {
            discount_percentage: Some(dec!(10)),
            ..Default::default()
        },
        UpdateSaleRequest {
            tax_amount: Some(dec!(12.34)),
            ..Default::default()
        },
        UpdateSaleRequest {
            commission_percentage: Some(Some(dec!(12.5))),
            ..Default::default()
        },
        UpdateSaleRequest {
            discount_amount: Some(dec!(3.00)),
            ..Default::default()
        },
        UpdateSaleRequest {
            trip_id: Some(SMALL_TRIP),
            ..Default::default()
        },
    ];
    for edit in edits {
        fx.service.update_sale(COMPANY, id, edit).await.unwrap();
        assert_consistent(store, id).await;
    }

    fx.service.detach_accessory(COMPANY, id, line_b).await.unwrap();
    assert_consistent(store, id).await;

    fx.service
        .record_payment(COMPANY, id, payment(dec!(1.00)))
        .await
        .unwrap();
    assert_consistent(store, id).await;

    // A catalog price change is picked up by the next mutation of the sale
    store.set_accessory_value(ACCESSORY_A, dec!(11.00)).await;
    let sale = fx
        .service
        .update_sale(
            COMPANY,
            id,
            UpdateSaleRequest {
                notes: Some("janela".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_consistent(store, id).await;
    assert_eq!(sale.accessories_total, "33.00");
}

#[tokio::test]
async fn test_deleted_catalog_accessory_contributes_zero() {
    let fx = fixture().await;

    let sale = fx
        .service
        .create_sale(COMPANY, SELLER, sale_request(dec!(50.00)))
        .await
        .unwrap();
    fx.service
        .attach_accessory(COMPANY, sale.id, attach(ACCESSORY_A, 1))
        .await
        .unwrap();

    fx.store.remove_accessory(ACCESSORY_A).await;

    let sale = fx
        .service
        .update_sale(COMPANY, sale.id, UpdateSaleRequest::default())
        .await
        .unwrap();
    assert_eq!(sale.total_amount, "50.00");
    assert_eq!(sale.accessories.len(), 1);
    assert_eq!(sale.accessories[0].line_total, "0.00");
    assert!(sale.accessories[0].unit_value.is_none());
}

#[tokio::test]
async fn test_discount_percentage_derives_amount() {
    let fx = fixture().await;

    let mut request = sale_request(dec!(250.00));
    request.discount_percentage = Some(dec!(12.5));
    let sale = fx.service.create_sale(COMPANY, SELLER, request).await.unwrap();

    assert_eq!(sale.discount_amount, "31.25");
    assert_eq!(sale.total_amount, "218.75");

    // A new subtotal re-derives the amount from the stored percentage
    let sale = fx
        .service
        .update_sale(
            COMPANY,
            sale.id,
            UpdateSaleRequest {
                subtotal: Some(dec!(100.00)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(sale.discount_amount, "12.50");
    assert_eq!(sale.total_amount, "87.50");
}

#[tokio::test]
async fn test_validation_errors_leave_nothing_behind() {
    let fx = fixture().await;

    let mut request = sale_request(dec!(100.00));
    request.discount_amount = Some(dec!(150.00));
    let err = fx.service.create_sale(COMPANY, SELLER, request).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut request = sale_request(dec!(100.00));
    request.discount_amount = Some(dec!(10.00));
    request.discount_percentage = Some(dec!(20));
    let err = fx.service.create_sale(COMPANY, SELLER, request).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut request = sale_request(dec!(100.00));
    request.installments = Some(25);
    let err = fx.service.create_sale(COMPANY, SELLER, request).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut request = sale_request(dec!(100.00));
    request.commission_percentage = Some(dec!(100.01));
    let err = fx.service.create_sale(COMPANY, SELLER, request).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(fx.store.sale_count(TRIP).await, 0);
}

#[tokio::test]
async fn test_attach_rejects_bad_quantity_and_unknown_accessory() {
    let fx = fixture().await;
    let sale = fx
        .service
        .create_sale(COMPANY, SELLER, sale_request(dec!(100.00)))
        .await
        .unwrap();

    let err = fx
        .service
        .attach_accessory(COMPANY, sale.id, attach(ACCESSORY_A, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = fx
        .service
        .attach_accessory(COMPANY, sale.id, attach(12345, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = fx
        .service
        .detach_accessory(COMPANY, sale.id, 777)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert!(fx.store.raw_lines(sale.id).await.is_empty());
}

#[tokio::test]
async fn test_other_tenant_sees_nothing() {
    let fx = fixture().await;
    fx.store
        .add_accessory(tourdesk::modules::accessories::models::Accessory {
            id: 950,
            company_id: OTHER_COMPANY,
            name: "Outro".to_string(),
            value: dec!(99.00),
        })
        .await;

    let sale = fx
        .service
        .create_sale(COMPANY, SELLER, sale_request(dec!(100.00)))
        .await
        .unwrap();

    let err = fx.service.get_sale(OTHER_COMPANY, sale.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = fx
        .service
        .update_sale(OTHER_COMPANY, sale.id, UpdateSaleRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Accessory owned by another tenant cannot be attached
    let err = fx
        .service
        .attach_accessory(COMPANY, sale.id, attach(950, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert!(fx
        .service
        .list_sales(OTHER_COMPANY, 50, 0)
        .await
        .unwrap()
        .is_empty());

    // Customer of another tenant
    let mut request = sale_request(dec!(10.00));
    request.customer_id = 4242;
    let err = fx.service.create_sale(COMPANY, SELLER, request).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_cascades_lines_and_payments() {
    let fx = fixture().await;
    let sale = fx
        .service
        .create_sale(COMPANY, SELLER, sale_request(dec!(100.00)))
        .await
        .unwrap();
    fx.service
        .attach_accessory(COMPANY, sale.id, attach(ACCESSORY_A, 1))
        .await
        .unwrap();
    fx.service
        .record_payment(COMPANY, sale.id, payment(dec!(20.00)))
        .await
        .unwrap();

    fx.service.delete_sale(COMPANY, sale.id).await.unwrap();

    assert!(fx.store.raw_sale(sale.id).await.is_none());
    assert!(fx.store.raw_lines(sale.id).await.is_empty());
    assert_eq!(fx.store.payment_count().await, 0);

    let err = fx.service.delete_sale(COMPANY, sale.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_list_sales_pages_newest_first() {
    let fx = fixture().await;
    for subtotal in [dec!(10), dec!(20), dec!(30)] {
        fx.service
            .create_sale(COMPANY, SELLER, sale_request(subtotal))
            .await
            .unwrap();
    }

    let page = fx.service.list_sales(COMPANY, 2, 0).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].subtotal, "30.00");

    let rest = fx.service.list_sales(COMPANY, 2, 2).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].subtotal, "10.00");

    let total: Decimal = fx
        .service
        .list_sales(COMPANY, 500, 0)
        .await
        .unwrap()
        .iter()
        .map(|s| money(&s.total_amount))
        .sum();
    assert_eq!(total, dec!(60.00));
}
