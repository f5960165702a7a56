// HTTP contract for the /sales routes

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::dev::Service;
use actix_web::{http::StatusCode, test, web, App, HttpMessage};
use serde_json::{json, Value};

use helpers::*;
use tourdesk::core::{Role, TenantContext};
use tourdesk::middleware::json_error_handler;
use tourdesk::modules::sales;
use tourdesk::modules::sales::models::{PaymentResponse, SaleResponse};

const ROLE_HEADER: &str = "x-test-role";

/// Sales routes over the in-memory store. The role header stands in for the
/// API key middleware; without it no tenant context is attached.
macro_rules! app {
    ($fx:expr) => {
        test::init_service(
            App::new()
                .wrap_fn(|req, srv| {
                    let role = req
                        .headers()
                        .get(ROLE_HEADER)
                        .and_then(|h| h.to_str().ok())
                        .and_then(|r| r.parse::<Role>().ok());
                    if let Some(role) = role {
                        req.extensions_mut()
                            .insert(TenantContext::new(COMPANY, SELLER, role));
                    }
                    srv.call(req)
                })
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .app_data(web::Data::new($fx.service.clone()))
                .configure(sales::controllers::configure),
        )
        .await
    };
}

fn sale_body() -> Value {
    json!({
        "customer_id": CUSTOMER,
        "trip_id": TRIP,
        "subtotal": "100.00",
        "tax_amount": "5.50",
        "commission_percentage": "10"
    })
}

#[actix_web::test]
async fn test_create_sale_ignores_client_totals() {
    let fx = fixture().await;
    let app = app!(fx);

    let mut body = sale_body();
    body["total_amount"] = json!("999.99");
    body["commission_amount"] = json!("1.00");

    let req = test::TestRequest::post()
        .uri("/sales")
        .insert_header((ROLE_HEADER, "user"))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let sale: SaleResponse = test::read_body_json(resp).await;
    assert_eq!(sale.total_amount, "105.50");
    assert_eq!(sale.commission_amount, "10.55");
    assert_eq!(sale.subtotal, "100.00");
    assert_eq!(sale.seller_id, SELLER);
}

#[actix_web::test]
async fn test_requests_without_tenant_are_unauthorized() {
    let fx = fixture().await;
    let app = app!(fx);

    let req = test::TestRequest::get().uri("/sales").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_accessory_routes_return_recalculated_sale() {
    let fx = fixture().await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/sales")
        .insert_header((ROLE_HEADER, "user"))
        .set_json(json!({"customer_id": CUSTOMER, "trip_id": TRIP, "subtotal": "100"}))
        .to_request();
    let sale: SaleResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/sales/{}/accessories", sale.id))
        .insert_header((ROLE_HEADER, "user"))
        .set_json(json!({"accessory_id": ACCESSORY_A, "quantity": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let sale: SaleResponse = test::read_body_json(resp).await;
    assert_eq!(sale.total_amount, "120.00");
    assert_eq!(sale.accessories[0].unit_value.as_deref(), Some("10.00"));
    assert_eq!(sale.accessories[0].line_total, "20.00");

    let req = test::TestRequest::delete()
        .uri(&format!("/sales/{}/accessories/{}", sale.id, sale.accessories[0].id))
        .insert_header((ROLE_HEADER, "user"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let sale: SaleResponse = test::read_body_json(resp).await;
    assert_eq!(sale.total_amount, "100.00");
    assert!(sale.accessories.is_empty());
}

#[actix_web::test]
async fn test_payment_routes_and_overpayment() {
    let fx = fixture().await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/sales")
        .insert_header((ROLE_HEADER, "user"))
        .set_json(json!({"customer_id": CUSTOMER, "trip_id": TRIP, "subtotal": "110.00"}))
        .to_request();
    let sale: SaleResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/sales/{}/payments", sale.id))
        .insert_header((ROLE_HEADER, "user"))
        .set_json(json!({"amount": "110.00", "payment_method": "cartao_debito"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let paid: PaymentResponse = test::read_body_json(resp).await;
    assert_eq!(paid.amount, "110.00");

    let req = test::TestRequest::post()
        .uri(&format!("/sales/{}/payments", sale.id))
        .insert_header((ROLE_HEADER, "user"))
        .set_json(json!({"amount": "0.01", "payment_method": "pix"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], 400);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Invariant violation"));

    let req = test::TestRequest::get()
        .uri(&format!("/sales/{}/payments", sale.id))
        .insert_header((ROLE_HEADER, "user"))
        .to_request();
    let payments: Vec<PaymentResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(payments.len(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/sales/{}", sale.id))
        .insert_header((ROLE_HEADER, "user"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["payment_status"], "pago");
    assert_eq!(body["balance_due"], "0.00");
}

#[actix_web::test]
async fn test_delete_requires_admin() {
    let fx = fixture().await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/sales")
        .insert_header((ROLE_HEADER, "user"))
        .set_json(sale_body())
        .to_request();
    let sale: SaleResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/sales/{}", sale.id))
        .insert_header((ROLE_HEADER, "user"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/sales/{}", sale.id))
        .insert_header((ROLE_HEADER, "admin"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/sales/{}", sale.id))
        .insert_header((ROLE_HEADER, "admin"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_update_and_validation_errors() {
    let fx = fixture().await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/sales")
        .insert_header((ROLE_HEADER, "user"))
        .set_json(sale_body())
        .to_request();
    let sale: SaleResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::put()
        .uri(&format!("/sales/{}", sale.id))
        .insert_header((ROLE_HEADER, "user"))
        .set_json(json!({"discount_percentage": "50", "total_amount": "1.00"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: SaleResponse = test::read_body_json(resp).await;
    assert_eq!(updated.discount_amount, "50.00");
    assert_eq!(updated.total_amount, "55.50");

    let req = test::TestRequest::put()
        .uri(&format!("/sales/{}", sale.id))
        .insert_header((ROLE_HEADER, "user"))
        .set_json(json!({"discount_amount": "500.00"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri(&format!("/sales/{}", sale.id))
        .insert_header((ROLE_HEADER, "user"))
        .set_json(json!({"payment_status": "pago"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri(&format!("/sales/{}", sale.id))
        .insert_header((ROLE_HEADER, "user"))
        .set_json(json!({"commission_percentage": null}))
        .to_request();
    let cleared: SaleResponse = test::call_and_read_body_json(&app, req).await;
    assert!(cleared.commission_percentage.is_none());
    assert_eq!(cleared.commission_amount, "0.00");
    assert_eq!(cleared.payment_status, sales::PaymentStatus::Pending);

    let req = test::TestRequest::post()
        .uri("/sales")
        .insert_header((ROLE_HEADER, "user"))
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"customer_id\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
