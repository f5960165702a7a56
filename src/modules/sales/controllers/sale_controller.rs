use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::{AppError, Role, TenantContext};
use crate::modules::sales::models::{
    AttachAccessoryRequest, CreateSaleRequest, RecordPaymentRequest, UpdateSaleRequest,
};
use crate::modules::sales::services::sale_service::{SaleService, DEFAULT_PAGE_SIZE};

/// Query parameters for listing sales
#[derive(Debug, Deserialize)]
pub struct ListSalesQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// POST /sales
pub async fn create_sale(
    service: web::Data<Arc<SaleService>>,
    tenant: TenantContext,
    request: web::Json<CreateSaleRequest>,
) -> Result<HttpResponse, AppError> {
    let sale = service
        .create_sale(tenant.company_id, tenant.user_id, request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(sale))
}

/// GET /sales
pub async fn list_sales(
    service: web::Data<Arc<SaleService>>,
    tenant: TenantContext,
    query: web::Query<ListSalesQuery>,
) -> Result<HttpResponse, AppError> {
    let sales = service
        .list_sales(tenant.company_id, query.limit, query.offset)
        .await?;

    Ok(HttpResponse::Ok().json(sales))
}

/// GET /sales/{id}
pub async fn get_sale(
    service: web::Data<Arc<SaleService>>,
    tenant: TenantContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let sale = service
        .get_sale(tenant.company_id, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(sale))
}

/// PUT /sales/{id}
///
/// Any `total_amount` or `commission_amount` in the body is ignored; both
/// are always derived.
pub async fn update_sale(
    service: web::Data<Arc<SaleService>>,
    tenant: TenantContext,
    path: web::Path<i64>,
    request: web::Json<UpdateSaleRequest>,
) -> Result<HttpResponse, AppError> {
    let sale = service
        .update_sale(tenant.company_id, path.into_inner(), request.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(sale))
}

/// DELETE /sales/{id}, admin only
pub async fn delete_sale(
    service: web::Data<Arc<SaleService>>,
    tenant: TenantContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    tenant.require_role(Role::Admin)?;

    service
        .delete_sale(tenant.company_id, path.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /sales/{id}/accessories
pub async fn attach_accessory(
    service: web::Data<Arc<SaleService>>,
    tenant: TenantContext,
    path: web::Path<i64>,
    request: web::Json<AttachAccessoryRequest>,
) -> Result<HttpResponse, AppError> {
    let sale = service
        .attach_accessory(tenant.company_id, path.into_inner(), request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(sale))
}

/// DELETE /sales/{id}/accessories/{line_id}
pub async fn detach_accessory(
    service: web::Data<Arc<SaleService>>,
    tenant: TenantContext,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (sale_id, line_id) = path.into_inner();
    let sale = service
        .detach_accessory(tenant.company_id, sale_id, line_id)
        .await?;

    Ok(HttpResponse::Ok().json(sale))
}

/// POST /sales/{id}/payments
pub async fn record_payment(
    service: web::Data<Arc<SaleService>>,
    tenant: TenantContext,
    path: web::Path<i64>,
    request: web::Json<RecordPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let payment = service
        .record_payment(tenant.company_id, path.into_inner(), request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(payment))
}

/// GET /sales/{id}/payments
pub async fn list_payments(
    service: web::Data<Arc<SaleService>>,
    tenant: TenantContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let payments = service
        .list_payments(tenant.company_id, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(payments))
}

/// Configure sale routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sales")
            .route("", web::post().to(create_sale))
            .route("", web::get().to(list_sales))
            .route("/{id}", web::get().to(get_sale))
            .route("/{id}", web::put().to(update_sale))
            .route("/{id}", web::delete().to(delete_sale))
            .route("/{id}/accessories", web::post().to(attach_accessory))
            .route(
                "/{id}/accessories/{line_id}",
                web::delete().to(detach_accessory),
            )
            .route("/{id}/payments", web::post().to(record_payment))
            .route("/{id}/payments", web::get().to(list_payments)),
    );
}
