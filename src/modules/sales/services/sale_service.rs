use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::sales::models::{
    AttachAccessoryRequest, CreateSaleRequest, PaymentResponse, PaymentStatus,
    RecordPaymentRequest, Sale, SalePayment, SaleResponse, UpdateSaleRequest,
};
use crate::modules::sales::repositories::{SaleStore, SaleUnitOfWork};
use crate::modules::sales::services::ledger_guard::LedgerGuard;
use crate::modules::sales::services::totals_engine::{RecalculatedSale, TotalsEngine};
use crate::modules::trips::services::CapacityChecker;

/// Default page size for sale listings
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Service for the sale aggregate.
///
/// Every operation takes the tenant's `company_id` explicitly. Every write
/// runs inside one unit of work and goes through [`SaleService::persist`],
/// which re-reads the line set, recalculates and saves.
pub struct SaleService {
    store: Arc<dyn SaleStore>,
    max_installments: i32,
}

impl SaleService {
    pub fn new(store: Arc<dyn SaleStore>, max_installments: i32) -> Self {
        Self {
            store,
            max_installments,
        }
    }

    /// Create a sale on a trip with a free seat
    pub async fn create_sale(
        &self,
        company_id: i64,
        seller_id: i64,
        request: CreateSaleRequest,
    ) -> Result<SaleResponse> {
        let sale = Sale::new(company_id, seller_id, request, self.max_installments)?;

        let mut uow = self.store.begin().await?;

        if !uow.customer_exists(sale.customer_id, company_id).await? {
            return Err(AppError::not_found(format!(
                "Customer {} not found",
                sale.customer_id
            )));
        }

        let trip = uow
            .lock_trip(sale.trip_id, company_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Trip {} not found", sale.trip_id)))?;
        CapacityChecker::ensure_seat_available(&trip)?;

        // A new sale has no accessory lines yet
        let recalculated = TotalsEngine::apply(sale, &[]);
        let sale_id = uow.insert_sale(&recalculated).await?;
        uow.commit().await?;

        info!(
            sale_id = sale_id,
            company_id = company_id,
            trip_id = recalculated.sale().trip_id,
            total_amount = %recalculated.sale().total_amount(),
            "Sale created"
        );

        self.get_sale(company_id, sale_id).await
    }

    /// Apply a partial update; moving to another trip re-checks capacity
    pub async fn update_sale(
        &self,
        company_id: i64,
        sale_id: i64,
        request: UpdateSaleRequest,
    ) -> Result<SaleResponse> {
        let mut uow = self.store.begin().await?;

        // Trip before sale, the same order create_sale takes its locks in
        let target_trip = match request.trip_id {
            Some(trip_id) => Some(
                uow.lock_trip(trip_id, company_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Trip {} not found", trip_id)))?,
            ),
            None => None,
        };

        let mut sale = Self::lock_sale(uow.as_mut(), sale_id, company_id).await?;
        let baseline_total = Self::live_total(uow.as_mut(), &sale).await?;

        let previous_trip = sale.trip_id;
        let previous_customer = sale.customer_id;
        sale.apply_update(request, self.max_installments)?;

        if sale.customer_id != previous_customer
            && !uow.customer_exists(sale.customer_id, company_id).await?
        {
            return Err(AppError::not_found(format!(
                "Customer {} not found",
                sale.customer_id
            )));
        }

        if let Some(trip) = target_trip.filter(|t| t.trip_id != previous_trip) {
            CapacityChecker::ensure_seat_available(&trip)?;
        }

        let recalculated = Self::persist(uow.as_mut(), sale, baseline_total).await?;
        uow.commit().await?;

        info!(
            sale_id = sale_id,
            company_id = company_id,
            total_amount = %recalculated.sale().total_amount(),
            commission_amount = %recalculated.sale().commission_amount(),
            "Sale updated"
        );

        self.get_sale(company_id, sale_id).await
    }

    /// Remove a sale together with its lines and payments
    pub async fn delete_sale(&self, company_id: i64, sale_id: i64) -> Result<()> {
        let mut uow = self.store.begin().await?;
        Self::lock_sale(uow.as_mut(), sale_id, company_id).await?;

        uow.delete_sale(sale_id).await?;
        uow.commit().await?;

        info!(sale_id = sale_id, company_id = company_id, "Sale deleted");
        Ok(())
    }

    pub async fn get_sale(&self, company_id: i64, sale_id: i64) -> Result<SaleResponse> {
        let sale = self
            .store
            .find_sale(sale_id, company_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale {} not found", sale_id)))?;

        self.to_response(sale).await
    }

    pub async fn list_sales(
        &self,
        company_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SaleResponse>> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = offset.max(0);

        let sales = self.store.list_sales(company_id, limit, offset).await?;

        let mut responses = Vec::with_capacity(sales.len());
        for sale in sales {
            responses.push(self.to_response(sale).await?);
        }

        Ok(responses)
    }

    /// Attach N units of a catalog accessory and recalculate
    pub async fn attach_accessory(
        &self,
        company_id: i64,
        sale_id: i64,
        request: AttachAccessoryRequest,
    ) -> Result<SaleResponse> {
        request.validate()?;

        let mut uow = self.store.begin().await?;
        let sale = Self::lock_sale(uow.as_mut(), sale_id, company_id).await?;

        let accessory = uow
            .find_accessory(request.accessory_id, company_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Accessory {} not found", request.accessory_id))
            })?;

        let baseline_total = Self::live_total(uow.as_mut(), &sale).await?;
        let line_id = uow
            .insert_line(sale_id, accessory.id, request.quantity)
            .await?;
        let recalculated = Self::persist(uow.as_mut(), sale, baseline_total).await?;
        uow.commit().await?;

        info!(
            sale_id = sale_id,
            line_id = line_id,
            accessory_id = accessory.id,
            quantity = request.quantity,
            total_amount = %recalculated.sale().total_amount(),
            "Accessory attached"
        );

        self.get_sale(company_id, sale_id).await
    }

    /// Detach an accessory line and recalculate
    pub async fn detach_accessory(
        &self,
        company_id: i64,
        sale_id: i64,
        line_id: i64,
    ) -> Result<SaleResponse> {
        let mut uow = self.store.begin().await?;
        let sale = Self::lock_sale(uow.as_mut(), sale_id, company_id).await?;
        let baseline_total = Self::live_total(uow.as_mut(), &sale).await?;

        if !uow.delete_line(sale_id, line_id).await? {
            return Err(AppError::not_found(format!(
                "Accessory line {} not found on sale {}",
                line_id, sale_id
            )));
        }

        let recalculated = Self::persist(uow.as_mut(), sale, baseline_total).await?;
        uow.commit().await?;

        info!(
            sale_id = sale_id,
            line_id = line_id,
            total_amount = %recalculated.sale().total_amount(),
            "Accessory detached"
        );

        self.get_sale(company_id, sale_id).await
    }

    /// Record a partial payment if it fits under the sale total
    pub async fn record_payment(
        &self,
        company_id: i64,
        sale_id: i64,
        request: RecordPaymentRequest,
    ) -> Result<PaymentResponse> {
        let mut payment = SalePayment::new(sale_id, request)?;

        let mut uow = self.store.begin().await?;
        let mut sale = Self::lock_sale(uow.as_mut(), sale_id, company_id).await?;

        if !sale.status.accepts_payments() {
            return Err(AppError::validation(format!(
                "Sale {} is {} and does not accept payments",
                sale_id, sale.status
            )));
        }

        // Check against live prices, not the total stored at the last write
        let live_total = Self::live_total(uow.as_mut(), &sale).await?;
        let paid_amount = uow.paid_amount(sale_id).await?;
        LedgerGuard::ensure_payment_fits(sale_id, paid_amount, payment.amount, live_total)?;

        payment.id = uow.insert_payment(&payment).await?;

        if paid_amount + payment.amount >= live_total && sale.payment_date.is_none() {
            sale.payment_date = Some(payment.payment_date);
        }

        let recalculated = Self::persist(uow.as_mut(), sale, live_total).await?;
        uow.commit().await?;

        info!(
            sale_id = sale_id,
            payment_id = payment.id,
            amount = %payment.amount,
            payment_status = %recalculated.sale().payment_status,
            "Payment recorded"
        );

        Ok(PaymentResponse::from(payment))
    }

    pub async fn list_payments(&self, company_id: i64, sale_id: i64) -> Result<Vec<PaymentResponse>> {
        self.store
            .find_sale(sale_id, company_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale {} not found", sale_id)))?;

        let payments = self.store.payments(sale_id).await?;
        Ok(payments.into_iter().map(PaymentResponse::from).collect())
    }

    /// The one write path for an existing sale: read the line set as it is
    /// now inside the unit, derive totals and payment status, check the
    /// ledger still fits, save. `baseline_total` is the live total before
    /// the mutation.
    async fn persist(
        uow: &mut dyn SaleUnitOfWork,
        mut sale: Sale,
        baseline_total: Decimal,
    ) -> Result<RecalculatedSale> {
        let lines = uow.priced_lines(sale.id).await?;
        let paid_amount = uow.paid_amount(sale.id).await?;

        let totals = TotalsEngine::recalculate(&sale.financials(), &lines);
        LedgerGuard::ensure_total_covers_paid(
            sale.id,
            paid_amount,
            baseline_total,
            totals.total_amount,
        )?;

        sale.payment_status =
            LedgerGuard::payment_status(sale.payment_status, paid_amount, totals.total_amount);
        match sale.payment_status {
            PaymentStatus::Paid => {
                if sale.payment_date.is_none() {
                    sale.payment_date = Some(chrono::Utc::now().date_naive());
                }
            }
            PaymentStatus::Pending | PaymentStatus::Partial => sale.payment_date = None,
            PaymentStatus::Overdue | PaymentStatus::Cancelled => {}
        }

        let recalculated = TotalsEngine::apply(sale, &lines);
        uow.update_sale(&recalculated).await?;

        Ok(recalculated)
    }

    /// Total of the sale at current catalog prices, as seen inside the unit
    async fn live_total(uow: &mut dyn SaleUnitOfWork, sale: &Sale) -> Result<Decimal> {
        let lines = uow.priced_lines(sale.id).await?;
        Ok(TotalsEngine::recalculate(&sale.financials(), &lines).total_amount)
    }

    async fn lock_sale(uow: &mut dyn SaleUnitOfWork, sale_id: i64, company_id: i64) -> Result<Sale> {
        uow.lock_sale(sale_id, company_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale {} not found", sale_id)))
    }

    async fn to_response(&self, sale: Sale) -> Result<SaleResponse> {
        let lines = self.store.priced_lines(sale.id).await?;
        let paid_amount: Decimal = self
            .store
            .payments(sale.id)
            .await?
            .iter()
            .map(|p| p.amount)
            .sum();

        Ok(SaleResponse::new(sale, lines, paid_amount))
    }
}
