// Storage seams for the sale aggregate.
//
// `SaleStore` serves plain reads and opens units of work. A
// `SaleUnitOfWork` is one database transaction: the `lock_*` methods take
// row locks that are held until `commit`, and dropping the unit without
// committing rolls everything back.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::Result;
use crate::modules::accessories::models::Accessory;
use crate::modules::sales::models::{PricedAccessoryLine, Sale, SalePayment};
use crate::modules::sales::services::totals_engine::RecalculatedSale;
use crate::modules::trips::models::TripOccupancy;

#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Open a transaction
    async fn begin(&self) -> Result<Box<dyn SaleUnitOfWork>>;

    async fn find_sale(&self, sale_id: i64, company_id: i64) -> Result<Option<Sale>>;

    /// Newest first
    async fn list_sales(&self, company_id: i64, limit: i64, offset: i64) -> Result<Vec<Sale>>;

    async fn priced_lines(&self, sale_id: i64) -> Result<Vec<PricedAccessoryLine>>;

    async fn payments(&self, sale_id: i64) -> Result<Vec<SalePayment>>;
}

#[async_trait]
pub trait SaleUnitOfWork: Send {
    /// Lock the trip row and read its occupancy. `None` if the trip does
    /// not exist in this company.
    async fn lock_trip(&mut self, trip_id: i64, company_id: i64) -> Result<Option<TripOccupancy>>;

    /// Lock the sale row for the rest of the unit
    async fn lock_sale(&mut self, sale_id: i64, company_id: i64) -> Result<Option<Sale>>;

    async fn customer_exists(&mut self, customer_id: i64, company_id: i64) -> Result<bool>;

    async fn find_accessory(&mut self, accessory_id: i64, company_id: i64)
        -> Result<Option<Accessory>>;

    /// Lines as currently visible inside this unit, including its own writes
    async fn priced_lines(&mut self, sale_id: i64) -> Result<Vec<PricedAccessoryLine>>;

    async fn paid_amount(&mut self, sale_id: i64) -> Result<Decimal>;

    /// Returns the new sale id
    async fn insert_sale(&mut self, sale: &RecalculatedSale) -> Result<i64>;

    async fn update_sale(&mut self, sale: &RecalculatedSale) -> Result<()>;

    /// Removes the sale with its lines and payments
    async fn delete_sale(&mut self, sale_id: i64) -> Result<()>;

    /// Returns the new line id
    async fn insert_line(&mut self, sale_id: i64, accessory_id: i64, quantity: i32) -> Result<i64>;

    /// `false` if no such line exists on the sale
    async fn delete_line(&mut self, sale_id: i64, line_id: i64) -> Result<bool>;

    /// Returns the new payment id
    async fn insert_payment(&mut self, payment: &SalePayment) -> Result<i64>;

    async fn commit(&mut self) -> Result<()>;
}
