// MySQL implementation of the sale store
//
// Tables: sales, sale_accessories, sale_payments (owned here) and trips,
// vehicles, bookings, accessories, customers (read only).

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, MySql, MySqlConnection, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::accessories::models::Accessory;
use crate::modules::sales::models::{PricedAccessoryLine, Sale, SalePayment};
use crate::modules::sales::repositories::sale_store::{SaleStore, SaleUnitOfWork};
use crate::modules::sales::services::totals_engine::RecalculatedSale;
use crate::modules::trips::models::TripOccupancy;

const SALE_COLUMNS: &str = r#"
    id, company_id, customer_id, trip_id, seller_id,
    subtotal, discount_amount, discount_percentage, tax_amount,
    commission_percentage, total_amount, commission_amount,
    status, payment_status, sale_date, due_date, payment_date, delivery_date,
    installments, notes, created_at, updated_at
"#;

/// Bookings in this status do not hold seats
const CANCELLED_BOOKING: &str = "cancelada";

/// Sale store backed by a MySQL pool
pub struct MySqlSaleStore {
    pool: MySqlPool,
}

impl MySqlSaleStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl SaleStore for MySqlSaleStore {
    async fn begin(&self) -> Result<Box<dyn SaleUnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        Ok(Box::new(MySqlUnitOfWork { tx: Some(tx) }))
    }

    async fn find_sale(&self, sale_id: i64, company_id: i64) -> Result<Option<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE id = ? AND company_id = ?",
            SALE_COLUMNS
        );

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    async fn list_sales(&self, company_id: i64, limit: i64, offset: i64) -> Result<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE company_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            SALE_COLUMNS
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(company_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to list sales: {}", e)))?;

        Ok(sales)
    }

    async fn priced_lines(&self, sale_id: i64) -> Result<Vec<PricedAccessoryLine>> {
        fetch_priced_lines(&self.pool, sale_id).await
    }

    async fn payments(&self, sale_id: i64) -> Result<Vec<SalePayment>> {
        let payments = sqlx::query_as::<_, SalePayment>(
            r#"
            SELECT id, sale_id, amount, payment_method, payment_date, notes, created_at
            FROM sale_payments
            WHERE sale_id = ?
            ORDER BY payment_date, id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}

/// One MySQL transaction; rolls back on drop unless committed
pub struct MySqlUnitOfWork {
    tx: Option<Transaction<'static, MySql>>,
}

impl MySqlUnitOfWork {
    fn conn(&mut self) -> Result<&mut MySqlConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::internal("Unit of work already committed"))
    }
}

#[derive(FromRow)]
struct TripRow {
    trip_id: i64,
    vehicle_id: Option<i64>,
    driver_id: Option<i64>,
    vehicle_capacity: Option<i32>,
    max_passengers: Option<i32>,
}

#[async_trait]
impl SaleUnitOfWork for MySqlUnitOfWork {
    async fn lock_trip(&mut self, trip_id: i64, company_id: i64) -> Result<Option<TripOccupancy>> {
        let conn = self.conn()?;

        let row = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT t.id AS trip_id, t.vehicle_id, t.driver_id,
                   v.capacity AS vehicle_capacity, t.max_passengers
            FROM trips t
            LEFT JOIN vehicles v ON v.id = t.vehicle_id
            WHERE t.id = ? AND t.company_id = ?
            FOR UPDATE
            "#,
        )
        .bind(trip_id)
        .bind(company_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        // Counted under the trip lock with locking reads, which see the
        // latest committed rows rather than the transaction snapshot.
        // Needs an index on sales.trip_id, or the share lock covers every
        // sale row and collides with lock_sale in other units.
        let sold_seats: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE trip_id = ? LOCK IN SHARE MODE")
                .bind(trip_id)
                .fetch_one(&mut *conn)
                .await?;

        let booked_passengers: i64 = sqlx::query_scalar(
            r#"
            SELECT CAST(COALESCE(SUM(passengers), 0) AS SIGNED)
            FROM bookings
            WHERE trip_id = ? AND status <> ?
            LOCK IN SHARE MODE
            "#,
        )
        .bind(trip_id)
        .bind(CANCELLED_BOOKING)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Some(TripOccupancy {
            trip_id: row.trip_id,
            vehicle_id: row.vehicle_id,
            driver_id: row.driver_id,
            vehicle_capacity: row.vehicle_capacity,
            max_passengers: row.max_passengers,
            sold_seats,
            booked_passengers,
        }))
    }

    async fn lock_sale(&mut self, sale_id: i64, company_id: i64) -> Result<Option<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE id = ? AND company_id = ? FOR UPDATE",
            SALE_COLUMNS
        );

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_id)
            .bind(company_id)
            .fetch_optional(self.conn()?)
            .await?;

        Ok(sale)
    }

    async fn customer_exists(&mut self, customer_id: i64, company_id: i64) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE id = ? AND company_id = ?")
                .bind(customer_id)
                .bind(company_id)
                .fetch_one(self.conn()?)
                .await?;

        Ok(count > 0)
    }

    async fn find_accessory(
        &mut self,
        accessory_id: i64,
        company_id: i64,
    ) -> Result<Option<Accessory>> {
        let accessory = sqlx::query_as::<_, Accessory>(
            "SELECT id, company_id, name, value FROM accessories WHERE id = ? AND company_id = ?",
        )
        .bind(accessory_id)
        .bind(company_id)
        .fetch_optional(self.conn()?)
        .await?;

        Ok(accessory)
    }

    async fn priced_lines(&mut self, sale_id: i64) -> Result<Vec<PricedAccessoryLine>> {
        fetch_priced_lines(self.conn()?, sale_id).await
    }

    async fn paid_amount(&mut self, sale_id: i64) -> Result<Decimal> {
        let paid: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM sale_payments WHERE sale_id = ?",
        )
        .bind(sale_id)
        .fetch_one(self.conn()?)
        .await?;

        Ok(paid)
    }

    async fn insert_sale(&mut self, recalculated: &RecalculatedSale) -> Result<i64> {
        let sale = recalculated.sale();

        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                company_id, customer_id, trip_id, seller_id,
                subtotal, discount_amount, discount_percentage, tax_amount,
                commission_percentage, total_amount, commission_amount,
                status, payment_status, sale_date, due_date, payment_date, delivery_date,
                installments, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sale.company_id)
        .bind(sale.customer_id)
        .bind(sale.trip_id)
        .bind(sale.seller_id)
        .bind(sale.subtotal)
        .bind(sale.discount_amount)
        .bind(sale.discount_percentage)
        .bind(sale.tax_amount)
        .bind(sale.commission_percentage)
        .bind(sale.total_amount())
        .bind(sale.commission_amount())
        .bind(sale.status.to_string())
        .bind(sale.payment_status.to_string())
        .bind(sale.sale_date)
        .bind(sale.due_date)
        .bind(sale.payment_date)
        .bind(sale.delivery_date)
        .bind(sale.installments)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(self.conn()?)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create sale: {}", e)))?;

        Ok(result.last_insert_id() as i64)
    }

    async fn update_sale(&mut self, recalculated: &RecalculatedSale) -> Result<()> {
        let sale = recalculated.sale();

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                customer_id = ?, trip_id = ?,
                subtotal = ?, discount_amount = ?, discount_percentage = ?, tax_amount = ?,
                commission_percentage = ?, total_amount = ?, commission_amount = ?,
                status = ?, payment_status = ?,
                sale_date = ?, due_date = ?, payment_date = ?, delivery_date = ?,
                installments = ?, notes = ?, updated_at = ?
            WHERE id = ? AND company_id = ?
            "#,
        )
        .bind(sale.customer_id)
        .bind(sale.trip_id)
        .bind(sale.subtotal)
        .bind(sale.discount_amount)
        .bind(sale.discount_percentage)
        .bind(sale.tax_amount)
        .bind(sale.commission_percentage)
        .bind(sale.total_amount())
        .bind(sale.commission_amount())
        .bind(sale.status.to_string())
        .bind(sale.payment_status.to_string())
        .bind(sale.sale_date)
        .bind(sale.due_date)
        .bind(sale.payment_date)
        .bind(sale.delivery_date)
        .bind(sale.installments)
        .bind(&sale.notes)
        .bind(sale.updated_at)
        .bind(sale.id)
        .bind(sale.company_id)
        .execute(self.conn()?)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update sale: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Sale {} not found", sale.id)));
        }

        Ok(())
    }

    async fn delete_sale(&mut self, sale_id: i64) -> Result<()> {
        let conn = self.conn()?;

        sqlx::query("DELETE FROM sale_payments WHERE sale_id = ?")
            .bind(sale_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query("DELETE FROM sale_accessories WHERE sale_id = ?")
            .bind(sale_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query("DELETE FROM sales WHERE id = ?")
            .bind(sale_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn insert_line(&mut self, sale_id: i64, accessory_id: i64, quantity: i32) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sale_accessories (sale_id, accessory_id, quantity, created_at)
            VALUES (?, ?, ?, NOW())
            "#,
        )
        .bind(sale_id)
        .bind(accessory_id)
        .bind(quantity)
        .execute(self.conn()?)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to attach accessory: {}", e)))?;

        Ok(result.last_insert_id() as i64)
    }

    async fn delete_line(&mut self, sale_id: i64, line_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sale_accessories WHERE id = ? AND sale_id = ?")
            .bind(line_id)
            .bind(sale_id)
            .execute(self.conn()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_payment(&mut self, payment: &SalePayment) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sale_payments (
                sale_id, amount, payment_method, payment_date, notes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.sale_id)
        .bind(payment.amount)
        .bind(payment.payment_method.to_string())
        .bind(payment.payment_date)
        .bind(&payment.notes)
        .bind(payment.created_at)
        .execute(self.conn()?)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to record payment: {}", e)))?;

        Ok(result.last_insert_id() as i64)
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::internal("Unit of work already committed"))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))
    }
}

async fn fetch_priced_lines<'e, E>(executor: E, sale_id: i64) -> Result<Vec<PricedAccessoryLine>>
where
    E: Executor<'e, Database = MySql>,
{
    let lines = sqlx::query_as::<_, PricedAccessoryLine>(
        r#"
        SELECT sa.id AS line_id, sa.accessory_id, a.name AS accessory_name,
               sa.quantity, a.value AS unit_value
        FROM sale_accessories sa
        LEFT JOIN accessories a ON a.id = sa.accessory_id
        WHERE sa.sale_id = ?
        ORDER BY sa.id
        "#,
    )
    .bind(sale_id)
    .fetch_all(executor)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to fetch accessory lines: {}", e)))?;

    Ok(lines)
}
