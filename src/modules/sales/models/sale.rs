// Sale aggregate root
//
// A sale ties one customer, one trip and one seller together inside a
// company. `total_amount` and `commission_amount` are derived: they are
// private here and only the totals engine writes them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use super::accessory_line::{AccessoryLineResponse, PricedAccessoryLine};
use crate::core::money::{self, ONE_CENT};
use crate::core::{AppError, Result};

/// Commercial lifecycle of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleStatus {
    /// Quote, not yet accepted by the customer
    #[serde(rename = "orcamento")]
    Quote,

    #[serde(rename = "pendente")]
    Pending,

    #[serde(rename = "confirmada")]
    Confirmed,

    #[serde(rename = "paga")]
    Paid,

    #[serde(rename = "cancelada")]
    Cancelled,

    #[serde(rename = "reembolsada")]
    Refunded,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

impl SaleStatus {
    /// Cancelled and refunded sales no longer accept payments
    pub fn accepts_payments(&self) -> bool {
        !matches!(self, SaleStatus::Cancelled | SaleStatus::Refunded)
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaleStatus::Quote => write!(f, "orcamento"),
            SaleStatus::Pending => write!(f, "pendente"),
            SaleStatus::Confirmed => write!(f, "confirmada"),
            SaleStatus::Paid => write!(f, "paga"),
            SaleStatus::Cancelled => write!(f, "cancelada"),
            SaleStatus::Refunded => write!(f, "reembolsada"),
        }
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "orcamento" => Ok(SaleStatus::Quote),
            "pendente" => Ok(SaleStatus::Pending),
            "confirmada" => Ok(SaleStatus::Confirmed),
            "paga" => Ok(SaleStatus::Paid),
            "cancelada" => Ok(SaleStatus::Cancelled),
            "reembolsada" => Ok(SaleStatus::Refunded),
            _ => Err(format!("Invalid sale status: {}", s)),
        }
    }
}

impl TryFrom<String> for SaleStatus {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// Settlement state of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "pendente")]
    Pending,

    #[serde(rename = "parcial")]
    Partial,

    #[serde(rename = "pago")]
    Paid,

    #[serde(rename = "atrasado")]
    Overdue,

    #[serde(rename = "cancelado")]
    Cancelled,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pendente"),
            PaymentStatus::Partial => write!(f, "parcial"),
            PaymentStatus::Paid => write!(f, "pago"),
            PaymentStatus::Overdue => write!(f, "atrasado"),
            PaymentStatus::Cancelled => write!(f, "cancelado"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(PaymentStatus::Pending),
            "parcial" => Ok(PaymentStatus::Partial),
            "pago" => Ok(PaymentStatus::Paid),
            "atrasado" => Ok(PaymentStatus::Overdue),
            "cancelado" => Ok(PaymentStatus::Cancelled),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// The inputs the totals engine derives from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleFinancials {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub commission_percentage: Option<Decimal>,
}

/// Sale row
#[derive(Debug, Clone, FromRow)]
pub struct Sale {
    pub id: i64,
    pub company_id: i64,
    pub customer_id: i64,
    pub trip_id: i64,
    pub seller_id: i64,

    pub subtotal: Decimal,
    pub discount_amount: Decimal,

    /// Informational; reconciled with `discount_amount` to the cent
    pub discount_percentage: Option<Decimal>,
    pub tax_amount: Decimal,
    pub commission_percentage: Option<Decimal>,

    total_amount: Decimal,
    commission_amount: Decimal,

    #[sqlx(try_from = "String")]
    pub status: SaleStatus,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,

    pub sale_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,

    /// Number of installments (1..=max_installments)
    pub installments: i32,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for POST /sales
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleRequest {
    pub customer_id: i64,
    pub trip_id: i64,
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub tax_amount: Option<Decimal>,
    #[serde(default)]
    pub commission_percentage: Option<Decimal>,
    #[serde(default)]
    pub status: Option<SaleStatus>,
    #[serde(default)]
    pub sale_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub installments: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for PUT /sales/{id}; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSaleRequest {
    pub customer_id: Option<i64>,
    pub trip_id: Option<i64>,
    pub subtotal: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub tax_amount: Option<Decimal>,

    /// Absent leaves it untouched; an explicit `null` clears it
    #[serde(default, deserialize_with = "explicit_null")]
    pub commission_percentage: Option<Option<Decimal>>,
    pub status: Option<SaleStatus>,

    /// Only `cancelado` and `atrasado` may be set by hand; the rest is
    /// derived from payments
    pub payment_status: Option<PaymentStatus>,
    pub sale_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub installments: Option<i32>,
    pub notes: Option<String>,
}

/// Tell an explicit `null` apart from an absent field
fn explicit_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Sale {
    /// Build and validate a new sale. Totals start at zero until the
    /// engine runs.
    pub fn new(
        company_id: i64,
        seller_id: i64,
        request: CreateSaleRequest,
        max_installments: i32,
    ) -> Result<Self> {
        let discount_amount = Self::resolve_discount(
            request.subtotal,
            request.discount_amount,
            request.discount_percentage,
        )?;
        let now = Utc::now();

        let sale = Self {
            id: 0, // set by the store
            company_id,
            customer_id: request.customer_id,
            trip_id: request.trip_id,
            seller_id,
            subtotal: request.subtotal,
            discount_amount,
            discount_percentage: request.discount_percentage,
            tax_amount: request.tax_amount.unwrap_or(Decimal::ZERO),
            commission_percentage: request.commission_percentage,
            total_amount: Decimal::ZERO,
            commission_amount: Decimal::ZERO,
            status: request.status.unwrap_or_default(),
            payment_status: PaymentStatus::Pending,
            sale_date: request.sale_date.unwrap_or_else(|| now.date_naive()),
            due_date: request.due_date,
            payment_date: None,
            delivery_date: request.delivery_date,
            installments: request.installments.unwrap_or(1),
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        sale.validate(max_installments)?;
        Ok(sale)
    }

    /// Apply a partial update and re-validate.
    ///
    /// Discount handling: an explicit amount clears a stale percentage, an
    /// explicit percentage re-derives the amount, and a subtotal change
    /// re-derives the amount from the stored percentage when one exists.
    pub fn apply_update(&mut self, request: UpdateSaleRequest, max_installments: i32) -> Result<()> {
        if let Some(payment_status) = request.payment_status {
            if !matches!(payment_status, PaymentStatus::Cancelled | PaymentStatus::Overdue) {
                return Err(AppError::validation(format!(
                    "payment_status '{}' is derived from payments and cannot be set",
                    payment_status
                )));
            }
        }

        let subtotal_changed = request
            .subtotal
            .map(|s| s != self.subtotal)
            .unwrap_or(false);

        if let Some(subtotal) = request.subtotal {
            self.subtotal = subtotal;
        }

        match (request.discount_amount, request.discount_percentage) {
            (None, None) => {
                if subtotal_changed {
                    if let Some(pct) = self.discount_percentage {
                        self.discount_amount = money::percentage_of(self.subtotal, pct);
                    }
                }
            }
            (amount, pct) => {
                self.discount_amount = Self::resolve_discount(self.subtotal, amount, pct)?;
                self.discount_percentage = pct;
            }
        }

        if let Some(tax) = request.tax_amount {
            self.tax_amount = tax;
        }
        if let Some(pct) = request.commission_percentage {
            self.commission_percentage = pct;
        }
        if let Some(customer_id) = request.customer_id {
            self.customer_id = customer_id;
        }
        if let Some(trip_id) = request.trip_id {
            self.trip_id = trip_id;
        }
        if let Some(status) = request.status {
            self.status = status;
        }
        if let Some(payment_status) = request.payment_status {
            self.payment_status = payment_status;
        }
        if let Some(date) = request.sale_date {
            self.sale_date = date;
        }
        if let Some(date) = request.due_date {
            self.due_date = Some(date);
        }
        if let Some(date) = request.delivery_date {
            self.delivery_date = Some(date);
        }
        if let Some(installments) = request.installments {
            self.installments = installments;
        }
        if let Some(notes) = request.notes {
            self.notes = Some(notes);
        }

        self.updated_at = Utc::now();
        self.validate(max_installments)
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn commission_amount(&self) -> Decimal {
        self.commission_amount
    }

    pub fn financials(&self) -> SaleFinancials {
        SaleFinancials {
            subtotal: self.subtotal,
            discount_amount: self.discount_amount,
            tax_amount: self.tax_amount,
            commission_percentage: self.commission_percentage,
        }
    }

    /// Only the totals engine calls this
    pub(crate) fn set_totals(&mut self, total_amount: Decimal, commission_amount: Decimal) {
        self.total_amount = total_amount;
        self.commission_amount = commission_amount;
    }

    /// Field-level rules checked before the engine ever runs
    pub fn validate(&self, max_installments: i32) -> Result<()> {
        money::validate_amount("subtotal", self.subtotal)?;
        money::validate_amount("discount_amount", self.discount_amount)?;
        money::validate_amount("tax_amount", self.tax_amount)?;

        if self.discount_amount > self.subtotal {
            return Err(AppError::validation(format!(
                "discount_amount ({}) cannot exceed subtotal ({})",
                self.discount_amount, self.subtotal
            )));
        }

        if let Some(pct) = self.discount_percentage {
            money::validate_percentage("discount_percentage", pct)?;
            Self::ensure_discount_reconciles(self.subtotal, self.discount_amount, pct)?;
        }

        if let Some(pct) = self.commission_percentage {
            money::validate_percentage("commission_percentage", pct)?;
        }

        if self.installments < 1 || self.installments > max_installments {
            return Err(AppError::validation(format!(
                "installments must be between 1 and {}, got: {}",
                max_installments, self.installments
            )));
        }

        if let Some(due) = self.due_date {
            if due < self.sale_date {
                return Err(AppError::validation(format!(
                    "due_date ({}) cannot be before sale_date ({})",
                    due, self.sale_date
                )));
            }
        }

        Ok(())
    }

    fn resolve_discount(
        subtotal: Decimal,
        amount: Option<Decimal>,
        percentage: Option<Decimal>,
    ) -> Result<Decimal> {
        match (amount, percentage) {
            (Some(amount), _) => Ok(amount),
            (None, Some(pct)) => {
                money::validate_percentage("discount_percentage", pct)?;
                Ok(money::percentage_of(subtotal, pct))
            }
            (None, None) => Ok(Decimal::ZERO),
        }
    }

    fn ensure_discount_reconciles(subtotal: Decimal, amount: Decimal, pct: Decimal) -> Result<()> {
        let expected = money::percentage_of(subtotal, pct);
        if (expected - amount).abs() > ONE_CENT {
            return Err(AppError::validation(format!(
                "discount_amount ({}) does not match discount_percentage ({}%) of subtotal ({}): expected {}",
                amount, pct, subtotal, expected
            )));
        }
        Ok(())
    }
}

/// Response body for a sale
#[derive(Debug, Serialize, Deserialize)]
pub struct SaleResponse {
    pub id: i64,
    pub company_id: i64,
    pub customer_id: i64,
    pub trip_id: i64,
    pub seller_id: i64,
    pub subtotal: String,
    pub discount_amount: String,
    pub discount_percentage: Option<String>,
    pub tax_amount: String,
    pub accessories_total: String,
    pub total_amount: String,
    pub commission_percentage: Option<String>,
    pub commission_amount: String,
    pub paid_amount: String,
    pub balance_due: String,
    pub status: SaleStatus,
    pub payment_status: PaymentStatus,
    pub sale_date: String,
    pub due_date: Option<String>,
    pub payment_date: Option<String>,
    pub delivery_date: Option<String>,
    pub installments: i32,
    pub notes: Option<String>,
    pub accessories: Vec<AccessoryLineResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl SaleResponse {
    pub fn new(sale: Sale, lines: Vec<PricedAccessoryLine>, paid_amount: Decimal) -> Self {
        let accessories_total: Decimal = lines.iter().map(PricedAccessoryLine::line_total).sum();

        Self {
            id: sale.id,
            company_id: sale.company_id,
            customer_id: sale.customer_id,
            trip_id: sale.trip_id,
            seller_id: sale.seller_id,
            subtotal: money::format(sale.subtotal),
            discount_amount: money::format(sale.discount_amount),
            discount_percentage: sale.discount_percentage.map(|p| p.normalize().to_string()),
            tax_amount: money::format(sale.tax_amount),
            accessories_total: money::format(accessories_total),
            total_amount: money::format(sale.total_amount),
            commission_percentage: sale.commission_percentage.map(|p| p.normalize().to_string()),
            commission_amount: money::format(sale.commission_amount),
            paid_amount: money::format(paid_amount),
            balance_due: money::format(sale.total_amount - paid_amount),
            status: sale.status,
            payment_status: sale.payment_status,
            sale_date: sale.sale_date.to_string(),
            due_date: sale.due_date.map(|d| d.to_string()),
            payment_date: sale.payment_date.map(|d| d.to_string()),
            delivery_date: sale.delivery_date.map(|d| d.to_string()),
            installments: sale.installments,
            notes: sale.notes,
            accessories: lines.into_iter().map(AccessoryLineResponse::from).collect(),
            created_at: sale.created_at.to_rfc3339(),
            updated_at: sale.updated_at.to_rfc3339(),
        }
    }
}
