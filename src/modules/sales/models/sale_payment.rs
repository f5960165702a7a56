// Partial payments received against a sale

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::money;
use crate::core::Result;

/// How the customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Dinheiro,
    CartaoCredito,
    CartaoDebito,
    Pix,
    Transferencia,
    Boleto,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Dinheiro => write!(f, "dinheiro"),
            PaymentMethod::CartaoCredito => write!(f, "cartao_credito"),
            PaymentMethod::CartaoDebito => write!(f, "cartao_debito"),
            PaymentMethod::Pix => write!(f, "pix"),
            PaymentMethod::Transferencia => write!(f, "transferencia"),
            PaymentMethod::Boleto => write!(f, "boleto"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "dinheiro" => Ok(PaymentMethod::Dinheiro),
            "cartao_credito" => Ok(PaymentMethod::CartaoCredito),
            "cartao_debito" => Ok(PaymentMethod::CartaoDebito),
            "pix" => Ok(PaymentMethod::Pix),
            "transferencia" => Ok(PaymentMethod::Transferencia),
            "boleto" => Ok(PaymentMethod::Boleto),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// Payment row
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SalePayment {
    pub id: i64,
    pub sale_id: i64,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for POST /sales/{id}/payments
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SalePayment {
    /// Validate a payment request; the ledger check happens in the service
    /// once the sale is locked.
    pub fn new(sale_id: i64, request: RecordPaymentRequest) -> Result<Self> {
        money::validate_positive_amount("amount", request.amount)?;

        let now = Utc::now();
        Ok(Self {
            id: 0, // set by the store
            sale_id,
            amount: request.amount,
            payment_method: request.payment_method,
            payment_date: request.payment_date.unwrap_or_else(|| now.date_naive()),
            notes: request.notes,
            created_at: now,
        })
    }
}

/// Response body for a payment
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: i64,
    pub sale_id: i64,
    pub amount: String,
    pub payment_method: PaymentMethod,
    pub payment_date: String,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<SalePayment> for PaymentResponse {
    fn from(payment: SalePayment) -> Self {
        Self {
            id: payment.id,
            sale_id: payment.sale_id,
            amount: money::format(payment.amount),
            payment_method: payment.payment_method,
            payment_date: payment.payment_date.to_string(),
            notes: payment.notes,
            created_at: payment.created_at.to_rfc3339(),
        }
    }
}
