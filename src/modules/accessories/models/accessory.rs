use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Catalog accessory as seen by a sale
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Accessory {
    pub id: i64,

    /// Owning tenant
    pub company_id: i64,

    pub name: String,

    /// Current catalog price per unit
    pub value: Decimal,
}
