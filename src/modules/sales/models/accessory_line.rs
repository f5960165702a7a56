// Accessory lines attach N units of a catalog accessory to a sale.
//
// The unit value is looked up from the live catalog on every read, so a
// line whose accessory was deleted comes back with `unit_value = None`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::money;
use crate::core::{AppError, Result};

/// Accessory line joined with the accessory's current catalog price
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PricedAccessoryLine {
    pub line_id: i64,
    pub accessory_id: i64,

    /// None when the catalog row is gone
    pub accessory_name: Option<String>,

    pub quantity: i32,

    /// None when the catalog row is gone
    pub unit_value: Option<Decimal>,
}

impl PricedAccessoryLine {
    /// `quantity × unit_value`; unresolved accessories contribute nothing
    pub fn line_total(&self) -> Decimal {
        match self.unit_value {
            Some(value) => value * Decimal::from(self.quantity),
            None => Decimal::ZERO,
        }
    }
}

/// Request body for POST /sales/{id}/accessories
#[derive(Debug, Clone, Deserialize)]
pub struct AttachAccessoryRequest {
    pub accessory_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

impl AttachAccessoryRequest {
    pub fn validate(&self) -> Result<()> {
        if self.quantity < 1 {
            return Err(AppError::validation(format!(
                "Quantity must be positive, got: {}",
                self.quantity
            )));
        }
        Ok(())
    }
}

/// One line in a sale response
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessoryLineResponse {
    pub id: i64,
    pub accessory_id: i64,
    pub name: Option<String>,
    pub quantity: i32,
    pub unit_value: Option<String>,
    pub line_total: String,
}

impl From<PricedAccessoryLine> for AccessoryLineResponse {
    fn from(line: PricedAccessoryLine) -> Self {
        let line_total = money::format(line.line_total());
        Self {
            id: line.line_id,
            accessory_id: line.accessory_id,
            name: line.accessory_name,
            quantity: line.quantity,
            unit_value: line.unit_value.map(money::format),
            line_total,
        }
    }
}
