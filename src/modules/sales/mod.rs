// Sales module
//
// The sale aggregate: header, accessory lines and partial payments.

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{PaymentStatus, Sale, SaleResponse, SaleStatus};
pub use repositories::{MySqlSaleStore, SaleStore, SaleUnitOfWork};
pub use services::{LedgerGuard, SaleService, TotalsEngine};
