pub mod ledger_guard;
pub mod sale_service;
pub mod totals_engine;

pub use ledger_guard::LedgerGuard;
pub use sale_service::SaleService;
pub use totals_engine::{AccessoryAggregator, RecalculatedSale, SaleTotals, TotalsEngine};
