pub mod mysql_sale_store;
pub mod sale_store;

pub use mysql_sale_store::MySqlSaleStore;
pub use sale_store::{SaleStore, SaleUnitOfWork};
