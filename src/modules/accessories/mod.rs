// Accessories module
//
// Catalog accessories are maintained elsewhere; sales read their current
// price when totals are recomputed.

pub mod models;

pub use models::Accessory;
