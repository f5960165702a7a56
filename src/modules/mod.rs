pub mod accessories;
pub mod health;
pub mod sales;
pub mod trips;
