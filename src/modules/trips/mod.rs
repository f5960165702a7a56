// Trips module
//
// Trips are owned elsewhere; sales only read a trip's seat occupancy.

pub mod models;
pub mod services;

pub use models::TripOccupancy;
pub use services::CapacityChecker;
