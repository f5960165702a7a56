pub mod capacity_checker;

pub use capacity_checker::CapacityChecker;
