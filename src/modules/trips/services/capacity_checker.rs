use tracing::warn;

use crate::core::{AppError, Result};
use crate::modules::trips::models::TripOccupancy;

/// Guards seat capacity before a sale lands on a trip.
///
/// The check itself is pure. Callers must read `TripOccupancy` under a lock
/// on the trip row and insert the sale in the same transaction, otherwise
/// two concurrent sales can both see the last free seat.
pub struct CapacityChecker;

impl CapacityChecker {
    /// Fail unless the trip is staffed and has at least one free seat
    pub fn ensure_seat_available(trip: &TripOccupancy) -> Result<()> {
        if !trip.has_vehicle() {
            return Err(AppError::validation(format!(
                "Trip {} has no vehicle assigned",
                trip.trip_id
            )));
        }

        if !trip.has_driver() {
            return Err(AppError::validation(format!(
                "Trip {} has no driver assigned",
                trip.trip_id
            )));
        }

        let capacity = trip.capacity().ok_or_else(|| {
            AppError::validation(format!(
                "Trip {} has no passenger capacity configured",
                trip.trip_id
            ))
        })?;

        let occupied = trip.occupied();
        if occupied >= capacity {
            warn!(
                trip_id = trip.trip_id,
                capacity = capacity,
                occupied = occupied,
                "Trip capacity exceeded"
            );
            return Err(AppError::invariant(format!(
                "Trip {} is full: {} of {} seats taken",
                trip.trip_id, occupied, capacity
            )));
        }

        Ok(())
    }
}
