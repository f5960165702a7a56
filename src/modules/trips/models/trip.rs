// Seat occupancy snapshot of a trip, read under a row lock when a sale is
// created or moved onto the trip.

use serde::Serialize;
use sqlx::FromRow;

/// What the capacity check needs to know about a trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct TripOccupancy {
    pub trip_id: i64,

    /// Assigned vehicle, if any
    pub vehicle_id: Option<i64>,

    /// Assigned driver, if any
    pub driver_id: Option<i64>,

    /// Seats in the assigned vehicle
    pub vehicle_capacity: Option<i32>,

    /// Trip-level passenger limit, used when the vehicle has no capacity set
    pub max_passengers: Option<i32>,

    /// Sales already attached to the trip
    pub sold_seats: i64,

    /// Passengers on non-cancelled bookings
    pub booked_passengers: i64,
}

impl TripOccupancy {
    /// Seat limit: the vehicle's capacity when a vehicle is assigned,
    /// otherwise the trip's own maximum
    pub fn capacity(&self) -> Option<i64> {
        let vehicle = self
            .vehicle_id
            .and(self.vehicle_capacity)
            .map(i64::from);

        vehicle.or(self.max_passengers.map(i64::from))
    }

    /// Seats already taken by sales and bookings
    pub fn occupied(&self) -> i64 {
        self.sold_seats + self.booked_passengers
    }

    pub fn has_vehicle(&self) -> bool {
        self.vehicle_id.is_some()
    }

    pub fn has_driver(&self) -> bool {
        self.driver_id.is_some()
    }
}
