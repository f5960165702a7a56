mod trip;

pub use trip::TripOccupancy;
