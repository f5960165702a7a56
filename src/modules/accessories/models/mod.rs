mod accessory;

pub use accessory::Accessory;
