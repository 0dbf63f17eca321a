pub mod address;
pub mod coordinate;
pub mod tracking;
