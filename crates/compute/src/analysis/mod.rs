pub mod coerce;
pub mod summary;
